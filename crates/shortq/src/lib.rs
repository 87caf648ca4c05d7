//! # shortq
//!
//! Query core for a URL-shortening service on Postgres.
//!
//! Requests are typed argument records ([`FilterSpec`], [`JoinSpec`],
//! [`OrderSpec`], [`UpdateSpec`], [`InsertSpec`]) validated at construction.
//! The assemblers turn them into a [`Statement`] whose `$n` placeholders line
//! up with its parameter list, and [`Store`] runs it through a
//! [`GenericClient`].
//!
//! - **Identifiers inline, values bound**: table and column names are
//!   validated and written into the template; every value is a parameter.
//! - **Secret column**: `password` values are encrypted on insert and matched
//!   through a pgcrypto decrypt expression in filters. Ciphertext and key are
//!   always bound.
//! - **Uniform failures**: driver errors are logged and surface as
//!   [`OpError::Failed`]; counts degrade to `0`.
//!
//! ```ignore
//! use shortq::{Config, FilterSpec, OrderSpec, Store};
//!
//! let store = Store::connect(&Config::from_env()?)?;
//!
//! let live = FilterSpec::new("shortenurl", &["usable"], vec![1i64])?;
//! let n = store.count(&live).await;
//!
//! let recent = FilterSpec::all("shortenurl")?
//!     .fields(&["pre_url", "short_url"])?
//!     .span("created_at", 7)?;
//! let rows = store.select(&recent, &OrderSpec::new().limit(20)?).await?;
//! ```

pub mod args;
pub mod assemble;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod ident;
pub mod shortener;
pub mod sql;
pub mod store;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use args::{FilterSpec, InsertSpec, JoinSpec, OrderSpec, Span, UpdateSpec};
pub use client::{GenericClient, RowAccess};
pub use codec::{AesCodec, CodecError, CodecResult, SecretCodec};
pub use config::{Config, ConfigError};
pub use error::{DbError, DbResult, OpError, OpResult};
pub use executor::{Execution, QueryExecutor};
pub use filter::{Conditions, SpanDirection, build_filter};
pub use ident::Ident;
pub use shortener::Shortener;
pub use sql::Statement;
pub use store::{Store, UpdateReport};
pub use value::{FilterValue, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_size};

