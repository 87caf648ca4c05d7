//! URL shortener flows over [`Store`].
//!
//! Table layout:
//!
//! ```text
//! shortenurl(id, pre_url, short_url, usable)
//! ```
//!
//! `usable = 1` marks a live key; disabled keys stay in the table and stop
//! resolving.

use crate::args::{FilterSpec, InsertSpec, OrderSpec, UpdateSpec};
use crate::client::{GenericClient, RowAccess};
use crate::error::{OpError, OpResult};
use crate::store::{Store, UpdateReport};
use crate::value::Value;

pub const TABLE: &str = "shortenurl";

/// Length of a short key in hex characters.
pub const KEY_LEN: usize = 5;

/// Draws before giving up on finding an unused key.
pub const MAX_KEY_ATTEMPTS: usize = 5;

#[derive(Debug)]
pub struct Shortener<C> {
    store: Store<C>,
}

impl<C: GenericClient> Shortener<C> {
    pub fn new(store: Store<C>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store<C> {
        &self.store
    }

    /// The original URL for a live short key.
    ///
    /// Keys of the wrong length are not looked up and resolve to `None`.
    pub async fn resolve(&self, key: &str) -> OpResult<Option<String>> {
        if key.chars().count() != KEY_LEN {
            return Ok(None);
        }
        let spec = FilterSpec::new(
            TABLE,
            &["short_url", "usable"],
            vec![Value::from(key), Value::Int(1)],
        )?
        .fields(&["pre_url"])?;
        let order = OrderSpec::new().limit(1)?;

        let rows = self.store.select(&spec, &order).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        match row.try_get_column::<String>("pre_url") {
            Ok(url) => Ok(Some(url)),
            Err(err) => {
                tracing::warn!(target: "shortq", key, error = %err, "unreadable pre_url");
                Err(OpError::Failed)
            }
        }
    }

    /// Store `url` under a fresh random key and return the key.
    pub async fn create(&self, url: &str) -> OpResult<String> {
        if url.is_empty() {
            return Err(OpError::contract("url cannot be empty"));
        }
        let key = self.unused_key().await?;

        let spec = InsertSpec::new(
            TABLE,
            &["pre_url", "short_url", "usable"],
            vec![Value::from(url), Value::from(key.as_str()), Value::Int(1)],
        )?;
        self.store.insert(&spec).await?;
        tracing::debug!(target: "shortq", key = %key, "short url created");
        Ok(key)
    }

    /// Mark each key unusable. One update per key, all run together.
    pub async fn disable<S: AsRef<str>>(&self, keys: &[S]) -> OpResult<UpdateReport> {
        let set_columns = vec!["usable"; keys.len()];
        let select_columns = vec!["short_url"; keys.len()];
        let spec = UpdateSpec::new(
            TABLE,
            &set_columns,
            vec![Value::Int(0); keys.len()],
            &select_columns,
            keys.iter().map(|k| Value::from(k.as_ref())).collect::<Vec<_>>(),
        )?;
        Ok(self.store.update(&spec).await)
    }

    async fn unused_key(&self) -> OpResult<String> {
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let key = self.store.codec().random_hex(KEY_LEN).map_err(|err| {
                tracing::error!(target: "shortq", error = %err, "random key generation failed");
                OpError::Codec
            })?;
            let spec = FilterSpec::new(TABLE, &["short_url"], vec![key.as_str()])?;
            if self.store.count(&spec).await == 0 {
                return Ok(key);
            }
            tracing::debug!(target: "shortq", attempt, "short key collision");
        }
        tracing::error!(target: "shortq", attempts = MAX_KEY_ATTEMPTS, "no unused short key found");
        Err(OpError::Failed)
    }
}
