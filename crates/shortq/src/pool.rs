//! Connection pool construction.

use crate::config::Config;
use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Build a pool sized from `config`. No connection is opened until first use.
pub fn create_pool(config: &Config) -> DbResult<Pool> {
    create_pool_with_size(&config.database_url, config.max_connections)
}

/// Build a pool for `database_url` holding at most `max_size` connections.
pub fn create_pool_with_size(database_url: &str, max_size: usize) -> DbResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| DbError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_url() {
        let err = create_pool_with_size("postgres://host:notaport/db", 4).unwrap_err();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    fn sizes_from_config() {
        let cfg = Config::new("postgres://localhost/shortq", b"0123456789abcdef".to_vec())
            .unwrap()
            .with_max_connections(3)
            .unwrap();
        let pool = create_pool(&cfg).unwrap();
        assert_eq!(pool.status().max_size, 3);
    }
}
