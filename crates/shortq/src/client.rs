//! Driver boundary.
//!
//! [`GenericClient`] is the single I/O surface: run a templated statement with
//! an ordered parameter list. It is implemented for a direct connection, a
//! transaction, and (with the `pool` feature) a connection pool.

use crate::error::{DbError, DbResult};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql};

/// Typed access to result rows.
pub trait RowAccess {
    /// Try to get a column value by name, returning `DbError::Decode` on failure.
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Try to get a column value by position.
    fn try_get_index<T>(&self, idx: usize) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowAccess for Row {
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| DbError::decode(column, e.to_string()))
    }

    fn try_get_index<T>(&self, idx: usize) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(idx)
            .map_err(|e| DbError::decode(idx.to_string(), e.to_string()))
    }
}

/// A trait that unifies database clients, transactions and pools.
pub trait GenericClient: Send + Sync {
    /// Row type produced by this client.
    type Row: RowAccess + Send + Sync;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Vec<Self::Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        Ok(tokio_postgres::Client::query(self, sql, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, params).await?)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        Ok(tokio_postgres::Transaction::query(self, sql, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        Ok(tokio_postgres::Transaction::execute(self, sql, params).await?)
    }
}

/// Each statement checks out its own connection; the connection goes back to
/// the pool when the guard drops, including on error.
#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Pool {
    type Row = Row;

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        let conn = self.get().await?;
        Ok(conn.query(sql, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        let conn = self.get().await?;
        Ok(conn.execute(sql, params).await?)
    }
}
