//! Query executor.
//!
//! Runs a [`Statement`] through a [`GenericClient`] and classifies the outcome
//! as rows, empty, or error. Failures are logged here with full driver detail
//! and returned as values; callers decide how to degrade.

use crate::client::GenericClient;
use crate::error::DbResult;
use crate::sql::Statement;

/// Successful execution outcome.
#[derive(Debug)]
pub enum Execution<R> {
    /// At least one row came back.
    Rows(Vec<R>),
    /// The statement succeeded but matched nothing.
    Empty,
}

impl<R> Execution<R> {
    /// Collapse into a row vector (empty on `Empty`).
    pub fn into_rows(self) -> Vec<R> {
        match self {
            Execution::Rows(rows) => rows,
            Execution::Empty => Vec::new(),
        }
    }
}

/// Wraps a client and executes statements.
#[derive(Debug, Clone)]
pub struct QueryExecutor<C> {
    client: C,
}

impl<C: GenericClient> QueryExecutor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run a row-returning statement.
    pub async fn run(&self, stmt: &Statement) -> DbResult<Execution<C::Row>> {
        let sql = stmt.to_sql();
        tracing::debug!(
            target: "shortq.sql",
            sql = %sql,
            param_count = stmt.params().len(),
            "query"
        );

        match self.client.query(&sql, &stmt.params_ref()).await {
            Ok(rows) if rows.is_empty() => Ok(Execution::Empty),
            Ok(rows) => Ok(Execution::Rows(rows)),
            Err(err) => {
                tracing::error!(target: "shortq.sql", sql = %sql, error = %err, "query failed");
                Err(err)
            }
        }
    }

    /// Run a statement and return the affected row count.
    pub async fn run_execute(&self, stmt: &Statement) -> DbResult<u64> {
        let sql = stmt.to_sql();
        tracing::debug!(
            target: "shortq.sql",
            sql = %sql,
            param_count = stmt.params().len(),
            "execute"
        );

        self.client
            .execute(&sql, &stmt.params_ref())
            .await
            .inspect_err(|err| {
                tracing::error!(target: "shortq.sql", sql = %sql, error = %err, "execute failed");
            })
    }
}
