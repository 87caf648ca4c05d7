//! Operation surface.
//!
//! [`Store`] owns the executor and the secret codec and exposes the six
//! operations the routing layer calls. Every failure is logged here with full
//! detail and crosses the boundary as an [`OpError`] without driver text.

use crate::args::{FilterSpec, InsertSpec, JoinSpec, OrderSpec, UpdateSpec};
use crate::assemble;
use crate::client::{GenericClient, RowAccess};
use crate::codec::SecretCodec;
use crate::error::{DbError, OpError, OpResult};
use crate::executor::{Execution, QueryExecutor};
use crate::sql::Statement;
use futures_util::future::join_all;
use std::sync::Arc;

/// Aggregated outcome of a multi-row update, one entry per sub-update index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    outcomes: Vec<OpResult<u64>>,
}

impl UpdateReport {
    /// Outcome of each sub-update, in request order.
    pub fn outcomes(&self) -> &[OpResult<u64>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of sub-updates that ran without error.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Failed sub-updates as `(index, error)`.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &OpError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().err().map(|e| (i, e)))
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(Result::is_ok)
    }

    /// Total rows affected across successful sub-updates.
    pub fn rows_affected(&self) -> u64 {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok()).sum()
    }
}

pub struct Store<C> {
    executor: QueryExecutor<C>,
    codec: Arc<dyn SecretCodec>,
}

impl<C> std::fmt::Debug for Store<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl<C: GenericClient> Store<C> {
    pub fn new(client: C, codec: Arc<dyn SecretCodec>) -> Self {
        Self {
            executor: QueryExecutor::new(client),
            codec,
        }
    }

    pub fn client(&self) -> &C {
        self.executor.client()
    }

    pub fn codec(&self) -> &dyn SecretCodec {
        self.codec.as_ref()
    }

    /// Number of matching rows; `0` when nothing matches or the query fails.
    pub async fn count(&self, spec: &FilterSpec) -> i64 {
        let stmt = assemble::count_statement(spec, self.codec());
        self.scalar_count(&stmt).await
    }

    /// Number of joined rows; `0` when nothing matches or the query fails.
    pub async fn count_join(&self, spec: &JoinSpec) -> i64 {
        let stmt = assemble::count_join_statement(spec, self.codec());
        self.scalar_count(&stmt).await
    }

    /// Matching rows; an empty vector when nothing matches.
    pub async fn select(&self, spec: &FilterSpec, order: &OrderSpec) -> OpResult<Vec<C::Row>> {
        let stmt = assemble::select_statement(spec, order, self.codec());
        self.rows("select", &stmt).await
    }

    pub async fn select_join(&self, spec: &JoinSpec, order: &OrderSpec) -> OpResult<Vec<C::Row>> {
        let stmt = assemble::select_join_statement(spec, order, self.codec());
        self.rows("select_join", &stmt).await
    }

    /// Run every sub-update concurrently and wait for all of them.
    ///
    /// One failing sub-update never cancels the others; each outcome, failed
    /// or not, is kept in the report at its request index.
    pub async fn update(&self, spec: &UpdateSpec) -> UpdateReport {
        let stmts = assemble::update_statements(spec);
        let outcomes: Vec<OpResult<u64>> = join_all(stmts.iter().map(|stmt| async move {
            self.executor.run_execute(stmt).await.map_err(OpError::from)
        }))
        .await;

        let report = UpdateReport { outcomes };
        if !report.is_complete_success() {
            tracing::warn!(
                target: "shortq",
                table = %spec.table(),
                total = report.len(),
                failed = report.len() - report.succeeded(),
                "update had failures"
            );
        }
        report
    }

    /// Insert one row. Returns the `RETURNING` rows when requested, otherwise
    /// an empty vector.
    pub async fn insert(&self, spec: &InsertSpec) -> OpResult<Vec<C::Row>> {
        let stmt = assemble::insert_statement(spec, self.codec()).map_err(|err| {
            tracing::error!(
                target: "shortq",
                table = %spec.table(),
                error = %err,
                "insert codec failed"
            );
            OpError::from(DbError::from(err))
        })?;
        self.rows("insert", &stmt).await
    }

    async fn rows(&self, op: &'static str, stmt: &Statement) -> OpResult<Vec<C::Row>> {
        match self.executor.run(stmt).await {
            Ok(execution) => Ok(execution.into_rows()),
            Err(err) => {
                tracing::warn!(target: "shortq", op, error = %err, "operation failed");
                Err(err.into())
            }
        }
    }

    async fn scalar_count(&self, stmt: &Statement) -> i64 {
        let rows = match self.executor.run(stmt).await {
            Ok(Execution::Rows(rows)) => rows,
            Ok(Execution::Empty) => return 0,
            Err(err) => {
                tracing::warn!(
                    target: "shortq",
                    op = "count",
                    error = %err,
                    "count failed, reporting 0"
                );
                return 0;
            }
        };
        match rows.first().map(|row| row.try_get_index::<i64>(0)) {
            Some(Ok(n)) => n,
            Some(Err(err)) => {
                tracing::warn!(
                    target: "shortq",
                    op = "count",
                    error = %err,
                    "count decode failed, reporting 0"
                );
                0
            }
            None => 0,
        }
    }
}

#[cfg(feature = "pool")]
impl Store<deadpool_postgres::Pool> {
    /// Build the pool and codec from configuration.
    ///
    /// No connection is opened here; the first statement checks one out.
    pub fn connect(config: &crate::config::Config) -> crate::error::DbResult<Self> {
        let codec = crate::codec::AesCodec::new(&config.secret_key)?;
        let pool = crate::pool::create_pool(config)?;
        tracing::debug!(
            target: "shortq",
            max_connections = config.max_connections,
            "store ready"
        );
        Ok(Self::new(pool, Arc::new(codec)))
    }

    /// Close the pool. Outstanding connections are dropped as they return.
    pub fn close(&self) {
        self.client().close();
    }
}

#[cfg(test)]
mod tests;
