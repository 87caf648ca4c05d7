use super::*;
use crate::codec::AesCodec;
use crate::error::DbResult;
use crate::value::Value;
use bytes::BytesMut;
use std::sync::Mutex;
use tokio_postgres::types::{FromSql, ToSql, Type};

#[derive(Debug, Clone)]
struct FakeRow(Vec<(String, Value)>);

impl FakeRow {
    fn one(column: &str, value: impl Into<Value>) -> Self {
        Self(vec![(column.to_string(), value.into())])
    }

    fn decode<T: for<'a> FromSql<'a>>(column: &str, value: &Value) -> DbResult<T> {
        let ty = match value {
            Value::Null => {
                return T::from_sql_null(&Type::TEXT)
                    .map_err(|e| DbError::decode(column, e.to_string()));
            }
            Value::Bool(_) => Type::BOOL,
            Value::Int(_) => Type::INT8,
            Value::Float(_) => Type::FLOAT8,
            Value::Text(_) => Type::TEXT,
            Value::Bytes(_) => Type::BYTEA,
        };
        if !T::accepts(&ty) {
            return Err(DbError::decode(column, format!("cannot read {ty}")));
        }
        let mut buf = BytesMut::new();
        value
            .to_sql(&ty, &mut buf)
            .map_err(|e| DbError::decode(column, e.to_string()))?;
        T::from_sql(&ty, &buf).map_err(|e| DbError::decode(column, e.to_string()))
    }
}

impl RowAccess for FakeRow {
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        let (_, value) = self
            .0
            .iter()
            .find(|(name, _)| name == column)
            .ok_or_else(|| DbError::decode(column, "no such column"))?;
        Self::decode(column, value)
    }

    fn try_get_index<T>(&self, idx: usize) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        let (name, value) = self
            .0
            .get(idx)
            .ok_or_else(|| DbError::decode(idx.to_string(), "index out of range"))?;
        Self::decode(name, value)
    }
}

enum Reply {
    Rows(Vec<FakeRow>),
    Affected(u64),
    Fail,
}

/// Records every statement and answers from a closure keyed on the SQL text.
struct FakeClient {
    log: Mutex<Vec<(String, Vec<String>)>>,
    reply: Box<dyn Fn(&str) -> Reply + Send + Sync>,
}

impl FakeClient {
    fn new(reply: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        }
    }

    fn record(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Reply {
        let params = params.iter().map(|p| format!("{p:?}")).collect();
        self.log.lock().unwrap().push((sql.to_string(), params));
        (self.reply)(sql)
    }

    fn statements(&self) -> Vec<(String, Vec<String>)> {
        self.log.lock().unwrap().clone()
    }
}

impl GenericClient for FakeClient {
    type Row = FakeRow;

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<FakeRow>> {
        match self.record(sql, params) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Affected(_) => Ok(Vec::new()),
            Reply::Fail => Err(DbError::Other("relation \"shortenurl\" does not exist".into())),
        }
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        match self.record(sql, params) {
            Reply::Rows(rows) => Ok(rows.len() as u64),
            Reply::Affected(n) => Ok(n),
            Reply::Fail => Err(DbError::Other("deadlock detected".into())),
        }
    }
}

fn store(reply: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Store<FakeClient> {
    let codec = AesCodec::new(b"0123456789abcdef").unwrap();
    Store::new(FakeClient::new(reply), Arc::new(codec))
}

fn by_key() -> FilterSpec {
    FilterSpec::new("shortenurl", &["short_url"], vec!["ab12c"]).unwrap()
}

#[tokio::test]
async fn count_reads_first_column() {
    let store = store(|_| Reply::Rows(vec![FakeRow::one("count", 3i64)]));
    assert_eq!(store.count(&by_key()).await, 3);

    let log = store.client().statements();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, "SELECT COUNT(*) FROM shortenurl WHERE short_url IN ($1)");
    assert_eq!(log[0].1, vec![format!("{:?}", Value::Text("ab12c".into()))]);
}

#[tokio::test]
async fn count_is_zero_on_empty_failure_and_bad_row() {
    assert_eq!(store(|_| Reply::Rows(vec![])).count(&by_key()).await, 0);
    assert_eq!(store(|_| Reply::Fail).count(&by_key()).await, 0);
    assert_eq!(
        store(|_| Reply::Rows(vec![FakeRow::one("count", "three")])).count(&by_key()).await,
        0
    );
}

#[tokio::test]
async fn count_join_uses_join_statement() {
    let store = store(|_| Reply::Rows(vec![FakeRow::one("count", 7i64)]));
    let spec =
        JoinSpec::new(by_key(), "clicks", &["ip"], vec!["10.0.0.1"], "id", "url_id").unwrap();
    assert_eq!(store.count_join(&spec).await, 7);
    let sql = &store.client().statements()[0].0;
    assert!(sql.starts_with("SELECT COUNT(shortenurl.id) FROM shortenurl INNER JOIN clicks"));

    assert_eq!(self::store(|_| Reply::Fail).count_join(&spec).await, 0);
}

#[tokio::test]
async fn select_returns_rows_or_empty() {
    let store = store(|_| Reply::Rows(vec![FakeRow::one("pre_url", "https://example.com")]));
    let rows = store.select(&by_key(), &OrderSpec::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].try_get_column::<String>("pre_url").unwrap(),
        "https://example.com"
    );

    let empty = self::store(|_| Reply::Rows(vec![]));
    assert!(empty.select(&by_key(), &OrderSpec::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn select_failure_hides_driver_text() {
    let store = store(|_| Reply::Fail);
    let err = store.select(&by_key(), &OrderSpec::new()).await.unwrap_err();
    assert_eq!(err, OpError::Failed);
    assert!(!err.to_string().contains("shortenurl"));
}

#[tokio::test]
async fn select_join_orders_by_primary_id() {
    let store = store(|_| Reply::Rows(vec![]));
    let no_filter: &[&str] = &[];
    let spec =
        JoinSpec::new(by_key(), "clicks", no_filter, Vec::<Value>::new(), "id", "url_id").unwrap();
    store.select_join(&spec, &OrderSpec::new()).await.unwrap();
    assert!(store.client().statements()[0].0.ends_with("ORDER BY shortenurl.id DESC"));
}

#[tokio::test]
async fn select_join_accepts_qualified_filter_columns() {
    let store = store(|_| Reply::Rows(vec![]));
    let base = FilterSpec::new("shortenurl", &["shortenurl.usable"], vec![0i64]).unwrap();
    let spec = JoinSpec::new(base, "clicks", &[] as &[&str], Vec::<Value>::new(), "id", "url_id")
        .unwrap();
    assert!(store.select_join(&spec, &OrderSpec::new()).await.unwrap().is_empty());

    let sql = &store.client().statements()[0].0;
    assert!(sql.contains(" WHERE shortenurl.usable IN ($1) "));
    assert!(!sql.contains("shortenurl.shortenurl"));
}

#[tokio::test]
async fn select_with_undecryptable_password_finds_nothing() {
    let store = store(|_| Reply::Rows(vec![]));
    for bad in ["not-hex-zz", "00112233445566778899aabbccddeeff"] {
        let spec = FilterSpec::new("shortenurl", &["short_url", "password"], vec!["ab12c", bad])
            .unwrap();
        assert!(store.select(&spec, &OrderSpec::new()).await.unwrap().is_empty());
    }

    for (sql, params) in store.client().statements() {
        assert_eq!(
            sql,
            "SELECT * FROM shortenurl WHERE short_url IN ($1) AND FALSE ORDER BY id DESC"
        );
        assert_eq!(params.len(), 1);
    }
    assert_eq!(store.client().statements().len(), 2);
}

#[tokio::test]
async fn update_collects_every_outcome() {
    let store = store(|_| Reply::Affected(1));
    let spec =
        UpdateSpec::new("shortenurl", &["usable"], vec![0i64], &["short_url"], vec!["ab12c"])
            .unwrap();
    let report = store.update(&spec).await;

    assert_eq!(report.len(), 1);
    assert!(report.is_complete_success());
    assert_eq!(report.rows_affected(), 1);
    let log = store.client().statements();
    assert_eq!(log[0].0, "UPDATE shortenurl SET usable = $1 WHERE short_url = $2");
}

#[tokio::test]
async fn update_partial_failure_does_not_cancel_siblings() {
    let calls = Arc::new(Mutex::new(0usize));
    let seen = Arc::clone(&calls);
    let store = store(move |_| {
        let mut n = seen.lock().unwrap();
        *n += 1;
        if *n == 2 { Reply::Fail } else { Reply::Affected(1) }
    });
    let spec = UpdateSpec::new(
        "shortenurl",
        &["usable", "usable", "usable"],
        vec![0i64, 0, 0],
        &["short_url", "short_url", "short_url"],
        vec!["aaaaa", "bbbbb", "ccccc"],
    )
    .unwrap();

    let report = store.update(&spec).await;
    assert_eq!(*calls.lock().unwrap(), 3);
    assert_eq!(report.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures().count(), 1);
    assert!(!report.is_complete_success());
    assert!(report.failures().all(|(_, e)| *e == OpError::Failed));
}

#[tokio::test]
async fn update_keeps_outcomes_when_every_sub_update_fails() {
    let store = store(|_| Reply::Fail);
    let spec = UpdateSpec::new(
        "shortenurl",
        &["usable", "usable"],
        vec![0i64, 0],
        &["short_url", "short_url"],
        vec!["aaaaa", "bbbbb"],
    )
    .unwrap();
    let report = store.update(&spec).await;

    assert_eq!(report.len(), 2);
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failures().map(|(i, _)| i).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(report.outcomes(), &[Err(OpError::Failed), Err(OpError::Failed)]);

    let empty =
        UpdateSpec::new::<&str, Value, Value>("shortenurl", &[], vec![], &[], vec![]).unwrap();
    let report = store.update(&empty).await;
    assert!(report.is_empty());
    assert!(report.is_complete_success());
    assert_eq!(store.client().statements().len(), 2);
}

#[tokio::test]
async fn insert_binds_ciphertext_for_secret_column() {
    let store = store(|_| Reply::Rows(vec![FakeRow::one("id", 42i64)]));
    let spec = InsertSpec::new("users", &["name", "password"], vec!["ann", "hunter2"])
        .unwrap()
        .returning(&["id"])
        .unwrap();
    let rows = store.insert(&spec).await.unwrap();
    assert_eq!(rows[0].try_get_column::<i64>("id").unwrap(), 42);

    let (sql, params) = &store.client().statements()[0];
    assert_eq!(sql, "INSERT INTO users (name, password) VALUES ($1, $2) RETURNING id");
    assert!(params.iter().all(|p| !p.contains("hunter2")));
    let ciphertext = store.codec().encrypt("hunter2").unwrap();
    assert_eq!(params[1], format!("{:?}", Value::Text(ciphertext)));
}

#[tokio::test]
async fn insert_failure_is_opaque() {
    let store = store(|_| Reply::Fail);
    let spec = InsertSpec::new("shortenurl", &["pre_url"], vec!["https://example.com"]).unwrap();
    assert_eq!(store.insert(&spec).await.unwrap_err(), OpError::Failed);
}

#[test]
fn report_accessors() {
    let report = UpdateReport {
        outcomes: vec![Ok(2), Err(OpError::Failed), Ok(0)],
    };
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.rows_affected(), 2);
    assert_eq!(report.failures().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
    assert_eq!(report.outcomes().len(), 3);
}
