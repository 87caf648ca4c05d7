//! Condition builder.
//!
//! [`Conditions`] collects predicates and joins them with ` AND ` only between
//! predicates, so a span filter can be appended whether or not a column filter
//! came first. `WHERE` is emitted only when at least one predicate exists.

use crate::args::Span;
use crate::codec::SecretCodec;
use crate::ident::Ident;
use crate::sql::Statement;
use crate::value::{FilterValue, Value};

/// Column whose filter values are ciphertexts decrypted in SQL.
pub const SECRET_COLUMN: &str = "password";

/// Which side of the window a span predicate keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanDirection {
    /// `col > now() - N days`
    Within,
    /// `col < now() - N days`
    OlderThan,
}

/// Accumulates `AND`-joined predicates.
#[derive(Debug, Default)]
pub struct Conditions {
    sql: Statement,
    len: usize,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> &mut Statement {
        if self.len > 0 {
            self.sql.push(" AND ");
        }
        self.len += 1;
        &mut self.sql
    }

    /// Append one predicate per `(columns[i], values[i])` pair.
    ///
    /// Callers guarantee equal lengths (checked when the request was built).
    pub fn push_filter(
        &mut self,
        columns: &[Ident],
        values: &[FilterValue],
        qualifier: Option<&Ident>,
        codec: &dyn SecretCodec,
    ) -> &mut Self {
        debug_assert_eq!(columns.len(), values.len());
        for (column, value) in columns.iter().zip(values) {
            let target = match qualifier {
                Some(t) => column.qualified_by(t),
                None => column.clone(),
            };
            match value.as_text() {
                Some(ciphertext) if column.is_named(SECRET_COLUMN) && !ciphertext.is_empty() => {
                    self.push_secret(&target, ciphertext, codec);
                }
                _ => {
                    let sql = self.next();
                    sql.push_ident(&target).push(" IN (");
                    match value {
                        FilterValue::One(v) => {
                            sql.push_bind(v.clone());
                        }
                        FilterValue::Many(vs) => {
                            sql.push_bind_list(vs.iter().cloned());
                        }
                    }
                    sql.push(")");
                }
            }
        }
        self
    }

    // A ciphertext the codec cannot decrypt would make pgcrypto raise and fail
    // the whole statement; it becomes a predicate that matches nothing instead.
    fn push_secret(&mut self, target: &Ident, ciphertext: &str, codec: &dyn SecretCodec) {
        if let Err(err) = codec.decrypt(ciphertext) {
            tracing::warn!(
                target: "shortq",
                column = %target,
                error = %err,
                "secret filter value is not valid ciphertext; predicate cannot match"
            );
            self.next().push("FALSE");
            return;
        }
        let sql = self.next();
        sql.push_ident(target).push(" IN (");
        push_decrypt(sql, ciphertext, codec.key());
        sql.push(")");
    }

    /// Append a time-window predicate on the span column.
    pub fn push_span(&mut self, span: &Span, direction: SpanDirection) -> &mut Self {
        let op = match direction {
            SpanDirection::Within => " > ",
            SpanDirection::OlderThan => " < ",
        };
        let target = span.target();
        self.next()
            .push_ident(&target)
            .push(op)
            .push("now() - make_interval(days => ")
            .push_bind(span.days)
            .push(")");
        self
    }

    /// Append a plain equality predicate.
    pub fn push_eq(&mut self, column: &Ident, value: &Value) -> &mut Self {
        self.next().push_ident(column).push(" = ").push_bind(value.clone());
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bare predicate list (no `WHERE`).
    pub fn into_fragment(self) -> Statement {
        self.sql
    }

    /// ` WHERE <predicates>`, or nothing when there are no predicates.
    pub fn into_where(self) -> Statement {
        if self.len == 0 {
            return Statement::empty();
        }
        let mut out = Statement::new(" WHERE ");
        out.push_sql(self.sql);
        out
    }
}

/// `convert_from(decrypt(decode($n, 'hex'), $m, 'aes-ecb'), 'utf8')`
///
/// Ciphertext and key are bound parameters; neither is written into the template.
fn push_decrypt(sql: &mut Statement, ciphertext: &str, key: &[u8]) {
    sql.push("convert_from(decrypt(decode(")
        .push_bind(ciphertext)
        .push(", 'hex'), ")
        .push_bind(key.to_vec())
        .push(", 'aes-ecb'), 'utf8')");
}

/// Build the predicate fragment for positional `columns`/`values`.
///
/// Returns an empty statement when `columns` is empty.
pub fn build_filter(
    columns: &[Ident],
    values: &[FilterValue],
    qualifier: Option<&Ident>,
    codec: &dyn SecretCodec,
) -> Statement {
    let mut conditions = Conditions::new();
    conditions.push_filter(columns, values, qualifier, codec);
    conditions.into_fragment()
}
