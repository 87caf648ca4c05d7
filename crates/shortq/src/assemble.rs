//! Statement assemblers.
//!
//! Pure functions from request arguments to a [`Statement`]. Nothing here
//! touches the database; [`crate::store::Store`] executes what these produce.

use crate::args::{FilterSpec, InsertSpec, JoinSpec, OrderSpec, UpdateSpec};
use crate::codec::{CodecResult, SecretCodec};
use crate::filter::{Conditions, SECRET_COLUMN, SpanDirection};
use crate::ident::Ident;
use crate::sql::Statement;
use crate::value::Value;

fn default_order_column() -> Ident {
    Ident::known("id")
}

fn filter_where(spec: &FilterSpec, codec: &dyn SecretCodec) -> Statement {
    let mut conditions = Conditions::new();
    conditions.push_filter(&spec.columns, &spec.values, None, codec);
    if let Some(span) = &spec.span {
        conditions.push_span(span, SpanDirection::Within);
    }
    conditions.into_where()
}

fn join_from(spec: &JoinSpec, sql: &mut Statement) {
    let table = spec.table();
    sql.push(" FROM ")
        .push_ident(table)
        .push(" INNER JOIN ")
        .push_ident(&spec.join_table)
        .push(" ON ")
        .push_ident(&spec.join_id1.qualified_by(table))
        .push(" = ")
        .push_ident(&spec.join_id2.qualified_by(&spec.join_table));
}

fn join_where(spec: &JoinSpec, codec: &dyn SecretCodec) -> Statement {
    let base = &spec.base;
    let mut conditions = Conditions::new();
    conditions.push_filter(&base.columns, &base.values, Some(&base.table), codec);
    conditions.push_filter(&spec.join_columns, &spec.join_values, Some(&spec.join_table), codec);
    if let Some(span) = &base.span {
        conditions.push_span(span, SpanDirection::Within);
    }
    conditions.into_where()
}

fn push_projection(sql: &mut Statement, fields: &[Ident]) {
    if fields.is_empty() {
        sql.push("*");
    } else {
        sql.push_ident_list(fields);
    }
}

fn push_order(sql: &mut Statement, order: &OrderSpec, default_table: Option<&Ident>) {
    let column = order.column.clone().unwrap_or_else(default_order_column);
    let column = match order.table.as_ref().or(default_table) {
        Some(table) => column.qualified_by(table),
        None => column,
    };
    sql.push(" ORDER BY ").push_ident(&column);
    sql.push(if order.reverse { " ASC" } else { " DESC" });

    if let Some(limit) = order.limit {
        sql.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = order.offset {
        sql.push(" OFFSET ").push_bind(offset);
    }
}

/// `SELECT COUNT(*) FROM t [WHERE ...]`
pub fn count_statement(spec: &FilterSpec, codec: &dyn SecretCodec) -> Statement {
    let mut sql = Statement::new("SELECT COUNT(*) FROM ");
    sql.push_ident(&spec.table);
    sql.push_sql(filter_where(spec, codec));
    sql
}

/// `SELECT COUNT(t.id) FROM t INNER JOIN j ON t.a = j.b [WHERE ...]`
pub fn count_join_statement(spec: &JoinSpec, codec: &dyn SecretCodec) -> Statement {
    let mut sql = Statement::new("SELECT COUNT(");
    sql.push_ident(&default_order_column().qualified_by(spec.table()))
        .push(")");
    join_from(spec, &mut sql);
    sql.push_sql(join_where(spec, codec));
    sql
}

/// `SELECT <fields|*> FROM t [WHERE ...] ORDER BY c ASC|DESC [LIMIT $n] [OFFSET $m]`
pub fn select_statement(
    spec: &FilterSpec,
    order: &OrderSpec,
    codec: &dyn SecretCodec,
) -> Statement {
    let mut sql = Statement::new("SELECT ");
    push_projection(&mut sql, &spec.fields);
    sql.push(" FROM ").push_ident(&spec.table);
    sql.push_sql(filter_where(spec, codec));
    push_order(&mut sql, order, None);
    sql
}

/// Same as [`select_statement`] over the join; the order column defaults to the primary table.
pub fn select_join_statement(
    spec: &JoinSpec,
    order: &OrderSpec,
    codec: &dyn SecretCodec,
) -> Statement {
    let mut sql = Statement::new("SELECT ");
    push_projection(&mut sql, &spec.base.fields);
    join_from(spec, &mut sql);
    sql.push_sql(join_where(spec, codec));
    push_order(&mut sql, order, Some(spec.table()));
    sql
}

/// One statement per index: `UPDATE t SET s = $1 WHERE k = $2 [AND span < ...]`.
pub fn update_statements(spec: &UpdateSpec) -> Vec<Statement> {
    (0..spec.len())
        .map(|i| {
            let mut sql = Statement::new("UPDATE ");
            sql.push_ident(&spec.table)
                .push(" SET ")
                .push_ident(&spec.set_columns[i])
                .push(" = ")
                .push_bind(spec.set_values[i].clone());

            let mut conditions = Conditions::new();
            conditions.push_eq(&spec.select_columns[i], &spec.select_values[i]);
            if let Some(span) = &spec.older_than {
                conditions.push_span(span, SpanDirection::OlderThan);
            }
            sql.push_sql(conditions.into_where());
            sql
        })
        .collect()
}

/// `INSERT INTO t (c1, c2) VALUES ($1, $2) [RETURNING ...]`
///
/// A non-empty text value in the secret column is stored encrypted. Fails only
/// when the codec does.
pub fn insert_statement(spec: &InsertSpec, codec: &dyn SecretCodec) -> CodecResult<Statement> {
    let mut sql = Statement::new("INSERT INTO ");
    sql.push_ident(&spec.table).push(" (");
    sql.push_ident_list(&spec.columns).push(") VALUES (");

    for (i, (column, value)) in spec.columns.iter().zip(&spec.values).enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        match value.as_text() {
            Some(plain) if column.is_named(SECRET_COLUMN) && !plain.is_empty() => {
                sql.push_bind(Value::Text(codec.encrypt(plain)?));
            }
            _ => {
                sql.push_bind(value.clone());
            }
        }
    }
    sql.push(")");

    if !spec.returning.is_empty() {
        sql.push(" RETURNING ").push_ident_list(&spec.returning);
    }
    Ok(sql)
}
