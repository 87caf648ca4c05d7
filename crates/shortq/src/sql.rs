//! Statement templates.
//!
//! [`Statement`] stores SQL pieces and parameters separately and renders
//! `$1, $2, ...` placeholders in the order the pieces were pushed, so the
//! parameter list always lines up with the placeholders in the template.
//!
//! # Example
//!
//! ```ignore
//! use shortq::{Ident, Statement};
//!
//! let mut q = Statement::new("SELECT * FROM ");
//! q.push_ident(&Ident::parse("shortenurl")?).push(" WHERE short_url = ").push_bind("ab12c");
//! assert_eq!(q.to_sql(), "SELECT * FROM shortenurl WHERE short_url = $1");
//! ```

use crate::ident::Ident;
use crate::value::Value;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Ident(Ident),
    Param,
}

/// A SQL template plus its ordered parameter list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

impl Statement {
    /// Create a new statement with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Create an empty statement.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append an identifier-class placeholder.
    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        self.parts.push(SqlPart::Ident(ident.clone()));
        self
    }

    /// Append identifiers separated by `, `.
    pub fn push_ident_list(&mut self, idents: &[Ident]) -> &mut Self {
        for (i, ident) in idents.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(ident);
        }
        self
    }

    /// Append a value-class placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// If `values` is empty, this appends `NULL` (so `IN (NULL)` is valid SQL).
    pub fn push_bind_list<T: Into<Value>>(
        &mut self,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append another statement fragment, consuming it.
    pub fn push_sql(&mut self, mut other: Statement) -> &mut Self {
        for part in other.parts.drain(..) {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                part => self.parts.push(part),
            }
        }
        self.params.append(&mut other.params);
        self
    }

    /// Whether nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Ident(ident) => ident.write_sql(&mut out),
                SqlPart::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${idx}");
                }
            }
        }
        out
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    /// Number of value-class placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        self.parts.iter().filter(|p| matches!(p, SqlPart::Param)).count()
    }
}
