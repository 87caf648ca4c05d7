//! Request arguments for the statement assemblers.
//!
//! Every request pairs a column list with a value list by position. The
//! constructors reject mismatched lengths and invalid identifiers before any
//! SQL exists, so the assemblers can rely on aligned, validated input.

use crate::error::{OpError, OpResult};
use crate::ident::Ident;
use crate::value::{FilterValue, Value};

fn check_aligned(what: &str, columns: usize, values: usize) -> OpResult<()> {
    if columns != values {
        return Err(OpError::contract(format!(
            "{what}: {columns} columns but {values} values"
        )));
    }
    Ok(())
}

fn check_days(days: i64) -> OpResult<()> {
    if days <= 0 {
        return Err(OpError::contract(format!(
            "span must be a positive number of days, got {days}"
        )));
    }
    Ok(())
}

/// Restrict rows by the age of a timestamp column.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub(crate) table: Option<Ident>,
    pub(crate) column: Ident,
    pub(crate) days: i64,
}

impl Span {
    fn new(table: Option<&str>, column: &str, days: i64) -> OpResult<Self> {
        check_days(days)?;
        Ok(Self {
            table: table.map(Ident::parse).transpose()?,
            column: Ident::parse(column)?,
            days,
        })
    }

    /// The column reference, qualified when a table was given.
    pub(crate) fn target(&self) -> Ident {
        match &self.table {
            Some(t) => self.column.qualified_by(t),
            None => self.column.clone(),
        }
    }
}

/// Positional column/value filter over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub(crate) table: Ident,
    pub(crate) columns: Vec<Ident>,
    pub(crate) values: Vec<FilterValue>,
    pub(crate) fields: Vec<Ident>,
    pub(crate) span: Option<Span>,
}

impl FilterSpec {
    /// `columns[i]` is compared with `values[i]`; both must have the same length.
    pub fn new<S, V>(table: &str, columns: &[S], values: Vec<V>) -> OpResult<Self>
    where
        S: AsRef<str>,
        V: Into<FilterValue>,
    {
        check_aligned("filter", columns.len(), values.len())?;
        Ok(Self {
            table: Ident::parse(table)?,
            columns: Ident::parse_all(columns)?,
            values: values.into_iter().map(Into::into).collect(),
            fields: Vec::new(),
            span: None,
        })
    }

    /// A filter with no predicates.
    pub fn all(table: &str) -> OpResult<Self> {
        Self::new::<&str, Value>(table, &[], Vec::new())
    }

    /// Project only these columns (default `*`).
    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> OpResult<Self> {
        self.fields = Ident::parse_all(fields)?;
        Ok(self)
    }

    /// Keep only rows whose `column` is within the last `days` days.
    pub fn span(mut self, column: &str, days: i64) -> OpResult<Self> {
        self.span = Some(Span::new(None, column, days)?);
        Ok(self)
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Filter over an inner join of two tables.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub(crate) base: FilterSpec,
    pub(crate) join_table: Ident,
    pub(crate) join_columns: Vec<Ident>,
    pub(crate) join_values: Vec<FilterValue>,
    pub(crate) join_id1: Ident,
    pub(crate) join_id2: Ident,
}

impl JoinSpec {
    /// Join `table` to `join_table` on `table.join_id1 = join_table.join_id2`.
    ///
    /// `base` filters the primary table; `join_columns`/`join_values` filter the
    /// joined table and must have the same length.
    pub fn new<S, V>(
        base: FilterSpec,
        join_table: &str,
        join_columns: &[S],
        join_values: Vec<V>,
        join_id1: &str,
        join_id2: &str,
    ) -> OpResult<Self>
    where
        S: AsRef<str>,
        V: Into<FilterValue>,
    {
        check_aligned("join filter", join_columns.len(), join_values.len())?;
        if base.span.is_some() {
            return Err(OpError::contract(
                "join span must name its table; use JoinSpec::span",
            ));
        }
        Ok(Self {
            base,
            join_table: Ident::parse(join_table)?,
            join_columns: Ident::parse_all(join_columns)?,
            join_values: join_values.into_iter().map(Into::into).collect(),
            join_id1: Ident::parse(join_id1)?,
            join_id2: Ident::parse(join_id2)?,
        })
    }

    /// Keep only rows whose `table.column` is within the last `days` days.
    pub fn span(mut self, table: &str, column: &str, days: i64) -> OpResult<Self> {
        self.base.span = Some(Span::new(Some(table), column, days)?);
        Ok(self)
    }

    pub fn table(&self) -> &Ident {
        &self.base.table
    }
}

/// ORDER BY and pagination for selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSpec {
    pub(crate) column: Option<Ident>,
    pub(crate) table: Option<Ident>,
    pub(crate) reverse: bool,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

impl OrderSpec {
    /// Descending by `id`, no pagination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Order by this column instead of `id`.
    pub fn column(mut self, column: &str) -> OpResult<Self> {
        self.column = Some(Ident::parse(column)?);
        Ok(self)
    }

    /// Qualify the order column with this table (join selects default to the primary table).
    pub fn table(mut self, table: &str) -> OpResult<Self> {
        self.table = Some(Ident::parse(table)?);
        Ok(self)
    }

    /// `true` sorts ascending; the default is descending.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Maximum rows to return. `0` means no limit, the same as never calling this.
    pub fn limit(mut self, limit: i64) -> OpResult<Self> {
        if limit < 0 {
            return Err(OpError::contract(format!("limit must be >= 0, got {limit}")));
        }
        self.limit = (limit > 0).then_some(limit);
        Ok(self)
    }

    pub fn offset(mut self, offset: i64) -> OpResult<Self> {
        if offset < 0 {
            return Err(OpError::contract(format!("offset must be >= 0, got {offset}")));
        }
        self.offset = Some(offset);
        Ok(self)
    }
}

/// N independent single-column, single-row updates.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec {
    pub(crate) table: Ident,
    pub(crate) set_columns: Vec<Ident>,
    pub(crate) set_values: Vec<Value>,
    pub(crate) select_columns: Vec<Ident>,
    pub(crate) select_values: Vec<Value>,
    pub(crate) older_than: Option<Span>,
}

impl UpdateSpec {
    /// Update `i`: `SET set_columns[i] = set_values[i] WHERE select_columns[i] = select_values[i]`.
    ///
    /// All four sequences must have the same length.
    pub fn new<S, V, W>(
        table: &str,
        set_columns: &[S],
        set_values: Vec<V>,
        select_columns: &[S],
        select_values: Vec<W>,
    ) -> OpResult<Self>
    where
        S: AsRef<str>,
        V: Into<Value>,
        W: Into<Value>,
    {
        let n = set_columns.len();
        check_aligned("update set", n, set_values.len())?;
        check_aligned("update select", select_columns.len(), select_values.len())?;
        if select_columns.len() != n {
            return Err(OpError::contract(format!(
                "update: {n} set columns but {} select columns",
                select_columns.len()
            )));
        }
        Ok(Self {
            table: Ident::parse(table)?,
            set_columns: Ident::parse_all(set_columns)?,
            set_values: set_values.into_iter().map(Into::into).collect(),
            select_columns: Ident::parse_all(select_columns)?,
            select_values: select_values.into_iter().map(Into::into).collect(),
            older_than: None,
        })
    }

    /// Only touch rows whose `column` is older than `days` days.
    pub fn older_than(mut self, column: &str, days: i64) -> OpResult<Self> {
        self.older_than = Some(Span::new(None, column, days)?);
        Ok(self)
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.set_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set_columns.is_empty()
    }
}

/// Single-row insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSpec {
    pub(crate) table: Ident,
    pub(crate) columns: Vec<Ident>,
    pub(crate) values: Vec<Value>,
    pub(crate) returning: Vec<Ident>,
}

impl InsertSpec {
    pub fn new<S, V>(table: &str, columns: &[S], values: Vec<V>) -> OpResult<Self>
    where
        S: AsRef<str>,
        V: Into<Value>,
    {
        if columns.is_empty() {
            return Err(OpError::contract("insert: no columns"));
        }
        check_aligned("insert", columns.len(), values.len())?;
        Ok(Self {
            table: Ident::parse(table)?,
            columns: Ident::parse_all(columns)?,
            values: values.into_iter().map(Into::into).collect(),
            returning: Vec::new(),
        })
    }

    /// Return these columns of the inserted row.
    pub fn returning<S: AsRef<str>>(mut self, columns: &[S]) -> OpResult<Self> {
        self.returning = Ident::parse_all(columns)?;
        Ok(self)
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }
}
