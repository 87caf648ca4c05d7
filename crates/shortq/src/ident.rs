//! Identifier-class placeholders.
//!
//! Postgres cannot bind table or column names as parameters, so identifiers are
//! validated once, when a request is constructed, and written inline into the
//! statement template. Value-class placeholders (`$n`) never carry identifiers.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`
//!
//! # Example
//! ```ignore
//! use shortq::Ident;
//!
//! let t = Ident::parse("public.shortenurl")?;
//! let c = Ident::parse(r#""ShortUrl""#)?;
//! # Ok::<(), shortq::OpError>(())
//! ```

use crate::error::{OpError, OpResult};
use std::fmt;

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
}

impl IdentPart {
    fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A validated SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable".id`
    pub fn parse(s: &str) -> OpResult<Self> {
        if s.is_empty() {
            return Err(OpError::contract("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OpError::contract("identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') if chars.peek().is_none() => {
                        return Err(invalid(s, "trailing '.'"));
                    }
                    Some('.') => {}
                    Some(c) => {
                        return Err(invalid(s, &format!("expected '.' between parts, got '{c}'")));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            name.push('"');
                        }
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => return Err(invalid(s, "unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(invalid(s, "empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(invalid(s, &format!("invalid character '{c}'")));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(invalid(s, "empty identifier segment"));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// A single unquoted segment known to be valid at compile time.
    pub(crate) fn known(name: &'static str) -> Self {
        debug_assert!(Self::parse(name).is_ok(), "invalid built-in identifier {name}");
        Self {
            parts: vec![IdentPart::Unquoted(name.to_string())],
        }
    }

    /// Parse a list of identifiers, failing on the first invalid one.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> OpResult<Vec<Self>> {
        names.iter().map(|n| Self::parse(n.as_ref())).collect()
    }

    /// Prefix this identifier with a table qualifier (`table.column`).
    ///
    /// A name that already has more than one segment is returned unchanged.
    pub fn qualified_by(&self, table: &Ident) -> Ident {
        if self.is_qualified() {
            return self.clone();
        }
        let mut parts = table.parts.clone();
        parts.extend(self.parts.iter().cloned());
        Ident { parts }
    }

    /// Whether the identifier has more than one segment (`table.column`).
    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// The last segment of the identifier, without quoting.
    pub fn base_name(&self) -> &str {
        self.parts.last().map(IdentPart::name).unwrap_or_default()
    }

    /// Whether the last segment equals `name` (case-sensitive).
    pub fn is_named(&self, name: &str) -> bool {
        self.base_name() == name
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    for ch in s.chars() {
                        if ch == '"' {
                            out.push_str("\"\"");
                        } else {
                            out.push(ch);
                        }
                    }
                    out.push('"');
                }
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn invalid(ident: &str, reason: &str) -> OpError {
    OpError::contract(format!("invalid identifier '{ident}': {reason}"))
}
