//! Boolean condition language used by select, update and remove
//!
//! A condition string is parsed once into a [`Condition`] tree and the tree
//! is then evaluated against every row. The grammar is deliberately small:
//!
//! ```text
//! expr       := "true" | "false" | expr " AND " expr | expr " OR " expr
//!             | "NOT " expr | comparison
//! comparison := column "=" literal
//! literal    := 'text' | true | false | NULL | null | <empty> | integer
//! ```
//!
//! Keywords are case-sensitive. `AND` is split at its first occurrence
//! before `OR` is considered, and `NOT` is only recognised as a prefix.
//! There are no parentheses and quoted text is not scanned for keywords,
//! so `name='a AND b'` splits inside the quotes.
//!
//! A comparison against `NULL` (or an empty literal) is an IS NULL test.
//!
//! Trees are at most [`MAX_CONDITION_DEPTH`] levels deep; each `AND`, `OR`
//! or `NOT` adds one level.

use std::str::FromStr;

use super::error::{DatabaseError, Result};
use super::value::{DatabaseRow, Value};

/// Deepest tree [`Condition::parse`] accepts
pub const MAX_CONDITION_DEPTH: usize = 256;

/// Read access to the cells of one row by column name
pub trait RowView {
    /// Cell for `column`, or `None` when the row has no such column
    fn get(&self, column: &str) -> Option<&Value>;
}

impl RowView for DatabaseRow {
    fn get(&self, column: &str) -> Option<&Value> {
        DatabaseRow::get(self, column)
    }
}

/// Parsed condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `true` or `false`, the same result for every row
    Literal(bool),
    /// `column=literal`; a [`Value::Null`] literal tests for null
    Comparison { column: String, value: Value },
    /// Both sides hold
    And(Box<Condition>, Box<Condition>),
    /// Either side holds
    Or(Box<Condition>, Box<Condition>),
    /// Negation of the inner condition
    Not(Box<Condition>),
}

/// How a comparison treats a cell whose variant differs from the literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mismatch {
    Raise,
    NoMatch,
}

impl Condition {
    /// Parse condition text.
    ///
    /// # Errors
    ///
    /// Returns `SyntaxError` when a comparison lacks `=`, names no column,
    /// carries a literal that is neither quoted, boolean, null nor an
    /// `i32` integer, or when the operators nest deeper than
    /// [`MAX_CONDITION_DEPTH`].
    ///
    /// ```
    /// use rust_table_store::{Condition, Value};
    ///
    /// let cond = Condition::parse("is_admin=true").unwrap();
    /// assert_eq!(
    ///     cond,
    ///     Condition::Comparison { column: "is_admin".into(), value: Value::Bool(true) }
    /// );
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_nested(text, 0)
    }

    fn parse_nested(text: &str, depth: usize) -> Result<Self> {
        let text = text.trim();
        if depth > MAX_CONDITION_DEPTH {
            return Err(DatabaseError::syntax(format!(
                "condition nests deeper than {MAX_CONDITION_DEPTH} levels"
            )));
        }

        match text {
            "true" => return Ok(Condition::Literal(true)),
            "false" => return Ok(Condition::Literal(false)),
            _ => {}
        }

        if let Some((left, right)) = text.split_once(" AND ") {
            return Ok(Condition::And(
                Box::new(Self::parse_nested(left, depth + 1)?),
                Box::new(Self::parse_nested(right, depth + 1)?),
            ));
        }
        if let Some((left, right)) = text.split_once(" OR ") {
            return Ok(Condition::Or(
                Box::new(Self::parse_nested(left, depth + 1)?),
                Box::new(Self::parse_nested(right, depth + 1)?),
            ));
        }
        if let Some(inner) = text.strip_prefix("NOT ") {
            return Ok(Condition::Not(Box::new(Self::parse_nested(inner, depth + 1)?)));
        }

        Self::parse_comparison(text)
    }

    fn parse_comparison(text: &str) -> Result<Self> {
        let (column, literal) = text
            .split_once('=')
            .ok_or_else(|| DatabaseError::syntax(format!("expected '=' in condition: {text}")))?;

        let column = column.trim();
        if column.is_empty() {
            return Err(DatabaseError::syntax(format!(
                "column name is empty in condition: {text}"
            )));
        }

        Ok(Condition::Comparison {
            column: column.to_string(),
            value: parse_literal(literal)?,
        })
    }

    /// Evaluate strictly: comparing a column against a literal of another
    /// type is a `TypeMismatch`.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` when the row has no such column, `TypeMismatch` as
    /// described above.
    pub fn evaluate<R: RowView + ?Sized>(&self, row: &R) -> Result<bool> {
        self.eval(row, Mismatch::Raise)
    }

    /// Evaluate as a filter: a type mismatch makes the comparison false
    /// instead of failing, so a scan over mixed data never aborts.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` when the row has no such column.
    pub fn matches<R: RowView + ?Sized>(&self, row: &R) -> Result<bool> {
        self.eval(row, Mismatch::NoMatch)
    }

    fn eval<R: RowView + ?Sized>(&self, row: &R, mismatch: Mismatch) -> Result<bool> {
        match self {
            Condition::Literal(b) => Ok(*b),
            Condition::And(left, right) => {
                Ok(left.eval(row, mismatch)? && right.eval(row, mismatch)?)
            }
            Condition::Or(left, right) => {
                Ok(left.eval(row, mismatch)? || right.eval(row, mismatch)?)
            }
            Condition::Not(inner) => Ok(!inner.eval(row, mismatch)?),
            Condition::Comparison { column, value } => {
                let cell = row
                    .get(column)
                    .ok_or_else(|| DatabaseError::column_not_found(column.as_str()))?;
                compare(column, cell, value, mismatch)
            }
        }
    }

    /// Column names referenced anywhere in the tree, in textual order
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Literal(_) => {}
            Condition::Comparison { column, .. } => out.push(column),
            Condition::And(left, right) | Condition::Or(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Condition::Not(inner) => inner.collect_columns(out),
        }
    }
}

impl FromStr for Condition {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        Condition::parse(s)
    }
}

fn compare(column: &str, cell: &Value, literal: &Value, mismatch: Mismatch) -> Result<bool> {
    if literal.is_null() {
        return Ok(cell.is_null());
    }
    // a null cell never equals a typed literal
    if cell.is_null() {
        return Ok(false);
    }
    if !cell.same_variant(literal) {
        return match mismatch {
            Mismatch::Raise => Err(DatabaseError::type_mismatch(
                column,
                literal.type_name(),
                cell.type_name(),
            )),
            Mismatch::NoMatch => Ok(false),
        };
    }
    Ok(cell == literal)
}

/// Parse the right-hand side of a comparison (or an assignment) into a value.
///
/// `'...'` is text with the quotes stripped verbatim, `true`/`false` are
/// booleans, an empty literal or `NULL`/`null` is null, anything else must
/// be an `i32`.
pub fn parse_literal(text: &str) -> Result<Value> {
    let text = text.trim();

    if text.is_empty() || text == "NULL" || text == "null" {
        return Ok(Value::Null);
    }

    if let Some(rest) = text.strip_prefix('\'') {
        return match rest.strip_suffix('\'') {
            Some(inner) => Ok(Value::Text(inner.to_string())),
            None => Err(DatabaseError::syntax(format!(
                "unterminated string literal: {text}"
            ))),
        };
    }

    match text {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => text
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|_| DatabaseError::syntax(format!("unsupported literal: {text}"))),
    }
}
