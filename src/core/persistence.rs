//! Text persistence of tables
//!
//! Each table is written as:
//!
//! ```text
//! <table-name>
//! <column-count>
//! <col-name> <col-type>        (column-count lines)
//! <row-count>
//! <cell> <cell> ... <cell>     (row-count lines)
//! ```
//!
//! where a cell is `null`, `int <i32>`, `string <token>` or
//! `bool true|false`. The format is whitespace-tokenised, so names, types
//! and strings must be non-empty single tokens to be saved.
//! Schemas carry no constraints and indices are not stored.

use std::fmt::Write as _;
use std::io::{BufRead, Write};

use super::column_type::ColumnType;
use super::config::DatabaseConfig;
use super::error::{DatabaseError, Result};
use super::schema::{ColumnDef, Schema};
use super::table::Table;
use super::value::Value;

/// Serialize `tables` in order to `writer`.
///
/// The whole document is rendered before anything is written, so a table
/// that cannot be represented leaves the writer untouched. Writer failures
/// are reported as `PersistenceError`.
pub fn write_tables<'a, W, I>(writer: &mut W, tables: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a Table)>,
{
    let mut out = String::new();
    for (name, table) in tables {
        render_table(&mut out, name, table)?;
    }
    writer
        .write_all(out.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| DatabaseError::persistence(format!("cannot write tables: {e}")))
}

fn render_table(out: &mut String, name: &str, table: &Table) -> Result<()> {
    require_token("table name", name)?;
    // writing into a String cannot fail
    let _ = writeln!(out, "{name}");
    let _ = writeln!(out, "{}", table.columns().len());
    for column in table.columns() {
        require_token("column name", &column.name)?;
        require_token("column type", column.column_type.as_str())?;
        let _ = writeln!(out, "{} {}", column.name, column.column_type);
    }
    let _ = writeln!(out, "{}", table.len());
    for row in table.rows() {
        let mut cells = Vec::with_capacity(row.len());
        for value in row {
            cells.push(match value {
                Value::Null => "null".to_string(),
                Value::Int(v) => format!("int {v}"),
                Value::Bool(v) => format!("bool {v}"),
                Value::Text(s) => {
                    require_token("string cell", s)?;
                    format!("string {s}")
                }
            });
        }
        let _ = writeln!(out, "{}", cells.join(" "));
    }
    Ok(())
}

fn require_token(what: &str, text: &str) -> Result<()> {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return Err(DatabaseError::persistence(format!(
            "{what} {text:?} is not a non-empty token without whitespace"
        )));
    }
    Ok(())
}

/// Parse every table in `reader`, in file order.
///
/// # Errors
///
/// `PersistenceError` for table names containing whitespace, empty or
/// non-numeric counts, column counts
/// outside `1..=max_columns`, row counts above `max_rows`, malformed cell
/// lines, unknown cell tags or cells that disagree with their column type.
pub fn read_tables<R: BufRead>(reader: R, config: &DatabaseConfig) -> Result<Vec<(String, Table)>> {
    let mut lines = LineReader::new(reader);
    let mut tables = Vec::new();

    while let Some(name) = lines.next_nonblank()? {
        let name = name.trim().to_string();
        require_token("table name", &name)?;
        let table = read_table(&mut lines, &name, config)?;
        tables.push((name, table));
    }
    Ok(tables)
}

fn read_table<R: BufRead>(
    lines: &mut LineReader<R>,
    name: &str,
    config: &DatabaseConfig,
) -> Result<Table> {
    let col_count = lines.read_count(name, "column count")?;
    if col_count == 0 || col_count > config.max_columns {
        return Err(DatabaseError::persistence(format!(
            "table '{name}': column count {col_count} is outside 1..={}",
            config.max_columns
        )));
    }

    let mut columns = Vec::with_capacity(col_count);
    for _ in 0..col_count {
        let line = lines.require(name, "column definition")?;
        let mut tokens = line.split_whitespace();
        let (col_name, col_type) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(n), Some(t), None) => (n, t),
            _ => {
                return Err(DatabaseError::persistence(format!(
                    "table '{name}': malformed column definition {line:?} at line {}",
                    lines.line_no
                )))
            }
        };
        let column_type = col_type
            .parse::<ColumnType>()
            .map_err(|e| DatabaseError::persistence(format!("table '{name}': {e}")))?;
        columns.push(ColumnDef::new(col_name, column_type));
    }
    let schema = Schema::new(columns)
        .map_err(|e| DatabaseError::persistence(format!("table '{name}': {e}")))?;

    let row_count = lines.read_count(name, "row count")?;
    if row_count > config.max_rows {
        return Err(DatabaseError::persistence(format!(
            "table '{name}': row count {row_count} exceeds limit {}",
            config.max_rows
        )));
    }

    let mut rows = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let line = lines.require(name, "row")?;
        let row = parse_row(&line, &schema).map_err(|msg| {
            DatabaseError::persistence(format!(
                "table '{name}': row {i} (line {}): {msg}",
                lines.line_no
            ))
        })?;
        rows.push(row);
    }

    Table::from_rows(schema, rows)
        .map_err(|e| DatabaseError::persistence(format!("table '{name}': {e}")))
}

fn parse_row(line: &str, schema: &Schema) -> std::result::Result<Vec<Value>, String> {
    let mut tokens = line.split_whitespace();
    let mut row = Vec::with_capacity(schema.len());

    for column in schema.columns() {
        let tag = tokens
            .next()
            .ok_or_else(|| format!("missing cell for column '{}'", column.name))?;
        let value = match tag {
            "null" => Value::Null,
            "int" => {
                let raw = tokens.next().ok_or("missing integer after 'int'")?;
                raw.parse::<i32>()
                    .map(Value::Int)
                    .map_err(|_| format!("invalid integer value {raw:?}"))?
            }
            "string" => Value::Text(
                tokens
                    .next()
                    .ok_or("missing text after 'string'")?
                    .to_string(),
            ),
            "bool" => match tokens.next() {
                Some("true") => Value::Bool(true),
                Some("false") => Value::Bool(false),
                other => return Err(format!("invalid boolean value {other:?}")),
            },
            unknown => return Err(format!("unknown type tag {unknown:?}")),
        };
        row.push(value);
    }

    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected trailing token {extra:?}"));
    }
    Ok(row)
}

struct LineReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_nonblank(&mut self) -> Result<Option<String>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    fn require(&mut self, table: &str, what: &str) -> Result<String> {
        self.next_nonblank()?.ok_or_else(|| {
            DatabaseError::persistence(format!("table '{table}': unexpected end of file, expected {what}"))
        })
    }

    fn read_count(&mut self, table: &str, what: &str) -> Result<usize> {
        let line = self.require(table, what)?;
        let line = line.trim();
        line.parse::<usize>().map_err(|_| {
            DatabaseError::persistence(format!(
                "table '{table}': invalid {what} {line:?} at line {}",
                self.line_no
            ))
        })
    }
}
