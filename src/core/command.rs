//! Textual statements on top of [`Database`]
//!
//! A thin front end for interactive use. Statements and their keywords are
//! uppercase and case-sensitive:
//!
//! ```text
//! CREATE TABLE users (id:int32 NOT NULL,name:string,is_admin:bool)
//! CREATE INDEX ON users (id)
//! INSERT TO users (id=1,name='Alice',is_admin=false)      -- INTO also accepted
//! SELECT * FROM users [WHERE is_admin=true]
//! UPDATE users SET is_admin=true WHERE id=1
//! DELETE FROM users WHERE id=3
//! BEGIN | COMMIT | ROLLBACK
//! SAVE path | LOAD path
//! ```
//!
//! Assignment lists are split on commas outside single quotes. A trailing
//! `;` is ignored.

use std::fmt;
use std::path::PathBuf;

use super::column_type::ColumnType;
use super::condition::{parse_literal, Condition};
use super::database::Database;
use super::error::{DatabaseError, Result};
use super::schema::{ColumnDef, Schema};
use super::value::{DatabaseResult, DatabaseRow};

/// A parsed statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable { table: String, schema: Schema },
    CreateIndex { table: String, column: String },
    Insert { table: String, values: DatabaseRow },
    Select { table: String, condition: Condition },
    Update { table: String, updates: DatabaseRow, condition: Condition },
    Delete { table: String, condition: Condition },
    Begin,
    Commit,
    Rollback,
    Save(PathBuf),
    Load(PathBuf),
}

/// Result of executing one statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    TableCreated { table: String },
    IndexCreated { table: String, column: String },
    Inserted { table: String, position: usize },
    /// Selected rows together with the table's column order
    Rows { columns: Vec<String>, rows: DatabaseResult },
    Updated { table: String, rows: usize },
    Deleted { table: String, rows: usize },
    TransactionBegan { depth: usize },
    TransactionCommitted { depth: usize },
    TransactionRolledBack { depth: usize },
    Saved { path: PathBuf },
    Loaded { path: PathBuf, tables: usize },
}

impl fmt::Display for ExecOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecOutcome::TableCreated { table } => write!(f, "Table {table} created."),
            ExecOutcome::IndexCreated { table, column } => {
                write!(f, "Index created on {table}.{column}.")
            }
            ExecOutcome::Inserted { table, .. } => write!(f, "Row inserted into {table}."),
            ExecOutcome::Rows { columns, rows } => {
                for row in rows {
                    let cells: Vec<String> = columns
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| format!("{c}: {v}")))
                        .collect();
                    writeln!(f, "{}", cells.join(", "))?;
                }
                write!(f, "({} rows)", rows.len())
            }
            ExecOutcome::Updated { table, rows } => write!(f, "{rows} rows updated in {table}."),
            ExecOutcome::Deleted { table, rows } => write!(f, "{rows} rows deleted from {table}."),
            ExecOutcome::TransactionBegan { depth } => write!(f, "Transaction started (depth {depth})."),
            ExecOutcome::TransactionCommitted { depth } => {
                write!(f, "Transaction committed (depth {depth}).")
            }
            ExecOutcome::TransactionRolledBack { depth } => {
                write!(f, "Transaction rolled back (depth {depth}).")
            }
            ExecOutcome::Saved { path } => write!(f, "Database saved to {}.", path.display()),
            ExecOutcome::Loaded { path, tables } => {
                write!(f, "{tables} tables loaded from {}.", path.display())
            }
        }
    }
}

impl Statement {
    /// Parse one statement.
    ///
    /// # Errors
    ///
    /// `SyntaxError` for unknown or malformed statements, `SchemaError` for
    /// an invalid column list in `CREATE TABLE`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let text = text.strip_suffix(';').unwrap_or(text).trim_end();
        let (keyword, rest) = split_word(text);

        match keyword {
            "CREATE" => {
                let (kind, rest) = split_word(rest);
                match kind {
                    "TABLE" => parse_create_table(rest),
                    "INDEX" => parse_create_index(rest),
                    _ => Err(DatabaseError::syntax(format!(
                        "expected TABLE or INDEX after CREATE, found {kind:?}"
                    ))),
                }
            }
            "INSERT" => parse_insert(rest),
            "SELECT" => parse_select(rest),
            "UPDATE" => parse_update(rest),
            "DELETE" => parse_delete(rest),
            "BEGIN" | "COMMIT" | "ROLLBACK" => {
                if !rest.is_empty() && rest != "TRANSACTION" {
                    return Err(DatabaseError::syntax(format!(
                        "unexpected text after {keyword}: {rest:?}"
                    )));
                }
                Ok(match keyword {
                    "BEGIN" => Statement::Begin,
                    "COMMIT" => Statement::Commit,
                    _ => Statement::Rollback,
                })
            }
            "SAVE" => Ok(Statement::Save(parse_path(keyword, rest)?)),
            "LOAD" => Ok(Statement::Load(parse_path(keyword, rest)?)),
            "" => Err(DatabaseError::syntax("empty statement")),
            _ => Err(DatabaseError::syntax(format!("unknown statement {keyword:?}"))),
        }
    }
}

impl Database {
    /// Parse and run one textual statement
    ///
    /// ```
    /// use rust_table_store::{Database, ExecOutcome};
    ///
    /// let mut db = Database::new();
    /// db.execute("CREATE TABLE users (id:int32,name:string)")?;
    /// db.execute("INSERT TO users (id=1,name='Alice')")?;
    /// match db.execute("SELECT * FROM users WHERE id=1")? {
    ///     ExecOutcome::Rows { rows, .. } => assert_eq!(rows.len(), 1),
    ///     other => panic!("unexpected outcome {other:?}"),
    /// }
    /// # Ok::<(), rust_table_store::DatabaseError>(())
    /// ```
    pub fn execute(&mut self, text: &str) -> Result<ExecOutcome> {
        let statement = Statement::parse(text)?;
        self.run(statement)
    }

    /// Run an already parsed statement
    pub fn run(&mut self, statement: Statement) -> Result<ExecOutcome> {
        match statement {
            Statement::CreateTable { table, schema } => {
                self.create_table(&table, schema)?;
                Ok(ExecOutcome::TableCreated { table })
            }
            Statement::CreateIndex { table, column } => {
                self.create_index(&table, &column)?;
                Ok(ExecOutcome::IndexCreated { table, column })
            }
            Statement::Insert { table, values } => {
                let position = self.insert(&table, values)?;
                Ok(ExecOutcome::Inserted { table, position })
            }
            Statement::Select { table, condition } => {
                let rows = self.select_where(&table, &condition)?;
                let columns = self.table(&table)?.schema().names().map(str::to_string).collect();
                Ok(ExecOutcome::Rows { columns, rows })
            }
            Statement::Update {
                table,
                updates,
                condition,
            } => {
                let rows = self.update_where(&table, &condition, &updates)?;
                Ok(ExecOutcome::Updated { table, rows })
            }
            Statement::Delete { table, condition } => {
                let rows = self.remove_where(&table, &condition)?;
                Ok(ExecOutcome::Deleted { table, rows })
            }
            Statement::Begin => {
                self.begin_transaction();
                Ok(ExecOutcome::TransactionBegan {
                    depth: self.transaction_depth(),
                })
            }
            Statement::Commit => {
                self.commit_transaction()?;
                Ok(ExecOutcome::TransactionCommitted {
                    depth: self.transaction_depth(),
                })
            }
            Statement::Rollback => {
                self.rollback_transaction()?;
                Ok(ExecOutcome::TransactionRolledBack {
                    depth: self.transaction_depth(),
                })
            }
            Statement::Save(path) => {
                self.save(&path)?;
                Ok(ExecOutcome::Saved { path })
            }
            Statement::Load(path) => {
                let tables = self.load(&path)?;
                Ok(ExecOutcome::Loaded { path, tables })
            }
        }
    }
}

// CREATE TABLE name (col:type [NOT NULL], ...)
fn parse_create_table(rest: &str) -> Result<Statement> {
    let (table, body) = parenthesized(rest, "CREATE TABLE")?;
    let mut columns = Vec::new();
    for def in body.split(',') {
        let (name, ty) = def.split_once(':').ok_or_else(|| {
            DatabaseError::syntax(format!("column definition {:?} must be name:type", def.trim()))
        })?;
        let ty = ty.trim();
        let (ty, not_null) = match ty.strip_suffix("NOT NULL") {
            Some(base) => (base.trim_end(), true),
            None => (ty, false),
        };
        let column = ColumnDef::new(name, ty.parse::<ColumnType>()?);
        columns.push(if not_null { column.not_null() } else { column });
    }
    Ok(Statement::CreateTable {
        table: table.to_string(),
        schema: Schema::new(columns)?,
    })
}

// CREATE INDEX ON name (column)
fn parse_create_index(rest: &str) -> Result<Statement> {
    let (on, rest) = split_word(rest);
    if on != "ON" {
        return Err(DatabaseError::syntax("expected ON after CREATE INDEX"));
    }
    let (table, column) = parenthesized(rest, "CREATE INDEX")?;
    let column = column.trim();
    if column.is_empty() {
        return Err(DatabaseError::syntax("CREATE INDEX needs a column"));
    }
    Ok(Statement::CreateIndex {
        table: table.to_string(),
        column: column.to_string(),
    })
}

// INSERT TO|INTO name (col=literal, ...)
fn parse_insert(rest: &str) -> Result<Statement> {
    let (to, rest) = split_word(rest);
    if to != "TO" && to != "INTO" {
        return Err(DatabaseError::syntax("expected TO or INTO after INSERT"));
    }
    let (table, body) = parenthesized(rest, "INSERT")?;
    let values = if body.trim().is_empty() {
        DatabaseRow::new()
    } else {
        parse_assignments(body)?
    };
    Ok(Statement::Insert {
        table: table.to_string(),
        values,
    })
}

// SELECT * FROM name [WHERE condition]
fn parse_select(rest: &str) -> Result<Statement> {
    let (columns, rest) = split_word(rest);
    if columns != "*" {
        return Err(DatabaseError::syntax("only SELECT * is supported"));
    }
    let (from, rest) = split_word(rest);
    if from != "FROM" {
        return Err(DatabaseError::syntax("expected FROM after SELECT *"));
    }
    let (table, rest) = split_word(rest);
    let table = require_table(table)?;
    let condition = if rest.is_empty() {
        Condition::Literal(true)
    } else {
        parse_where(rest)?
    };
    Ok(Statement::Select { table, condition })
}

// UPDATE name SET col=literal, ... WHERE condition
fn parse_update(rest: &str) -> Result<Statement> {
    let (table, rest) = split_word(rest);
    let table = require_table(table)?;
    let (set, rest) = split_word(rest);
    if set != "SET" {
        return Err(DatabaseError::syntax("expected SET after UPDATE table"));
    }
    let split = find_outside_quotes(rest, " WHERE ")
        .ok_or_else(|| DatabaseError::syntax("UPDATE requires a WHERE clause"))?;
    let updates = parse_assignments(&rest[..split])?;
    let condition = parse_where(&rest[split..])?;
    Ok(Statement::Update {
        table,
        updates,
        condition,
    })
}

// DELETE FROM name WHERE condition
fn parse_delete(rest: &str) -> Result<Statement> {
    let (from, rest) = split_word(rest);
    if from != "FROM" {
        return Err(DatabaseError::syntax("expected FROM after DELETE"));
    }
    let (table, rest) = split_word(rest);
    let table = require_table(table)?;
    if rest.is_empty() {
        return Err(DatabaseError::syntax("DELETE requires a WHERE clause"));
    }
    let condition = parse_where(rest)?;
    Ok(Statement::Delete { table, condition })
}

fn parse_where(clause: &str) -> Result<Condition> {
    let (keyword, condition) = split_word(clause);
    if keyword != "WHERE" {
        return Err(DatabaseError::syntax(format!("expected WHERE, found {keyword:?}")));
    }
    if condition.is_empty() {
        return Err(DatabaseError::syntax("empty WHERE clause"));
    }
    Condition::parse(condition)
}

fn parse_assignments(text: &str) -> Result<DatabaseRow> {
    let mut row = DatabaseRow::new();
    for part in split_outside_quotes(text, ',') {
        let (column, literal) = part.split_once('=').ok_or_else(|| {
            DatabaseError::syntax(format!("assignment {:?} must be column=value", part.trim()))
        })?;
        let column = column.trim();
        if column.is_empty() {
            return Err(DatabaseError::syntax(format!("assignment {:?} names no column", part.trim())));
        }
        if row.insert(column.to_string(), parse_literal(literal)?).is_some() {
            return Err(DatabaseError::syntax(format!("column '{column}' assigned twice")));
        }
    }
    Ok(row)
}

fn parse_path(keyword: &str, rest: &str) -> Result<PathBuf> {
    let path = rest
        .strip_prefix('\'')
        .and_then(|p| p.strip_suffix('\''))
        .unwrap_or(rest);
    if path.is_empty() {
        return Err(DatabaseError::syntax(format!("{keyword} needs a path")));
    }
    Ok(PathBuf::from(path))
}

fn require_table(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(DatabaseError::syntax("missing table name"));
    }
    Ok(name.to_string())
}

/// Split `head (body)` into the trimmed head and the body
fn parenthesized<'a>(text: &'a str, statement: &str) -> Result<(&'a str, &'a str)> {
    let open = text
        .find('(')
        .ok_or_else(|| DatabaseError::syntax(format!("{statement}: expected '('")))?;
    let close = text
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or_else(|| DatabaseError::syntax(format!("{statement}: expected ')'")))?;
    if !text[close + 1..].trim().is_empty() {
        return Err(DatabaseError::syntax(format!(
            "{statement}: unexpected text after ')'"
        )));
    }
    let head = text[..open].trim();
    if head.is_empty() || head.contains(char::is_whitespace) {
        return Err(DatabaseError::syntax(format!(
            "{statement}: expected a single table name before '('"
        )));
    }
    Ok((head, &text[open + 1..close]))
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    }
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn find_outside_quotes(text: &str, pattern: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        } else if !quoted && text[i..].starts_with(pattern) {
            return Some(i);
        }
    }
    None
}
