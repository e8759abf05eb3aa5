//! In-process executor.
//!
//! Tables live in a `RwLock`ed map. Compiled predicates are parsed back from their
//! template text and evaluated per row with SQL three-valued logic: a comparison
//! involving NULL is unknown, `AND`/`OR` follow Kleene semantics and only rows whose
//! predicate is true are selected, updated or deleted.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    DeleteRequest, ExecutionError, InsertRequest, Row, SelectRequest, TableExecutor,
    UpdateRequest,
};
use crate::condition::{ComparisonOperator, Dialect, LogicalOperator, Predicate};
use crate::value::Value;

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    identity: Option<Identity>,
}

#[derive(Debug, Clone, Copy)]
struct Identity {
    column: usize,
    next: i64,
}

impl MemoryTable {
    fn column_index(&self, table: &str, column: &str) -> Result<usize, ExecutionError> {
        self.columns.iter().position(|c| c == column).ok_or_else(|| {
            ExecutionError::QueryError(format!(
                "column \"{column}\" of relation \"{table}\" does not exist"
            ))
        })
    }

    fn to_row(&self, cells: &[Value]) -> Row {
        self.columns
            .iter()
            .cloned()
            .zip(cells.iter().cloned())
            .collect()
    }
}

/// [`TableExecutor`] over in-memory tables.
///
/// ```
/// use tablefacade::{MemoryExecutor, TableExecutor};
///
/// let executor = MemoryExecutor::new();
/// executor.create_table_with_identity("sample", &["id", "name", "flag"], "id");
/// assert!(executor.table_exists("sample").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    dialect: Dialect,
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect predicates compiled for `dialect` instead of PostgreSQL.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Create (or replace) an empty table.
    pub fn create_table(&self, table_name: &str, columns: &[&str]) {
        self.install(table_name, columns, None);
    }

    /// Create (or replace) an empty table whose `identity` column is assigned
    /// 1, 2, 3, ... when an insert leaves it NULL.
    pub fn create_table_with_identity(&self, table_name: &str, columns: &[&str], identity: &str) {
        let column = columns.iter().position(|c| *c == identity);
        if column.is_none() {
            log::warn!("Identity column {identity} is not a column of {table_name}");
        }
        let identity = column.map(|column| Identity { column, next: 1 });
        self.install(table_name, columns, identity);
    }

    /// Number of stored rows, `None` if the table does not exist.
    pub fn row_count(&self, table_name: &str) -> Option<usize> {
        self.read()
            .ok()?
            .get(table_name)
            .map(|table| table.rows.len())
    }

    fn install(&self, table_name: &str, columns: &[&str], identity: Option<Identity>) {
        let table = MemoryTable {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
            identity,
        };
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tables.insert(table_name.to_string(), table);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, MemoryTable>>, ExecutionError> {
        self.tables
            .read()
            .map_err(|_| ExecutionError::Other("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, MemoryTable>>, ExecutionError> {
        self.tables
            .write()
            .map_err(|_| ExecutionError::Other("memory store lock poisoned".to_string()))
    }

    fn filter(
        &self,
        table_name: &str,
        table: &MemoryTable,
        predicate: Option<&Predicate>,
    ) -> Result<Filter, ExecutionError> {
        match predicate {
            Some(predicate) => Ok(Filter::Where(parse_predicate(
                self.dialect,
                table_name,
                table,
                predicate,
            )?)),
            None => Ok(Filter::All),
        }
    }
}

fn identity_exhausted(table_name: &str) -> ExecutionError {
    ExecutionError::QueryError(format!(
        "identity column of \"{table_name}\" reached its maximum value"
    ))
}

fn table_mut<'a>(
    tables: &'a mut HashMap<String, MemoryTable>,
    table_name: &str,
) -> Result<&'a mut MemoryTable, ExecutionError> {
    tables
        .get_mut(table_name)
        .ok_or_else(|| ExecutionError::TableNotFound(table_name.to_string()))
}

impl TableExecutor for MemoryExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn insert(&self, request: &InsertRequest<'_>) -> Result<Option<Row>, ExecutionError> {
        let mut tables = self.write()?;
        let table = table_mut(&mut tables, request.table_name)?;

        let mut cells = vec![Value::Null; table.columns.len()];
        for (column, value) in request.values {
            let idx = table.column_index(request.table_name, column)?;
            cells[idx] = value.clone();
        }
        if let Some(identity) = table.identity.as_mut() {
            match cells[identity.column].as_i64() {
                Some(explicit) => {
                    let after = explicit
                        .checked_add(1)
                        .ok_or_else(|| identity_exhausted(request.table_name))?;
                    identity.next = identity.next.max(after);
                }
                None if cells[identity.column].is_null() => {
                    let assigned = identity.next;
                    identity.next = assigned
                        .checked_add(1)
                        .ok_or_else(|| identity_exhausted(request.table_name))?;
                    cells[identity.column] = match i32::try_from(assigned) {
                        Ok(id) => Value::Int(id),
                        Err(_) => Value::BigInt(assigned),
                    };
                }
                None => {}
            }
        }

        log::trace!("memory insert into {}: {cells:?}", request.table_name);
        let row = table.to_row(&cells);
        table.rows.push(cells);
        Ok(Some(row))
    }

    fn select(&self, request: &SelectRequest<'_>) -> Result<Vec<Row>, ExecutionError> {
        let tables = self.read()?;
        let table = tables
            .get(request.table_name)
            .ok_or_else(|| ExecutionError::TableNotFound(request.table_name.to_string()))?;
        let filter = self.filter(request.table_name, table, request.predicate)?;

        let matched = filter.matching(&table.rows)?;
        Ok(table
            .rows
            .iter()
            .zip(matched)
            .filter(|(_, hit)| *hit)
            .map(|(cells, _)| table.to_row(cells))
            .collect())
    }

    fn update(&self, request: &UpdateRequest<'_>) -> Result<u64, ExecutionError> {
        if request.values.is_empty() {
            return Err(ExecutionError::QueryError(format!(
                "UPDATE of \"{}\" has no columns to set",
                request.table_name
            )));
        }
        let mut tables = self.write()?;
        let table = table_mut(&mut tables, request.table_name)?;

        let assignments = request
            .values
            .iter()
            .map(|(column, value)| Ok((table.column_index(request.table_name, column)?, value)))
            .collect::<Result<Vec<_>, ExecutionError>>()?;
        let filter = self.filter(request.table_name, table, Some(request.predicate))?;

        // every row is evaluated before any is written
        let matched = filter.matching(&table.rows)?;
        let mut affected = 0;
        for (cells, _) in table.rows.iter_mut().zip(matched).filter(|(_, hit)| *hit) {
            for (idx, value) in &assignments {
                cells[*idx] = (*value).clone();
            }
            affected += 1;
        }
        Ok(affected)
    }

    fn delete(&self, request: &DeleteRequest<'_>) -> Result<u64, ExecutionError> {
        let mut tables = self.write()?;
        let table = table_mut(&mut tables, request.table_name)?;
        let filter = self.filter(request.table_name, table, request.predicate)?;

        let matched = filter.matching(&table.rows)?;
        let before = table.rows.len();
        let mut verdicts = matched.into_iter();
        table.rows.retain(|_| !verdicts.next().unwrap_or(false));
        Ok((before - table.rows.len()) as u64)
    }

    fn table_exists(&self, table_name: &str) -> Result<bool, ExecutionError> {
        Ok(self.read()?.contains_key(table_name))
    }

    fn drop_table(&self, table_name: &str) -> Result<(), ExecutionError> {
        match self.write()?.remove(table_name) {
            Some(_) => Ok(()),
            None => Err(ExecutionError::DropTableFailed {
                table: table_name.to_string(),
                reason: format!("relation \"{table_name}\" does not exist"),
            }),
        }
    }
}

/// Predicate resolved against a table: columns are cell indexes, literals are bound.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Compare {
        column: usize,
        operator: ComparisonOperator,
        value: Value,
    },
    Logical {
        operator: LogicalOperator,
        operands: Vec<Expr>,
    },
}

impl Expr {
    /// `None` is SQL UNKNOWN.
    fn eval(&self, cells: &[Value]) -> Result<Option<bool>, ExecutionError> {
        match self {
            Expr::Compare {
                column,
                operator,
                value,
            } => {
                let cell = &cells[*column];
                if cell.is_null() || value.is_null() {
                    return Ok(None);
                }
                let ordering = cell.compare(value).ok_or_else(|| {
                    ExecutionError::QueryError(format!(
                        "operator does not exist: {} {} {}",
                        cell.type_name(),
                        operator.symbol(),
                        value.type_name()
                    ))
                })?;
                Ok(Some(operator.holds(ordering)))
            }
            Expr::Logical { operator, operands } => {
                let (short_circuit, mut result) = match operator {
                    LogicalOperator::And => (false, Some(true)),
                    LogicalOperator::Or => (true, Some(false)),
                };
                for operand in operands {
                    match operand.eval(cells)? {
                        Some(v) if v == short_circuit => return Ok(Some(v)),
                        Some(_) => {}
                        None => result = None,
                    }
                }
                Ok(result)
            }
        }
    }
}

enum Filter {
    All,
    Where(Expr),
}

impl Filter {
    fn matches(&self, cells: &[Value]) -> Result<bool, ExecutionError> {
        match self {
            Filter::All => Ok(true),
            Filter::Where(expr) => Ok(expr.eval(cells)? == Some(true)),
        }
    }

    /// One verdict per row, or the first evaluation error.
    fn matching(&self, rows: &[Vec<Value>]) -> Result<Vec<bool>, ExecutionError> {
        rows.iter().map(|cells| self.matches(cells)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    /// `$n`, or `None` for a positional `?`
    Placeholder(Option<usize>),
    Operator(ComparisonOperator),
    Keyword(LogicalOperator),
    Open,
    Close,
}

fn parse_error(template: &str, detail: impl std::fmt::Display) -> ExecutionError {
    ExecutionError::QueryError(format!("malformed predicate \"{template}\": {detail}"))
}

fn tokenize(template: &str) -> Result<Vec<Token>, ExecutionError> {
    let mut tokens = Vec::new();
    let mut chars = template.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '?' => {
                chars.next();
                tokens.push(Token::Placeholder(None));
            }
            '$' => {
                chars.next();
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                let index = digits
                    .parse()
                    .map_err(|_| parse_error(template, "placeholder without index"))?;
                tokens.push(Token::Placeholder(Some(index)));
            }
            '"' | '`' => {
                chars.next();
                let mut ident = String::new();
                loop {
                    match chars.next() {
                        Some(q) if q == c => {
                            // doubled quote is an escaped quote
                            if chars.peek() == Some(&c) {
                                chars.next();
                                ident.push(c);
                            } else {
                                break;
                            }
                        }
                        Some(other) => ident.push(other),
                        None => return Err(parse_error(template, "unterminated identifier")),
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '=' | '<' | '>' | '!' => {
                let mut symbol = String::new();
                while let Some(s) = chars.peek().copied().filter(|s| "=<>!".contains(*s)) {
                    symbol.push(s);
                    chars.next();
                }
                let operator = ComparisonOperator::from_symbol(&symbol).ok_or_else(|| {
                    parse_error(template, format!("unknown operator {symbol}"))
                })?;
                tokens.push(Token::Operator(operator));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(w) = chars
                    .peek()
                    .copied()
                    .filter(|w| w.is_alphanumeric() || *w == '_')
                {
                    word.push(w);
                    chars.next();
                }
                tokens.push(match word.to_ascii_uppercase().as_str() {
                    "AND" => Token::Keyword(LogicalOperator::And),
                    "OR" => Token::Keyword(LogicalOperator::Or),
                    _ => Token::Ident(word),
                });
            }
            other => return Err(parse_error(template, format!("unexpected '{other}'"))),
        }
    }
    Ok(tokens)
}

/// Recursive descent over `expr := and (OR and)*`, `and := primary (AND primary)*`,
/// `primary := '(' expr ')' | ident op placeholder`.
struct Parser<'a> {
    template: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    table_name: &'a str,
    table: &'a MemoryTable,
    predicate: &'a Predicate,
    dialect: Dialect,
    positional: usize,
}

impl Parser<'_> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expr(&mut self, operator: LogicalOperator) -> Result<Expr, ExecutionError> {
        let mut operands = vec![self.operand(operator)?];
        while self.peek() == Some(&Token::Keyword(operator)) {
            self.pos += 1;
            operands.push(self.operand(operator)?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::Logical { operator, operands }
        })
    }

    fn operand(&mut self, level: LogicalOperator) -> Result<Expr, ExecutionError> {
        match level {
            LogicalOperator::Or => self.expr(LogicalOperator::And),
            LogicalOperator::And => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ExecutionError> {
        match self.next() {
            Some(Token::Open) => {
                let inner = self.expr(LogicalOperator::Or)?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(parse_error(self.template, "missing ')'")),
                }
            }
            Some(Token::Ident(column)) => {
                let column = self.table.column_index(self.table_name, &column)?;
                let operator = match self.next() {
                    Some(Token::Operator(operator)) => operator,
                    _ => return Err(parse_error(self.template, "expected comparison operator")),
                };
                let value = match self.next() {
                    Some(Token::Placeholder(index)) => self.bind(index)?,
                    _ => return Err(parse_error(self.template, "expected placeholder")),
                };
                Ok(Expr::Compare {
                    column,
                    operator,
                    value,
                })
            }
            other => Err(parse_error(
                self.template,
                format!("unexpected token {other:?}"),
            )),
        }
    }

    fn bind(&mut self, index: Option<usize>) -> Result<Value, ExecutionError> {
        let offset = match (index, self.dialect) {
            (Some(n), Dialect::Postgres) => n.checked_sub(self.predicate.first_index()),
            (None, Dialect::MySql) => {
                self.positional += 1;
                Some(self.positional - 1)
            }
            _ => {
                return Err(parse_error(
                    self.template,
                    format!("placeholder style does not match {:?}", self.dialect),
                ))
            }
        };
        offset
            .and_then(|i| self.predicate.params().get(i))
            .cloned()
            .ok_or_else(|| parse_error(self.template, "placeholder has no bound parameter"))
    }
}

fn parse_predicate(
    dialect: Dialect,
    table_name: &str,
    table: &MemoryTable,
    predicate: &Predicate,
) -> Result<Expr, ExecutionError> {
    let template = predicate.template();
    let mut parser = Parser {
        template,
        tokens: tokenize(template)?,
        pos: 0,
        table_name,
        table,
        predicate,
        dialect,
        positional: 0,
    };
    let expr = parser.expr(LogicalOperator::Or)?;
    if parser.pos != parser.tokens.len() {
        return Err(parse_error(template, "trailing tokens"));
    }
    Ok(expr)
}
