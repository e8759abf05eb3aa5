//! Compilation of condition trees into parameterized predicates.
//!
//! A comparison renders as `<column> <symbol> <placeholder>` and appends its literal to
//! the parameter list; a composite renders as `(<child> <OP> <child> ...)`. Every
//! composite is parenthesized, so `(A AND B) OR C` and `A AND (B OR C)` never flatten to
//! the same text. The n-th placeholder always refers to the n-th parameter.

use serde::Deserialize;

use super::Condition;
use crate::error::FacadeError;
use crate::value::Value;

/// Placeholder and identifier quoting conventions of the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Dialect {
    /// `$1, $2, ...` placeholders, `"double quoted"` identifiers
    #[default]
    #[serde(rename = "postgres", alias = "postgresql")]
    Postgres,
    /// `?` placeholders, `` `backtick quoted` `` identifiers
    #[serde(rename = "mysql")]
    MySql,
}

impl Dialect {
    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_identifier(self, identifier: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    pub fn identifier_quote(self) -> char {
        match self {
            Dialect::Postgres => '"',
            Dialect::MySql => '`',
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql => "?".to_string(),
        }
    }
}

/// Compiled predicate: template text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    template: String,
    params: Vec<Value>,
    first_index: usize,
}

impl Predicate {
    /// Index of the first placeholder; `params()[0]` binds to it.
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.template, self.params)
    }
}

/// Recursive, order-preserving condition compiler.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler {
    dialect: Dialect,
    first_index: usize,
}

impl PredicateCompiler {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            first_index: 1,
        }
    }

    /// Number the first placeholder `index` instead of 1, leaving room for
    /// parameters the executor binds ahead of the predicate (UPDATE ... SET).
    #[must_use]
    pub fn starting_at(mut self, index: usize) -> Self {
        self.first_index = index.max(1);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Compile `condition`.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` when a comparison has an empty column name.
    pub fn compile(&self, condition: &Condition) -> Result<Predicate, FacadeError> {
        let mut template = String::new();
        let mut params = Vec::with_capacity(condition.leaf_count());
        self.compile_into(condition, &mut template, &mut params)?;
        Ok(Predicate {
            template,
            params,
            first_index: self.first_index,
        })
    }

    fn compile_into(
        &self,
        condition: &Condition,
        template: &mut String,
        params: &mut Vec<Value>,
    ) -> Result<(), FacadeError> {
        match condition {
            Condition::Comparison(c) => {
                if c.column().is_empty() {
                    return Err(FacadeError::configuration(format!(
                        "Comparison '{} {}' has an empty column name",
                        c.operator().symbol(),
                        c.value()
                    )));
                }
                let placeholder = self.dialect.placeholder(self.first_index + params.len());
                template.push_str(&self.dialect.quote_identifier(c.column()));
                template.push(' ');
                template.push_str(c.operator().symbol());
                template.push(' ');
                template.push_str(&placeholder);
                params.push(c.value().clone());
            }
            Condition::Composite(c) => {
                template.push('(');
                for (i, child) in c.conditions().iter().enumerate() {
                    if i > 0 {
                        template.push(' ');
                        template.push_str(c.operator().keyword());
                        template.push(' ');
                    }
                    self.compile_into(child, template, params)?;
                }
                template.push(')');
            }
        }
        Ok(())
    }
}
