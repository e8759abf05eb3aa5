//! Condition expression model.
//!
//! A [`Condition`] is a tree of comparisons combined by AND/OR composites. Trees are
//! built per call site and compiled into a parameterized [`Predicate`] by
//! [`PredicateCompiler`].
//!
//! ```rust
//! use tablefacade::{Condition, CompositeCondition, LogicalOperator};
//!
//! let condition = CompositeCondition::builder()
//!     .operator(LogicalOperator::And)
//!     .condition(Condition::gte("id", 5))
//!     .condition(Condition::eq("name", "Odd"))
//!     .build()?;
//! assert_eq!(condition.conditions().len(), 2);
//! # Ok::<(), tablefacade::FacadeError>(())
//! ```

use std::fmt;

use crate::error::FacadeError;
use crate::value::Value;

pub mod compile;

pub use compile::{Dialect, Predicate, PredicateCompiler};

/// Comparison between a column and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl ComparisonOperator {
    /// SQL symbol for this operator
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Neq => "<>",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lte => "<=",
        }
    }

    /// Parse an SQL symbol. `!=` is accepted as an alias of `<>`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => ComparisonOperator::Eq,
            "<>" | "!=" => ComparisonOperator::Neq,
            ">" => ComparisonOperator::Gt,
            "<" => ComparisonOperator::Lt,
            ">=" => ComparisonOperator::Gte,
            "<=" => ComparisonOperator::Lte,
            _ => return None,
        })
    }

    /// Whether `left <op> right` holds given `left.cmp(right)`.
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            ComparisonOperator::Eq => ordering == Equal,
            ComparisonOperator::Neq => ordering != Equal,
            ComparisonOperator::Gt => ordering == Greater,
            ComparisonOperator::Lt => ordering == Less,
            ComparisonOperator::Gte => ordering != Less,
            ComparisonOperator::Lte => ordering != Greater,
        }
    }
}

/// Combinator of a composite condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// `column operator value` leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonCondition {
    column: String,
    operator: ComparisonOperator,
    value: Value,
}

impl ComparisonCondition {
    pub fn new(column: impl Into<String>, operator: ComparisonOperator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// AND/OR group of one or more child conditions.
///
/// Only obtainable through [`CompositeCondition::builder`], so the operator is always
/// set and the child list is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeCondition {
    operator: LogicalOperator,
    conditions: Vec<Condition>,
}

impl CompositeCondition {
    pub fn builder() -> CompositeConditionBuilder {
        CompositeConditionBuilder::default()
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Staged construction of a [`CompositeCondition`].
///
/// `build` consumes the builder, so a builder cannot produce two composites.
#[derive(Debug, Default)]
#[must_use]
pub struct CompositeConditionBuilder {
    operator: Option<LogicalOperator>,
    conditions: Vec<Condition>,
}

impl CompositeConditionBuilder {
    /// Set the combinator. A later call replaces an earlier one.
    pub fn operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn condition(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn conditions<I, C>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        self.conditions.extend(conditions.into_iter().map(Into::into));
        self
    }

    /// Finish the composite.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` when no operator was set or no child
    /// condition was added.
    pub fn build(self) -> Result<CompositeCondition, FacadeError> {
        let operator = self
            .operator
            .ok_or_else(|| FacadeError::configuration("Operator must be set"))?;
        if self.conditions.is_empty() {
            return Err(FacadeError::configuration(
                "At least one condition must be added",
            ));
        }
        Ok(CompositeCondition {
            operator,
            conditions: self.conditions,
        })
    }
}

/// Node of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison(ComparisonCondition),
    Composite(CompositeCondition),
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        ComparisonCondition::new(column, ComparisonOperator::Eq, value).into()
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        ComparisonCondition::new(column, ComparisonOperator::Neq, value).into()
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        ComparisonCondition::new(column, ComparisonOperator::Gt, value).into()
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        ComparisonCondition::new(column, ComparisonOperator::Lt, value).into()
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        ComparisonCondition::new(column, ComparisonOperator::Gte, value).into()
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        ComparisonCondition::new(column, ComparisonOperator::Lte, value).into()
    }

    /// AND of `conditions`.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` when `conditions` is empty.
    pub fn and<I, C>(conditions: I) -> Result<Self, FacadeError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        Self::group(LogicalOperator::And, conditions)
    }

    /// OR of `conditions`.
    ///
    /// # Errors
    ///
    /// Returns `FacadeError::Configuration` when `conditions` is empty.
    pub fn or<I, C>(conditions: I) -> Result<Self, FacadeError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        Self::group(LogicalOperator::Or, conditions)
    }

    fn group<I, C>(operator: LogicalOperator, conditions: I) -> Result<Self, FacadeError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Condition>,
    {
        CompositeCondition::builder()
            .operator(operator)
            .conditions(conditions)
            .build()
            .map(Condition::Composite)
    }

    /// Number of comparison leaves, i.e. the number of parameters the tree compiles to.
    pub fn leaf_count(&self) -> usize {
        match self {
            Condition::Comparison(_) => 1,
            Condition::Composite(c) => c.conditions.iter().map(Condition::leaf_count).sum(),
        }
    }
}

impl From<ComparisonCondition> for Condition {
    fn from(c: ComparisonCondition) -> Self {
        Condition::Comparison(c)
    }
}

impl From<CompositeCondition> for Condition {
    fn from(c: CompositeCondition) -> Self {
        Condition::Composite(c)
    }
}

// Unparameterized rendering, for logs only.
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison(c) => {
                write!(f, "{} {} {}", c.column, c.operator.symbol(), c.value)
            }
            Condition::Composite(c) => {
                f.write_str("(")?;
                for (i, child) in c.conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", c.operator.keyword())?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}
