use std::fmt;
use std::str::FromStr;

use crate::ast::FieldName;
use crate::error::{Error, Result};
use crate::parser::parse_condition;
use crate::relation::Relation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
}

impl Operator {
    /// Exact, case-sensitive string comparison.
    pub fn test(self, lhs: &str, rhs: &str) -> bool {
        match self {
            Operator::Equal => lhs == rhs,
            Operator::NotEqual => lhs != rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equal => f.write_str("="),
            Operator::NotEqual => f.write_str("<>"),
        }
    }
}

/// Right-hand side of a comparison: a quoted literal or another field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Field(FieldName),
    Literal(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    pub field: FieldName,
    pub operator: Operator,
    pub operand: Operand,
}

impl Condition {
    pub fn new(field: impl Into<FieldName>, operator: Operator, operand: Operand) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
        }
    }

    /// Resolves field names to positions. The left field is looked up in
    /// `lhs`, a right-hand field in `rhs`; selection passes the same relation
    /// twice.
    pub(crate) fn bind(&self, lhs: &Relation, rhs: &Relation) -> Result<BoundCondition> {
        let left = lhs.position(&self.field)?;
        let right = match &self.operand {
            Operand::Field(field) => BoundOperand::Position(rhs.position(field)?),
            Operand::Literal(value) => BoundOperand::Value(value.clone()),
        };
        Ok(BoundCondition {
            lhs: left,
            operator: self.operator,
            rhs: right,
        })
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_condition(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.field, self.operator)?;
        match &self.operand {
            Operand::Field(field) => f.write_str(field),
            Operand::Literal(value) => write!(f, "'{}'", value),
        }
    }
}

#[derive(Clone, Debug)]
enum BoundOperand {
    Position(usize),
    Value(String),
}

/// A condition whose fields have been resolved against concrete schemas.
#[derive(Clone, Debug)]
pub(crate) struct BoundCondition {
    lhs: usize,
    operator: Operator,
    rhs: BoundOperand,
}

impl BoundCondition {
    pub(crate) fn positions(lhs: usize, operator: Operator, rhs: usize) -> Self {
        Self {
            lhs,
            operator,
            rhs: BoundOperand::Position(rhs),
        }
    }

    pub(crate) fn matches(&self, lhs: &[String], rhs: &[String]) -> bool {
        let right = match &self.rhs {
            BoundOperand::Position(i) => rhs[*i].as_str(),
            BoundOperand::Value(value) => value.as_str(),
        };
        self.operator.test(&lhs[self.lhs], right)
    }
}
