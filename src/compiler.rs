use std::fmt;

use itertools::Itertools;
use log::{debug, info};

use crate::ast::{FieldList, FieldName, InsertStatement, SelectStatement, Statement};
use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::parser::parse_statement;
use crate::relation::Relation;
use crate::storage::Storage;

/// One operator application in a compiled `SELECT`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanStep {
    Join {
        relation: Relation,
        conditions: Vec<Condition>,
    },
    Project(Vec<FieldName>),
    Select(Condition),
}

/// A compiled `SELECT`: the `FROM` relation and the steps applied to it, in
/// order. Joins come first in listed order, then the projection (absent for
/// `*`), then each `WHERE` condition. A condition therefore cannot see a
/// field that a later join introduces or that the projection removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub source: Relation,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn execute(self) -> Result<Relation> {
        let Plan { source, steps } = self;
        steps.into_iter().try_fold(source, |current, step| match step {
            PlanStep::Join {
                relation,
                conditions,
            } => current.join_on(&relation, &conditions),
            PlanStep::Project(fields) => current.projection(&fields),
            PlanStep::Select(condition) => current.select_where(&condition),
        })
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::Join {
                relation,
                conditions,
            } => write!(
                f,
                "join {} on {}",
                relation.name(),
                conditions.iter().join(" and ")
            ),
            PlanStep::Project(fields) => write!(f, "project {}", fields.join(", ")),
            PlanStep::Select(condition) => write!(f, "select {}", condition),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan {}", self.source.name())?;
        for step in &self.steps {
            write!(f, " -> {}", step)?;
        }
        Ok(())
    }
}

/// Result of one statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Relation(Relation),
    Inserted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Relation(relation) => fmt::Display::fmt(relation, f),
            Outcome::Inserted => f.write_str("INSERT OK"),
        }
    }
}

/// Compiles and runs statements against a storage backend. Every statement
/// works on its own freshly loaded copies of the relations it names.
#[derive(Debug, Default)]
pub struct Engine<S> {
    storage: S,
}

impl<S: Storage> Engine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn execute(&mut self, code: &str) -> Result<Outcome> {
        match parse_statement(code)? {
            Statement::Select(select) => {
                let plan = self.compile_select(&select)?;
                Ok(Outcome::Relation(plan.execute()?))
            }
            Statement::Insert(insert) => {
                self.execute_insert(&insert)?;
                Ok(Outcome::Inserted)
            }
        }
    }

    /// Compiles a `SELECT` without running it.
    pub fn plan(&self, code: &str) -> Result<Plan> {
        match parse_statement(code)? {
            Statement::Select(select) => self.compile_select(&select),
            Statement::Insert(_) => Err(Error::Parse("expected a SELECT statement".to_owned())),
        }
    }

    pub fn compile_select(&self, select: &SelectStatement) -> Result<Plan> {
        let SelectStatement {
            fields,
            from,
            joins,
            selection,
        } = select;

        let source = self.load(from)?;

        let mut steps = vec![];
        for join in joins {
            steps.push(PlanStep::Join {
                relation: self.load(&join.relation)?,
                conditions: join.conditions.clone(),
            });
        }
        if let FieldList::Fields(fields) = fields {
            steps.push(PlanStep::Project(fields.clone()));
        }
        steps.extend(selection.iter().cloned().map(PlanStep::Select));

        let plan = Plan { source, steps };
        debug!("plan: {}", plan);
        Ok(plan)
    }

    /// Appends one tuple and rewrites the whole relation. A duplicate tuple
    /// is not an error and leaves the relation unchanged. Values holding a
    /// comma or line break are rejected, as the stored form has no escaping.
    pub fn execute_insert(&mut self, insert: &InsertStatement) -> Result<()> {
        let mut relation = self.load(&insert.relation)?;
        if insert.values.len() != relation.arity() {
            return Err(Error::ArityMismatch {
                relation: insert.relation.clone(),
                expected: relation.arity(),
                found: insert.values.len(),
            });
        }
        if let Some(value) = insert
            .values
            .iter()
            .find(|value| value.contains(&[',', '\n', '\r'][..]))
        {
            return Err(Error::UnstorableValue {
                relation: insert.relation.clone(),
                value: value.clone(),
            });
        }

        if !relation.insert(insert.values.clone()) {
            debug!("{}: tuple already present", relation.name());
        }
        self.storage.save(&relation)?;
        info!("{}: saved {} tuples", relation.name(), relation.len());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Relation> {
        self.storage
            .load(name)?
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }
}
