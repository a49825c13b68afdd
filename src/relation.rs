use std::collections::HashSet;

use itertools::Itertools;
use log::debug;

use crate::ast::{FieldName, RelationName};
use crate::condition::{BoundCondition, Condition, Operator};
use crate::error::{Error, Result};
use crate::parser::parse_conjunction;

/// An ordered row of string values, aligned with its relation's fields.
pub type Tuple = Vec<String>;

/// A named, duplicate-free set of equal-arity tuples.
///
/// The body keeps insertion order for display and persistence, and a hash set
/// of the same tuples for constant time duplicate checks. Every operator
/// returns a new relation; only [`Relation::insert`] mutates in place.
#[derive(Clone, Debug)]
pub struct Relation {
    name: RelationName,
    /// Stored relation this one was derived from by unary operators; used
    /// to resolve qualified field names.
    origin: RelationName,
    fields: Vec<FieldName>,
    tuples: Vec<Tuple>,
    index: HashSet<Tuple>,
}

/// Relations compare by schema and tuple set. Names and tuple order are
/// ignored.
impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.index == other.index
    }
}

impl Eq for Relation {}

impl Relation {
    pub fn new<F, S>(name: impl Into<RelationName>, fields: F) -> Result<Self>
    where
        F: IntoIterator<Item = S>,
        S: Into<FieldName>,
    {
        let name = name.into();
        let fields: Vec<FieldName> = fields.into_iter().map(Into::into).collect();
        if let Some(field) = fields.iter().duplicates().next() {
            return Err(Error::DuplicateField {
                relation: name,
                field: field.clone(),
            });
        }

        Ok(Self {
            origin: name.clone(),
            name,
            fields,
            tuples: vec![],
            index: HashSet::new(),
        })
    }

    /// Builds a relation and inserts every tuple, with the usual silent
    /// dropping of duplicates and malformed rows.
    pub fn with_tuples<F, S, I, T, V>(
        name: impl Into<RelationName>,
        fields: F,
        tuples: I,
    ) -> Result<Self>
    where
        F: IntoIterator<Item = S>,
        S: Into<FieldName>,
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut relation = Self::new(name, fields)?;
        for tuple in tuples {
            relation.insert(tuple.into_iter().map(Into::into).collect());
        }
        Ok(relation)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldName] {
        &self.fields
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn contains(&self, tuple: &[String]) -> bool {
        self.index.contains(tuple)
    }

    /// Position of `field` in the schema. A field may also be written
    /// qualified with this relation's name, as in `STUDENT.nome`, or with
    /// the name of the stored relation a selection, projection or rename
    /// started from.
    pub fn position(&self, field: &str) -> Result<usize> {
        let find = |name: &str| self.fields.iter().position(|f| f == name);
        let unqualified = |prefix: &str| {
            field
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(find)
        };

        find(field)
            .or_else(|| unqualified(&self.name))
            .or_else(|| unqualified(&self.origin))
            .ok_or_else(|| Error::unknown_field(&self.name, field))
    }

    /// Empty relation named `<operator>_<name>` that keeps this relation's
    /// origin.
    fn derive<F, S>(&self, operator: &str, fields: F) -> Result<Relation>
    where
        F: IntoIterator<Item = S>,
        S: Into<FieldName>,
    {
        let mut result = Relation::new(format!("{}_{}", operator, self.name), fields)?;
        result.origin = self.origin.clone();
        Ok(result)
    }

    /// Adds `tuple` unless its length differs from the arity or an identical
    /// tuple is already present. Returns whether the tuple was added; neither
    /// case is an error.
    pub fn insert(&mut self, tuple: Tuple) -> bool {
        if tuple.len() != self.arity() {
            debug!(
                "{}: dropping tuple of arity {} (expected {})",
                self.name,
                tuple.len(),
                self.arity()
            );
            return false;
        }
        if self.index.contains(&tuple) {
            debug!("{}: dropping duplicate tuple {:?}", self.name, tuple);
            return false;
        }
        self.index.insert(tuple.clone());
        self.tuples.push(tuple);
        true
    }

    /// Filters by a single comparison written as text, e.g. `nome = 'antonio'`.
    pub fn selection(&self, condition: &str) -> Result<Relation> {
        self.select_where(&condition.parse()?)
    }

    pub fn select_where(&self, condition: &Condition) -> Result<Relation> {
        let bound = condition.bind(self, self)?;
        let mut result = self.derive("selection", self.fields.clone())?;
        for tuple in &self.tuples {
            if bound.matches(tuple, tuple) {
                result.insert(tuple.clone());
            }
        }
        debug!(
            "{} [{}]: {} of {} tuples",
            result.name,
            condition,
            result.len(),
            self.len()
        );
        Ok(result)
    }

    pub fn projection<S: AsRef<str>>(&self, fields: &[S]) -> Result<Relation> {
        let positions = fields
            .iter()
            .map(|field| self.position(field.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut result = self.derive(
            "projection",
            fields.iter().map(|field| field.as_ref().to_owned()),
        )?;
        for tuple in &self.tuples {
            result.insert(positions.iter().map(|&i| tuple[i].clone()).collect());
        }
        Ok(result)
    }

    pub fn rename<S: AsRef<str>>(&self, fields: &[S]) -> Result<Relation> {
        if fields.len() != self.arity() {
            return Err(Error::ArityMismatch {
                relation: self.name.clone(),
                expected: self.arity(),
                found: fields.len(),
            });
        }

        let mut result = self.derive(
            "rename",
            fields.iter().map(|field| field.as_ref().to_owned()),
        )?;
        result.tuples = self.tuples.clone();
        result.index = self.index.clone();
        Ok(result)
    }

    pub fn union(&self, other: &Relation) -> Result<Relation> {
        self.check_same_schema(other)?;
        let mut result = Relation::new(
            format!("union_{}_{}", self.name, other.name),
            self.fields.clone(),
        )?;
        for tuple in self.tuples.iter().chain(&other.tuples) {
            result.insert(tuple.clone());
        }
        Ok(result)
    }

    pub fn difference(&self, other: &Relation) -> Result<Relation> {
        self.check_same_schema(other)?;
        let mut result = Relation::new(
            format!("difference_{}_{}", self.name, other.name),
            self.fields.clone(),
        )?;
        for tuple in self.tuples.iter().filter(|t| !other.contains(t)) {
            result.insert(tuple.clone());
        }
        Ok(result)
    }

    pub fn intersection(&self, other: &Relation) -> Result<Relation> {
        self.check_same_schema(other)?;
        let mut result = Relation::new(
            format!("intersection_{}_{}", self.name, other.name),
            self.fields.clone(),
        )?;
        for tuple in self.tuples.iter().filter(|t| other.contains(t)) {
            result.insert(tuple.clone());
        }
        Ok(result)
    }

    /// Cartesian product. Field names present in both operands are qualified
    /// with their relation's name.
    pub fn xproduct(&self, other: &Relation) -> Result<Relation> {
        let result = Relation::new(
            format!("xprod_{}_{}", self.name, other.name),
            self.product_fields(other),
        )?;
        Ok(self.nested_loop(other, result, &[], &all_positions(other)))
    }

    /// Theta-join on an `AND`-joined list of comparisons, e.g.
    /// `Persona = Persona AND Citta <> Sede`.
    pub fn join(&self, other: &Relation, conditions: &str) -> Result<Relation> {
        self.join_on(other, &parse_conjunction(conditions)?)
    }

    /// Left fields resolve against `self`, right-hand fields against `other`.
    /// An empty condition list yields the cartesian product.
    pub fn join_on(&self, other: &Relation, conditions: &[Condition]) -> Result<Relation> {
        let bound = conditions
            .iter()
            .map(|condition| condition.bind(self, other))
            .collect::<Result<Vec<_>>>()?;

        let result = Relation::new(
            format!("join_{}_{}", self.name, other.name),
            self.product_fields(other),
        )?;
        Ok(self.nested_loop(other, result, &bound, &all_positions(other)))
    }

    /// Equi-join on every field name the two schemas share. Shared fields
    /// appear once, in `self`'s position; with nothing shared this is the
    /// cartesian product.
    pub fn natural_join(&self, other: &Relation) -> Result<Relation> {
        let mut conditions = vec![];
        for (i, field) in self.fields.iter().enumerate() {
            if let Some(j) = other.fields.iter().position(|f| f == field) {
                conditions.push(BoundCondition::positions(i, Operator::Equal, j));
            }
        }

        let kept = (0..other.arity())
            .filter(|&j| !self.fields.contains(&other.fields[j]))
            .collect::<Vec<_>>();
        let fields = self
            .fields
            .iter()
            .chain(kept.iter().map(|&j| &other.fields[j]))
            .cloned();

        let result = Relation::new(format!("njoin_{}_{}", self.name, other.name), fields)?;
        Ok(self.nested_loop(other, result, &conditions, &kept))
    }

    fn nested_loop(
        &self,
        other: &Relation,
        mut result: Relation,
        conditions: &[BoundCondition],
        other_columns: &[usize],
    ) -> Relation {
        for (lhs, rhs) in self.tuples.iter().cartesian_product(&other.tuples) {
            if conditions.iter().all(|condition| condition.matches(lhs, rhs)) {
                let tuple = lhs
                    .iter()
                    .cloned()
                    .chain(other_columns.iter().map(|&j| rhs[j].clone()))
                    .collect();
                result.insert(tuple);
            }
        }
        debug!(
            "{}: {} tuples from {} x {}",
            result.name,
            result.len(),
            self.len(),
            other.len()
        );
        result
    }

    fn product_fields(&self, other: &Relation) -> Vec<FieldName> {
        fn qualified<'a>(
            relation: &'a Relation,
            peer: &'a Relation,
        ) -> impl Iterator<Item = FieldName> + 'a {
            relation.fields.iter().map(move |field| {
                if peer.fields.contains(field) {
                    format!("{}.{}", relation.name, field)
                } else {
                    field.clone()
                }
            })
        }

        qualified(self, other).chain(qualified(other, self)).collect()
    }

    fn check_same_schema(&self, other: &Relation) -> Result<()> {
        if self.fields == other.fields {
            Ok(())
        } else {
            Err(Error::SchemaMismatch {
                left: self.name.clone(),
                left_fields: self.fields.join(","),
                right: other.name.clone(),
                right_fields: other.fields.join(","),
            })
        }
    }
}

fn all_positions(relation: &Relation) -> Vec<usize> {
    (0..relation.arity()).collect()
}
