use crate::condition::Condition;

pub type Identifier = String;
pub type RelationName = Identifier;
pub type FieldName = Identifier;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldList {
    All,
    Fields(Vec<FieldName>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectStatement {
    pub fields: FieldList,
    pub from: RelationName,
    pub joins: Vec<JoinClause>,
    pub selection: Vec<Condition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinClause {
    pub relation: RelationName,
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertStatement {
    pub relation: RelationName,
    pub values: Vec<String>,
}
