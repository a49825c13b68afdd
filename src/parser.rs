use std::borrow::BorrowMut;

use pest::Parser as _;
use pest_derive::Parser;

use crate::ast::{
    FieldList, FieldName, Identifier, InsertStatement, JoinClause, SelectStatement, Statement,
};
use crate::condition::{Condition, Operand, Operator};
use crate::error::{Error, Result};

#[derive(Parser)]
#[grammar = "relq.pest"]
struct Parser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;
type Pairs<'a> = pest::iterators::Pairs<'a, Rule>;

/// Parses a single `SELECT` or `INSERT` statement.
pub fn parse_statement(code: &str) -> Result<Statement> {
    let statement = parse_rule(Rule::statement, code)?;
    let pair = significant(statement.into_inner())
        .next()
        .expect("statement body");

    Ok(match pair.as_rule() {
        Rule::select => Statement::Select(SelectStatement::from(pair)),
        Rule::insert => Statement::Insert(InsertStatement::from(pair)),
        _ => unreachable!(),
    })
}

/// Parses one atomic comparison such as `nome = 'antonio'` or `a <> b`.
pub fn parse_condition(code: &str) -> Result<Condition> {
    let pair = parse_rule(Rule::condition_only, code)?;
    Ok(Condition::from(expect_next_rule(
        pair.into_inner(),
        Rule::condition,
    )))
}

/// Parses an `AND`-joined list of comparisons.
pub fn parse_conjunction(code: &str) -> Result<Vec<Condition>> {
    let pair = parse_rule(Rule::conjunction_only, code)?;
    Ok(convert_conjunction(expect_next_rule(
        pair.into_inner(),
        Rule::conjunction,
    )))
}

fn parse_rule(rule: Rule, code: &str) -> Result<Pair<'_>> {
    let mut pairs =
        Parser::parse(rule, code).map_err(|e| Error::Parse(e.to_string().trim().to_owned()))?;
    Ok(pairs.next().expect("top level pair"))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_select
            | Rule::kw_from
            | Rule::kw_join
            | Rule::kw_on
            | Rule::kw_where
            | Rule::kw_and
            | Rule::kw_insert
            | Rule::kw_into
            | Rule::kw_values
            | Rule::EOI
    )
}

/// Drops keyword and end-of-input pairs, which carry no information once the
/// grammar has matched.
fn significant<'a>(pairs: Pairs<'a>) -> impl Iterator<Item = Pair<'a>> {
    pairs.filter(|pair| !is_keyword(pair.as_rule()))
}

fn expect_next_rule<'a, P: BorrowMut<Pairs<'a>>>(mut pairs: P, rule: Rule) -> Pair<'a> {
    let pair = pairs
        .borrow_mut()
        .find(|pair| !is_keyword(pair.as_rule()))
        .expect("missing pair");
    assert_eq!(pair.as_rule(), rule);
    pair
}

fn convert_identifier(pair: Pair) -> Identifier {
    assert!(matches!(pair.as_rule(), Rule::identifier | Rule::field));
    pair.as_str().to_string()
}

fn convert_literal(pair: Pair) -> String {
    assert_eq!(pair.as_rule(), Rule::string_literal);
    let interior = expect_next_rule(pair.into_inner(), Rule::string_interior);
    interior.as_str().to_string()
}

fn convert_conjunction(pair: Pair) -> Vec<Condition> {
    assert_eq!(pair.as_rule(), Rule::conjunction);
    significant(pair.into_inner()).map(Condition::from).collect()
}

impl From<Pair<'_>> for Operator {
    fn from(pair: Pair<'_>) -> Self {
        assert_eq!(pair.as_rule(), Rule::operator);
        match pair.into_inner().next().map(|p| p.as_rule()) {
            Some(Rule::equal) => Operator::Equal,
            Some(Rule::not_equal) => Operator::NotEqual,
            _ => unreachable!(),
        }
    }
}

impl From<Pair<'_>> for Operand {
    fn from(pair: Pair<'_>) -> Self {
        match pair.as_rule() {
            Rule::string_literal => Operand::Literal(convert_literal(pair)),
            Rule::field => Operand::Field(convert_identifier(pair)),
            _ => unreachable!(),
        }
    }
}

impl From<Pair<'_>> for Condition {
    fn from(pair: Pair<'_>) -> Self {
        assert_eq!(pair.as_rule(), Rule::condition);
        let mut pairs = pair.into_inner();
        let field = convert_identifier(expect_next_rule(&mut pairs, Rule::field));
        let operator = Operator::from(expect_next_rule(&mut pairs, Rule::operator));
        let operand = Operand::from(pairs.next().expect("condition operand"));
        Condition::new(field, operator, operand)
    }
}

impl From<Pair<'_>> for FieldList {
    fn from(pair: Pair<'_>) -> Self {
        assert_eq!(pair.as_rule(), Rule::field_list);
        let mut pairs = pair.into_inner().peekable();
        if matches!(pairs.peek().map(|p| p.as_rule()), Some(Rule::star)) {
            return FieldList::All;
        }
        FieldList::Fields(pairs.map(convert_identifier).collect::<Vec<FieldName>>())
    }
}

impl From<Pair<'_>> for JoinClause {
    fn from(pair: Pair<'_>) -> Self {
        assert_eq!(pair.as_rule(), Rule::join_clause);
        let mut pairs = pair.into_inner();
        let relation = convert_identifier(expect_next_rule(&mut pairs, Rule::identifier));
        let conditions = convert_conjunction(expect_next_rule(&mut pairs, Rule::conjunction));
        Self {
            relation,
            conditions,
        }
    }
}

impl From<Pair<'_>> for SelectStatement {
    fn from(pair: Pair<'_>) -> Self {
        let mut pairs = pair.into_inner();
        let fields = FieldList::from(expect_next_rule(&mut pairs, Rule::field_list));
        let from = convert_identifier(expect_next_rule(&mut pairs, Rule::identifier));

        let mut joins = vec![];
        let mut selection = vec![];
        for pair in significant(pairs) {
            match pair.as_rule() {
                Rule::join_clause => joins.push(JoinClause::from(pair)),
                Rule::where_clause => {
                    let conjunction = expect_next_rule(pair.into_inner(), Rule::conjunction);
                    selection = convert_conjunction(conjunction);
                }
                _ => unreachable!(),
            }
        }

        Self {
            fields,
            from,
            joins,
            selection,
        }
    }
}

impl From<Pair<'_>> for InsertStatement {
    fn from(pair: Pair<'_>) -> Self {
        let mut pairs = pair.into_inner();
        let relation = convert_identifier(expect_next_rule(&mut pairs, Rule::identifier));
        let values = significant(pairs)
            .map(|value| {
                assert_eq!(value.as_rule(), Rule::value);
                let inner = value.into_inner().next().expect("value body");
                match inner.as_rule() {
                    Rule::string_literal => convert_literal(inner),
                    Rule::bare_value => inner.as_str().to_string(),
                    _ => unreachable!(),
                }
            })
            .collect();

        Self { relation, values }
    }
}
