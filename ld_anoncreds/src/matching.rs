//! Locating the statements of a disclosed document among the statements of the original document.
//!
//! A disclosed document is the original with claims removed and some terms replaced by blank nodes.
//! A blank node named in the deanonymization map stands for a known term. Any other blank node is a
//! variable: it matches any term, as long as every occurrence of it matches the same term.

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    term::{Statement, Term},
};

/// Typed deanonymization map from blank node label (without `_:`) to the term it hides
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeanonMap(HashMap<String, Term>);

impl DeanonMap {
    /// Parse a map from `_:label` to the N-Triples form of a term
    pub fn parse<'a>(entries: impl IntoIterator<Item = (&'a String, &'a String)>) -> Result<Self> {
        let mut map = HashMap::new();
        for (key, value) in entries {
            let label = key.strip_prefix("_:").unwrap_or(key);
            if label.is_empty() {
                return Err(Error::malformed("empty label in deanonymization map"));
            }
            let term = Term::parse(value)?;
            if term.is_blank() {
                return Err(Error::malformed(format!(
                    "{} cannot stand for the blank node {}",
                    key, value
                )));
            }
            map.insert(label.to_string(), term);
        }
        Ok(Self(map))
    }

    pub fn get(&self, label: &str) -> Option<&Term> {
        self.0.get(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pattern {
    Fixed(Term),
    Placeholder { label: String, term: Term },
    Variable(String),
}

pub(crate) type StatementPattern = [Pattern; 3];

impl Pattern {
    pub fn from_term(term: &Term, deanon_map: &DeanonMap) -> Self {
        match term {
            Term::BlankNode(label) => match deanon_map.get(label) {
                Some(hidden) => Self::Placeholder {
                    label: label.clone(),
                    term: hidden.clone(),
                },
                None => Self::Variable(label.clone()),
            },
            t => Self::Fixed(t.clone()),
        }
    }
}

pub(crate) fn statement_pattern(statement: &Statement, deanon_map: &DeanonMap) -> StatementPattern {
    statement.terms().map(|t| Pattern::from_term(t, deanon_map))
}

/// Find for every disclosed statement a distinct original statement it matches, binding variables
/// consistently. Returns the index of the matched original statement per disclosed statement.
pub(crate) fn match_statements(
    disclosed: &[StatementPattern],
    original: &[Statement],
) -> Option<Vec<usize>> {
    let mut matcher = Matcher {
        disclosed,
        original,
        used: vec![false; original.len()],
        bindings: HashMap::new(),
        index_map: Vec::with_capacity(disclosed.len()),
    };
    matcher.search().then_some(matcher.index_map)
}

struct Matcher<'a> {
    disclosed: &'a [StatementPattern],
    original: &'a [Statement],
    used: Vec<bool>,
    bindings: HashMap<&'a str, &'a Term>,
    index_map: Vec<usize>,
}

impl<'a> Matcher<'a> {
    fn search(&mut self) -> bool {
        let (disclosed, original) = (self.disclosed, self.original);
        let Some(patterns) = disclosed.get(self.index_map.len()) else {
            return true;
        };
        for (i, statement) in original.iter().enumerate() {
            if self.used[i] {
                continue;
            }
            let mut bound = Vec::new();
            if self.bind(patterns, statement, &mut bound) {
                self.used[i] = true;
                self.index_map.push(i);
                if self.search() {
                    return true;
                }
                self.index_map.pop();
                self.used[i] = false;
            }
            for label in bound {
                self.bindings.remove(label);
            }
        }
        false
    }

    /// Match one statement, recording the variables it newly bound in `bound`
    fn bind(
        &mut self,
        patterns: &'a StatementPattern,
        statement: &'a Statement,
        bound: &mut Vec<&'a str>,
    ) -> bool {
        for (pattern, term) in patterns.iter().zip(statement.terms()) {
            let matched = match pattern {
                Pattern::Fixed(t) | Pattern::Placeholder { term: t, .. } => t == term,
                Pattern::Variable(label) => match self.bindings.get(label.as_str()) {
                    Some(value) => *value == term,
                    None => {
                        self.bindings.insert(label, term);
                        bound.push(label);
                        true
                    }
                },
            };
            if !matched {
                return false;
            }
        }
        true
    }
}
