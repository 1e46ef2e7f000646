//! RDF terms and statements in their N-Triples form. The N-Triples form of a term is what gets
//! hashed to a message, so it must be canonical: IRIs in angle brackets, blank nodes as `_:label`,
//! literals quoted with the minimal escapes, `xsd:string` implicit.

use std::fmt;

use crate::{
    constants::{RDF_LANG_STRING, XSD_STRING},
    error::{Error, Result},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    /// Label without the `_:` prefix
    BlankNode(String),
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    pub fn literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    pub fn blank_label(&self) -> Option<&str> {
        match self {
            Self::BlankNode(label) => Some(label),
            _ => None,
        }
    }

    pub fn to_ntriples(&self) -> String {
        match self {
            Self::Iri(iri) => format!("<{}>", iri),
            Self::BlankNode(label) => format!("_:{}", label),
            Self::Literal {
                value,
                datatype,
                language,
            } => {
                let quoted = format!("\"{}\"", escape(value));
                match language {
                    Some(lang) => format!("{}@{}", quoted, lang),
                    None if datatype == XSD_STRING => quoted,
                    None => format!("{}^^<{}>", quoted, datatype),
                }
            }
        }
    }

    /// Parse a single term in N-Triples syntax
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('<') {
            let iri = rest
                .strip_suffix('>')
                .ok_or_else(|| Error::malformed(format!("unterminated IRI {}", s)))?;
            if iri.is_empty() || iri.contains(['<', '>', ' ', '"']) {
                return Err(Error::malformed(format!("invalid IRI {}", s)));
            }
            return Ok(Self::Iri(iri.to_string()));
        }
        if let Some(label) = s.strip_prefix("_:") {
            if !is_valid_blank_label(label) {
                return Err(Error::malformed(format!("invalid blank node label {}", s)));
            }
            return Ok(Self::BlankNode(label.to_string()));
        }
        if s.starts_with('"') {
            return parse_literal(s);
        }
        Err(Error::malformed(format!("not an N-Triples term: {}", s)))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ntriples())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Statement {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    pub fn terms(&self) -> [&Term; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    pub fn to_ntriples(&self) -> String {
        format!(
            "{} {} {} .",
            self.subject.to_ntriples(),
            self.predicate.to_ntriples(),
            self.object.to_ntriples()
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ntriples())
    }
}

pub(crate) fn is_valid_blank_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !label.ends_with('.')
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn parse_literal(s: &str) -> Result<Term> {
    let mut value = String::new();
    let mut chars = s.char_indices().skip(1);
    let mut end = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                end = Some(i);
                break;
            }
            '\\' => match chars.next().map(|(_, c)| c) {
                Some('\\') => value.push('\\'),
                Some('"') => value.push('"'),
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some('t') => value.push('\t'),
                Some('u') => {
                    let hex = chars.by_ref().take(4).map(|(_, c)| c).collect::<String>();
                    let c = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| Error::malformed(format!("invalid escape in {}", s)))?;
                    value.push(c);
                }
                _ => return Err(Error::malformed(format!("invalid escape in {}", s))),
            },
            c => value.push(c),
        }
    }
    let end = end.ok_or_else(|| Error::malformed(format!("unterminated literal {}", s)))?;
    let suffix = &s[end + 1..];
    if suffix.is_empty() {
        return Ok(Term::literal(value, XSD_STRING));
    }
    if let Some(lang) = suffix.strip_prefix('@') {
        if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::malformed(format!("invalid language tag in {}", s)));
        }
        return Ok(Term::lang_literal(value, lang));
    }
    match suffix.strip_prefix("^^").map(Term::parse) {
        Some(Ok(Term::Iri(datatype))) => Ok(Term::literal(value, datatype)),
        _ => Err(Error::malformed(format!("invalid datatype in {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::XSD_INTEGER;

    #[test]
    fn ntriples_form() {
        assert_eq!(
            Term::iri("http://schema.org/name").to_ntriples(),
            "<http://schema.org/name>"
        );
        assert_eq!(Term::blank("b0").to_ntriples(), "_:b0");
        assert_eq!(Term::literal("Alice", XSD_STRING).to_ntriples(), "\"Alice\"");
        assert_eq!(
            Term::literal("30", XSD_INTEGER).to_ntriples(),
            "\"30\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(Term::lang_literal("chat", "fr").to_ntriples(), "\"chat\"@fr");
        assert_eq!(
            Term::literal("say \"hi\"\n", XSD_STRING).to_ntriples(),
            "\"say \\\"hi\\\"\\n\""
        );

        let statement = Statement::new(
            Term::blank("c14n0"),
            Term::iri("http://schema.org/age"),
            Term::literal("30", XSD_INTEGER),
        );
        assert_eq!(
            statement.to_string(),
            "_:c14n0 <http://schema.org/age> \"30\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
        );
    }

    #[test]
    fn parse_terms() {
        for term in [
            Term::iri("did:example:123"),
            Term::blank("b-1"),
            Term::literal("Alice", XSD_STRING),
            Term::literal("30", XSD_INTEGER),
            Term::lang_literal("chat", "fr"),
            Term::literal("tab\there \\ \"q\"", XSD_STRING),
        ] {
            assert_eq!(Term::parse(&term.to_ntriples()).unwrap(), term);
        }
        assert_eq!(
            Term::parse("\"\\u0041\"").unwrap(),
            Term::literal("A", XSD_STRING)
        );

        for bad in [
            "",
            "plain",
            "<unterminated",
            "<has space>",
            "_:",
            "\"open",
            "\"v\"^^xsd:integer",
            "\"v\"@",
            "\"\\x\"",
        ] {
            assert!(
                matches!(Term::parse(bad), Err(Error::MalformedInput(_))),
                "{}",
                bad
            );
        }
    }
}
