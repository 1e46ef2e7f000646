//! Canonicalization of JSON-LD documents into a sorted list of RDF statements.
//!
//! This covers the subset of JSON-LD used by credentials: remote, inline and property scoped
//! contexts, `@vocab`, compact IRIs, keyword aliases, type coercion, value objects, node references
//! and nested nodes. Anything outside of it (`@graph`, `@list`, `@reverse`, relative IRIs, terms
//! without a mapping) is rejected rather than silently dropped, since a dropped claim is an unsigned
//! claim.
//!
//! Determinism does not depend on the key order of the JSON input: keys are visited in sorted order,
//! array elements are visited in the order of their serialized form, and nodes without an identifier
//! are labelled `_:c14n0`, `_:c14n1`, ... in that visiting order. The resulting statements are sorted
//! by their N-Triples form and deduplicated.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    constants::{
        AUTO_BLANK_NODE_PREFIX, RDF_LANG_STRING, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER,
        XSD_STRING,
    },
    error::{Error, Result},
    loader::DocumentLoader,
    term::{is_valid_blank_label, Statement, Term},
};

/// Remote contexts may import other remote contexts, up to this depth
const MAX_CONTEXT_DEPTH: usize = 8;
/// Bound on the chain of term definitions referring to other terms
const MAX_EXPANSION_DEPTH: usize = 16;

/// Canonical statements of `document`. A top-level `proof` member is not part of the document.
pub fn canonicalize(document: &Value, loader: &impl DocumentLoader) -> Result<Vec<Statement>> {
    let node = document
        .as_object()
        .ok_or_else(|| Error::malformed("document must be a JSON object"))?;
    let mut canonicalizer = Canonicalizer {
        loader,
        statements: Vec::new(),
        blank_node_count: 0,
    };
    canonicalizer.node(node, &Context::default(), true)?;

    let mut statements = canonicalizer.statements;
    let mut keyed = statements
        .drain(..)
        .map(|s| (s.to_ntriples(), s))
        .collect::<Vec<_>>();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    trace!(statements = keyed.len(), "canonicalized document");
    Ok(keyed.into_iter().map(|(_, s)| s).collect())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct TermDefinition {
    /// IRI, compact IRI, term or keyword this term stands for. `None` means expansion through `@vocab`.
    id: Option<String>,
    /// Value of `@type` in the definition: `@id`, `@vocab` or a datatype
    coercion: Option<String>,
    /// Property scoped context
    context: Option<Value>,
}

#[derive(Clone, Debug, Default)]
struct Context {
    vocab: Option<String>,
    terms: HashMap<String, TermDefinition>,
}

enum Coercion {
    None,
    Id,
    Vocab,
    Datatype(String),
}

impl Context {
    /// Expand `value` used as a property, a type or a datatype
    fn expand_vocab(&self, value: &str) -> Result<String> {
        self.expand(value, true, 0)
    }

    /// Expand `value` used as a node identifier
    fn expand_id(&self, value: &str) -> Result<String> {
        self.expand(value, false, 0)
    }

    fn expand(&self, value: &str, vocab: bool, depth: usize) -> Result<String> {
        if depth > MAX_EXPANSION_DEPTH {
            return Err(Error::malformed(format!("cyclic term definition for {}", value)));
        }
        if value.starts_with('@') {
            return Ok(value.to_string());
        }
        if vocab {
            if let Some(def) = self.terms.get(value) {
                return match &def.id {
                    Some(id) if id == value => self.expand_prefixed(value, vocab, depth),
                    Some(id) => self.expand(id, vocab, depth + 1),
                    None => self.vocab_relative(value),
                };
            }
        }
        self.expand_prefixed(value, vocab, depth)
    }

    fn expand_prefixed(&self, value: &str, vocab: bool, depth: usize) -> Result<String> {
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Ok(value.to_string());
            }
            if let Some(def) = self.terms.get(prefix) {
                if let Some(id) = &def.id {
                    let base = self.expand(id, true, depth + 1)?;
                    return Ok(format!("{}{}", base, suffix));
                }
            }
            // Absolute IRI of a scheme without authority, e.g. `did:` or `urn:`
            return Ok(value.to_string());
        }
        if vocab {
            return self.vocab_relative(value);
        }
        Err(Error::malformed(format!("relative IRI {} is not supported", value)))
    }

    fn vocab_relative(&self, value: &str) -> Result<String> {
        match &self.vocab {
            Some(vocab) => Ok(format!("{}{}", vocab, value)),
            None => Err(Error::malformed(format!("term {} is not defined", value))),
        }
    }

    /// The keyword `key` stands for, if it is a keyword or an alias of one
    fn keyword(&self, key: &str) -> Option<String> {
        if key.starts_with('@') {
            return Some(key.to_string());
        }
        let id = self.terms.get(key)?.id.as_deref()?;
        id.starts_with('@').then(|| id.to_string())
    }

    fn coercion(&self, key: &str) -> Result<Coercion> {
        let coercion = match self.terms.get(key).and_then(|d| d.coercion.as_deref()) {
            None => Coercion::None,
            Some("@id") => Coercion::Id,
            Some("@vocab") => Coercion::Vocab,
            Some(datatype) => Coercion::Datatype(self.expand_vocab(datatype)?),
        };
        Ok(coercion)
    }
}

struct Canonicalizer<'a, L: DocumentLoader> {
    loader: &'a L,
    statements: Vec<Statement>,
    blank_node_count: usize,
}

impl<'a, L: DocumentLoader> Canonicalizer<'a, L> {
    /// Emit the statements of a node object and return its subject
    fn node(&mut self, node: &Map<String, Value>, active: &Context, top_level: bool) -> Result<Term> {
        let embedded;
        let context = match node.get("@context") {
            Some(local) => {
                embedded = self.process_context(active, local, 0)?;
                &embedded
            }
            None => active,
        };

        let mut keys = node.keys().collect::<Vec<_>>();
        keys.sort();

        let mut id = None;
        for key in &keys {
            if context.keyword(key).as_deref() == Some("@id") {
                let value = node[key.as_str()]
                    .as_str()
                    .ok_or_else(|| Error::malformed("@id must be a string"))?;
                id = Some(self.identifier(context, value)?);
            }
        }
        let subject = match id {
            Some(id) => id,
            None => self.fresh_blank_node(),
        };

        for key in keys {
            let value = &node[key.as_str()];
            if key == "@context" || (top_level && key == "proof") {
                continue;
            }
            match context.keyword(key).as_deref() {
                Some("@id") | Some("@version") | Some("@protected") => {}
                Some("@type") => {
                    for t in as_array(value) {
                        let t = t
                            .as_str()
                            .ok_or_else(|| Error::malformed("@type must be a string"))?;
                        let object = Term::Iri(self.iri(context.expand_vocab(t)?)?);
                        self.emit(subject.clone(), Term::iri(RDF_TYPE), object);
                    }
                }
                Some(keyword) => {
                    return Err(Error::malformed(format!(
                        "keyword {} is not supported in a node",
                        keyword
                    )))
                }
                None => self.property(context, &subject, key, value)?,
            }
        }
        Ok(subject)
    }

    fn property(&mut self, context: &Context, subject: &Term, key: &str, value: &Value) -> Result<()> {
        let predicate = context.expand_vocab(key)?;
        if predicate.starts_with("_:") {
            return Err(Error::malformed(format!("blank node predicate {}", key)));
        }
        let predicate = Term::Iri(self.iri(predicate)?);

        let scoped;
        let context = match context.terms.get(key).and_then(|d| d.context.as_ref()) {
            Some(local) => {
                scoped = self.process_context(context, local, 0)?;
                &scoped
            }
            None => context,
        };
        let coercion = context.coercion(key)?;

        let mut values = as_array(value);
        if values.len() > 1 {
            values.sort_by_cached_key(|v| v.to_string());
        }
        for v in values {
            if v.is_array() {
                return Err(Error::malformed(format!("nested arrays in {} are not supported", key)));
            }
            if let Some(object) = self.value(context, &coercion, v)? {
                self.emit(subject.clone(), predicate.clone(), object);
            }
        }
        Ok(())
    }

    /// Term for the value of a property. `null` values produce nothing.
    fn value(&mut self, context: &Context, coercion: &Coercion, value: &Value) -> Result<Option<Term>> {
        let term = match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => Term::literal(b.to_string(), datatype_or(coercion, XSD_BOOLEAN)),
            Value::Number(n) => number_literal(n, coercion)?,
            Value::String(s) => {
                if s.starts_with("_:") {
                    return Ok(Some(self.identifier(context, s)?));
                }
                match coercion {
                    Coercion::Id => self.identifier(context, s)?,
                    Coercion::Vocab => Term::Iri(self.iri(context.expand_vocab(s)?)?),
                    Coercion::Datatype(datatype) => Term::literal(s.clone(), datatype.clone()),
                    Coercion::None => Term::literal(s.clone(), XSD_STRING),
                }
            }
            Value::Object(object) => return self.object_value(context, object).map(Some),
            Value::Array(_) => return Err(Error::malformed("unexpected array")),
        };
        Ok(Some(term))
    }

    fn object_value(&mut self, context: &Context, object: &Map<String, Value>) -> Result<Term> {
        let keywords = object
            .keys()
            .map(|k| (context.keyword(k), k))
            .collect::<Vec<_>>();

        if keywords.iter().any(|(kw, _)| kw.as_deref() == Some("@value")) {
            return value_object(context, object, &keywords);
        }
        if let [(Some(kw), key)] = keywords.as_slice() {
            if kw == "@id" {
                let id = object[key.as_str()]
                    .as_str()
                    .ok_or_else(|| Error::malformed("@id must be a string"))?;
                return self.identifier(context, id);
            }
        }
        self.node(object, context, false)
    }

    /// Term for a node identifier
    fn identifier(&mut self, context: &Context, value: &str) -> Result<Term> {
        let expanded = context.expand_id(value)?;
        if let Some(label) = expanded.strip_prefix("_:") {
            if !is_valid_blank_label(label) {
                return Err(Error::malformed(format!("invalid blank node {}", value)));
            }
            if label.starts_with(AUTO_BLANK_NODE_PREFIX) {
                return Err(Error::malformed(format!(
                    "blank node labels starting with {} are reserved",
                    AUTO_BLANK_NODE_PREFIX
                )));
            }
            return Ok(Term::blank(label));
        }
        Ok(Term::Iri(self.iri(expanded)?))
    }

    fn iri(&self, expanded: String) -> Result<String> {
        if expanded.starts_with('@') || !expanded.contains(':') {
            return Err(Error::malformed(format!("{} is not an absolute IRI", expanded)));
        }
        Ok(expanded)
    }

    fn fresh_blank_node(&mut self) -> Term {
        let label = format!("{}{}", AUTO_BLANK_NODE_PREFIX, self.blank_node_count);
        self.blank_node_count += 1;
        Term::blank(label)
    }

    fn emit(&mut self, subject: Term, predicate: Term, object: Term) {
        self.statements.push(Statement::new(subject, predicate, object));
    }

    /// Apply a local context (URL, object or array of them) on top of `active`
    fn process_context(&self, active: &Context, local: &Value, depth: usize) -> Result<Context> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(Error::malformed("context imports are nested too deeply"));
        }
        let mut result = active.clone();
        for ctx in as_array(local) {
            match ctx {
                Value::Null => result = Context::default(),
                Value::String(url) => {
                    let document = self.loader.load(url)?;
                    let remote = document.get("@context").ok_or_else(|| {
                        Error::malformed(format!("document at {} has no @context", url))
                    })?;
                    result = self.process_context(&result, remote, depth + 1)?;
                }
                Value::Object(definitions) => define_terms(&mut result, definitions)?,
                _ => return Err(Error::malformed("invalid @context")),
            }
        }
        Ok(result)
    }
}

fn define_terms(context: &mut Context, definitions: &Map<String, Value>) -> Result<()> {
    for (key, value) in definitions {
        match key.as_str() {
            "@version" | "@protected" => continue,
            "@vocab" => {
                context.vocab = match value {
                    Value::Null => None,
                    Value::String(v) => Some(v.clone()),
                    _ => return Err(Error::malformed("@vocab must be a string")),
                };
                continue;
            }
            k if k.starts_with('@') => {
                return Err(Error::malformed(format!("context keyword {} is not supported", k)))
            }
            _ => {}
        }
        let definition = match value {
            Value::Null => {
                context.terms.remove(key);
                continue;
            }
            Value::String(id) => TermDefinition {
                id: Some(id.clone()),
                ..Default::default()
            },
            Value::Object(def) => expanded_definition(key, def)?,
            _ => return Err(Error::malformed(format!("invalid definition of {}", key))),
        };
        context.terms.insert(key.clone(), definition);
    }
    // `@vocab` may itself be a compact IRI or a term of the same context
    if let Some(vocab) = context.vocab.clone() {
        if !vocab.contains("://") {
            let expanded = context.expand_prefixed(&vocab, false, 0)?;
            context.vocab = Some(expanded);
        }
    }
    Ok(())
}

fn expanded_definition(key: &str, def: &Map<String, Value>) -> Result<TermDefinition> {
    let mut definition = TermDefinition::default();
    for (k, v) in def {
        match k.as_str() {
            "@id" => definition.id = Some(string_member(key, k, v)?),
            "@type" => definition.coercion = Some(string_member(key, k, v)?),
            "@context" => definition.context = Some(v.clone()),
            "@protected" => {}
            "@container" if v == "@set" => {}
            _ => {
                return Err(Error::malformed(format!(
                    "{} in the definition of {} is not supported",
                    k, key
                )))
            }
        }
    }
    Ok(definition)
}

fn string_member(term: &str, member: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::malformed(format!("{} of {} must be a string", member, term)))
}

fn value_object(
    context: &Context,
    object: &Map<String, Value>,
    keywords: &[(Option<String>, &String)],
) -> Result<Term> {
    let mut value = None;
    let mut datatype = None;
    let mut language = None;
    for (keyword, key) in keywords {
        let v = &object[key.as_str()];
        match keyword.as_deref() {
            Some("@value") => value = Some(v),
            Some("@type") => datatype = Some(context.expand_vocab(&string_member("@value", "@type", v)?)?),
            Some("@language") => language = Some(string_member("@value", "@language", v)?),
            _ => return Err(Error::malformed(format!("{} is not allowed in a value object", key))),
        }
    }
    let value = value.ok_or_else(|| Error::malformed("value object without @value"))?;
    if let Some(language) = language {
        if datatype.is_some() {
            return Err(Error::malformed("value object with both @type and @language"));
        }
        let s = value
            .as_str()
            .ok_or_else(|| Error::malformed("language tagged value must be a string"))?;
        return Ok(Term::lang_literal(s, language.to_ascii_lowercase()));
    }
    let coercion = match datatype {
        Some(dt) if dt == RDF_LANG_STRING => {
            return Err(Error::malformed("langString value without @language"))
        }
        Some(dt) => Coercion::Datatype(dt),
        None => Coercion::None,
    };
    match value {
        Value::String(s) => Ok(Term::literal(s.clone(), datatype_or(&coercion, XSD_STRING))),
        Value::Bool(b) => Ok(Term::literal(b.to_string(), datatype_or(&coercion, XSD_BOOLEAN))),
        Value::Number(n) => number_literal(n, &coercion),
        _ => Err(Error::malformed("@value must be a string, number or boolean")),
    }
}

fn datatype_or(coercion: &Coercion, default: &str) -> String {
    match coercion {
        Coercion::Datatype(datatype) => datatype.clone(),
        _ => default.to_string(),
    }
}

/// Integers are written in decimal, other numbers in the canonical `xsd:double` form, e.g. `1.65E0`
fn number_literal(n: &serde_json::Number, coercion: &Coercion) -> Result<Term> {
    let wants_double = matches!(coercion, Coercion::Datatype(dt) if dt == XSD_DOUBLE);
    if !wants_double {
        if let Some(i) = n.as_i64() {
            return Ok(Term::literal(i.to_string(), datatype_or(coercion, XSD_INTEGER)));
        }
        if let Some(u) = n.as_u64() {
            return Ok(Term::literal(u.to_string(), datatype_or(coercion, XSD_INTEGER)));
        }
    }
    let f = n
        .as_f64()
        .ok_or_else(|| Error::malformed(format!("number {} is not representable", n)))?;
    if !wants_double && f.fract() == 0.0 && f.abs() < 1e21 {
        return Ok(Term::literal(
            format!("{:.0}", f),
            datatype_or(coercion, XSD_INTEGER),
        ));
    }
    Ok(Term::literal(canonical_double(f), datatype_or(coercion, XSD_DOUBLE)))
}

fn canonical_double(f: f64) -> String {
    let s = format!("{:E}", f);
    match s.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{}.0E{}", mantissa, exponent)
        }
        _ => s,
    }
}

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(values) => values.iter().collect(),
        v => vec![v],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::XSD_DATE_TIME, loader::StaticDocumentLoader};
    use serde_json::json;
    use test_utils::ld::*;

    fn loader() -> StaticDocumentLoader {
        contexts().into_iter().collect()
    }

    fn lines(statements: &[Statement]) -> Vec<String> {
        statements.iter().map(|s| s.to_ntriples()).collect()
    }

    #[test]
    fn person_credential_statements() {
        let doc = person_credential(ISSUER_0, "A", 30);
        let statements = canonicalize(&doc, &loader()).unwrap();
        let lines = lines(&statements);

        let cred = "<http://example.org/credentials/person/1>";
        let holder = format!("<{}>", HOLDER);
        assert!(lines.contains(&format!(
            "{} <{}> <https://www.w3.org/2018/credentials#VerifiableCredential> .",
            cred, RDF_TYPE
        )));
        assert!(lines.contains(&format!(
            "{} <https://www.w3.org/2018/credentials#issuer> <{}> .",
            cred, ISSUER_0
        )));
        assert!(lines.contains(&format!(
            "{} <https://www.w3.org/2018/credentials#issuanceDate> \"2024-01-01T00:00:00Z\"^^<{}> .",
            cred, XSD_DATE_TIME
        )));
        assert!(lines.contains(&format!(
            "{} <http://schema.org/age> \"30\"^^<{}> .",
            holder, XSD_INTEGER
        )));
        assert!(lines.contains(&format!(
            "{} <http://schema.org/height> \"1.65E0\"^^<{}> .",
            holder, XSD_DOUBLE
        )));
        assert!(lines.contains(&format!("{} <http://schema.org/identifier> \"A\" .", holder)));
        // Nested node without id, with a term only known through @vocab
        assert!(lines.contains(&format!("{} <http://schema.org/homeLocation> _:c14n0 .", holder)));
        assert!(lines.contains(
            &"_:c14n0 <https://schema.example.org/vocab#postalCode> \"1000001\" .".to_string()
        ));

        let mut sorted = lines.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(lines, sorted);
        assert_eq!(statements.len(), 12);
    }

    #[test]
    fn deterministic() {
        let doc = person_credential(ISSUER_0, "A", 30);
        let first = canonicalize(&doc, &loader()).unwrap();
        assert_eq!(first, canonicalize(&doc, &loader()).unwrap());

        // Array order and the proof member do not matter
        let mut reordered = doc.clone();
        reordered["type"] = json!(["Person", "VerifiableCredential"]);
        reordered["proof"] = json!({"type": "DataIntegrityProof"});
        assert_eq!(first, canonicalize(&reordered, &loader()).unwrap());

        let mut changed = doc;
        changed["credentialSubject"]["age"] = json!(31);
        assert_ne!(first, canonicalize(&changed, &loader()).unwrap());
    }

    #[test]
    fn inline_context_and_value_objects() {
        let doc = json!({
            "@context": {
                "ex": "http://example.org/",
                "label": {"@id": "ex:label"},
                "kind": {"@id": "ex:kind", "@type": "@vocab"},
                "@vocab": "ex:"
            },
            "@id": "ex:thing",
            "label": [
                {"@value": "chat", "@language": "FR"},
                {"@value": "7", "@type": "ex:custom"}
            ],
            "kind": "Widget",
            "weight": 2.0,
            "flag": false,
            "blank": "_:b0",
            "nothing": null
        });
        let lines = lines(&canonicalize(&doc, &StaticDocumentLoader::new()).unwrap());
        assert_eq!(
            lines,
            vec![
                "<http://example.org/thing> <http://example.org/blank> _:b0 .",
                "<http://example.org/thing> <http://example.org/flag> \"false\"^^<http://www.w3.org/2001/XMLSchema#boolean> .",
                "<http://example.org/thing> <http://example.org/kind> <http://example.org/Widget> .",
                "<http://example.org/thing> <http://example.org/label> \"7\"^^<http://example.org/custom> .",
                "<http://example.org/thing> <http://example.org/label> \"chat\"@fr .",
                "<http://example.org/thing> <http://example.org/weight> \"2\"^^<http://www.w3.org/2001/XMLSchema#integer> .",
            ]
        );
    }

    #[test]
    fn scoped_context() {
        let doc = json!({
            "@context": {
                "ex": "http://example.org/",
                "address": {"@id": "ex:address", "@context": {"city": "http://schema.org/city"}}
            },
            "@id": "http://example.org/p",
            "address": {"city": "Paris"}
        });
        let lines = lines(&canonicalize(&doc, &StaticDocumentLoader::new()).unwrap());
        assert_eq!(
            lines,
            vec![
                "<http://example.org/p> <http://example.org/address> _:c14n0 .",
                "_:c14n0 <http://schema.org/city> \"Paris\" .",
            ]
        );
    }

    #[test]
    fn canonical_doubles() {
        assert_eq!(canonical_double(1.65), "1.65E0");
        assert_eq!(canonical_double(30.0), "3.0E1");
        assert_eq!(canonical_double(-0.005), "-5.0E-3");
    }

    #[test]
    fn rejected_documents() {
        let loader = loader();
        for doc in [
            json!("not an object"),
            // Unknown term without @vocab
            json!({"@context": CREDENTIALS_CONTEXT, "id": "urn:x", "unknown": 1}),
            // Relative IRI
            json!({"@context": {"ex": "http://example.org/"}, "@id": "relative", "ex:p": 1}),
            // Unsupported keyword
            json!({"@context": {"ex": "http://example.org/"}, "@graph": []}),
            // Reserved blank node label
            json!({"@context": {"ex": "http://example.org/"}, "@id": "_:c14n3", "ex:p": 1}),
            // Context that cannot be loaded
            json!({"@context": "https://unknown.example/ctx", "@id": "urn:x"}),
            // Nested arrays
            json!({"@context": {"ex": "http://example.org/"}, "ex:p": [[1]]}),
        ] {
            assert!(canonicalize(&doc, &loader).is_err(), "{}", doc);
        }
    }
}
