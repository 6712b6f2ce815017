//! Expansion of `repeat` directives into one sibling per collection entry.

use ornate_core::{ScopeChain, Value, diagnostic, evaluate};
use tracing::trace;

use crate::node::{Element, Node};
use crate::processor::Processor;

/// Parsed `<collection> as <key>:<value>` clause. With a single name after
/// `as`, only the value is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatClause {
    pub collection: String,
    pub key: Option<String>,
    pub value: String,
}

impl RepeatClause {
    pub fn parse(source: &str) -> Option<Self> {
        let (collection, names) = source.split_once(" as ")?;
        let collection = collection.trim();
        if collection.is_empty() {
            return None;
        }
        let (key, value) = match names.split_once(':') {
            Some((k, v)) => (Some(k.trim()), v.trim()),
            None => (None, names.trim()),
        };
        if value.is_empty() || key.is_some_and(str::is_empty) {
            return None;
        }
        Some(Self {
            collection: collection.to_string(),
            key: key.map(str::to_string),
            value: value.to_string(),
        })
    }

    fn frame(&self, key: &str, value: Value) -> Value {
        let frame = Value::object();
        if let Some(name) = &self.key {
            frame.set(name, coerce_key(key));
        }
        frame.set(&self.value, value);
        frame
    }
}

/// Integer-looking keys bind as numbers, everything else as strings.
fn coerce_key(key: &str) -> Value {
    let candidate = Value::from(key);
    let n = candidate.to_number();
    if key.trim().is_empty() || n.is_nan() {
        candidate
    } else {
        Value::from(n)
    }
}

/// Expands `template` (whose attribute at `attr_index` is the repeat
/// directive) into `siblings`. The slot at `index` ends up empty.
pub(crate) fn expand(
    processor: &Processor,
    mut template: Element,
    attr_index: usize,
    siblings: &mut Vec<Option<Node>>,
    index: usize,
    chain: &ScopeChain,
) {
    if let Some(slot) = siblings.get_mut(index) {
        *slot = None;
    }

    let attr = template.attributes.remove(attr_index);
    let source = attr.value.as_literal().unwrap_or_default();
    let Some(clause) = RepeatClause::parse(source) else {
        diagnostic!(repeat = source, "malformed repeat clause");
        return;
    };

    let collection = evaluate(&clause.collection, chain);
    if !collection.is_truthy() {
        trace!(collection = %clause.collection, "repeat over empty value");
        return;
    }

    let template = Node::Element(template);
    for (ordinal, (key, value)) in collection.entries().into_iter().enumerate() {
        let scoped = chain.extend(clause.frame(&key, value));
        if let Some(mut clone) = processor.process(template.clone(), None, index, &scoped) {
            clone.set_position(index + ordinal);
            siblings.push(Some(clone));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_with_key_and_value() {
        let clause = RepeatClause::parse("items as i:item").expect("clause");
        assert_eq!(clause.collection, "items");
        assert_eq!(clause.key.as_deref(), Some("i"));
        assert_eq!(clause.value, "item");
    }

    #[test]
    fn clause_with_value_only() {
        let clause = RepeatClause::parse("user.tags as tag").expect("clause");
        assert_eq!(clause.key, None);
        assert_eq!(clause.value, "tag");
    }

    #[test]
    fn malformed_clauses_are_rejected() {
        assert!(RepeatClause::parse("items").is_none());
        assert!(RepeatClause::parse(" as x").is_none());
        assert!(RepeatClause::parse("items as :x").is_none());
    }

    #[test]
    fn numeric_keys_become_numbers() {
        assert_eq!(coerce_key("2"), Value::from(2));
        assert_eq!(coerce_key("name"), Value::from("name"));
        assert_eq!(coerce_key(""), Value::from(""));
    }
}
