use std::fmt;

use ornate_core::{ScopeChain, Value, diagnostic};

/// Ordered inline style declarations, as found in a `style` attribute.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StyleDeclarations {
    decls: Vec<(String, String)>,
}

impl StyleDeclarations {
    /// Lenient parse of `key: value; ...`. Fragments without a colon are
    /// ignored; a repeated property keeps its first position and last value.
    pub fn parse(css: &str) -> Self {
        let mut out = Self::default();
        for decl in css.split(';') {
            let decl = decl.trim();
            if decl.is_empty() {
                continue;
            }
            if let Some((k, v)) = decl.split_once(':') {
                let (k, v) = (k.trim(), v.trim());
                if !k.is_empty() {
                    out.set(k, v);
                }
            }
        }
        out
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, property: &str, value: &str) {
        match self
            .decls
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.decls.push((property.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let pos = self
            .decls
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(property))?;
        Some(self.decls.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for StyleDeclarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.decls.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{k}: {v};")?;
        }
        Ok(())
    }
}

fn append(existing: &str, sep: char, piece: &str) -> String {
    if piece.is_empty() {
        return existing.to_string();
    }
    if existing.is_empty() {
        return piece.to_string();
    }
    format!("{existing}{sep}{piece}")
}

/// Pieces contributed by a class/style directive value: the string itself,
/// the keys of an object whose values are truthy, or the truthy items of an
/// array.
fn pieces(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Object(_) => value
            .entries()
            .into_iter()
            .filter(|(_, v)| v.is_truthy())
            .map(|(k, _)| k)
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .filter(|v| v.is_truthy())
            .map(Value::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Extends a `class` attribute with the result of an `orn-class` expression.
/// A function value is called with the scope frames and its result appended.
pub fn compose_class(existing: &str, value: &Value, chain: &ScopeChain) -> String {
    if let Value::Function(f) = value {
        let frames = Value::array(chain.frames().to_vec());
        return match f.call(&chain.root(), &[frames]) {
            Ok(result) if !result.is_nullish() => append(existing, ' ', &result.to_string()),
            Ok(_) => existing.to_string(),
            Err(err) => {
                diagnostic!(error = %err, "class function failed");
                existing.to_string()
            }
        };
    }
    pieces(value)
        .iter()
        .fold(existing.to_string(), |acc, piece| append(&acc, ' ', piece))
}

/// Extends a `style` attribute with the result of an `orn-style` expression.
pub fn compose_style(existing: &str, value: &Value) -> String {
    pieces(value)
        .iter()
        .fold(existing.to_string(), |acc, piece| append(&acc, ';', piece))
}
