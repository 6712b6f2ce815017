// ornate-core/src/scope.rs

use indexmap::IndexMap;

use crate::error::EvalError;
use crate::value::Value;

/// Ordered list of scope frames. The first frame is the root scope given to
/// the engine; repeat iterations push one frame each. Name lookup favours
/// later frames.
#[derive(Clone, Debug, Default)]
pub struct ScopeChain {
    frames: Vec<Value>,
}

impl ScopeChain {
    pub fn new(root: Value) -> Self {
        Self { frames: vec![root] }
    }

    /// An array value is taken as an already-built chain; anything else is a
    /// single root frame.
    pub fn from_value(scope: Value) -> Self {
        match &scope {
            Value::Array(items) => Self {
                frames: items.borrow().clone(),
            },
            _ => Self::new(scope),
        }
    }

    pub fn from_frames(frames: Vec<Value>) -> Self {
        Self { frames }
    }

    pub fn root(&self) -> Value {
        self.frames.first().cloned().unwrap_or_default()
    }

    pub fn frames(&self) -> &[Value] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// A new chain with `frame` appended; `self` is left untouched.
    pub fn extend(&self, frame: Value) -> Self {
        let mut frames = self.frames.clone();
        frames.push(frame);
        Self { frames }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Value::Object(map) => map.borrow().get(name).cloned(),
            _ => None,
        })
    }

    /// Writes to the innermost frame that already defines `name`, falling
    /// back to the root frame.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EvalError> {
        for frame in self.frames.iter().rev() {
            if let Value::Object(map) = frame {
                let mut map = map.borrow_mut();
                if let Some(slot) = map.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
            }
        }
        match self.frames.first() {
            Some(Value::Object(map)) => {
                map.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(EvalError::UnknownName(name.to_string())),
        }
    }

    /// All visible names with their winning values.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut names = IndexMap::new();
        for frame in &self.frames {
            if let Value::Object(map) = frame {
                for (k, v) in map.borrow().iter() {
                    names.insert(k.clone(), v.clone());
                }
            }
        }
        names
    }
}
