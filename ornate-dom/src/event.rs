use ornate_core::{HostObject, Value};

use crate::node::DomNode;

#[derive(Clone)]
pub struct Event {
    kind: String,
    bubbles: bool,
    detail: Value,
    target: Option<DomNode>,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            bubbles: true,
            detail: Value::Undefined,
            target: None,
        }
    }

    pub fn non_bubbling(kind: &str) -> Self {
        Self {
            bubbles: false,
            ..Self::new(kind)
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn detail(&self) -> &Value {
        &self.detail
    }

    pub fn target(&self) -> Option<&DomNode> {
        self.target.as_ref()
    }

    pub(crate) fn with_target(&self, target: &DomNode) -> Self {
        let mut event = self.clone();
        if event.target.is_none() {
            event.target = Some(target.clone());
        }
        event
    }

    /// Exposes the event to expressions as `event`.
    pub fn to_value(&self) -> Value {
        Value::host(EventHandle(self.clone()))
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("bubbles", &self.bubbles)
            .field("detail", &self.detail)
            .finish()
    }
}

struct EventHandle(Event);

impl HostObject for EventHandle {
    fn type_name(&self) -> &str {
        "Event"
    }

    fn get(&self, key: &str) -> Value {
        match key {
            "type" => Value::from(self.0.kind.as_str()),
            "bubbles" => Value::Bool(self.0.bubbles),
            "detail" => self.0.detail.clone(),
            "target" => self.0.target.as_ref().map_or(Value::Null, DomNode::to_value),
            _ => Value::Undefined,
        }
    }
}
