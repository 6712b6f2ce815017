use crate::node::DomNode;

/// A host document. All content lives under a `body` element.
#[derive(Clone, Debug)]
pub struct Document {
    body: DomNode,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            body: DomNode::element("body"),
        }
    }

    pub fn parse(markup: &str) -> Self {
        let doc = Self::new();
        doc.body.set_inner_html(markup);
        doc
    }

    pub fn body(&self) -> DomNode {
        self.body.clone()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<DomNode> {
        self.body
            .descendants()
            .into_iter()
            .find(|n| n.attribute("id").as_deref() == Some(id))
    }

    pub fn to_html(&self) -> String {
        self.body.inner_html()
    }
}
