use std::fmt;
use std::sync::LazyLock;

use ornate_dom::DomNode;
use regex::Regex;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*>|\n").expect("markup pattern"));

/// Where a template comes from.
#[derive(Clone)]
pub enum TemplateSource {
    /// Already-rendered nodes; the element's children are the template.
    Element(DomNode),
    Markup(String),
    /// Identifier resolved through the template cache and a fetcher.
    Remote(String),
}

impl TemplateSource {
    /// Strings containing a tag or a line break are markup; anything else is
    /// a remote identifier.
    pub fn detect(source: &str) -> Self {
        if MARKUP.is_match(source) {
            TemplateSource::Markup(source.to_string())
        } else {
            TemplateSource::Remote(source.trim().to_string())
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, TemplateSource::Remote(_))
    }
}

impl From<&str> for TemplateSource {
    fn from(source: &str) -> Self {
        Self::detect(source)
    }
}

impl From<DomNode> for TemplateSource {
    fn from(node: DomNode) -> Self {
        TemplateSource::Element(node)
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Element(node) => write!(f, "Element(<{}>)", node.node_name()),
            TemplateSource::Markup(m) => f.debug_tuple("Markup").field(m).finish(),
            TemplateSource::Remote(id) => f.debug_tuple("Remote").field(id).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_and_newlines_mean_markup() {
        assert!(matches!(TemplateSource::detect("<p>hi</p>"), TemplateSource::Markup(_)));
        assert!(matches!(TemplateSource::detect("line one\nline two"), TemplateSource::Markup(_)));
    }

    #[test]
    fn bare_identifiers_are_remote() {
        match TemplateSource::detect(" views/list.html ") {
            TemplateSource::Remote(id) => assert_eq!(id, "views/list.html"),
            other => panic!("expected remote, got {other:?}"),
        }
        assert!(TemplateSource::detect("a < b").is_remote());
    }
}
