//! Structural templates: building trees from markup, resolving directives
//! against a scope chain, and caching remote templates.

pub mod builder;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod node;
pub mod processor;
pub mod repeat;
pub mod source;

pub use builder::TreeBuilder;
pub use cache::{FailurePolicy, TemplateCache};
pub use error::{FetchError, LoadError};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{FileFetcher, Fetcher, MemoryFetcher};
pub use handlers::{EventHandler, ModelBinding, ModelKind, VisibilityCheck};
pub use node::{AttrValue, Attribute, Element, Node, Text};
pub use processor::{DEFAULT_PREFIX, Processor, interpolate};
pub use repeat::RepeatClause;
pub use source::TemplateSource;
