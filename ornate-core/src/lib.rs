//! Dynamic values, scope chains and the expression language used by
//! Ornate templates.

pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod scope;
pub mod value;

pub use error::EvalError;
pub use expr::{Invocation, assign, evaluate, evaluate_with, try_evaluate, try_evaluate_with};
pub use scope::ScopeChain;
pub use value::{Function, HostObject, Value};

#[doc(hidden)]
pub use tracing as __tracing;
