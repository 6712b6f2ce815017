// ornate-core/src/error.rs

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error in `{source_text}`: {message}")]
    Syntax { source_text: String, message: String },
    #[error("{0} is not defined")]
    UnknownName(String),
    #[error("{0} is not a function")]
    NotCallable(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("invalid assignment target")]
    InvalidTarget,
    #[error("{0}")]
    Native(String),
}
