// ornate-core/src/expr/mod.rs
//! Template expression language.
//!
//! Expressions are a small, side-effect capable subset of script syntax:
//! literals, member access and calls, arithmetic, comparison, logical and
//! conditional operators, and assignment into the scope. Names resolve
//! against a [`ScopeChain`] with later frames shadowing earlier ones.
//!
//! [`evaluate`] is fail-soft: any error is reported through the `ornate`
//! diagnostic target and the result becomes `null`.

pub mod ast;
mod builtins;
mod eval;
pub mod parser;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostic;
use crate::error::EvalError;
use crate::scope::ScopeChain;
use crate::value::Value;
use ast::Program;
use eval::Interpreter;

/// Values bound to the reserved names `event` and `element` while a
/// handler runs.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    pub event: Value,
    pub element: Value,
}

const PROGRAM_CACHE_LIMIT: usize = 1024;

thread_local! {
    static PROGRAMS: RefCell<HashMap<String, Rc<Program>>> = RefCell::new(HashMap::new());
}

/// Parses `source`, reusing an earlier parse of the same text.
pub fn compile(source: &str) -> Result<Rc<Program>, EvalError> {
    if let Some(program) = PROGRAMS.with(|cache| cache.borrow().get(source).cloned()) {
        return Ok(program);
    }
    let program = Rc::new(parser::parse_program(source)?);
    PROGRAMS.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= PROGRAM_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(source.to_string(), Rc::clone(&program));
    });
    Ok(program)
}

pub fn try_evaluate(source: &str, chain: &ScopeChain) -> Result<Value, EvalError> {
    let program = compile(source)?;
    Interpreter::new(chain, None).run(&program)
}

pub fn try_evaluate_with(
    source: &str,
    chain: &ScopeChain,
    invocation: &Invocation,
) -> Result<Value, EvalError> {
    let program = compile(source)?;
    Interpreter::new(chain, Some(invocation)).run(&program)
}

/// Evaluates `source`; failures yield `Value::Null`.
pub fn evaluate(source: &str, chain: &ScopeChain) -> Value {
    try_evaluate(source, chain).unwrap_or_else(|err| fail(source, &err))
}

/// Evaluates `source` with `event` and `element` bound, as for handlers.
pub fn evaluate_with(source: &str, chain: &ScopeChain, invocation: &Invocation) -> Value {
    try_evaluate_with(source, chain, invocation).unwrap_or_else(|err| fail(source, &err))
}

/// Stores `value` into the place named by `target` (`name`, `a.b`, `a[i]`).
pub fn assign(target: &str, chain: &ScopeChain, value: Value) -> Result<(), EvalError> {
    let program = compile(target)?;
    match program.body.as_slice() {
        [place] if place.is_assignable() => Interpreter::new(chain, None).store(place, value),
        _ => Err(EvalError::InvalidTarget),
    }
}

fn fail(source: &str, err: &EvalError) -> Value {
    diagnostic!(expression = source, error = %err, "expression evaluation failed");
    Value::Null
}
