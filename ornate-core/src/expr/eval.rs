use std::cmp::Ordering;

use super::Invocation;
use super::ast::{AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, UnaryOp, UpdateOp};
use super::builtins;
use crate::error::EvalError;
use crate::scope::ScopeChain;
use crate::value::Value;

type EvalResult = Result<Value, EvalError>;

/// Tree-walking interpreter over a parsed program. Names resolve against the
/// scope chain, then the invocation's `event`/`element`, then globals.
pub(crate) struct Interpreter<'a> {
    chain: &'a ScopeChain,
    invocation: Option<&'a Invocation>,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(chain: &'a ScopeChain, invocation: Option<&'a Invocation>) -> Self {
        Self { chain, invocation }
    }

    pub(crate) fn run(&self, program: &Program) -> EvalResult {
        let mut last = Value::Undefined;
        for expr in &program.body {
            last = self.eval(expr)?;
        }
        Ok(last)
    }

    fn eval(&self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(lit) => Ok(literal(lit)),
            Expr::Ident(name) => self.lookup(name),
            Expr::This => Ok(self.chain.root()),
            Expr::Array(items) => Ok(Value::array(self.eval_list(items)?)),
            Expr::Object(props) => {
                let obj = Value::object();
                for (key, value) in props {
                    obj.set_property(key, self.eval(value)?)?;
                }
                Ok(obj)
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let target = self.eval(object)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                target.get_property(property)
            }
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let key = self.eval(index)?;
                target.get_property(&key.to_property_key())
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Update { op, prefix, target } => {
                let old = self.eval(target)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.store(target, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Ok(binary(*op, &lhs, &rhs))
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let short_circuit = match op {
                    LogicalOp::And => !lhs.is_truthy(),
                    LogicalOp::Or => lhs.is_truthy(),
                    LogicalOp::Nullish => !lhs.is_nullish(),
                };
                if short_circuit { Ok(lhs) } else { self.eval(rhs) }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Assign { op, target, value } => {
                let new = match op {
                    AssignOp::Assign => self.eval(value)?,
                    AssignOp::Nullish => {
                        let current = self.eval(target)?;
                        if !current.is_nullish() {
                            return Ok(current);
                        }
                        self.eval(value)?
                    }
                    compound => {
                        let current = self.eval(target)?;
                        let rhs = self.eval(value)?;
                        match compound.binary_op() {
                            Some(op) => binary(op, &current, &rhs),
                            None => rhs,
                        }
                    }
                };
                self.store(target, new.clone())?;
                Ok(new)
            }
        }
    }

    fn lookup(&self, name: &str) -> EvalResult {
        // reserved: they shadow scope fields and are false outside a handler
        match (name, self.invocation) {
            ("event", Some(invocation)) => return Ok(invocation.event.clone()),
            ("element", Some(invocation)) => return Ok(invocation.element.clone()),
            ("event" | "element", None) => return Ok(Value::Bool(false)),
            _ => {}
        }
        if let Some(value) = self.chain.lookup(name) {
            return Ok(value);
        }
        builtins::global(name).ok_or_else(|| EvalError::UnknownName(name.to_string()))
    }

    pub(crate) fn store(&self, target: &Expr, value: Value) -> Result<(), EvalError> {
        match target {
            Expr::Ident(name) => self.chain.assign(name, value),
            Expr::Member { object, property, .. } => {
                self.eval(object)?.set_property(property, value)
            }
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let key = self.eval(index)?;
                target.set_property(&key.to_property_key(), value)
            }
            _ => Err(EvalError::InvalidTarget),
        }
    }

    fn eval_list(&self, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn call(&self, callee: &Expr, args: &[Expr]) -> EvalResult {
        match callee {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let receiver = self.eval(object)?;
                if *optional && receiver.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let args = self.eval_list(args)?;
                call_method(&receiver, property, &args)
            }
            Expr::Index { object, index } => {
                let receiver = self.eval(object)?;
                let name = self.eval(index)?.to_property_key();
                let args = self.eval_list(args)?;
                call_method(&receiver, &name, &args)
            }
            _ => {
                let function = self.eval(callee)?;
                let args = self.eval_list(args)?;
                match function {
                    Value::Function(f) => f.call(&self.chain.root(), &args),
                    _ => Err(EvalError::NotCallable(describe(callee))),
                }
            }
        }
    }

    fn unary(&self, op: UnaryOp, operand: &Expr) -> EvalResult {
        if op == UnaryOp::TypeOf {
            if let Expr::Ident(name) = operand {
                return match self.lookup(name) {
                    Ok(value) => Ok(Value::String(value.type_of().to_string())),
                    Err(EvalError::UnknownName(_)) => Ok(Value::String("undefined".to_string())),
                    Err(err) => Err(err),
                };
            }
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::String(value.type_of().to_string()),
        })
    }
}

fn call_method(receiver: &Value, name: &str, args: &[Value]) -> EvalResult {
    if let Value::Function(f) = receiver.get_property(name)? {
        return f.call(receiver, args);
    }
    builtins::call_method(receiver, name, args)
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member { property, .. } => property.clone(),
        _ => "expression".to_string(),
    }
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Undefined => Value::Undefined,
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

pub(crate) fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let (lhs, rhs) = (lhs.to_primitive(), rhs.to_primitive());
            if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) {
                Value::String(format!("{lhs}{rhs}"))
            } else {
                Value::Number(lhs.to_number() + rhs.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::Eq => Value::Bool(lhs.loose_equals(rhs)),
        BinaryOp::Ne => Value::Bool(!lhs.loose_equals(rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_equals(rhs)),
        BinaryOp::StrictNe => Value::Bool(!lhs.strict_equals(rhs)),
        BinaryOp::Lt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(lhs, rhs) == Some(Ordering::Greater)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(lhs, rhs),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

/// Strings compare lexically, everything else numerically; `None` when
/// either side is NaN.
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs.to_primitive(), rhs.to_primitive()) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}
