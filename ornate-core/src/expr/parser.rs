use std::sync::LazyLock;

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use super::ast::{AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, UnaryOp, UpdateOp};
use crate::error::EvalError;
use crate::value::format_number;

#[derive(pest_derive::Parser)]
#[grammar = "expr/grammar.pest"]
struct ExprParser;

type ParseResult<T> = Result<T, String>;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::nullish, Assoc::Left) | Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::strict_eq, Assoc::Left)
            | Op::infix(Rule::strict_ne, Assoc::Left)
            | Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not)
            | Op::prefix(Rule::neg)
            | Op::prefix(Rule::plus)
            | Op::prefix(Rule::typeof_op)
            | Op::prefix(Rule::pre_inc)
            | Op::prefix(Rule::pre_dec))
        .op(Op::postfix(Rule::member)
            | Op::postfix(Rule::optional_member)
            | Op::postfix(Rule::index)
            | Op::postfix(Rule::call)
            | Op::postfix(Rule::post_inc)
            | Op::postfix(Rule::post_dec))
});

/// Parses a `;`-separated sequence of expressions.
pub fn parse_program(source: &str) -> Result<Program, EvalError> {
    let syntax = |message: String| EvalError::Syntax {
        source_text: source.to_string(),
        message,
    };
    let mut pairs = ExprParser::parse(Rule::program, source).map_err(|e| syntax(e.to_string()))?;
    let program = pairs
        .next()
        .ok_or_else(|| syntax("empty input".to_string()))?;
    debug_assert!(program.as_rule() == Rule::program);

    let mut body = Vec::new();
    for pair in program.into_inner() {
        if pair.as_rule() == Rule::expr {
            body.push(build_expr(pair).map_err(syntax)?);
        }
    }
    Ok(Program { body })
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> ParseResult<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| format!("missing {what}"))
}

fn build_expr(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    let mut inner = pair.into_inner();
    let head = build_binary(next(&mut inner, "operand")?)?;
    let Some(second) = inner.next() else {
        return Ok(head);
    };

    if second.as_rule() == Rule::assign_op {
        let op = assign_op(second.as_str())?;
        let value = build_expr(next(&mut inner, "assigned value")?)?;
        if !head.is_assignable() {
            return Err("invalid assignment target".to_string());
        }
        return Ok(Expr::Assign {
            op,
            target: Box::new(head),
            value: Box::new(value),
        });
    }

    let consequent = build_expr(second)?;
    let alternate = build_expr(next(&mut inner, "conditional branch")?)?;
    Ok(Expr::Conditional {
        test: Box::new(head),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    })
}

fn build_binary(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    PRATT
        .map_primary(build_primary)
        .map_prefix(|op, operand| {
            let operand = operand?;
            match op.as_rule() {
                Rule::not => Ok(unary(UnaryOp::Not, operand)),
                Rule::neg => Ok(unary(UnaryOp::Neg, operand)),
                Rule::plus => Ok(unary(UnaryOp::Plus, operand)),
                Rule::typeof_op => Ok(unary(UnaryOp::TypeOf, operand)),
                Rule::pre_inc => update(UpdateOp::Increment, true, operand),
                Rule::pre_dec => update(UpdateOp::Decrement, true, operand),
                rule => Err(format!("unexpected prefix {rule:?}")),
            }
        })
        .map_postfix(|lhs, op| {
            let lhs = lhs?;
            match op.as_rule() {
                Rule::member | Rule::optional_member => {
                    let optional = op.as_rule() == Rule::optional_member;
                    let property = next(&mut op.into_inner(), "property name")?;
                    Ok(Expr::Member {
                        object: Box::new(lhs),
                        property: property.as_str().to_string(),
                        optional,
                    })
                }
                Rule::index => {
                    let index = build_expr(next(&mut op.into_inner(), "index")?)?;
                    Ok(Expr::Index {
                        object: Box::new(lhs),
                        index: Box::new(index),
                    })
                }
                Rule::call => {
                    let args = op
                        .into_inner()
                        .map(build_expr)
                        .collect::<ParseResult<Vec<_>>>()?;
                    Ok(Expr::Call {
                        callee: Box::new(lhs),
                        args,
                    })
                }
                Rule::post_inc => update(UpdateOp::Increment, false, lhs),
                Rule::post_dec => update(UpdateOp::Decrement, false, lhs),
                rule => Err(format!("unexpected postfix {rule:?}")),
            }
        })
        .map_infix(|lhs, op, rhs| {
            let (lhs, rhs) = (Box::new(lhs?), Box::new(rhs?));
            let logical = match op.as_rule() {
                Rule::nullish => Some(LogicalOp::Nullish),
                Rule::or => Some(LogicalOp::Or),
                Rule::and => Some(LogicalOp::And),
                _ => None,
            };
            if let Some(op) = logical {
                return Ok(Expr::Logical { op, lhs, rhs });
            }
            let op = match op.as_rule() {
                Rule::strict_eq => BinaryOp::StrictEq,
                Rule::strict_ne => BinaryOp::StrictNe,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::rem => BinaryOp::Rem,
                rule => return Err(format!("unexpected operator {rule:?}")),
            };
            Ok(Expr::Binary { op, lhs, rhs })
        })
        .parse(pair.into_inner())
}

fn build_primary(pair: Pair<'_, Rule>) -> ParseResult<Expr> {
    Ok(match pair.as_rule() {
        Rule::number => Expr::Literal(Literal::Number(parse_number(pair.as_str())?)),
        Rule::string => Expr::Literal(Literal::String(string_literal(pair)?)),
        Rule::boolean => Expr::Literal(Literal::Bool(pair.as_str() == "true")),
        Rule::null => Expr::Literal(Literal::Null),
        Rule::undefined => Expr::Literal(Literal::Undefined),
        Rule::this => Expr::This,
        Rule::ident => Expr::Ident(pair.as_str().to_string()),
        Rule::array => Expr::Array(
            pair.into_inner()
                .map(build_expr)
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        Rule::object => Expr::Object(
            pair.into_inner()
                .map(build_property)
                .collect::<ParseResult<Vec<_>>>()?,
        ),
        Rule::expr => build_expr(pair)?,
        rule => return Err(format!("unexpected {rule:?}")),
    })
}

fn build_property(pair: Pair<'_, Rule>) -> ParseResult<(String, Expr)> {
    let mut inner = pair.into_inner();
    let first = next(&mut inner, "property")?;
    if first.as_rule() == Rule::ident {
        let name = first.as_str().to_string();
        return Ok((name.clone(), Expr::Ident(name)));
    }

    let key = next(&mut first.into_inner(), "property key")?;
    let key = match key.as_rule() {
        Rule::string => string_literal(key)?,
        Rule::number => format_number(parse_number(key.as_str())?),
        _ => key.as_str().to_string(),
    };
    let value = build_expr(next(&mut inner, "property value")?)?;
    Ok((key, value))
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

fn update(op: UpdateOp, prefix: bool, target: Expr) -> ParseResult<Expr> {
    if !target.is_assignable() {
        return Err("invalid update target".to_string());
    }
    Ok(Expr::Update {
        op,
        prefix,
        target: Box::new(target),
    })
}

fn assign_op(text: &str) -> ParseResult<AssignOp> {
    Ok(match text {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Div,
        "%=" => AssignOp::Rem,
        "??=" => AssignOp::Nullish,
        other => return Err(format!("unknown assignment operator `{other}`")),
    })
}

fn parse_number(text: &str) -> ParseResult<f64> {
    text.parse::<f64>()
        .map_err(|e| format!("bad number `{text}`: {e}"))
}

fn string_literal(pair: Pair<'_, Rule>) -> ParseResult<String> {
    let chars = next(&mut pair.into_inner(), "string body")?;
    Ok(unescape(chars.as_str()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Expr {
        let mut program = parse_program(source).expect("parse");
        assert_eq!(program.body.len(), 1, "{source}");
        program.body.remove(0)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let Expr::Binary { op, rhs, .. } = parse_one("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn member_calls_nest_left_to_right() {
        let expr = parse_one("user.name.toUpperCase()");
        let Expr::Call { callee, args } = expr else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "toUpperCase"));
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(parse_one("true"), Expr::Literal(Literal::Bool(true)));
        assert_eq!(parse_one("trueish"), Expr::Ident("trueish".into()));
    }

    #[test]
    fn statements_split_on_semicolons() {
        let program = parse_program("a = 1; b = 2;").expect("parse");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn assignment_requires_a_place() {
        assert!(parse_program("1 = 2").is_err());
        assert!(parse_program("a + b = 2").is_err());
    }

    #[test]
    fn string_escapes_are_decoded() {
        assert_eq!(
            parse_one(r#"'it\'s\n'"#),
            Expr::Literal(Literal::String("it's\n".into()))
        );
    }
}
