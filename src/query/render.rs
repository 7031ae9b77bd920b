//! Pure translation of predicate and projection trees into query text.
//!
//! Grammar:
//!
//! * fields render as their bare declared name;
//! * literals render as `null`, `true`/`false`, decimal integers, floats that
//!   always carry a `.`, and double-quoted strings with `\\ \" \n \r \t`
//!   escaped;
//! * every comparison and connective is wrapped in parentheses,
//!   `(lhs == rhs)`, `(a && b && c)`, `(a || b)`;
//! * negation is a `!` prefix on its operand.
//!
//! [`parse_predicate`](crate::query::parse_predicate) accepts exactly this
//! grammar.

use std::collections::HashSet;

use crate::error::{QueryError, Result};
use crate::query::ast::{Expr, Projection};
use crate::query::shape::is_reserved_word;
use crate::query::{RecordShape, Value};

/// Renders a predicate tree, resolving field references against `M`.
pub fn render_predicate<M: RecordShape>(expr: &Expr) -> Result<String> {
    let mut out = String::new();
    write_expr::<M>(&mut out, expr)?;
    Ok(out)
}

/// Renders the comma-joined source field list of a projection.
///
/// Every element must be a direct reference to a declared field of `M`;
/// fields are emitted in declaration order.
pub fn render_field_list<M: RecordShape>(projection: &Projection) -> Result<String> {
    if projection.items.is_empty() {
        return Err(QueryError::EmptyProjection);
    }
    let mut seen = HashSet::with_capacity(projection.items.len());
    let mut fields = Vec::with_capacity(projection.items.len());
    for (position, item) in projection.items.iter().enumerate() {
        let Some(name) = item.expr.as_field() else {
            return Err(QueryError::UnsupportedProjection {
                position,
                kind: item.expr.kind(),
            });
        };
        check_field::<M>(name)?;
        let result_name = item.alias.as_deref().unwrap_or(name);
        if !seen.insert(result_name) {
            return Err(QueryError::DuplicateProjection {
                name: result_name.to_owned(),
            });
        }
        fields.push(name);
    }
    Ok(fields.join(","))
}

/// A reserved word would render as a literal, so it never resolves, even
/// when a shape lists it.
fn check_field<M: RecordShape>(name: &str) -> Result<()> {
    if M::declares(name) && !is_reserved_word(name) {
        Ok(())
    } else {
        Err(QueryError::UnknownField {
            field: name.to_owned(),
            shape: M::NAME,
        })
    }
}

fn write_expr<M: RecordShape>(out: &mut String, expr: &Expr) -> Result<()> {
    match expr {
        Expr::Field(name) => {
            check_field::<M>(name)?;
            out.push_str(name);
        }
        Expr::Literal(value) => write_literal(out, value)?,
        Expr::Compare { op, lhs, rhs } => {
            out.push('(');
            write_expr::<M>(out, lhs)?;
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr::<M>(out, rhs)?;
            out.push(')');
        }
        Expr::And(args) => write_connective::<M>(out, args, "&&", "empty conjunction")?,
        Expr::Or(args) => write_connective::<M>(out, args, "||", "empty disjunction")?,
        Expr::Not(inner) => {
            out.push('!');
            write_expr::<M>(out, inner)?;
        }
        Expr::Arith { .. } | Expr::Call { .. } => {
            return Err(QueryError::UnsupportedExpression { kind: expr.kind() });
        }
    }
    Ok(())
}

fn write_connective<M: RecordShape>(
    out: &mut String,
    args: &[Expr],
    symbol: &str,
    empty_kind: &'static str,
) -> Result<()> {
    match args {
        [] => Err(QueryError::UnsupportedExpression { kind: empty_kind }),
        [single] => write_expr::<M>(out, single),
        [first, rest @ ..] => {
            out.push('(');
            write_expr::<M>(out, first)?;
            for arg in rest {
                out.push(' ');
                out.push_str(symbol);
                out.push(' ');
                write_expr::<M>(out, arg)?;
            }
            out.push(')');
            Ok(())
        }
    }
}

fn write_literal(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(v) => out.push_str(&v.to_string()),
        Value::Float(v) => {
            if !v.is_finite() {
                return Err(QueryError::UnsupportedExpression {
                    kind: "non-finite float literal",
                });
            }
            let text = v.to_string();
            out.push_str(&text);
            if !text.contains('.') {
                out.push_str(".0");
            }
        }
        Value::String(s) => write_quoted(out, s),
    }
    Ok(())
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}
