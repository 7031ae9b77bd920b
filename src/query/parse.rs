//! Parser for textual predicates written in the render grammar.
//!
//! Text is tokenized by [`lexer`] and then parsed from the token stream.
//! Precedence from loosest to tightest: `||`, `&&`, comparisons, `+ -`,
//! `* /`, prefix `!`. Comparisons do not chain.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::ops::Range;

use chumsky::error::SimpleReason;
use chumsky::prelude::*;
use chumsky::Stream;

use crate::error::{QueryError, Result};
use crate::query::ast::{ArithOp, CmpOp, Expr};
use crate::query::Value;

/// Range of a token in the source text: char offsets out of [`lexer`], byte
/// offsets once handed to the token parser.
pub type Span = Range<usize>;

/// Parses predicate text into an expression tree.
///
/// ```
/// use querywire::query::{field, parse_predicate};
///
/// let expr = parse_predicate("ID == 123").unwrap();
/// assert_eq!(expr, field("ID").eq(123));
/// ```
pub fn parse_predicate(text: &str) -> Result<Expr> {
    parse_expr(text)
}

/// Parses any single expression, including ones that do not render.
///
/// Used for projection elements, where a literal or computed element must
/// survive parsing so rendering can reject it by position.
pub fn parse_expr(text: &str) -> Result<Expr> {
    let tokens = lexer().parse(text).map_err(|errors| {
        first_error(errors, |span: &Span| byte_offset(text, span.start))
    })?;
    let tokens: Vec<(Token, Span)> = tokens
        .into_iter()
        .map(|(token, span)| (token, byte_offset(text, span.start)..byte_offset(text, span.end)))
        .collect();

    let len = text.len();
    expr()
        .then_ignore(end())
        .parse(Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errors| first_error(errors, |span: &Span| span.start))
}

/// Predicate tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// Field or function name.
    Ident(String),
    /// Unsigned decimal integer.
    Int(String),
    /// Unsigned decimal with a fractional part.
    Float(String),
    /// String literal, escapes already resolved.
    Str(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// Lone `=`; never valid, lexed so errors point at it.
    Equals,
    /// `!`
    Bang,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// Comparison operator.
    Cmp(CmpOp),
    /// Arithmetic operator.
    Arith(ArithOp),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Int(text) | Token::Float(text) => write!(f, "number {text}"),
            Token::Str(_) => write!(f, "string literal"),
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::Null => write!(f, "'null'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Equals => write!(f, "'='"),
            Token::Bang => write!(f, "'!'"),
            Token::AndAnd => write!(f, "'&&'"),
            Token::OrOr => write!(f, "'||'"),
            Token::Cmp(op) => write!(f, "'{}'", op.symbol()),
            Token::Arith(op) => write!(f, "'{}'", arith_symbol(*op)),
        }
    }
}

fn arith_symbol(op: ArithOp) -> char {
    match op {
        ArithOp::Add => '+',
        ArithOp::Sub => '-',
        ArithOp::Mul => '*',
        ArithOp::Div => '/',
    }
}

/// Tokenizer for predicate text. Spans are char offsets.
pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
    )));
    let string = just('"')
        .ignore_then(
            filter(|c: &char| *c != '\\' && *c != '"')
                .or(escape)
                .repeated(),
        )
        .then_ignore(just('"'))
        .collect::<String>()
        .map(Token::Str);

    let number = text::digits(10)
        .then(just('.').ignore_then(text::digits(10)).or_not())
        .map(|(int, frac): (String, Option<String>)| match frac {
            Some(frac) => Token::Float(format!("{int}.{frac}")),
            None => Token::Int(int),
        });

    let keyword_or_ident = text::ident().map(|s: String| match s.as_str() {
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Ident(s),
    });

    let operator = choice((
        just("==").to(Token::Cmp(CmpOp::Eq)),
        just('=').to(Token::Equals),
        just("&&").to(Token::AndAnd),
        just("||").to(Token::OrOr),
        just("!=").to(Token::Cmp(CmpOp::Ne)),
        just("<=").to(Token::Cmp(CmpOp::Le)),
        just(">=").to(Token::Cmp(CmpOp::Ge)),
        just('<').to(Token::Cmp(CmpOp::Lt)),
        just('>').to(Token::Cmp(CmpOp::Gt)),
        just('!').to(Token::Bang),
        just('+').to(Token::Arith(ArithOp::Add)),
        just('-').to(Token::Arith(ArithOp::Sub)),
        just('*').to(Token::Arith(ArithOp::Mul)),
        just('/').to(Token::Arith(ArithOp::Div)),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
    ));

    choice((string, number, keyword_or_ident, operator))
        .map_with_span(|token, span| (token, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

fn expr() -> impl Parser<Token, Expr, Error = Simple<Token>> + Clone {
    recursive(|expr| {
        let ident = select! { Token::Ident(name) => name };

        let number = select! {
            Token::Int(text) => (text, false),
            Token::Float(text) => (text, true),
        };
        let numeric = just(Token::Arith(ArithOp::Sub))
            .or_not()
            .then(number)
            .try_map(|(minus, (text, float)), span| {
                let text = match minus {
                    Some(_) => format!("-{text}"),
                    None => text,
                };
                number_literal(&text, float).map_err(|message| Simple::custom(span, message))
            });

        let literal = select! {
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
            Token::Str(value) => Value::String(value),
        }
        .or(numeric)
        .map(Expr::Literal);

        let call = ident
            .clone()
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(function, args)| Expr::Call { function, args });

        let parens = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((literal, call, ident.map(Expr::Field), parens));

        let unary = just(Token::Bang)
            .repeated()
            .then(atom)
            .foldr(|_, operand| Expr::Not(Box::new(operand)));

        let op = |op: ArithOp| just(Token::Arith(op)).to(op);

        let product = unary
            .clone()
            .then(op(ArithOp::Mul).or(op(ArithOp::Div)).then(unary).repeated())
            .foldl(arith);

        let sum = product
            .clone()
            .then(op(ArithOp::Add).or(op(ArithOp::Sub)).then(product).repeated())
            .foldl(arith);

        // At most one comparison per operand; `a < b < c` stops at the
        // second operator.
        let cmp = select! { Token::Cmp(op) => op };
        let comparison = sum
            .clone()
            .then(cmp.then(sum).or_not())
            .map(|(lhs, rhs)| match rhs {
                None => lhs,
                Some((op, rhs)) => Expr::Compare {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            });

        let conjunction = comparison
            .clone()
            .then(just(Token::AndAnd).ignore_then(comparison).repeated())
            .map(|(first, rest)| connective(first, rest, Expr::And));

        conjunction
            .clone()
            .then(just(Token::OrOr).ignore_then(conjunction).repeated())
            .map(|(first, rest)| connective(first, rest, Expr::Or))
    })
}

fn arith(lhs: Expr, (op, rhs): (ArithOp, Expr)) -> Expr {
    Expr::Arith {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// Operands of one `&&`/`||` chain form a single node; parenthesized
/// sub-chains stay nested so rendering reproduces the input.
fn connective(first: Expr, rest: Vec<Expr>, build: fn(Vec<Expr>) -> Expr) -> Expr {
    if rest.is_empty() {
        return first;
    }
    let mut args = Vec::with_capacity(rest.len() + 1);
    args.push(first);
    args.extend(rest);
    build(args)
}

fn number_literal(text: &str, float: bool) -> std::result::Result<Value, String> {
    if float {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|err| format!("invalid float '{text}': {err}"))
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|err| format!("invalid integer '{text}': {err}"))
    }
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}

fn first_error<T>(errors: Vec<Simple<T>>, position: impl Fn(&Span) -> usize) -> QueryError
where
    T: fmt::Display + Hash + Eq,
{
    match errors.into_iter().next() {
        Some(error) => QueryError::InvalidPredicate {
            position: position(&error.span()),
            message: describe_error(&error),
        },
        None => QueryError::InvalidPredicate {
            position: 0,
            message: "unparsable predicate".to_owned(),
        },
    }
}

fn describe_error<T: fmt::Display + Hash + Eq>(error: &Simple<T>) -> String {
    if let SimpleReason::Custom(message) = error.reason() {
        return message.clone();
    }
    let found = error
        .found()
        .map_or_else(|| "end of input".to_owned(), |found| found.to_string());
    let expected: BTreeSet<String> = error
        .expected()
        .map(|expected| {
            expected
                .as_ref()
                .map_or_else(|| "end of input".to_owned(), |e| e.to_string())
        })
        .collect();
    if expected.is_empty() {
        format!("unexpected {found}")
    } else {
        let expected: Vec<String> = expected.into_iter().collect();
        format!("unexpected {found}, expected one of: {}", expected.join(", "))
    }
}
