//! Abstract syntax tree for predicates and projections.
//!
//! Predicates and projections are plain tagged trees so the renderer can match
//! every node kind exhaustively. Nodes that the query grammar cannot express
//! (arithmetic, calls) are still representable; rejecting them is the
//! renderer's job, which keeps the rejection in one place.

use std::ops;

use crate::query::Value;

/// Comparison operators supported by the query grammar.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// Operator symbol as it appears in query text.
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Arithmetic operators. Representable, never rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// Expression node over the fields of a source record shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Direct reference to a named field of the source record.
    Field(String),
    /// Scalar literal.
    Literal(Value),
    /// Binary comparison.
    Compare {
        /// Comparison operator.
        op: CmpOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Conjunction of all operands.
    And(Vec<Expr>),
    /// Disjunction of all operands.
    Or(Vec<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// Computed arithmetic value.
    Arith {
        /// Arithmetic operator.
        op: ArithOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Function call.
    Call {
        /// Function name as written.
        function: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
}

/// References a field of the source record shape.
pub fn field(name: impl Into<String>) -> Expr {
    Expr::Field(name.into())
}

/// Wraps a literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Builds a function call node.
pub fn call<I>(function: impl Into<String>, args: I) -> Expr
where
    I: IntoIterator<Item = Expr>,
{
    Expr::Call {
        function: function.into(),
        args: args.into_iter().collect(),
    }
}

impl Expr {
    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Field(_) => "field reference",
            Expr::Literal(_) => "literal",
            Expr::Compare { .. } => "comparison",
            Expr::And(_) | Expr::Or(_) => "logical connective",
            Expr::Not(_) => "negation",
            Expr::Arith { .. } => "arithmetic",
            Expr::Call { .. } => "call",
        }
    }

    /// Returns the field name when the node is a direct field reference.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Expr::Field(name) => Some(name),
            _ => None,
        }
    }

    fn compare(self, op: CmpOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Compare {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    fn arith(self, op: ArithOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Arith {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    /// `self == rhs`
    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Eq, rhs)
    }

    /// `self != rhs`
    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Ne, rhs)
    }

    /// `self < rhs`
    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Lt, rhs)
    }

    /// `self <= rhs`
    pub fn le(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Le, rhs)
    }

    /// `self > rhs`
    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Gt, rhs)
    }

    /// `self >= rhs`
    pub fn ge(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Ge, rhs)
    }

    /// Conjunction; extends an existing conjunction instead of nesting.
    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        match self {
            Expr::And(mut args) => {
                args.push(rhs.into());
                Expr::And(args)
            }
            other => Expr::And(vec![other, rhs.into()]),
        }
    }

    /// Disjunction; extends an existing disjunction instead of nesting.
    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        match self {
            Expr::Or(mut args) => {
                args.push(rhs.into());
                Expr::Or(args)
            }
            other => Expr::Or(vec![other, rhs.into()]),
        }
    }

    /// `self + rhs`
    pub fn plus(self, rhs: impl Into<Expr>) -> Expr {
        self.arith(ArithOp::Add, rhs)
    }

    /// `self - rhs`
    pub fn minus(self, rhs: impl Into<Expr>) -> Expr {
        self.arith(ArithOp::Sub, rhs)
    }

    /// `self * rhs`
    pub fn times(self, rhs: impl Into<Expr>) -> Expr {
        self.arith(ArithOp::Mul, rhs)
    }

    /// `self / rhs`
    pub fn divided_by(self, rhs: impl Into<Expr>) -> Expr {
        self.arith(ArithOp::Div, rhs)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        lit(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        lit(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        lit(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        lit(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        lit(value)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        lit(value)
    }
}

/// One element of a record-construction projection.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionItem {
    /// Source expression; must be a direct field reference to render.
    pub expr: Expr,
    /// Result field name when it differs from the source field name.
    pub alias: Option<String>,
}

impl ProjectionItem {
    /// Name of the field this item produces in the result record.
    pub fn result_name(&self) -> Option<&str> {
        self.alias.as_deref().or_else(|| self.expr.as_field())
    }
}

/// Record-construction node mapping source fields into result fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    /// Elements in declaration order.
    pub items: Vec<ProjectionItem>,
}

impl Projection {
    /// Returns `true` when any element renames its source field.
    pub fn has_aliases(&self) -> bool {
        self.items.iter().any(|item| match (&item.alias, &item.expr) {
            (Some(alias), Expr::Field(name)) => alias != name,
            (Some(_), _) => true,
            (None, _) => false,
        })
    }
}
