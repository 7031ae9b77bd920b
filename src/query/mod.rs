#![forbid(unsafe_code)]

//! Expression-to-query translation and lazy execution.
//!
//! A query chain is built in three stages, each owning the one before it:
//! [`Table`] → [`FilterQuery`] (via `r#where`) → [`SelectQuery`] (via
//! `select`). Stages only accumulate trees; [`render`] turns them into query
//! text and [`executor`] fetches and decodes rows when they are pulled.

/// Abstract syntax tree for predicates and projections.
pub mod ast;

/// Fluent builder stages.
pub mod builder;

/// Deferred fetch-and-decode pipeline.
pub mod executor;

/// Textual predicate parser.
pub mod parse;

/// Query text rendering.
pub mod render;

/// Source record shapes.
pub mod shape;

/// Literal values.
pub mod value;

pub use ast::{call, field, lit, ArithOp, CmpOp, Expr, Projection, ProjectionItem};
pub use builder::{FilterQuery, ProjectionSpec, SelectQuery, Table};
pub use executor::{ExecState, Rows};
pub use parse::{parse_expr, parse_predicate};
pub use render::{render_field_list, render_predicate};
pub use shape::{Dynamic, RecordShape};
pub use value::Value;
