//! Attribute syntax for the Tempo model checker.
//!
//! Locations carry an invariant expression; edges carry a guard expression
//! and an update statement. This crate defines the untyped trees the surface
//! parser produces and their canonical textual form.

pub mod ast;
pub mod pretty;

pub use ast::{BinOp, Expr, Lvalue, Statement, UnaryOp};
