//! Variable environment, typed AST and type checker for Tempo attributes.

pub mod checker;
pub mod env;
pub mod error;
pub mod infer;
pub mod log;
pub mod typed;

pub use checker::{typecheck_expr, typecheck_formula, typecheck_statement};
pub use env::{Binding, ClockDecl, IntVarDecl, VarEnv, ZERO_CLOCK_ID, ZERO_CLOCK_NAME};
pub use error::EnvError;
pub use log::{Entry, Log, Severity};
pub use typed::{StmtTy, Ty, TypedExpr, TypedExprKind, TypedStatement, TypedStatementKind};
