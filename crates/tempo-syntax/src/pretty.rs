//! Canonical printer for attribute trees.
//!
//! The output is minimal-parenthesis and round-trippable: parsing it and
//! printing again yields the same string.

use crate::ast::{Expr, Lvalue, Statement};
use std::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, 0)
    }
}

impl fmt::Display for Lvalue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lvalue::Var(name) => f.write_str(name),
            Lvalue::Index { base, index } => write!(f, "{base}[{index}]"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Nop => f.write_str("nop"),
            Statement::Assign { lhs, rhs } => write!(f, "{lhs} = {rhs}"),
            Statement::Seq { first, second } => write!(f, "{first}; {second}"),
        }
    }
}

/// Precedence of the atoms and of unary application; above every binary
/// operator.
const ATOM_PREC: u8 = 5;

fn prec(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        _ => ATOM_PREC,
    }
}

/// Print `expr` assuming the surrounding context binds at `min_prec`.
/// Binary operators are left-associative, so a right child at the parent's
/// own level needs parentheses while a left child does not.
fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr, min_prec: u8) -> fmt::Result {
    let parens = prec(expr) < min_prec;
    if parens {
        f.write_str("(")?;
    }
    match expr {
        Expr::Bool(b) => write!(f, "{b}")?,
        Expr::Int(n) => write!(f, "{n}")?,
        Expr::Var(name) => f.write_str(name)?,
        Expr::Index { base, index } => write!(f, "{base}[{index}]")?,
        Expr::Unary { op, operand } => {
            f.write_str(op.token())?;
            write_expr(f, operand, ATOM_PREC)?;
        }
        Expr::Binary { op, left, right } => {
            let p = op.precedence();
            write_expr(f, left, p)?;
            write!(f, " {} ", op.token())?;
            write_expr(f, right, p + 1)?;
        }
    }
    if parens {
        f.write_str(")")?;
    }
    Ok(())
}
