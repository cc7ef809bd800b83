//! Typed attribute trees.
//!
//! The typed AST mirrors the untyped one node for node; every node carries
//! the type inferred for it and variable references are resolved to their
//! environment entries. A `bad` tag marks a subtree that failed checking and
//! propagates to every ancestor.

use std::fmt;
use tempo_syntax::{BinOp, Expr, Statement, UnaryOp};

/// Type of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    /// Integer-valued with inclusive static range.
    Int { low: i64, high: i64 },
    /// Clock-valued.
    Clock,
    /// Difference of two clocks; only legal directly under a clock
    /// comparison.
    ClockDiff,
    /// Propositional.
    Bool,
    /// Failed to type; propagates upwards.
    Bad,
}

impl Ty {
    pub fn is_bad(self) -> bool {
        matches!(self, Ty::Bad)
    }

    pub fn is_int(self) -> bool {
        matches!(self, Ty::Int { .. })
    }

    pub fn is_bool(self) -> bool {
        matches!(self, Ty::Bool)
    }

    /// Clock or clock difference: admissible left side of a clock
    /// comparison.
    pub fn is_clock_term(self) -> bool {
        matches!(self, Ty::Clock | Ty::ClockDiff)
    }

    /// The static range, if integer-valued.
    pub fn range(self) -> Option<(i64, i64)> {
        match self {
            Ty::Int { low, high } => Some((low, high)),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int { low, high } => write!(f, "int[{low},{high}]"),
            Ty::Clock => f.write_str("clock"),
            Ty::ClockDiff => f.write_str("clock difference"),
            Ty::Bool => f.write_str("bool"),
            Ty::Bad => f.write_str("bad"),
        }
    }
}

/// A typed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedExpr {
    pub ty: Ty,
    pub kind: TypedExprKind,
}

/// The kind of a typed expression; shapes mirror [`tempo_syntax::Expr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedExprKind {
    Bool(bool),
    Int(i64),
    /// A name that did not resolve (undeclared, or an array used without a
    /// subscript). Always `bad`.
    Name(String),
    /// An array access whose base did not resolve to an array. Always
    /// `bad`.
    Elem {
        name: String,
        index: Box<TypedExpr>,
    },
    /// Scalar integer variable.
    IntVar {
        name: String,
        id: u16,
        low: i64,
        high: i64,
    },
    /// Scalar clock.
    Clock { name: String, id: u16 },
    /// Integer array element `name[index]`.
    IntElem {
        name: String,
        base: u16,
        dim: u16,
        low: i64,
        high: i64,
        index: Box<TypedExpr>,
    },
    /// Clock array element `name[index]`.
    ClockElem {
        name: String,
        base: u16,
        dim: u16,
        index: Box<TypedExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
    },
    Binary {
        op: BinOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
}

impl TypedExpr {
    pub fn new(ty: Ty, kind: TypedExprKind) -> Self {
        Self { ty, kind }
    }

    pub fn bad(kind: TypedExprKind) -> Self {
        Self { ty: Ty::Bad, kind }
    }

    /// Erase types back to the untyped tree. The typed tree mirrors its
    /// source, so this pretty-prints identically to the original attribute.
    pub fn to_expr(&self) -> Expr {
        match &self.kind {
            TypedExprKind::Bool(b) => Expr::Bool(*b),
            TypedExprKind::Int(n) => Expr::Int(*n),
            TypedExprKind::Name(name) => Expr::Var(name.clone()),
            TypedExprKind::Elem { name, index } => Expr::index(name.clone(), index.to_expr()),
            TypedExprKind::IntVar { name, .. } => Expr::Var(name.clone()),
            TypedExprKind::Clock { name, .. } => Expr::Var(name.clone()),
            TypedExprKind::IntElem { name, index, .. } => {
                Expr::index(name.clone(), index.to_expr())
            }
            TypedExprKind::ClockElem { name, index, .. } => {
                Expr::index(name.clone(), index.to_expr())
            }
            TypedExprKind::Unary { op, operand } => Expr::unary(*op, operand.to_expr()),
            TypedExprKind::Binary { op, left, right } => {
                Expr::binary(*op, left.to_expr(), right.to_expr())
            }
        }
    }
}

impl fmt::Display for TypedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_expr().fmt(f)
    }
}

/// Type of a statement node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtTy {
    Nop,
    /// Integer assignment.
    IntAssign,
    /// Clock reset to a non-negative integer.
    ClockAssign,
    Seq,
    Bad,
}

impl StmtTy {
    pub fn is_bad(self) -> bool {
        matches!(self, StmtTy::Bad)
    }
}

/// A typed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedStatement {
    pub ty: StmtTy,
    pub kind: TypedStatementKind,
}

/// The kind of a typed statement; shapes mirror
/// [`tempo_syntax::Statement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedStatementKind {
    Nop,
    /// `lhs = rhs`; `lhs` is an access form (variable or array element).
    Assign {
        lhs: TypedExpr,
        rhs: TypedExpr,
    },
    Seq {
        first: Box<TypedStatement>,
        second: Box<TypedStatement>,
    },
}

impl TypedStatement {
    pub fn new(ty: StmtTy, kind: TypedStatementKind) -> Self {
        Self { ty, kind }
    }

    /// Erase types back to the untyped statement.
    pub fn to_statement(&self) -> Statement {
        match &self.kind {
            TypedStatementKind::Nop => Statement::Nop,
            TypedStatementKind::Assign { lhs, rhs } => {
                let lhs = match &lhs.kind {
                    TypedExprKind::IntElem { name, index, .. }
                    | TypedExprKind::ClockElem { name, index, .. }
                    | TypedExprKind::Elem { name, index } => {
                        tempo_syntax::Lvalue::index(name.clone(), index.to_expr())
                    }
                    TypedExprKind::IntVar { name, .. }
                    | TypedExprKind::Clock { name, .. }
                    | TypedExprKind::Name(name) => tempo_syntax::Lvalue::var(name.clone()),
                    // lvalues are access forms by construction
                    other => unreachable!("non-access lvalue {other:?}"),
                };
                Statement::assign(lhs, rhs.to_expr())
            }
            TypedStatementKind::Seq { first, second } => {
                Statement::seq(first.to_statement(), second.to_statement())
            }
        }
    }
}

impl fmt::Display for TypedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_statement().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ty_predicates() {
        assert!(Ty::Bad.is_bad());
        assert!(Ty::Int { low: 0, high: 3 }.is_int());
        assert!(Ty::Clock.is_clock_term());
        assert!(Ty::ClockDiff.is_clock_term());
        assert!(!Ty::Bool.is_clock_term());
        assert_eq!(Ty::Int { low: -1, high: 4 }.range(), Some((-1, 4)));
        assert_eq!(Ty::Clock.range(), None);
    }

    #[test]
    fn test_typed_expr_prints_like_source() {
        let e = TypedExpr::new(
            Ty::Bool,
            TypedExprKind::Binary {
                op: BinOp::Lt,
                left: Box::new(TypedExpr::new(
                    Ty::Int { low: 0, high: 10 },
                    TypedExprKind::IntVar {
                        name: "x".to_string(),
                        id: 0,
                        low: 0,
                        high: 10,
                    },
                )),
                right: Box::new(TypedExpr::new(
                    Ty::Int { low: 5, high: 5 },
                    TypedExprKind::Int(5),
                )),
            },
        );
        assert_eq!(e.to_string(), "x < 5");
    }
}
