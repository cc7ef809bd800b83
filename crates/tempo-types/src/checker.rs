//! Type checking pass: untyped attribute trees to typed trees.
//!
//! Checking is syntax-directed. Diagnostics go to the [`Log`] under the
//! caller's context string; a node whose own combination is invalid is
//! reported once, while a node that merely contains a `bad` child stays
//! silent so each independent error in a subtree surfaces exactly once.

use crate::env::{Binding, VarEnv};
use crate::infer;
use crate::log::Log;
use crate::typed::{StmtTy, Ty, TypedExpr, TypedExprKind, TypedStatement, TypedStatementKind};
use tempo_syntax::{BinOp, Expr, Statement, UnaryOp};

/// Type check an expression.
pub fn typecheck_expr(expr: &Expr, env: &VarEnv, log: &mut Log, context: &str) -> TypedExpr {
    Checker { env, log, context }.check_expr(expr)
}

/// Type check a guard or invariant: an expression that must be a boolean
/// formula.
pub fn typecheck_formula(expr: &Expr, env: &VarEnv, log: &mut Log, context: &str) -> TypedExpr {
    let mut checker = Checker { env, log, context };
    let mut typed = checker.check_expr(expr);
    if !typed.ty.is_bad() && !typed.ty.is_bool() {
        checker.error(format!(
            "expression of type {} is not a boolean formula",
            typed.ty
        ));
        typed.ty = Ty::Bad;
    }
    typed
}

/// Type check a statement.
pub fn typecheck_statement(
    stmt: &Statement,
    env: &VarEnv,
    log: &mut Log,
    context: &str,
) -> TypedStatement {
    Checker { env, log, context }.check_statement(stmt)
}

struct Checker<'a> {
    env: &'a VarEnv,
    log: &'a mut Log,
    context: &'a str,
}

impl Checker<'_> {
    fn error(&mut self, message: impl Into<String>) {
        self.log.error(self.context, message);
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.log.warning(self.context, message);
    }

    fn check_expr(&mut self, expr: &Expr) -> TypedExpr {
        match expr {
            Expr::Bool(b) => TypedExpr::new(Ty::Bool, TypedExprKind::Bool(*b)),
            Expr::Int(n) => TypedExpr::new(Ty::Int { low: *n, high: *n }, TypedExprKind::Int(*n)),
            Expr::Var(name) => self.check_var(name),
            Expr::Index { base, index } => self.check_index(base, index),
            Expr::Unary { op, operand } => self.check_unary(*op, operand),
            Expr::Binary { op, left, right } => self.check_binary(*op, left, right),
        }
    }

    fn check_var(&mut self, name: &str) -> TypedExpr {
        match self.env.lookup(name) {
            None => {
                self.error(format!("undeclared identifier {name}"));
                TypedExpr::bad(TypedExprKind::Name(name.to_string()))
            }
            Some(Binding::Int(v)) if v.dim == 1 => TypedExpr::new(
                Ty::Int {
                    low: v.low,
                    high: v.high,
                },
                TypedExprKind::IntVar {
                    name: v.name.clone(),
                    id: v.id,
                    low: v.low,
                    high: v.high,
                },
            ),
            Some(Binding::Clock(c)) if c.dim == 1 => TypedExpr::new(
                Ty::Clock,
                TypedExprKind::Clock {
                    name: c.name.clone(),
                    id: c.id,
                },
            ),
            Some(_) => {
                self.error(format!("array {name} used without a subscript"));
                TypedExpr::bad(TypedExprKind::Name(name.to_string()))
            }
        }
    }

    fn check_index(&mut self, base: &str, index: &Expr) -> TypedExpr {
        let idx = self.check_expr(index);
        let idx_ok = match idx.ty {
            Ty::Bad => false,
            Ty::Int { .. } => true,
            _ => {
                self.error("array subscript is not an integer");
                false
            }
        };
        match self.env.lookup(base) {
            None => {
                self.error(format!("undeclared identifier {base}"));
                TypedExpr::bad(TypedExprKind::Elem {
                    name: base.to_string(),
                    index: Box::new(idx),
                })
            }
            Some(Binding::Int(v)) if v.dim > 1 => {
                let ty = if idx_ok && self.subscript_contained(idx.ty, v.dim) {
                    Ty::Int {
                        low: v.low,
                        high: v.high,
                    }
                } else {
                    Ty::Bad
                };
                TypedExpr::new(
                    ty,
                    TypedExprKind::IntElem {
                        name: v.name.clone(),
                        base: v.id,
                        dim: v.dim,
                        low: v.low,
                        high: v.high,
                        index: Box::new(idx),
                    },
                )
            }
            Some(Binding::Clock(c)) if c.dim > 1 => {
                let ty = if idx_ok && self.subscript_contained(idx.ty, c.dim) {
                    Ty::Clock
                } else {
                    Ty::Bad
                };
                TypedExpr::new(
                    ty,
                    TypedExprKind::ClockElem {
                        name: c.name.clone(),
                        base: c.id,
                        dim: c.dim,
                        index: Box::new(idx),
                    },
                )
            }
            Some(_) => {
                self.error(format!("{base} is not an array"));
                TypedExpr::bad(TypedExprKind::Elem {
                    name: base.to_string(),
                    index: Box::new(idx),
                })
            }
        }
    }

    /// The static subscript range must be contained in `[0, dim)`.
    fn subscript_contained(&mut self, idx_ty: Ty, dim: u16) -> bool {
        let (low, high) = idx_ty.range().expect("integer subscript");
        if low >= 0 && high < i64::from(dim) {
            true
        } else {
            self.error(format!(
                "array index [{low},{high}] out of range [0,{}]",
                dim - 1
            ));
            false
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr) -> TypedExpr {
        let operand = self.check_expr(operand);
        let ty = match (op, operand.ty) {
            (_, Ty::Bad) => Ty::Bad,
            (UnaryOp::Neg, Ty::Int { low, high }) => {
                let (low, high) = infer::neg_range(low, high);
                Ty::Int { low, high }
            }
            (UnaryOp::Neg, _) => {
                self.error("operand of - is not an integer");
                Ty::Bad
            }
            (UnaryOp::Not, Ty::Bool) => Ty::Bool,
            (UnaryOp::Not, _) => {
                self.error("operand of ! is not a boolean formula");
                Ty::Bad
            }
        };
        TypedExpr::new(
            ty,
            TypedExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    fn check_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> TypedExpr {
        let left = self.check_expr(left);
        let right = self.check_expr(right);
        let ty = if left.ty.is_bad() || right.ty.is_bad() {
            Ty::Bad
        } else if op.is_arithmetic() {
            self.type_arithmetic(op, left.ty, right.ty)
        } else if op.is_comparison() {
            self.type_comparison(op, left.ty, right.ty)
        } else {
            // conjunction
            if left.ty.is_bool() && right.ty.is_bool() {
                Ty::Bool
            } else {
                self.error("operands of && are not boolean formulas");
                Ty::Bad
            }
        };
        TypedExpr::new(
            ty,
            TypedExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    fn type_arithmetic(&mut self, op: BinOp, lt: Ty, rt: Ty) -> Ty {
        if op == BinOp::Sub && lt == Ty::Clock && rt == Ty::Clock {
            return Ty::ClockDiff;
        }
        match (lt.range(), rt.range()) {
            (Some(a), Some(b)) => {
                let (low, high) = match op {
                    BinOp::Add => infer::add_range(a, b),
                    BinOp::Sub => infer::sub_range(a, b),
                    BinOp::Mul => infer::mul_range(a, b),
                    BinOp::Div | BinOp::Mod => {
                        if b.0 <= 0 && 0 <= b.1 {
                            self.warning("possible division by zero");
                        }
                        if op == BinOp::Div {
                            infer::div_range(a, b)
                        } else {
                            infer::mod_range(a, b)
                        }
                    }
                    _ => unreachable!("arithmetic operator"),
                };
                Ty::Int { low, high }
            }
            _ => {
                if lt.is_clock_term() || rt.is_clock_term() {
                    self.error("ill-formed clock constraint");
                } else {
                    self.error(format!("operands of {} are not integers", op.token()));
                }
                Ty::Bad
            }
        }
    }

    fn type_comparison(&mut self, op: BinOp, lt: Ty, rt: Ty) -> Ty {
        if lt.is_int() && rt.is_int() {
            return Ty::Bool;
        }
        // clock constraint: x ≺ k or x - y ≺ k, with ≺ in {<,<=,==,>=,>}
        if lt.is_clock_term() && rt.is_int() {
            if op == BinOp::Ne {
                self.error("ill-formed clock constraint");
                return Ty::Bad;
            }
            return Ty::Bool;
        }
        if lt.is_clock_term() || rt.is_clock_term() {
            self.error("ill-formed clock constraint");
        } else {
            self.error(format!("operands of {} are not integers", op.token()));
        }
        Ty::Bad
    }

    fn check_statement(&mut self, stmt: &Statement) -> TypedStatement {
        match stmt {
            Statement::Nop => TypedStatement::new(StmtTy::Nop, TypedStatementKind::Nop),
            Statement::Assign { lhs, rhs } => {
                let lhs = self.check_expr(&lhs.as_expr());
                let rhs = self.check_expr(rhs);
                let ty = self.type_assign(&lhs, &rhs);
                TypedStatement::new(ty, TypedStatementKind::Assign { lhs, rhs })
            }
            Statement::Seq { first, second } => {
                let first = self.check_statement(first);
                let second = self.check_statement(second);
                let ty = if first.ty.is_bad() || second.ty.is_bad() {
                    StmtTy::Bad
                } else {
                    StmtTy::Seq
                };
                TypedStatement::new(
                    ty,
                    TypedStatementKind::Seq {
                        first: Box::new(first),
                        second: Box::new(second),
                    },
                )
            }
        }
    }

    fn type_assign(&mut self, lhs: &TypedExpr, rhs: &TypedExpr) -> StmtTy {
        if lhs.ty.is_bad() || rhs.ty.is_bad() {
            return StmtTy::Bad;
        }
        if infer::integer_assignable(lhs.ty, rhs.ty) {
            let from = rhs.ty.range().expect("integer rvalue");
            let into = lhs.ty.range().expect("integer lvalue");
            if !infer::range_contained(from, into) {
                self.warning("possible value loss");
            }
            return StmtTy::IntAssign;
        }
        if infer::clock_assignable(lhs.ty, rhs.ty) {
            let (rlo, _) = rhs.ty.range().expect("integer rvalue");
            if rlo < 0 {
                self.error("negative clock reset");
                return StmtTy::Bad;
            }
            return StmtTy::ClockAssign;
        }
        self.error("invalid assignment");
        StmtTy::Bad
    }
}
