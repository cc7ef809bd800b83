//! Typed-AST to bytecode compiler.
//!
//! Purely recursive over the typed tree, appending to a growing buffer.
//! Expressions leave exactly one value on the stack; clocks never appear as
//! bare stack values, they are folded into `CLKCONSTR` and `CLKRESET` forms.
//! Every fragment ends with exactly one `RET`.

use crate::op::{Op, Rel};
use tempo_syntax::{BinOp, UnaryOp};
use tempo_types::{
    StmtTy, TypedExpr, TypedExprKind, TypedStatement, TypedStatementKind, ZERO_CLOCK_ID,
};
use thiserror::Error;

/// A compilation failure.
///
/// `BadSubtree` and the non-constant constraint forms are per-attribute
/// errors the model reports through its log; `UnexpectedShape` on a
/// well-typed tree means the checker and the compiler disagree and is a bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("cannot compile ill-typed subtree {0}")]
    BadSubtree(String),

    #[error("unexpected typed expression shape {0}")]
    UnexpectedShape(String),

    #[error("clock constraint bound {0} is not constant")]
    NonConstantBound(String),

    #[error("clock subscript {0} in constraint is not constant")]
    NonConstantClockSubscript(String),
}

/// Compile a guard or invariant.
pub fn compile_expr(expr: &TypedExpr) -> Result<Vec<Op>, CompileError> {
    if expr.ty.is_bad() {
        return Err(CompileError::BadSubtree(expr.to_string()));
    }
    let mut compiler = Compiler::new();
    compiler.rvalue(expr)?;
    compiler.emit(Op::Ret);
    Ok(compiler.ops)
}

/// Compile an edge statement.
pub fn compile_statement(stmt: &TypedStatement) -> Result<Vec<Op>, CompileError> {
    if stmt.ty.is_bad() {
        return Err(CompileError::BadSubtree(stmt.to_string()));
    }
    let mut compiler = Compiler::new();
    compiler.statement(stmt)?;
    compiler.emit(Op::Ret);
    Ok(compiler.ops)
}

struct Compiler {
    ops: Vec<Op>,
}

impl Compiler {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    fn emit(&mut self, op: Op) -> usize {
        let pc = self.ops.len();
        self.ops.push(op);
        pc
    }

    fn current_pc(&self) -> u32 {
        self.ops.len() as u32
    }

    fn patch_jump(&mut self, at: usize, target: u32) {
        if let Op::Jz(t) = &mut self.ops[at] {
            *t = target;
        }
    }

    /// Compile an expression to a single stack value.
    fn rvalue(&mut self, expr: &TypedExpr) -> Result<(), CompileError> {
        if expr.ty.is_clock_term() {
            // clocks are only legal inside constraints and resets
            return Err(CompileError::UnexpectedShape(expr.to_string()));
        }
        match &expr.kind {
            TypedExprKind::Bool(b) => {
                self.emit(Op::Push(i64::from(*b)));
            }
            TypedExprKind::Int(n) => {
                self.emit(Op::Push(*n));
            }
            TypedExprKind::IntVar { id, .. } => {
                self.emit(Op::Load(*id));
            }
            TypedExprKind::IntElem {
                base, dim, index, ..
            } => {
                self.rvalue(index)?;
                self.emit(Op::Index {
                    lo: 0,
                    hi: i64::from(*dim) - 1,
                });
                self.emit(Op::LoadIdx(*base));
            }
            TypedExprKind::Unary { op, operand } => {
                self.rvalue(operand)?;
                self.emit(match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                });
            }
            TypedExprKind::Binary { op, left, right } => match op {
                BinOp::And => {
                    self.rvalue(left)?;
                    let jump = self.emit(Op::Jz(0));
                    self.emit(Op::Pop);
                    self.rvalue(right)?;
                    let end = self.current_pc();
                    self.patch_jump(jump, end);
                }
                op if op.is_comparison() => {
                    if left.ty.is_clock_term() {
                        self.clock_constraint(*op, left, right)?;
                    } else {
                        self.rvalue(left)?;
                        self.rvalue(right)?;
                        self.emit(comparison_op(*op));
                    }
                }
                op => {
                    self.rvalue(left)?;
                    self.rvalue(right)?;
                    self.emit(arithmetic_op(*op, expr)?);
                }
            },
            TypedExprKind::Name(_) | TypedExprKind::Elem { .. } | TypedExprKind::Clock { .. }
            | TypedExprKind::ClockElem { .. } => {
                return Err(CompileError::UnexpectedShape(expr.to_string()));
            }
        }
        Ok(())
    }

    /// Emit `x - y rel k` as one instruction; `y` is the zero clock for the
    /// unary form. Operands resolve to flat indices at compile time.
    fn clock_constraint(
        &mut self,
        op: BinOp,
        left: &TypedExpr,
        right: &TypedExpr,
    ) -> Result<(), CompileError> {
        let rel = match op {
            BinOp::Lt => Rel::Lt,
            BinOp::Le => Rel::Le,
            BinOp::Eq => Rel::Eq,
            BinOp::Ge => Rel::Ge,
            BinOp::Gt => Rel::Gt,
            _ => return Err(CompileError::UnexpectedShape(left.to_string())),
        };
        let (x, y) = match &left.kind {
            TypedExprKind::Binary {
                op: BinOp::Sub,
                left: first,
                right: second,
            } => (clock_index(first)?, clock_index(second)?),
            _ => (clock_index(left)?, ZERO_CLOCK_ID),
        };
        let k = const_int(right).ok_or_else(|| CompileError::NonConstantBound(right.to_string()))?;
        self.emit(Op::ClkConstr { x, y, rel, k });
        Ok(())
    }

    fn statement(&mut self, stmt: &TypedStatement) -> Result<(), CompileError> {
        if stmt.ty.is_bad() {
            return Err(CompileError::BadSubtree(stmt.to_string()));
        }
        match &stmt.kind {
            TypedStatementKind::Nop => {}
            TypedStatementKind::Assign { lhs, rhs } => match stmt.ty {
                StmtTy::IntAssign => self.int_assign(lhs, rhs)?,
                StmtTy::ClockAssign => self.clock_reset(lhs, rhs)?,
                _ => return Err(CompileError::UnexpectedShape(stmt.to_string())),
            },
            TypedStatementKind::Seq { first, second } => {
                self.statement(first)?;
                self.statement(second)?;
            }
        }
        Ok(())
    }

    /// `lhs = rhs`: value first, then the address computation, then the
    /// store.
    fn int_assign(&mut self, lhs: &TypedExpr, rhs: &TypedExpr) -> Result<(), CompileError> {
        self.rvalue(rhs)?;
        match &lhs.kind {
            TypedExprKind::IntVar { id, .. } => {
                self.emit(Op::Store(*id));
            }
            TypedExprKind::IntElem {
                base, dim, index, ..
            } => {
                self.rvalue(index)?;
                self.emit(Op::Index {
                    lo: 0,
                    hi: i64::from(*dim) - 1,
                });
                self.emit(Op::StoreIdx(*base));
            }
            _ => return Err(CompileError::UnexpectedShape(lhs.to_string())),
        }
        Ok(())
    }

    /// `clock = rhs` with a non-negative integer `rhs`.
    fn clock_reset(&mut self, lhs: &TypedExpr, rhs: &TypedExpr) -> Result<(), CompileError> {
        self.rvalue(rhs)?;
        match &lhs.kind {
            TypedExprKind::Clock { id, .. } => {
                self.emit(Op::ClkReset(*id));
            }
            TypedExprKind::ClockElem {
                base, dim, index, ..
            } => {
                self.rvalue(index)?;
                self.emit(Op::Index {
                    lo: 0,
                    hi: i64::from(*dim) - 1,
                });
                self.emit(Op::ClkResetIdx(*base));
            }
            _ => return Err(CompileError::UnexpectedShape(lhs.to_string())),
        }
        Ok(())
    }
}

/// Flat index of a clock operand of a constraint.
fn clock_index(expr: &TypedExpr) -> Result<u16, CompileError> {
    match &expr.kind {
        TypedExprKind::Clock { id, .. } => Ok(*id),
        TypedExprKind::ClockElem {
            base, dim, index, ..
        } => {
            let offset = const_int(index)
                .ok_or_else(|| CompileError::NonConstantClockSubscript(index.to_string()))?;
            if offset < 0 || offset >= i64::from(*dim) {
                return Err(CompileError::UnexpectedShape(expr.to_string()));
            }
            Ok(*base + offset as u16)
        }
        _ => Err(CompileError::UnexpectedShape(expr.to_string())),
    }
}

fn comparison_op(op: BinOp) -> Op {
    match op {
        BinOp::Lt => Op::Lt,
        BinOp::Le => Op::Le,
        BinOp::Eq => Op::Eq,
        BinOp::Ne => Op::Ne,
        BinOp::Ge => Op::Ge,
        BinOp::Gt => Op::Gt,
        _ => unreachable!("comparison operator"),
    }
}

fn arithmetic_op(op: BinOp, expr: &TypedExpr) -> Result<Op, CompileError> {
    match op {
        BinOp::Add => Ok(Op::Add),
        BinOp::Sub => Ok(Op::Sub),
        BinOp::Mul => Ok(Op::Mul),
        BinOp::Div => Ok(Op::Div),
        BinOp::Mod => Ok(Op::Mod),
        _ => Err(CompileError::UnexpectedShape(expr.to_string())),
    }
}

/// Statically known value of an integer expression: a literal, or any
/// expression whose inferred range is a single point.
fn const_int(expr: &TypedExpr) -> Option<i64> {
    if let TypedExprKind::Int(n) = &expr.kind {
        return Some(*n);
    }
    match expr.ty.range() {
        Some((low, high)) if low == high => Some(low),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_syntax::{Expr, Lvalue, Statement};
    use tempo_types::{typecheck_formula, typecheck_statement, Log, VarEnv};

    fn env() -> VarEnv {
        let mut env = VarEnv::new();
        env.declare_int("x", 1, 0, 10).unwrap();
        env.declare_int("y", 1, 0, 10).unwrap();
        env.declare_int("t", 4, 0, 3).unwrap();
        env.declare_int("i", 1, 0, 3).unwrap();
        env.declare_clock("c", 1).unwrap();
        env.declare_clock("d", 1).unwrap();
        env.declare_clock("cs", 3).unwrap();
        env
    }

    fn compile_guard(expr: &Expr) -> Vec<Op> {
        let mut log = Log::new();
        let typed = typecheck_formula(expr, &env(), &mut log, "test");
        assert_eq!(log.error_count(), 0, "guard should typecheck");
        compile_expr(&typed).expect("guard should compile")
    }

    fn compile_stmt(stmt: &Statement) -> Vec<Op> {
        let mut log = Log::new();
        let typed = typecheck_statement(stmt, &env(), &mut log, "test");
        assert_eq!(log.error_count(), 0, "statement should typecheck");
        compile_statement(&typed).expect("statement should compile")
    }

    #[test]
    fn test_integer_guard() {
        let bc = compile_guard(&Expr::binary(BinOp::Lt, Expr::var("x"), Expr::Int(5)));
        assert_eq!(bc, vec![Op::Load(0), Op::Push(5), Op::Lt, Op::Ret]);
    }

    #[test]
    fn test_unary_clock_constraint() {
        let bc = compile_guard(&Expr::binary(BinOp::Le, Expr::var("c"), Expr::Int(3)));
        assert_eq!(
            bc,
            vec![
                Op::ClkConstr {
                    x: 1,
                    y: ZERO_CLOCK_ID,
                    rel: Rel::Le,
                    k: 3
                },
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_diagonal_clock_constraint() {
        let bc = compile_guard(&Expr::binary(
            BinOp::Lt,
            Expr::binary(BinOp::Sub, Expr::var("c"), Expr::var("d")),
            Expr::Int(7),
        ));
        assert_eq!(
            bc,
            vec![
                Op::ClkConstr {
                    x: 1,
                    y: 2,
                    rel: Rel::Lt,
                    k: 7
                },
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_relation_is_not_normalized() {
        let bc = compile_guard(&Expr::binary(BinOp::Ge, Expr::var("c"), Expr::Int(2)));
        assert_eq!(
            bc,
            vec![
                Op::ClkConstr {
                    x: 1,
                    y: ZERO_CLOCK_ID,
                    rel: Rel::Ge,
                    k: 2
                },
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_clock_array_element_resolves_statically() {
        let bc = compile_guard(&Expr::binary(
            BinOp::Lt,
            Expr::index("cs", Expr::Int(2)),
            Expr::Int(9),
        ));
        // cs occupies clock slots 3..6
        assert_eq!(
            bc,
            vec![
                Op::ClkConstr {
                    x: 5,
                    y: ZERO_CLOCK_ID,
                    rel: Rel::Lt,
                    k: 9
                },
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_scalar_assignment() {
        let bc = compile_stmt(&Statement::assign(Lvalue::var("x"), Expr::var("y")));
        assert_eq!(bc, vec![Op::Load(1), Op::Store(0), Op::Ret]);
    }

    #[test]
    fn test_array_store_checks_offset() {
        let bc = compile_stmt(&Statement::assign(
            Lvalue::index("t", Expr::Int(2)),
            Expr::Int(1),
        ));
        assert_eq!(
            bc,
            vec![
                Op::Push(1),
                Op::Push(2),
                Op::Index { lo: 0, hi: 3 },
                Op::StoreIdx(2),
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_array_load_checks_offset() {
        // i ranges over [0,3], exactly the subscripts of t
        let bc = compile_guard(&Expr::binary(
            BinOp::Lt,
            Expr::index("t", Expr::var("i")),
            Expr::Int(3),
        ));
        assert_eq!(
            bc,
            vec![
                Op::Load(6),
                Op::Index { lo: 0, hi: 3 },
                Op::LoadIdx(2),
                Op::Push(3),
                Op::Lt,
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_clock_reset() {
        let bc = compile_stmt(&Statement::assign(Lvalue::var("c"), Expr::Int(0)));
        assert_eq!(bc, vec![Op::Push(0), Op::ClkReset(1), Op::Ret]);
    }

    #[test]
    fn test_nop_compiles_to_bare_ret() {
        let bc = compile_stmt(&Statement::Nop);
        assert_eq!(bc, vec![Op::Ret]);
    }

    #[test]
    fn test_sequence_single_terminator() {
        let bc = compile_stmt(&Statement::seq(
            Statement::assign(Lvalue::var("x"), Expr::Int(1)),
            Statement::assign(Lvalue::var("y"), Expr::Int(2)),
        ));
        assert_eq!(
            bc,
            vec![
                Op::Push(1),
                Op::Store(0),
                Op::Push(2),
                Op::Store(1),
                Op::Ret
            ]
        );
        assert_eq!(bc.iter().filter(|op| **op == Op::Ret).count(), 1);
    }

    #[test]
    fn test_conjunction_short_circuits() {
        let bc = compile_guard(&Expr::binary(
            BinOp::And,
            Expr::binary(BinOp::Lt, Expr::var("x"), Expr::Int(5)),
            Expr::binary(BinOp::Le, Expr::var("c"), Expr::Int(3)),
        ));
        assert_eq!(
            bc,
            vec![
                Op::Load(0),
                Op::Push(5),
                Op::Lt,
                Op::Jz(6),
                Op::Pop,
                Op::ClkConstr {
                    x: 1,
                    y: ZERO_CLOCK_ID,
                    rel: Rel::Le,
                    k: 3
                },
                Op::Ret
            ]
        );
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let guard = Expr::binary(
            BinOp::And,
            Expr::binary(BinOp::Lt, Expr::var("x"), Expr::Int(5)),
            Expr::binary(
                BinOp::Lt,
                Expr::binary(BinOp::Sub, Expr::var("c"), Expr::var("d")),
                Expr::Int(7),
            ),
        );
        let mut log = Log::new();
        let typed = typecheck_formula(&guard, &env(), &mut log, "test");
        let first = compile_expr(&typed).unwrap();
        let second = compile_expr(&typed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bad_tree_is_rejected() {
        let mut log = Log::new();
        let typed = typecheck_formula(
            &Expr::binary(BinOp::Lt, Expr::var("missing"), Expr::Int(5)),
            &env(),
            &mut log,
            "test",
        );
        assert!(matches!(
            compile_expr(&typed),
            Err(CompileError::BadSubtree(_))
        ));
    }

    #[test]
    fn test_non_constant_bound_is_rejected() {
        let mut log = Log::new();
        let typed = typecheck_formula(
            &Expr::binary(BinOp::Le, Expr::var("c"), Expr::var("x")),
            &env(),
            &mut log,
            "test",
        );
        assert_eq!(log.error_count(), 0);
        assert!(matches!(
            compile_expr(&typed),
            Err(CompileError::NonConstantBound(_))
        ));
    }

    #[test]
    fn test_constant_range_bound_is_accepted() {
        // x - x has the singleton range [0,0] and folds to a constant bound
        let mut env = env();
        env.declare_int("one", 1, 1, 1).unwrap();
        let mut log = Log::new();
        let typed = typecheck_formula(
            &Expr::binary(BinOp::Lt, Expr::var("c"), Expr::var("one")),
            &env,
            &mut log,
            "test",
        );
        let bc = compile_expr(&typed).unwrap();
        assert_eq!(
            bc,
            vec![
                Op::ClkConstr {
                    x: 1,
                    y: ZERO_CLOCK_ID,
                    rel: Rel::Lt,
                    k: 1
                },
                Op::Ret
            ]
        );
    }
}
