//! The compiled model: per-location invariants and per-edge guards and
//! statements, type-checked and lowered to bytecode.

use crate::analysis::find_guarded_weakly_synchronized_edge;
use crate::system::{EdgeId, LocId, System};
use tempo_types::{
    typecheck_formula, typecheck_statement, Log, TypedExpr, TypedStatement, VarEnv,
};
use tempo_vm::{compile_expr, compile_statement, Op};
use thiserror::Error;
use tracing::debug;

/// A fatal model construction error. Per-attribute problems are reported to
/// the [`Log`] instead and surface as [`ModelError::CompilationFailure`]
/// after the pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Weakly synchronized event shall not be guarded (edge {edge})")]
    GuardedWeaklySynchronizedEvent { edge: EdgeId },

    #[error("System compilation failure")]
    CompilationFailure,
}

/// A system graph bound to the typed ASTs and bytecode of its attributes.
///
/// Construction is transactional: static analysis first, then one
/// typecheck-and-compile pass over every attribute collecting all
/// diagnostics, then a single success-or-failure decision. A constructed
/// model is immutable and freely shareable across readers.
pub struct Model<S> {
    system: S,
    env: VarEnv,
    invariant_asts: Vec<TypedExpr>,
    invariant_bytecode: Vec<Vec<Op>>,
    guard_asts: Vec<TypedExpr>,
    guard_bytecode: Vec<Vec<Op>>,
    statement_asts: Vec<TypedStatement>,
    statement_bytecode: Vec<Vec<Op>>,
}

impl<S: System> Model<S> {
    /// Build the model for `system` over the variables of `env`.
    ///
    /// All warnings and errors are reported to `log`; any error fails the
    /// construction and the partial model is discarded.
    pub fn new(system: S, env: VarEnv, log: &mut Log) -> Result<Self, ModelError> {
        if let Some(edge) = find_guarded_weakly_synchronized_edge(&system) {
            return Err(ModelError::GuardedWeaklySynchronizedEvent { edge });
        }

        let baseline = log.error_count();
        let compiled = compile_system(&system, &env, log);
        if log.error_count() > baseline {
            return Err(ModelError::CompilationFailure);
        }

        Ok(Self::assemble(system, env, compiled))
    }

    fn assemble(system: S, env: VarEnv, compiled: Compiled) -> Self {
        Self {
            system,
            env,
            invariant_asts: compiled.invariant_asts,
            invariant_bytecode: compiled.invariant_bytecode,
            guard_asts: compiled.guard_asts,
            guard_bytecode: compiled.guard_bytecode,
            statement_asts: compiled.statement_asts,
            statement_bytecode: compiled.statement_bytecode,
        }
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn env(&self) -> &VarEnv {
        &self.env
    }

    /// Type-checked invariant of a location.
    pub fn invariant_ast(&self, loc: LocId) -> &TypedExpr {
        &self.invariant_asts[loc]
    }

    /// Bytecode of a location's invariant.
    pub fn invariant_bytecode(&self, loc: LocId) -> &[Op] {
        &self.invariant_bytecode[loc]
    }

    /// Type-checked guard of an edge.
    pub fn guard_ast(&self, edge: EdgeId) -> &TypedExpr {
        &self.guard_asts[edge]
    }

    /// Bytecode of an edge's guard.
    pub fn guard_bytecode(&self, edge: EdgeId) -> &[Op] {
        &self.guard_bytecode[edge]
    }

    /// Type-checked statement of an edge.
    pub fn statement_ast(&self, edge: EdgeId) -> &TypedStatement {
        &self.statement_asts[edge]
    }

    /// Bytecode of an edge's statement.
    pub fn statement_bytecode(&self, edge: EdgeId) -> &[Op] {
        &self.statement_bytecode[edge]
    }
}

impl<S: System + Clone> Clone for Model<S> {
    /// A fresh compilation against the cloned system: the copy shares no
    /// buffers with the source. The source compiled cleanly, so this one
    /// does too.
    fn clone(&self) -> Self {
        let mut log = Log::new();
        let compiled = compile_system(&self.system, &self.env, &mut log);
        debug_assert_eq!(log.error_count(), 0);
        Self::assemble(self.system.clone(), self.env.clone(), compiled)
    }
}

struct Compiled {
    invariant_asts: Vec<TypedExpr>,
    invariant_bytecode: Vec<Vec<Op>>,
    guard_asts: Vec<TypedExpr>,
    guard_bytecode: Vec<Vec<Op>>,
    statement_asts: Vec<TypedStatement>,
    statement_bytecode: Vec<Vec<Op>>,
}

/// One pass over every attribute. Failures inside an attribute are reported
/// under its context string and tallied in `log`; they never abort the
/// pass.
fn compile_system<S: System>(system: &S, env: &VarEnv, log: &mut Log) -> Compiled {
    debug!(
        locations = system.locations_count(),
        edges = system.edges_count(),
        "compiling system attributes"
    );

    let mut compiled = Compiled {
        invariant_asts: Vec::with_capacity(system.locations_count()),
        invariant_bytecode: Vec::with_capacity(system.locations_count()),
        guard_asts: Vec::with_capacity(system.edges_count()),
        guard_bytecode: Vec::with_capacity(system.edges_count()),
        statement_asts: Vec::with_capacity(system.edges_count()),
        statement_bytecode: Vec::with_capacity(system.edges_count()),
    };

    for loc in system.locations() {
        let expr = system.invariant(loc);
        let context = format!("Attribute invariant: {expr}");
        let typed = typecheck_formula(expr, env, log, &context);
        let bytecode = lower_expr(&typed, &context, log);
        compiled.invariant_asts.push(typed);
        compiled.invariant_bytecode.push(bytecode);
    }

    for edge in system.edges() {
        let expr = system.guard(edge);
        let context = format!("Attribute provided: {expr}");
        let typed = typecheck_formula(expr, env, log, &context);
        let bytecode = lower_expr(&typed, &context, log);
        compiled.guard_asts.push(typed);
        compiled.guard_bytecode.push(bytecode);
    }

    for edge in system.edges() {
        let stmt = system.statement(edge);
        let context = format!("Attribute do: {stmt}");
        let typed = typecheck_statement(stmt, env, log, &context);
        let bytecode = if typed.ty.is_bad() {
            Vec::new()
        } else {
            match compile_statement(&typed) {
                Ok(bytecode) => bytecode,
                Err(e) => {
                    log.error(&context, e.to_string());
                    Vec::new()
                }
            }
        };
        compiled.statement_asts.push(typed);
        compiled.statement_bytecode.push(bytecode);
    }

    compiled
}

/// No bytecode for a subtree that failed typing; its diagnostics are
/// already in the log.
fn lower_expr(typed: &TypedExpr, context: &str, log: &mut Log) -> Vec<Op> {
    if typed.ty.is_bad() {
        return Vec::new();
    }
    match compile_expr(typed) {
        Ok(bytecode) => bytecode,
        Err(e) => {
            log.error(context, e.to_string());
            Vec::new()
        }
    }
}
