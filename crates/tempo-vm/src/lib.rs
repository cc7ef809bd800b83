//! Bytecode for the Tempo stack VM.
//!
//! Typed attribute trees compile to flat instruction streams evaluated on
//! every transition during state-space exploration. Compilation is
//! deterministic: the same typed tree always yields the same stream.

pub mod compile;
pub mod op;

pub use compile::{compile_expr, compile_statement, CompileError};
pub use op::{disassemble, Op, Rel};
