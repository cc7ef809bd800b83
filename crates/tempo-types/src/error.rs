//! Environment construction errors.

use thiserror::Error;

/// An error raised while declaring variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("duplicate variable: {name}")]
    Duplicate { name: String },

    #[error("variable {name} has dimension 0")]
    ZeroDimension { name: String },

    #[error("variable {name} has empty range [{low},{high}]")]
    EmptyRange { name: String, low: i64, high: i64 },
}
