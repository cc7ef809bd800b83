//! Variable environment: bounded integer variables and clocks.
//!
//! The environment is built once by the caller and read-only afterwards.
//! Variables live in two disjoint lists; names are unique across both. Each
//! declaration occupies `dim` consecutive slots of its kind's flat layout, so
//! an array element `a[k]` resolves to flat index `base + k`.

use crate::error::EnvError;
use std::collections::HashMap;

/// Flat index of the implicit zero clock used in unary constraints
/// `x - zero ≺ k`. User clocks are numbered from 1.
pub const ZERO_CLOCK_ID: u16 = 0;

/// Spelling of the zero clock in diagnostics.
pub const ZERO_CLOCK_NAME: &str = "0";

/// A declared integer variable (scalar when `dim == 1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVarDecl {
    pub name: String,
    /// Flat index of the first element.
    pub id: u16,
    /// Number of elements; 1 for a scalar.
    pub dim: u16,
    /// Declared value range, inclusive.
    pub low: i64,
    pub high: i64,
}

/// A declared clock (scalar when `dim == 1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDecl {
    pub name: String,
    /// Flat index of the first element.
    pub id: u16,
    /// Number of elements; 1 for a scalar.
    pub dim: u16,
}

/// Result of a name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<'a> {
    Int(&'a IntVarDecl),
    Clock(&'a ClockDecl),
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Int(usize),
    Clock(usize),
}

/// Immutable map of names to integer variables and clocks.
#[derive(Debug, Clone, Default)]
pub struct VarEnv {
    intvars: Vec<IntVarDecl>,
    clocks: Vec<ClockDecl>,
    by_name: HashMap<String, Slot>,
    int_layout: u16,
    clock_layout: u16,
}

impl VarEnv {
    pub fn new() -> Self {
        Self {
            intvars: Vec::new(),
            clocks: Vec::new(),
            by_name: HashMap::new(),
            int_layout: 0,
            // slot 0 is the zero clock
            clock_layout: 1,
        }
    }

    /// Declare an integer variable (array when `dim > 1`) with inclusive
    /// value range `[low, high]`. Returns its flat base index.
    pub fn declare_int(
        &mut self,
        name: impl Into<String>,
        dim: u16,
        low: i64,
        high: i64,
    ) -> Result<u16, EnvError> {
        let name = name.into();
        self.check_fresh(&name)?;
        if dim == 0 {
            return Err(EnvError::ZeroDimension { name });
        }
        if low > high {
            return Err(EnvError::EmptyRange { name, low, high });
        }
        let id = self.int_layout;
        self.by_name.insert(name.clone(), Slot::Int(self.intvars.len()));
        self.intvars.push(IntVarDecl {
            name,
            id,
            dim,
            low,
            high,
        });
        self.int_layout += dim;
        Ok(id)
    }

    /// Declare a clock (array when `dim > 1`). Returns its flat base index.
    pub fn declare_clock(&mut self, name: impl Into<String>, dim: u16) -> Result<u16, EnvError> {
        let name = name.into();
        self.check_fresh(&name)?;
        if dim == 0 {
            return Err(EnvError::ZeroDimension { name });
        }
        let id = self.clock_layout;
        self.by_name.insert(name.clone(), Slot::Clock(self.clocks.len()));
        self.clocks.push(ClockDecl { name, id, dim });
        self.clock_layout += dim;
        Ok(id)
    }

    fn check_fresh(&self, name: &str) -> Result<(), EnvError> {
        if name == ZERO_CLOCK_NAME || self.by_name.contains_key(name) {
            return Err(EnvError::Duplicate {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Look a name up in either list.
    pub fn lookup(&self, name: &str) -> Option<Binding<'_>> {
        match self.by_name.get(name)? {
            Slot::Int(i) => Some(Binding::Int(&self.intvars[*i])),
            Slot::Clock(i) => Some(Binding::Clock(&self.clocks[*i])),
        }
    }

    pub fn intvars(&self) -> &[IntVarDecl] {
        &self.intvars
    }

    pub fn clocks(&self) -> &[ClockDecl] {
        &self.clocks
    }

    /// Width of the flat integer valuation.
    pub fn int_layout_size(&self) -> u16 {
        self.int_layout
    }

    /// Width of the flat clock valuation, zero clock included.
    pub fn clock_layout_size(&self) -> u16 {
        self.clock_layout
    }
}
