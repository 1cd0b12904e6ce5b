use enumset::EnumSetType;

use crate::containers::StorageKey;

/// The kinds of variables the solver can reason about.
///
/// Boolean variables carry the clausal structure of the problem; the remaining kinds are
/// *semantic* variables whose values are chosen by the theory which owns the kind.
#[derive(EnumSetType, Debug, Hash, PartialOrd, Ord)]
pub enum VariableKind {
    Boolean,
    Rational,
}

impl StorageKey for VariableKind {
    fn index(&self) -> usize {
        *self as usize
    }

    fn create_from_index(index: usize) -> Self {
        match index {
            0 => VariableKind::Boolean,
            1 => VariableKind::Rational,
            _ => panic!("{index} is not a valid variable kind index"),
        }
    }
}

/// A tagged variable identifier: a [`VariableKind`] paired with an ordinal which is unique
/// *within* that kind.
///
/// Ordinals are dense small integers so that per-kind tables can simply index by
/// [`Variable::ordinal`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    ordinal: u32,
    kind: VariableKind,
}

impl Variable {
    pub fn new(kind: VariableKind, ordinal: u32) -> Variable {
        Variable { ordinal, kind }
    }

    /// Get the 0-based ordinal of this variable within its kind.
    pub fn ordinal(&self) -> usize {
        self.ordinal as usize
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            VariableKind::Boolean => write!(f, "b{}", self.ordinal),
            VariableKind::Rational => write!(f, "r{}", self.ordinal),
        }
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}
