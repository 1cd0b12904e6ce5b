//! Contains containers which are used by the solver.
mod keyed_vec;

pub use keyed_vec::KeyedVec;
pub use keyed_vec::StorageKey;

use crate::basic_types::Literal;

/// A map from [`Literal`]s to values of type `Value`, used for watch lists and literal marks.
pub type LiteralMap<Value> = KeyedVec<Literal, Value>;
