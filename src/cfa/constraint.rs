//! The 0-CFA constraint language (spec.md §3).

use super::value::{AbstractValue, Label};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// `av ∈ data[p]` unconditionally.
    Dir(AbstractValue, Label),
    /// `data[p1] ⊆ data[p2]`.
    Sub(Label, Label),
    /// `if av ∈ data[p] then data[p1] ⊆ data[p2]`.
    Impl(AbstractValue, Label, Label, Label),
}
