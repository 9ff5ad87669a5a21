//! The 0-CFA abstract-value domain (spec.md §3): small, `Copy`, hashable —
//! a label is just a `u32`, and the whole analysis keys its sets and maps on
//! this enum directly rather than on any heavier representation.

use hashbrown::HashSet;

pub type Label = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbstractValue {
    /// A value directly or transitively derived from `sample`.
    Stoch,
    /// The closure of a lambda, identified by its own label, its body's
    /// label, and its bound parameter's var-label. Equality is structural
    /// over the three labels (spec.md §9).
    Fun { l_outer: Label, l_inner: Label, l_var: Label },
    /// The fixpoint combinator, as a flowing value.
    Fix,
}

pub type ValueSet = HashSet<AbstractValue>;
