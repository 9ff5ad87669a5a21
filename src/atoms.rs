//! The two fixed atom tables (spec.md §3): pre-CPS atoms (distribution
//! constructors, `infer`, `prob`) and post-CPS atoms (`sample`, `weight`,
//! whose continuation is carried as an ordinary argument instead of being
//! introduced by the CPS pass).

use crate::errors::{CoreErr, CoreResult};
use crate::term::{mk_const, Constant, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomId {
    Normal,
    Uniform,
    Gamma,
    Exponential,
    Bernoulli,
    Infer,
    Prob,
    Sample,
    Weight,
}

pub const PRE_CPS_ATOMS: &[AtomId] = &[
    AtomId::Normal,
    AtomId::Uniform,
    AtomId::Gamma,
    AtomId::Exponential,
    AtomId::Bernoulli,
    AtomId::Infer,
    AtomId::Prob,
];

pub const POST_CPS_ATOMS: &[AtomId] = &[AtomId::Sample, AtomId::Weight];

impl AtomId {
    pub fn name(self) -> &'static str {
        match self {
            AtomId::Normal => "normal",
            AtomId::Uniform => "uniform",
            AtomId::Gamma => "gamma",
            AtomId::Exponential => "exponential",
            AtomId::Bernoulli => "bernoulli",
            AtomId::Infer => "infer",
            AtomId::Prob => "prob",
            AtomId::Sample => "sample",
            AtomId::Weight => "weight",
        }
    }

    /// `maxArity(id)` (spec.md §3). `sample`/`weight` already count their
    /// continuation argument, since they are never CPS-wrapped (§4.5).
    pub fn max_arity(self) -> usize {
        match self {
            AtomId::Normal => 2,
            AtomId::Uniform => 2,
            AtomId::Gamma => 2,
            AtomId::Exponential => 1,
            AtomId::Bernoulli => 1,
            AtomId::Infer => 1,
            AtomId::Prob => 2,
            AtomId::Sample => 2,
            AtomId::Weight => 2,
        }
    }

    pub fn by_name(name: &str) -> Option<AtomId> {
        PRE_CPS_ATOMS
            .iter()
            .chain(POST_CPS_ATOMS.iter())
            .copied()
            .find(|id| id.name() == name)
    }
}

/// Builds a fully unapplied `Const(CAtom(id, []))` term for the atom named
/// `name` (spec.md §7's "arity/shape mismatch: asking for the arity of an
/// unknown atom"). This is the one name-based entry point into the atom
/// tables; every other constructor in this crate already holds a resolved
/// `AtomId` and goes through `Atom::new` directly.
pub fn atom_term(name: &'static str) -> CoreResult<Term> {
    AtomId::by_name(name)
        .map(|id| mk_const(Constant::Atom(Atom::new(id))))
        .ok_or(CoreErr::UnknownAtom(name))
}

/// `CAtom(id, argsRev)` (spec.md §3): a partially applied atom, tracking
/// already-supplied arguments in reverse application order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub id: AtomId,
    pub args_rev: Vec<Term>,
}

impl Atom {
    pub fn new(id: AtomId) -> Self {
        Atom { id, args_rev: Vec::new() }
    }

    /// `arity(CAtom(id,args)) = maxArity(id) - |args|` (spec.md §3).
    pub fn arity(&self) -> usize {
        self.id.max_arity() - self.args_rev.len()
    }

    pub fn is_saturated(&self) -> bool {
        self.arity() == 0
    }

    pub fn apply(&self, arg: Term) -> Atom {
        let mut args_rev = self.args_rev.clone();
        args_rev.push(arg);
        Atom { id: self.id, args_rev }
    }
}

#[cfg(test)]
mod atom_tests {
    use super::*;

    #[test]
    fn arity_decreases_with_each_application() {
        let a = Atom::new(AtomId::Normal);
        assert_eq!(a.arity(), 2);
        let a = a.apply(crate::term::mk_const(crate::term::Constant::float(0.0)));
        assert_eq!(a.arity(), 1);
        assert!(!a.is_saturated());
    }

    #[test]
    fn by_name_finds_both_tables() {
        assert_eq!(AtomId::by_name("normal"), Some(AtomId::Normal));
        assert_eq!(AtomId::by_name("sample"), Some(AtomId::Sample));
        assert_eq!(AtomId::by_name("nope"), None);
    }

    #[test]
    fn atom_term_builds_an_unapplied_atom_constant() {
        let t = atom_term("bernoulli").unwrap();
        match t.as_const().unwrap() {
            Constant::Atom(a) => {
                assert_eq!(a.id, AtomId::Bernoulli);
                assert_eq!(a.arity(), 1);
            }
            owise => panic!("expected a Const(Atom(..)), got {:?}", owise),
        }
    }

    #[test]
    fn atom_term_rejects_unknown_names() {
        let err = atom_term("nope").unwrap_err();
        assert_eq!(err, CoreErr::UnknownAtom("nope"));
    }
}
