//! Assembly of the ordered builtin table (spec.md §6, SPEC_FULL.md §4.6):
//! user builtins first, then the pre-CPS PPL atoms (CPS-wrapped, then
//! de-Bruijn-indexed), then the post-CPS PPL atoms (stored raw, then
//! de-Bruijn-indexed). This order is reused unchanged for label assignment
//! (`label::label`) and is expected, downstream, to line up with the
//! evaluator's environment layout.

use indexmap::IndexMap;

use crate::atoms::{Atom, POST_CPS_ATOMS, PRE_CPS_ATOMS};
use crate::cps::cps_atomic;
use crate::debruijn;
use crate::errors::CoreResult;
use crate::name::Name;
use crate::term::{mk_const, Constant, Term};

/// The assembled, order-preserving builtin table. `names()`/`terms()` hand
/// back parallel sequences in table order, the shape `label::label` and a
/// downstream evaluator environment both consume.
#[derive(Debug, Clone)]
pub struct BuiltinTable {
    entries: IndexMap<Name, Term>,
}

impl BuiltinTable {
    /// Builds the table from a caller-supplied list of user builtins (named
    /// terms defined outside this language core, e.g. library functions),
    /// followed by the two fixed PPL atom tables in the order spec.md §6
    /// requires.
    pub fn build(user_builtins: Vec<(Name, Term)>) -> CoreResult<BuiltinTable> {
        let mut entries = IndexMap::new();
        for (name, term) in user_builtins {
            entries.insert(name, term);
        }

        for id in PRE_CPS_ATOMS {
            let raw = mk_const(Constant::Atom(Atom::new(*id)));
            let wrapped = cps_atomic(&raw)?;
            let free_env: Vec<Name> = entries.keys().cloned().collect();
            let indexed = debruijn::index(&free_env, &wrapped)?;
            entries.insert(Name::new(id.name()), indexed);
        }

        for id in POST_CPS_ATOMS {
            let raw = mk_const(Constant::Atom(Atom::new(*id)));
            let free_env: Vec<Name> = entries.keys().cloned().collect();
            let indexed = debruijn::index(&free_env, &raw)?;
            entries.insert(Name::new(id.name()), indexed);
        }

        Ok(BuiltinTable { entries })
    }

    pub fn names(&self) -> Vec<Name> {
        self.entries.keys().cloned().collect()
    }

    pub fn terms(&self) -> Vec<Term> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &Name) -> Option<&Term> {
        self.entries.get(name)
    }
}

#[cfg(test)]
mod builtins_tests {
    use super::*;

    #[test]
    fn order_is_user_then_pre_cps_then_post_cps() {
        let user = vec![(Name::new("myFn"), mk_const(Constant::Int(0)))];
        let table = BuiltinTable::build(user).unwrap();
        let names = table.names();
        assert_eq!(names[0], Name::new("myFn"));
        // pre-CPS atoms precede post-CPS atoms, both after user builtins.
        let sample_pos = names.iter().position(|n| n == &Name::new("sample")).unwrap();
        let normal_pos = names.iter().position(|n| n == &Name::new("normal")).unwrap();
        assert!(normal_pos > 0);
        assert!(sample_pos > normal_pos);
    }

    #[test]
    fn pre_cps_atoms_are_cps_wrapped_lambdas() {
        let table = BuiltinTable::build(Vec::new()).unwrap();
        let normal = table.get(&Name::new("normal")).unwrap();
        assert!(normal.is_lam(), "pre-CPS atoms must be wrapped into continuation-taking lambdas");
    }

    #[test]
    fn post_cps_atoms_stay_raw_constants() {
        let table = BuiltinTable::build(Vec::new()).unwrap();
        let sample = table.get(&Name::new("sample")).unwrap();
        assert!(sample.as_const().is_some(), "post-CPS atoms must not be CPS-wrapped");
    }

    #[test]
    fn table_length_matches_all_tables_combined() {
        let user = vec![(Name::new("a"), mk_const(Constant::Int(1)))];
        let table = BuiltinTable::build(user).unwrap();
        assert_eq!(table.len(), 1 + PRE_CPS_ATOMS.len() + POST_CPS_ATOMS.len());
    }
}
