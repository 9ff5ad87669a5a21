//! The Labeler (spec.md §4.1): assigns a dense, unique integer label to
//! every subterm and to every binding occurrence of a variable, and records
//! builtin name → label in `BMap`.

use std::cell::Cell;

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::atoms::Atom;
use crate::errors::{CoreErr, CoreResult};
use crate::name::Name;
use crate::term::*;

/// Builtin name → label, in builtin-table order (spec.md §4.6 requires this
/// order to match the evaluator's environment layout).
pub type BMap = IndexMap<Name, u32>;

/// Explicit allocator value backing the Labeler's monotonic counter
/// (spec.md §9: "model as an explicit allocator value... do not expose it
/// across compilation units without a reset discipline"), grounded on the
/// teacher's `LOCAL_SERIAL` idiom but made into an owned `Cell<u32>` rather
/// than a process-wide static, since one `LabelAlloc` belongs to exactly one
/// `label::label` call.
#[derive(Debug, Default)]
pub struct LabelAlloc {
    next: Cell<u32>,
}

impl LabelAlloc {
    pub fn new() -> Self {
        LabelAlloc { next: Cell::new(0) }
    }

    pub fn alloc(&self) -> u32 {
        let n = self.next.get();
        self.next.set(n + 1);
        n
    }

    pub fn count(&self) -> u32 {
        self.next.get()
    }
}

/// `label(builtinNames, term) -> (labeledTerm, bmap, nLabels)` (spec.md
/// §4.1). Builtin names are consumed first (in order), then the term is
/// traversed twice with the same counter: once to bind every `Var`/`Lam`'s
/// `var_label`, once to assign every node's own `label`.
pub fn label(builtin_names: &[Name], term: &Term) -> CoreResult<(Term, BMap, u32)> {
    let alloc = LabelAlloc::new();
    let mut bmap = BMap::new();
    for name in builtin_names {
        let l = alloc.alloc();
        bmap.insert(name.clone(), l);
    }

    let mut env: HashMap<Name, u32> = HashMap::new();
    for (name, l) in &bmap {
        env.insert(name.clone(), *l);
    }

    let bound = bind_vars(term, &env, &alloc)?;
    let labeled = label_terms(&bound, &alloc);
    Ok((labeled, bmap, alloc.count()))
}

fn bind_vars(term: &Term, env: &HashMap<Name, u32>, alloc: &LabelAlloc) -> CoreResult<Term> {
    match term.as_ref() {
        InnerTerm::Var { name, db, .. } => {
            let vl = *env
                .get(name)
                .ok_or_else(|| CoreErr::UnboundVariable(name.clone()))?;
            Ok(mk_var(name.clone()).with_db(*db).with_attr(Attr { label: 0, var_label: vl }))
        }
        InnerTerm::Lam { param, body, .. } => {
            let vl = alloc.alloc();
            let mut env2 = env.clone();
            env2.insert(param.clone(), vl);
            let body2 = bind_vars(body, &env2, alloc)?;
            Ok(mk_lam(param.clone(), body2).with_attr(Attr { label: 0, var_label: vl }))
        }
        InnerTerm::App { func, arg, .. } => {
            Ok(mk_app(bind_vars(func, env, alloc)?, bind_vars(arg, env, alloc)?))
        }
        InnerTerm::Const { c, .. } => Ok(mk_const(bind_const(c, env, alloc)?)),
        InnerTerm::IfExp { .. } => Ok(mk_if()),
        InnerTerm::Fix { .. } => Ok(mk_fix()),
        InnerTerm::Rec { fields, .. } => {
            let mut new_fields = Vec::with_capacity(fields.len());
            for (n, t) in fields {
                new_fields.push((n.clone(), bind_vars(t, env, alloc)?));
            }
            Ok(mk_rec(new_fields))
        }
        InnerTerm::Proj { term: t, field, .. } => {
            Ok(mk_proj(bind_vars(t, env, alloc)?, field.clone()))
        }
        InnerTerm::Nop { .. } => Ok(mk_nop()),
        InnerTerm::Utest { lhs, rhs, next, .. } => Ok(mk_utest(
            bind_vars(lhs, env, alloc)?,
            bind_vars(rhs, env, alloc)?,
            bind_vars(next, env, alloc)?,
        )),
        InnerTerm::Closure { .. } => Err(CoreErr::ClosureInCore("label::bind_vars")),
    }
}

fn bind_const(c: &Constant, env: &HashMap<Name, u32>, alloc: &LabelAlloc) -> CoreResult<Constant> {
    match c {
        Constant::Atom(a) => {
            let mut args_rev = Vec::with_capacity(a.args_rev.len());
            for t in &a.args_rev {
                args_rev.push(bind_vars(t, env, alloc)?);
            }
            Ok(Constant::Atom(Atom { id: a.id, args_rev }))
        }
        owise => Ok(owise.clone()),
    }
}

/// Second pass: assigns `Attr.label` to every node, leaving the `var_label`
/// that `bind_vars` already set untouched. Cannot fail — every `Closure` was
/// already rejected by `bind_vars`.
fn label_terms(term: &Term, alloc: &LabelAlloc) -> Term {
    let l = alloc.alloc();
    let var_label = term.var_label();
    let rebuilt = match term.as_ref() {
        InnerTerm::Var { name, db, .. } => mk_var(name.clone()).with_db(*db),
        InnerTerm::Lam { param, body, .. } => mk_lam(param.clone(), label_terms(body, alloc)),
        InnerTerm::App { func, arg, .. } => mk_app(label_terms(func, alloc), label_terms(arg, alloc)),
        InnerTerm::Const { c, .. } => mk_const(label_const(c, alloc)),
        InnerTerm::IfExp { .. } => mk_if(),
        InnerTerm::Fix { .. } => mk_fix(),
        InnerTerm::Rec { fields, .. } => {
            mk_rec(fields.iter().map(|(n, t)| (n.clone(), label_terms(t, alloc))).collect())
        }
        InnerTerm::Proj { term: t, field, .. } => mk_proj(label_terms(t, alloc), field.clone()),
        InnerTerm::Nop { .. } => mk_nop(),
        InnerTerm::Utest { lhs, rhs, next, .. } => {
            mk_utest(label_terms(lhs, alloc), label_terms(rhs, alloc), label_terms(next, alloc))
        }
        InnerTerm::Closure { .. } => unreachable!("bind_vars rejects Closure before label_terms runs"),
    };
    rebuilt.with_attr(Attr { label: l, var_label })
}

fn label_const(c: &Constant, alloc: &LabelAlloc) -> Constant {
    match c {
        Constant::Atom(a) => Constant::Atom(Atom {
            id: a.id,
            args_rev: a.args_rev.iter().map(|t| label_terms(t, alloc)).collect(),
        }),
        owise => owise.clone(),
    }
}

#[cfg(test)]
mod label_tests {
    use super::*;

    fn collect_labels(t: &Term, out: &mut Vec<u32>) {
        out.push(t.label());
        match t.as_ref() {
            InnerTerm::Lam { body, .. } => collect_labels(body, out),
            InnerTerm::App { func, arg, .. } => {
                collect_labels(func, out);
                collect_labels(arg, out);
            }
            InnerTerm::Proj { term, .. } => collect_labels(term, out),
            InnerTerm::Utest { lhs, rhs, next, .. } => {
                collect_labels(lhs, out);
                collect_labels(rhs, out);
                collect_labels(next, out);
            }
            InnerTerm::Rec { fields, .. } => {
                for (_, t) in fields {
                    collect_labels(t, out);
                }
            }
            _ => {}
        }
    }

    #[test]
    fn labels_are_dense_and_unique() {
        let t = mk_lam("x", mk_var("x"));
        let (labeled, _bmap, n) = label(&[], &t).unwrap();
        let mut labels = Vec::new();
        collect_labels(&labeled, &mut labels);
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn var_label_matches_its_binder() {
        let t = mk_lam("x", mk_var("x"));
        let (labeled, _bmap, _n) = label(&[], &t).unwrap();
        let (_, body) = labeled.as_lam().unwrap();
        assert_eq!(labeled.var_label(), body.var_label());
    }

    #[test]
    fn unbound_variable_is_fatal() {
        let t = mk_var("z");
        let err = label(&[], &t).unwrap_err();
        assert_eq!(err, CoreErr::UnboundVariable(Name::new("z")));
    }

    #[test]
    fn builtin_names_get_labels_first() {
        let builtins = vec![Name::new("foo"), Name::new("bar")];
        let t = mk_var("foo");
        let (labeled, bmap, _n) = label(&builtins, &t).unwrap();
        assert_eq!(bmap.get(&Name::new("foo")), Some(&0));
        assert_eq!(bmap.get(&Name::new("bar")), Some(&1));
        assert_eq!(labeled.var_label(), 0);
    }
}
