//! The de Bruijn indexer (spec.md §6, SPEC_FULL.md §4.7): resolves every
//! `Var`'s name to a lexical depth, counting enclosing `Lam`s for bound
//! occurrences and falling back to an explicit free-variable environment
//! for the rest.
//!
//! Grounded on the teacher's `Expr::abstract_core`/`instantiate_core`
//! lexical-depth bookkeeping in `expr.rs` (an offset threaded through binder
//! recursion), adapted from "substitute a term at this depth" to "resolve a
//! name to this depth."

use crate::errors::{CoreErr, CoreResult};
use crate::name::Name;
use crate::term::*;

/// `index(free_env, term) -> term` (SPEC_FULL.md §4.7). `free_env` is the
/// ordered list of free names already in scope — builtin-table order, per
/// spec.md §6 — with index `0` the first (outermost) entry: a free
/// occurrence of `free_env[i]` resolves to depth `locals.len() + (free_env.len()
/// - 1 - i)`, so the earliest-bound builtin sits deepest, exactly as if the
/// whole `free_env` were a stack of enclosing binders added in that order.
pub fn index(free_env: &[Name], term: &Term) -> CoreResult<Term> {
    let mut locals: Vec<Name> = Vec::new();
    go(term, &mut locals, free_env)
}

fn resolve(name: &Name, locals: &[Name], free_env: &[Name]) -> CoreResult<DbIndex> {
    if let Some(depth) = locals.iter().rev().position(|n| n == name) {
        return Ok(DbIndex::Resolved(depth));
    }
    if let Some(idx) = free_env.iter().position(|n| n == name) {
        let depth = locals.len() + (free_env.len() - 1 - idx);
        return Ok(DbIndex::Resolved(depth));
    }
    Err(CoreErr::UnboundVariable(name.clone()))
}

fn go(t: &Term, locals: &mut Vec<Name>, free_env: &[Name]) -> CoreResult<Term> {
    let attr = t.attr();
    match t.as_ref() {
        InnerTerm::Var { name, .. } => {
            let db = resolve(name, locals, free_env)?;
            Ok(t.with_db(db).with_attr(attr))
        }
        InnerTerm::Lam { param, body, .. } => {
            locals.push(param.clone());
            let body2 = go(body, locals, free_env);
            locals.pop();
            Ok(mk_lam(param.clone(), body2?).with_attr(attr))
        }
        InnerTerm::App { func, arg, .. } => {
            let func2 = go(func, locals, free_env)?;
            let arg2 = go(arg, locals, free_env)?;
            Ok(mk_app(func2, arg2).with_attr(attr))
        }
        InnerTerm::Const { c, .. } => Ok(mk_const(index_const(c, locals, free_env)?).with_attr(attr)),
        InnerTerm::IfExp { .. } => Ok(t.clone()),
        InnerTerm::Fix { .. } => Ok(t.clone()),
        InnerTerm::Rec { fields, .. } => {
            let mut new_fields = Vec::with_capacity(fields.len());
            for (n, ft) in fields {
                new_fields.push((n.clone(), go(ft, locals, free_env)?));
            }
            Ok(mk_rec(new_fields).with_attr(attr))
        }
        InnerTerm::Proj { term: subj, field, .. } => {
            Ok(mk_proj(go(subj, locals, free_env)?, field.clone()).with_attr(attr))
        }
        InnerTerm::Nop { .. } => Ok(t.clone()),
        InnerTerm::Utest { lhs, rhs, next, .. } => {
            let lhs2 = go(lhs, locals, free_env)?;
            let rhs2 = go(rhs, locals, free_env)?;
            let next2 = go(next, locals, free_env)?;
            Ok(mk_utest(lhs2, rhs2, next2).with_attr(attr))
        }
        InnerTerm::Closure { .. } => Err(CoreErr::ClosureInCore("debruijn::index")),
    }
}

fn index_const(c: &Constant, locals: &mut Vec<Name>, free_env: &[Name]) -> CoreResult<Constant> {
    match c {
        Constant::Atom(a) => {
            let mut args_rev = Vec::with_capacity(a.args_rev.len());
            for t in &a.args_rev {
                args_rev.push(go(t, locals, free_env)?);
            }
            Ok(Constant::Atom(crate::atoms::Atom { id: a.id, args_rev }))
        }
        owise => Ok(owise.clone()),
    }
}

#[cfg(test)]
mod debruijn_tests {
    use super::*;

    #[test]
    fn bound_variable_counts_enclosing_lambdas() {
        let t = mk_lam("x", mk_lam("y", mk_var("x")));
        let indexed = index(&[], &t).unwrap();
        let (_, inner) = indexed.as_lam().unwrap();
        let (_, body) = inner.as_lam().unwrap();
        assert_eq!(body.as_var().unwrap().1, DbIndex::Resolved(1));
    }

    #[test]
    fn innermost_binder_is_depth_zero() {
        let t = mk_lam("x", mk_var("x"));
        let indexed = index(&[], &t).unwrap();
        let (_, body) = indexed.as_lam().unwrap();
        assert_eq!(body.as_var().unwrap().1, DbIndex::Resolved(0));
    }

    #[test]
    fn free_variable_resolves_against_free_env() {
        let free_env = vec![Name::new("sample"), Name::new("weight")];
        let t = mk_lam("x", mk_var("weight"));
        let indexed = index(&free_env, &t).unwrap();
        let (_, body) = indexed.as_lam().unwrap();
        // one enclosing lambda (depth 1 baseline) + "weight" is the last
        // (innermost-among-free) entry in free_env, so it sits at depth 1.
        assert_eq!(body.as_var().unwrap().1, DbIndex::Resolved(1));
    }

    #[test]
    fn unbound_name_is_fatal() {
        let t = mk_var("z");
        let err = index(&[], &t).unwrap_err();
        assert_eq!(err, CoreErr::UnboundVariable(Name::new("z")));
    }
}
