//! The dynamic/stochastic-taint marker (spec.md §4.4): a second fixpoint,
//! this time over a simple boolean `Mark` array rather than a constraint
//! graph, re-traversing the whole term to fixpoint because marking a
//! `Lam`'s own label dynamic can only be discovered by a later pass once
//! its call site is known to be dynamic.

use crate::cfa::solve::Data;
use crate::cfa::value::AbstractValue;
use crate::errors::{CoreErr, CoreResult};
use crate::label::BMap;
use crate::term::{InnerTerm, Term};

pub type Mark = Vec<bool>;

fn as_if_shape(t: &Term) -> Option<(Term, Term, Term)> {
    let (f1, else_t) = t.as_app()?;
    let (f2, then_t) = f1.as_app()?;
    let (head, cond) = f2.as_app()?;
    if matches!(head.as_ref(), InnerTerm::IfExp { .. }) {
        Some((cond.clone(), then_t.clone(), else_t.clone()))
    } else {
        None
    }
}

fn touch(l: u32, data: &Data, mark: &mut Mark, modified: &mut bool) {
    if !mark[l as usize] {
        mark[l as usize] = true;
        *modified = true;
    }
    for av in &data[l as usize] {
        if let AbstractValue::Fun { l_outer, .. } = av {
            if !mark[*l_outer as usize] {
                mark[*l_outer as usize] = true;
                *modified = true;
            }
        }
    }
}

fn visit(t: &Term, flag: bool, data: &Data, mark: &mut Mark, modified: &mut bool) -> CoreResult<()> {
    let l = t.label();
    if flag || mark[l as usize] {
        touch(l, data, mark, modified);
    }
    match t.as_ref() {
        InnerTerm::App { func, arg, .. } => {
            if !flag {
                if let Some((cond, then_body, else_body)) = as_if_shape(t) {
                    visit(&cond, false, data, mark, modified)?;
                    let new_flag = data[cond.label() as usize].contains(&AbstractValue::Stoch);
                    visit(&then_body, new_flag, data, mark, modified)?;
                    visit(&else_body, new_flag, data, mark, modified)?;
                    return Ok(());
                }
            }
            visit(func, flag, data, mark, modified)?;
            visit(arg, flag, data, mark, modified)
        }
        InnerTerm::Lam { body, .. } => {
            let new_flag = flag || mark[l as usize];
            visit(body, new_flag, data, mark, modified)
        }
        InnerTerm::Var { .. }
        | InnerTerm::Const { .. }
        | InnerTerm::IfExp { .. }
        | InnerTerm::Fix { .. }
        | InnerTerm::Rec { .. }
        | InnerTerm::Proj { .. }
        | InnerTerm::Nop { .. } => Ok(()),
        InnerTerm::Closure { .. } => Err(CoreErr::ClosureInCore("cfa::dynamic")),
        InnerTerm::Utest { .. } => Err(CoreErr::UnsupportedVariant("cfa::dynamic", "Utest")),
    }
}

/// `analyze(bmap, labeledTerm, nLabels) -> Mark` (spec.md §4.4). `bmap`
/// isn't read by this pass's own algorithm (only `cfa::gen` needs the
/// `sample` label); it stays in the signature to match the external
/// contract the rest of the pipeline shares.
pub fn mark(_bmap: &BMap, term: &Term, data: &Data) -> CoreResult<Mark> {
    let mut mark = vec![false; data.len()];
    // Property (a): a label whose `Data` set already contains `Stoch` is
    // dynamic outright, independent of any enclosing if-branch (b) or
    // call-site flow (c) — seed those before the traversal runs, or a bare
    // `sample`/`weight` call at the program root (no enclosing dynamic if,
    // spec.md §8 S2) would never get touched by `visit` at all.
    for (l, values) in data.iter().enumerate() {
        if values.contains(&AbstractValue::Stoch) {
            mark[l] = true;
        }
    }
    loop {
        let mut modified = false;
        visit(term, false, data, &mut mark, &mut modified)?;
        if !modified {
            break;
        }
    }
    Ok(mark)
}

#[cfg(test)]
mod dynamic_tests {
    use super::*;
    use crate::cfa::gen::gen;
    use crate::cfa::solve::solve;
    use crate::cfa::value::AbstractValue;
    use crate::label::label;
    use crate::name::Name;
    use crate::term::*;

    #[test]
    fn identity_marks_nothing() {
        let t = mk_lam("x", mk_var("x"));
        let (labeled, bmap, n) = label(&[], &t).unwrap();
        let cs = gen(&bmap, &labeled).unwrap();
        let data = solve(&cs, n).unwrap();
        let m = mark(&bmap, &labeled, &data).unwrap();
        assert!(m.iter().all(|b| !*b));
    }

    #[test]
    fn sample_reachability_marks_its_own_label() {
        let d = mk_const(Constant::Atom(crate::atoms::Atom::new(crate::atoms::AtomId::Normal)));
        let t = mk_app(mk_var("sample"), d);
        let (labeled, bmap, n) = label(&[Name::new("sample")], &t).unwrap();
        let cs = gen(&bmap, &labeled).unwrap();
        let data = solve(&cs, n).unwrap();
        let m = mark(&bmap, &labeled, &data).unwrap();
        assert!(data[labeled.label() as usize].contains(&AbstractValue::Stoch));
        assert!(m[labeled.label() as usize]);
    }
}
