//! The 0-CFA constraint generator (spec.md §4.2).
//!
//! App-spine classification is factored through [`Shape`], a head +
//! argument-list view of an application chain (spec.md §9's design note),
//! generalized from the teacher's `unfold_apps`/`unfold_apps_fn` spine
//! helpers in `expr.rs` (there: "peel every `App`"; here: "peel the whole
//! spine, then classify the head and check the resulting argument count
//! against each pattern's required depth").

use hashbrown::HashSet;

use crate::cfa::constraint::Constraint;
use crate::cfa::value::{AbstractValue, Label};
use crate::errors::{CoreErr, CoreResult};
use crate::label::BMap;
use crate::name::Name;
use crate::term::{Constant, InnerTerm, Term};

enum Head<'a> {
    Const(&'a Constant),
    IfExp,
    Fix,
    Var(&'a Name, u32),
    Other,
}

/// A fully peeled application spine: `head` is whatever sits at the bottom
/// (a bare, non-`App` node), `args` are its arguments left to right, and
/// `label` is the outermost `App`'s own label (or the head's own label if
/// there are no arguments at all).
struct Shape<'a> {
    head: Head<'a>,
    args: Vec<&'a Term>,
    label: Label,
}

fn shape(t: &Term) -> Shape {
    let label = t.label();
    let mut args = Vec::new();
    let mut cur = t;
    while let Some((f, a)) = cur.as_app() {
        args.push(a);
        cur = f;
    }
    args.reverse();
    let head = match cur.as_ref() {
        InnerTerm::Const { c, .. } => Head::Const(c),
        InnerTerm::IfExp { .. } => Head::IfExp,
        InnerTerm::Fix { .. } => Head::Fix,
        InnerTerm::Var { name, .. } => Head::Var(name, cur.var_label()),
        _ => Head::Other,
    };
    Shape { head, args, label }
}

/// `funs`: every `Fun{...}` value denoted by a lambda anywhere in the term
/// (spec.md §4.2, "recursive collection; ignores non-lambda cases"). Walks
/// the whole tree, including the positions `gen_term` itself treats
/// atomically (`Rec` fields, `Proj`'s subject), since a lambda can in
/// principle sit inside either even though the analysis never generates
/// constraints from that position.
fn collect_funs(t: &Term, out: &mut HashSet<AbstractValue>) {
    match t.as_ref() {
        InnerTerm::Lam { body, .. } => {
            out.insert(AbstractValue::Fun {
                l_outer: t.label(),
                l_inner: body.label(),
                l_var: t.var_label(),
            });
            collect_funs(body, out);
        }
        InnerTerm::App { func, arg, .. } => {
            collect_funs(func, out);
            collect_funs(arg, out);
        }
        InnerTerm::Rec { fields, .. } => {
            for (_, field_t) in fields {
                collect_funs(field_t, out);
            }
        }
        InnerTerm::Proj { term, .. } => collect_funs(term, out),
        InnerTerm::Utest { lhs, rhs, next, .. } => {
            collect_funs(lhs, out);
            collect_funs(rhs, out);
            collect_funs(next, out);
        }
        InnerTerm::Const { c: Constant::Atom(a), .. } => {
            for arg in &a.args_rev {
                collect_funs(arg, out);
            }
        }
        InnerTerm::Var { .. }
        | InnerTerm::Const { .. }
        | InnerTerm::IfExp { .. }
        | InnerTerm::Fix { .. }
        | InnerTerm::Nop { .. }
        | InnerTerm::Closure { .. } => {}
    }
}

/// Public entry point onto `funs` (spec.md §4.2), used by `pipeline` to
/// re-derive the same set after solving, so it can check every `Fun` value
/// the solver produced was actually one of the lambdas in the term (spec.md
/// §7's "a `Fun` absent from `funs`... would indicate an internal
/// inconsistency").
pub fn funs_in(term: &Term) -> HashSet<AbstractValue> {
    let mut out = HashSet::new();
    collect_funs(term, &mut out);
    out
}

/// `gen(bmap, labeledTerm) -> List<K>` (spec.md §4.2).
pub fn gen(bmap: &BMap, term: &Term) -> CoreResult<Vec<Constraint>> {
    let sample_label = bmap.get(&Name::new("sample")).copied();
    let funs = funs_in(term);

    let mut out = Vec::new();
    gen_term(term, sample_label, &funs, &mut out)?;
    Ok(out)
}

fn gen_term(
    t: &Term,
    sample_label: Option<u32>,
    funs: &HashSet<AbstractValue>,
    out: &mut Vec<Constraint>,
) -> CoreResult<()> {
    match t.as_ref() {
        InnerTerm::App { .. } => gen_app(t, sample_label, funs, out),
        InnerTerm::Var { .. } => {
            // Rule 6: Sub(var_label, label).
            out.push(Constraint::Sub(t.var_label(), t.label()));
            Ok(())
        }
        InnerTerm::Lam { body, .. } => {
            // Rule 7: Dir(Fun{...}, label); recurse into body.
            out.push(Constraint::Dir(
                AbstractValue::Fun { l_outer: t.label(), l_inner: body.label(), l_var: t.var_label() },
                t.label(),
            ));
            gen_term(body, sample_label, funs, out)
        }
        // Rule 9: Const, IfExp, Rec, Proj, Nop (and bare Fix) emit nothing.
        // Rec/Proj are explicitly "treated atomically" by §3, so their
        // substructure is not walked here either.
        InnerTerm::Const { .. }
        | InnerTerm::IfExp { .. }
        | InnerTerm::Fix { .. }
        | InnerTerm::Rec { .. }
        | InnerTerm::Proj { .. }
        | InnerTerm::Nop { .. } => Ok(()),
        // Rule 10: not one of the nine enumerated cases above.
        InnerTerm::Closure { .. } => Err(CoreErr::ClosureInCore("cfa::gen")),
        InnerTerm::Utest { .. } => Err(CoreErr::UnsupportedVariant("cfa::gen", "Utest")),
    }
}

fn gen_app(
    t: &Term,
    sample_label: Option<u32>,
    funs: &HashSet<AbstractValue>,
    out: &mut Vec<Constraint>,
) -> CoreResult<()> {
    let s = shape(t);
    let l = s.label;

    // Rule 1: binary operator application.
    if let Head::Const(c) = &s.head {
        if s.args.len() == 2 && c.arity() == 2 {
            let (t1, t2) = (s.args[0], s.args[1]);
            out.push(Constraint::Sub(t1.label(), l));
            out.push(Constraint::Sub(t2.label(), l));
            gen_term(t1, sample_label, funs, out)?;
            gen_term(t2, sample_label, funs, out)?;
            return Ok(());
        }
    }
    // Rule 2: unary operator application.
    if let Head::Const(c) = &s.head {
        if s.args.len() == 1 && c.arity() == 1 {
            let t1 = s.args[0];
            out.push(Constraint::Sub(t1.label(), l));
            gen_term(t1, sample_label, funs, out)?;
            return Ok(());
        }
    }
    // Rule 3: if expression.
    if matches!(s.head, Head::IfExp) && s.args.len() == 3 {
        if let (Some((_, then_body)), Some((_, else_body))) =
            (s.args[1].as_lam(), s.args[2].as_lam())
        {
            let cond = s.args[0];
            out.push(Constraint::Sub(then_body.label(), l));
            out.push(Constraint::Sub(else_body.label(), l));
            gen_term(cond, sample_label, funs, out)?;
            gen_term(then_body, sample_label, funs, out)?;
            gen_term(else_body, sample_label, funs, out)?;
            return Ok(());
        }
    }
    // Rule 4: sample call.
    if let Head::Var(_, var_label) = s.head {
        if s.args.len() == 1 && Some(var_label) == sample_label {
            let t1 = s.args[0];
            out.push(Constraint::Dir(AbstractValue::Stoch, l));
            gen_term(t1, sample_label, funs, out)?;
            return Ok(());
        }
    }
    // Rule 5: fix application.
    if matches!(s.head, Head::Fix) && s.args.len() == 1 {
        let t1 = s.args[0];
        for av in funs {
            if let AbstractValue::Fun { l_inner: l2, l_var: x, .. } = av {
                out.push(Constraint::Impl(*av, t1.label(), *l2, *x));
                out.push(Constraint::Impl(*av, t1.label(), *l2, l));
            }
        }
        gen_term(t1, sample_label, funs, out)?;
        return Ok(());
    }

    // Rule 8: general application, exactly one level (not the full spine).
    let (t1, t2) = t.as_app().expect("gen_app is only called on App nodes");
    for av in funs {
        if let AbstractValue::Fun { l_inner: l3, l_var: x, .. } = av {
            out.push(Constraint::Impl(*av, t1.label(), t2.label(), *x));
            out.push(Constraint::Impl(*av, t1.label(), *l3, l));
        }
    }
    gen_term(t1, sample_label, funs, out)?;
    gen_term(t2, sample_label, funs, out)?;
    Ok(())
}

#[cfg(test)]
mod gen_tests {
    use super::*;
    use crate::label::label;
    use crate::term::*;

    #[test]
    fn sample_call_emits_dir_stoch() {
        let d = mk_app(mk_app(mk_const(Constant::Atom(crate::atoms::Atom::new(crate::atoms::AtomId::Normal))), mk_const(Constant::float(0.0))), mk_const(Constant::float(1.0)));
        let t = mk_app(mk_var("sample"), d);
        let (labeled, bmap, _n) = label(&[Name::new("sample")], &t).unwrap();
        let cs = gen(&bmap, &labeled).unwrap();
        let app_label = labeled.label();
        assert!(cs.contains(&Constraint::Dir(AbstractValue::Stoch, app_label)));
    }

    #[test]
    fn lambda_emits_dir_fun() {
        let t = mk_lam("x", mk_var("x"));
        let (labeled, bmap, _n) = label(&[], &t).unwrap();
        let cs = gen(&bmap, &labeled).unwrap();
        let (_, body) = labeled.as_lam().unwrap();
        let expect = Constraint::Dir(
            AbstractValue::Fun { l_outer: labeled.label(), l_inner: body.label(), l_var: labeled.var_label() },
            labeled.label(),
        );
        assert!(cs.contains(&expect));
    }
}
