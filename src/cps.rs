//! The CPS transformer (spec.md §4.5): a standard one-pass, syntactic
//! translation. `cont` is always an object-level [`Term`] — a `Var` or a
//! freshly built `Lam` — never a meta-level Rust closure; that's what makes
//! `App(cont, cps_atomic(t))` a term construction rather than a type error,
//! and it matches the `λk. λx. ...` object-syntax spec.md §4.5 uses
//! throughout to describe calling-convention shapes.
//!
//! Fresh names are drawn from [`Name::fresh`]'s process-wide `$`-prefixed
//! counter (spec.md §4.5's fresh-variable discipline), the same allocator
//! used by `label`'s var-binding pass, grounded on the teacher's
//! `LOCAL_SERIAL`/`easy_fresh_name` idiom in `expr.rs`.

use crate::errors::{CoreErr, CoreResult};
use crate::name::Name;
use crate::term::*;

fn is_atomic(t: &Term) -> bool {
    !matches!(t.as_ref(), InnerTerm::App { .. })
}

/// Wraps a constant of arity `n` in `n` layers of `λkᵢ.λvᵢ. kᵢ (...)`,
/// terminating in the saturated application `c v1 v2 ... vn` (spec.md §4.5,
/// point 3). Arity 0 is the degenerate case of zero layers — it returns `c`
/// unchanged, which also covers the `Char`/`UC`-style literal constants
/// spec.md §4.5 lists as passthrough cases (see DESIGN.md's Open Question
/// resolution #4).
fn cps_const(c: &Constant) -> Term {
    fn layer(c: &Constant, remaining: usize, applied: Vec<Term>) -> Term {
        let k = Name::fresh();
        let v = Name::fresh();
        let mut applied = applied;
        applied.push(mk_var(v.clone()));
        let inner = if remaining == 1 {
            let spine = applied.into_iter().fold(mk_const(c.clone()), mk_app);
            mk_app(mk_var(k.clone()), spine)
        } else {
            mk_app(mk_var(k.clone()), layer(c, remaining - 1, applied))
        };
        mk_lam(k, mk_lam(v, inner))
    }

    let arity = c.arity();
    if arity == 0 {
        mk_const(c.clone())
    } else {
        layer(c, arity, Vec::new())
    }
}

/// `λk₁.λa. k₁ (λk₂.λb. k₂ (λk₃.λc. λkFinal. IfExp a (b kFinal) (c kFinal)))`
/// (spec.md §4.5): the three-continuation form that lets the then/else
/// thunks each receive the final continuation directly, rather than having
/// their result applied to it by the surrounding `cps`.
fn cps_if() -> Term {
    let (k1, a) = (Name::fresh(), Name::fresh());
    let (k2, b) = (Name::fresh(), Name::fresh());
    let (k3, c) = (Name::fresh(), Name::fresh());
    let k_final = Name::fresh();

    let if_body = mk_app(
        mk_app(mk_app(mk_if(), mk_var(a.clone())), mk_app(mk_var(b.clone()), mk_var(k_final.clone()))),
        mk_app(mk_var(c.clone()), mk_var(k_final.clone())),
    );
    let layer3 = mk_lam(k3, mk_lam(c, mk_lam(k_final, if_body)));
    let layer2 = mk_lam(k2, mk_lam(b, mk_app(mk_var(k2.clone()), layer3)));
    mk_lam(k1, mk_lam(a, mk_app(mk_var(k1.clone()), layer2)))
}

/// `λk. λv. k (Fix (v idFun))` (spec.md §4.5): `Fix` itself needs the
/// unwrapped value, so `v` — the function to tie the knot on — is applied
/// to the identity continuation before `Fix` sees it.
fn cps_fix() -> Term {
    let k = Name::fresh();
    let v = Name::fresh();
    let body = mk_app(mk_var(k.clone()), mk_app(mk_fix(), mk_app(mk_var(v.clone()), id_fun())));
    mk_lam(k, mk_lam(v, body))
}

/// `cps_atomic(t)` (spec.md §4.5): transforms a term that is already a
/// value, without a supplied continuation.
pub fn cps_atomic(t: &Term) -> CoreResult<Term> {
    match t.as_ref() {
        InnerTerm::Var { .. } | InnerTerm::Nop { .. } | InnerTerm::Rec { .. } | InnerTerm::Proj { .. } => {
            Ok(t.clone())
        }
        InnerTerm::Const { c, .. } => Ok(cps_const(c)),
        InnerTerm::Lam { param, body, .. } => {
            let k = Name::fresh();
            let cps_body = cps(&mk_var(k.clone()), body)?;
            Ok(mk_lam(k, mk_lam(param.clone(), cps_body)))
        }
        InnerTerm::IfExp { .. } => Ok(cps_if()),
        InnerTerm::Fix { .. } => Ok(cps_fix()),
        InnerTerm::Utest { lhs, rhs, next, .. } => {
            let id = id_fun();
            Ok(mk_utest(cps(&id, lhs)?, cps(&id, rhs)?, cps(&id, next)?))
        }
        InnerTerm::App { .. } => Err(CoreErr::AppNotAtomic),
        InnerTerm::Closure { .. } => Err(CoreErr::ClosureInCore("cps::cps_atomic")),
    }
}

/// `cps(cont, t)` (spec.md §4.5): transforms a computation given a
/// continuation. Only `App` is non-atomic.
pub fn cps(cont: &Term, t: &Term) -> CoreResult<Term> {
    match t.as_ref() {
        InnerTerm::App { func, arg, .. } => {
            let f_atomic = is_atomic(func);
            let e_atomic = is_atomic(arg);

            let f_prime = if f_atomic { cps_atomic(func)? } else { mk_var(Name::fresh()) };
            let e_prime = if e_atomic { cps_atomic(arg)? } else { mk_var(Name::fresh()) };

            let core = mk_app(mk_app(f_prime.clone(), cont.clone()), e_prime.clone());

            let inner = if !e_atomic {
                let e_name = e_prime.as_var().expect("fresh e' is always a Var").0.clone();
                cps(&mk_lam(e_name, core), arg)?
            } else {
                core
            };

            let outer = if !f_atomic {
                let f_name = f_prime.as_var().expect("fresh f' is always a Var").0.clone();
                cps(&mk_lam(f_name, inner), func)?
            } else {
                inner
            };

            Ok(outer)
        }
        _ => Ok(mk_app(cont.clone(), cps_atomic(t)?)),
    }
}

#[cfg(test)]
mod cps_tests {
    use super::*;

    /// S1: `λx. x` CPS-transforms to `λk. λx. k x`.
    #[test]
    fn identity_cps_shape() {
        let t = mk_lam("x", mk_var("x"));
        let result = cps_atomic(&t).unwrap();
        let (k, inner) = result.as_lam().unwrap();
        let (x, body) = inner.as_lam().unwrap();
        let (func, arg) = body.as_app().unwrap();
        assert_eq!(func.as_var().unwrap().0, k);
        assert_eq!(arg.as_var().unwrap().0, x);
    }

    /// S6: `(f x) (g z)` — both the function and argument positions of the
    /// outer application are themselves applications, so `cps` introduces
    /// two fresh bindings, one per position.
    #[test]
    fn two_fresh_bindings_for_compound_positions() {
        let t = mk_app(mk_app(mk_var("f"), mk_var("x")), mk_app(mk_var("g"), mk_var("z")));
        let cont = mk_var("halt");
        let result = cps(&cont, &t).unwrap();

        // outer: App(App(Var f, Lam(f0, inner)), Var x)
        let (outer_func, outer_arg) = result.as_app().unwrap();
        assert_eq!(outer_arg.as_var().unwrap().0, Name::new("x"));
        let (f_var, f0_lam) = outer_func.as_app().unwrap();
        assert_eq!(f_var.as_var().unwrap().0, Name::new("f"));
        let (f0, inner) = f0_lam.as_lam().unwrap();

        // inner: App(App(Var g, Lam(e0, core)), Var z)
        let (inner_func, inner_arg) = inner.as_app().unwrap();
        assert_eq!(inner_arg.as_var().unwrap().0, Name::new("z"));
        let (g_var, e0_lam) = inner_func.as_app().unwrap();
        assert_eq!(g_var.as_var().unwrap().0, Name::new("g"));
        let (e0, core) = e0_lam.as_lam().unwrap();

        // core: App(App(Var f0, cont), Var e0)
        let (core_func, core_arg) = core.as_app().unwrap();
        assert_eq!(core_arg.as_var().unwrap().0, e0);
        let (f0_var, cont_var) = core_func.as_app().unwrap();
        assert_eq!(f0_var.as_var().unwrap().0, f0);
        assert_eq!(cont_var.as_var().unwrap().0, Name::new("halt"));
    }

    #[test]
    fn fix_unwraps_via_id_fun() {
        let result = cps_atomic(&mk_fix()).unwrap();
        let (_k, inner) = result.as_lam().unwrap();
        let (_v, body) = inner.as_lam().unwrap();
        assert!(body.as_app().is_some());
    }
}
