//! All failures in this core are fatal (spec.md §7): structural errors
//! (an unsupported `Term` variant reaching a pass that doesn't handle it,
//! or a `Closure` surfacing before evaluation), name-resolution errors (a
//! free variable with no binder in scope), and arity/shape mismatches
//! (asking for the arity of an unknown atom, or an internal inconsistency
//! in the constraint generator's `funs` set).
//!
//! Library functions return [`CoreResult`] so callers can decide *where*
//! the abort happens (tests want the `Err`, not a `process::exit`); the
//! only shipped caller, the CLI, always aborts on `Err`, which is what
//! makes this "fatal, not recoverable" in practice per §7.

use crate::name::Name;
use crate::term::Term;

pub type CoreResult<T> = Result<T, CoreErr>;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreErr {
    /// A `Var` occurrence with no binder and no builtin-table entry.
    UnboundVariable(Name),
    /// A `Term::Closure` reached a pass that must never see one.
    ClosureInCore(&'static str),
    /// A pass received a `Term` variant it does not handle.
    UnsupportedVariant(&'static str, &'static str),
    /// `App` was handed to `cps_atomic`, which only accepts values.
    AppNotAtomic,
    /// The arity table has no entry for this atom symbol.
    UnknownAtom(&'static str),
    /// A `Fun` abstract value expected in `funs` during fix/app constraint
    /// generation was absent — an internal solver inconsistency.
    MissingFunInFuns,
}

impl std::fmt::Display for CoreErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CoreErr::UnboundVariable(name) => {
                write!(f, "unbound variable `{}`: no binder in scope", name)
            }
            CoreErr::ClosureInCore(site) => {
                write!(f, "`Closure` term reached `{}`, which must never see one", site)
            }
            CoreErr::UnsupportedVariant(site, variant) => {
                write!(f, "`{}` cannot handle term variant `{}`", site, variant)
            }
            CoreErr::AppNotAtomic => {
                write!(f, "cps_atomic was handed an `App`, which is never a value")
            }
            CoreErr::UnknownAtom(id) => write!(f, "unknown atom symbol `{}`", id),
            CoreErr::MissingFunInFuns => {
                write!(f, "a `Fun` abstract value was absent from `funs` during constraint generation")
            }
        }
    }
}

impl std::error::Error for CoreErr {}

/// Prints a diagnostic (file/line via the caller's location, mirroring the
/// teacher's `errors.rs` convention of naming the failing site) and aborts
/// the process. The sole call site is `pipeline`, which never attempts to
/// recover from a `CoreErr` — see the module doc comment.
#[track_caller]
pub fn fatal(err: CoreErr) -> ! {
    let loc = std::panic::Location::caller();
    eprintln!("fatal error at {}:{}: {}", loc.file(), loc.line(), err);
    std::process::exit(1)
}

#[track_caller]
pub fn fatal_closure_debug(site: &'static str, term: &Term) -> ! {
    let loc = std::panic::Location::caller();
    eprintln!(
        "fatal error at {}:{}: `{}` encountered a `Closure` term: {:?}",
        loc.file(),
        loc.line(),
        site,
        term
    );
    std::process::exit(1)
}
