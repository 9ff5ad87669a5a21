//! The term language (spec.md §3): a tagged variant with a shared `Attr`
//! carried by every node, grounded on the teacher's `Expr`/`InnerExpr`
//! split (an `Arc`-wrapped enum with a per-node cache computed bottom-up at
//! construction time).
//!
//! `Term` is immutable: every pass in this crate consumes a `Term` and
//! returns a new one rather than mutating in place (spec.md §3, Lifecycle).

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use fxhash::hash64;

use crate::atoms::Atom;
use crate::name::Name;

use InnerTerm::*;

/// Per-node metadata (spec.md §3): `label` is this node's own label; for a
/// `Var`, `var_label` is the label of its binding site (or builtin-table
/// entry); for a `Lam`, `var_label` is the label assigned to its bound
/// variable. Both are `0` until the labeler runs (spec.md §6, "Parser
/// produces a term... with all `Attr.label = 0` and `var_label = 0`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attr {
    pub label: u32,
    pub var_label: u32,
}

/// A `Var`'s de Bruijn index. `Unresolved` until `debruijn::index` runs
/// (spec.md §4.7); fresh CPS-introduced variables also start `Unresolved`
/// and are only ever seen by the indexer afterward (spec.md §4.5, "fresh
/// variables introduced during CPS carry a placeholder de Bruijn index").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbIndex {
    Unresolved,
    Resolved(usize),
}

impl Default for DbIndex {
    fn default() -> Self {
        DbIndex::Unresolved
    }
}

/// A constant (spec.md §3): either a saturating-arity builtin atom
/// (possibly partially applied, `CAtom`) or a zero-arity literal value.
/// Floats are stored by bit pattern so `Constant` can derive structural
/// `Eq`/`Hash` the way every other node in this tree does (`f64` itself
/// implements neither, because of `NaN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i64),
    Float(u64),
    Bool(bool),
    Char(char),
    Atom(Atom),
}

impl Constant {
    pub fn float(v: f64) -> Self {
        Constant::Float(v.to_bits())
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Constant::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// `maxArity(id) - |args|` for an atom; `0` for every literal kind,
    /// since a literal is already a fully-applied value (spec.md §3).
    pub fn arity(&self) -> usize {
        match self {
            Constant::Atom(a) => a.arity(),
            _ => 0,
        }
    }
}

const VAR_SEED: u64 = 104_729;
const LAM_SEED: u64 = 224_737;
const APP_SEED: u64 = 350_377;
const CONST_SEED: u64 = 479_001_599;
const IF_SEED: u64 = 15_485_863;
const FIX_SEED: u64 = 32_452_843;
const REC_SEED: u64 = 49_979_687;
const PROJ_SEED: u64 = 67_867_967;
const NOP_SEED: u64 = 86_028_121;
const UTEST_SEED: u64 = 104_395_301;
const CLOSURE_SEED: u64 = 122_949_829;

/// Caches this node's structural digest, computed bottom-up from its
/// children's digests plus a per-variant seed (grounded on the teacher's
/// `ExprCache`, which caches a digest the same way so that hash-keyed
/// collections never rehash a whole subtree). Unlike the teacher, there's
/// no `var_bound`/`has_locals` bookkeeping here: this term language has no
/// locally-nameless substitution machinery, only the label/CPS/de-Bruijn
/// passes, none of which need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TermCache {
    digest: u64,
}

impl TermCache {
    fn mk(digest: u64) -> Self {
        TermCache { digest }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum InnerTerm {
    Var { cache: TermCache, attr: Attr, name: Name, db: DbIndex },
    Lam { cache: TermCache, attr: Attr, param: Name, body: Term },
    App { cache: TermCache, attr: Attr, func: Term, arg: Term },
    Const { cache: TermCache, attr: Attr, c: Constant },
    IfExp { cache: TermCache, attr: Attr },
    Fix { cache: TermCache, attr: Attr },
    Rec { cache: TermCache, attr: Attr, fields: Vec<(Name, Term)> },
    Proj { cache: TermCache, attr: Attr, term: Term, field: Name },
    Nop { cache: TermCache, attr: Attr },
    Utest { cache: TermCache, attr: Attr, lhs: Term, rhs: Term, next: Term },
    /// Only ever created by the evaluator (spec.md §3); must never appear
    /// at the input to CPS or the analysis (spec.md §3 Invariants).
    Closure { cache: TermCache, attr: Attr },
}

impl InnerTerm {
    fn cache(&self) -> TermCache {
        match self {
            Var { cache, .. }
            | Lam { cache, .. }
            | App { cache, .. }
            | Const { cache, .. }
            | IfExp { cache, .. }
            | Fix { cache, .. }
            | Rec { cache, .. }
            | Proj { cache, .. }
            | Nop { cache, .. }
            | Utest { cache, .. }
            | Closure { cache, .. } => *cache,
        }
    }

    fn attr(&self) -> Attr {
        match self {
            Var { attr, .. }
            | Lam { attr, .. }
            | App { attr, .. }
            | Const { attr, .. }
            | IfExp { attr, .. }
            | Fix { attr, .. }
            | Rec { attr, .. }
            | Proj { attr, .. }
            | Nop { attr, .. }
            | Utest { attr, .. }
            | Closure { attr, .. } => *attr,
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Var { .. } => "Var",
            Lam { .. } => "Lam",
            App { .. } => "App",
            Const { .. } => "Const",
            IfExp { .. } => "IfExp",
            Fix { .. } => "Fix",
            Rec { .. } => "Rec",
            Proj { .. } => "Proj",
            Nop { .. } => "Nop",
            Utest { .. } => "Utest",
            Closure { .. } => "Closure",
        }
    }
}

/// Hash only the cached digest (grounded on the teacher's `impl Hash for
/// InnerExpr`): equal terms always share a digest, so this stays consistent
/// with the derived structural `PartialEq`/`Eq` above, and collections keyed
/// on `Term` never need to walk a whole subtree to hash it.
impl Hash for InnerTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cache().digest.hash(state);
    }
}

/// `Arc` wrapper around [`InnerTerm`]. Cheap to clone; every transformation
/// pass in this crate builds new `Term`s rather than mutating existing
/// ones.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Term(Arc<InnerTerm>);

impl std::fmt::Debug for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.as_ref() {
            Var { name, db, .. } => write!(f, "{}@{:?}", name, db),
            Lam { param, body, .. } => write!(f, "(\\{}. {:?})", param, body),
            App { func, arg, .. } => write!(f, "({:?} {:?})", func, arg),
            Const { c, .. } => write!(f, "{:?}", c),
            IfExp { .. } => write!(f, "if"),
            Fix { .. } => write!(f, "fix"),
            Rec { fields, .. } => {
                write!(f, "{{")?;
                for (i, (n, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {:?}", n, t)?;
                }
                write!(f, "}}")
            }
            Proj { term, field, .. } => write!(f, "{:?}.{}", term, field),
            Nop { .. } => write!(f, "()"),
            Utest { lhs, rhs, next, .. } => {
                write!(f, "utest {:?} = {:?} in {:?}", lhs, rhs, next)
            }
            Closure { .. } => write!(f, "<closure>"),
        }
    }
}

impl std::convert::AsRef<InnerTerm> for Term {
    fn as_ref(&self) -> &InnerTerm {
        &self.0
    }
}

impl From<InnerTerm> for Term {
    fn from(t: InnerTerm) -> Term {
        Term(Arc::new(t))
    }
}

impl Term {
    pub fn attr(&self) -> Attr {
        self.as_ref().attr()
    }

    pub fn label(&self) -> u32 {
        self.attr().label
    }

    pub fn var_label(&self) -> u32 {
        self.attr().var_label
    }

    pub fn variant_name(&self) -> &'static str {
        self.as_ref().variant_name()
    }

    pub fn is_app(&self) -> bool {
        matches!(self.as_ref(), App { .. })
    }

    pub fn is_lam(&self) -> bool {
        matches!(self.as_ref(), Lam { .. })
    }

    pub fn as_var(&self) -> Option<(&Name, DbIndex)> {
        match self.as_ref() {
            Var { name, db, .. } => Some((name, *db)),
            _ => None,
        }
    }

    pub fn as_lam(&self) -> Option<(&Name, &Term)> {
        match self.as_ref() {
            Lam { param, body, .. } => Some((param, body)),
            _ => None,
        }
    }

    pub fn as_app(&self) -> Option<(&Term, &Term)> {
        match self.as_ref() {
            App { func, arg, .. } => Some((func, arg)),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match self.as_ref() {
            Const { c, .. } => Some(c),
            _ => None,
        }
    }

    /// Rebuilds this node with `attr` replacing its current one, leaving
    /// children and digest untouched. Used by the labeler, which produces a
    /// freshly attributed copy of the tree rather than mutating in place
    /// (spec.md §3 Lifecycle); cloning children is an `Arc` bump, not a deep
    /// copy.
    pub fn with_attr(&self, attr: Attr) -> Term {
        let cache = self.as_ref().cache();
        let new_inner = match self.as_ref() {
            Var { name, db, .. } => Var { cache, attr, name: name.clone(), db: *db },
            Lam { param, body, .. } => Lam { cache, attr, param: param.clone(), body: body.clone() },
            App { func, arg, .. } => App { cache, attr, func: func.clone(), arg: arg.clone() },
            Const { c, .. } => Const { cache, attr, c: c.clone() },
            IfExp { .. } => IfExp { cache, attr },
            Fix { .. } => Fix { cache, attr },
            Rec { fields, .. } => Rec { cache, attr, fields: fields.clone() },
            Proj { term, field, .. } => Proj { cache, attr, term: term.clone(), field: field.clone() },
            Nop { .. } => Nop { cache, attr },
            Utest { lhs, rhs, next, .. } => {
                Utest { cache, attr, lhs: lhs.clone(), rhs: rhs.clone(), next: next.clone() }
            }
            Closure { .. } => Closure { cache, attr },
        };
        Term::from(new_inner)
    }

    /// Rebuilds a `Var` with a resolved de Bruijn index, used by
    /// `debruijn::index`.
    pub fn with_db(&self, db: DbIndex) -> Term {
        match self.as_ref() {
            Var { cache, attr, name, .. } => {
                Term::from(Var { cache: *cache, attr: *attr, name: name.clone(), db })
            }
            owise => panic!("with_db called on non-Var term {:?}", owise.variant_name()),
        }
    }
}

pub fn mk_var(name: impl Into<Name>) -> Term {
    let name = name.into();
    let digest = hash64(&(VAR_SEED, &name));
    Term::from(Var { cache: TermCache::mk(digest), attr: Attr::default(), name, db: DbIndex::Unresolved })
}

pub fn mk_lam(param: impl Into<Name>, body: Term) -> Term {
    let param = param.into();
    let digest = hash64(&(LAM_SEED, &param, body.as_ref().cache().digest));
    Term::from(Lam { cache: TermCache::mk(digest), attr: Attr::default(), param, body })
}

pub fn mk_app(func: Term, arg: Term) -> Term {
    let digest = hash64(&(APP_SEED, func.as_ref().cache().digest, arg.as_ref().cache().digest));
    Term::from(App { cache: TermCache::mk(digest), attr: Attr::default(), func, arg })
}

pub fn mk_const(c: Constant) -> Term {
    let digest = hash64(&(CONST_SEED, &c));
    Term::from(Const { cache: TermCache::mk(digest), attr: Attr::default(), c })
}

pub fn mk_if() -> Term {
    Term::from(IfExp { cache: TermCache::mk(IF_SEED), attr: Attr::default() })
}

pub fn mk_fix() -> Term {
    Term::from(Fix { cache: TermCache::mk(FIX_SEED), attr: Attr::default() })
}

pub fn mk_rec(fields: Vec<(Name, Term)>) -> Term {
    let digest = hash64(&(
        REC_SEED,
        fields.iter().map(|(n, t)| (n.clone(), t.as_ref().cache().digest)).collect::<Vec<_>>(),
    ));
    Term::from(Rec { cache: TermCache::mk(digest), attr: Attr::default(), fields })
}

pub fn mk_proj(term: Term, field: impl Into<Name>) -> Term {
    let field = field.into();
    let digest = hash64(&(PROJ_SEED, term.as_ref().cache().digest, &field));
    Term::from(Proj { cache: TermCache::mk(digest), attr: Attr::default(), term, field })
}

pub fn mk_nop() -> Term {
    Term::from(Nop { cache: TermCache::mk(NOP_SEED), attr: Attr::default() })
}

pub fn mk_utest(lhs: Term, rhs: Term, next: Term) -> Term {
    let digest = hash64(&(
        UTEST_SEED,
        lhs.as_ref().cache().digest,
        rhs.as_ref().cache().digest,
        next.as_ref().cache().digest,
    ));
    Term::from(Utest { cache: TermCache::mk(digest), attr: Attr::default(), lhs, rhs, next })
}

/// Only ever used by an [`crate::pipeline::Evaluator`] implementation;
/// constructing one anywhere in this crate's own passes is a bug (spec.md
/// §3 Invariants).
pub fn mk_closure() -> Term {
    Term::from(Closure { cache: TermCache::mk(CLOSURE_SEED), attr: Attr::default() })
}

/// `λx. x`, used as the identity continuation for `Utest` assertions and
/// `Fix`'s unwrapped value (spec.md §4.5).
pub fn id_fun() -> Term {
    let x = Name::fresh();
    mk_lam(x.clone(), mk_var(x))
}

#[cfg(test)]
mod term_tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_identity() {
        let a = mk_app(mk_var("x"), mk_var("y"));
        let b = mk_app(mk_var("x"), mk_var("y"));
        assert_eq!(a, b);
    }

    #[test]
    fn with_attr_preserves_children() {
        let t = mk_lam("x", mk_var("x"));
        let t2 = t.with_attr(Attr { label: 7, var_label: 3 });
        assert_eq!(t2.label(), 7);
        assert_eq!(t2.var_label(), 3);
        assert_eq!(t.as_lam().unwrap().0, t2.as_lam().unwrap().0);
    }

    #[test]
    fn float_constants_round_trip() {
        let c = Constant::float(1.5);
        assert_eq!(c.as_float(), Some(1.5));
    }
}
