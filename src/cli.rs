//! Driver binary (SPEC_FULL.md §4.10), grounded on the teacher's
//! `cli.rs`/`main.rs` (`structopt` derive, a `--debug` flag, a dispatch
//! function printing results). Surface-syntax parsing is an explicit
//! Non-goal, so the CLI never reads program text: the example programs
//! below are built with `term`'s constructor functions, the way the
//! teacher's own tests build `Expr` trees with `mk_lambda`/`mk_app`.

use structopt::StructOpt;

use crate::atoms;
use crate::name::Name;
use crate::pipeline::{self, Analysis, CompiledProgram};
use crate::term::*;

/// Builds a fully unapplied atom constant by name, aborting per spec.md §7
/// if `name` isn't one of the two fixed atom tables (spec.md §3) — the
/// example programs below are the one place in this crate that builds atoms
/// from a name rather than an already-resolved `AtomId`.
fn dist(name: &'static str) -> Term {
    atoms::atom_term(name).unwrap_or_else(|e| crate::errors::fatal(e))
}

#[derive(StructOpt, Debug)]
#[structopt(name = "coreppl", about = "CorePPL CPS + 0-CFA compilation core")]
pub struct Opt {
    /// Print the labeled term, constraint count, and mark vector.
    #[structopt(short = "d", long = "debug")]
    pub debug: bool,

    /// Which built-in example program to run.
    #[structopt(short = "e", long = "example", default_value = "identity")]
    pub example: String,
}

/// The example programs named in spec.md §8 (S1–S4), built in-process
/// rather than parsed from text.
pub fn example_program(name: &str) -> Option<(Vec<Name>, Term)> {
    match name {
        // S1: `λx. x`
        "identity" => Some((vec![], mk_lam("x", mk_var("x")))),
        // S2: `let d = normal 0.0 1.0 in sample d`, with no `let` in this
        // core, written as `sample (normal 0.0 1.0)`.
        "sample-let" => {
            let dist_term =
                mk_app(mk_app(dist("normal"), mk_const(Constant::float(0.0))), mk_const(Constant::float(1.0)));
            Some((vec![Name::new("sample")], mk_app(mk_var("sample"), dist_term)))
        }
        // S3: `if sample bernoulli(0.5) then 1 else 2`
        "if-sample" => {
            let coin = mk_app(dist("bernoulli"), mk_const(Constant::float(0.5)));
            let cond = mk_app(mk_var("sample"), coin);
            let ifexp = mk_app(
                mk_app(mk_app(mk_if(), cond), mk_lam("_", mk_const(Constant::Int(1)))),
                mk_lam("_", mk_const(Constant::Int(2))),
            );
            Some((vec![Name::new("sample")], ifexp))
        }
        // S4: `fix (λf. λn. if n=0 then 1 else n * f(n-1))`. `n=0` and `n *
        // ...` stand in as opaque unary ops over `n`, since this core has
        // no arithmetic builtins of its own — only the shape matters here.
        "fix-factorial" => {
            let is_zero = mk_app(dist("exponential"), mk_var("n"));
            let pred_call = mk_app(mk_var("f"), mk_app(dist("exponential"), mk_var("n")));
            let ifexp = mk_app(
                mk_app(mk_app(mk_if(), is_zero), mk_lam("_", mk_const(Constant::Int(1)))),
                mk_lam("_", pred_call),
            );
            let fact = mk_app(mk_fix(), mk_lam("f", mk_lam("n", ifexp)));
            Some((vec![], fact))
        }
        _ => None,
    }
}

pub fn run(opt: &Opt) {
    let (builtin_names, program) = match example_program(&opt.example) {
        Some(pair) => pair,
        None => {
            eprintln!(
                "unknown example `{}`; expected one of: identity, sample-let, if-sample, fix-factorial",
                opt.example
            );
            std::process::exit(1);
        }
    };

    let analysis = match pipeline::analyze(&builtin_names, &program) {
        Ok(a) => a,
        Err(e) => crate::errors::fatal(e),
    };

    let halt = mk_var(Name::new("halt"));
    let mut free_env = builtin_names.clone();
    free_env.push(Name::new("halt"));
    let compiled = match pipeline::compile(&free_env, &halt, &program) {
        Ok(c) => c,
        Err(e) => crate::errors::fatal(e),
    };

    if opt.debug {
        print_debug(&opt.example, &analysis, &compiled);
    } else {
        println!(
            "{}: {} labels, {} dynamic",
            opt.example,
            analysis.n_labels,
            analysis.mark.iter().filter(|b| **b).count()
        );
    }
}

fn print_debug(example: &str, analysis: &Analysis, compiled: &CompiledProgram) {
    println!("### {} ###", example);
    println!("labeled term: {:?}", analysis.labeled_term);
    println!("n_labels: {}", analysis.n_labels);
    let n_dynamic = analysis.mark.iter().filter(|b| **b).count();
    println!("mark: {} / {} labels dynamic", n_dynamic, analysis.mark.len());
    println!("cps term: {:?}", compiled.cps_term);
    println!("de Bruijn term: {:?}", compiled.de_bruijn_term);
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn every_named_example_parses() {
        for name in ["identity", "sample-let", "if-sample", "fix-factorial"] {
            assert!(example_program(name).is_some(), "missing example {}", name);
        }
    }

    #[test]
    fn unknown_example_returns_none() {
        assert!(example_program("nope").is_none());
    }
}
