//! CorePPL compilation core: the 0-CFA static analysis and CPS
//! transformation that sit between a parsed probabilistic-program AST and
//! its evaluator (see DESIGN.md for the module-by-module grounding ledger).

pub mod atoms;
pub mod builtins;
pub mod cfa;
pub mod cli;
pub mod cps;
pub mod debruijn;
pub mod errors;
pub mod label;
pub mod name;
pub mod pipeline;
pub mod term;
