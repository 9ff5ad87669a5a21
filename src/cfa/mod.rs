//! The 0-CFA analysis (spec.md §4.1–§4.4): labeling lives in `crate::label`
//! (shared with CPS/de-Bruijn glue); everything analysis-specific — the
//! abstract domain, the constraint language, the generator, the worklist
//! solver, and the dynamic marker — lives here.

pub mod constraint;
pub mod dynamic;
pub mod gen;
pub mod solve;
pub mod value;
