//! The worklist fixpoint solver (spec.md §4.3): the standard 0-CFA shape —
//! a `Data` array grown monotonically, an `Edges` graph of `Sub`/`Impl`
//! constraints keyed by the label whose growth should re-trigger them, and
//! a worklist of labels to revisit. Grounded in shape on the teacher's own
//! pop-until-empty worklist loops (`loop_add`/`loop_check` in `main.rs`),
//! generalized from "queue of files to recheck" to "queue of labels whose
//! data set grew."

use std::collections::VecDeque;

use crate::cfa::constraint::Constraint;
use crate::cfa::value::{Label, ValueSet};
use crate::errors::{CoreErr, CoreResult};

pub type Data = Vec<ValueSet>;

fn add(data: &mut Data, worklist: &mut VecDeque<Label>, q: Label, d: &ValueSet) {
    let target = &mut data[q as usize];
    if !d.is_subset(target) {
        for av in d {
            target.insert(*av);
        }
        worklist.push_back(q);
    }
}

/// `solve(constraints, nLabels) -> Data` (spec.md §4.3).
pub fn solve(constraints: &[Constraint], n_labels: u32) -> CoreResult<Data> {
    let n = n_labels as usize;
    let mut data: Data = vec![ValueSet::default(); n];
    let mut edges: Vec<Vec<Constraint>> = vec![Vec::new(); n];
    let mut worklist: VecDeque<Label> = VecDeque::new();

    for c in constraints {
        match c {
            Constraint::Dir(av, p) => {
                let mut singleton = ValueSet::default();
                singleton.insert(*av);
                add(&mut data, &mut worklist, *p, &singleton);
            }
            Constraint::Sub(p1, _p2) => edges[*p1 as usize].push(c.clone()),
            Constraint::Impl(_av, p, p1, _p2) => {
                edges[*p1 as usize].push(c.clone());
                edges[*p as usize].push(c.clone());
            }
        }
    }

    while let Some(q) = worklist.pop_front() {
        let pending = edges[q as usize].clone();
        for c in &pending {
            match c {
                Constraint::Sub(p1, p2) => {
                    let d = data[*p1 as usize].clone();
                    add(&mut data, &mut worklist, *p2, &d);
                }
                Constraint::Impl(av, p, p1, p2) => {
                    if data[*p as usize].contains(av) {
                        let d = data[*p1 as usize].clone();
                        add(&mut data, &mut worklist, *p2, &d);
                    }
                }
                Constraint::Dir(..) => {
                    return Err(CoreErr::UnsupportedVariant("cfa::solve", "Dir in edges"));
                }
            }
        }
    }

    Ok(data)
}

#[cfg(test)]
mod solve_tests {
    use super::*;
    use crate::cfa::value::AbstractValue;

    #[test]
    fn dir_seeds_data_directly() {
        let cs = vec![Constraint::Dir(AbstractValue::Stoch, 0)];
        let data = solve(&cs, 1).unwrap();
        assert!(data[0].contains(&AbstractValue::Stoch));
    }

    #[test]
    fn sub_propagates_transitively() {
        let cs = vec![
            Constraint::Dir(AbstractValue::Stoch, 0),
            Constraint::Sub(0, 1),
            Constraint::Sub(1, 2),
        ];
        let data = solve(&cs, 3).unwrap();
        assert!(data[2].contains(&AbstractValue::Stoch));
    }

    #[test]
    fn impl_only_fires_when_guard_present() {
        let fun = AbstractValue::Fun { l_outer: 9, l_inner: 1, l_var: 2 };
        let cs = vec![Constraint::Impl(fun, 0, 1, 3), Constraint::Dir(AbstractValue::Stoch, 1)];
        let data = solve(&cs, 4).unwrap();
        assert!(data[3].is_empty());

        let cs2 = vec![
            Constraint::Dir(fun, 0),
            Constraint::Dir(AbstractValue::Stoch, 1),
            Constraint::Impl(fun, 0, 1, 3),
        ];
        let data2 = solve(&cs2, 4).unwrap();
        assert!(data2[3].contains(&AbstractValue::Stoch));
    }
}
