use crate::basic_types::Clause;
use crate::basic_types::Literal;
use crate::basic_types::VariableKind;
use crate::calabash_assert_moderate;
use crate::containers::LiteralMap;
use crate::engine::model::evaluate;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// Minimizes learned clauses using self-subsuming resolution against the trail's reason graph.
///
/// A literal is redundant if resolving the clause with the reason clause of the literal's
/// variable produces a subset of the clause; removing it preserves the clause's semantics.
/// Positions 0 and 1 are never touched since they are the reserved watched positions of the
/// learned clause. Redundancy is judged against the clause as it was passed in, so the result
/// is independent of the removal order, and minimizing a minimized clause is a no-op.
#[derive(Debug, Default)]
pub struct SubsumptionMinimiser {
    /// Auxiliary bitset for the subset tests in [`SubsumptionMinimiser::self_subsumes`].
    literal_marks: LiteralMap<bool>,
}

impl SubsumptionMinimiser {
    /// Allocate memory for the internal structures.
    pub fn on_variable_resize(&mut self, kind: VariableKind, num_variables: usize) {
        if kind == VariableKind::Boolean {
            self.literal_marks.resize(2 * num_variables, false);
        }
    }

    /// Minimize `clause` using self-subsuming resolution.
    pub fn minimise(&mut self, db: &ClauseDatabase, trail: &Trail, clause: &mut Clause) {
        let mut redundant = Vec::new();
        for position in 2..clause.len() {
            let literal = clause[position];

            // only falsified literals with a reason clause can be resolved away
            if evaluate(trail.model::<bool>(), !literal) != Some(true) {
                continue;
            }
            let Some(reason_ref) = trail.reason(literal.variable()) else {
                continue;
            };

            if self.self_subsumes(db.get(reason_ref), clause, !literal) {
                redundant.push(position);
            }
        }
        clause.remove_positions(&redundant);
    }

    /// Check if `resolve(first, second, literal)` is a subset of `second`.
    ///
    /// `literal` is a literal in `first` whose negation is in `second`.
    fn self_subsumes(&mut self, first: &Clause, second: &Clause, literal: Literal) -> bool {
        calabash_assert_moderate!(first.contains(&literal));
        calabash_assert_moderate!(second.contains(&!literal));

        if first.len() > second.len() {
            return false;
        }

        self.literal_marks.iter_mut().for_each(|mark| *mark = false);
        self.literal_marks[literal] = true;
        for &other in second.iter() {
            self.literal_marks[other] = true;
        }

        first.iter().all(|&other| self.literal_marks[other])
    }
}
