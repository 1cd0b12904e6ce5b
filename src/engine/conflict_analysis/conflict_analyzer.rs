use std::collections::HashSet;

use crate::basic_types::Clause;
use crate::basic_types::Literal;
use crate::basic_types::VariableKind;
use crate::calabash_assert_moderate;
use crate::calabash_assert_simple;
use crate::engine::model::evaluate_clause;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// Derives a learned clause suitable for backtracking from a raw conflict clause using
/// resolution.
///
/// The analyzer walks the trail backwards from the conflict and resolves the conflict clause
/// with the reason clause of the most recent Boolean variable of the conflict at the top
/// decision level. Resolution stops when a single literal at the top level remains (the first
/// unique implication point), or when only semantically assigned variables at the top level
/// remain, in which case the result is a *semantic split* clause with at least two literals at
/// the top level.
///
/// Literals in the returned clause are ordered by decision level from the highest to the
/// smallest, so position 0 holds the asserting literal and position 1 a literal at the
/// backtrack level.
#[derive(Debug, Default)]
pub struct ConflictAnalyzer {
    /// Current conflict clause.
    conflict: HashSet<Literal>,
    /// The highest decision level in the current conflict clause.
    top_level: usize,
    /// Number of literals at `top_level` in the current conflict clause.
    num_top_level: usize,
}

impl ConflictAnalyzer {
    /// Derive a clause suitable for backtracking from `conflict`, a clause that is false in
    /// `trail`.
    ///
    /// `on_resolve` is called for each reason clause that is resolved with the conflict; the
    /// driver forwards these events to the registered theories so they can, e.g., bump
    /// variable activities. Returns the learned clause and the decision level to backtrack to.
    pub fn analyze(
        &mut self,
        db: &ClauseDatabase,
        trail: &Trail,
        conflict: Clause,
        mut on_resolve: impl FnMut(&Clause),
    ) -> (Clause, usize) {
        let model = trail.model::<bool>();
        calabash_assert_moderate!(evaluate_clause(model, &conflict) == Some(false));

        self.init(trail, &conflict);

        for entry in trail.assigned(self.top_level).iter().rev() {
            if self.can_backtrack() {
                break;
            }

            let variable = entry.variable();
            if variable.kind() != VariableKind::Boolean {
                continue;
            }
            let Some(reason_ref) = entry.source().reason() else {
                // decisions and theory-internal propagations cannot be resolved away
                continue;
            };

            let literal = if model.value(variable.ordinal()) == Some(&true) {
                !Literal::of(variable)
            } else {
                Literal::of(variable)
            };
            if self.can_resolve(literal) {
                let reason = db.get(reason_ref);
                on_resolve(reason);
                self.resolve(trail, reason, literal);
            }
        }

        self.finish(trail)
    }

    /// Check if the solver can backtrack with the current conflict clause.
    fn can_backtrack(&self) -> bool {
        self.num_top_level == 1 && self.conflict.len() > 1
    }

    /// Check if the current conflict clause contains `literal`.
    fn can_resolve(&self, literal: Literal) -> bool {
        self.conflict.contains(&literal)
    }

    fn init(&mut self, trail: &Trail, conflict: &Clause) {
        self.top_level = 0;
        self.conflict.clear();
        for &literal in conflict.iter() {
            let _ = self.conflict.insert(literal);
            let level = trail
                .decision_level_of(literal.variable())
                .expect("conflict clause literals are assigned");
            self.top_level = self.top_level.max(level);
        }

        self.num_top_level = self
            .conflict
            .iter()
            .filter(|literal| {
                trail.decision_level_of(literal.variable()) == Some(self.top_level)
            })
            .count();
    }

    /// Resolve the current conflict clause with `other` on `conflict_literal`.
    fn resolve(&mut self, trail: &Trail, other: &Clause, conflict_literal: Literal) {
        calabash_assert_moderate!(self.can_resolve(conflict_literal));

        for &literal in other.iter() {
            if literal != !conflict_literal {
                let is_inserted = self.conflict.insert(literal);
                if is_inserted
                    && trail.decision_level_of(literal.variable()) == Some(self.top_level)
                {
                    self.num_top_level += 1;
                }
            }
        }

        calabash_assert_moderate!(
            trail.decision_level_of(conflict_literal.variable()) == Some(self.top_level)
        );

        let _ = self.conflict.remove(&conflict_literal);
        self.num_top_level -= 1;
    }

    /// Finish the conflict derivation.
    fn finish(&self, trail: &Trail) -> (Clause, usize) {
        let mut clause: Clause = self.conflict.iter().copied().collect();
        if clause.is_empty() {
            return (clause, 0);
        }

        // Move literals with the highest decision level to the front. This normalizes the
        // analyzer output regardless of the hash set iteration order.
        let level_of = |literal: Literal| {
            trail
                .decision_level_of(literal.variable())
                .expect("learned clause literals are assigned")
        };
        clause.sort_by(|&lhs, &rhs| {
            level_of(rhs)
                .cmp(&level_of(lhs))
                .then_with(|| lhs.variable().ordinal().cmp(&rhs.variable().ordinal()))
        });
        calabash_assert_moderate!(evaluate_clause(trail.model::<bool>(), &clause) == Some(false));

        if self.num_top_level >= 2 {
            // the clause is a semantic split
            calabash_assert_simple!(
                self.top_level >= 1,
                "a semantic split cannot occur at decision level 0"
            );
            return (clause, self.top_level - 1);
        }

        let level = if clause.len() <= 1 {
            0
        } else {
            level_of(clause[1])
        };
        (clause, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Variable;
    use crate::clause;

    fn bool_var(ordinal: u32) -> Variable {
        Variable::new(VariableKind::Boolean, ordinal)
    }

    fn lit(ordinal: u32) -> Literal {
        Literal::new(ordinal)
    }

    fn trail_with_bool_variables(num_variables: usize) -> Trail {
        let mut trail = Trail::default();
        trail.resize(VariableKind::Boolean, num_variables);
        trail
    }

    fn analyze(db: &ClauseDatabase, trail: &Trail, conflict: Clause) -> (Clause, usize) {
        ConflictAnalyzer::default().analyze(db, trail, conflict, |_| {})
    }

    #[test]
    fn resolve_propagated_literal() {
        let mut db = ClauseDatabase::default();
        let reason = db.assert_clause(clause![lit(0), lit(1), lit(2)]);

        let mut trail = trail_with_bool_variables(10);

        trail.decide(bool_var(0));
        trail.model_mut::<bool>().set_value(0, false);

        trail.decide(bool_var(1));
        trail.model_mut::<bool>().set_value(1, false);

        trail.propagate(bool_var(2), Some(reason), trail.decision_level());
        trail.model_mut::<bool>().set_value(2, true);

        let (learned, level) = analyze(&db, &trail, clause![lit(0), lit(1), !lit(2)]);
        assert_eq!(level, 1);
        assert_eq!(learned, clause![lit(1), lit(0)]);
    }

    #[test]
    fn add_literals_to_conflict_during_resolution() {
        let mut db = ClauseDatabase::default();
        let first = db.assert_clause(clause![lit(0), lit(1), !lit(2)]);
        let second = db.assert_clause(clause![lit(0), lit(2), lit(3)]);

        let mut trail = trail_with_bool_variables(10);

        trail.decide(bool_var(0));
        trail.model_mut::<bool>().set_value(0, false);

        trail.decide(bool_var(1));
        trail.model_mut::<bool>().set_value(1, false);

        trail.propagate(bool_var(2), Some(first), trail.decision_level());
        trail.model_mut::<bool>().set_value(2, false);

        trail.propagate(bool_var(3), Some(second), trail.decision_level());
        trail.model_mut::<bool>().set_value(3, true);

        let (learned, level) = analyze(&db, &trail, clause![lit(2), !lit(3)]);
        assert_eq!(level, 1);
        assert_eq!(learned, clause![lit(2), lit(0)]);
    }

    #[test]
    fn derive_a_unit_conflict_clause() {
        let mut db = ClauseDatabase::default();
        let first = db.assert_clause(clause![lit(0), lit(1)]);
        let second = db.assert_clause(clause![lit(0), lit(2)]);

        let mut trail = trail_with_bool_variables(10);

        trail.decide(bool_var(0));
        trail.model_mut::<bool>().set_value(0, false);

        trail.propagate(bool_var(1), Some(first), trail.decision_level());
        trail.model_mut::<bool>().set_value(1, true);

        trail.propagate(bool_var(2), Some(second), trail.decision_level());
        trail.model_mut::<bool>().set_value(2, true);

        let (learned, level) = analyze(&db, &trail, clause![!lit(1), !lit(2)]);
        assert_eq!(level, 0);
        assert_eq!(learned, clause![lit(0)]);
    }

    #[test]
    fn derive_an_empty_clause() {
        let mut db = ClauseDatabase::default();
        let first = db.assert_clause(clause![lit(0)]);
        let second = db.assert_clause(clause![!lit(0), lit(1)]);
        let third = db.assert_clause(clause![!lit(0), !lit(1), lit(2)]);

        let mut trail = trail_with_bool_variables(10);

        trail.propagate(bool_var(0), Some(first), 0);
        trail.model_mut::<bool>().set_value(0, true);

        trail.propagate(bool_var(1), Some(second), 0);
        trail.model_mut::<bool>().set_value(1, true);

        trail.propagate(bool_var(2), Some(third), 0);
        trail.model_mut::<bool>().set_value(2, true);

        let (learned, level) = analyze(&db, &trail, clause![!lit(2)]);
        assert_eq!(level, 0);
        assert!(learned.is_empty());
    }

    #[test]
    fn derive_a_semantic_split_clause() {
        let mut db = ClauseDatabase::default();
        let reason = db.assert_clause(clause![!lit(0), !lit(1), lit(2)]);

        let mut trail = trail_with_bool_variables(10);

        trail.decide(bool_var(7));
        trail.model_mut::<bool>().set_value(7, false);

        // semantic propagations have no reason clause
        trail.propagate(bool_var(0), None, trail.decision_level());
        trail.model_mut::<bool>().set_value(0, true);

        trail.propagate(bool_var(1), None, trail.decision_level());
        trail.model_mut::<bool>().set_value(1, true);

        trail.propagate(bool_var(2), Some(reason), trail.decision_level());
        trail.model_mut::<bool>().set_value(2, true);

        let (learned, level) = analyze(&db, &trail, clause![!lit(0), !lit(1), !lit(2)]);
        assert_eq!(level, 0);
        assert_eq!(learned, clause![!lit(0), !lit(1)]);
    }

    #[test]
    fn resolvents_are_reported_through_the_callback() {
        let mut db = ClauseDatabase::default();
        let reason = db.assert_clause(clause![lit(0), lit(1)]);

        let mut trail = trail_with_bool_variables(10);

        trail.decide(bool_var(0));
        trail.model_mut::<bool>().set_value(0, false);

        trail.propagate(bool_var(1), Some(reason), trail.decision_level());
        trail.model_mut::<bool>().set_value(1, true);

        let mut resolved = Vec::new();
        let _ = ConflictAnalyzer::default().analyze(
            &db,
            &trail,
            clause![lit(0), !lit(1)],
            |clause| resolved.push(clause.clone()),
        );

        assert_eq!(resolved, vec![clause![lit(0), lit(1)]]);
    }
}
