use enumset::enum_set;
use enumset::EnumSet;

use crate::basic_types::Clause;
use crate::basic_types::ClauseRef;
use crate::basic_types::Literal;
use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::calabash_assert_moderate;
use crate::calabash_assert_simple;
use crate::containers::LiteralMap;
use crate::engine::model::evaluate;
use crate::engine::model::evaluate_clause;
use crate::engine::model::Model;
use crate::engine::theory::Theory;
use crate::engine::trail::TrailEntry;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// The mandatory Boolean theory: exhaustive unit propagation over the clauses in the database
/// using the two-watched-literal scheme.
///
/// The watched literals of a clause are kept at positions 0 and 1. Whenever a watched literal
/// is falsified the watch is moved to a non-falsified literal; if no such literal exists the
/// clause is either unit (and its remaining literal is propagated) or false (and reported as a
/// conflict).
///
/// Each propagation round only scans the assignments added to the current decision level since
/// the previous round; the skip counter is reset when the solver backtracks.
#[derive(Default, Debug)]
pub struct BoolTheory {
    /// Map literal -> list of clauses in which it is watched.
    watched: LiteralMap<Vec<WatchedClause>>,
    /// Stack of true literals to process, with the reason clause and decision level of each.
    satisfied: Vec<(Literal, Option<ClauseRef>, usize)>,
    /// Decision level of the last scan, or [`None`] to force a full scan of the current level.
    scanned_level: Option<usize>,
    /// Number of assignments of `scanned_level` that have already been scanned.
    next_index: usize,
}

/// A clause watched by some literal together with the next position to check when the watch
/// has to be moved.
#[derive(Clone, Copy, Debug)]
struct WatchedClause {
    clause: ClauseRef,
    index: usize,
}

impl WatchedClause {
    fn new(clause: ClauseRef, clause_len: usize) -> WatchedClause {
        WatchedClause {
            clause,
            index: 2.min(clause_len),
        }
    }
}

impl Theory for BoolTheory {
    fn name(&self) -> &str {
        "BoolTheory"
    }

    fn owned_kinds(&self) -> EnumSet<VariableKind> {
        enum_set!(VariableKind::Boolean)
    }

    fn propagate(&mut self, db: &mut ClauseDatabase, trail: &mut Trail) -> Vec<Clause> {
        self.satisfied.clear();
        self.initialize(db, trail);

        let mut conflict = None;
        while conflict.is_none() {
            let Some((literal, reason, level)) = self.satisfied.pop() else {
                break;
            };

            // propagate the literal if necessary
            let ordinal = literal.variable().ordinal();
            if reason.is_some() && !trail.model::<bool>().is_defined(ordinal) {
                trail
                    .model_mut::<bool>()
                    .set_value(ordinal, !literal.is_negative());
                trail.propagate(literal.variable(), reason, level);
            }
            calabash_assert_moderate!(evaluate(trail.model::<bool>(), literal) == Some(true));

            conflict = self.falsified(db, trail, !literal);
        }
        conflict.into_iter().collect()
    }

    fn decide(&mut self, _db: &mut ClauseDatabase, trail: &mut Trail, variable: Variable) {
        calabash_assert_simple!(variable.kind() == VariableKind::Boolean);

        trail.model_mut::<bool>().set_value(variable.ordinal(), true);
        trail.decide(variable);
    }

    fn on_variable_resize(&mut self, kind: VariableKind, num_variables: usize) {
        if kind == VariableKind::Boolean {
            self.watched.resize(2 * num_variables, Vec::new());
        }
    }

    fn on_learned_clause(&mut self, db: &ClauseDatabase, _trail: &Trail, learned: ClauseRef) {
        // watch the first two literals in the learned clause
        let clause = db.get(learned);
        self.watched[clause[0]].push(WatchedClause::new(learned, clause.len()));
        if clause.len() > 1 {
            self.watched[clause[1]].push(WatchedClause::new(learned, clause.len()));
        }
    }

    fn on_before_backtrack(&mut self, _db: &ClauseDatabase, _trail: &Trail, _level: usize) {
        // make the next scan cover the whole target level
        self.scanned_level = None;
        self.next_index = 0;
    }
}

impl BoolTheory {
    /// Queue the Boolean literals newly assigned in `trail`. On a fresh trail this also
    /// (re)builds the watch lists from the database and queues the unit clauses for
    /// propagation.
    fn initialize(&mut self, db: &ClauseDatabase, trail: &Trail) {
        let model = trail.model::<bool>();

        // allocate space for new variables if necessary
        if self.watched.len() < 2 * model.num_variables() {
            self.watched.resize(2 * model.num_variables(), Vec::new());
        }

        if trail.is_empty() {
            for watchlist in self.watched.iter_mut() {
                watchlist.clear();
            }

            for (clause_ref, clause) in db.refs() {
                if clause.len() == 1 {
                    // propagate unit clauses
                    self.watched[clause[0]].push(WatchedClause::new(clause_ref, 1));
                    self.satisfied.push((clause[0], Some(clause_ref), 0));
                } else {
                    self.watched[clause[0]].push(WatchedClause::new(clause_ref, clause.len()));
                    self.watched[clause[1]].push(WatchedClause::new(clause_ref, clause.len()));
                }
            }
        }

        for entry in self.newly_assigned(trail) {
            let variable = entry.variable();
            if variable.kind() == VariableKind::Boolean {
                let literal = if model.value(variable.ordinal()) == Some(&true) {
                    Literal::of(variable)
                } else {
                    !Literal::of(variable)
                };
                self.satisfied
                    .push((literal, entry.source().reason(), entry.decision_level()));
            }
        }
    }

    /// Get the assignments at the current decision level which have not been scanned yet.
    ///
    /// Assignments the theory makes while draining its own queue are picked up by the next
    /// call. [`BoolTheory::on_before_backtrack`] resets the skip counter, so the first scan
    /// after backtracking covers the whole target level again.
    fn newly_assigned<'trail>(&mut self, trail: &'trail Trail) -> &'trail [TrailEntry] {
        let level = trail.decision_level();
        let skip = if self.scanned_level == Some(level) {
            self.next_index
        } else {
            0
        };
        self.scanned_level = Some(level);
        self.next_index = trail.assigned(level).len();
        &trail.assigned(level)[skip..]
    }

    /// Move the watches away from the recently falsified literal `falsified_literal`.
    ///
    /// If some clause becomes unit, its asserting literal is queued for propagation. If some
    /// clause becomes false, a copy of that clause is returned.
    fn falsified(
        &mut self,
        db: &mut ClauseDatabase,
        trail: &Trail,
        falsified_literal: Literal,
    ) -> Option<Clause> {
        calabash_assert_moderate!(
            evaluate(trail.model::<bool>(), falsified_literal) == Some(false)
        );

        // The list is detached while we process it; replacement watches always target other
        // literals, so nothing is pushed to this list in the meantime.
        let mut watchlist = std::mem::take(&mut self.watched[falsified_literal]);
        let mut conflict = None;

        let mut index = 0;
        while index < watchlist.len() {
            let clause_ref = watchlist[index].clause;

            if db.get(clause_ref).len() == 1 {
                // the clause has just become empty
                conflict = Some(db.get(clause_ref).clone());
                break;
            }

            // move the falsified literal to the second watched position
            {
                let clause = db.get_mut(clause_ref);
                if clause[0] == falsified_literal {
                    clause.swap(0, 1);
                }
            }
            calabash_assert_moderate!(db.get(clause_ref)[1] == falsified_literal);

            // skip satisfied clauses
            if evaluate(trail.model::<bool>(), db.get(clause_ref)[0]) == Some(true) {
                index += 1;
                continue;
            }

            if self.replace_second_watch(db, trail, &mut watchlist[index]) {
                let _ = watchlist.swap_remove(index);
            } else {
                // `falsified_literal` is still a watched literal in the clause
                index += 1;
                if evaluate(trail.model::<bool>(), db.get(clause_ref)[0]) == Some(false) {
                    calabash_assert_moderate!(
                        evaluate_clause(trail.model::<bool>(), db.get(clause_ref)) == Some(false)
                    );
                    conflict = Some(db.get(clause_ref).clone());
                    break;
                }
            }

            let clause = db.get(clause_ref);
            if self.is_unit(trail.model::<bool>(), clause) {
                calabash_assert_moderate!(
                    evaluate(trail.model::<bool>(), clause[0]).is_none()
                );
                let level = if clause.len() > 1 {
                    trail
                        .decision_level_of(clause[1].variable())
                        .expect("a falsified watched literal is assigned")
                } else {
                    trail.decision_level()
                };
                self.satisfied.push((clause[0], Some(clause_ref), level));
            }
        }

        self.watched[falsified_literal] = watchlist;
        conflict
    }

    /// Try to replace the second watched literal of the clause in `watch` with a non-falsified
    /// literal. Returns true iff the watch has been moved to another literal.
    fn replace_second_watch(
        &mut self,
        db: &mut ClauseDatabase,
        trail: &Trail,
        watch: &mut WatchedClause,
    ) -> bool {
        let clause_ref = watch.clause;
        let clause_len = db.get(clause_ref).len();

        calabash_assert_moderate!(clause_len >= 2);
        calabash_assert_moderate!(
            evaluate(trail.model::<bool>(), db.get(clause_ref)[1]) == Some(false)
        );
        calabash_assert_moderate!(
            evaluate(trail.model::<bool>(), db.get(clause_ref)[0]) != Some(true)
        );

        if clause_len <= 2 {
            return false;
        }

        calabash_assert_moderate!(2 <= watch.index && watch.index < clause_len);
        let end = watch.index;
        loop {
            // check if the next literal is non-falsified
            let candidate = db.get(clause_ref)[watch.index];
            if evaluate(trail.model::<bool>(), candidate) != Some(false) {
                let position = watch.index;
                db.get_mut(clause_ref).swap(1, position);
                self.watched[candidate].push(*watch);
                return true;
            }

            // move to the next literal, skipping the watched positions
            watch.index += 1;
            if watch.index >= clause_len {
                watch.index = 2;
            }
            if watch.index == end {
                break;
            }
        }

        // The second literal has not been replaced. Make sure that the assigned, watched
        // literal has the highest decision level. It is not guaranteed that the second literal
        // is the newest one because theories can retroactively propagate literals at lower
        // levels.
        let mut top_position = 1;
        let mut top_level = trail
            .decision_level_of(db.get(clause_ref)[1].variable())
            .expect("a falsified literal is assigned");
        for position in 2..clause_len {
            let other_level = trail
                .decision_level_of(db.get(clause_ref)[position].variable())
                .expect("all candidate literals are falsified");
            if other_level > top_level {
                top_position = position;
                top_level = other_level;
            }
        }

        let mut replaced = false;
        if top_position != 1 {
            // start watching the literal at the highest decision level
            let top_literal = db.get(clause_ref)[top_position];
            self.watched[top_literal].push(*watch);
            db.get_mut(clause_ref).swap(top_position, 1);
            replaced = true;
        }

        // order the watched literals by decision level
        let front_level = trail
            .decision_level_of(db.get(clause_ref)[0].variable())
            .unwrap_or(top_level);
        if front_level < top_level {
            db.get_mut(clause_ref).swap(0, 1);
        }
        replaced
    }

    fn is_unit(&self, model: &Model<bool>, clause: &Clause) -> bool {
        if clause.is_empty() {
            return false;
        }
        clause.len() == 1 || evaluate(model, clause[1]) == Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause;

    fn bool_var(ordinal: u32) -> Variable {
        Variable::new(VariableKind::Boolean, ordinal)
    }

    fn lit(ordinal: u32) -> Literal {
        Literal::new(ordinal)
    }

    fn setup(num_variables: usize) -> (BoolTheory, ClauseDatabase, Trail) {
        let mut theory = BoolTheory::default();
        theory.on_variable_resize(VariableKind::Boolean, num_variables);

        let mut trail = Trail::default();
        trail.resize(VariableKind::Boolean, num_variables);

        (theory, ClauseDatabase::default(), trail)
    }

    #[test]
    fn unit_clauses_are_propagated_at_level_zero() {
        let (mut theory, mut db, mut trail) = setup(2);
        let unit = db.assert_clause(clause![lit(0)]);

        let conflicts = theory.propagate(&mut db, &mut trail);

        assert!(conflicts.is_empty());
        assert_eq!(trail.decision_level_of(bool_var(0)), Some(0));
        assert_eq!(trail.reason(bool_var(0)), Some(unit));
        assert_eq!(evaluate(trail.model::<bool>(), lit(0)), Some(true));
    }

    #[test]
    fn a_decision_triggers_unit_propagation() {
        let (mut theory, mut db, mut trail) = setup(2);
        let binary = db.assert_clause(clause![!lit(0), lit(1)]);

        // build the watch lists on the empty trail
        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());

        theory.decide(&mut db, &mut trail, bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);

        assert!(conflicts.is_empty());
        assert_eq!(evaluate(trail.model::<bool>(), lit(1)), Some(true));
        assert_eq!(trail.reason(bool_var(1)), Some(binary));
        assert_eq!(trail.decision_level_of(bool_var(1)), Some(1));
    }

    #[test]
    fn contradicting_unit_clauses_are_a_conflict() {
        let (mut theory, mut db, mut trail) = setup(1);
        let _ = db.assert_clause(clause![lit(0)]);
        let _ = db.assert_clause(clause![!lit(0)]);

        let conflicts = theory.propagate(&mut db, &mut trail);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].len(), 1);
        assert_eq!(trail.decision_level(), 0);
    }

    #[test]
    fn a_falsified_clause_is_reported_as_a_conflict() {
        let (mut theory, mut db, mut trail) = setup(2);
        let _ = db.assert_clause(clause![lit(0), lit(1)]);
        let _ = db.assert_clause(clause![lit(0), !lit(1)]);

        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());

        // falsifying b0 propagates b1 from the first clause and falsifies the second
        trail.model_mut::<bool>().set_value(0, false);
        trail.decide(bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            evaluate_clause(trail.model::<bool>(), &conflicts[0]),
            Some(false)
        );
    }

    #[test]
    fn watches_move_to_unassigned_literals() {
        let (mut theory, mut db, mut trail) = setup(3);
        let _ = db.assert_clause(clause![lit(0), lit(1), lit(2)]);

        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());

        // falsify the first watch; the clause must not become unit
        trail.model_mut::<bool>().set_value(0, false);
        trail.decide(bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);

        assert!(conflicts.is_empty());
        assert!(!trail.model::<bool>().is_defined(1));
        assert!(!trail.model::<bool>().is_defined(2));

        // falsify the second watch; now the clause is unit
        trail.model_mut::<bool>().set_value(1, false);
        trail.decide(bool_var(1));
        let conflicts = theory.propagate(&mut db, &mut trail);

        assert!(conflicts.is_empty());
        assert_eq!(evaluate(trail.model::<bool>(), lit(2)), Some(true));
    }

    #[test]
    fn a_round_scans_only_the_assignments_added_since_the_previous_round() {
        let (mut theory, mut db, mut trail) = setup(2);
        let _ = db.assert_clause(clause![!lit(0), lit(1)]);

        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());
        assert_eq!(theory.scanned_level, Some(0));

        theory.decide(&mut db, &mut trail, bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());
        assert_eq!(theory.scanned_level, Some(1));

        // the next round picks up the propagation of b1 and leaves nothing to scan behind
        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());
        assert_eq!(theory.next_index, trail.assigned(1).len());
    }

    #[test]
    fn backtracking_resets_the_scan_to_the_whole_target_level() {
        let (mut theory, mut db, mut trail) = setup(2);
        let _ = db.assert_clause(clause![!lit(0), lit(1)]);

        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());

        theory.decide(&mut db, &mut trail, bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());
        assert!(trail.model::<bool>().is_defined(1));

        // the solver announces the backtrack before truncating the trail
        theory.on_before_backtrack(&db, &trail, 0);
        trail.backtrack(0);
        assert_eq!(theory.scanned_level, None);

        // a fresh decision opening the same level is scanned in full again
        theory.decide(&mut db, &mut trail, bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());
        assert!(trail.model::<bool>().is_defined(1));
    }

    #[test]
    fn learned_clauses_are_watched() {
        let (mut theory, mut db, mut trail) = setup(2);
        let _ = db.assert_clause(clause![lit(0), lit(1)]);

        let conflicts = theory.propagate(&mut db, &mut trail);
        assert!(conflicts.is_empty());

        let learned = db.learn_clause(clause![!lit(0), lit(1)]);
        theory.on_learned_clause(&db, &trail, learned);

        theory.decide(&mut db, &mut trail, bool_var(0));
        let conflicts = theory.propagate(&mut db, &mut trail);

        assert!(conflicts.is_empty());
        assert_eq!(trail.reason(bool_var(1)), Some(learned));
    }
}
