mod helpers;

use calabash_solver::clause;
use calabash_solver::BoolTheory;
use calabash_solver::Clause;
use calabash_solver::ClauseDatabase;
use calabash_solver::ClauseRef;
use calabash_solver::RestartPolicy;
use calabash_solver::SmtSolver;
use calabash_solver::SolverResult;
use calabash_solver::Theory;
use calabash_solver::Trail;
use calabash_solver::Variable;
use calabash_solver::VariableKind;
use enumset::EnumSet;
use helpers::lit;

/// Requests a single restart immediately after the first clause is learned.
#[derive(Default)]
struct RestartAfterFirstLearn {
    armed: bool,
    restarted: bool,
}

impl RestartPolicy for RestartAfterFirstLearn {
    fn should_restart(&self) -> bool {
        self.armed && !self.restarted
    }

    fn on_learned_clause(&mut self, _db: &ClauseDatabase, _trail: &Trail, _learned: ClauseRef) {
        self.armed = true;
    }

    fn on_restart(&mut self, _db: &ClauseDatabase, _trail: &Trail) {
        self.restarted = true;
    }
}

/// Observes the backtrack and restart events; it owns no variable kind and never propagates.
#[derive(Default)]
struct ProbeTheory {
    /// `(level, trail_size)` at each `on_before_backtrack` event.
    before_backtrack: Vec<(usize, usize)>,
    /// Trail size at each `on_restart` event.
    on_restart: Vec<usize>,
}

impl Theory for ProbeTheory {
    fn name(&self) -> &str {
        "ProbeTheory"
    }

    fn owned_kinds(&self) -> EnumSet<VariableKind> {
        EnumSet::empty()
    }

    fn propagate(&mut self, _db: &mut ClauseDatabase, _trail: &mut Trail) -> Vec<Clause> {
        Vec::new()
    }

    fn decide(&mut self, _db: &mut ClauseDatabase, _trail: &mut Trail, _variable: Variable) {
        unreachable!("the probe owns no variable kind");
    }

    fn on_before_backtrack(&mut self, _db: &ClauseDatabase, trail: &Trail, level: usize) {
        self.before_backtrack.push((level, trail.size()));
    }

    fn on_restart(&mut self, _db: &ClauseDatabase, trail: &Trail) {
        self.on_restart.push(trail.size());
    }
}

#[test]
fn a_restart_clears_the_trail_but_keeps_the_learned_clause() {
    let mut solver = SmtSolver::default();
    solver.add_theory(BoolTheory::default());
    solver.add_theory(ProbeTheory::default());
    solver.set_restart_policy(RestartAfterFirstLearn::default());
    solver.resize_variables(VariableKind::Boolean, 3);

    // deciding b0 propagates b1 and b2 and then fails, learning the unit clause (not b0)
    let _ = solver.assert_clause(clause![!lit(0), lit(1)]);
    let _ = solver.assert_clause(clause![!lit(1), lit(2)]);
    let _ = solver.assert_clause(clause![!lit(0), !lit(2)]);

    assert_eq!(solver.check(), SolverResult::Sat);
    assert_eq!(solver.statistics().num_restarts, 1);

    let probe = solver
        .theory_mut::<ProbeTheory>()
        .expect("the probe is registered");

    // the backtrack notification targeted level 0 and fired before the trail was truncated
    let (level, trail_size) = probe.before_backtrack[0];
    assert_eq!(level, 0);
    assert!(trail_size > 0);

    // on_restart fired after the truncation
    assert_eq!(probe.on_restart, vec![0]);

    // the learned clause survived the restart and still propagates after it
    assert_eq!(solver.database().learned(), &[clause![!lit(0)]]);
    assert_eq!(
        calabash_solver::evaluate(solver.trail().model::<bool>(), !lit(0)),
        Some(true)
    );
    assert_eq!(solver.trail().decision_level_of(helpers::bool_var(0)), Some(0));
}
