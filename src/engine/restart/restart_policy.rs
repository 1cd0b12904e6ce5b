use crate::basic_types::ClauseRef;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// Decides when the solver should restart, i.e. clear the trail back to decision level 0 while
/// keeping the learned clauses.
///
/// The policy is queried after each conflict-learn cycle and is fed the learned-clause and
/// restart events so that it can update its counters.
pub trait RestartPolicy {
    /// Check whether the solver should restart.
    fn should_restart(&self) -> bool;

    /// Called when a new clause is learned and added to the database.
    fn on_learned_clause(&mut self, _db: &ClauseDatabase, _trail: &Trail, _learned: ClauseRef) {}

    /// Called after each restart, once the trail has been truncated.
    fn on_restart(&mut self, _db: &ClauseDatabase, _trail: &Trail) {}
}

/// A policy which never restarts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRestart;

impl RestartPolicy for NoRestart {
    fn should_restart(&self) -> bool {
        false
    }
}
