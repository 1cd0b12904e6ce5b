/// A set of counters updated during the search.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStatistics {
    /// The number of propagation rounds which ended in a conflict.
    pub num_conflicts: u64,
    /// The number of raw conflict clauses passed to conflict analysis.
    pub num_conflict_clauses: u64,
    /// The number of clauses added to the learned partition of the database.
    pub num_learned_clauses: u64,
    /// The number of decisions made by the search driver.
    pub num_decisions: u64,
    /// The number of restarts.
    pub num_restarts: u64,
    /// The number of backtracks (restarts not included).
    pub num_backtracks: u64,
}
