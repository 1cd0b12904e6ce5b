//! Houses the solver which drives the MCSat search: a trail of Boolean and semantic
//! assignments, pluggable theories, clause learning and the MCSat backtrack policy.
use enumset::EnumSet;
use itertools::Itertools;

use crate::basic_types::Clause;
use crate::basic_types::ClauseRef;
use crate::basic_types::SolverResult;
use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::branching::FirstUnassigned;
use crate::branching::VariableOrder;
use crate::calabash_assert_advanced;
use crate::calabash_assert_moderate;
use crate::calabash_assert_simple;
use crate::engine::conflict_analysis::ConflictAnalyzer;
use crate::engine::conflict_analysis::SubsumptionMinimiser;
use crate::engine::model::evaluate;
use crate::engine::restart::NoRestart;
use crate::engine::restart::RestartPolicy;
use crate::engine::theory::Theory;
use crate::engine::theory::TheoryDispatcher;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;
use crate::statistics::MetricsSink;
use crate::statistics::SearchStatistics;

/// Options for the [`SmtSolver`] which determine how it behaves.
#[derive(Debug, Default)]
pub struct SmtSolverOptions {
    /// The sink search events are logged to; the default sink discards all records.
    pub metrics: MetricsSink,
}

/// A solver which searches for a model of a set of clauses over Boolean and theory variables
/// using the MCSat (Model-Constructing Satisfiability, see \[1\]) paradigm.
///
/// Both Boolean and semantic (theory) assignments live on a single [`Trail`]. Registered
/// [`Theory`] plugins propagate consequences of the trail and report conflict clauses; the
/// [`ConflictAnalyzer`] turns a conflict into a learned clause which either becomes unit after
/// backtracking (a UIP clause) or forces a fresh decision on one of its top-level literals (a
/// *semantic split* clause). The latter case is what distinguishes MCSat from plain CDCL: when
/// a semantic variable participates in the conflict, Boolean resolution cannot close it, and
/// the solver has to re-enter a decision instead of a propagation for its termination argument
/// to hold.
///
/// # Practical
/// A Boolean theory (see [`crate::BoolTheory`]) is mandatory; further theories, the
/// [`VariableOrder`] and the [`RestartPolicy`] are chosen by the embedder. Input clauses are
/// asserted through [`SmtSolver::assert_clause`] and the search is started with
/// [`SmtSolver::check`]. After a [`SolverResult::Sat`] outcome the models of the trail hold a
/// satisfying assignment.
///
/// # Bibliography
/// \[1\] L. de Moura and D. Jovanović, ‘A model-constructing satisfiability calculus’, in
/// International Workshop on Verification, Model Checking, and Abstract Interpretation, 2013,
/// pp. 1–12.
pub struct SmtSolver {
    /// The trail of assignments together with the per-kind models.
    trail: Trail,
    /// Owns the input and learned clauses.
    database: ClauseDatabase,
    /// The registered theories, invoked in registration order.
    dispatcher: TheoryDispatcher,
    /// Derives learned clauses from raw conflict clauses.
    analyzer: ConflictAnalyzer,
    /// Shrinks learned clauses by self-subsumption against the trail.
    minimiser: SubsumptionMinimiser,
    /// Dictates the order in which variables are decided.
    variable_order: Box<dyn VariableOrder>,
    /// Decides when to restart instead of backtracking.
    restart_policy: Box<dyn RestartPolicy>,
    /// The sink search events are logged to.
    metrics: MetricsSink,
    /// A set of counters updated during the search.
    counters: SearchStatistics,
}

impl Default for SmtSolver {
    fn default() -> Self {
        SmtSolver::new(SmtSolverOptions::default())
    }
}

impl std::fmt::Debug for SmtSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtSolver")
            .field("trail", &self.trail)
            .field("database", &self.database)
            .field("dispatcher", &self.dispatcher)
            .field("counters", &self.counters)
            .finish()
    }
}

// methods that offer basic functionality
impl SmtSolver {
    pub fn new(options: SmtSolverOptions) -> SmtSolver {
        SmtSolver {
            trail: Trail::default(),
            database: ClauseDatabase::default(),
            dispatcher: TheoryDispatcher::default(),
            analyzer: ConflictAnalyzer::default(),
            minimiser: SubsumptionMinimiser::default(),
            variable_order: Box::new(FirstUnassigned),
            restart_policy: Box::new(NoRestart),
            metrics: options.metrics,
            counters: SearchStatistics::default(),
        }
    }

    /// Register `theory` behind all previously registered theories.
    pub fn add_theory(&mut self, theory: impl Theory + 'static) {
        self.dispatcher.add_theory(theory);
    }

    /// Get the first registered theory of the concrete type `Concrete`.
    pub fn theory_mut<Concrete: Theory>(&mut self) -> Option<&mut Concrete> {
        self.dispatcher.theory_mut::<Concrete>()
    }

    pub fn set_variable_order(&mut self, variable_order: impl VariableOrder + 'static) {
        self.variable_order = Box::new(variable_order);
    }

    pub fn set_restart_policy(&mut self, restart_policy: impl RestartPolicy + 'static) {
        self.restart_policy = Box::new(restart_policy);
    }

    /// Change the number of variables of kind `kind`.
    ///
    /// Variables are pre-allocated before the search starts; the registered theories are told
    /// the final counts when [`SmtSolver::check`] initializes the search.
    pub fn resize_variables(&mut self, kind: VariableKind, num_variables: usize) {
        self.trail.resize(kind, num_variables);
    }

    /// Add a clause to the input formula.
    pub fn assert_clause(&mut self, clause: impl Into<Clause>) -> ClauseRef {
        self.database.assert_clause(clause)
    }

    /// Get the current trail (partial model).
    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Get the current trail (partial model).
    pub fn trail_mut(&mut self) -> &mut Trail {
        &mut self.trail
    }

    /// Get the clause database used in [`SmtSolver::check`].
    pub fn database(&self) -> &ClauseDatabase {
        &self.database
    }

    /// Get the clause database used in [`SmtSolver::check`].
    pub fn database_mut(&mut self) -> &mut ClauseDatabase {
        &mut self.database
    }

    /// Get the counters of the last [`SmtSolver::check`].
    pub fn statistics(&self) -> &SearchStatistics {
        &self.counters
    }

    /// Get the metrics sink, e.g. to close it explicitly.
    pub fn metrics_mut(&mut self) -> &mut MetricsSink {
        &mut self.metrics
    }
}

// methods that serve as the main building blocks of the search
impl SmtSolver {
    /// Check satisfiability of the asserted clauses.
    pub fn check(&mut self) -> SolverResult {
        self.init();

        loop {
            let conflicts = self.propagate();
            if !conflicts.is_empty() {
                self.counters.num_conflicts += 1;

                if self.trail.decision_level() == 0 {
                    self.log_search_end();
                    return SolverResult::Unsat;
                }

                let (learned, level) = self.analyze_conflicts(conflicts);
                if learned.iter().any(|clause| clause.is_empty()) {
                    self.log_search_end();
                    return SolverResult::Unsat;
                }

                let refs = self.learn(learned);
                if self.restart_policy.should_restart() {
                    self.restart();
                } else {
                    self.backtrack_with(&refs, level);
                }
            } else {
                let Some(variable) = self.variable_order.pick(&self.database, &self.trail)
                else {
                    // all variables are assigned without a conflict
                    self.log_search_end();
                    return SolverResult::Sat;
                };
                self.decide(variable);
            }
        }
    }

    /// Reset the solver state for a new check and tell all collaborators the current variable
    /// counts per kind.
    fn init(&mut self) {
        calabash_assert_simple!(
            self.dispatcher.owns_kind(VariableKind::Boolean),
            "a Boolean theory has to be registered before the search starts"
        );

        for kind in EnumSet::<VariableKind>::all().iter() {
            let num_variables = self.trail.num_variables(kind);
            self.dispatcher.on_variable_resize(kind, num_variables);
            self.variable_order.on_variable_resize(kind, num_variables);
            self.minimiser.on_variable_resize(kind, num_variables);
        }

        self.counters = SearchStatistics::default();
        self.dispatcher.on_init(&self.database, &self.trail);
    }

    /// Ask the theories to propagate over the current trail; returns the conflict clauses
    /// discovered in the final propagation round.
    fn propagate(&mut self) -> Vec<Clause> {
        self.metrics.log_core_before_propagation(
            self.trail.decision_level(),
            self.trail.size(),
            self.counters.num_decisions,
            self.counters.num_conflicts,
        );

        let conflicts = self
            .dispatcher
            .propagate(&mut self.database, &mut self.trail);

        self.metrics.log_core_after_propagation(
            self.trail.decision_level(),
            self.trail.size(),
            conflicts.len(),
        );
        conflicts
    }

    /// Run the analyzer on every raw conflict and keep the derived clauses with the lowest
    /// backtrack level.
    fn analyze_conflicts(&mut self, conflicts: Vec<Clause>) -> (Vec<Clause>, usize) {
        self.metrics.log_core_conflict_analysis_start(
            self.trail.size(),
            self.trail.decision_level(),
            conflicts.len(),
        );

        let SmtSolver {
            trail,
            database,
            dispatcher,
            analyzer,
            minimiser,
            variable_order,
            counters,
            ..
        } = self;
        let database: &ClauseDatabase = database;
        let trail: &Trail = trail;

        let mut learned: Vec<Clause> = Vec::new();
        let mut level = usize::MAX;
        for conflict in conflicts {
            counters.num_conflict_clauses += 1;

            // derive a clause suitable for backtracking
            let (mut clause, clause_level) =
                analyzer.analyze(database, trail, conflict, |resolvent| {
                    dispatcher.on_conflict_resolved(database, trail, resolvent);
                    variable_order.on_conflict_resolved(database, trail, resolvent);
                });

            if !clause.is_empty() {
                minimiser.minimise(database, trail, &mut clause);
            }

            // keep all derived clauses at the lowest backtrack level
            if clause_level < level {
                level = clause_level;
                learned.clear();
                learned.push(clause);
            } else if clause_level == level {
                learned.push(clause);
            }
        }

        self.metrics.log_core_conflict_analysis_end(
            learned.len(),
            level,
            self.trail.decision_level(),
        );
        (learned, level)
    }

    /// Add the derived clauses to the database and return their references.
    ///
    /// Duplicates are removed, and if any UIP clause is present all semantic split clauses are
    /// dropped (a propagation is preferred over a fresh decision).
    fn learn(&mut self, clauses: Vec<Clause>) -> Vec<ClauseRef> {
        // remove duplicate clauses
        let mut clauses: Vec<Clause> = clauses
            .into_iter()
            .sorted_by(|lhs, rhs| {
                lhs.len()
                    .cmp(&rhs.len())
                    .then_with(|| lhs.literals().cmp(rhs.literals()))
            })
            .dedup()
            .collect();

        // prefer UIP clauses over semantic split clauses
        if clauses.iter().any(|clause| !self.is_semantic_split(clause)) {
            clauses.retain(|clause| !self.is_semantic_split(clause));
        }

        let mut refs = Vec::with_capacity(clauses.len());
        for clause in clauses {
            self.counters.num_learned_clauses += 1;
            let is_semantic = self.is_semantic_split(&clause);
            let clause_len = clause.len();

            let learned_ref = self.database.learn_clause(clause);

            self.metrics.log_core_learned_clause(
                clause_len,
                self.trail.decision_level(),
                self.trail.size(),
                self.counters.num_learned_clauses,
                is_semantic,
            );
            self.dispatcher
                .on_learned_clause(&self.database, &self.trail, learned_ref);
            self.variable_order
                .on_learned_clause(&self.database, &self.trail, learned_ref);
            self.restart_policy
                .on_learned_clause(&self.database, &self.trail, learned_ref);

            refs.push(learned_ref);
        }
        refs
    }

    /// Check whether `clause` is a semantic split clause: it has at least two literals and its
    /// first two literals are assigned at the same decision level.
    pub fn is_semantic_split(&self, clause: &Clause) -> bool {
        clause.len() >= 2 && {
            let level_of = |literal: crate::basic_types::Literal| {
                self.trail
                    .decision_level_of(literal.variable())
                    .expect("the watched literals of a learned clause are assigned")
            };
            level_of(clause[0]) == level_of(clause[1])
        }
    }

    /// Undo the trail to `level` and apply the learned clauses in `refs`.
    ///
    /// UIP clauses propagate their asserting literal at `level`. A semantic split clause
    /// instead forces a fresh *decision* on one of its literals at the (pre-backtrack) top
    /// decision level; the variable order picks the literal whose variable it would decide
    /// first.
    fn backtrack_with(&mut self, refs: &[ClauseRef], level: usize) {
        calabash_assert_simple!(!refs.is_empty());

        self.metrics.log_core_before_backtrack(
            self.trail.decision_level(),
            self.trail.size(),
            self.counters.num_decisions,
        );
        self.dispatcher
            .on_before_backtrack(&self.database, &self.trail, level);
        self.counters.num_backtracks += 1;

        if self.is_semantic_split(self.database.get(refs[0])) {
            calabash_assert_moderate!(
                refs.iter()
                    .all(|&clause_ref| self.is_semantic_split(self.database.get(clause_ref))),
                "the learned clauses of one backtrack are homogeneous"
            );

            // find the best variable to decide among the literals at the top decision level
            let clause = self.database.get(refs[0]);
            let top_level = self
                .trail
                .decision_level_of(clause[0].variable())
                .expect("the watched literals of a learned clause are assigned");
            let mut top_literal = clause[0];
            for &literal in clause[1..].iter() {
                if self.trail.decision_level_of(literal.variable()) != Some(top_level) {
                    break;
                }
                calabash_assert_moderate!(self.trail.reason(literal.variable()).is_none());
                if self
                    .variable_order
                    .is_before(literal.variable(), top_literal.variable())
                {
                    top_literal = literal;
                }
            }

            // We have to backtrack a semantic decision. Otherwise, the proof of MCSat
            // termination does not hold and the solver is not guaranteed to terminate.
            calabash_assert_simple!(self.trail.decision_level() >= level + 1);
            calabash_assert_simple!(
                self.trail.assigned(level + 1)[0].variable().kind() != VariableKind::Boolean
            );

            self.trail.backtrack(level);
            self.metrics.log_core_after_backtrack(
                self.trail.decision_level(),
                self.trail.size(),
                true,
            );

            // decide one of the literals at the highest decision level
            self.trail.decide(top_literal.variable());
            self.trail
                .model_mut::<bool>()
                .set_value(top_literal.variable().ordinal(), !top_literal.is_negative());
        } else {
            // UIP
            calabash_assert_moderate!(refs
                .iter()
                .all(|&clause_ref| !self.is_semantic_split(self.database.get(clause_ref))));

            self.trail.backtrack(level);
            self.metrics.log_core_after_backtrack(
                self.trail.decision_level(),
                self.trail.size(),
                false,
            );

            // Propagate the asserting literal of each clause. Distinct clauses may still share
            // their asserting literal; the earlier propagation supersedes the later one.
            for &clause_ref in refs {
                let literal = self.database.get(clause_ref)[0];
                if !self
                    .trail
                    .model::<bool>()
                    .is_defined(literal.variable().ordinal())
                {
                    self.trail
                        .propagate(literal.variable(), Some(clause_ref), level);
                    self.trail
                        .model_mut::<bool>()
                        .set_value(literal.variable().ordinal(), !literal.is_negative());
                }
            }

            calabash_assert_advanced!(refs.iter().all(|&clause_ref| {
                self.database
                    .get(clause_ref)
                    .iter()
                    .skip(1)
                    .all(|&literal| evaluate(self.trail.model::<bool>(), literal) == Some(false))
            }));
        }
    }

    /// Clear the whole trail while keeping the learned clauses.
    fn restart(&mut self) {
        self.metrics.log_core_before_restart(
            self.counters.num_restarts,
            self.trail.decision_level(),
            self.trail.size(),
            self.counters.num_conflicts,
        );
        self.dispatcher
            .on_before_backtrack(&self.database, &self.trail, 0);
        self.counters.num_restarts += 1;

        self.trail.clear();

        self.dispatcher.on_restart(&self.database, &self.trail);
        self.variable_order.on_restart(&self.database, &self.trail);
        self.restart_policy.on_restart(&self.database, &self.trail);
    }

    /// Ask the theory owning the kind of `variable` to decide a value for it.
    fn decide(&mut self, variable: Variable) {
        self.counters.num_decisions += 1;
        self.dispatcher
            .decide(&mut self.database, &mut self.trail, variable);

        self.metrics.log_core_decision(
            variable.ordinal(),
            self.trail.decision_level(),
            self.trail.size(),
            self.counters.num_decisions,
            self.counters.num_backtracks,
        );
    }

    fn log_search_end(&self) {
        self.metrics.log_core_search_end(
            self.trail.decision_level(),
            self.trail.size(),
            self.counters.num_conflicts,
            self.counters.num_conflict_clauses,
            self.counters.num_learned_clauses,
            self.counters.num_decisions,
            self.counters.num_backtracks,
        );
    }
}
