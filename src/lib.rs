//! # Calabash
//! Calabash is the search core of an SMT solver based on the MCSat (Model-Constructing
//! Satisfiability) paradigm: Boolean and theory-level assignments interleave on a single
//! [`Trail`], pluggable [`Theory`] plugins deduce consequences and report conflicts, and the
//! solver learns clauses from conflicts in one of two forms. A *UIP* clause becomes unit after
//! backtracking and is propagated; a *semantic split* clause keeps two literals at the top
//! decision level and instead forces a fresh decision, which MCSat requires for termination
//! when semantic variables participate in a conflict.
//!
//! The crate deliberately contains only the core: the trail, the clause database, the theory
//! dispatcher, conflict analysis with subsumption-based minimisation, the restart and
//! variable-order interfaces and the search driver. Term construction, input parsing, proof
//! emission and full theory solvers live outside of it; the [`BoolTheory`] unit propagation
//! plugin is included because every search needs one.
//!
//! # Using Calabash
//! The first step is creating a solver, registering the theories and allocating variables:
//! ```rust
//! use calabash_solver::BoolTheory;
//! use calabash_solver::SmtSolver;
//! use calabash_solver::VariableKind;
//!
//! let mut solver = SmtSolver::default();
//! solver.add_theory(BoolTheory::default());
//! solver.resize_variables(VariableKind::Boolean, 2);
//! ```
//!
//! Then clauses are asserted and the search is run:
//! ```rust
//! use calabash_solver::clause;
//! use calabash_solver::evaluate;
//! use calabash_solver::BoolTheory;
//! use calabash_solver::Literal;
//! use calabash_solver::SmtSolver;
//! use calabash_solver::SolverResult;
//! use calabash_solver::VariableKind;
//!
//! let mut solver = SmtSolver::default();
//! solver.add_theory(BoolTheory::default());
//! solver.resize_variables(VariableKind::Boolean, 2);
//!
//! let x = Literal::new(0);
//! let y = Literal::new(1);
//! let _ = solver.assert_clause(clause![x, y]);
//! let _ = solver.assert_clause(clause![!x, y]);
//!
//! assert_eq!(solver.check(), SolverResult::Sat);
//!
//! // after a Sat outcome the models on the trail hold a satisfying assignment
//! assert_eq!(evaluate(solver.trail().model::<bool>(), y), Some(true));
//! ```
//!
//! # Errors and outcomes
//! [`SolverResult::Sat`] and [`SolverResult::Unsat`] are ordinary return values and
//! theory-reported conflicts are ordinary data. Precondition violations (deciding an assigned
//! variable, backtracking above the current level) are programmer errors and fail fatal
//! assertions; the only recoverable error is a [`statistics::MetricsSink`] that cannot open
//! its log file, which is reported at construction.
//!
//! ## Feature flags
//! - `debug-checks`: enable expensive assertions in the solver. Turning this on slows down the
//!   solver considerably, so it is off by default.
pub(crate) mod basic_types;
pub mod branching;
#[doc(hidden)]
pub mod calabash_asserts;
pub mod containers;
pub(crate) mod engine;
pub mod statistics;

pub use crate::basic_types::Clause;
pub use crate::basic_types::ClauseRef;
pub use crate::basic_types::Literal;
pub use crate::basic_types::SolverResult;
pub use crate::basic_types::Variable;
pub use crate::basic_types::VariableKind;
pub use crate::engine::evaluate;
pub use crate::engine::evaluate_clause;
pub use crate::engine::AssignmentSource;
pub use crate::engine::BoolTheory;
pub use crate::engine::ClauseDatabase;
pub use crate::engine::ConflictAnalyzer;
pub use crate::engine::LubyRestart;
pub use crate::engine::Model;
pub use crate::engine::NoRestart;
pub use crate::engine::RestartPolicy;
pub use crate::engine::SmtSolver;
pub use crate::engine::SmtSolverOptions;
pub use crate::engine::SubsumptionMinimiser;
pub use crate::engine::Theory;
pub use crate::engine::TheoryDispatcher;
pub use crate::engine::Trail;
pub use crate::engine::TrailEntry;
pub use crate::engine::TrailValue;
