pub(crate) mod clause_database;
pub(crate) mod conflict_analysis;
pub(crate) mod model;
pub(crate) mod restart;
pub(crate) mod smt_solver;
pub(crate) mod theory;
pub(crate) mod trail;

pub use clause_database::ClauseDatabase;
pub use conflict_analysis::ConflictAnalyzer;
pub use conflict_analysis::SubsumptionMinimiser;
pub use model::evaluate;
pub use model::evaluate_clause;
pub use model::Model;
pub use restart::LubyRestart;
pub use restart::NoRestart;
pub use restart::RestartPolicy;
pub use smt_solver::SmtSolver;
pub use smt_solver::SmtSolverOptions;
pub use theory::BoolTheory;
pub use theory::Theory;
pub use theory::TheoryDispatcher;
pub use trail::AssignmentSource;
pub use trail::Trail;
pub use trail::TrailEntry;
pub use trail::TrailValue;
