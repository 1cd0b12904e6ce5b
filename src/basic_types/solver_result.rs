/// The outcome of [`crate::SmtSolver::check`].
///
/// Both cases are ordinary semantic outcomes, not errors; see the crate documentation for the
/// error taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverResult {
    /// A model of the asserted clauses has been found; it can be read from the trail's
    /// per-kind models.
    Sat,
    /// The asserted clauses are unsatisfiable.
    Unsat,
}
