use crate::basic_types::Clause;
use crate::basic_types::ClauseRef;
use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// A trait for defining the order in which variables are decided.
///
/// Besides picking the next variable to decide, the order also provides a total order over
/// variables through [`VariableOrder::is_before`] which the solver uses to select the decision
/// target when backtracking with a semantic split clause. The order has to be antisymmetric
/// and total over simultaneously pickable variables; tests which depend on the chosen split
/// target should fix a deterministic order.
///
/// Activity based implementations can maintain their state through the event methods, which
/// have empty default implementations.
pub trait VariableOrder {
    /// Pick an unassigned variable in `trail` to decide, or [`None`] if all variables are
    /// assigned.
    fn pick(&mut self, db: &ClauseDatabase, trail: &Trail) -> Option<Variable>;

    /// Check whether `first` is preferred over `second` for a decision.
    fn is_before(&self, first: Variable, second: Variable) -> bool;

    /// Called when the number of variables of kind `kind` changes.
    fn on_variable_resize(&mut self, _kind: VariableKind, _num_variables: usize) {}

    /// Called when a new clause is learned and added to the database.
    fn on_learned_clause(&mut self, _db: &ClauseDatabase, _trail: &Trail, _learned: ClauseRef) {}

    /// Called during conflict analysis for each clause that is resolved with the current
    /// conflict clause.
    fn on_conflict_resolved(&mut self, _db: &ClauseDatabase, _trail: &Trail, _clause: &Clause) {}

    /// Called after each restart, once the trail has been truncated.
    fn on_restart(&mut self, _db: &ClauseDatabase, _trail: &Trail) {}
}
