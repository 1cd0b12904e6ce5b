use downcast_rs::impl_downcast;
use downcast_rs::Downcast;
use enumset::EnumSet;

use crate::basic_types::Clause;
use crate::basic_types::ClauseRef;
use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

// We need this to cast from `Box<dyn Theory>` to a concrete theory; Rust inherently does not
// allow downcasting from the trait definition to its concrete type.
impl_downcast!(Theory);

/// The plugin interface for theory specific reasoning.
///
/// A theory owns one or more [`VariableKind`]s: it chooses values for the variables of those
/// kinds when asked to decide, and it deduces consequences of the current trail during
/// propagation. The only required methods are [`Theory::name`], [`Theory::owned_kinds`],
/// [`Theory::propagate`] and [`Theory::decide`]; the event methods have empty default
/// implementations.
///
/// Theories read the [`Trail`] and [`ClauseDatabase`] but mutate only their own state plus the
/// trail through its append operations.
pub trait Theory: Downcast {
    /// Return the name of the theory, this is a convenience method that is used for printing.
    fn name(&self) -> &str;

    /// The variable kinds this theory decides values for.
    ///
    /// The dispatcher routes [`Theory::decide`] requests based on this set; exactly one
    /// registered theory has to own each kind in use.
    fn owned_kinds(&self) -> EnumSet<VariableKind>;

    /// Run deduction over the current trail.
    ///
    /// The theory may append propagations to the trail (setting the corresponding model
    /// values). It returns the conflict clauses it has discovered; each returned clause has to
    /// be false in the current trail. An empty vector means no conflict was found.
    ///
    /// Theories are not required to propagate until a fixed point; the dispatcher will call
    /// them again until no further propagations happen.
    fn propagate(&mut self, db: &mut ClauseDatabase, trail: &mut Trail) -> Vec<Clause>;

    /// Choose a value for `variable`, append a decision to the trail and set the model value.
    ///
    /// Only called with variables whose kind is in [`Theory::owned_kinds`].
    fn decide(&mut self, db: &mut ClauseDatabase, trail: &mut Trail, variable: Variable);

    /// Called when the solver starts a new check.
    fn on_init(&mut self, _db: &ClauseDatabase, _trail: &Trail) {}

    /// Called when the number of variables of kind `kind` changes.
    fn on_variable_resize(&mut self, _kind: VariableKind, _num_variables: usize) {}

    /// Called when a new clause is learned and added to the database.
    fn on_learned_clause(&mut self, _db: &ClauseDatabase, _trail: &Trail, _learned: ClauseRef) {}

    /// Called during conflict analysis for each clause that is resolved with the current
    /// conflict clause.
    fn on_conflict_resolved(&mut self, _db: &ClauseDatabase, _trail: &Trail, _clause: &Clause) {}

    /// Called before the trail is truncated to `level`.
    fn on_before_backtrack(&mut self, _db: &ClauseDatabase, _trail: &Trail, _level: usize) {}

    /// Called after each restart, once the trail has been truncated.
    fn on_restart(&mut self, _db: &ClauseDatabase, _trail: &Trail) {}
}
