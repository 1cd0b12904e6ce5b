use enumset::EnumSet;
use num_rational::BigRational;

use crate::basic_types::ClauseRef;
use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::calabash_assert_simple;
use crate::containers::KeyedVec;
use crate::engine::model::Model;

/// The origin of a trail entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentSource {
    /// The variable was decided; every decision opens a new decision level.
    Decision,
    /// The variable was propagated, either by a clause in the database or by theory-internal
    /// reasoning (in which case there is no reason clause).
    Propagation(Option<ClauseRef>),
}

impl AssignmentSource {
    pub fn is_decision(&self) -> bool {
        matches!(self, AssignmentSource::Decision)
    }

    /// Get the reason clause of a propagation, or [`None`] for decisions and theory-internal
    /// propagations.
    pub fn reason(&self) -> Option<ClauseRef> {
        match self {
            AssignmentSource::Decision => None,
            AssignmentSource::Propagation(reason) => *reason,
        }
    }
}

/// A single assignment on the trail.
#[derive(Clone, Copy, Debug)]
pub struct TrailEntry {
    variable: Variable,
    source: AssignmentSource,
    decision_level: usize,
}

impl TrailEntry {
    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn source(&self) -> AssignmentSource {
        self.source
    }

    pub fn decision_level(&self) -> usize {
        self.decision_level
    }
}

/// The ordered stack of assignments together with the per-kind partial models.
///
/// Entries are grouped by decision level and appended in assignment order within each level, so
/// the sequence of decision levels along the trail is non-decreasing. The trail additionally
/// maintains a reverse index from variable to its decision level and reason clause for constant
/// time lookups during conflict analysis.
///
/// The trail only does the bookkeeping of assignments; the caller of [`Trail::decide`] and
/// [`Trail::propagate`] is responsible for setting the corresponding model value. Violating a
/// precondition of any trail operation is a programmer error and fails a (fatal) assertion.
#[derive(Debug)]
pub struct Trail {
    /// Map decision level -> assignments made at that level, in append order.
    assigned: Vec<Vec<TrailEntry>>,
    /// Map variable kind -> variable ordinal -> decision level of the variable.
    level: KeyedVec<VariableKind, Vec<Option<u32>>>,
    /// Map variable kind -> variable ordinal -> reason clause of the variable.
    reason: KeyedVec<VariableKind, Vec<Option<ClauseRef>>>,
    /// Partial model of the Boolean variables.
    bool_model: Model<bool>,
    /// Partial model of the Rational variables.
    rational_model: Model<BigRational>,
    /// Total number of entries across all decision levels.
    num_assigned: usize,
}

impl Default for Trail {
    fn default() -> Self {
        let num_kinds = EnumSet::<VariableKind>::all().len();

        let mut level = KeyedVec::default();
        level.resize(num_kinds, Vec::new());

        let mut reason = KeyedVec::default();
        reason.resize(num_kinds, Vec::new());

        Trail {
            assigned: vec![Vec::new()],
            level,
            reason,
            bool_model: Model::default(),
            rational_model: Model::default(),
            num_assigned: 0,
        }
    }
}

impl Trail {
    /// Get the current decision level (0 before any decision has been made).
    pub fn decision_level(&self) -> usize {
        self.assigned.len() - 1
    }

    /// Get the decision level of `variable`, or [`None`] if it is unassigned.
    pub fn decision_level_of(&self, variable: Variable) -> Option<usize> {
        self.level[variable.kind()][variable.ordinal()].map(|level| level as usize)
    }

    /// Get the reason clause which propagated `variable`, or [`None`] if the variable is
    /// unassigned, a decision, or a theory-internal propagation.
    pub fn reason(&self, variable: Variable) -> Option<ClauseRef> {
        self.reason[variable.kind()][variable.ordinal()]
    }

    /// Get the assignments made at decision level `level` in append order.
    pub fn assigned(&self, level: usize) -> &[TrailEntry] {
        &self.assigned[level]
    }

    /// Iterate over all entries on the trail grouped by decision level.
    pub fn entries(&self) -> impl Iterator<Item = &TrailEntry> {
        self.assigned.iter().flatten()
    }

    /// Get the total number of assignments on the trail.
    pub fn size(&self) -> usize {
        self.num_assigned
    }

    pub fn is_empty(&self) -> bool {
        self.num_assigned == 0
    }

    /// Change the number of variables of kind `kind`.
    pub fn resize(&mut self, kind: VariableKind, num_variables: usize) {
        self.level[kind].resize(num_variables, None);
        self.reason[kind].resize(num_variables, None);
        match kind {
            VariableKind::Boolean => self.bool_model.resize(num_variables),
            VariableKind::Rational => self.rational_model.resize(num_variables),
        }
    }

    /// Get the number of variables of kind `kind`.
    pub fn num_variables(&self, kind: VariableKind) -> usize {
        self.level[kind].len()
    }

    /// Get the partial model for the variable kind whose values have type `Value`.
    pub fn model<Value: TrailValue>(&self) -> &Model<Value> {
        Value::model_in(self)
    }

    /// Get the partial model for the variable kind whose values have type `Value`.
    pub fn model_mut<Value: TrailValue>(&mut self) -> &mut Model<Value> {
        Value::model_in_mut(self)
    }

    /// Decide `variable` at a new decision level.
    ///
    /// The caller is responsible for setting the value of `variable` in the appropriate model.
    pub fn decide(&mut self, variable: Variable) {
        calabash_assert_simple!(
            self.decision_level_of(variable).is_none(),
            "cannot decide a variable which is already assigned"
        );

        let new_level = self.assigned.len();
        self.assigned.push(vec![TrailEntry {
            variable,
            source: AssignmentSource::Decision,
            decision_level: new_level,
        }]);
        self.num_assigned += 1;
        self.level[variable.kind()][variable.ordinal()] = Some(new_level as u32);
        self.reason[variable.kind()][variable.ordinal()] = None;
    }

    /// Propagate `variable` due to `reason` at decision level `level`.
    ///
    /// `level` does not have to be the current decision level; theories may retroactively
    /// propagate at any level up to the current one. The caller is responsible for setting the
    /// value of `variable` in the appropriate model.
    pub fn propagate(&mut self, variable: Variable, reason: Option<ClauseRef>, level: usize) {
        calabash_assert_simple!(
            self.decision_level_of(variable).is_none(),
            "cannot propagate a variable which is already assigned"
        );
        calabash_assert_simple!(
            level <= self.decision_level(),
            "cannot propagate beyond the current decision level"
        );

        self.assigned[level].push(TrailEntry {
            variable,
            source: AssignmentSource::Propagation(reason),
            decision_level: level,
        });
        self.num_assigned += 1;
        self.level[variable.kind()][variable.ordinal()] = Some(level as u32);
        self.reason[variable.kind()][variable.ordinal()] = reason;
    }

    /// Make all variables decided or propagated at levels > `level` unassigned.
    pub fn backtrack(&mut self, level: usize) {
        calabash_assert_simple!(
            level <= self.decision_level(),
            "cannot backtrack above the current decision level"
        );

        while self.decision_level() > level {
            let entries = self.assigned.pop().expect("level 0 is never popped");
            self.num_assigned -= entries.len();
            for entry in entries {
                let variable = entry.variable;
                self.level[variable.kind()][variable.ordinal()] = None;
                self.reason[variable.kind()][variable.ordinal()] = None;
                self.clear_model_value(variable);
            }
        }
    }

    /// Backtrack to decision level 0.
    pub fn clear(&mut self) {
        self.backtrack(0);
    }

    fn clear_model_value(&mut self, variable: Variable) {
        match variable.kind() {
            VariableKind::Boolean => self.bool_model.clear(variable.ordinal()),
            VariableKind::Rational => self.rational_model.clear(variable.ordinal()),
        }
    }
}

/// A value type which is stored in one of the per-kind models of the [`Trail`].
pub trait TrailValue: Sized {
    /// The variable kind whose model stores values of this type.
    const KIND: VariableKind;

    fn model_in(trail: &Trail) -> &Model<Self>;

    fn model_in_mut(trail: &mut Trail) -> &mut Model<Self>;
}

impl TrailValue for bool {
    const KIND: VariableKind = VariableKind::Boolean;

    fn model_in(trail: &Trail) -> &Model<bool> {
        &trail.bool_model
    }

    fn model_in_mut(trail: &mut Trail) -> &mut Model<bool> {
        &mut trail.bool_model
    }
}

impl TrailValue for BigRational {
    const KIND: VariableKind = VariableKind::Rational;

    fn model_in(trail: &Trail) -> &Model<BigRational> {
        &trail.rational_model
    }

    fn model_in_mut(trail: &mut Trail) -> &mut Model<BigRational> {
        &mut trail.rational_model
    }
}
