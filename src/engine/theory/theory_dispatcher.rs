use crate::basic_types::Clause;
use crate::basic_types::ClauseRef;
use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::calabash_assert_simple;
use crate::engine::theory::Theory;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// Multiplexes solver events to the registered [`Theory`] plugins.
///
/// Theories are invoked in registration order; that order is fixed for the lifetime of the
/// dispatcher and is part of its contract. The dispatcher holds the theories but does not
/// interpret their reasoning: it only aggregates the conflicts they report and routes
/// decisions to the theory owning the kind of the decided variable.
#[derive(Default)]
pub struct TheoryDispatcher {
    theories: Vec<Box<dyn Theory>>,
}

impl std::fmt::Debug for TheoryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.theories.iter().map(|theory| theory.name()))
            .finish()
    }
}

impl TheoryDispatcher {
    /// Add `theory` to the end of the invocation order.
    pub fn add_theory(&mut self, theory: impl Theory + 'static) {
        self.theories.push(Box::new(theory));
    }

    /// Get the first registered theory of the concrete type `Concrete`.
    pub fn theory_mut<Concrete: Theory>(&mut self) -> Option<&mut Concrete> {
        self.theories
            .iter_mut()
            .find_map(|theory| theory.downcast_mut::<Concrete>())
    }

    /// Run propagation rounds until no theory makes progress or a conflict is found.
    ///
    /// Within a round every theory observes the trail as it grows. The conflicts reported by
    /// all theories of a round are aggregated and returned together so the conflict analyzer
    /// can choose among them.
    pub(crate) fn propagate(&mut self, db: &mut ClauseDatabase, trail: &mut Trail) -> Vec<Clause> {
        let mut conflicts = Vec::new();
        loop {
            let size_before = trail.size();
            for theory in self.theories.iter_mut() {
                conflicts.extend(theory.propagate(db, trail));
            }

            // stop on conflict, or once a full round makes no new propagations
            if !conflicts.is_empty() || trail.size() == size_before {
                return conflicts;
            }
        }
    }

    /// Ask the theory owning the kind of `variable` to decide a value for it.
    pub(crate) fn decide(&mut self, db: &mut ClauseDatabase, trail: &mut Trail, variable: Variable) {
        let theory = self
            .theories
            .iter_mut()
            .find(|theory| theory.owned_kinds().contains(variable.kind()));

        calabash_assert_simple!(
            theory.is_some(),
            "no registered theory owns the decided variable kind"
        );
        if let Some(theory) = theory {
            theory.decide(db, trail, variable);
        }
    }

    pub(crate) fn on_init(&mut self, db: &ClauseDatabase, trail: &Trail) {
        for theory in self.theories.iter_mut() {
            theory.on_init(db, trail);
        }
    }

    pub(crate) fn on_variable_resize(&mut self, kind: VariableKind, num_variables: usize) {
        for theory in self.theories.iter_mut() {
            theory.on_variable_resize(kind, num_variables);
        }
    }

    pub(crate) fn on_learned_clause(
        &mut self,
        db: &ClauseDatabase,
        trail: &Trail,
        learned: ClauseRef,
    ) {
        for theory in self.theories.iter_mut() {
            theory.on_learned_clause(db, trail, learned);
        }
    }

    pub(crate) fn on_conflict_resolved(
        &mut self,
        db: &ClauseDatabase,
        trail: &Trail,
        clause: &Clause,
    ) {
        for theory in self.theories.iter_mut() {
            theory.on_conflict_resolved(db, trail, clause);
        }
    }

    pub(crate) fn on_before_backtrack(&mut self, db: &ClauseDatabase, trail: &Trail, level: usize) {
        for theory in self.theories.iter_mut() {
            theory.on_before_backtrack(db, trail, level);
        }
    }

    pub(crate) fn on_restart(&mut self, db: &ClauseDatabase, trail: &Trail) {
        for theory in self.theories.iter_mut() {
            theory.on_restart(db, trail);
        }
    }

    /// Check whether some registered theory owns `kind`.
    pub(crate) fn owns_kind(&self, kind: VariableKind) -> bool {
        self.theories
            .iter()
            .any(|theory| theory.owned_kinds().contains(kind))
    }
}
