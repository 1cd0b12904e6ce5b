use enumset::EnumSet;

use crate::basic_types::Variable;
use crate::basic_types::VariableKind;
use crate::branching::VariableOrder;
use crate::containers::StorageKey;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// Picks the first unassigned variable, iterating the kinds in declaration order and the
/// ordinals in increasing order.
///
/// This is a primitive but fully deterministic heuristic, suitable mostly for testing.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstUnassigned;

impl VariableOrder for FirstUnassigned {
    fn pick(&mut self, _db: &ClauseDatabase, trail: &Trail) -> Option<Variable> {
        for kind in EnumSet::<VariableKind>::all().iter() {
            for ordinal in 0..trail.num_variables(kind) {
                let variable = Variable::new(kind, ordinal as u32);
                if trail.decision_level_of(variable).is_none() {
                    return Some(variable);
                }
            }
        }
        None
    }

    fn is_before(&self, first: Variable, second: Variable) -> bool {
        (first.kind().index(), first.ordinal()) < (second.kind().index(), second.ordinal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bool_var(ordinal: u32) -> Variable {
        Variable::new(VariableKind::Boolean, ordinal)
    }

    #[test]
    fn unassigned_variables_are_picked_in_ordinal_order() {
        let db = ClauseDatabase::default();
        let mut trail = Trail::default();
        trail.resize(VariableKind::Boolean, 3);

        let mut order = FirstUnassigned;
        assert_eq!(order.pick(&db, &trail), Some(bool_var(0)));

        trail.decide(bool_var(0));
        trail.model_mut::<bool>().set_value(0, true);
        assert_eq!(order.pick(&db, &trail), Some(bool_var(1)));
    }

    #[test]
    fn no_variable_is_picked_once_all_are_assigned() {
        let db = ClauseDatabase::default();
        let mut trail = Trail::default();
        trail.resize(VariableKind::Boolean, 1);

        trail.decide(bool_var(0));
        trail.model_mut::<bool>().set_value(0, false);

        assert_eq!(FirstUnassigned.pick(&db, &trail), None);
    }

    #[test]
    fn the_order_is_total_and_antisymmetric() {
        let order = FirstUnassigned;
        let first = bool_var(0);
        let second = Variable::new(VariableKind::Rational, 0);

        assert!(order.is_before(first, second));
        assert!(!order.is_before(second, first));
        assert!(!order.is_before(first, first));
    }
}
