use crate::basic_types::ClauseRef;
use crate::engine::restart::RestartPolicy;
use crate::engine::ClauseDatabase;
use crate::engine::Trail;

/// Restarts following the Luby sequence: the i-th restart happens after `luby(i) * multiplier`
/// learned clauses.
///
/// See \[1\] for the sequence and its optimality properties.
///
/// # Bibliography
/// \[1\] M. Luby, A. Sinclair, and D. Zuckerman, ‘Optimal speedup of Las Vegas algorithms’,
/// Information Processing Letters, vol. 47, no. 4, pp. 173–180, 1993.
#[derive(Clone, Copy, Debug)]
pub struct LubyRestart {
    /// Countdown of learned clauses to the next restart.
    countdown: i64,
    sequence: LubySequence,
    multiplier: i64,
}

impl LubyRestart {
    const DEFAULT_MULTIPLIER: i64 = 550;

    pub fn new(multiplier: i64) -> LubyRestart {
        let mut sequence = LubySequence::default();
        LubyRestart {
            countdown: sequence.next() * multiplier,
            sequence,
            multiplier,
        }
    }
}

impl Default for LubyRestart {
    fn default() -> Self {
        LubyRestart::new(LubyRestart::DEFAULT_MULTIPLIER)
    }
}

impl RestartPolicy for LubyRestart {
    fn should_restart(&self) -> bool {
        self.countdown <= 0
    }

    fn on_learned_clause(&mut self, _db: &ClauseDatabase, _trail: &Trail, _learned: ClauseRef) {
        self.countdown -= 1;
    }

    fn on_restart(&mut self, _db: &ClauseDatabase, _trail: &Trail) {
        self.countdown = self.sequence.next() * self.multiplier;
    }
}

/// The Luby sequence 1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, ... generated in constant
/// time per element with Knuth's 'reluctant doubling' formula.
#[derive(Clone, Copy, Debug)]
struct LubySequence {
    u: i64,
    v: i64,
}

impl Default for LubySequence {
    fn default() -> Self {
        LubySequence { u: 1, v: 1 }
    }
}

impl LubySequence {
    fn next(&mut self) -> i64 {
        let next_value = self.v;
        if (self.u & (-self.u)) == self.v {
            self.u += 1;
            self.v = 1;
        } else {
            self.v *= 2;
        }
        next_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_luby_sequence_is_generated() {
        let mut sequence = LubySequence::default();
        let expected = [1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, 1, 1, 2];
        for value in expected {
            assert_eq!(sequence.next(), value);
        }
    }

    #[test]
    fn a_restart_triggers_after_the_scheduled_number_of_learned_clauses() {
        let mut policy = LubyRestart::new(2);

        let db = ClauseDatabase::default();
        let trail = Trail::default();

        assert!(!policy.should_restart());
        policy.on_learned_clause(&db, &trail, ClauseRef::learned_clause(0));
        assert!(!policy.should_restart());
        policy.on_learned_clause(&db, &trail, ClauseRef::learned_clause(1));
        assert!(policy.should_restart());

        policy.on_restart(&db, &trail);
        assert!(!policy.should_restart());
    }
}
