mod luby_restart;
mod restart_policy;

pub use luby_restart::LubyRestart;
pub use restart_policy::NoRestart;
pub use restart_policy::RestartPolicy;
