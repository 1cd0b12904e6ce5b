mod conflict_analyzer;
mod subsumption_minimiser;

pub use conflict_analyzer::ConflictAnalyzer;
pub use subsumption_minimiser::SubsumptionMinimiser;
