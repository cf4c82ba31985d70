use serde::{Deserialize, Serialize};
use std::fmt;

/// The coarse stages a pipeline run moves through, in order.
///
/// Each stage is reported to the caller as a progress notification before the
/// work of that stage starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Initializing,
    ProcessingFeatures,
    RunningDetection,
    GeneratingVisualizations,
}

impl Phase {
    /// All phases in the order a run emits them.
    pub const ALL: [Phase; 4] = [
        Phase::Initializing,
        Phase::ProcessingFeatures,
        Phase::RunningDetection,
        Phase::GeneratingVisualizations,
    ];

    /// Human-readable label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initializing => "Initializing",
            Phase::ProcessingFeatures => "Processing features",
            Phase::RunningDetection => "Running anomaly detection",
            Phase::GeneratingVisualizations => "Generating visualizations",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_are_ordered() {
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Phase::RunningDetection.to_string(), "Running anomaly detection");
        assert_eq!(Phase::GeneratingVisualizations.label(), "Generating visualizations");
    }
}
