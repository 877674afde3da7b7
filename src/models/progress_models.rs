use serde::{Deserialize, Serialize};

/// Overall stage of an analysis run, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisStage {
    #[default]
    Idle,
    DiscoveringBrands,
    AnalyzingBrand1,
    AnalyzingBrand2,
    Finalizing,
    Completed,
    Error,
}

impl AnalysisStage {
    pub const ALL: [AnalysisStage; 7] = [
        AnalysisStage::Idle,
        AnalysisStage::DiscoveringBrands,
        AnalysisStage::AnalyzingBrand1,
        AnalysisStage::AnalyzingBrand2,
        AnalysisStage::Finalizing,
        AnalysisStage::Completed,
        AnalysisStage::Error,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Completed | AnalysisStage::Error)
    }

    /// The stage a successful transition leads to. Terminal stages have none.
    pub fn next(&self) -> Option<AnalysisStage> {
        match self {
            AnalysisStage::Idle => Some(AnalysisStage::DiscoveringBrands),
            AnalysisStage::DiscoveringBrands => Some(AnalysisStage::AnalyzingBrand1),
            AnalysisStage::AnalyzingBrand1 => Some(AnalysisStage::AnalyzingBrand2),
            AnalysisStage::AnalyzingBrand2 => Some(AnalysisStage::Finalizing),
            AnalysisStage::Finalizing => Some(AnalysisStage::Completed),
            AnalysisStage::Completed | AnalysisStage::Error => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::DiscoveringBrands => "discovering-brands",
            AnalysisStage::AnalyzingBrand1 => "analyzing-brand1",
            AnalysisStage::AnalyzingBrand2 => "analyzing-brand2",
            AnalysisStage::Finalizing => "finalizing",
            AnalysisStage::Completed => "completed",
            AnalysisStage::Error => "error",
        }
    }
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepProgress {
    pub status: StepStatus,
    /// Brands found for discovery, products found for a brand step.
    pub found: usize,
    pub message: String,
}

impl StepProgress {
    pub(crate) fn pending(message: &str) -> Self {
        Self {
            status: StepStatus::Pending,
            found: 0,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSteps {
    pub brand_discovery: StepProgress,
    pub brand1_analysis: StepProgress,
    pub brand2_analysis: StepProgress,
}

impl AnalysisSteps {
    pub fn statuses(&self) -> [StepStatus; 3] {
        [
            self.brand_discovery.status,
            self.brand1_analysis.status,
            self.brand2_analysis.status,
        ]
    }
}

impl Default for AnalysisSteps {
    fn default() -> Self {
        Self {
            brand_discovery: StepProgress::pending("Waiting to discover brands"),
            brand1_analysis: StepProgress::pending("Waiting to analyze first brand"),
            brand2_analysis: StepProgress::pending("Waiting to analyze second brand"),
        }
    }
}

/// A complete status snapshot of an analysis run.
///
/// Every snapshot replaces the previous one in full; consumers never merge
/// fields across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisProgress {
    pub status: AnalysisStage,
    pub current_step: String,
    /// Overall progress, 0-100.
    pub progress: u8,
    pub brand1_progress: u8,
    pub brand2_progress: u8,
    pub brands_found: usize,
    pub current_brand: Option<String>,
    pub steps: AnalysisSteps,
    pub error: Option<String>,
}

impl AnalysisProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether the step statuses agree with the overall stage.
    ///
    /// A failed run keeps the completed steps before the failure, marks the
    /// step that was running as errored and leaves the rest pending.
    pub fn is_consistent(&self) -> bool {
        use StepStatus::{Completed as C, Error as E, InProgress as I, Pending as P};

        if self.progress > 100 || self.brand1_progress > 100 || self.brand2_progress > 100 {
            return false;
        }

        let steps_ok = match (self.status, self.steps.statuses()) {
            (AnalysisStage::Idle, [P, P, P]) => true,
            (AnalysisStage::DiscoveringBrands, [I, P, P]) => true,
            (AnalysisStage::AnalyzingBrand1, [C, I, P]) => true,
            (AnalysisStage::AnalyzingBrand2, [C, C, I]) => true,
            (AnalysisStage::Finalizing, [C, C, C]) => true,
            (AnalysisStage::Completed, [C, C, C]) => self.progress == 100,
            (AnalysisStage::Error, [P, P, P] | [E, P, P] | [C, E, P] | [C, C, E] | [C, C, C]) => {
                true
            }
            _ => false,
        };

        let error_ok = match self.status {
            AnalysisStage::Error => self.error.is_some(),
            _ => self.error.is_none(),
        };

        steps_ok && error_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = AnalysisStage::Idle;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }

        assert_eq!(
            visited,
            vec![
                AnalysisStage::Idle,
                AnalysisStage::DiscoveringBrands,
                AnalysisStage::AnalyzingBrand1,
                AnalysisStage::AnalyzingBrand2,
                AnalysisStage::Finalizing,
                AnalysisStage::Completed,
            ]
        );
        assert!(AnalysisStage::Error.next().is_none());
    }

    #[test]
    fn test_stage_serializes_kebab_case() {
        for stage in AnalysisStage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }

        let json = serde_json::to_string(&StepStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_idle_snapshot_is_consistent() {
        let idle = AnalysisProgress::idle();
        assert!(idle.is_consistent());
        assert_eq!(idle.progress, 0);
        assert!(idle.error.is_none());
    }

    #[test]
    fn test_error_stage_requires_message() {
        let mut snapshot = AnalysisProgress::idle();
        snapshot.status = AnalysisStage::Error;
        assert!(!snapshot.is_consistent());

        snapshot.error = Some("provider timed out".to_string());
        assert!(snapshot.is_consistent());
    }
}
