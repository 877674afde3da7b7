use anyhow::{Result, anyhow};

use crate::models::{AnalysisProgress, AnalysisStage, GapSummary, StepProgress, StepStatus};
use crate::progress::ProgressSink;

const DISCOVERY_STARTED: u8 = 5;
const BRANDS_DISCOVERED: u8 = 20;
const BRAND1_ANALYZED: u8 = 55;
const BRAND2_ANALYZED: u8 = 90;
const COMPLETED: u8 = 100;

/// Which of the two compared brands a step refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandSlot {
    First,
    Second,
}

impl BrandSlot {
    fn stage(&self) -> AnalysisStage {
        match self {
            BrandSlot::First => AnalysisStage::AnalyzingBrand1,
            BrandSlot::Second => AnalysisStage::AnalyzingBrand2,
        }
    }

    /// Overall progress range covered while this brand is being analyzed.
    fn progress_range(&self) -> (u8, u8) {
        match self {
            BrandSlot::First => (BRANDS_DISCOVERED, BRAND1_ANALYZED),
            BrandSlot::Second => (BRAND1_ANALYZED, BRAND2_ANALYZED),
        }
    }
}

/// Narrates an analysis run as a sequence of complete snapshots.
///
/// The reporter is a state machine over [`AnalysisStage`]. Each transition
/// method checks the current stage, builds the next snapshot and hands it to
/// the sink exactly once. A transition that is not allowed from the current
/// stage returns an error and emits nothing.
pub struct ProgressReporter<S: ProgressSink> {
    sink: S,
    snapshot: AnalysisProgress,
    brand1: String,
    brand2: String,
}

impl<S: ProgressSink> ProgressReporter<S> {
    pub fn new(sink: S, brand1: &str, brand2: &str) -> Self {
        Self {
            sink,
            snapshot: AnalysisProgress::idle(),
            brand1: brand1.to_string(),
            brand2: brand2.to_string(),
        }
    }

    pub fn snapshot(&self) -> &AnalysisProgress {
        &self.snapshot
    }

    pub fn stage(&self) -> AnalysisStage {
        self.snapshot.status
    }

    fn brand_name(&self, slot: BrandSlot) -> &str {
        match slot {
            BrandSlot::First => &self.brand1,
            BrandSlot::Second => &self.brand2,
        }
    }

    pub fn start_discovery(&mut self, query: &str) -> Result<()> {
        self.expect_stage(AnalysisStage::Idle, "start brand discovery")?;

        let mut next = self.snapshot.clone();
        next.status = AnalysisStage::DiscoveringBrands;
        next.current_step = format!("Discovering brands on {}", query);
        next.progress = DISCOVERY_STARTED;
        next.steps.brand_discovery = in_progress(format!("Searching for brands on {}", query));

        self.emit(next);
        Ok(())
    }

    pub fn brands_discovered(&mut self, count: usize) -> Result<()> {
        self.expect_stage(AnalysisStage::DiscoveringBrands, "finish brand discovery")?;

        let mut next = self.snapshot.clone();
        next.status = AnalysisStage::AnalyzingBrand1;
        next.current_step = format!(
            "Found {} brands, searching products from {}",
            count, self.brand1
        );
        next.progress = BRANDS_DISCOVERED;
        next.brands_found = count;
        next.current_brand = Some(self.brand1.clone());
        next.steps.brand_discovery = completed(count, format!("Found {} brands", count));
        next.steps.brand1_analysis = in_progress(format!("Searching products from {}", self.brand1));

        self.emit(next);
        Ok(())
    }

    /// Reports partial progress (0-100) of the product search for one brand.
    pub fn brand_products_progress(&mut self, slot: BrandSlot, percent: u8) -> Result<()> {
        self.expect_stage(slot.stage(), "report brand progress")?;

        let percent = percent.min(100);
        let (start, end) = slot.progress_range();

        let mut next = self.snapshot.clone();
        match slot {
            BrandSlot::First => next.brand1_progress = percent,
            BrandSlot::Second => next.brand2_progress = percent,
        }
        let span = u16::from(end - start);
        next.progress = start + (span * u16::from(percent) / 100) as u8;

        self.emit(next);
        Ok(())
    }

    pub fn brand_analyzed(&mut self, slot: BrandSlot, products_found: usize) -> Result<()> {
        self.expect_stage(slot.stage(), "finish brand analysis")?;

        let name = self.brand_name(slot).to_string();
        let step_done = completed(
            products_found,
            format!("Found {} products from {}", products_found, name),
        );

        let mut next = self.snapshot.clone();
        match slot {
            BrandSlot::First => {
                next.status = AnalysisStage::AnalyzingBrand2;
                next.current_step = format!(
                    "Found {} products from {}, searching products from {}",
                    products_found, name, self.brand2
                );
                next.progress = BRAND1_ANALYZED;
                next.brand1_progress = 100;
                next.current_brand = Some(self.brand2.clone());
                next.steps.brand1_analysis = step_done;
                next.steps.brand2_analysis =
                    in_progress(format!("Searching products from {}", self.brand2));
            }
            BrandSlot::Second => {
                next.status = AnalysisStage::Finalizing;
                next.current_step = "Analyzing product gaps...".to_string();
                next.progress = BRAND2_ANALYZED;
                next.brand2_progress = 100;
                next.current_brand = None;
                next.steps.brand2_analysis = step_done;
            }
        }

        self.emit(next);
        Ok(())
    }

    pub fn complete(&mut self, summary: &GapSummary) -> Result<()> {
        self.expect_stage(AnalysisStage::Finalizing, "complete the analysis")?;

        let mut next = self.snapshot.clone();
        next.status = AnalysisStage::Completed;
        next.current_step = format!(
            "Analysis completed: {} common, {} unique to {}, {} unique to {}",
            summary.common_count, summary.unique_a_count, self.brand1, summary.unique_b_count, self.brand2
        );
        next.progress = COMPLETED;

        self.emit(next);
        Ok(())
    }

    /// Moves the run into the terminal error stage from any non-terminal stage.
    pub fn fail(&mut self, message: &str) -> Result<()> {
        if self.snapshot.status.is_terminal() {
            return Err(anyhow!(
                "Cannot fail an analysis that is already {}",
                self.snapshot.status
            ));
        }

        let mut next = self.snapshot.clone();
        next.status = AnalysisStage::Error;
        next.current_step = "Analysis failed".to_string();
        next.error = Some(message.to_string());
        next.current_brand = None;

        for step in [
            &mut next.steps.brand_discovery,
            &mut next.steps.brand1_analysis,
            &mut next.steps.brand2_analysis,
        ] {
            if step.status == StepStatus::InProgress {
                step.status = StepStatus::Error;
                step.message = message.to_string();
            }
        }

        self.emit(next);
        Ok(())
    }

    fn expect_stage(&self, expected: AnalysisStage, action: &str) -> Result<()> {
        if self.snapshot.status != expected {
            return Err(anyhow!(
                "Cannot {} while the analysis is {} (expected {})",
                action,
                self.snapshot.status,
                expected
            ));
        }
        Ok(())
    }

    fn emit(&mut self, next: AnalysisProgress) {
        debug_assert!(next.is_consistent(), "inconsistent snapshot: {:?}", next);
        self.snapshot = next;
        self.sink.on_progress(&self.snapshot);
    }
}

fn in_progress(message: String) -> StepProgress {
    StepProgress {
        status: StepStatus::InProgress,
        found: 0,
        message,
    }
}

fn completed(found: usize, message: String) -> StepProgress {
    StepProgress {
        status: StepStatus::Completed,
        found,
        message,
    }
}
