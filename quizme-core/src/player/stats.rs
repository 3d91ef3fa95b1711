//! Completion statistics shown when a session ends

use serde::{Deserialize, Serialize};

/// Summary of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    /// Questions answered correctly
    pub correct: usize,
    /// Questions in the quiz
    pub total: usize,
    /// Questions skipped
    pub skipped: usize,
    /// Seconds spent in the session
    pub elapsed_secs: u64,
}

impl CompletionStats {
    /// Percentage of correct answers, rounded to the nearest integer
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (100.0 * self.correct as f64 / self.total as f64).round() as u32
    }

    /// Elapsed time as `M:SS`
    pub fn formatted_time(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }

    /// Qualitative tier for the percentage
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::for_percentage(self.percentage())
    }
}

/// Format seconds as minutes and zero-padded seconds
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Performance tiers, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    /// 90% and above
    Exceptional,
    /// 70% and above
    Good,
    /// 50% and above
    Fair,
    /// Below 50%
    KeepPracticing,
}

impl PerformanceTier {
    /// Lower bounds, checked in order
    const THRESHOLDS: [(u32, PerformanceTier); 3] = [
        (90, PerformanceTier::Exceptional),
        (70, PerformanceTier::Good),
        (50, PerformanceTier::Fair),
    ];

    /// Tier for a percentage
    pub fn for_percentage(percentage: u32) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(min, _)| percentage >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(PerformanceTier::KeepPracticing)
    }

    /// Short heading
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceTier::Exceptional => "Outstanding!",
            PerformanceTier::Good => "Great job!",
            PerformanceTier::Fair => "Not bad!",
            PerformanceTier::KeepPracticing => "Keep practicing!",
        }
    }

    /// Encouragement line
    pub fn message(&self) -> &'static str {
        match self {
            PerformanceTier::Exceptional => "You have mastered this material.",
            PerformanceTier::Good => "You know this topic well.",
            PerformanceTier::Fair => "A little more review will get you there.",
            PerformanceTier::KeepPracticing => "Every attempt makes the next one easier.",
        }
    }
}
