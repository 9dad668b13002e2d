//! RunResult and RunStats (§3).

use serde::{Deserialize, Serialize};

use super::{Lead, Verdict};

/// The final output of one orchestrator run (§4.O, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub leads: Vec<Lead>,
    pub total_discovered: usize,
    pub total_after_filter: usize,
    pub pages_scraped: usize,
    pub duration_seconds: f64,
    pub errors: Vec<String>,
    /// Set when the run ended via cooperative `SessionLimitReached`
    /// termination rather than full completion (§7 scenario 5).
    pub partial: bool,
}

impl RunResult {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            leads: Vec::new(),
            total_discovered: 0,
            total_after_filter: 0,
            pages_scraped: 0,
            duration_seconds: 0.0,
            errors: Vec::new(),
            partial: false,
        }
    }

    /// Push an error, keeping only the most recent `MAX_RUN_ERRORS` (§7).
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        if self.errors.len() > crate::utils::MAX_RUN_ERRORS {
            let overflow = self.errors.len() - crate::utils::MAX_RUN_ERRORS;
            self.errors.drain(0..overflow);
        }
    }
}

/// Per-stage counters accumulated across a run (§3, §4.O).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub directory_pages_scraped: usize,
    pub directory_listings_found: usize,
    pub directory_leads_created: usize,

    pub map_pages_scraped: usize,
    pub map_listings_found: usize,
    pub map_leads_created: usize,

    pub duplicates_found: usize,
    pub merged: usize,

    pub websites_checked: usize,
    pub verdict_old: usize,
    pub verdict_modern: usize,
    pub verdict_unknown: usize,
    pub verdict_absent: usize,

    pub leads_after_filter: usize,
    pub leads_exported: usize,
}

impl RunStats {
    pub fn record_verdict(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Old => self.verdict_old += 1,
            Verdict::Modern => self.verdict_modern += 1,
            Verdict::Absent => self.verdict_absent += 1,
            Verdict::Unknown | Verdict::NotYetChecked => self.verdict_unknown += 1,
        }
    }
}
