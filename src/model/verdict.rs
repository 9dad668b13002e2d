//! WebsiteVerdict (§3): the classifier's terminal state for a website.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The classifier's categorical output, independent of how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Absent,
    Old,
    Modern,
    Unknown,
    NotYetChecked,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "keine_website",
            Self::Old => "alt",
            Self::Modern => "modern",
            Self::Unknown => "unklar",
            Self::NotYetChecked => "nicht_geprueft",
        }
    }
}

/// Which probe level(s) of the cascade (§4.L) actually ran for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeLevel {
    Url,
    Header,
    Html,
}

impl ProbeLevel {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Header => "header",
            Self::Html => "html",
        }
    }
}

/// The full verdict record embedded in a `Lead` (§3).
///
/// Transitions: `NotYetChecked` -> any terminal state, once, via the
/// classifier; there are no other transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteVerdict {
    pub verdict: Verdict,
    pub signals: Vec<String>,
    pub check_methods: BTreeSet<ProbeLevel>,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

impl Default for WebsiteVerdict {
    fn default() -> Self {
        Self {
            verdict: Verdict::NotYetChecked,
            signals: Vec::new(),
            check_methods: BTreeSet::new(),
            elapsed_ms: 0,
            error: None,
        }
    }
}

impl WebsiteVerdict {
    #[must_use]
    pub fn absent() -> Self {
        Self {
            verdict: Verdict::Absent,
            ..Self::default()
        }
    }

    /// Append a signal already prefixed with its stage (`url:…`, `header:…`, `html:…`)
    /// and record that stage as having run.
    pub fn add_signal(&mut self, level: ProbeLevel, signal: impl Into<String>) {
        self.check_methods.insert(level);
        let signal = signal.into();
        if !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
    }
}
