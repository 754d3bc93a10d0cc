//! Round history, the event log and periodic summaries.

use factor_core::{EventTag, RoundResult, Sector};
use serde::{Deserialize, Serialize};

/// Append-only record of completed rounds, oldest first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    rounds: Vec<RoundResult>,
}

impl History {
    pub(crate) fn push(&mut self, result: RoundResult) {
        self.rounds.push(result);
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoundResult> {
        self.rounds.iter()
    }

    pub fn last(&self) -> Option<&RoundResult> {
        self.rounds.last()
    }

    /// Result of a given round; round numbers start at 1.
    pub fn get(&self, round_number: u32) -> Option<&RoundResult> {
        let idx = usize::try_from(round_number).ok()?.checked_sub(1)?;
        self.rounds.get(idx)
    }

    /// The last `n` rounds (fewer if history is shorter), for charts.
    pub fn recent(&self, n: usize) -> &[RoundResult] {
        let start = self.rounds.len().saturating_sub(n);
        &self.rounds[start..]
    }

    /// Aggregate the last `n` rounds, or `None` for an empty history.
    pub fn summary(&self, n: usize) -> Option<RoundSummary> {
        RoundSummary::from_rounds(self.recent(n))
    }
}

/// Totals across a window of rounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub first_round: u32,
    pub last_round: u32,
    pub sector_totals: [f64; Sector::COUNT],
    pub total_income: f64,
    /// Sector with the highest total; `None` when nothing was produced.
    pub leading_sector: Option<Sector>,
}

impl RoundSummary {
    pub fn from_rounds(rounds: &[RoundResult]) -> Option<Self> {
        let first = rounds.first()?;
        let last = rounds.last()?;
        let mut sector_totals = [0.0; Sector::COUNT];
        for r in rounds {
            for (total, out) in sector_totals.iter_mut().zip(r.outputs) {
                *total += out;
            }
        }
        let leading_sector = Sector::ALL
            .iter()
            .copied()
            .filter(|s| sector_totals[s.index()] > 0.0)
            .max_by(|a, b| sector_totals[a.index()].total_cmp(&sector_totals[b.index()]));
        Some(Self {
            first_round: first.round_number,
            last_round: last.round_number,
            sector_totals,
            total_income: rounds.iter().map(|r| r.total_income).sum(),
            leading_sector,
        })
    }

    pub fn average_income(&self) -> f64 {
        let n = self.last_round.saturating_sub(self.first_round) + 1;
        self.total_income / f64::from(n)
    }
}

/// One line of the event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub round: u32,
    pub tag: EventTag,
    pub message: String,
}

/// Chronological log of market events and purchases.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub(crate) fn record(&mut self, round: u32, tag: EventTag, message: String) {
        self.entries.push(LogEntry {
            round,
            tag,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
