use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How the final score is derived from the session counters. The default
/// rewards volume weighted by precision; the subtractive form is kept as an
/// alternative for setups that prefer a flat error penalty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    #[default]
    AccuracyWeighted,
    LinearPenalty,
}

/// One live wpm reading, taken at `t` seconds into the session. Feeds the
/// results chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WpmSample {
    pub t: f64,
    pub wpm: f64,
}

/// Final figures for one finished session. Derived purely from the counters
/// and the elapsed wall time, so it is checkable from triples alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    pub correct_chars: u64,
    pub total_chars: u64,
    pub elapsed_secs: u64,
    pub accuracy: f64,
    pub wpm: f64,
    pub score: f64,
}

impl SessionSummary {
    pub fn compute(
        correct_chars: u64,
        total_chars: u64,
        elapsed_ms: u64,
        policy: ScorePolicy,
    ) -> Self {
        // Sub-second sessions are floored to one second so the wpm division
        // is always defined.
        let elapsed_secs = (elapsed_ms / 1000).max(1);
        let accuracy = accuracy(correct_chars, total_chars);
        let wpm = words_per_minute(correct_chars, elapsed_secs);
        let score = match policy {
            ScorePolicy::AccuracyWeighted => {
                (correct_chars as f64 * 10.0 * accuracy / 100.0).floor()
            }
            ScorePolicy::LinearPenalty => {
                correct_chars as f64 * 10.0 - (total_chars - correct_chars) as f64 * 5.0
            }
        };

        Self {
            correct_chars,
            total_chars,
            elapsed_secs,
            accuracy,
            wpm,
            score,
        }
    }
}

/// Percentage of charged keystrokes that were credited, 0 when nothing has
/// been typed yet.
pub fn accuracy(correct_chars: u64, total_chars: u64) -> f64 {
    if total_chars == 0 {
        0.0
    } else {
        correct_chars as f64 / total_chars as f64 * 100.0
    }
}

/// Five credited characters count as one word.
pub fn words_per_minute(correct_chars: u64, elapsed_secs: u64) -> f64 {
    if elapsed_secs == 0 {
        0.0
    } else {
        (correct_chars as f64 / 5.0) / (elapsed_secs as f64 / 60.0)
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        None
    } else {
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }
}

/// Population standard deviation; used for the consistency figure on the
/// results screen.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}
