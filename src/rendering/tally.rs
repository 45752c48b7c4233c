//! Tally to chart transform: percentages, weight and progress bar cells.

use serde::{Deserialize, Serialize};

/// Output of [`transform`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallySummary {
    /// Sum of all tallies
    pub weight: u64,
    /// One entry per tally, one decimal place. Empty when `weight == 0`.
    pub percentages: Vec<f64>,
}

impl TallySummary {
    /// Nothing to chart yet; callers must render the "no results" state.
    pub fn has_results(&self) -> bool {
        self.weight > 0
    }
}

/// Convert raw vote counts into a weight and per-choice percentages.
///
/// Each percentage is rounded independently, so the row values are not
/// guaranteed to add up to exactly 100.
pub fn transform(tallies: &[u64]) -> TallySummary {
    let weight = tallies.iter().fold(0u64, |acc, t| acc.saturating_add(*t));
    if weight == 0 {
        return TallySummary { weight, percentages: Vec::new() };
    }

    let percentages = tallies
        .iter()
        .map(|t| (*t as f64 / weight as f64 * 1000.0).round() / 10.0)
        .collect();

    TallySummary { weight, percentages }
}

/// Parameters for drawing one progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSpec {
    pub percent: f64,
    pub total_steps: u32,
}

impl BarSpec {
    pub fn new(percent: f64, total_steps: u32) -> Self {
        Self { percent: percent.clamp(0.0, 100.0), total_steps }
    }

    pub fn filled_count(&self) -> u32 {
        filled_count(self.percent, self.total_steps)
    }

    pub fn tokens(&self) -> Vec<BarToken> {
        render_bar(self.percent, self.total_steps)
    }
}

/// One cell of a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarToken {
    Filled,
    Empty,
}

impl BarToken {
    /// Monospace glyph used by text-capable renderers.
    pub fn glyph(self) -> char {
        match self {
            BarToken::Filled => '█',
            BarToken::Empty => '░',
        }
    }
}

fn filled_count(percent: f64, total_steps: u32) -> u32 {
    let raw = (percent * total_steps as f64 / 100.0).round();
    if raw <= 0.0 {
        0
    } else {
        (raw as u32).min(total_steps)
    }
}

/// Produce `total_steps` cells: the filled ones first, then the empty ones.
pub fn render_bar(percent: f64, total_steps: u32) -> Vec<BarToken> {
    let filled = filled_count(percent, total_steps) as usize;
    let mut cells = vec![BarToken::Filled; filled];
    cells.resize(total_steps as usize, BarToken::Empty);
    cells
}

/// Glyph string form of [`render_bar`].
pub fn bar_glyphs(percent: f64, total_steps: u32) -> String {
    render_bar(percent, total_steps).into_iter().map(BarToken::glyph).collect()
}
