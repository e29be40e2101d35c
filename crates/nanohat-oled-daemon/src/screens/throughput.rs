//! Throughput test screens.

use super::{row_y, TEXT_X};
use crate::rendering::{FontSize, TextLine};
use crate::sensors::Direction;

/// Shown while a measurement runs.
pub fn progress_lines(direction: Direction) -> Vec<TextLine> {
    vec![TextLine::new(
        TEXT_X,
        row_y(0),
        format!("{} test...", direction.label()),
        FontSize::Normal,
    )]
}

/// One row per interval rate.
pub fn rate_lines(rates: &[String]) -> Vec<TextLine> {
    rates
        .iter()
        .enumerate()
        .map(|(row, rate)| TextLine::new(TEXT_X, row_y(row), rate.clone(), FontSize::Normal))
        .collect()
}
