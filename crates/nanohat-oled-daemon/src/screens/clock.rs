//! Clock screen: weekday, date and time.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use super::TEXT_X;
use crate::rendering::{FontSize, TextLine};

/// Lays out the clock for `now`.
pub fn clock_lines<Tz>(now: &DateTime<Tz>) -> Vec<TextLine>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    vec![
        TextLine::new(TEXT_X, 2, now.format("%A").to_string(), FontSize::Medium),
        TextLine::new(
            TEXT_X,
            20,
            now.format("%e %b %Y").to_string(),
            FontSize::Medium,
        ),
        TextLine::new(
            TEXT_X,
            36,
            now.format("%H:%M:%S").to_string(),
            FontSize::Large,
        ),
    ]
}
