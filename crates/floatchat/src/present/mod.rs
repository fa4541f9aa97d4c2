//! Terminal-side rendering of a result set: example prompts, a text table,
//! chart plans for an external plotting front end, and CSV export.

pub mod charts;
pub mod csv;
pub mod table;

pub use charts::{BoxStats, ChartPlan, ChartView, HistogramBin, MapPoint, ProfileSeries, plan_charts};
pub use csv::{DEFAULT_CSV_FILE, to_csv, write_csv};
pub use table::{DEFAULT_PREVIEW_ROWS, render_table};

pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Show me all floats with surface temperature above 30°C",
    "Find the saltiest water measurements",
    "Which floats are active near the equator?",
    "Compare temperature vs salinity",
    "Show me data from float 4903660",
    "What's the deepest measurement we have?",
];

/// Example by its 1-based position, as listed to the user.
#[must_use]
pub fn example_question(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|index| EXAMPLE_QUESTIONS.get(index).copied())
}

#[cfg(test)]
mod tests {
    use super::{EXAMPLE_QUESTIONS, example_question};

    #[test]
    fn examples_are_numbered_from_one() {
        assert_eq!(EXAMPLE_QUESTIONS.len(), 6);
        assert_eq!(example_question(0), None);
        assert_eq!(example_question(5), Some("Show me data from float 4903660"));
        assert_eq!(example_question(7), None);
    }
}
