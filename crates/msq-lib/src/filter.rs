use serde::{Deserialize, Serialize};
use std::fmt;

use crate::io::dataset::Dataset;
use crate::record::Record;

/// Menu entry that selects every period at once.
pub const ALL_PERIODS: &str = "All of med school";

/// Period predicate: either the whole dataset or a single `yearLabel` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeriodFilter {
    #[default]
    All,
    Label(String),
}

impl PeriodFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            PeriodFilter::All => true,
            PeriodFilter::Label(label) => record.year_label == *label,
        }
    }

    /// Page heading for the selected period.
    pub fn heading(&self) -> String {
        match self {
            PeriodFilter::All => "All of Medical School".to_string(),
            PeriodFilter::Label(label) => format!("{} of Medical School", label),
        }
    }
}

impl From<&str> for PeriodFilter {
    fn from(value: &str) -> Self {
        if value == ALL_PERIODS {
            PeriodFilter::All
        } else {
            PeriodFilter::Label(value.to_string())
        }
    }
}

impl From<String> for PeriodFilter {
    fn from(value: String) -> Self {
        if value == ALL_PERIODS {
            PeriodFilter::All
        } else {
            PeriodFilter::Label(value)
        }
    }
}

impl From<PeriodFilter> for String {
    fn from(value: PeriodFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodFilter::All => f.write_str(ALL_PERIODS),
            PeriodFilter::Label(label) => f.write_str(label),
        }
    }
}

/// Records matching `period`, in dataset order. An unknown label yields an empty set.
pub fn filter<'a>(dataset: &'a Dataset, period: &PeriodFilter) -> Vec<&'a Record> {
    dataset
        .records()
        .iter()
        .filter(|record| period.matches(record))
        .collect()
}

/// Selectable periods: the all-periods entry followed by each label in the dataset.
pub fn period_options(dataset: &Dataset) -> Vec<PeriodFilter> {
    std::iter::once(PeriodFilter::All)
        .chain(dataset.period_labels().into_iter().map(PeriodFilter::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metrics;

    fn record(label: &str, total_minutes: f64) -> Record {
        Record {
            year_label: label.into(),
            ms2_block: None,
            ms3_rotation: None,
            ms4_rotation: None,
            metrics: Metrics::from_minutes([total_minutes, 0.0, 0.0, 0.0, 0.0, 0.0]),
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            record("MS1", 60.0),
            record("MS2", 120.0),
            record("MS1", 180.0),
            record("MS3", 240.0),
        ])
    }

    #[test]
    fn all_periods_returns_every_record() {
        let dataset = dataset();
        let out = filter(&dataset, &PeriodFilter::All);
        assert_eq!(out.len(), dataset.len());
        for (a, b) in out.iter().zip(dataset.records()) {
            assert!(std::ptr::eq(*a, b));
        }
    }

    #[test]
    fn label_keeps_matching_records_in_order() {
        let dataset = dataset();
        let out = filter(&dataset, &PeriodFilter::from("MS1"));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.year_label == "MS1"));
        assert_eq!(out[0].metrics.total, 1.0);
        assert_eq!(out[1].metrics.total, 3.0);
    }

    #[test]
    fn unknown_label_is_empty_not_an_error() {
        let dataset = dataset();
        assert!(filter(&dataset, &PeriodFilter::from("MS9")).is_empty());
    }

    #[test]
    fn sentinel_text_round_trips() {
        assert_eq!(PeriodFilter::from(ALL_PERIODS), PeriodFilter::All);
        assert_eq!(PeriodFilter::All.to_string(), ALL_PERIODS);
        assert_eq!(
            serde_json::to_string(&PeriodFilter::Label("MS2".into())).unwrap(),
            "\"MS2\""
        );
        let parsed: PeriodFilter = serde_json::from_str("\"All of med school\"").unwrap();
        assert_eq!(parsed, PeriodFilter::All);
    }

    #[test]
    fn options_start_with_sentinel() {
        let options = period_options(&dataset());
        assert_eq!(
            options,
            vec![
                PeriodFilter::All,
                PeriodFilter::from("MS1"),
                PeriodFilter::from("MS2"),
                PeriodFilter::from("MS3"),
            ]
        );
    }

    #[test]
    fn headings_follow_selection() {
        assert_eq!(PeriodFilter::All.heading(), "All of Medical School");
        assert_eq!(PeriodFilter::from("MS2").heading(), "MS2 of Medical School");
    }
}
