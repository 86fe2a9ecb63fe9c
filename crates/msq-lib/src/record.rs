use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::InvalidDimensionError;

/// Source columns are logged in minutes; everything downstream works in hours.
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// One of the six tracked time quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Total,
    Anki,
    Volunteering,
    Research,
    Other,
    SelfStudy,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Total,
        Metric::Anki,
        Metric::Volunteering,
        Metric::Research,
        Metric::Other,
        Metric::SelfStudy,
    ];

    /// The five activity metrics, in chart order.
    pub const ACTIVITIES: [Metric; 5] = [
        Metric::Anki,
        Metric::Volunteering,
        Metric::Research,
        Metric::Other,
        Metric::SelfStudy,
    ];

    /// Header of the minute-valued source column.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Total => "Sum",
            Metric::Anki => "Anki",
            Metric::Volunteering => "Volunteering",
            Metric::Research => "Research",
            Metric::Other => "Other",
            Metric::SelfStudy => "Self-Study",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Total => "Total",
            Metric::Anki => "Anki",
            Metric::Volunteering => "Volunteering",
            Metric::Research => "Research",
            Metric::Other => "Other Activities",
            Metric::SelfStudy => "Self-Study",
        }
    }

    /// Short lowercase name, used for output file names.
    pub fn slug(self) -> &'static str {
        match self {
            Metric::Total => "total",
            Metric::Anki => "anki",
            Metric::Volunteering => "volunteering",
            Metric::Research => "research",
            Metric::Other => "other",
            Metric::SelfStudy => "self-study",
        }
    }
}

/// Six metric values, either for a single record or summed over a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total: f64,
    pub anki: f64,
    pub volunteering: f64,
    pub research: f64,
    pub other: f64,
    pub self_study: f64,
}

impl Metrics {
    /// Build from raw minute values given in [`Metric::ALL`] order.
    pub fn from_minutes(minutes: [f64; 6]) -> Self {
        let mut metrics = Metrics::default();
        for (metric, value) in Metric::ALL.into_iter().zip(minutes) {
            *metrics.get_mut(metric) = value / MINUTES_PER_HOUR;
        }
        metrics
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Total => self.total,
            Metric::Anki => self.anki,
            Metric::Volunteering => self.volunteering,
            Metric::Research => self.research,
            Metric::Other => self.other,
            Metric::SelfStudy => self.self_study,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Total => &mut self.total,
            Metric::Anki => &mut self.anki,
            Metric::Volunteering => &mut self.volunteering,
            Metric::Research => &mut self.research,
            Metric::Other => &mut self.other,
            Metric::SelfStudy => &mut self.self_study,
        }
    }

    pub fn add(&mut self, other: &Metrics) {
        for metric in Metric::ALL {
            *self.get_mut(metric) += other.get(metric);
        }
    }
}

/// Categorical field used to group filtered records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    #[serde(rename = "yearLabel")]
    YearLabel,
    #[serde(rename = "MS2Block")]
    Ms2Block,
    #[serde(rename = "MS3Rotation")]
    Ms3Rotation,
    #[serde(rename = "MS4Rotation")]
    Ms4Rotation,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::YearLabel,
        Dimension::Ms2Block,
        Dimension::Ms3Rotation,
        Dimension::Ms4Rotation,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::YearLabel => "yearLabel",
            Dimension::Ms2Block => "MS2Block",
            Dimension::Ms3Rotation => "MS3Rotation",
            Dimension::Ms4Rotation => "MS4Rotation",
        }
    }

    /// Human label shown in selection menus.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::YearLabel => "Year Label",
            other => other.column(),
        }
    }

    /// Value of this dimension on `record`; `None` when the cell was blank.
    pub fn value(self, record: &Record) -> Option<&str> {
        match self {
            Dimension::YearLabel => Some(record.year_label.as_str()).filter(|v| !v.is_empty()),
            Dimension::Ms2Block => record.ms2_block.as_deref(),
            Dimension::Ms3Rotation => record.ms3_rotation.as_deref(),
            Dimension::Ms4Rotation => record.ms4_rotation.as_deref(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = InvalidDimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Dimension::ALL
            .into_iter()
            .find(|d| d.column() == trimmed)
            .or_else(|| {
                Dimension::ALL
                    .into_iter()
                    .find(|d| d.column().eq_ignore_ascii_case(trimmed))
            })
            .ok_or_else(|| InvalidDimensionError(s.to_string()))
    }
}

/// One logged time-use entry, metrics already normalized to hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub year_label: String,
    pub ms2_block: Option<String>,
    pub ms3_rotation: Option<String>,
    pub ms4_rotation: Option<String>,
    pub metrics: Metrics,
}
