use serde::{Deserialize, Serialize};

use crate::aggregate::AggregationResult;
use crate::filter::PeriodFilter;
use crate::record::{Dimension, Metric};

pub const Y_AXIS_LABEL: &str = "Time (Hours)";

/// Qualitative "Bold" palette. Bars take colours in order and wrap around.
pub const BOLD_PALETTE: [Color; 11] = [
    Color(0x7F3C8D),
    Color(0x11A579),
    Color(0x3969AC),
    Color(0xF2B701),
    Color(0xE73F74),
    Color(0x80BA5A),
    Color(0xE68310),
    Color(0x008695),
    Color(0xCF1C90),
    Color(0xF97B72),
    Color(0xA5AA99),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

/// 0xRRGGBB
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    pub fn hex(self) -> String {
        format!("#{:06X}", self.0 & 0xFF_FFFF)
    }
}

pub fn palette_color(index: usize) -> Color {
    BOLD_PALETTE[index % BOLD_PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: Color,
    /// Text drawn inside the bar, if any.
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Series {
    Bar(BarSeries),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn bars(&self) -> impl Iterator<Item = &Bar> {
        self.series.iter().flat_map(|series| match series {
            Series::Bar(bars) => bars.bars.iter(),
        })
    }

    /// Largest bar value, or 0 for an empty chart.
    pub fn max_value(&self) -> f64 {
        self.bars().map(|b| b.value).fold(0.0, f64::max)
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

/// The six charts plus summary text for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSet {
    pub heading: String,
    pub total: Figure,
    /// One chart per [`Metric::ACTIVITIES`] entry, same order.
    pub activities: Vec<Figure>,
    pub summary: String,
}

impl ChartSet {
    /// Every chart with the metric it plots, total first.
    pub fn figures(&self) -> impl Iterator<Item = (Metric, &Figure)> {
        std::iter::once((Metric::Total, &self.total))
            .chain(Metric::ACTIVITIES.into_iter().zip(self.activities.iter()))
    }
}

/// Whole hours for bar labels. Halves round to even.
pub fn round_hours(hours: f64) -> i64 {
    hours.round_ties_even() as i64
}

pub fn format_total(hours: f64) -> String {
    // -0.0 + 0.0 is +0.0
    format!("Total Time: {:.2} hours", hours + 0.0)
}

fn total_title(dimension: Dimension) -> String {
    match dimension {
        Dimension::YearLabel => "Time Spent by Year Label".to_string(),
        other => format!("Time Spent by {} in Hours", other.column()),
    }
}

fn activity_title(metric: Metric) -> String {
    format!("Time Spent on {} in Hours", metric.label())
}

/// Bar chart of `metric` per group of `aggregation`.
pub fn metric_figure(
    aggregation: &AggregationResult,
    dimension: Dimension,
    metric: Metric,
    annotate: bool,
) -> Figure {
    let title = match metric {
        Metric::Total => total_title(dimension),
        other => activity_title(other),
    };
    let bars = aggregation
        .series(metric)
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| Bar {
            label,
            value,
            color: palette_color(i),
            annotation: annotate.then(|| round_hours(value).to_string()),
        })
        .collect();
    let mut fig = Figure::new(Some(title));
    fig.x.label = Some(dimension.column().to_string());
    fig.y.label = Some(Y_AXIS_LABEL.to_string());
    fig.add_series(Series::Bar(BarSeries {
        name: metric.column().to_string(),
        bars,
    }));
    fig
}

/// Build every chart for one selection. Pure: no state survives between calls.
pub fn synthesize(
    aggregation: &AggregationResult,
    dimension: Dimension,
    period: &PeriodFilter,
) -> ChartSet {
    ChartSet {
        heading: period.heading(),
        total: metric_figure(aggregation, dimension, Metric::Total, true),
        activities: Metric::ACTIVITIES
            .into_iter()
            .map(|metric| metric_figure(aggregation, dimension, metric, false))
            .collect(),
        summary: format_total(aggregation.grand_total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, GroupKey, GroupTotals};
    use crate::record::{Metrics, Record};

    fn block_record(block: &str, total: f64, anki: f64) -> Record {
        Record {
            year_label: "Y1".into(),
            ms2_block: Some(block.into()),
            ms3_rotation: None,
            ms4_rotation: None,
            metrics: Metrics::from_minutes([total, anki, 0.0, 0.0, 0.0, 0.0]),
        }
    }

    fn scenario() -> AggregationResult {
        let records = [
            block_record("A", 120.0, 60.0),
            block_record("B", 60.0, 30.0),
        ];
        let refs: Vec<&Record> = records.iter().collect();
        aggregate(&refs, Dimension::Ms2Block)
    }

    fn values(fig: &Figure) -> Vec<f64> {
        fig.bars().map(|b| b.value).collect()
    }

    #[test]
    fn builds_six_charts_and_summary() {
        let charts = synthesize(&scenario(), Dimension::Ms2Block, &PeriodFilter::from("Y1"));
        assert_eq!(charts.activities.len(), 5);
        assert_eq!(charts.figures().count(), 6);
        assert_eq!(charts.summary, "Total Time: 3.00 hours");
        assert_eq!(charts.heading, "Y1 of Medical School");
        assert_eq!(
            charts.total.title.as_deref(),
            Some("Time Spent by MS2Block in Hours")
        );
        assert_eq!(values(&charts.total), vec![2.0, 1.0]);
        assert_eq!(values(&charts.activities[0]), vec![1.0, 0.5]);
    }

    #[test]
    fn titles_and_axes() {
        let charts = synthesize(&scenario(), Dimension::Ms2Block, &PeriodFilter::All);
        let titles: Vec<&str> = charts
            .activities
            .iter()
            .filter_map(|f| f.title.as_deref())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Time Spent on Anki in Hours",
                "Time Spent on Volunteering in Hours",
                "Time Spent on Research in Hours",
                "Time Spent on Other Activities in Hours",
                "Time Spent on Self-Study in Hours",
            ]
        );
        for (_, fig) in charts.figures() {
            assert_eq!(fig.x.label.as_deref(), Some("MS2Block"));
            assert_eq!(fig.y.label.as_deref(), Some(Y_AXIS_LABEL));
        }
    }

    #[test]
    fn year_label_title_names_year_label() {
        let fig = metric_figure(&scenario(), Dimension::YearLabel, Metric::Total, true);
        assert!(fig.title.unwrap().contains("Year Label"));
    }

    #[test]
    fn only_total_chart_is_annotated() {
        let charts = synthesize(&scenario(), Dimension::Ms2Block, &PeriodFilter::All);
        let labels: Vec<Option<&str>> = charts
            .total
            .bars()
            .map(|b| b.annotation.as_deref())
            .collect();
        assert_eq!(labels, vec![Some("2"), Some("1")]);
        assert!(charts
            .activities
            .iter()
            .all(|fig| fig.bars().all(|b| b.annotation.is_none())));
    }

    #[test]
    fn annotation_rounds_half_to_even() {
        assert_eq!(round_hours(2.5), 2);
        assert_eq!(round_hours(3.5), 4);
        assert_eq!(round_hours(7.49), 7);
        assert_eq!(round_hours(0.0), 0);
    }

    #[test]
    fn palette_wraps_when_groups_exceed_it() {
        let groups: Vec<GroupTotals> = (0..13)
            .map(|i| GroupTotals {
                key: GroupKey::Value(format!("G{:02}", i)),
                record_count: 1,
                sums: Metrics::default(),
            })
            .collect();
        let aggregation = AggregationResult {
            dimension: Dimension::Ms3Rotation,
            groups,
            grand_total: 0.0,
        };
        let fig = metric_figure(&aggregation, Dimension::Ms3Rotation, Metric::Anki, false);
        let colors: Vec<Color> = fig.bars().map(|b| b.color).collect();
        assert_eq!(colors[0], BOLD_PALETTE[0]);
        assert_eq!(colors[10], BOLD_PALETTE[10]);
        assert_eq!(colors[11], BOLD_PALETTE[0]);
        assert_eq!(colors[12], BOLD_PALETTE[1]);
    }

    #[test]
    fn empty_aggregation_gives_empty_charts() {
        let empty = aggregate(&[], Dimension::YearLabel);
        let charts = synthesize(&empty, Dimension::YearLabel, &PeriodFilter::from("MS9"));
        assert_eq!(charts.summary, "Total Time: 0.00 hours");
        assert!(charts.figures().all(|(_, fig)| fig.bars().count() == 0));
        assert_eq!(charts.total.max_value(), 0.0);
    }

    #[test]
    fn negative_zero_total_prints_as_zero() {
        assert_eq!(format_total(-0.0), "Total Time: 0.00 hours");
        assert_eq!(format_total(3.0), "Total Time: 3.00 hours");
    }

    #[test]
    fn color_channels() {
        assert_eq!(Color(0x7F3C8D).rgb(), (0x7F, 0x3C, 0x8D));
        assert_eq!(Color(0x008695).hex(), "#008695");
    }
}
