use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::record::{Dimension, Metric, Metrics, Record};

/// Immutable record table, loaded once and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-blank year labels in order of first appearance.
    pub fn period_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for record in &self.records {
            let label = record.year_label.as_str();
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

/// Load the time-use CSV at `path`, converting every metric from minutes to hours.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_dataset(file)?;
    debug!(
        "loaded {} records ({} periods) from {}",
        dataset.len(),
        dataset.period_labels().len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse the time-use table from any reader. The header row is required.
pub fn read_dataset<R: Read>(source: R) -> Result<Dataset, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::locate(&headers)?;
    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        records.push(columns.record(&row, idx + 1)?);
    }
    Ok(Dataset::from_records(records))
}

struct ColumnIndex {
    year_label: usize,
    ms2_block: usize,
    ms3_rotation: usize,
    ms4_rotation: usize,
    metrics: [usize; 6],
}

impl ColumnIndex {
    fn locate(headers: &StringRecord) -> Result<Self, LoadError> {
        let mut metrics = [0usize; 6];
        for (slot, metric) in metrics.iter_mut().zip(Metric::ALL) {
            *slot = locate_column(headers, metric.column())?;
        }
        Ok(Self {
            year_label: locate_column(headers, Dimension::YearLabel.column())?,
            ms2_block: locate_column(headers, Dimension::Ms2Block.column())?,
            ms3_rotation: locate_column(headers, Dimension::Ms3Rotation.column())?,
            ms4_rotation: locate_column(headers, Dimension::Ms4Rotation.column())?,
            metrics,
        })
    }

    fn record(&self, row: &StringRecord, row_number: usize) -> Result<Record, LoadError> {
        let mut minutes = [0.0; 6];
        for ((slot, metric), &idx) in minutes.iter_mut().zip(Metric::ALL).zip(&self.metrics) {
            *slot = parse_minutes(row.get(idx), metric.column(), row_number)?;
        }
        Ok(Record {
            year_label: row.get(self.year_label).unwrap_or_default().to_string(),
            ms2_block: optional_cell(row.get(self.ms2_block)),
            ms3_rotation: optional_cell(row.get(self.ms3_rotation)),
            ms4_rotation: optional_cell(row.get(self.ms4_rotation)),
            metrics: Metrics::from_minutes(minutes),
        })
    }
}

fn locate_column(headers: &StringRecord, requested: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|name| name == requested)
        .or_else(|| {
            headers
                .iter()
                .position(|name| name.eq_ignore_ascii_case(requested))
        })
        .ok_or(LoadError::MissingColumn(requested))
}

fn is_blank(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

fn optional_cell(cell: Option<&str>) -> Option<String> {
    cell.filter(|v| !is_blank(v)).map(str::to_string)
}

/// Blank cells count as zero minutes, matching how the sums skip missing values.
fn parse_minutes(cell: Option<&str>, column: &'static str, row: usize) -> Result<f64, LoadError> {
    let raw = cell.unwrap_or_default();
    if is_blank(raw) {
        return Ok(0.0);
    }
    let value: f64 = raw
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| LoadError::InvalidMetric {
            row,
            column,
            value: raw.to_string(),
        })?;
    if value < 0.0 {
        return Err(LoadError::NegativeMetric { row, column, value });
    }
    Ok(value)
}
