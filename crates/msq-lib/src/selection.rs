use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregate::{aggregate, AggregationResult};
use crate::filter::{filter, period_options, PeriodFilter};
use crate::io::dataset::Dataset;
use crate::plot::{synthesize, ChartSet};
use crate::record::Dimension;

/// The two user-chosen parameters. Defaults to every period grouped by year label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub period: PeriodFilter,
    pub dimension: Dimension,
}

impl Selection {
    pub fn new(period: PeriodFilter, dimension: Dimension) -> Self {
        Self { period, dimension }
    }
}

/// Everything rendered for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub selection: Selection,
    pub aggregation: AggregationResult,
    pub charts: ChartSet,
}

/// Run filter → aggregate → synthesize from scratch for `selection`.
pub fn recompute(dataset: &Dataset, selection: &Selection) -> Dashboard {
    let records = filter(dataset, &selection.period);
    let aggregation = aggregate(&records, selection.dimension);
    let charts = synthesize(&aggregation, selection.dimension, &selection.period);
    debug!(
        "recomputed '{}' by {}: {} of {} records, {}",
        selection.period,
        selection.dimension,
        records.len(),
        dataset.len(),
        charts.summary
    );
    Dashboard {
        selection: selection.clone(),
        aggregation,
        charts,
    }
}

/// Per-session selection state. Every change recomputes the whole dashboard.
pub struct SelectionController {
    dataset: Arc<Dataset>,
    periods: Vec<PeriodFilter>,
    selection: Selection,
    dashboard: Dashboard,
}

impl SelectionController {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self::with_selection(dataset, Selection::default())
    }

    pub fn with_selection(dataset: Arc<Dataset>, selection: Selection) -> Self {
        let periods = period_options(&dataset);
        let dashboard = recompute(&dataset, &selection);
        Self {
            dataset,
            periods,
            selection,
            dashboard,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Period menu entries, all-periods first.
    pub fn periods(&self) -> &[PeriodFilter] {
        &self.periods
    }

    pub fn select(&mut self, selection: Selection) -> &Dashboard {
        self.selection = selection;
        self.refresh()
    }

    pub fn set_period(&mut self, period: PeriodFilter) -> &Dashboard {
        self.selection.period = period;
        self.refresh()
    }

    pub fn set_dimension(&mut self, dimension: Dimension) -> &Dashboard {
        self.selection.dimension = dimension;
        self.refresh()
    }

    /// Move `step` entries through the period menu, wrapping at either end.
    pub fn cycle_period(&mut self, step: isize) -> &Dashboard {
        let current = self
            .periods
            .iter()
            .position(|p| *p == self.selection.period)
            .unwrap_or(0);
        let next = wrap_index(current, step, self.periods.len());
        self.set_period(self.periods[next].clone())
    }

    pub fn cycle_dimension(&mut self, step: isize) -> &Dashboard {
        let current = Dimension::ALL
            .iter()
            .position(|d| *d == self.selection.dimension)
            .unwrap_or(0);
        let next = wrap_index(current, step, Dimension::ALL.len());
        self.set_dimension(Dimension::ALL[next])
    }

    fn refresh(&mut self) -> &Dashboard {
        self.dashboard = recompute(&self.dataset, &self.selection);
        &self.dashboard
    }
}

fn wrap_index(current: usize, step: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + step).rem_euclid(len as isize) as usize
}
