use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use msq_lib::{
    config::DashboardConfig,
    filter::{period_options, PeriodFilter, ALL_PERIODS},
    io::dataset::load_dataset,
    plot::{ChartSet, Figure, PlotBackend},
    record::{Dimension, Metric},
    selection::{recompute, Dashboard, Selection},
    Dataset,
};
use plotters::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "msq",
    version,
    about = "Medical School Quantified: filter, group and chart the time-use log"
)]
struct Cli {
    /// Optional TOML config (dataset path, plot size)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Time-use CSV; overrides the config file
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SelectionArgs {
    /// Year label to keep, or "All of med school"
    #[arg(long, default_value = ALL_PERIODS)]
    period: String,
    /// Grouping dimension: yearLabel, MS2Block, MS3Rotation or MS4Rotation
    #[arg(long, default_value = "yearLabel")]
    dimension: String,
}

impl SelectionArgs {
    fn selection(&self) -> Result<Selection> {
        let dimension: Dimension = self.dimension.parse()?;
        Ok(Selection::new(
            PeriodFilter::from(self.period.as_str()),
            dimension,
        ))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List selectable periods, all-periods entry first
    Periods,
    /// Print the running total for a selection
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Emit aggregation and chart descriptors as JSON
    Charts {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long)]
        pretty: bool,
    },
    /// Write per-group sums (hours) as CSV
    Table {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Render all six charts to PNG files via plotters
    Plot {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let config = match &cli.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None => DashboardConfig::default(),
    };
    let data_path = cli.data.clone().unwrap_or_else(|| config.dataset.clone());
    let dataset = load_dataset(&data_path)
        .with_context(|| format!("loading dataset {}", data_path.display()))?;
    info!(
        "loaded {} records from {}",
        dataset.len(),
        data_path.display()
    );

    match cli.command {
        Commands::Periods => cmd_periods(&dataset),
        Commands::Summary { selection } => cmd_summary(&dataset, &selection.selection()?),
        Commands::Charts { selection, pretty } => {
            cmd_charts(&dataset, &selection.selection()?, pretty)?
        }
        Commands::Table { selection } => cmd_table(&dataset, &selection.selection()?)?,
        Commands::Plot {
            selection,
            out_dir,
            width,
            height,
        } => {
            let size = (
                width.unwrap_or(config.plot.width),
                height.unwrap_or(config.plot.height),
            );
            cmd_plot(&dataset, &selection.selection()?, &out_dir, size)?
        }
    }
    Ok(())
}

fn cmd_periods(dataset: &Dataset) {
    for period in period_options(dataset) {
        println!("{}", period);
    }
}

fn cmd_summary(dataset: &Dataset, selection: &Selection) {
    let dashboard = recompute(dataset, selection);
    println!("{}", dashboard.charts.summary);
}

fn cmd_charts(dataset: &Dataset, selection: &Selection, pretty: bool) -> Result<()> {
    let dashboard: Dashboard = recompute(dataset, selection);
    let js = if pretty {
        serde_json::to_string_pretty(&dashboard)?
    } else {
        serde_json::to_string(&dashboard)?
    };
    println!("{}", js);
    Ok(())
}

fn cmd_table(dataset: &Dataset, selection: &Selection) -> Result<()> {
    let dashboard = recompute(dataset, selection);
    let mut writer = csv::Writer::from_writer(io::stdout());
    let mut header = vec!["group".to_string(), "records".to_string()];
    header.extend(Metric::ALL.iter().map(|m| m.column().to_string()));
    writer.write_record(&header)?;
    for group in &dashboard.aggregation.groups {
        let mut row = vec![group.key.label().to_string(), group.record_count.to_string()];
        row.extend(Metric::ALL.iter().map(|m| group.sums.get(*m).to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_plot(
    dataset: &Dataset,
    selection: &Selection,
    out_dir: &Path,
    size: (u32, u32),
) -> Result<()> {
    let dashboard = recompute(dataset, selection);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    for (path, fig) in chart_paths(out_dir, &dashboard.charts) {
        let mut backend = PngBackend {
            path: path.clone(),
            size,
        };
        backend
            .draw(fig)
            .with_context(|| format!("rendering {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}

/// One PNG per chart, named after the metric it plots.
fn chart_paths<'a>(out_dir: &Path, charts: &'a ChartSet) -> Vec<(PathBuf, &'a Figure)> {
    charts
        .figures()
        .map(|(metric, fig)| (out_dir.join(format!("{}.png", metric.slug())), fig))
        .collect()
}

struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let root = BitMapBackend::new(self.path.as_path(), self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let labels: Vec<String> = fig.bars().map(|bar| bar.label.clone()).collect();
        let slots = labels.len().max(1);
        let y_max = (fig.max_value() * 1.1).max(1.0);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0..slots).into_segmented(), 0f64..y_max)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .x_labels(slots)
            .x_label_formatter(&|value: &SegmentValue<usize>| match value {
                SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;
        chart.draw_series(fig.bars().enumerate().map(|(i, bar)| {
            let (r, g, b) = bar.color.rgb();
            let mut rect = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), bar.value),
                ],
                RGBColor(r, g, b).filled(),
            );
            rect.set_margin(0, 0, 5, 5);
            rect
        }))?;
        chart.draw_series(fig.bars().enumerate().filter_map(|(i, bar)| {
            bar.annotation.as_ref().map(|text| {
                Text::new(
                    text.clone(),
                    (SegmentValue::CenterOf(i), bar.value / 2.0),
                    ("sans-serif", 16).into_font().color(&WHITE),
                )
            })
        }))?;
        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msq_lib::aggregate::aggregate;
    use msq_lib::plot::synthesize;

    #[test]
    fn one_png_per_chart() {
        let aggregation = aggregate(&[], Dimension::YearLabel);
        let charts = synthesize(&aggregation, Dimension::YearLabel, &PeriodFilter::All);
        let paths = chart_paths(Path::new("out"), &charts);
        let names: Vec<String> = paths
            .iter()
            .map(|(path, _)| path.display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                Path::new("out").join("total.png").display().to_string(),
                Path::new("out").join("anki.png").display().to_string(),
                Path::new("out").join("volunteering.png").display().to_string(),
                Path::new("out").join("research.png").display().to_string(),
                Path::new("out").join("other.png").display().to_string(),
                Path::new("out").join("self-study.png").display().to_string(),
            ]
        );
        assert!(std::ptr::eq(paths[0].1, &charts.total));
    }
}
