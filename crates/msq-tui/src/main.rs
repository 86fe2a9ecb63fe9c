use std::{
    io::{self, Stdout},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use msq_lib::{
    io::dataset::load_dataset,
    plot::Figure,
    record::Dimension,
    selection::SelectionController,
    Dataset,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("MedSchool.csv"));
    let dataset = load_dataset(&path).with_context(|| format!("loading {}", path.display()))?;
    let mut app = App::new(Arc::new(dataset));

    let mut terminal = setup_terminal()?;
    let outcome = run(&mut terminal, &mut app);
    restore_terminal()?;
    outcome
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(150);
    let mut last_tick = Instant::now();
    while !app.should_quit {
        terminal.draw(|f| draw(f, app))?;
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("initializing terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

struct App {
    controller: SelectionController,
    status: String,
    should_quit: bool,
}

impl App {
    fn new(dataset: Arc<Dataset>) -> Self {
        let controller = SelectionController::new(dataset);
        let status = format!(
            "{} records loaded. ↑/↓ period, ←/→ dimension, 1-4 pick dimension, q quits.",
            controller.dataset().len()
        );
        Self {
            controller,
            status,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Down | KeyCode::Char('p') => {
                self.controller.cycle_period(1);
            }
            KeyCode::Up | KeyCode::Char('P') => {
                self.controller.cycle_period(-1);
            }
            KeyCode::Right | KeyCode::Char('d') => {
                self.controller.cycle_dimension(1);
            }
            KeyCode::Left | KeyCode::Char('D') => {
                self.controller.cycle_dimension(-1);
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.controller.set_dimension(Dimension::ALL[idx]);
            }
            _ => return,
        }
        let selection = self.controller.selection();
        self.status = format!(
            "{} by {}: {}",
            selection.period,
            selection.dimension.label(),
            self.controller.dashboard().charts.summary
        );
    }
}

fn draw(f: &mut Frame, app: &App) {
    let size = f.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(size);
    draw_header(f, layout[0], app);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(layout[1]);
    draw_selectors(f, body[0], app);
    draw_charts(f, body[1], app);
    draw_status(f, layout[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let charts = &app.controller.dashboard().charts;
    let lines = vec![
        Line::from(charts.heading.clone()),
        Line::from(charts.summary.clone()),
    ];
    let header = Paragraph::new(lines)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Medical School Quantified"),
        );
    f.render_widget(header, area);
}

fn draw_selectors(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(area);
    let selection = app.controller.selection();

    let periods: Vec<ListItem> = app
        .controller
        .periods()
        .iter()
        .map(|p| ListItem::new(p.to_string()))
        .collect();
    let mut period_state = ListState::default();
    period_state.select(
        app.controller
            .periods()
            .iter()
            .position(|p| *p == selection.period),
    );
    let period_list = List::new(periods)
        .block(Block::default().borders(Borders::ALL).title("Year label"))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(period_list, rows[0], &mut period_state);

    let dimensions: Vec<ListItem> = Dimension::ALL
        .iter()
        .enumerate()
        .map(|(i, d)| ListItem::new(format!("{} {}", i + 1, d.label())))
        .collect();
    let mut dimension_state = ListState::default();
    dimension_state.select(Dimension::ALL.iter().position(|d| *d == selection.dimension));
    let dimension_list = List::new(dimensions)
        .block(Block::default().borders(Borders::ALL).title("Group by"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(dimension_list, rows[1], &mut dimension_state);
}

fn draw_charts(f: &mut Frame, area: Rect, app: &App) {
    let charts = &app.controller.dashboard().charts;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);
    render_figure(f, rows[0], &charts.total);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2); 2])
        .split(rows[2]);
    let cells = top.iter().chain(bottom.iter());
    for (fig, cell) in charts.activities.iter().zip(cells) {
        render_figure(f, *cell, fig);
    }
}

fn render_figure(f: &mut Frame, area: Rect, fig: &Figure) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(fig.title.clone().unwrap_or_default());
    let bars: Vec<Bar> = fig
        .bars()
        .map(|bar| {
            let (r, g, b) = bar.color.rgb();
            let color = Color::Rgb(r, g, b);
            Bar::default()
                .value(tenths(bar.value))
                .text_value(
                    bar.annotation
                        .clone()
                        .unwrap_or_else(|| format!("{:.1}", bar.value)),
                )
                .label(Line::from(bar.label.clone()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();
    if bars.is_empty() {
        let empty = Paragraph::new("No records for this selection.")
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(empty, area);
        return;
    }
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(area, bars.len()))
        .bar_gap(1);
    f.render_widget(chart, area);
}

/// Bar heights in tenths of an hour, so sub-hour activities stay visible.
fn tenths(hours: f64) -> u64 {
    (hours * 10.0).round().max(0.0) as u64
}

fn bar_width(area: Rect, bars: usize) -> u16 {
    let inner = area.width.saturating_sub(2) as usize;
    let per_bar = inner / bars.max(1);
    per_bar.saturating_sub(1).clamp(1, 12) as u16
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let status = Paragraph::new(app.status.as_str())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use msq_lib::{
        filter::PeriodFilter,
        record::{Metrics, Record},
    };
    use ratatui::backend::TestBackend;

    fn record(label: &str, block: Option<&str>, total_minutes: f64) -> Record {
        Record {
            year_label: label.into(),
            ms2_block: block.map(str::to_string),
            ms3_rotation: None,
            ms4_rotation: None,
            metrics: Metrics::from_minutes([total_minutes, total_minutes / 2.0, 0.0, 0.0, 0.0, 0.0]),
        }
    }

    fn app() -> App {
        App::new(Arc::new(Dataset::from_records(vec![
            record("MS1", None, 120.0),
            record("MS2", Some("Cardio"), 240.0),
            record("MS2", Some("Renal"), 60.0),
        ])))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 48)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn arrows_walk_periods_and_dimensions() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.controller.selection().period, PeriodFilter::from("MS1"));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        let dashboard = app.controller.dashboard();
        assert_eq!(dashboard.selection.dimension, Dimension::Ms2Block);
        assert_eq!(dashboard.aggregation.labels(), vec!["Cardio", "Renal"]);
        assert_eq!(dashboard.charts.summary, "Total Time: 5.00 hours");
        assert!(app.status.contains("Total Time: 5.00 hours"));
    }

    #[test]
    fn number_keys_pick_dimension() {
        let mut app = app();
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.controller.selection().dimension, Dimension::Ms4Rotation);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.controller.selection().dimension, Dimension::YearLabel);
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('x'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn renders_summary_and_titles() {
        let app = app();
        let text = screen_text(&app);
        assert!(text.contains("Total Time: 7.00 hours"));
        assert!(text.contains("All of Medical School"));
        assert!(text.contains("Time Spent by Year Label"));
    }

    #[test]
    fn empty_selection_renders_placeholder() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('3'));
        let text = screen_text(&app);
        assert!(text.contains("Total Time: 2.00 hours"));
        assert!(text.contains("(none)"));

        let empty = App::new(Arc::new(Dataset::default()));
        let text = screen_text(&empty);
        assert!(text.contains("Total Time: 0.00 hours"));
        assert!(text.contains("No records for this selection."));
    }

    #[test]
    fn tenths_keep_small_values() {
        assert_eq!(tenths(0.5), 5);
        assert_eq!(tenths(12.04), 120);
        assert_eq!(bar_width(Rect::new(0, 0, 40, 10), 3), 11);
        assert_eq!(bar_width(Rect::new(0, 0, 10, 10), 20), 1);
    }
}
