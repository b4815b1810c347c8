//! Terminal chart renderer (ratatui)
//!
//! Redraws the whole chart on every tick. The stdout variant switches to
//! the alternate screen and restores the terminal on drop. Raw mode is not
//! enabled, so Ctrl-C still reaches the signal handler.

use super::{axis_bounds, reference_series, spread_series, AxisPadding, ChartSink, Series};
use crate::types::PairwiseSpreadSample;
use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame, Terminal,
};
use std::io::{self, Stdout};

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightYellow,
];

/// Leaves the alternate screen when dropped
struct ScreenGuard;

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    }
}

/// Live spread chart drawn with ratatui
pub struct TerminalChart<B: Backend> {
    terminal: Terminal<B>,
    title: String,
    _guard: Option<ScreenGuard>,
}

impl TerminalChart<CrosstermBackend<Stdout>> {
    /// Take over stdout with an alternate screen
    pub fn stdout(title: &str) -> Result<Self> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)
            .context("Failed to enter alternate screen")?;
        let guard = ScreenGuard;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            title: title.to_string(),
            _guard: Some(guard),
        })
    }
}

impl<B: Backend> TerminalChart<B> {
    pub fn with_backend(backend: B, title: &str) -> Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            title: title.to_string(),
            _guard: None,
        })
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

fn x_bounds(series: &[Series]) -> [f64; 2] {
    let max_x = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(x, _)| *x))
        .fold(0.0_f64, f64::max);
    [0.0, max_x.max(1.0)]
}

fn labels<'a>(bounds: [f64; 2], precision: usize) -> Vec<Span<'a>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{:.*}", precision, v)))
        .collect()
}

fn draw_panel(
    frame: &mut Frame,
    area: Rect,
    title: String,
    series: &[Series],
    padding: AxisPadding,
    y_title: &str,
    precision: usize,
) {
    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(&s.points)
        })
        .collect();

    let x = x_bounds(series);
    let y = axis_bounds(
        series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v)),
        padding,
    );

    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("elapsed (s)")
                .style(Style::default().fg(Color::Gray))
                .bounds(x)
                .labels(labels(x, 0)),
        )
        .y_axis(
            Axis::default()
                .title(y_title.to_string())
                .style(Style::default().fg(Color::Gray))
                .bounds(y)
                .labels(labels(y, precision)),
        );

    frame.render_widget(chart, area);
}

impl<B: Backend + Send> ChartSink for TerminalChart<B> {
    fn render(&mut self, history: &[PairwiseSpreadSample]) -> Result<()> {
        let spreads = spread_series(history);
        let reference: Vec<Series> = reference_series(history).into_iter().collect();
        let title = format!("{} ({} samples)", self.title, history.len());

        self.terminal
            .draw(|frame| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .split(frame.size());

                draw_panel(frame, chunks[0], title, &spreads, AxisPadding::SPREAD, "spread %", 3);
                draw_panel(
                    frame,
                    chunks[1],
                    "Reference price".to_string(),
                    &reference,
                    AxisPadding::PRICE,
                    "price",
                    2,
                );
            })
            .context("Failed to draw chart")?;
        Ok(())
    }
}
