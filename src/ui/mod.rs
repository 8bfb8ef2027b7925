//! Terminal rendering
//!
//! Rendering is a pure function of `App`: nothing here mutates state or
//! talks to the network.

pub mod panels;
pub mod theme;

use crate::app::{App, InputMode, Tab, Toast, ViewState};
use panels::Panel;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};
use theme::Theme;
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, app: &App) {
    let bg = Block::default().style(Theme::bg());
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header with headline numbers
            Constraint::Length(3), // Tab bar
            Constraint::Min(8),    // Main panel
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    match &app.view {
        ViewState::Loading if app.snapshot().is_none() => render_loading(frame, chunks[2], app),
        ViewState::Error { message } => render_error(frame, chunks[2], message),
        _ => render_panel(frame, chunks[2], app),
    }
    render_status_bar(frame, chunks[3], app);

    if let Some(toast) = &app.toast {
        render_toast(frame, toast);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(30)])
        .split(area);

    let title = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", Theme::HEADER), Theme::title())),
        Line::from(Span::styled(
            format!("  {}", Theme::TAGLINE),
            Style::default()
                .fg(Theme::GREY_400)
                .add_modifier(Modifier::ITALIC),
        )),
    ];
    frame.render_widget(
        Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .style(Theme::panel_bg()),
        ),
        chunks[0],
    );

    let numbers = match app.snapshot() {
        Some(snapshot) => {
            let stats = &snapshot.stats;
            let metric = |label: &'static str, value: String| {
                vec![
                    Span::styled(format!("  {} ", label), Theme::text_dim()),
                    Span::styled(value, Theme::selected()),
                ]
            };
            let mut first = metric("reviews", stats.total_reviews.to_string());
            first.extend(metric("products", stats.total_products.to_string()));
            let mut second = metric("avg rating", format!("{:.1}", stats.avg_rating));
            second.push(Span::styled(
                format!(" {}", Theme::stars(stats.avg_rating.round().clamp(0.0, 5.0) as u8)),
                Theme::text_muted(),
            ));
            second.extend(vec![
                Span::styled("  sentiment ", Theme::text_dim()),
                Span::styled(
                    format!("{:+.2}", stats.avg_sentiment),
                    Style::default()
                        .fg(Theme::score_color(stats.avg_sentiment))
                        .add_modifier(Modifier::BOLD),
                ),
            ]);
            vec![Line::from(""), Line::from(first), Line::from(second)]
        }
        None => vec![
            Line::from(""),
            Line::from(Span::styled("  no data yet", Theme::text_dim())),
        ],
    };

    frame.render_widget(
        Paragraph::new(numbers).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" at a glance ", Theme::title()))
                .style(Theme::panel_bg()),
        ),
        chunks[1],
    );
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = (0..Tab::count())
        .map(|i| {
            let tab = Tab::from_index(i);
            let suffix = match tab {
                Tab::Reviews => app
                    .snapshot()
                    .map(|_| format!(" {}", app.filtered_reviews().len()))
                    .unwrap_or_default(),
                _ => String::new(),
            };
            Line::from(format!(" {}·{}{} ", i + 1, tab.title(), suffix))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .style(Theme::panel_bg()),
        )
        .select(app.tab.index())
        .style(Theme::text_dim())
        .highlight_style(Theme::selected())
        .divider(Span::styled("│", Theme::border()));

    frame.render_widget(tabs, area);
}

fn render_panel(frame: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = app.snapshot() else {
        return;
    };
    match app.tab {
        Tab::Dashboard => frame.render_widget(Panel::dashboard(snapshot), area),
        Tab::Reviews => {
            let panel = Panel::reviews(
                app.filtered_reviews(),
                snapshot.reviews.len(),
                app.scroll_offset,
                &app.search_query,
                app.category,
                app.input_mode == InputMode::Search,
            );
            frame.render_widget(panel, area);
        }
        Tab::Analysis => {
            let panel = Panel::analysis(
                &app.draft,
                app.input_mode == InputMode::Compose,
                app.is_analyzing(),
                app.last_analysis.as_ref(),
                app.loading_frame,
            );
            frame.render_widget(panel, area);
        }
        Tab::Recommendations => {
            let panel = Panel::recommendations(
                &app.recommendations,
                Some(snapshot.as_ref()),
                app.user_id.is_some(),
                app.loading_frame,
            );
            frame.render_widget(panel, area);
        }
    }
}

fn render_loading(frame: &mut Frame, area: Rect, app: &App) {
    let content = vec![
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} ", Theme::spinner(app.loading_frame)), Theme::text()),
            Span::styled("loading dashboard...", Theme::text_muted()),
        ]),
    ];
    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(panel_frame());
    frame.render_widget(widget, area);
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let content = vec![
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{} ", Theme::WARNING_MARK), Style::default().fg(Theme::RED)),
            Span::styled(message, Theme::text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("press ", Theme::text_dim()),
            Span::styled("r", Theme::key()),
            Span::styled(" to retry", Theme::text_dim()),
        ]),
    ];
    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(panel_frame());
    frame.render_widget(widget, area);
}

fn panel_frame<'a>() -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .style(Theme::panel_bg())
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let sep = || Span::styled(Theme::DOT_SEPARATOR.to_string(), Theme::text_dim());
    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {}", key), Theme::key()),
            Span::styled(format!(" {} ", label), Theme::text_dim()),
        ]
    };

    let mut spans: Vec<Span> = Vec::new();
    match app.input_mode {
        InputMode::Search => {
            spans.extend(hint("↵/esc", "done"));
        }
        InputMode::Compose => {
            spans.extend(hint("↵", "analyze"));
            spans.push(sep());
            spans.extend(hint("esc", "stop editing"));
        }
        InputMode::Normal => {
            spans.extend(hint("q", "quit"));
            spans.push(sep());
            spans.extend(hint("1-4", "tab"));
            spans.push(sep());
            spans.extend(hint("r", "refresh"));
            match app.tab {
                Tab::Reviews => {
                    spans.push(sep());
                    spans.extend(hint("/", "search"));
                    spans.push(sep());
                    spans.extend(hint("f", "filter"));
                    spans.push(sep());
                    spans.extend(hint("c", "clear"));
                }
                Tab::Analysis => {
                    spans.push(sep());
                    spans.extend(hint("i", "write"));
                }
                _ => {}
            }
        }
    }

    if app.is_loading() && app.snapshot().is_some() {
        spans.push(Span::styled(
            format!("  {} refreshing", Theme::spinner(app.loading_frame)),
            Theme::text_muted(),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).style(Theme::bg());
    frame.render_widget(status, area);
}

fn render_toast(frame: &mut Frame, toast: &Toast) {
    let area = frame.area();
    let (mark, mark_style) = Theme::notice(toast.level);

    // Position toast at bottom center
    let toast_width = toast.message.width() as u16 + 6;
    let toast_area = Rect {
        x: (area.width.saturating_sub(toast_width)) / 2,
        y: area.height.saturating_sub(3),
        width: toast_width.min(area.width),
        height: 1,
    };

    let toast_widget = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", mark), mark_style),
        Span::styled(&toast.message, Theme::text()),
        Span::styled(" ", Style::default()),
    ]))
    .style(Style::default().bg(Theme::GREY_600));

    frame.render_widget(toast_widget, toast_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::messages::BackgroundMessage;
    use crate::app::Effect;
    use crate::error::{LoadError, LoadStage, TransportError, LOAD_FAILED_MESSAGE};
    use crate::model::{fixtures, Sentiment};
    use crate::pipeline::Snapshot;
    use ratatui::backend::TestBackend;

    fn screen(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn generation(effect: Effect) -> u64 {
        match effect {
            Effect::LoadDashboard { generation } => generation,
            _ => unreachable!(),
        }
    }

    fn ready_app() -> App {
        let mut app = App::new(None, 10);
        let generation = generation(app.request_load());
        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation,
            result: Ok(Snapshot::assemble(
                fixtures::stats(),
                vec![fixtures::review(1, "Great phone", Sentiment::Positive, 5.0)],
                vec![fixtures::product(1, "Galaxy A54")],
            )),
        });
        app.sync_filtered();
        app
    }

    #[test]
    fn test_loading_screen() {
        let app = App::new(None, 10);
        assert!(screen(&app).contains("loading dashboard"));
    }

    #[test]
    fn test_error_screen_shows_generic_message() {
        let mut app = App::new(None, 10);
        let generation = generation(app.request_load());
        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation,
            result: Err(LoadError::new(
                LoadStage::Stats,
                TransportError::Status {
                    status: 500,
                    body: "secret stack trace".to_string(),
                },
            )),
        });

        let text = screen(&app);
        assert!(text.contains(LOAD_FAILED_MESSAGE));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_dashboard_and_reviews_tabs_render() {
        let mut app = ready_app();
        let dashboard = screen(&app);
        assert!(dashboard.contains("Positif"));
        assert!(dashboard.contains("Galaxy A54"));

        app.select_tab(Tab::Reviews);
        let reviews = screen(&app);
        assert!(reviews.contains("Great phone"));
        assert!(reviews.contains("reviews (1)"));
    }
}
