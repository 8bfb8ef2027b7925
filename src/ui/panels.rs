//! Panel rendering for each tab

use crate::app::RecommendationState;
use crate::model::{Recommendation, Review, Sentiment, SentimentAnalysis};
use crate::pipeline::{CategoryFilter, Snapshot};
use crate::ui::theme::Theme;
use crate::util::truncate;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget, Wrap},
};

/// Recent reviews shown on the dashboard tab
const RECENT_REVIEWS: usize = 5;
const TOP_PRODUCTS: usize = 5;

pub struct Panel;

impl Panel {
    /// Overview: sentiment distribution, recent reviews and best products
    pub fn dashboard(snapshot: &Snapshot) -> impl Widget + '_ {
        let stats = &snapshot.stats;
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(" sentiment distribution", Theme::title())),
        ];

        for sentiment in Sentiment::ALL {
            let percent = stats.percentage_for(sentiment);
            lines.push(Line::from(vec![
                Span::styled(format!("   {:9}", sentiment.label()), Theme::text_muted()),
                Span::styled(
                    Theme::bar(percent, 30),
                    Style::default().fg(Theme::sentiment_color(sentiment)),
                ),
                Span::styled(format!(" {:5.1}%", percent), Theme::text()),
                Span::styled(
                    format!("  ({})", stats.count_for(sentiment)),
                    Theme::text_dim(),
                ),
            ]));
        }

        if !stats.top_categories.is_empty() {
            lines.push(Line::from(""));
            let categories: Vec<String> = stats
                .top_categories
                .iter()
                .map(|c| format!("{} {}", c.category, c.count))
                .collect();
            lines.push(Line::from(vec![
                Span::styled(" categories  ", Theme::text_dim()),
                Span::styled(
                    categories.join(&format!(" {} ", Theme::DOT_SEPARATOR)),
                    Theme::text_muted(),
                ),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" recent reviews", Theme::title())));
        let recent = snapshot.recent_reviews(RECENT_REVIEWS);
        if recent.is_empty() {
            lines.push(Line::from(Span::styled("   no reviews yet", Theme::text_dim())));
        }
        for review in recent {
            lines.push(review_line(review, 60));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" top products", Theme::title())));
        for product in snapshot.top_products(TOP_PRODUCTS) {
            let positive = product
                .positive_percent()
                .map(|p| format!("{}% positive", p))
                .unwrap_or_else(|| "no reviews".to_string());
            lines.push(Line::from(vec![
                Span::styled(format!("   {} ", Theme::ARROW_RIGHT), Theme::text_dim()),
                Span::styled(truncate(&product.name, 32), Theme::text()),
                Span::styled(format!("  {:.1}★", product.avg_rating), Theme::text_muted()),
                Span::styled(
                    format!("  {} reviews  ", product.total_reviews),
                    Theme::text_dim(),
                ),
                Span::styled(
                    positive,
                    Style::default().fg(Theme::score_color(product.sentiment_score)),
                ),
            ]));
        }

        Paragraph::new(lines).block(panel_block(" overview ".to_string(), false))
    }

    /// Filterable review list
    pub fn reviews<'a>(
        reviews: &'a [Review],
        total: usize,
        scroll_offset: usize,
        query: &'a str,
        category: CategoryFilter,
        searching: bool,
    ) -> impl Widget + 'a {
        let mut items: Vec<ListItem> = Vec::new();

        // Category chips
        let mut chips = vec![Span::styled(" ", Style::default())];
        for option in CategoryFilter::OPTIONS {
            let style = if option == category {
                Theme::selected().add_modifier(Modifier::REVERSED)
            } else {
                Theme::text_dim()
            };
            chips.push(Span::styled(format!(" {} ", option.label()), style));
            chips.push(Span::raw(" "));
        }
        if !query.is_empty() || searching {
            chips.push(Span::styled("  /", Theme::key()));
            chips.push(Span::styled(query, Theme::text()));
            if searching {
                chips.push(Span::styled("█", Style::default().fg(Theme::GREY_300)));
            }
        }
        items.push(ListItem::new(Line::from(chips)));
        items.push(ListItem::new(Line::from("")));

        if reviews.is_empty() {
            items.push(ListItem::new(Line::from(Span::styled(
                "   no reviews match",
                Theme::text_dim(),
            ))));
        }

        for review in reviews.iter().skip(scroll_offset) {
            let header = review_line(review, 0);
            let body = Line::from(vec![
                Span::raw("      "),
                Span::styled(truncate(&review.text, 100), Theme::text()),
            ]);
            items.push(ListItem::new(vec![header, body]));
        }

        let title = if reviews.len() == total {
            format!(" reviews ({}) ", total)
        } else {
            format!(" reviews (filtered: {} of {}) ", reviews.len(), total)
        };

        List::new(items).block(panel_block(title, searching))
    }

    /// Free-text classifier
    pub fn analysis<'a>(
        draft: &'a str,
        composing: bool,
        busy: bool,
        last: Option<&'a SentimentAnalysis>,
        frame: usize,
    ) -> impl Widget + 'a {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(" text to analyze", Theme::title())),
            Line::from(""),
        ];

        let mut draft_line = vec![Span::styled("   ", Style::default())];
        if draft.is_empty() && !composing {
            draft_line.push(Span::styled(
                "press i to write a review",
                Theme::text_dim(),
            ));
        } else {
            draft_line.push(Span::styled(draft, Theme::text()));
        }
        if composing {
            draft_line.push(Span::styled("█", Style::default().fg(Theme::GREY_300)));
        }
        lines.push(Line::from(draft_line));
        lines.push(Line::from(""));

        if busy {
            lines.push(Line::from(vec![
                Span::styled(format!("   {} ", Theme::spinner(frame)), Theme::text()),
                Span::styled("analyzing...", Theme::text_muted()),
            ]));
        } else if let Some(result) = last {
            lines.push(Line::from(Span::styled(" last result", Theme::title())));
            lines.push(Line::from(vec![
                Span::styled(format!("   {} ", Theme::BULLET_FILLED), Theme::sentiment(Some(result.sentiment))),
                Span::styled(
                    result.sentiment.label(),
                    Theme::sentiment(Some(result.sentiment)).add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("   score      ", Theme::text_dim()),
                Span::styled(
                    format!("{:+.2}", result.sentiment_score),
                    Style::default().fg(Theme::score_color(result.sentiment_score)),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("   confidence ", Theme::text_dim()),
                Span::styled(
                    format!("{:.0}%", result.confidence * 100.0),
                    Theme::text(),
                ),
            ]));
            if let Some(lang) = &result.language_detected {
                lines.push(Line::from(vec![
                    Span::styled("   language   ", Theme::text_dim()),
                    Span::styled(lang.as_str(), Theme::text_muted()),
                ]));
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(panel_block(" analyze ".to_string(), composing))
    }

    /// Recommendation results, or the current top products before any fetch
    pub fn recommendations<'a>(
        state: &'a RecommendationState,
        snapshot: Option<&'a Snapshot>,
        has_user: bool,
        frame: usize,
    ) -> impl Widget + 'a {
        let mut lines = vec![Line::from("")];

        match state {
            RecommendationState::Idle => {
                lines.push(Line::from(Span::styled(
                    " top rated products",
                    Theme::title(),
                )));
                if let Some(snapshot) = snapshot {
                    for product in snapshot.top_products(TOP_PRODUCTS) {
                        let positive = product
                            .positive_percent()
                            .map(|p| format!("  {}% positive", p))
                            .unwrap_or_default();
                        lines.push(Line::from(vec![
                            Span::styled(format!("   {} ", Theme::ARROW_RIGHT), Theme::text_dim()),
                            Span::styled(truncate(&product.name, 40), Theme::text()),
                            Span::styled(format!("  {:.1}★", product.avg_rating), Theme::text_muted()),
                            Span::styled(
                                positive,
                                Style::default().fg(Theme::score_color(product.sentiment_score)),
                            ),
                        ]));
                    }
                }
            }
            RecommendationState::Loading(strategy) => {
                lines.push(Line::from(vec![
                    Span::styled(format!(" {} ", Theme::spinner(frame)), Theme::text()),
                    Span::styled(
                        format!("fetching {} recommendations...", strategy.name()),
                        Theme::text_muted(),
                    ),
                ]));
            }
            RecommendationState::Ready { strategy, items } => {
                lines.push(Line::from(Span::styled(
                    format!(" {} ", strategy.name()),
                    Theme::title(),
                )));
                if items.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "   nothing to recommend",
                        Theme::text_dim(),
                    )));
                }
                for (rank, item) in items.iter().enumerate() {
                    lines.push(recommendation_line(rank + 1, item));
                }
            }
            RecommendationState::Failed { strategy, message } => {
                lines.push(Line::from(vec![
                    Span::styled(format!(" {} ", Theme::WARNING_MARK), Style::default().fg(Theme::RED)),
                    Span::styled(format!("{}: {}", strategy.name(), message), Theme::text()),
                ]));
            }
        }

        lines.push(Line::from(""));
        let mut hints = vec![
            Span::styled(" t", Theme::key()),
            Span::styled(" trending ", Theme::text_dim()),
        ];
        if has_user {
            for (key, label) in [("h", "hybrid"), ("c", "collaborative"), ("o", "content")] {
                hints.push(Span::styled(format!(" {}", key), Theme::key()));
                hints.push(Span::styled(format!(" {} ", label), Theme::text_dim()));
            }
        } else {
            hints.push(Span::styled(
                " (pass --user for personal picks)",
                Theme::text_dim(),
            ));
        }
        lines.push(Line::from(hints));

        Paragraph::new(lines).block(panel_block(" recommendations ".to_string(), false))
    }
}

fn panel_block<'a>(title: String, active: bool) -> Block<'a> {
    Block::default()
        .title(Span::styled(title, Theme::title()))
        .borders(Borders::ALL)
        .border_style(if active {
            Theme::border_active()
        } else {
            Theme::border()
        })
        .style(Theme::panel_bg())
}

/// One-line review summary. `text_width` of 0 leaves the text out.
fn review_line(review: &Review, text_width: usize) -> Line<'_> {
    let label = review.sentiment.map(|s| s.label()).unwrap_or("?");
    let mut spans = vec![
        Span::styled(format!("   {} ", Theme::BULLET_FILLED), Theme::sentiment(review.sentiment)),
        Span::styled(format!("{:8}", label), Theme::sentiment(review.sentiment)),
        Span::styled(Theme::stars(review.stars()), Theme::text_muted()),
    ];
    if let Some(confidence) = review.confidence_percent() {
        spans.push(Span::styled(format!(" {:3}%", confidence), Theme::text_dim()));
    }
    if let Some(lang) = &review.language {
        spans.push(Span::styled(format!("  {}", lang), Theme::text_dim()));
    }
    if let Some(name) = review.product_name() {
        spans.push(Span::styled(format!("  {}", truncate(name, 24)), Theme::text_muted()));
    }
    spans.push(Span::styled(
        format!("  {}", review.created_at.format("%Y-%m-%d")),
        Theme::text_dim(),
    ));
    if text_width > 0 {
        spans.push(Span::styled(
            format!("  {}", truncate(&review.text, text_width)),
            Theme::text(),
        ));
    }
    Line::from(spans)
}

fn recommendation_line(rank: usize, item: &Recommendation) -> Line<'_> {
    Line::from(vec![
        Span::styled(format!("  {:2}. ", rank), Theme::text_dim()),
        Span::styled(truncate(&item.product_name, 36), Theme::text()),
        Span::styled(format!("  {:.2}", item.score), Theme::text_muted()),
        Span::styled(
            format!("  {:+.2}", item.sentiment_score),
            Style::default().fg(Theme::score_color(item.sentiment_score)),
        ),
        Span::styled(format!("  {}", truncate(&item.reason, 40)), Theme::text_dim()),
    ])
}
