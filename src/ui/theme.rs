//! Feelya theme - greyscale with sentiment accents

use crate::model::Sentiment;
use crate::pipeline::NoticeLevel;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    //  CORE PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    pub const WHITE: Color = Color::Rgb(255, 255, 255);

    /// Headers, selected items
    pub const GREY_50: Color = Color::Rgb(250, 250, 250);

    /// Primary text
    pub const GREY_100: Color = Color::Rgb(220, 220, 220);

    /// Muted text
    pub const GREY_300: Color = Color::Rgb(140, 140, 140);

    /// Inactive tabs, hints
    pub const GREY_400: Color = Color::Rgb(100, 100, 100);

    /// Borders, separators
    pub const GREY_500: Color = Color::Rgb(70, 70, 70);

    /// Toast background
    pub const GREY_600: Color = Color::Rgb(45, 45, 45);

    /// Panel background
    pub const GREY_800: Color = Color::Rgb(28, 28, 28);

    /// Main background
    pub const GREY_900: Color = Color::Rgb(18, 18, 18);

    // ─────────────────────────────────────────────────────────────────────
    // Sentiment accents
    // ─────────────────────────────────────────────────────────────────────

    pub const GREEN: Color = Color::Rgb(100, 200, 100);
    pub const AMBER: Color = Color::Rgb(210, 180, 90);
    pub const RED: Color = Color::Rgb(200, 100, 100);

    pub fn sentiment_color(sentiment: Sentiment) -> Color {
        match sentiment {
            Sentiment::Positive => Self::GREEN,
            Sentiment::Neutral => Self::AMBER,
            Sentiment::Negative => Self::RED,
        }
    }

    pub fn sentiment(sentiment: Option<Sentiment>) -> Style {
        match sentiment {
            Some(s) => Style::default().fg(Self::sentiment_color(s)),
            None => Self::text_dim(),
        }
    }

    /// Colour for a score in [-1, 1]
    pub fn score_color(score: f64) -> Color {
        if score > 0.2 {
            Self::GREEN
        } else if score < -0.2 {
            Self::RED
        } else {
            Self::AMBER
        }
    }

    pub fn notice(level: NoticeLevel) -> (char, Style) {
        match level {
            NoticeLevel::Info => (Self::CHECK_MARK, Style::default().fg(Self::WHITE)),
            NoticeLevel::Error => (Self::CROSS_MARK, Style::default().fg(Self::RED)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pre-built styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn bg() -> Style {
        Style::default().bg(Self::GREY_900)
    }

    pub fn panel_bg() -> Style {
        Style::default().bg(Self::GREY_800)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::GREY_100)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Self::GREY_300)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::GREY_400)
    }

    pub fn selected() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::GREY_500)
    }

    /// Border of the panel that owns the keyboard
    pub fn border_active() -> Style {
        Style::default().fg(Self::GREY_300)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::GREY_50)
            .add_modifier(Modifier::BOLD)
    }

    /// Keybinding highlight
    pub fn key() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD)
    }

    pub const BAR_FILLED: char = '█';
    pub const BAR_EMPTY: char = '░';

    pub const STAR_FILLED: char = '★';
    pub const STAR_EMPTY: char = '☆';

    pub const BULLET_FILLED: char = '●';
    pub const ARROW_RIGHT: char = '▸';
    pub const DOT_SEPARATOR: char = '·';

    pub const CHECK_MARK: char = '✓';
    pub const CROSS_MARK: char = '✗';
    pub const WARNING_MARK: char = '⚠';

    pub const SPINNER_BRAILLE: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

    pub const HEADER: &'static str = "♥ F E E L Y A";
    pub const TAGLINE: &'static str = "what your customers feel";

    pub fn spinner(frame: usize) -> char {
        Self::SPINNER_BRAILLE[frame % Self::SPINNER_BRAILLE.len()]
    }

    /// Horizontal bar of `width` cells, `percent` of them filled
    pub fn bar(percent: f64, width: usize) -> String {
        let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
        (0..width)
            .map(|i| if i < filled { Self::BAR_FILLED } else { Self::BAR_EMPTY })
            .collect()
    }

    pub fn stars(count: u8) -> String {
        (1..=5)
            .map(|i| if i <= count { Self::STAR_FILLED } else { Self::STAR_EMPTY })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_fill() {
        assert_eq!(Theme::bar(0.0, 4), "░░░░");
        assert_eq!(Theme::bar(50.0, 4), "██░░");
        assert_eq!(Theme::bar(150.0, 4), "████");
    }

    #[test]
    fn test_stars() {
        assert_eq!(Theme::stars(3), "★★★☆☆");
        assert_eq!(Theme::stars(5).chars().count(), 5);
    }

    #[test]
    fn test_spinner_wraps() {
        assert_eq!(Theme::spinner(0), Theme::spinner(10));
    }
}
