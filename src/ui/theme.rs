//! Greyscale kiosk theme
//! High contrast so the screen reads from a step away

use ratatui::style::{Color, Modifier, Style};

/// The greyscale color palette
pub struct Theme;

impl Theme {
    // ─────────────────────────────────────────────────────────────────────
    // Core greyscale palette - from brightest to darkest
    // ─────────────────────────────────────────────────────────────────────

    /// Pure white - maximum emphasis, ticket number
    pub const WHITE: Color = Color::Rgb(255, 255, 255);

    /// Bright grey - primary text
    pub const GREY_100: Color = Color::Rgb(220, 220, 220);

    /// Light grey - secondary text
    pub const GREY_200: Color = Color::Rgb(180, 180, 180);

    /// Medium grey - muted text, hints
    pub const GREY_300: Color = Color::Rgb(140, 140, 140);

    /// Dark grey - inactive items
    pub const GREY_400: Color = Color::Rgb(100, 100, 100);

    /// Darker grey - borders, separators
    pub const GREY_500: Color = Color::Rgb(70, 70, 70);

    /// Very dark grey - panel backgrounds
    pub const GREY_600: Color = Color::Rgb(45, 45, 45);

    /// Dark grey - overlay backgrounds
    pub const GREY_700: Color = Color::Rgb(35, 35, 35);

    /// True black - deepest background
    pub const GREY_900: Color = Color::Rgb(18, 18, 18);

    /// Background color alias
    pub const BG: Color = Self::GREY_900;

    // ─────────────────────────────────────────────────────────────────────
    // Accents
    // ─────────────────────────────────────────────────────────────────────

    pub const GREEN: Color = Color::Rgb(100, 200, 100);

    pub const RED: Color = Color::Rgb(200, 100, 100);

    /// Countdown running low
    pub const YELLOW: Color = Color::Rgb(220, 200, 90);

    // ─────────────────────────────────────────────────────────────────────
    // Pre-built styles for common UI elements
    // ─────────────────────────────────────────────────────────────────────

    pub fn text() -> Style {
        Style::default().fg(Self::GREY_100)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Self::GREY_300)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD)
    }

    /// Highlighted list row
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::GREY_900)
            .bg(Self::GREY_100)
            .add_modifier(Modifier::BOLD)
    }

    /// Row that was picked (not necessarily under the cursor)
    pub fn chosen() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::GREY_500)
    }

    pub fn border_active() -> Style {
        Style::default().fg(Self::GREY_200)
    }

    /// Key badge in hint rows
    pub fn key() -> Style {
        Style::default().fg(Self::GREY_900).bg(Self::GREY_300)
    }

    /// Countdown color: calm until the last few seconds
    pub fn countdown(remaining: u32) -> Color {
        match remaining {
            0..=5 => Self::RED,
            6..=10 => Self::YELLOW,
            _ => Self::GREY_200,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Glyphs
    // ─────────────────────────────────────────────────────────────────────

    pub const ARROW_RIGHT: char = '▸';
    pub const BULLET_FILLED: char = '●';
    pub const BULLET_EMPTY: char = '○';
    pub const DOT_SEPARATOR: char = '·';
    pub const SPINNER_BRAILLE: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
}
