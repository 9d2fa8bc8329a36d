//! Theme and Styling
//!
//! Colors and icons for the progress display.

use crossterm::style::{Color, ContentStyle, Stylize};

/// Display theme
pub struct Theme;

impl Theme {
    /// Done items (green)
    pub const SUCCESS: Color = Color::Rgb { r: 34, g: 197, b: 94 };

    /// In-progress items (yellow/amber)
    pub const WARNING: Color = Color::Rgb { r: 251, g: 191, b: 36 };

    /// Secondary text color (muted)
    pub const TEXT_SECONDARY: Color = Color::Rgb { r: 161, g: 161, b: 161 };

    /// Active/in-progress indicator
    pub fn active() -> ContentStyle {
        ContentStyle::new().with(Self::WARNING).bold()
    }

    /// Complete indicator
    pub fn complete() -> ContentStyle {
        ContentStyle::new().with(Self::SUCCESS)
    }

    /// Informational items shown without a checkmark
    pub fn info() -> ContentStyle {
        ContentStyle::new().with(Self::TEXT_SECONDARY)
    }
}

/// Progress icons
pub struct Icons;

impl Icons {
    pub const COMPLETE: &'static str = "✓";
    pub const DOT: &'static str = "•";
    pub const SPINNER: &'static [&'static str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
}
