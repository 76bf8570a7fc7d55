//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header and status bar background
pub const NAVY: Color = Color::Rgb(18, 32, 64);
/// Due today, and the selected filter tab
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Overdue labels and the delete confirmation
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Completed rows
pub const MUTED: Color = Color::Rgb(110, 110, 110);
/// Due-soon alerts in the feed
pub const AMBER: Color = Color::Rgb(255, 160, 40);
