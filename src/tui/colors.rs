//! Colour constants for the interface chrome.

use ratatui::style::Color;

// Task slices get their colours from the hex palette; these brand the
// chrome around them.

/// Active form fields and the completion screen.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Status bar while a session is running.
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
