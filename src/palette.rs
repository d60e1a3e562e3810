//! The fixed task colour palette.
//!
//! Tasks carry their colour as a `#RRGGBB` hex string so saved sets and
//! share codes stay portable. New tasks pick the first palette entry not
//! already in use, wrapping around past eight tasks.

use ratatui::style::Color;

/// Coral red
pub const CORAL: &str = "#FF6B6B";
/// Teal
pub const TEAL: &str = "#4ECDC4";
/// Sky blue
pub const SKY: &str = "#45B7D1";
/// Sage green
pub const SAGE: &str = "#96CEB4";
/// Cream yellow
pub const CREAM: &str = "#FFEEAD";
/// Dusty rose
pub const ROSE: &str = "#D4A5A5";
/// Violet
pub const VIOLET: &str = "#9B59B6";
/// Azure
pub const AZURE: &str = "#3498DB";

/// Palette order matches the colour a task gets by position.
pub const PALETTE: [&str; 8] = [CORAL, TEAL, SKY, SAGE, CREAM, ROSE, VIOLET, AZURE];

/// Pick a colour for a new task: first palette entry no existing task uses,
/// falling back to cycling by count once all eight are taken.
pub fn next_color(in_use: &[&str]) -> &'static str {
    for candidate in PALETTE.iter() {
        if !in_use.iter().any(|c| c.eq_ignore_ascii_case(candidate)) {
            return candidate;
        }
    }
    PALETTE[in_use.len() % PALETTE.len()]
}

/// True when `s` is a `#RRGGBB` hex colour.
pub fn valid_hex(s: &str) -> bool {
    let h = match s.strip_prefix('#') {
        Some(h) => h,
        None => return false,
    };
    h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse `#RRGGBB` into a terminal colour. Unparseable strings render white
/// rather than failing the draw.
pub fn to_color(hex: &str) -> Color {
    let h = hex.trim_start_matches('#');
    if h.len() != 6 {
        return Color::White;
    }
    match (
        u8::from_str_radix(&h[0..2], 16),
        u8::from_str_radix(&h[2..4], 16),
        u8::from_str_radix(&h[4..6], 16),
    ) {
        (Ok(r), Ok(g), Ok(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}
