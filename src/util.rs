use eframe::egui::Color32;

/// Cyan used for fresh entries and for any colour that fails to parse.
pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(0x00, 0xD9, 0xFF);

/// Parses `#RRGGBB` or `#RGB`, with or without the leading `#`.
pub fn parse_hex_color(hex: &str) -> Option<Color32> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match digits.len() {
        6 => Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            let short = |index: usize| channel(index..index + 1).map(|value| value * 17);
            Some(Color32::from_rgb(short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

pub fn hex_color_or_fallback(hex: &str) -> Color32 {
    parse_hex_color(hex).unwrap_or(FALLBACK_COLOR)
}

/// First line of `text`, cut to `max_chars` characters with an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() <= max_chars && !text.trim().contains('\n') {
        return line.to_owned();
    }
    let mut cut: String = line.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
