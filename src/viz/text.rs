//! Text measurement and wrapping.
//!
//! Layout needs text extents before anything is drawn, and the ab_glyph path
//! gives no cheap way to ask, so widths are estimated from character counts.

/// Average advance of a sans-serif glyph relative to the font size.
const ADVANCE: f64 = 0.60;
const BOLD_ADVANCE: f64 = 0.66;
/// Line height relative to the font size.
pub const LINE_HEIGHT: f64 = 1.2;

pub fn estimate_text_width_px(text: &str, font_px: f64, bold: bool) -> f64 {
    let advance = if bold { BOLD_ADVANCE } else { ADVANCE };
    (text.chars().count() as f64 * font_px * advance).ceil()
}

/// Height of `lines` lines of text.
pub fn text_block_height_px(lines: usize, font_px: f64) -> f64 {
    lines.max(1) as f64 * font_px * LINE_HEIGHT
}

/// Cut `text` to at most `max_px`, ending in an ellipsis when shortened.
pub fn truncate_to_width(text: &str, font_px: f64, max_px: f64) -> String {
    if estimate_text_width_px(text, font_px, false) <= max_px {
        return text.to_string();
    }
    let per_char = (font_px * ADVANCE).max(1.0);
    let fit = (max_px / per_char).floor() as usize;
    if fit == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(fit - 1).collect();
    out.push('…');
    out
}

/// Greedy word wrap to `max_px`; a word wider than a line is split by
/// characters.
pub fn wrap_text_to_width(text: &str, font_px: f64, max_px: f64) -> Vec<String> {
    let per_char = (font_px * ADVANCE).max(1.0);
    let max_chars = ((max_px / per_char).floor() as usize).max(1);

    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let cur_len = cur.chars().count();
        if cur_len > 0 && cur_len + 1 + word_len <= max_chars {
            cur.push(' ');
            cur.push_str(word);
            continue;
        }
        if cur_len > 0 {
            lines.push(std::mem::take(&mut cur));
        }
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_chars).peekable();
        while let Some(chunk) = chunks.next() {
            let piece: String = chunk.iter().collect();
            if chunks.peek().is_some() {
                lines.push(piece);
            } else {
                cur = piece;
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}
