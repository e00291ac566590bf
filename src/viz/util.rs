//! Tick computation, locale-aware number formatting and unit conversion.

use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use crate::geometry::AxisRange;
use crate::palettes::Rgb8;

use super::text::estimate_text_width_px;

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// Evenly spaced "nice" tick values (steps of 1, 2, 2.5 or 5 times a power
/// of ten) inside `range`, at most `max_ticks` of them. Returns the ticks
/// and the step.
pub fn nice_ticks(range: AxisRange, max_ticks: usize) -> (Vec<f64>, f64) {
    let span = range.span();
    if !(span.is_finite() && span > 0.0) {
        return (vec![range.min], 1.0);
    }
    let max_ticks = max_ticks.max(2);
    let raw = span / (max_ticks - 1) as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * mag)
        .find(|s| span / s <= (max_ticks - 1) as f64 + 1e-9)
        .unwrap_or(10.0 * mag);

    let first = (range.min / step).ceil();
    let last = (range.max / step).floor();
    let ticks = (first as i64..=last as i64)
        .map(|k| {
            let v = k as f64 * step;
            // avoid "-0"
            if v.abs() < step * 1e-9 { 0.0 } else { v }
        })
        .collect();
    (ticks, step)
}

/// Decimals needed to tell ticks `step` apart.
fn decimals_for_step(step: f64) -> usize {
    if step >= 1.0 || step <= 0.0 {
        return 0;
    }
    let mut d = 0;
    let mut scaled = step;
    while d < 6 && (scaled - scaled.round()).abs() > 1e-6 {
        scaled *= 10.0;
        d += 1;
    }
    d
}

/// Format a tick value using grouping and decimal separator of `locale`.
pub fn format_tick(value: f64, step: f64, locale: &str) -> String {
    let (loc, dec) = map_locale(locale);
    let decimals = decimals_for_step(step);
    let factor = 10f64.powi(decimals as i32);
    let scaled = (value.abs() * factor).round();
    let int_part = (scaled / factor).trunc() as i64;
    let frac_part = (scaled - int_part as f64 * factor).round() as i64;

    let mut out = String::new();
    if value < 0.0 && scaled > 0.0 {
        out.push('-');
    }
    out.push_str(&int_part.to_formatted_string(loc));
    if decimals > 0 {
        out.push(dec);
        out.push_str(&format!("{frac_part:0decimals$}"));
    }
    out
}

/// Width in pixels of the widest y tick label, clamped so very short or very
/// long labels still give a usable margin.
pub fn compute_left_label_area_px(labels: &[String], font_px: f64) -> f64 {
    let widest = labels
        .iter()
        .map(|l| estimate_text_width_px(l, font_px, false))
        .fold(0.0, f64::max);
    widest.clamp(font_px * 1.5, font_px * 14.0)
}

/// Points to pixels at `dpi`.
pub fn pt_to_px(pt: f64, dpi: u32) -> f64 {
    pt * dpi as f64 / 72.0
}

pub fn to_rgba(c: Rgb8, alpha: f64) -> RGBAColor {
    c.to_plotters().mix(alpha.clamp(0.0, 1.0))
}
