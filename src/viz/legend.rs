//! Legend box measurement, placement and drawing.

use plotters::backend::DrawingBackend;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::axes::{HandleKind, LegendEntry};
use crate::error::Result;
use crate::legend::{LegendPlan, Location, best_location};
use crate::style::{Theme, WHITE};

use super::canvas::{Canvas, Frame};
use super::text::{LINE_HEIGHT, estimate_text_width_px};

/// Opacity of a framed legend's background.
const FRAME_ALPHA: f64 = 0.8;
const FRAME_LINE_PT: f64 = 0.8;
/// Clearance between an inside legend and the frame, in axes fractions.
const AXES_PAD: f64 = 0.02;

/// Measured legend box, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LegendBox {
    pub width: f64,
    pub height: f64,
    font_px: f64,
    title_px: f64,
    /// Entry indices per column, column-major.
    columns: Vec<Vec<usize>>,
    col_widths: Vec<f64>,
    row_h: f64,
}

/// Split `n` entries into `ncol` columns the way numpy's `array_split` does:
/// the first `n % ncol` columns get one extra entry.
fn split_columns(n: usize, ncol: usize) -> Vec<Vec<usize>> {
    let ncol = ncol.clamp(1, n.max(1));
    let base = n / ncol;
    let extra = n % ncol;
    let mut out = Vec::with_capacity(ncol);
    let mut next = 0;
    for c in 0..ncol {
        let len = base + usize::from(c < extra);
        out.push((next..next + len).collect());
        next += len;
    }
    out
}

pub(crate) fn measure<DB: DrawingBackend>(
    canvas: &Canvas<'_, DB>,
    plan: &LegendPlan,
    entries: &[LegendEntry],
    theme: &Theme,
) -> LegendBox {
    let font_pt = plan.font_size.unwrap_or(theme.legend_font_size);
    let font_px = canvas.px(font_pt);
    let title_px = canvas.px(theme.legend_title_size);
    let sp = plan.spacing;
    let hs = plan.handles;

    let columns = split_columns(entries.len(), plan.ncol);
    let handle_w = hs.handle_length * font_px + sp.handle_text_pad * font_px;
    let col_widths: Vec<f64> = columns
        .iter()
        .map(|col| {
            let widest = col
                .iter()
                .map(|&i| estimate_text_width_px(&entries[i].label, font_px, false))
                .fold(0.0, f64::max);
            handle_w + widest
        })
        .collect();
    let row_h = (font_px * LINE_HEIGHT).max(hs.handle_height * font_px);
    let nrows = columns.iter().map(Vec::len).max().unwrap_or(0);

    let border = sp.border_pad * font_px;
    let label_gap = sp.label_spacing * font_px;
    let body_w = col_widths.iter().sum::<f64>()
        + col_widths.len().saturating_sub(1) as f64 * sp.column_spacing * font_px;
    let title_w = plan
        .title
        .as_deref()
        .map(|t| estimate_text_width_px(t, title_px, false))
        .unwrap_or(0.0);
    let title_h = if plan.title.is_some() { title_px * LINE_HEIGHT + label_gap } else { 0.0 };

    LegendBox {
        width: 2.0 * border + body_w.max(title_w),
        height: 2.0 * border
            + title_h
            + nrows as f64 * row_h
            + nrows.saturating_sub(1) as f64 * label_gap,
        font_px,
        title_px,
        columns,
        col_widths,
        row_h,
    }
}

/// Top-left corner of the legend box in area pixels.
///
/// `top_strip` is the top of the band reserved above the chart for anchors
/// above the axes; `data` holds data points in axes fractions for `best`.
pub(crate) fn place(
    bx: &LegendBox,
    plan: &LegendPlan,
    frame: &Frame,
    area: (f64, f64),
    top_strip: Option<f64>,
    data: &[(f64, f64)],
) -> (f64, f64) {
    let (fw, fh) = (frame.width().max(1.0), frame.height().max(1.0));
    let (x, y) = match plan.anchor {
        None => {
            let (w, h) = (bx.width / fw, bx.height / fh);
            let loc = match plan.location {
                Location::Best => best_location(data, w, h, AXES_PAD),
                other => other,
            };
            let (ox, oy) = loc.inner_origin(w, h, AXES_PAD);
            (frame.left + ox * fw, frame.bottom - (oy + h) * fh)
        }
        Some((ax, ay)) => {
            let (fx, fy) = plan.location.box_fraction();
            let anchor_x = frame.left + ax * fw;
            let anchor_y = frame.bottom - ay * fh;
            let left = anchor_x - fx * bx.width;
            let top = match top_strip {
                Some(strip) if ay > 1.0 => strip,
                _ => anchor_y + fy * bx.height - bx.height,
            };
            (left, top)
        }
    };
    (
        x.clamp(0.0, (area.0 - bx.width).max(0.0)),
        y.clamp(0.0, (area.1 - bx.height).max(0.0)),
    )
}

pub(crate) fn draw<DB: DrawingBackend>(
    canvas: &Canvas<'_, DB>,
    bx: &LegendBox,
    plan: &LegendPlan,
    entries: &[LegendEntry],
    theme: &Theme,
    origin: (f64, f64),
) -> Result<()> {
    let (x0, y0) = origin;
    let sp = plan.spacing;
    let hs = plan.handles;
    let font_pt = plan.font_size.unwrap_or(theme.legend_font_size);

    if plan.frame {
        let far = (x0 + bx.width, y0 + bx.height);
        canvas.fill_rect(origin, far, WHITE, FRAME_ALPHA)?;
        canvas.outline_rect(origin, far, theme.legend_edge_color, FRAME_LINE_PT)?;
    }

    let border = sp.border_pad * bx.font_px;
    let label_gap = sp.label_spacing * bx.font_px;
    let mut body_top = y0 + border;
    if let Some(title) = plan.title.as_deref() {
        canvas.text(
            title,
            (x0 + bx.width / 2.0, body_top),
            theme.legend_title_size,
            theme.text_color,
            false,
            Pos::new(HPos::Center, VPos::Top),
        )?;
        body_top += bx.title_px * LINE_HEIGHT + label_gap;
    }

    let handle_len = hs.handle_length * bx.font_px;
    let handle_h = hs.handle_height * bx.font_px;
    let mut col_x = x0 + border;
    for (col, width) in bx.columns.iter().zip(&bx.col_widths) {
        for (row, &idx) in col.iter().enumerate() {
            let entry = &entries[idx];
            let cy = body_top + row as f64 * (bx.row_h + label_gap) + bx.row_h / 2.0;
            match entry.kind {
                HandleKind::Patch { alpha } => canvas.fill_rect(
                    (col_x, cy - handle_h / 2.0),
                    (col_x + handle_len, cy + handle_h / 2.0),
                    entry.color,
                    alpha,
                )?,
                HandleKind::Line(marker) => {
                    canvas.polyline(
                        &[(col_x, cy), (col_x + handle_len, cy)],
                        entry.color,
                        1.0,
                        theme.line_width,
                    )?;
                    if let Some(m) = marker {
                        canvas.marker(
                            m,
                            (col_x + handle_len / 2.0, cy),
                            theme.marker_size,
                            entry.color,
                        )?;
                    }
                }
                HandleKind::Marker(m) => canvas.marker(
                    m,
                    (col_x + handle_len / 2.0, cy),
                    theme.marker_size * hs.marker_scale.min(2.0),
                    entry.color,
                )?,
            }
            canvas.text(
                &entry.label,
                (col_x + handle_len + sp.handle_text_pad * bx.font_px, cy),
                font_pt,
                theme.text_color,
                false,
                Pos::new(HPos::Left, VPos::Center),
            )?;
        }
        col_x += width + sp.column_spacing * bx.font_px;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AxisRange;
    use crate::legend::{HandleSizing, LegendSpacing};

    #[test]
    fn columns_split_like_array_split() {
        assert_eq!(split_columns(4, 3), vec![vec![0, 1], vec![2], vec![3]]);
        assert_eq!(split_columns(2, 5), vec![vec![0], vec![1]]);
        assert_eq!(split_columns(0, 2), vec![Vec::<usize>::new()]);
        assert_eq!(split_columns(6, 2), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    fn plan(location: Location, anchor: Option<(f64, f64)>) -> LegendPlan {
        LegendPlan {
            location,
            anchor,
            ncol: 1,
            frame: true,
            font_size: None,
            title: None,
            spacing: LegendSpacing::NORMAL,
            handles: HandleSizing::STANDARD,
        }
    }

    fn frame() -> Frame {
        Frame {
            left: 100.0,
            top: 100.0,
            right: 500.0,
            bottom: 400.0,
            x: AxisRange::new(0.0, 1.0),
            y: AxisRange::new(0.0, 1.0),
        }
    }

    fn legend_box() -> LegendBox {
        LegendBox {
            width: 80.0,
            height: 30.0,
            font_px: 10.0,
            title_px: 10.0,
            columns: vec![vec![0]],
            col_widths: vec![60.0],
            row_h: 12.0,
        }
    }

    #[test]
    fn outside_legend_starts_right_of_frame() {
        let p = plan(Location::CenterLeft, Some((1.02, 0.5)));
        let (x, y) = place(&legend_box(), &p, &frame(), (800.0, 500.0), None, &[]);
        assert!((x - 508.0).abs() < 1e-9);
        assert!((y - 235.0).abs() < 1e-9);
    }

    #[test]
    fn top_legend_uses_reserved_strip() {
        let p = plan(Location::UpperCenter, Some((0.5, 1.12)));
        let (x, y) = place(&legend_box(), &p, &frame(), (800.0, 500.0), Some(10.0), &[]);
        assert_eq!((x, y), (260.0, 10.0));
    }

    #[test]
    fn best_legend_avoids_crowded_corner() {
        let p = plan(Location::Best, None);
        let pts: Vec<(f64, f64)> = (0..10).map(|i| (0.7 + i as f64 * 0.03, 0.95)).collect();
        let (x, y) = place(&legend_box(), &p, &frame(), (800.0, 500.0), None, &pts);
        // upper left
        assert!((x - 108.0).abs() < 1e-9);
        assert!((y - 106.0).abs() < 1e-9);
    }
}
