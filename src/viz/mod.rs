//! Figure rendering to **SVG** or an in-memory RGB raster.
//!
//! - Charts are laid out per panel: title band, tick label gutters, and
//!   reserved strips for legends anchored outside or above the axes
//! - Locale-aware tick labels (`30,000` vs `30.000`)
//! - Photographs are scaled into their panels after the vector pass (raster
//!   output only)

mod canvas;
pub mod fonts;
mod legend;
pub mod text;
pub mod util;

pub use fonts::{ensure_fonts, fonts_available};

use std::fs;
use std::path::Path;

use image::RgbImage;
use image::imageops::{self, FilterType};
use log::debug;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use crate::axes::{Axes, GridMode, TextAnchor};
use crate::error::{Result, VizError, drawing};
use crate::figure::{Figure, ImagePanel, Panel};
use crate::style::{INK, Theme};

use canvas::{Canvas, Frame};
use text::{LINE_HEIGHT, text_block_height_px, truncate_to_width, wrap_text_to_width};
use util::{compute_left_label_area_px, format_tick, nice_ticks};

const PANEL_PAD_PT: f64 = 6.0;
const TICK_LEN_PT: f64 = 3.5;
const TICK_PAD_PT: f64 = 3.5;
const MAX_TICKS: usize = 7;
const GRID_DASH_PT: (f64, f64) = (3.7, 1.6);
const SUPTITLE_PT: f64 = 14.0;
const PANEL_LABEL_PT: f64 = 12.0;
const IMAGE_PAD_PT: f64 = 4.0;

/// Photograph copied into the raster once the vector pass is done.
struct Blit<'f> {
    image: &'f RgbImage,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
}

impl Blit<'_> {
    fn apply(&self, target: &mut RgbImage) {
        let scaled = imageops::resize(self.image, self.width, self.height, FilterType::Triangle);
        imageops::replace(target, &scaled, self.x, self.y);
    }
}

fn prepare_fonts(figure: &Figure) -> Result<()> {
    if fonts::ensure_fonts(&figure.style.custom_font_paths, &figure.style.font_family) {
        Ok(())
    } else {
        Err(VizError::FontUnavailable)
    }
}

/// Render `figure` as an SVG document at `dpi` pixels per inch.
///
/// Image panels cannot be embedded; such figures are rejected.
pub fn render_svg_string(figure: &Figure, dpi: u32) -> Result<String> {
    if figure.has_images() {
        return Err(VizError::UnsupportedFormat {
            format: "svg with image panels".to_string(),
            supported: "png, jpg, jpeg, tiff, tif".to_string(),
        });
    }
    prepare_fonts(figure)?;
    let size = figure.pixel_size(dpi);
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, size).into_drawing_area();
        draw_figure(&root, figure, dpi, &mut Vec::new())?;
        root.present().map_err(drawing)?;
    }
    Ok(out)
}

pub fn render_svg<P: AsRef<Path>>(figure: &Figure, path: P, dpi: u32) -> Result<()> {
    let svg = render_svg_string(figure, dpi)?;
    fs::write(path.as_ref(), svg)?;
    debug!("wrote {}", path.as_ref().display());
    Ok(())
}

/// Render `figure` into an RGB raster of `inches * dpi` pixels.
pub fn render_rgb(figure: &Figure, dpi: u32) -> Result<RgbImage> {
    prepare_fonts(figure)?;
    let (w, h) = figure.pixel_size(dpi);
    let mut buf = vec![255u8; w as usize * h as usize * 3];
    let mut blits = Vec::new();
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        draw_figure(&root, figure, dpi, &mut blits)?;
        root.present().map_err(drawing)?;
    }
    let mut img = RgbImage::from_raw(w, h, buf)
        .ok_or_else(|| VizError::Drawing("raster buffer does not match figure size".to_string()))?;
    for blit in &blits {
        blit.apply(&mut img);
    }
    debug!("rendered {w}x{h} px with {} image panel(s)", blits.len());
    Ok(img)
}

fn draw_figure<'f, DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &'f Figure,
    dpi: u32,
    blits: &mut Vec<Blit<'f>>,
) -> Result<()> {
    root.fill(&WHITE).map_err(drawing)?;

    let body = match figure.suptitle.as_deref() {
        Some(title) => {
            let canvas = Canvas::new(root, dpi);
            let (w, _) = canvas.size();
            let band = canvas.px(SUPTITLE_PT) * (LINE_HEIGHT + 0.4);
            canvas.text(
                title,
                (w / 2.0, canvas.px(SUPTITLE_PT) * 0.2),
                SUPTITLE_PT,
                INK,
                true,
                Pos::new(HPos::Center, VPos::Top),
            )?;
            root.split_vertically(band.round() as i32).1
        }
        None => root.clone(),
    };

    if figure.rows.is_empty() {
        return Ok(());
    }
    let (_, body_h) = body.dim_in_pixel();
    let total: f64 = figure.rows.iter().map(|r| r.height_ratio.max(0.0)).sum();
    let total = if total > 0.0 { total } else { figure.rows.len() as f64 };
    let mut acc = 0.0;
    let breaks: Vec<i32> = figure.rows[..figure.rows.len() - 1]
        .iter()
        .map(|r| {
            acc += r.height_ratio.max(0.0);
            (acc / total * body_h as f64).round() as i32
        })
        .collect();
    let row_areas = body.split_by_breakpoints([] as [i32; 0], &breaks);

    for (row, row_area) in figure.rows.iter().zip(&row_areas) {
        if row.panels.is_empty() {
            continue;
        }
        let cells = row_area.split_evenly((1, row.panels.len()));
        for (panel, cell) in row.panels.iter().zip(&cells) {
            match panel {
                Panel::Chart(ax) => draw_axes(cell, ax, dpi)?,
                Panel::Image(img) => draw_image(cell, img, dpi, blits)?,
                Panel::Empty => {}
            }
        }
    }
    Ok(())
}

fn draw_image<'f, DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &'f ImagePanel,
    dpi: u32,
    blits: &mut Vec<Blit<'f>>,
) -> Result<()> {
    let canvas = Canvas::new(area, dpi);
    let (w, h) = canvas.size();
    let pad = canvas.px(IMAGE_PAD_PT);

    let mut top = pad;
    if let Some(label) = panel.label.as_deref() {
        let label_px = canvas.px(panel.label_size);
        let lines = wrap_text_to_width(label, label_px, (w - 2.0 * pad).max(1.0));
        for (i, line) in lines.iter().enumerate() {
            canvas.text(
                line,
                (w / 2.0, pad + i as f64 * label_px * LINE_HEIGHT),
                panel.label_size,
                INK,
                panel.label_bold,
                Pos::new(HPos::Center, VPos::Top),
            )?;
        }
        top += text_block_height_px(lines.len(), label_px) + pad;
    }

    let (iw, ih) = panel.image.dimensions();
    if iw == 0 || ih == 0 {
        return Ok(());
    }
    let (avail_w, avail_h) = ((w - 2.0 * pad).max(1.0), (h - top - pad).max(1.0));
    let scale = (avail_w / iw as f64).min(avail_h / ih as f64);
    let dw = (iw as f64 * scale).round().max(1.0);
    let dh = (ih as f64 * scale).round().max(1.0);
    let (base_x, base_y) = area.get_base_pixel();
    blits.push(Blit {
        image: &panel.image,
        x: base_x as i64 + ((w - dw) / 2.0).round() as i64,
        y: base_y as i64 + (top + (avail_h - dh) / 2.0).round() as i64,
        width: dw as u32,
        height: dh as u32,
    });
    Ok(())
}

fn text_pos(anchor: TextAnchor) -> Pos {
    match anchor {
        TextAnchor::BottomCenter => Pos::new(HPos::Center, VPos::Bottom),
        TextAnchor::TopCenter => Pos::new(HPos::Center, VPos::Top),
        TextAnchor::Center => Pos::new(HPos::Center, VPos::Center),
        TextAnchor::BottomLeft => Pos::new(HPos::Left, VPos::Bottom),
    }
}

fn draw_axes<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, ax: &Axes, dpi: u32) -> Result<()> {
    let canvas = Canvas::new(area, dpi);
    let theme = ax.style.theme();
    let (w, h) = canvas.size();
    let pad = canvas.px(PANEL_PAD_PT);
    let (xr, yr) = (ax.get_xlim(), ax.get_ylim());
    let locale = ax.style.locale.as_str();

    let (y_ticks, y_step) = nice_ticks(yr, MAX_TICKS);
    let y_labels: Vec<String> = y_ticks.iter().map(|v| format_tick(*v, y_step, locale)).collect();
    let x_ticks: Vec<(f64, String)> = if ax.x_ticks.is_empty() {
        let (ticks, step) = nice_ticks(xr, MAX_TICKS);
        ticks
            .into_iter()
            .map(|v| (v, format_tick(v, step, locale)))
            .collect()
    } else {
        ax.x_ticks
            .iter()
            .filter(|(v, _)| xr.contains(*v))
            .cloned()
            .collect()
    };

    let entries = ax.legend_entries();
    let legend = ax
        .legend
        .as_ref()
        .filter(|_| !entries.is_empty())
        .map(|plan| (plan, legend::measure(&canvas, plan, &entries, &theme)));
    let reserved = |above: bool| {
        legend
            .as_ref()
            .and_then(|(plan, bx)| {
                plan.anchor.filter(|(x, y)| if above { *y > 1.0 } else { *x > 1.0 }).map(|_| {
                    if above { bx.height } else { bx.width }
                })
            })
            .map_or(0.0, |size| size + pad)
    };
    let reserve_top = reserved(true);
    let reserve_right = reserved(false);

    let tick_len = canvas.px(TICK_LEN_PT);
    let tick_gap = canvas.px(TICK_PAD_PT);
    let tick_px = canvas.px(theme.tick_size);
    let label_px = canvas.px(theme.label_size);

    let mut top = pad + reserve_top;
    if ax.title.is_some() {
        top += canvas.px(theme.title_size) * LINE_HEIGHT + canvas.px(theme.title_pad);
    } else if ax.panel_label.is_some() {
        top += canvas.px(PANEL_LABEL_PT) * LINE_HEIGHT;
    }
    let mut left = pad;
    let mut bottom = h - pad;
    if ax.axis_visible {
        left += compute_left_label_area_px(&y_labels, tick_px) + tick_len + tick_gap;
        if ax.ylabel.is_some() {
            left += label_px * LINE_HEIGHT + tick_gap;
        }
        bottom -= tick_len + tick_gap + tick_px * LINE_HEIGHT;
        if ax.xlabel.is_some() {
            bottom -= label_px * LINE_HEIGHT + tick_gap;
        }
    }
    let frame = Frame {
        left,
        top,
        right: (w - pad - reserve_right).max(left + 1.0),
        bottom: bottom.max(top + 1.0),
        x: xr,
        y: yr,
    };

    draw_grid(&canvas, ax.grid, &theme, &frame, &y_ticks, &x_ticks)?;
    draw_data(&canvas, ax, &frame)?;
    if ax.axis_visible {
        draw_spines_and_ticks(&canvas, ax, &theme, &frame, &y_ticks, &y_labels, &x_ticks)?;
    }

    for seg in &ax.segments {
        canvas.polyline(&[frame.px(seg.from), frame.px(seg.to)], seg.color, 1.0, seg.width)?;
    }
    for note in &ax.texts {
        canvas.text(
            &note.text,
            frame.px((note.x, note.y)),
            note.font_size,
            note.color,
            note.bold,
            text_pos(note.anchor),
        )?;
    }

    let center_x = (frame.left + frame.right) / 2.0;
    if let Some(title) = ax.title.as_deref() {
        // the title band holds a single line
        let title = truncate_to_width(title, canvas.px(theme.title_size), w - 2.0 * pad);
        canvas.text(
            &title,
            (center_x, frame.top - canvas.px(theme.title_pad)),
            theme.title_size,
            theme.text_color,
            theme.title_bold,
            Pos::new(HPos::Center, VPos::Bottom),
        )?;
    }
    if let Some(label) = ax.panel_label.as_deref() {
        let x = (frame.left - 0.1 * frame.width()).max(0.0);
        let y = (frame.top - 0.05 * frame.height()).max(canvas.px(PANEL_LABEL_PT) * LINE_HEIGHT);
        canvas.text(
            label,
            (x, y),
            PANEL_LABEL_PT,
            theme.text_color,
            true,
            Pos::new(HPos::Left, VPos::Bottom),
        )?;
    }

    if let Some((plan, bx)) = legend.as_ref() {
        let data: Vec<(f64, f64)> =
            ax.data_points().into_iter().map(|p| frame.fraction(p)).collect();
        let top_strip = (reserve_top > 0.0).then_some(pad);
        let origin = legend::place(bx, plan, &frame, (w, h), top_strip, &data);
        legend::draw(&canvas, bx, plan, &entries, &theme, origin)?;
    }
    Ok(())
}

fn draw_grid<DB: DrawingBackend>(
    canvas: &Canvas<'_, DB>,
    grid: GridMode,
    theme: &Theme,
    frame: &Frame,
    y_ticks: &[f64],
    x_ticks: &[(f64, String)],
) -> Result<()> {
    let (vertical, dashed) = match grid {
        GridMode::Off => return Ok(()),
        GridMode::Y { dashed } => (false, dashed),
        GridMode::Both { dashed } => (true, dashed),
    };
    let rule = |from: (f64, f64), to: (f64, f64)| {
        if dashed {
            canvas.dashed(
                from,
                to,
                theme.grid_color,
                theme.grid_alpha,
                theme.grid_line_width,
                GRID_DASH_PT,
            )
        } else {
            canvas.polyline(&[from, to], theme.grid_color, theme.grid_alpha, theme.grid_line_width)
        }
    };
    for &v in y_ticks {
        let (_, py) = frame.px((frame.x.min, v));
        rule((frame.left, py), (frame.right, py))?;
    }
    if vertical {
        for (v, _) in x_ticks {
            let (px, _) = frame.px((*v, frame.y.min));
            rule((px, frame.top), (px, frame.bottom))?;
        }
    }
    Ok(())
}

fn draw_data<DB: DrawingBackend>(canvas: &Canvas<'_, DB>, ax: &Axes, frame: &Frame) -> Result<()> {
    for band in &ax.bands {
        let upper = band.x.iter().zip(&band.upper).map(|(x, y)| (*x, *y));
        let lower = band.x.iter().zip(&band.lower).rev().map(|(x, y)| (*x, *y));
        let outline: Vec<(f64, f64)> = upper
            .chain(lower)
            .map(|p| frame.clamp(frame.px(p)))
            .collect();
        canvas.fill_polygon(&outline, band.color, band.alpha)?;
    }

    for series in &ax.bar_series {
        for bar in &series.bars {
            let a = frame.clamp(frame.px((bar.left, bar.bottom)));
            let b = frame.clamp(frame.px((bar.left + bar.width, bar.top())));
            canvas.fill_rect(a, b, series.color, series.alpha)?;
        }
    }

    for line in &ax.lines {
        let pts: Vec<(f64, f64)> = line.points.iter().map(|p| frame.px(*p)).collect();
        let clamped: Vec<(f64, f64)> = pts.iter().map(|p| frame.clamp(*p)).collect();
        canvas.polyline(&clamped, line.color, 1.0, line.width)?;
        if let Some(marker) = line.marker {
            for p in pts.iter().filter(|p| frame.contains(**p)) {
                canvas.marker(marker, *p, line.marker_size, line.color)?;
            }
        }
    }

    for sc in &ax.scatters {
        for p in sc.points.iter().map(|p| frame.px(*p)).filter(|p| frame.contains(*p)) {
            canvas.marker(sc.marker, p, sc.size, sc.color)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_spines_and_ticks<DB: DrawingBackend>(
    canvas: &Canvas<'_, DB>,
    ax: &Axes,
    theme: &Theme,
    frame: &Frame,
    y_ticks: &[f64],
    y_labels: &[String],
    x_ticks: &[(f64, String)],
) -> Result<()> {
    let (l, t, r, b) = (frame.left, frame.top, frame.right, frame.bottom);
    let edge = |from: (f64, f64), to: (f64, f64)| {
        canvas.polyline(&[from, to], theme.edge_color, 1.0, theme.axis_line_width)
    };
    if ax.spines.top {
        edge((l, t), (r, t))?;
    }
    if ax.spines.right {
        edge((r, t), (r, b))?;
    }
    if ax.spines.bottom {
        edge((l, b), (r, b))?;
    }
    if ax.spines.left {
        edge((l, t), (l, b))?;
    }

    let tick_len = canvas.px(TICK_LEN_PT);
    let tick_gap = canvas.px(TICK_PAD_PT);
    let tick_px = canvas.px(theme.tick_size);
    let label_px = canvas.px(theme.label_size);

    for (v, label) in y_ticks.iter().zip(y_labels) {
        let (_, py) = frame.px((frame.x.min, *v));
        edge((l - tick_len, py), (l, py))?;
        canvas.text(
            label,
            (l - tick_len - tick_gap, py),
            theme.tick_size,
            theme.text_color,
            false,
            Pos::new(HPos::Right, VPos::Center),
        )?;
    }
    for (v, label) in x_ticks {
        let (px, _) = frame.px((*v, frame.y.min));
        edge((px, b), (px, b + tick_len))?;
        canvas.text(
            label,
            (px, b + tick_len + tick_gap),
            theme.tick_size,
            theme.text_color,
            false,
            Pos::new(HPos::Center, VPos::Top),
        )?;
    }

    let center_x = (l + r) / 2.0;
    if let Some(xlabel) = ax.xlabel.as_deref() {
        let y = b + tick_len + 2.0 * tick_gap + tick_px * LINE_HEIGHT;
        canvas.text(
            xlabel,
            (center_x, y),
            theme.label_size,
            theme.text_color,
            false,
            Pos::new(HPos::Center, VPos::Top),
        )?;
    }
    if let Some(ylabel) = ax.ylabel.as_deref() {
        let x = canvas.px(PANEL_PAD_PT) + label_px * LINE_HEIGHT / 2.0;
        canvas.vertical_text(ylabel, (x, (t + b) / 2.0), theme.label_size, theme.text_color)?;
    }
    Ok(())
}
