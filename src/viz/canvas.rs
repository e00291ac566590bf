//! Pixel-space drawing on one panel.
//!
//! Sizes are given in points and converted with the render dpi; positions are
//! pixels relative to the panel's drawing area.

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::Pos;
use plotters::style::{FontDesc, FontFamily, FontStyle, FontTransform};

use crate::axes::Marker;
use crate::error::{Result, drawing};
use crate::geometry::AxisRange;
use crate::palettes::Rgb8;

use super::util::{pt_to_px, to_rgba};

/// Plot rectangle of a chart in area pixels, with its data limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub x: AxisRange,
    pub y: AxisRange,
}

impl Frame {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn px(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.left + (x - self.x.min) / self.x.span() * self.width(),
            self.bottom - (y - self.y.min) / self.y.span() * self.height(),
        )
    }

    /// Data point in axes fractions.
    pub fn fraction(&self, (x, y): (f64, f64)) -> (f64, f64) {
        ((x - self.x.min) / self.x.span(), (y - self.y.min) / self.y.span())
    }

    /// Pixel point pulled onto the frame border.
    pub fn clamp(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (x.clamp(self.left, self.right), y.clamp(self.top, self.bottom))
    }

    pub fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.left - 0.5
            && x <= self.right + 0.5
            && y >= self.top - 0.5
            && y <= self.bottom + 0.5
    }
}

fn ipt((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

pub(crate) struct Canvas<'a, DB: DrawingBackend> {
    area: &'a DrawingArea<DB, Shift>,
    dpi: u32,
}

impl<'a, DB: DrawingBackend> Canvas<'a, DB> {
    pub fn new(area: &'a DrawingArea<DB, Shift>, dpi: u32) -> Self {
        Self { area, dpi }
    }

    pub fn size(&self) -> (f64, f64) {
        let (w, h) = self.area.dim_in_pixel();
        (w as f64, h as f64)
    }

    pub fn px(&self, pt: f64) -> f64 {
        pt_to_px(pt, self.dpi)
    }

    fn stroke_px(&self, width_pt: f64) -> u32 {
        self.px(width_pt).round().max(1.0) as u32
    }

    pub fn polyline(
        &self,
        pts: &[(f64, f64)],
        color: Rgb8,
        alpha: f64,
        width_pt: f64,
    ) -> Result<()> {
        if pts.len() < 2 {
            return Ok(());
        }
        let style = ShapeStyle {
            color: to_rgba(color, alpha),
            filled: false,
            stroke_width: self.stroke_px(width_pt),
        };
        let path: Vec<(i32, i32)> = pts.iter().copied().map(ipt).collect();
        self.area
            .draw(&PathElement::new(path, style))
            .map_err(drawing)
    }

    /// Straight line broken into dashes of `dash_pt` on, `gap_pt` off.
    pub fn dashed(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb8,
        alpha: f64,
        width_pt: f64,
        (dash_pt, gap_pt): (f64, f64),
    ) -> Result<()> {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = dx.hypot(dy);
        let (dash, gap) = (self.px(dash_pt).max(1.0), self.px(gap_pt).max(1.0));
        if len <= dash {
            return self.polyline(&[from, to], color, alpha, width_pt);
        }
        let (ux, uy) = (dx / len, dy / len);
        let mut t = 0.0;
        while t < len {
            let end = (t + dash).min(len);
            let a = (from.0 + ux * t, from.1 + uy * t);
            let b = (from.0 + ux * end, from.1 + uy * end);
            self.polyline(&[a, b], color, alpha, width_pt)?;
            t = end + gap;
        }
        Ok(())
    }

    pub fn fill_rect(&self, a: (f64, f64), b: (f64, f64), color: Rgb8, alpha: f64) -> Result<()> {
        let style = ShapeStyle {
            color: to_rgba(color, alpha),
            filled: true,
            stroke_width: 0,
        };
        self.area
            .draw(&Rectangle::new([ipt(a), ipt(b)], style))
            .map_err(drawing)
    }

    pub fn outline_rect(
        &self,
        a: (f64, f64),
        b: (f64, f64),
        color: Rgb8,
        width_pt: f64,
    ) -> Result<()> {
        let style = ShapeStyle {
            color: to_rgba(color, 1.0),
            filled: false,
            stroke_width: self.stroke_px(width_pt),
        };
        self.area
            .draw(&Rectangle::new([ipt(a), ipt(b)], style))
            .map_err(drawing)
    }

    pub fn fill_polygon(&self, pts: &[(f64, f64)], color: Rgb8, alpha: f64) -> Result<()> {
        if pts.len() < 3 {
            return Ok(());
        }
        let style = ShapeStyle {
            color: to_rgba(color, alpha),
            filled: true,
            stroke_width: 0,
        };
        let path: Vec<(i32, i32)> = pts.iter().copied().map(ipt).collect();
        self.area.draw(&Polygon::new(path, style)).map_err(drawing)
    }

    /// Filled marker of diameter `size_pt` centred on `at`.
    pub fn marker(&self, shape: Marker, at: (f64, f64), size_pt: f64, color: Rgb8) -> Result<()> {
        let r = (self.px(size_pt) / 2.0).max(1.0);
        let (x, y) = at;
        let fill = to_rgba(color, 1.0).filled();
        match shape {
            Marker::Circle => self
                .area
                .draw(&Circle::new(ipt(at), r.round() as i32, fill))
                .map_err(drawing),
            Marker::Square => self.fill_rect((x - r, y - r), (x + r, y + r), color, 1.0),
            Marker::Triangle => {
                self.fill_polygon(&[(x, y - r), (x - r, y + r), (x + r, y + r)], color, 1.0)
            }
            Marker::Diamond => self.fill_polygon(
                &[(x, y - r), (x + r, y), (x, y + r), (x - r, y)],
                color,
                1.0,
            ),
            Marker::Cross => {
                let w = size_pt / 4.0;
                self.polyline(&[(x - r, y - r), (x + r, y + r)], color, 1.0, w)?;
                self.polyline(&[(x - r, y + r), (x + r, y - r)], color, 1.0, w)
            }
        }
    }

    fn font(&self, size_pt: f64, bold: bool) -> FontDesc<'static> {
        let style = if bold { FontStyle::Bold } else { FontStyle::Normal };
        FontDesc::new(FontFamily::SansSerif, self.px(size_pt).max(1.0), style)
    }

    pub fn text(
        &self,
        s: &str,
        at: (f64, f64),
        size_pt: f64,
        color: Rgb8,
        bold: bool,
        pos: Pos,
    ) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        let c = to_rgba(color, 1.0);
        let style = TextStyle::from(self.font(size_pt, bold)).color(&c).pos(pos);
        self.area
            .draw(&Text::new(s.to_string(), ipt(at), style))
            .map_err(drawing)
    }

    /// Text rotated to read bottom-up, centred on `at`.
    pub fn vertical_text(&self, s: &str, at: (f64, f64), size_pt: f64, color: Rgb8) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        let c = to_rgba(color, 1.0);
        let style = TextStyle::from(self.font(size_pt, false).transform(FontTransform::Rotate270))
            .color(&c)
            .pos(Pos::new(
                plotters::style::text_anchor::HPos::Center,
                plotters::style::text_anchor::VPos::Center,
            ));
        self.area
            .draw(&Text::new(s.to_string(), ipt(at), style))
            .map_err(drawing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame {
            left: 100.0,
            top: 50.0,
            right: 500.0,
            bottom: 350.0,
            x: AxisRange::new(0.0, 4.0),
            y: AxisRange::new(0.0, 3000.0),
        }
    }

    #[test]
    fn data_maps_onto_frame_corners() {
        let f = frame();
        assert_eq!(f.px((0.0, 0.0)), (100.0, 350.0));
        assert_eq!(f.px((4.0, 3000.0)), (500.0, 50.0));
        assert_eq!(f.px((2.0, 1500.0)), (300.0, 200.0));
        assert_eq!(f.fraction((1.0, 750.0)), (0.25, 0.25));
    }

    #[test]
    fn clamp_and_contains() {
        let f = frame();
        assert_eq!(f.clamp((0.0, 400.0)), (100.0, 350.0));
        assert!(f.contains((100.0, 50.0)));
        assert!(!f.contains((99.0, 200.0)));
    }
}
