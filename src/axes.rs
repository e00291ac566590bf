//! In-memory chart model.
//!
//! An [`Axes`] records the primitives a chart is made of (bar series, lines,
//! scatter points, confidence bands, annotation segments and text) together
//! with limits, labels and a resolved legend. Styling helpers and the layout
//! heuristics operate on this model; `viz` turns it into pixels.

use crate::geometry::{AxisRange, PlotGeometry, Primitive};
use crate::legend::LegendPlan;
use crate::palettes::Rgb8;
use crate::style::{INK, StyleConfig};

/// Autoscale padding as a fraction of the data span.
const MARGIN: f64 = 0.05;

/// Marker shapes for line vertices and scatter points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Diamond,
    Cross,
}

impl Marker {
    /// Marker for the `idx`-th series of a time series (circle, square,
    /// triangle, diamond, repeating).
    pub fn cycle(idx: usize) -> Self {
        const ORDER: [Marker; 4] = [
            Marker::Circle,
            Marker::Square,
            Marker::Triangle,
            Marker::Diamond,
        ];
        ORDER[idx % ORDER.len()]
    }
}

/// One rectangle of a bar series, in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub left: f64,
    pub width: f64,
    pub bottom: f64,
    pub height: f64,
}

impl Bar {
    pub fn top(&self) -> f64 {
        self.bottom + self.height
    }
}

/// Bars sharing colour and legend label (one `bar()` call).
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub bars: Vec<Bar>,
    pub color: Rgb8,
    pub alpha: f64,
    pub label: Option<String>,
}

impl BarSeries {
    pub fn color(&mut self, color: Rgb8) -> &mut Self {
        self.color = color;
        self
    }

    pub fn alpha(&mut self, alpha: f64) -> &mut Self {
        self.alpha = alpha;
        self
    }

    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Stack every bar on the given baselines (one per bar).
    pub fn bottoms(&mut self, bottoms: &[f64]) -> &mut Self {
        for (bar, b) in self.bars.iter_mut().zip(bottoms) {
            bar.bottom = *b;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb8,
    pub width: f64,
    pub marker: Option<Marker>,
    pub marker_size: f64,
    pub label: Option<String>,
}

impl Line {
    pub fn new(points: Vec<(f64, f64)>, color: Rgb8) -> Self {
        Self {
            points,
            color,
            width: 1.5,
            marker: None,
            marker_size: 6.0,
            label: None,
        }
    }

    pub fn color(&mut self, color: Rgb8) -> &mut Self {
        self.color = color;
        self
    }

    pub fn width(&mut self, width: f64) -> &mut Self {
        self.width = width;
        self
    }

    pub fn marker(&mut self, marker: Marker, size: f64) -> &mut Self {
        self.marker = Some(marker);
        self.marker_size = size;
        self
    }

    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb8,
    pub marker: Marker,
    pub size: f64,
    pub label: Option<String>,
}

impl Scatter {
    pub fn color(&mut self, color: Rgb8) -> &mut Self {
        self.color = color;
        self
    }

    pub fn marker(&mut self, marker: Marker) -> &mut Self {
        self.marker = marker;
        self
    }

    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }
}

/// Filled region between two curves sharing x values.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub x: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub color: Rgb8,
    pub alpha: f64,
}

/// Straight annotation stroke (bracket arms, scale bars). Not part of the
/// data geometry and not autoscaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: Rgb8,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    BottomCenter,
    TopCenter,
    Center,
    BottomLeft,
}

/// Text placed in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNote {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: f64,
    pub color: Rgb8,
    pub anchor: TextAnchor,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    Off,
    /// Horizontal lines at the y ticks only.
    Y { dashed: bool },
    Both { dashed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spines {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Spines {
    fn all(visible: bool) -> Self {
        Self {
            top: visible,
            right: visible,
            bottom: visible,
            left: visible,
        }
    }
}

/// What a legend entry draws as its handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleKind {
    Line(Option<Marker>),
    Marker(Marker),
    Patch { alpha: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb8,
    pub kind: HandleKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub style: StyleConfig,
    pub bar_series: Vec<BarSeries>,
    pub lines: Vec<Line>,
    pub scatters: Vec<Scatter>,
    pub bands: Vec<Band>,
    pub segments: Vec<Segment>,
    pub texts: Vec<TextNote>,
    pub xlim: Option<AxisRange>,
    pub ylim: Option<AxisRange>,
    /// Category tick positions and labels; numeric ticks when empty.
    pub x_ticks: Vec<(f64, String)>,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub grid: GridMode,
    pub spines: Spines,
    /// Hides ticks, spines, grid and labels.
    pub axis_visible: bool,
    pub legend: Option<LegendPlan>,
    /// Bold letter drawn above the top-left corner in results panels.
    pub panel_label: Option<String>,
    cycle_idx: usize,
}

impl Axes {
    pub fn new(style: &StyleConfig) -> Self {
        Self {
            style: style.clone(),
            bar_series: Vec::new(),
            lines: Vec::new(),
            scatters: Vec::new(),
            bands: Vec::new(),
            segments: Vec::new(),
            texts: Vec::new(),
            xlim: None,
            ylim: None,
            x_ticks: Vec::new(),
            title: None,
            xlabel: None,
            ylabel: None,
            grid: if style.show_grid {
                GridMode::Both { dashed: false }
            } else {
                GridMode::Off
            },
            spines: Spines::all(style.show_spines),
            axis_visible: true,
            legend: None,
            panel_label: None,
            cycle_idx: 0,
        }
    }

    /// Next colour of the style's cycle.
    pub fn next_color(&mut self) -> Rgb8 {
        let c = self.style.cycle.color(self.cycle_idx);
        self.cycle_idx += 1;
        c
    }

    /// Centre-aligned bars at `x` with the given heights (baseline 0).
    pub fn bar(&mut self, x: &[f64], heights: &[f64], width: f64) -> &mut BarSeries {
        let color = self.next_color();
        let bars = x
            .iter()
            .zip(heights)
            .map(|(x, h)| Bar {
                left: x - width / 2.0,
                width,
                bottom: 0.0,
                height: *h,
            })
            .collect();
        self.bar_series.push(BarSeries {
            bars,
            color,
            alpha: 1.0,
            label: None,
        });
        let last = self.bar_series.len() - 1;
        &mut self.bar_series[last]
    }

    pub fn plot(&mut self, x: &[f64], y: &[f64]) -> &mut Line {
        let color = self.next_color();
        let points = x.iter().copied().zip(y.iter().copied()).collect();
        self.lines.push(Line::new(points, color));
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn scatter(&mut self, x: &[f64], y: &[f64]) -> &mut Scatter {
        let color = self.next_color();
        self.scatters.push(Scatter {
            points: x.iter().copied().zip(y.iter().copied()).collect(),
            color,
            marker: Marker::Circle,
            size: 6.0,
            label: None,
        });
        let last = self.scatters.len() - 1;
        &mut self.scatters[last]
    }

    pub fn fill_between(
        &mut self,
        x: &[f64],
        lower: &[f64],
        upper: &[f64],
        color: Rgb8,
        alpha: f64,
    ) {
        self.bands.push(Band {
            x: x.to_vec(),
            lower: lower.to_vec(),
            upper: upper.to_vec(),
            color,
            alpha,
        });
    }

    pub fn segment(&mut self, from: (f64, f64), to: (f64, f64), width: f64) {
        self.segments.push(Segment {
            from,
            to,
            color: INK,
            width,
        });
    }

    pub fn text(
        &mut self,
        x: f64,
        y: f64,
        text: impl Into<String>,
        anchor: TextAnchor,
    ) -> &mut TextNote {
        self.texts.push(TextNote {
            x,
            y,
            text: text.into(),
            font_size: self.style.font_size,
            color: INK,
            anchor,
            bold: false,
        });
        let last = self.texts.len() - 1;
        &mut self.texts[last]
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_xlabel(&mut self, label: impl Into<String>) {
        self.xlabel = Some(label.into());
    }

    pub fn set_ylabel(&mut self, label: impl Into<String>) {
        self.ylabel = Some(label.into());
    }

    pub fn set_xticks(&mut self, positions: &[f64], labels: &[String]) {
        self.x_ticks = positions
            .iter()
            .copied()
            .zip(labels.iter().cloned())
            .collect();
    }

    pub fn set_xlim(&mut self, a: f64, b: f64) {
        self.xlim = Some(AxisRange::new(a, b));
    }

    pub fn set_ylim(&mut self, a: f64, b: f64) {
        self.ylim = Some(AxisRange::new(a, b));
    }

    pub fn axis_off(&mut self) {
        self.axis_visible = false;
        self.grid = GridMode::Off;
        self.spines = Spines::all(false);
    }

    /// Explicit x-limits, else autoscaled.
    pub fn get_xlim(&self) -> AxisRange {
        self.xlim.unwrap_or_else(|| {
            let xs = self.data_x();
            autoscale(&xs, &[])
        })
    }

    /// Explicit y-limits, else autoscaled with bars sticking to their
    /// baselines.
    pub fn get_ylim(&self) -> AxisRange {
        self.ylim.unwrap_or_else(|| {
            let ys = self.data_y();
            let sticky: Vec<f64> = self
                .bar_series
                .iter()
                .flat_map(|s| s.bars.iter().map(|b| b.bottom))
                .collect();
            autoscale(&ys, &sticky)
        })
    }

    /// Snapshot of bars, line vertices and scatter points with the current
    /// y-range.
    pub fn geometry(&self) -> PlotGeometry {
        let mut primitives = Vec::new();
        for series in &self.bar_series {
            primitives.extend(
                series
                    .bars
                    .iter()
                    .map(|b| Primitive::bar(b.left, b.width, b.bottom, b.height)),
            );
        }
        for line in &self.lines {
            primitives.extend(line.points.iter().map(|&(x, y)| Primitive::line_point(x, y)));
        }
        for sc in &self.scatters {
            primitives.extend(sc.points.iter().map(|&(x, y)| Primitive::scatter_point(x, y)));
        }
        PlotGeometry::with_primitives(primitives, self.get_ylim())
    }

    /// Any rectangle present.
    pub fn is_bar_chart(&self) -> bool {
        self.bar_series.iter().any(|s| !s.bars.is_empty())
    }

    /// Labelled series in legend order: lines, scatter, then bar series.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        let lines = self.lines.iter().filter_map(|l| {
            l.label.as_ref().map(|label| LegendEntry {
                label: label.clone(),
                color: l.color,
                kind: HandleKind::Line(l.marker),
            })
        });
        let scatters = self.scatters.iter().filter_map(|s| {
            s.label.as_ref().map(|label| LegendEntry {
                label: label.clone(),
                color: s.color,
                kind: HandleKind::Marker(s.marker),
            })
        });
        let bars = self.bar_series.iter().filter_map(|s| {
            s.label.as_ref().map(|label| LegendEntry {
                label: label.clone(),
                color: s.color,
                kind: HandleKind::Patch { alpha: s.alpha },
            })
        });
        lines.chain(scatters).chain(bars).collect()
    }

    pub fn legend_labels(&self) -> Vec<String> {
        self.legend_entries().into_iter().map(|e| e.label).collect()
    }

    /// Representative data points (bar tops and centres included) used to
    /// score legend locations.
    pub fn data_points(&self) -> Vec<(f64, f64)> {
        let mut pts = Vec::new();
        for series in &self.bar_series {
            for b in &series.bars {
                let steps = 4;
                for k in 0..=steps {
                    let y = b.bottom + b.height * k as f64 / steps as f64;
                    pts.push((b.left + b.width / 2.0, y));
                }
            }
        }
        for line in &self.lines {
            pts.extend(line.points.iter().copied());
        }
        for sc in &self.scatters {
            pts.extend(sc.points.iter().copied());
        }
        pts.retain(|(x, y)| x.is_finite() && y.is_finite());
        pts
    }

    fn data_x(&self) -> Vec<f64> {
        let mut xs = Vec::new();
        for series in &self.bar_series {
            for b in &series.bars {
                xs.push(b.left);
                xs.push(b.left + b.width);
            }
        }
        for line in &self.lines {
            xs.extend(line.points.iter().map(|p| p.0));
        }
        for sc in &self.scatters {
            xs.extend(sc.points.iter().map(|p| p.0));
        }
        for band in &self.bands {
            xs.extend(band.x.iter().copied());
        }
        xs
    }

    fn data_y(&self) -> Vec<f64> {
        let mut ys = Vec::new();
        for series in &self.bar_series {
            for b in &series.bars {
                ys.push(b.bottom);
                ys.push(b.top());
            }
        }
        for line in &self.lines {
            ys.extend(line.points.iter().map(|p| p.1));
        }
        for sc in &self.scatters {
            ys.extend(sc.points.iter().map(|p| p.1));
        }
        for band in &self.bands {
            ys.extend(band.lower.iter().copied());
            ys.extend(band.upper.iter().copied());
        }
        ys
    }
}

/// Data limits padded by [`MARGIN`]. A padded bound never crosses a sticky
/// value the data touches (bar baselines). Degenerate spans are widened.
fn autoscale(values: &[f64], sticky: &[f64]) -> AxisRange {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        return AxisRange::new(0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * hi.abs().max(lo.abs()).max(1.0) {
        if lo == 0.0 {
            return AxisRange::new(-MARGIN, MARGIN);
        }
        return AxisRange::new(lo - MARGIN * lo.abs(), hi + MARGIN * hi.abs());
    }

    let pad = (hi - lo) * MARGIN;
    let mut min = lo - pad;
    let mut max = hi + pad;
    for &s in sticky {
        if min < s && s <= lo {
            min = s;
        }
        if max > s && s >= hi {
            max = s;
        }
    }
    AxisRange::new(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> Axes {
        Axes::new(&StyleConfig::default())
    }

    #[test]
    fn bars_stick_to_zero_baseline() {
        let mut ax = axes();
        ax.bar(&[0.0, 1.0, 2.0], &[10.0, 20.0, 15.0], 0.8);
        let y = ax.get_ylim();
        assert_eq!(y.min, 0.0);
        assert!((y.max - 21.0).abs() < 1e-9);
    }

    #[test]
    fn lines_get_symmetric_margins() {
        let mut ax = axes();
        ax.plot(&[0.0, 10.0], &[5.0, 15.0]);
        let x = ax.get_xlim();
        let y = ax.get_ylim();
        assert!((x.min + 0.5).abs() < 1e-9 && (x.max - 10.5).abs() < 1e-9);
        assert!((y.min - 4.5).abs() < 1e-9 && (y.max - 15.5).abs() < 1e-9);
    }

    #[test]
    fn explicit_limits_win() {
        let mut ax = axes();
        ax.plot(&[0.0, 1.0], &[0.0, 1.0]);
        ax.set_ylim(10.0, -2.0);
        assert_eq!(ax.get_ylim(), AxisRange::new(-2.0, 10.0));
    }

    #[test]
    fn empty_and_flat_data_have_usable_limits() {
        let ax = axes();
        assert_eq!(ax.get_ylim(), AxisRange::new(0.0, 1.0));
        let mut flat = axes();
        flat.plot(&[0.0, 1.0], &[4.0, 4.0]);
        let y = flat.get_ylim();
        assert!(y.max > y.min);
    }

    #[test]
    fn geometry_covers_all_primitive_kinds() {
        let mut ax = axes();
        ax.bar(&[0.0, 1.0], &[3.0, 4.0], 0.5);
        ax.plot(&[0.0, 1.0], &[1.0, 2.0]);
        ax.scatter(&[2.0], &[9.0]);
        let g = ax.geometry();
        assert_eq!(g.primitives.len(), 5);
        assert!(g.has_bars());
        assert_eq!(g.primitives[1].x, 1.0);
        assert_eq!(g.primitives[1].value, 4.0);
    }

    #[test]
    fn series_take_successive_cycle_colours() {
        let mut ax = Axes::new(&StyleConfig::with_cycle(crate::palettes::ColorCycle::Comparison));
        let a = ax.plot(&[0.0], &[0.0]).color;
        let b = ax.plot(&[0.0], &[0.0]).color;
        assert_eq!(a.to_hex(), "#8B7A7A");
        assert_eq!(b.to_hex(), "#5B8F7D");
    }

    #[test]
    fn legend_entries_skip_unlabelled_series() {
        let mut ax = axes();
        ax.bar(&[0.0], &[1.0], 0.35).label("Control").alpha(0.8);
        ax.bar(&[1.0], &[1.0], 0.35);
        ax.plot(&[0.0], &[1.0]).label("Trend");
        assert_eq!(ax.legend_labels(), vec!["Trend".to_string(), "Control".to_string()]);
        assert!(ax.is_bar_chart());
        assert_eq!(
            ax.legend_entries()[1].kind,
            HandleKind::Patch { alpha: 0.8 }
        );
    }

    #[test]
    fn grid_and_spines_follow_style() {
        let ax = Axes::new(&StyleConfig::default().grid(true));
        assert_eq!(ax.grid, GridMode::Both { dashed: false });
        assert!(ax.spines.top);
        let mut hidden = axes();
        hidden.axis_off();
        assert!(!hidden.axis_visible && !hidden.spines.left);
    }
}
