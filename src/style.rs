//! Publication styling: explicit style configuration and axes formatters.
//!
//! A [`StyleConfig`] is passed to every chart builder instead of mutating a
//! process-wide configuration, so two figures styled differently can be built
//! side by side (or from different threads) without interfering.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::axes::{Axes, GridMode, Segment, TextAnchor, TextNote};
use crate::error::Result;
use crate::legend::{LegendRequest, resolve_legend};
use crate::palettes::{COMPARISON, CLINICAL_DATA, ColorCycle, Rgb8};

/// Default text, tick and axis edge colour.
pub const INK: Rgb8 = Rgb8::from_u32(0x333333);
/// Grid and legend frame colour.
pub const HAIRLINE: Rgb8 = Rgb8::from_u32(0xCCCCCC);
pub const WHITE: Rgb8 = Rgb8::from_u32(0xFFFFFF);

/// User-facing style options. Every field has a default, so a JSON file only
/// needs to list what it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub cycle: ColorCycle,
    /// Font family or fallback chain; the first registered entry wins.
    pub font_family: Vec<String>,
    /// Base font size in points.
    pub font_size: f64,
    pub show_grid: bool,
    pub show_spines: bool,
    /// Extra TrueType files registered before rendering.
    pub custom_font_paths: Vec<PathBuf>,
    /// Tick label locale tag (`en`, `de`, `fr`, ...).
    pub locale: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            cycle: ColorCycle::Default,
            font_family: vec!["DejaVu Sans".to_string()],
            font_size: 10.0,
            show_grid: false,
            show_spines: true,
            custom_font_paths: Vec::new(),
            locale: "en".to_string(),
        }
    }
}

impl StyleConfig {
    /// Style with the named cycle (`default`, `clinical`, `comparison`).
    pub fn prs(cycle: &str) -> Result<Self> {
        Ok(Self::with_cycle(cycle.parse()?))
    }

    pub fn with_cycle(cycle: ColorCycle) -> Self {
        Self {
            cycle,
            ..Self::default()
        }
    }

    pub fn grid(mut self, show: bool) -> Self {
        self.show_grid = show;
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let style = Self::from_json_str(&text)?;
        debug!("loaded style from {}: {:?}", path.display(), style);
        Ok(style)
    }

    pub fn theme(&self) -> Theme {
        Theme::from_config(self)
    }
}

/// Concrete drawing values derived from a [`StyleConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub text_color: Rgb8,
    pub edge_color: Rgb8,
    pub axis_line_width: f64,
    pub grid_color: Rgb8,
    pub grid_alpha: f64,
    pub grid_line_width: f64,
    pub font_size: f64,
    pub label_size: f64,
    pub title_size: f64,
    pub title_bold: bool,
    pub title_pad: f64,
    pub tick_size: f64,
    pub legend_font_size: f64,
    pub legend_title_size: f64,
    pub legend_edge_color: Rgb8,
    pub legend_border_pad: f64,
    pub legend_label_spacing: f64,
    pub line_width: f64,
    pub marker_size: f64,
    pub patch_line_width: f64,
    pub screen_dpi: u32,
    pub save_dpi: u32,
    pub save_pad_inches: f64,
}

impl Theme {
    fn from_config(cfg: &StyleConfig) -> Self {
        let fs = cfg.font_size;
        Self {
            text_color: INK,
            edge_color: INK,
            axis_line_width: 1.0,
            grid_color: HAIRLINE,
            grid_alpha: 0.3,
            grid_line_width: 0.5,
            font_size: fs,
            label_size: fs,
            title_size: fs + 2.0,
            title_bold: true,
            title_pad: 10.0,
            tick_size: fs - 1.0,
            legend_font_size: fs - 1.0,
            legend_title_size: fs,
            legend_edge_color: HAIRLINE,
            legend_border_pad: 0.5,
            legend_label_spacing: 0.5,
            line_width: 1.5,
            marker_size: 6.0,
            patch_line_width: 0.5,
            screen_dpi: 100,
            save_dpi: 300,
            save_pad_inches: 0.1,
        }
    }
}

/// Dashed y-grid behind the data and no top/right spines.
pub fn format_statistical_plot(axes: &mut Axes) {
    axes.grid = GridMode::Y { dashed: true };
    axes.spines.top = false;
    axes.spines.right = false;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonKind {
    BeforeAfter,
    ControlTreatment,
}

/// Recolour the first lines of `axes` with comparison colours.
pub fn format_comparison_plot(axes: &mut Axes, kind: ComparisonKind) {
    let colors = match kind {
        ComparisonKind::BeforeAfter => COMPARISON.colors()[..2].to_vec(),
        ComparisonKind::ControlTreatment => CLINICAL_DATA.colors()[..2].to_vec(),
    };
    for (line, color) in axes.lines.iter_mut().zip(colors) {
        line.color = color;
    }
}

/// Corner of the axes a scale bar is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleBarLocation {
    pub right: bool,
    pub lower: bool,
}

impl ScaleBarLocation {
    /// `"lower right"`, `"upper left"`, ...; anything without `right` is left,
    /// anything without `lower` is upper.
    pub fn parse(location: &str) -> Self {
        Self {
            right: location.contains("right"),
            lower: location.contains("lower"),
        }
    }
}

impl Default for ScaleBarLocation {
    fn default() -> Self {
        Self::parse("lower right")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBarOptions {
    pub location: ScaleBarLocation,
    /// Bar height in data units; 1 % of the y-range when `None`.
    pub height: Option<f64>,
    pub color: Rgb8,
    pub line_width: f64,
    pub label_color: Option<Rgb8>,
    pub label_size: f64,
}

impl Default for ScaleBarOptions {
    fn default() -> Self {
        Self {
            location: ScaleBarLocation::default(),
            height: None,
            color: WHITE,
            line_width: 2.0,
            label_color: None,
            label_size: 8.0,
        }
    }
}

/// Add a scale bar of `length` data units, 5 % in from the chosen corner,
/// with `label` centred above it.
pub fn add_scale_bar(axes: &mut Axes, length: f64, label: &str, opts: &ScaleBarOptions) {
    let x = axes.get_xlim();
    let y = axes.get_ylim();
    let margin = 0.05;

    let x_pos = if opts.location.right {
        x.max - x.span() * margin - length
    } else {
        x.min + x.span() * margin
    };
    let y_pos = if opts.location.lower {
        y.min + y.span() * margin
    } else {
        y.max - y.span() * margin
    };
    let bar_height = opts.height.unwrap_or(y.span() * 0.01);

    axes.segments.push(Segment {
        from: (x_pos, y_pos),
        to: (x_pos + length, y_pos),
        color: opts.color,
        width: opts.line_width,
    });
    axes.texts.push(TextNote {
        x: x_pos + length / 2.0,
        y: y_pos + bar_height * 2.0,
        text: label.to_string(),
        font_size: opts.label_size,
        color: opts.label_color.unwrap_or(opts.color),
        anchor: TextAnchor::BottomCenter,
        bold: true,
    });
}

/// Resolve a legend for `axes` from its labelled series and install it.
pub fn prs_legend(axes: &mut Axes, request: &LegendRequest) {
    let labels = axes.legend_labels();
    let plan = resolve_legend(request, &labels, axes.is_bar_chart());
    debug!(
        "legend for {} labels: {:?} ncol={} anchor={:?}",
        labels.len(),
        plan.location,
        plan.ncol,
        plan.anchor
    );
    axes.legend = Some(plan);
}
