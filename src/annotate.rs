//! Statistical annotation layout: headroom planning, bracket stacking and
//! significance labels.
//!
//! Offsets are fractions of the *data* range (tallest value minus the
//! non-negative axis floor), never of the current axis span, so extending
//! the axis for one annotation does not inflate the next extension.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::axes::{Axes, TextAnchor};
use crate::error::{Result, VizError};
use crate::geometry::{AxisRange, PlotGeometry, find_max_in_range};
use crate::style::INK;

/// Bracket tip length as a fraction of the y-axis span.
const TIP_PCT: f64 = 0.02;
/// Gap between a bracket and its label as a fraction of the y-axis span.
const LABEL_GAP_PCT: f64 = 0.01;

/// Fractions of the data range used to stack annotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSpacing {
    /// Clearance between the data and the lowest bracket.
    pub base_pct: f64,
    /// Distance between stacked brackets.
    pub stack_pct: f64,
    /// Room for the label above the top bracket.
    pub text_pct: f64,
}

impl Default for AnnotationSpacing {
    fn default() -> Self {
        Self {
            base_pct: 0.05,
            stack_pct: 0.08,
            text_pct: 0.02,
        }
    }
}

/// Two compared x positions and the test's p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonSpan {
    pub start: f64,
    pub end: f64,
    pub p_value: f64,
}

impl ComparisonSpan {
    pub fn new(start: f64, end: f64, p_value: f64) -> Self {
        Self {
            start,
            end,
            p_value,
        }
    }

    pub fn width(&self) -> f64 {
        (self.end - self.start).abs()
    }

    pub fn range(&self) -> AxisRange {
        AxisRange::new(self.start, self.end)
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Comparison between two entries of a caller-owned position array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub left: usize,
    pub right: usize,
    pub p_value: f64,
}

impl Comparison {
    pub fn new(left: usize, right: usize, p_value: f64) -> Self {
        Self {
            left,
            right,
            p_value,
        }
    }

    /// Span over `positions`; indices outside it are an error.
    pub fn span(&self, positions: &[f64]) -> Result<ComparisonSpan> {
        let at = |index: usize| {
            positions
                .get(index)
                .copied()
                .ok_or(VizError::ComparisonIndex {
                    index,
                    len: positions.len(),
                })
        };
        Ok(ComparisonSpan::new(at(self.left)?, at(self.right)?, self.p_value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBracket {
    pub span: ComparisonSpan,
    pub y: f64,
    /// Stack level, 0 = lowest.
    pub level: usize,
}

/// Brackets in the caller's input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BracketPlan {
    pub brackets: Vec<PlacedBracket>,
}

impl BracketPlan {
    pub fn ys(&self) -> Vec<f64> {
        self.brackets.iter().map(|b| b.y).collect()
    }

    pub fn levels(&self) -> Vec<usize> {
        self.brackets.iter().map(|b| b.level).collect()
    }
}

/// Axis limits leaving room for `n_comparisons` stacked brackets:
/// `(floor, data_max + (base + (n - 1) * stack + text) * data_range)`.
///
/// When all values sit on the floor the data range is zero and so is the
/// headroom.
pub fn plan_ylim(
    geometry: &PlotGeometry,
    n_comparisons: usize,
    spacing: &AnnotationSpacing,
) -> (f64, f64) {
    let data_max = find_max_in_range(geometry, None);
    let data_min = geometry.y_range.floor();
    let data_range = data_max - data_min;

    let factor =
        spacing.base_pct + (n_comparisons as f64 - 1.0) * spacing.stack_pct + spacing.text_pct;
    let total_headroom = factor * data_range;

    debug!(
        "plan_ylim: data_max={data_max} data_min={data_min} n={n_comparisons} headroom={total_headroom}"
    );
    (data_min, data_max + total_headroom)
}

/// Bracket y positions in input order; see [`plan_brackets`].
pub fn position_brackets(
    geometry: &PlotGeometry,
    spans: &[ComparisonSpan],
    spacing: &AnnotationSpacing,
) -> Vec<f64> {
    plan_brackets(geometry, spans, spacing).ys()
}

/// Stack brackets so wider spans sit above narrower ones.
///
/// Spans are ranked by width, widest first (stable for equal widths); the
/// widest gets the top level. Each bracket sits at
/// `local_max + base * R + level * stack * R`, where `local_max` is the
/// tallest value inside the span and `R` the overall data range.
pub fn plan_brackets(
    geometry: &PlotGeometry,
    spans: &[ComparisonSpan],
    spacing: &AnnotationSpacing,
) -> BracketPlan {
    let overall_max = find_max_in_range(geometry, None);
    let data_range = overall_max - geometry.y_range.floor();

    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by(|&a, &b| spans[b].width().total_cmp(&spans[a].width()));

    let top = spans.len().saturating_sub(1);
    let mut placed: Vec<Option<PlacedBracket>> = vec![None; spans.len()];
    for (rank, &idx) in order.iter().enumerate() {
        let span = spans[idx];
        let level = top - rank;
        let local_max = find_max_in_range(geometry, Some(span.range()));
        let y = local_max
            + spacing.base_pct * data_range
            + level as f64 * spacing.stack_pct * data_range;
        placed[idx] = Some(PlacedBracket { span, y, level });
    }

    let brackets: Vec<PlacedBracket> = placed.into_iter().flatten().collect();
    debug!("bracket levels: {:?}", brackets.iter().map(|b| b.level).collect::<Vec<_>>());
    BracketPlan { brackets }
}

impl Axes {
    /// Apply [`plan_ylim`] to these axes and return the new limits.
    pub fn plan_ylim_for_annotations(
        &mut self,
        n_comparisons: usize,
        spacing: &AnnotationSpacing,
    ) -> (f64, f64) {
        let (lo, hi) = plan_ylim(&self.geometry(), n_comparisons, spacing);
        self.set_ylim(lo, hi);
        (lo, hi)
    }
}

/// `***` below 0.001, `**` below 0.01, `*` below 0.05, else `ns`.
pub fn significance_symbol(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        "ns"
    }
}

/// `p < 0.001` for tiny values, `p = 0.025` otherwise.
pub fn format_p_value(p_value: f64) -> String {
    if p_value < 0.001 {
        "p < 0.001".to_string()
    } else {
        format!("p = {p_value:.3}")
    }
}

/// Grow the top of the y-axis by `extension_pct` of its span; a
/// non-negative bottom snaps to 0.
pub fn auto_extend_ylim(axes: &mut Axes, extension_pct: f64) -> (f64, f64) {
    let y = axes.get_ylim();
    let new_max = y.max + y.span() * extension_pct;
    let new_min = if y.min >= 0.0 { 0.0 } else { y.min };
    axes.set_ylim(new_min, new_max);
    (new_min, new_max)
}

/// Older multiplicative rule: 12 % headroom for one comparison plus 6 % for
/// each additional one. `data_max` defaults to the tallest bar height.
pub fn calculate_optimal_ylim(
    axes: &Axes,
    data_max: Option<f64>,
    n_comparisons: usize,
) -> (f64, f64) {
    let data_max = data_max.unwrap_or_else(|| {
        axes.bar_series
            .iter()
            .flat_map(|s| s.bars.iter().map(|b| b.height))
            .filter(|h| h.is_finite())
            .fold(0.0, f64::max)
    });
    let extension = 0.12 + (n_comparisons as f64 - 1.0) * 0.06;
    let ymin = if data_max >= 0.0 { 0.0 } else { data_max * 1.1 };
    (ymin, data_max * (1.0 + extension))
}

/// Bracket geometry for one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketPosition {
    pub x: f64,
    pub y: f64,
    pub x_start: f64,
    pub x_end: f64,
}

/// Place a bracket `offset_pct` of the axis span above the tallest bar
/// between `positions[indices.0]` and `positions[indices.1]`.
pub fn calculate_bracket_position(
    axes: &Axes,
    positions: &[f64],
    indices: (usize, usize),
    offset_pct: f64,
) -> Result<BracketPosition> {
    let span = Comparison::new(indices.0, indices.1, 1.0).span(positions)?;
    let y = axes.get_ylim();
    let range = span.range();

    let data_max = axes
        .bar_series
        .iter()
        .flat_map(|s| s.bars.iter())
        .filter(|b| range.contains(b.left + b.width / 2.0) && b.height.is_finite())
        .map(|b| b.height)
        .fold(y.min, f64::max);

    Ok(BracketPosition {
        x: span.center(),
        y: data_max + y.span() * offset_pct,
        x_start: span.start,
        x_end: span.end,
    })
}

/// A significance label, optionally drawn over a bracket.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceIndicator {
    pub x: f64,
    pub y: f64,
    pub p_value: Option<f64>,
    /// Overrides the generated label.
    pub text: Option<String>,
    /// Show `***`-style symbols instead of the formatted p-value.
    pub symbol: bool,
    /// `(x_start, x_end)` of the bracket; bare text when `None`.
    pub bracket: Option<(f64, f64)>,
    pub font_size: Option<f64>,
    pub line_width: f64,
}

impl SignificanceIndicator {
    pub fn bracket(span: &ComparisonSpan, y: f64) -> Self {
        Self {
            x: span.center(),
            y,
            p_value: Some(span.p_value),
            text: None,
            symbol: false,
            bracket: Some((span.start, span.end)),
            font_size: None,
            line_width: 1.0,
        }
    }

    pub fn label(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        match self.p_value {
            Some(p) if self.symbol => significance_symbol(p).to_string(),
            Some(p) => format_p_value(p),
            None => String::new(),
        }
    }
}

/// Draw `indicator` onto `axes`: a bracket with downward tips when a span is
/// given, and the label centred above.
pub fn add_significance_indicator(axes: &mut Axes, indicator: &SignificanceIndicator) {
    let span = axes.get_ylim().span();
    let y = indicator.y;
    let mut label_y = y;

    if let Some((x0, x1)) = indicator.bracket {
        let tip = span * TIP_PCT;
        let w = indicator.line_width;
        axes.segment((x0, y - tip), (x0, y), w);
        axes.segment((x0, y), (x1, y), w);
        axes.segment((x1, y), (x1, y - tip), w);
        label_y = y + span * LABEL_GAP_PCT;
    }

    let size = indicator.font_size.unwrap_or(axes.style.font_size);
    let note = axes.text(indicator.x, label_y, indicator.label(), TextAnchor::BottomCenter);
    note.font_size = size;
    note.color = INK;
}

/// Plan limits (optionally), stack brackets for `comparisons` over
/// `x_positions` and draw them. Returns the plan in input order.
pub fn add_multiple_comparisons(
    axes: &mut Axes,
    comparisons: &[Comparison],
    x_positions: &[f64],
    auto_ylim: bool,
    spacing: &AnnotationSpacing,
) -> Result<BracketPlan> {
    let spans = comparisons
        .iter()
        .map(|c| c.span(x_positions))
        .collect::<Result<Vec<_>>>()?;

    if auto_ylim {
        axes.plan_ylim_for_annotations(comparisons.len(), spacing);
    }

    let plan = plan_brackets(&axes.geometry(), &spans, spacing);
    for placed in &plan.brackets {
        add_significance_indicator(axes, &SignificanceIndicator::bracket(&placed.span, placed.y));
    }
    Ok(plan)
}
