//! Legend column heuristics and placement resolution.
//!
//! Everything here is pure: labels and a [`LegendRequest`] go in, a
//! [`LegendPlan`] comes out. Drawing the plan is `viz::legend`'s job.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VizError};

/// Longest label (in characters) that still allows more than one column.
const SINGLE_COLUMN_LEN: usize = 40;
/// Average label length above which labels count as medium.
const MEDIUM_AVG_LEN: f64 = 15.0;
/// Default average length above which labels count as long.
const LONG_AVG_LEN: usize = 25;

/// Number of legend columns for `labels`, at most `max_cols` for short labels.
///
/// | condition (first match wins) | columns |
/// |---|---|
/// | no labels | 1 |
/// | longest > 40 chars | 1 |
/// | average > 25 | `min(2, n)` |
/// | average > 15 | `min(3, max(2, n / 2))` |
/// | n ≤ 4 | `min(max_cols, n)` |
/// | otherwise | `min(max_cols, ceil(sqrt(n)))` |
pub fn optimal_columns<S: AsRef<str>>(labels: &[S], max_cols: usize) -> usize {
    optimal_columns_with_cutoff(labels, max_cols, LONG_AVG_LEN)
}

/// [`optimal_columns`] with the long-label average threshold replaced by
/// `long_cutoff`.
pub fn optimal_columns_with_cutoff<S: AsRef<str>>(
    labels: &[S],
    max_cols: usize,
    long_cutoff: usize,
) -> usize {
    let n = labels.len();
    if n == 0 {
        return 1;
    }
    let lens: Vec<usize> = labels.iter().map(|l| l.as_ref().chars().count()).collect();
    let max_len = lens.iter().copied().max().unwrap_or(0);
    let avg = lens.iter().sum::<usize>() as f64 / n as f64;

    if max_len > SINGLE_COLUMN_LEN {
        1
    } else if avg > long_cutoff as f64 {
        2.min(n)
    } else if avg > MEDIUM_AVG_LEN {
        3.min(2.max(n / 2))
    } else if n <= 4 {
        max_cols.min(n)
    } else {
        max_cols.min((n as f64).sqrt().ceil() as usize)
    }
}

/// Legend box locations, named like their matplotlib counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Best,
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    Right,
    CenterLeft,
    CenterRight,
    LowerCenter,
    UpperCenter,
    Center,
}

impl Location {
    /// Candidate order tried by automatic placement; ties keep the earlier one.
    pub const CANDIDATES: [Location; 10] = [
        Location::UpperRight,
        Location::UpperLeft,
        Location::LowerLeft,
        Location::LowerRight,
        Location::Right,
        Location::CenterLeft,
        Location::CenterRight,
        Location::LowerCenter,
        Location::UpperCenter,
        Location::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Best => "best",
            Location::UpperRight => "upper right",
            Location::UpperLeft => "upper left",
            Location::LowerLeft => "lower left",
            Location::LowerRight => "lower right",
            Location::Right => "right",
            Location::CenterLeft => "center left",
            Location::CenterRight => "center right",
            Location::LowerCenter => "lower center",
            Location::UpperCenter => "upper center",
            Location::Center => "center",
        }
    }

    /// Fraction (0 = left/bottom, 1 = right/top) of the legend box that sits
    /// on the anchor point, per axis.
    pub fn box_fraction(self) -> (f64, f64) {
        match self {
            Location::UpperRight => (1.0, 1.0),
            Location::UpperLeft => (0.0, 1.0),
            Location::LowerLeft => (0.0, 0.0),
            Location::LowerRight => (1.0, 0.0),
            Location::Right | Location::CenterRight => (1.0, 0.5),
            Location::CenterLeft => (0.0, 0.5),
            Location::LowerCenter => (0.5, 0.0),
            Location::UpperCenter => (0.5, 1.0),
            Location::Center | Location::Best => (0.5, 0.5),
        }
    }

    /// Lower-left corner, in axes fractions, of a `w` x `h` box placed at
    /// this location inside the axes with `pad` clearance.
    pub fn inner_origin(self, w: f64, h: f64, pad: f64) -> (f64, f64) {
        let (fx, fy) = self.box_fraction();
        let ax = pad + fx * (1.0 - 2.0 * pad);
        let ay = pad + fy * (1.0 - 2.0 * pad);
        (ax - fx * w, ay - fy * h)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        Location::CANDIDATES
            .iter()
            .copied()
            .chain(std::iter::once(Location::Best))
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| VizError::UnknownPosition(s.to_string()))
    }
}

/// Requested legend position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    /// Centred band above the plot.
    Top,
    /// Same placement as [`LegendPosition::Top`].
    TopSmart,
    /// Right of the plot, vertically centred.
    Outside,
    /// Inside the plot where it covers the least data.
    Best,
    Explicit(Location),
}

impl LegendPosition {
    /// Label-length cutoff and column cap used when deriving columns.
    pub fn column_rule(self) -> (usize, usize) {
        match self {
            LegendPosition::Top | LegendPosition::TopSmart => (20, 4),
            LegendPosition::Outside => (30, 2),
            _ => (25, 3),
        }
    }
}

impl FromStr for LegendPosition {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "top" => Ok(LegendPosition::Top),
            "top-smart" => Ok(LegendPosition::TopSmart),
            "outside" => Ok(LegendPosition::Outside),
            "best" => Ok(LegendPosition::Best),
            other => other.parse().map(LegendPosition::Explicit),
        }
    }
}

impl fmt::Display for LegendPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegendPosition::Top => f.write_str("top"),
            LegendPosition::TopSmart => f.write_str("top-smart"),
            LegendPosition::Outside => f.write_str("outside"),
            LegendPosition::Best => f.write_str("best"),
            LegendPosition::Explicit(loc) => write!(f, "{loc}"),
        }
    }
}

/// Recognised legend options.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendRequest {
    pub position: LegendPosition,
    /// Fixed column count; derived from the labels when `None`.
    pub ncol: Option<usize>,
    /// Label font size in points; the theme's legend size when `None`.
    pub font_size: Option<f64>,
    /// Tighter spacing.
    pub compact: bool,
    pub title: Option<String>,
}

impl Default for LegendRequest {
    fn default() -> Self {
        Self {
            position: LegendPosition::Best,
            ncol: None,
            font_size: None,
            compact: false,
            title: None,
        }
    }
}

impl LegendRequest {
    pub fn at(position: LegendPosition) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Spacing, in multiples of the legend font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendSpacing {
    pub column_spacing: f64,
    pub label_spacing: f64,
    pub handle_text_pad: f64,
    pub border_pad: f64,
}

impl LegendSpacing {
    pub const NORMAL: LegendSpacing = LegendSpacing {
        column_spacing: 2.0,
        label_spacing: 0.5,
        handle_text_pad: 0.8,
        border_pad: 0.5,
    };

    pub const COMPACT: LegendSpacing = LegendSpacing {
        column_spacing: 1.0,
        label_spacing: 0.3,
        handle_text_pad: 0.5,
        border_pad: 0.3,
    };
}

/// Handle sizes, in multiples of the legend font size (`marker_scale` is a
/// plain factor on marker sizes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleSizing {
    pub marker_scale: f64,
    pub handle_length: f64,
    pub handle_height: f64,
}

impl HandleSizing {
    pub const STANDARD: HandleSizing = HandleSizing {
        marker_scale: 1.0,
        handle_length: 2.0,
        handle_height: 0.7,
    };

    /// Colour swatches big enough to read against solid bars.
    pub const BAR: HandleSizing = HandleSizing {
        marker_scale: 4.0,
        handle_length: 2.0,
        handle_height: 1.4,
    };
}

/// Fully resolved legend placement.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendPlan {
    /// Which point of the legend box is placed (or `Best`).
    pub location: Location,
    /// Anchor point in axes fractions; `None` places the box inside the axes.
    pub anchor: Option<(f64, f64)>,
    pub ncol: usize,
    pub frame: bool,
    pub font_size: Option<f64>,
    pub title: Option<String>,
    pub spacing: LegendSpacing,
    pub handles: HandleSizing,
}

/// x-anchor of a top legend; wider legends are shifted so they stay centred
/// over the data rather than the figure.
pub fn top_anchor_x(ncol: usize) -> f64 {
    match ncol {
        0 | 1 => 0.5,
        2 => 0.35,
        3 => 0.4,
        _ => 0.45,
    }
}

const TOP_ANCHOR_Y: f64 = 1.12;
const OUTSIDE_ANCHOR: (f64, f64) = (1.02, 0.5);

pub fn resolve_legend<S: AsRef<str>>(
    request: &LegendRequest,
    labels: &[S],
    is_bar_chart: bool,
) -> LegendPlan {
    let ncol = request.ncol.unwrap_or_else(|| {
        let (cutoff, max_cols) = request.position.column_rule();
        optimal_columns_with_cutoff(labels, max_cols, cutoff)
    });

    let spacing = if request.compact {
        LegendSpacing::COMPACT
    } else {
        LegendSpacing::NORMAL
    };

    let (location, anchor, frame, spacing) = match request.position {
        LegendPosition::Outside => (Location::CenterLeft, Some(OUTSIDE_ANCHOR), true, spacing),
        LegendPosition::Top | LegendPosition::TopSmart => (
            Location::UpperCenter,
            Some((top_anchor_x(ncol), TOP_ANCHOR_Y)),
            false,
            LegendSpacing::COMPACT,
        ),
        LegendPosition::Best => (Location::Best, None, true, spacing),
        LegendPosition::Explicit(loc) => (loc, None, true, spacing),
    };

    LegendPlan {
        location,
        anchor,
        ncol,
        frame,
        font_size: request.font_size,
        title: request.title.clone(),
        spacing,
        handles: if is_bar_chart {
            HandleSizing::BAR
        } else {
            HandleSizing::STANDARD
        },
    }
}

/// Pick the inside location whose `w` x `h` box (axes fractions) covers the
/// fewest `points` (axes fractions); ties go to the earlier candidate.
pub fn best_location(points: &[(f64, f64)], w: f64, h: f64, pad: f64) -> Location {
    let mut best = Location::UpperRight;
    let mut best_count = usize::MAX;
    for loc in Location::CANDIDATES {
        let (x0, y0) = loc.inner_origin(w, h, pad);
        let count = points
            .iter()
            .filter(|(x, y)| *x >= x0 && *x <= x0 + w && *y >= y0 && *y <= y0 + h)
            .count();
        if count < best_count {
            best = loc;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_labels_get_two_columns() {
        let labels = [
            "Non-syndromic: No",
            "Non-syndromic: Yes",
            "Syndromic: No",
            "Syndromic: Yes",
        ];
        assert_eq!(optimal_columns(&labels, 4), 2);
    }

    #[test]
    fn very_long_label_forces_single_column() {
        let labels = ["Very long label describing something in detail"];
        assert_eq!(optimal_columns(&labels, 4), 1);
        let mixed = vec!["a".to_string(), "b".to_string(), "x".repeat(41)];
        assert_eq!(optimal_columns(&mixed, 4), 1);
    }

    #[test]
    fn short_labels_follow_count() {
        assert_eq!(optimal_columns(&["A", "B", "C"], 4), 3);
        assert_eq!(optimal_columns(&["A", "B", "C", "D"], 4), 4);
        assert_eq!(optimal_columns(&["A", "B", "C", "D"], 3), 3);
        let nine: Vec<String> = (0..9).map(|i| format!("S{i}")).collect();
        assert_eq!(optimal_columns(&nine, 4), 3);
        let seventeen: Vec<String> = (0..17).map(|i| format!("S{i}")).collect();
        assert_eq!(optimal_columns(&seventeen, 4), 4);
    }

    #[test]
    fn long_average_caps_at_two() {
        let one = ["abcdefghijklmnopqrstuvwxyz0"];
        assert_eq!(optimal_columns(&one, 4), 1);
        let three = [one[0], one[0], one[0]];
        assert_eq!(optimal_columns(&three, 4), 2);
    }

    #[test]
    fn empty_labels_one_column() {
        let none: [&str; 0] = [];
        assert_eq!(optimal_columns(&none, 4), 1);
    }

    #[test]
    fn length_is_counted_in_characters() {
        // 16 chars but 32 bytes each: medium, not long
        let labels = ["äöüäöüäöüäöüäöüä"; 6];
        assert_eq!(optimal_columns(&labels, 4), 3);
        let short = ["ääää", "öööö"];
        assert_eq!(optimal_columns(&short, 4), 2);
    }

    #[test]
    fn cutoff_changes_long_threshold() {
        // average 22: medium for the default cutoff, long for cutoff 20
        let labels = ["abcdefghijklmnopqrstuv"; 6];
        assert_eq!(optimal_columns_with_cutoff(&labels, 4, 25), 3);
        assert_eq!(optimal_columns_with_cutoff(&labels, 4, 20), 2);
    }

    #[test]
    fn position_parsing() {
        assert_eq!("top".parse::<LegendPosition>().unwrap(), LegendPosition::Top);
        assert_eq!(
            "upper left".parse::<LegendPosition>().unwrap(),
            LegendPosition::Explicit(Location::UpperLeft)
        );
        assert!(matches!(
            "somewhere".parse::<LegendPosition>(),
            Err(VizError::UnknownPosition(_))
        ));
    }

    #[test]
    fn outside_plan_is_framed_center_left() {
        let plan = resolve_legend(
            &LegendRequest::at(LegendPosition::Outside),
            &["A", "B", "C"],
            false,
        );
        assert_eq!(plan.location, Location::CenterLeft);
        assert_eq!(plan.anchor, Some((1.02, 0.5)));
        assert!(plan.frame);
        assert_eq!(plan.ncol, 2);
        assert_eq!(plan.handles, HandleSizing::STANDARD);
    }

    #[test]
    fn top_plan_anchor_depends_on_columns() {
        let labels = ["Control", "Treatment"];
        let plan = resolve_legend(&LegendRequest::at(LegendPosition::Top), &labels, true);
        assert_eq!(plan.location, Location::UpperCenter);
        assert_eq!(plan.ncol, 2);
        assert_eq!(plan.anchor, Some((0.35, 1.12)));
        assert!(!plan.frame);
        assert_eq!(plan.spacing, LegendSpacing::COMPACT);
        assert_eq!(plan.handles, HandleSizing::BAR);

        let four = ["A", "B", "C", "D"];
        let plan = resolve_legend(&LegendRequest::at(LegendPosition::TopSmart), &four, false);
        assert_eq!(plan.anchor, Some((0.45, 1.12)));
        let mut req = LegendRequest::at(LegendPosition::Top);
        req.ncol = Some(1);
        assert_eq!(resolve_legend(&req, &four, false).anchor, Some((0.5, 1.12)));
        req.ncol = Some(3);
        assert_eq!(resolve_legend(&req, &four, false).anchor, Some((0.4, 1.12)));
    }

    #[test]
    fn best_and_explicit_plans_are_framed_and_inside() {
        let best = resolve_legend(&LegendRequest::default(), &["A"], false);
        assert_eq!(best.location, Location::Best);
        assert!(best.frame && best.anchor.is_none());
        let explicit = resolve_legend(
            &LegendRequest::at(LegendPosition::Explicit(Location::LowerRight)),
            &["A"],
            false,
        );
        assert_eq!(explicit.location, Location::LowerRight);
        assert!(explicit.frame);
    }

    #[test]
    fn explicit_ncol_overrides_heuristic() {
        let mut req = LegendRequest::default();
        req.ncol = Some(5);
        req.title = Some("Groups".into());
        let plan = resolve_legend(&req, &["A", "B"], false);
        assert_eq!(plan.ncol, 5);
        assert_eq!(plan.title.as_deref(), Some("Groups"));
    }

    #[test]
    fn best_location_avoids_points() {
        // data crowded in the upper half
        let pts: Vec<(f64, f64)> = (0..20).map(|i| (i as f64 / 19.0, 0.9)).collect();
        assert_eq!(best_location(&pts, 0.3, 0.2, 0.02), Location::LowerLeft);
        assert_eq!(best_location(&[], 0.3, 0.2, 0.02), Location::UpperRight);
    }

    #[test]
    fn inner_origin_respects_padding() {
        let (x, y) = Location::UpperRight.inner_origin(0.2, 0.1, 0.02);
        assert!((x - 0.78).abs() < 1e-12 && (y - 0.88).abs() < 1e-12);
        let (x, y) = Location::Center.inner_origin(0.2, 0.1, 0.02);
        assert!((x - 0.4).abs() < 1e-12 && (y - 0.45).abs() < 1e-12);
    }
}
