//! Read-only snapshots of rendered chart primitives.
//!
//! A [`PlotGeometry`] is derived fresh from an [`Axes`](crate::axes::Axes)
//! every time a heuristic needs it. It goes stale as soon as the axes are
//! mutated, so callers re-derive instead of holding on to one.

/// Closed axis interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Build a range with the bounds in ascending order.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    /// Lower bound clamped at zero, the baseline used for data ranges.
    pub fn floor(&self) -> f64 {
        self.min.max(0.0)
    }
}

impl From<(f64, f64)> for AxisRange {
    fn from((a, b): (f64, f64)) -> Self {
        Self::new(a, b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bar,
    LinePoint,
    ScatterPoint,
}

/// One rendered element reduced to an x position and a y value.
///
/// Bars use their centre and top edge (`bottom + height`), so stacked bars
/// report where they end rather than their own height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub x: f64,
    pub value: f64,
}

impl Primitive {
    pub fn bar(left: f64, width: f64, bottom: f64, height: f64) -> Self {
        Self {
            kind: PrimitiveKind::Bar,
            x: left + width / 2.0,
            value: bottom + height,
        }
    }

    pub fn line_point(x: f64, y: f64) -> Self {
        Self {
            kind: PrimitiveKind::LinePoint,
            x,
            value: y,
        }
    }

    pub fn scatter_point(x: f64, y: f64) -> Self {
        Self {
            kind: PrimitiveKind::ScatterPoint,
            x,
            value: y,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlotGeometry {
    pub primitives: Vec<Primitive>,
    /// Current y-axis range of the axes the snapshot was taken from.
    pub y_range: AxisRange,
}

impl PlotGeometry {
    pub fn new(y_range: AxisRange) -> Self {
        Self {
            primitives: Vec::new(),
            y_range,
        }
    }

    pub fn with_primitives(primitives: Vec<Primitive>, y_range: AxisRange) -> Self {
        Self {
            primitives,
            y_range,
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn has_bars(&self) -> bool {
        self.primitives.iter().any(|p| p.kind == PrimitiveKind::Bar)
    }
}

/// Maximum value of the primitives with x in `range` (all primitives when
/// `None`).
///
/// The search is seeded at 0 and skips non-finite values. When nothing
/// raises it above that seed, the result is `0.8 * y_range.max` so downstream
/// arithmetic always gets a finite value.
pub fn find_max_in_range(geometry: &PlotGeometry, range: Option<AxisRange>) -> f64 {
    let data_max = geometry
        .primitives
        .iter()
        .filter(|p| range.is_none_or(|r| r.contains(p.x)))
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    if data_max == 0.0 {
        geometry.y_range.max * 0.8
    } else {
        data_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(heights: &[f64]) -> PlotGeometry {
        let prims = heights
            .iter()
            .enumerate()
            .map(|(i, h)| Primitive::bar(i as f64 - 0.4, 0.8, 0.0, *h))
            .collect();
        PlotGeometry::with_primitives(prims, AxisRange::new(0.0, 100.0))
    }

    #[test]
    fn bar_value_is_top_edge() {
        let mut g = PlotGeometry::new(AxisRange::new(0.0, 10.0));
        g.push(Primitive::bar(0.0, 1.0, 3.0, 4.0));
        assert_eq!(g.primitives[0].x, 0.5);
        assert_eq!(find_max_in_range(&g, None), 7.0);
    }

    #[test]
    fn range_filters_by_bar_centre() {
        let g = bars(&[10.0, 20.0, 30.0, 25.0]);
        assert_eq!(find_max_in_range(&g, Some(AxisRange::new(1.0, 3.0))), 30.0);
        assert_eq!(find_max_in_range(&g, Some(AxisRange::new(3.0, 3.0))), 25.0);
        assert_eq!(find_max_in_range(&g, None), 30.0);
    }

    #[test]
    fn all_kinds_contribute() {
        let mut g = bars(&[10.0]);
        g.push(Primitive::line_point(0.0, 12.0));
        g.push(Primitive::scatter_point(0.1, 15.0));
        assert_eq!(find_max_in_range(&g, Some(AxisRange::new(-0.5, 0.5))), 15.0);
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let mut g = bars(&[5.0]);
        g.push(Primitive::line_point(0.0, f64::NAN));
        g.push(Primitive::scatter_point(0.0, f64::INFINITY));
        assert_eq!(find_max_in_range(&g, None), 5.0);
    }

    #[test]
    fn empty_range_falls_back_to_axis_fraction() {
        let g = bars(&[10.0, 20.0]);
        let v = find_max_in_range(&g, Some(AxisRange::new(5.0, 6.0)));
        assert!((v - 80.0).abs() < 1e-12);
        let empty = PlotGeometry::new(AxisRange::new(0.0, 1.0));
        assert!((find_max_in_range(&empty, None) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn global_max_equals_max_over_disjoint_cover() {
        let g = bars(&[3.0, 9.0, 4.0, 7.0, 1.0]);
        let parts = [
            AxisRange::new(-1.0, 0.5),
            AxisRange::new(0.6, 2.5),
            AxisRange::new(2.6, 5.0),
        ];
        let best = parts
            .iter()
            .map(|r| find_max_in_range(&g, Some(*r)))
            .fold(f64::MIN, f64::max);
        assert_eq!(best, find_max_in_range(&g, None));
    }

    #[test]
    fn axis_range_orders_bounds() {
        let r = AxisRange::new(5.0, -1.0);
        assert_eq!((r.min, r.max), (-1.0, 5.0));
        assert_eq!(r.floor(), 0.0);
        assert_eq!(AxisRange::new(2.0, 4.0).floor(), 2.0);
    }
}
