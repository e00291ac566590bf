//! Ready-made publication charts: grouped comparison bars and time series.

use log::debug;

use crate::annotate::{AnnotationSpacing, Comparison, add_multiple_comparisons, auto_extend_ylim};
use crate::axes::{Axes, GridMode, Marker};
use crate::error::Result;
use crate::figure::Figure;
use crate::legend::LegendRequest;
use crate::palettes::{ColorCycle, Rgb8, group_color};
use crate::style::{StyleConfig, prs_legend};

pub const DEFAULT_BAR_WIDTH: f64 = 0.35;
pub const DEFAULT_BAR_ALPHA: f64 = 0.8;
pub const DEFAULT_FIGSIZE: (f64, f64) = (10.0, 6.0);

/// Named series of values, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub values: Vec<f64>,
}

impl Group {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Grouped bars centred on category positions `0, 1, 2, ...`.
///
/// Groups are offset symmetrically by `width` around each category. Without
/// explicit `colors`, known group names (Control, Treatment, Before, After)
/// take their comparison colour and the rest the clinical primary. Returns
/// the category positions.
pub fn add_comparison_bars(
    axes: &mut Axes,
    groups: &[Group],
    categories: &[String],
    colors: Option<&[Rgb8]>,
    width: f64,
    alpha: f64,
) -> Vec<f64> {
    let n_groups = groups.len();
    let x: Vec<f64> = (0..categories.len()).map(|i| i as f64).collect();
    let first_offset = -((n_groups as f64 - 1.0) * width / 2.0);

    for (i, group) in groups.iter().enumerate() {
        let color = colors
            .and_then(|c| c.get(i).copied())
            .unwrap_or_else(|| group_color(&group.name));
        let offset = first_offset + i as f64 * width;
        let shifted: Vec<f64> = x.iter().map(|v| v + offset).collect();
        axes.bar(&shifted, &group.values, width)
            .color(color)
            .alpha(alpha)
            .label(group.name.clone());
    }

    axes.set_xticks(&x, categories);
    x
}

/// Inputs of [`create_comparison_plot`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPlot {
    pub groups: Vec<Group>,
    pub categories: Vec<String>,
    pub ylabel: String,
    pub xlabel: Option<String>,
    pub title: Option<String>,
    pub comparisons: Vec<Comparison>,
    pub figsize: (f64, f64),
    pub show_grid: bool,
    pub bar_width: f64,
}

impl ComparisonPlot {
    pub fn new(groups: Vec<Group>, categories: Vec<String>, ylabel: impl Into<String>) -> Self {
        Self {
            groups,
            categories,
            ylabel: ylabel.into(),
            xlabel: None,
            title: None,
            comparisons: Vec::new(),
            figsize: DEFAULT_FIGSIZE,
            show_grid: true,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }
}

/// Grouped comparison bars with labels, a best-placed legend, a dashed
/// y-grid and stacked significance brackets.
pub fn create_comparison_plot(plot: &ComparisonPlot, style: &StyleConfig) -> Result<Figure> {
    let style = StyleConfig {
        cycle: ColorCycle::Comparison,
        show_grid: plot.show_grid,
        ..style.clone()
    };
    let mut ax = Axes::new(&style);

    let x = add_comparison_bars(
        &mut ax,
        &plot.groups,
        &plot.categories,
        None,
        plot.bar_width,
        DEFAULT_BAR_ALPHA,
    );

    ax.set_ylabel(plot.ylabel.clone());
    if let Some(xlabel) = &plot.xlabel {
        ax.set_xlabel(xlabel.clone());
    }
    if let Some(title) = &plot.title {
        ax.set_title(title.clone());
    }

    prs_legend(&mut ax, &LegendRequest::default());
    ax.grid = GridMode::Y { dashed: true };

    if !plot.comparisons.is_empty() {
        auto_extend_ylim(&mut ax, 0.15);
        let plan = add_multiple_comparisons(
            &mut ax,
            &plot.comparisons,
            &x,
            true,
            &AnnotationSpacing::default(),
        )?;
        debug!("comparison plot: {} brackets at {:?}", plan.brackets.len(), plan.ys());
    }

    Ok(Figure::single(ax, plot.figsize))
}

/// One line of a time series, with an optional symmetric confidence
/// half-width per time point.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    pub ci: Option<Vec<f64>>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            ci: None,
        }
    }

    pub fn with_ci(mut self, ci: Vec<f64>) -> Self {
        self.ci = Some(ci);
        self
    }
}

/// Inputs of [`create_time_series_plot`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPlot {
    pub series: Vec<Series>,
    pub time: Vec<f64>,
    pub ylabel: String,
    pub xlabel: String,
    pub title: Option<String>,
    /// Marker per series, cycled; circle, square, triangle, diamond when empty.
    pub markers: Vec<Marker>,
    pub line_width: f64,
    pub marker_size: f64,
    pub figsize: (f64, f64),
}

impl TimeSeriesPlot {
    pub fn new(series: Vec<Series>, time: Vec<f64>, ylabel: impl Into<String>) -> Self {
        Self {
            series,
            time,
            ylabel: ylabel.into(),
            xlabel: "Time".to_string(),
            title: None,
            markers: Vec::new(),
            line_width: 2.5,
            marker_size: 7.0,
            figsize: DEFAULT_FIGSIZE,
        }
    }
}

/// Lines with markers, ±CI bands at 20 % opacity, a legend and a light grid.
pub fn create_time_series_plot(plot: &TimeSeriesPlot, style: &StyleConfig) -> Figure {
    let style = StyleConfig::with_cycle(ColorCycle::Comparison)
        .grid(true)
        .clone_fonts_from(style);
    let mut ax = Axes::new(&style);

    for (i, series) in plot.series.iter().enumerate() {
        let color = group_color(&series.name);
        let marker = if plot.markers.is_empty() {
            Marker::cycle(i)
        } else {
            plot.markers[i % plot.markers.len()]
        };
        ax.plot(&plot.time, &series.values)
            .color(color)
            .width(plot.line_width)
            .marker(marker, plot.marker_size)
            .label(series.name.clone());

        if let Some(ci) = &series.ci {
            let lower: Vec<f64> = series.values.iter().zip(ci).map(|(v, c)| v - c).collect();
            let upper: Vec<f64> = series.values.iter().zip(ci).map(|(v, c)| v + c).collect();
            let n = lower.len().min(plot.time.len());
            ax.fill_between(&plot.time[..n], &lower[..n], &upper[..n], color, 0.2);
        }
    }

    ax.set_xlabel(plot.xlabel.clone());
    ax.set_ylabel(plot.ylabel.clone());
    if let Some(title) = &plot.title {
        ax.set_title(title.clone());
    }
    prs_legend(&mut ax, &LegendRequest::default());
    ax.grid = GridMode::Both { dashed: false };

    Figure::single(ax, plot.figsize)
}

impl StyleConfig {
    /// Keep this style's cycle and grid but take fonts and locale from `other`.
    fn clone_fonts_from(mut self, other: &StyleConfig) -> Self {
        self.font_family = other.font_family.clone();
        self.font_size = other.font_size;
        self.custom_font_paths = other.custom_font_paths.clone();
        self.locale = other.locale.clone();
        self.show_spines = other.show_spines;
        self
    }
}
