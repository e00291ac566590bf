//! Multi-panel figure layouts for clinical photographs and result panels.

use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use log::warn;

use crate::axes::{Axes, Marker};
use crate::error::{Result, VizError};
use crate::figure::{Figure, ImagePanel, Panel};
use crate::style::StyleConfig;

/// Inches per cell of a multi-view grid.
const VIEW_CELL_IN: f64 = 3.5;
const RESULTS_CELL_IN: (f64, f64) = (5.0, 4.0);
/// Height ratio of the image row against the timeline row.
const TIMELINE_RATIO: (f64, f64) = (10.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    Row,
    Column,
    Grid,
}

impl FromStr for GridLayout {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "row" => Ok(GridLayout::Row),
            "column" => Ok(GridLayout::Column),
            "grid" => Ok(GridLayout::Grid),
            other => Err(VizError::UnknownLayout(other.to_string())),
        }
    }
}

impl fmt::Display for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GridLayout::Row => "row",
            GridLayout::Column => "column",
            GridLayout::Grid => "grid",
        })
    }
}

/// `(rows, cols)` for `n` panels; a grid is as square as possible.
pub fn grid_shape(n: usize, layout: GridLayout) -> (usize, usize) {
    match layout {
        GridLayout::Row => (1, n),
        GridLayout::Column => (n, 1),
        GridLayout::Grid => {
            if n == 0 {
                return (0, 0);
            }
            let cols = (n as f64).sqrt().ceil() as usize;
            (n.div_ceil(cols), cols)
        }
    }
}

/// Parse `"RxC"` into `(rows, cols)`.
pub fn parse_results_layout(layout: &str) -> Result<(usize, usize)> {
    let bad = || VizError::UnknownLayout(layout.to_string());
    let (r, c) = layout.split_once('x').ok_or_else(bad)?;
    let rows: usize = r.trim().parse().map_err(|_| bad())?;
    let cols: usize = c.trim().parse().map_err(|_| bad())?;
    if rows == 0 || cols == 0 {
        return Err(bad());
    }
    Ok((rows, cols))
}

/// Side-by-side before/after photographs of identical size.
///
/// The default size is 7" wide with a height of `7 * aspect / 2`.
pub fn create_before_after_figure(
    before: RgbImage,
    after: RgbImage,
    labels: (&str, &str),
    figsize: Option<(f64, f64)>,
    title: Option<&str>,
    style: &StyleConfig,
) -> Result<Figure> {
    if before.dimensions() != after.dimensions() {
        return Err(VizError::ImageSizeMismatch {
            before: before.dimensions(),
            after: after.dimensions(),
        });
    }
    let (w, h) = before.dimensions();
    let figsize = figsize.unwrap_or_else(|| {
        let aspect = h as f64 / w.max(1) as f64;
        (7.0, 7.0 * aspect / 2.0)
    });

    let mut fig = Figure::new(figsize, style);
    fig.push_row(
        vec![
            Panel::Image(ImagePanel::new(before).with_label(labels.0, 12.0)),
            Panel::Image(ImagePanel::new(after).with_label(labels.1, 12.0)),
        ],
        1.0,
    );
    if let Some(t) = title {
        fig.set_suptitle(t);
    }
    Ok(fig)
}

fn label_for(name: &str, labels: &[(String, String)]) -> String {
    labels
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Named views (frontal, lateral, ...) on a row, column or grid, captioned
/// by `labels` or their names. Unused grid cells stay empty.
pub fn create_multi_view_figure(
    images: Vec<(String, RgbImage)>,
    layout: GridLayout,
    labels: &[(String, String)],
    figsize: Option<(f64, f64)>,
    title: Option<&str>,
    style: &StyleConfig,
) -> Figure {
    let (nrows, ncols) = grid_shape(images.len(), layout);
    let figsize =
        figsize.unwrap_or((VIEW_CELL_IN * ncols as f64, VIEW_CELL_IN * nrows as f64));

    let mut fig = Figure::grid(nrows, ncols, figsize, style);
    for (idx, (name, img)) in images.into_iter().enumerate() {
        let caption = label_for(&name, labels);
        fig.set_panel(
            idx / ncols,
            idx % ncols,
            Panel::Image(ImagePanel::new(img).with_label(caption, 11.0)),
        );
    }
    if let Some(t) = title {
        fig.set_suptitle(t);
    }
    fig
}

/// Photographs in time order, optionally over a timeline row with one
/// marker per time point.
pub fn create_time_series_figure(
    images: Vec<(String, RgbImage)>,
    time_labels: &[(String, String)],
    show_timeline: bool,
    figsize: Option<(f64, f64)>,
    title: Option<&str>,
    style: &StyleConfig,
) -> Figure {
    let n = images.len();
    let figsize = figsize.unwrap_or((VIEW_CELL_IN * n as f64, 4.0));
    let mut fig = Figure::new(figsize, style);

    let panels = images
        .into_iter()
        .map(|(name, img)| {
            let caption = label_for(&name, time_labels);
            Panel::Image(ImagePanel::new(img).with_label(caption, 11.0))
        })
        .collect();

    if show_timeline {
        fig.push_row(panels, TIMELINE_RATIO.0);
        fig.push_row(vec![Panel::Chart(Box::new(timeline_axes(n, style)))], TIMELINE_RATIO.1);
    } else {
        fig.push_row(panels, 1.0);
    }
    if let Some(t) = title {
        fig.set_suptitle(t);
    }
    fig
}

fn timeline_axes(n: usize, style: &StyleConfig) -> Axes {
    let mut ax = Axes::new(style);
    ax.plot(&[0.0, 1.0], &[0.5, 0.5])
        .color(crate::style::INK)
        .width(2.0);
    let xs: Vec<f64> = (0..n)
        .map(|i| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 })
        .collect();
    let ys = vec![0.5; n];
    ax.scatter(&xs, &ys)
        .color(crate::style::INK)
        .marker(Marker::Circle)
        .size = 8.0;
    ax.set_xlim(-0.05, 1.05);
    ax.set_ylim(0.0, 1.0);
    ax.axis_off();
    ax
}

/// Lettered result charts on an `"RxC"` grid, row-major; unused cells stay
/// empty and charts beyond the grid are dropped.
pub fn create_results_panel(
    panels: Vec<(String, Axes)>,
    layout: &str,
    figsize: Option<(f64, f64)>,
    title: Option<&str>,
    style: &StyleConfig,
) -> Result<Figure> {
    let (nrows, ncols) = parse_results_layout(layout)?;
    let figsize = figsize.unwrap_or((
        RESULTS_CELL_IN.0 * ncols as f64,
        RESULTS_CELL_IN.1 * nrows as f64,
    ));

    let mut fig = Figure::grid(nrows, ncols, figsize, style);
    let total = panels.len();
    for (idx, (label, mut ax)) in panels.into_iter().enumerate() {
        let row = idx / ncols;
        if row >= nrows {
            warn!(
                "results panel {layout} holds {} charts; dropping {}",
                nrows * ncols,
                total - idx
            );
            break;
        }
        ax.panel_label = Some(label);
        fig.set_panel(row, idx % ncols, Panel::Chart(Box::new(ax)));
    }
    if let Some(t) = title {
        fig.set_suptitle(t);
    }
    Ok(fig)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(w: u32, h: u32) -> RgbImage {
        RgbImage::new(w, h)
    }

    #[test]
    fn shapes() {
        assert_eq!(grid_shape(3, GridLayout::Row), (1, 3));
        assert_eq!(grid_shape(3, GridLayout::Column), (3, 1));
        assert_eq!(grid_shape(5, GridLayout::Grid), (2, 3));
        assert_eq!(grid_shape(4, GridLayout::Grid), (2, 2));
        assert_eq!(grid_shape(1, GridLayout::Grid), (1, 1));
        assert!(matches!("diagonal".parse::<GridLayout>(), Err(VizError::UnknownLayout(_))));
    }

    #[test]
    fn results_layout_parsing() {
        assert_eq!(parse_results_layout("2x3").unwrap(), (2, 3));
        for bad in ["2by2", "x2", "0x1", "axb"] {
            assert!(parse_results_layout(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn before_after_default_size_from_aspect() {
        let fig = create_before_after_figure(
            img(400, 300),
            img(400, 300),
            ("Before", "After"),
            None,
            Some("6-Month Results"),
            &StyleConfig::default(),
        )
        .unwrap();
        assert_eq!(fig.width_in, 7.0);
        assert!((fig.height_in - 2.625).abs() < 1e-12);
        assert_eq!(fig.rows[0].panels.len(), 2);
        assert_eq!(fig.suptitle.as_deref(), Some("6-Month Results"));
    }

    #[test]
    fn before_after_rejects_mismatched_sizes() {
        let err = create_before_after_figure(
            img(400, 300),
            img(300, 400),
            ("Before", "After"),
            None,
            None,
            &StyleConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VizError::ImageSizeMismatch { before: (400, 300), after: (300, 400) }
        ));
    }

    #[test]
    fn multi_view_grid_leaves_unused_cells_empty() {
        let views = ["frontal", "lateral", "oblique"]
            .iter()
            .map(|n| (n.to_string(), img(10, 10)))
            .collect();
        let labels = vec![("lateral".to_string(), "Lateral View".to_string())];
        let fig = create_multi_view_figure(
            views,
            GridLayout::Grid,
            &labels,
            None,
            None,
            &StyleConfig::default(),
        );
        assert_eq!(fig.size(), (7.0, 7.0));
        assert!(matches!(fig.panel(1, 1), Some(Panel::Empty)));
        match fig.panel(0, 1) {
            Some(Panel::Image(p)) => assert_eq!(p.label.as_deref(), Some("Lateral View")),
            other => panic!("unexpected panel {other:?}"),
        }
    }

    #[test]
    fn time_series_adds_timeline_row() {
        let imgs: Vec<(String, RgbImage)> =
            (0..4).map(|i| (format!("t{i}"), img(8, 8))).collect();
        let fig = create_time_series_figure(imgs, &[], true, None, None, &StyleConfig::default());
        assert_eq!(fig.size(), (14.0, 4.0));
        assert_eq!(fig.rows.len(), 2);
        assert_eq!(fig.rows[0].height_ratio, 10.0);
        let timeline = fig.axes(1, 0).unwrap();
        assert!(!timeline.axis_visible);
        assert_eq!(timeline.scatters[0].points[3], (1.0, 0.5));
    }

    #[test]
    fn results_panel_letters_and_overflow() {
        let style = StyleConfig::default();
        let charts: Vec<(String, Axes)> = ["A", "B", "C"]
            .iter()
            .map(|l| (l.to_string(), Axes::new(&style)))
            .collect();
        let fig = create_results_panel(charts, "1x2", None, None, &style).unwrap();
        assert_eq!(fig.size(), (10.0, 4.0));
        assert_eq!(fig.axes(0, 1).unwrap().panel_label.as_deref(), Some("B"));

        let one = vec![("A".to_string(), Axes::new(&style))];
        let fig = create_results_panel(one, "2x2", None, None, &style).unwrap();
        assert!(matches!(fig.panel(1, 1), Some(Panel::Empty)));
        assert!(create_results_panel(Vec::new(), "2-2", None, None, &style).is_err());
    }
}
