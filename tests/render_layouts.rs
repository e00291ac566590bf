use image::{Rgb, RgbImage};
use prs_viz::axes::Axes;
use prs_viz::charts::{Series, TimeSeriesPlot, create_time_series_plot};
use prs_viz::layout::{
    GridLayout, create_before_after_figure, create_multi_view_figure, create_results_panel,
    create_time_series_figure,
};
use prs_viz::legend::LegendPosition;
use prs_viz::style::prs_legend;
use prs_viz::viz::{fonts_available, render_rgb, render_svg_string};
use prs_viz::figure::ImagePanel;
use prs_viz::{Figure, LegendRequest, Panel, StyleConfig, VizError};

fn photo(color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(60, 40, Rgb(color))
}

fn chart(label: &str) -> Axes {
    let mut ax = Axes::new(&StyleConfig::default());
    ax.plot(&[0.0, 1.0, 2.0], &[1.0, 3.0, 2.0]).label(label);
    ax.set_title(format!("Outcome {label}"));
    ax
}

#[test]
fn results_panel_letters_and_drops_overflow() {
    let charts = ["A", "B", "C"]
        .iter()
        .map(|l| (l.to_string(), chart(l)))
        .collect();
    let fig = create_results_panel(charts, "1x2", None, Some("Outcomes"), &StyleConfig::default())
        .unwrap();
    assert_eq!(fig.size(), (10.0, 4.0));
    assert_eq!(fig.axes(0, 0).unwrap().panel_label.as_deref(), Some("A"));
    assert_eq!(fig.axes(0, 1).unwrap().panel_label.as_deref(), Some("B"));
    assert_eq!(fig.panels().count(), 2);
}

#[test]
fn results_panel_rejects_bad_layout() {
    let err = create_results_panel(Vec::new(), "two-by-two", None, None, &StyleConfig::default())
        .unwrap_err();
    assert!(matches!(err, VizError::UnknownLayout(_)));
}

#[test]
fn timeline_without_markers_row() {
    let imgs = vec![
        ("pre".to_string(), photo([200, 180, 160])),
        ("post".to_string(), photo([190, 170, 150])),
    ];
    let fig = create_time_series_figure(imgs, &[], false, None, None, &StyleConfig::default());
    assert_eq!(fig.rows.len(), 1);
    assert_eq!(fig.size(), (7.0, 4.0));
    assert!(fig.has_images());
}

#[test]
fn svg_rendering_of_a_chart() {
    if !fonts_available() {
        return;
    }
    let mut ax = chart("Control");
    ax.set_xlabel("Weeks");
    ax.set_ylabel("Score");
    prs_legend(&mut ax, &LegendRequest::at(LegendPosition::Outside));
    let fig = Figure::single(ax, (4.0, 3.0));
    let svg = render_svg_string(&fig, 100).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Weeks"));
    assert!(svg.contains("Control"));
}

#[test]
fn svg_refuses_photographs() {
    let fig = create_before_after_figure(
        photo([10, 10, 10]),
        photo([20, 20, 20]),
        ("Before", "After"),
        None,
        None,
        &StyleConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        render_svg_string(&fig, 100),
        Err(VizError::UnsupportedFormat { .. })
    ));
}

#[test]
fn raster_matches_physical_size() {
    if !fonts_available() {
        return;
    }
    let time: Vec<f64> = (0..6).map(f64::from).collect();
    let plot = TimeSeriesPlot::new(
        vec![
            Series::new("Control", vec![50.0, 52.0, 55.0, 57.0, 58.0, 60.0]).with_ci(vec![3.0; 6]),
            Series::new("Treatment", vec![50.0, 56.0, 63.0, 70.0, 76.0, 80.0]),
        ],
        time,
        "Recovery Score",
    );
    let fig = create_time_series_plot(&plot, &StyleConfig::default());
    let img = render_rgb(&fig, 50).unwrap();
    assert_eq!(img.dimensions(), fig.pixel_size(50));
    assert_eq!(img.dimensions(), (500, 300));
}

#[test]
fn photographs_are_blitted_into_raster() {
    if !fonts_available() {
        return;
    }
    let views = vec![
        ("frontal".to_string(), photo([200, 30, 30])),
        ("lateral".to_string(), photo([30, 200, 30])),
    ];
    let fig = create_multi_view_figure(
        views,
        GridLayout::Row,
        &[],
        Some((4.0, 2.0)),
        Some("Views"),
        &StyleConfig::default(),
    );
    let img = render_rgb(&fig, 100).unwrap();
    assert_eq!(img.dimensions(), (400, 200));
    // some pixel of the red photograph lands in the left half
    let red = img
        .enumerate_pixels()
        .any(|(x, _, p)| x < 200 && p.0 == [200, 30, 30]);
    assert!(red);
    assert!(matches!(fig.panel(0, 1), Some(Panel::Image(_))));
}

#[test]
fn long_titles_are_cut_to_the_panel() {
    if !fonts_available() {
        return;
    }
    let title = "Long-term aesthetic outcome scores across all follow-up visits";
    let mut ax = chart("Control");
    ax.set_title(title);
    let fig = Figure::single(ax, (2.0, 2.0));
    let svg = render_svg_string(&fig, 100).unwrap();
    assert!(svg.contains('…'));
    assert!(!svg.contains(title));
}

fn first_row_of(img: &RgbImage, color: [u8; 3]) -> Option<u32> {
    img.enumerate_pixels()
        .find(|(_, _, p)| p.0 == color)
        .map(|(_, y, _)| y)
}

#[test]
fn long_captions_wrap_and_push_the_photo_down() {
    if !fonts_available() {
        return;
    }
    let render_with = |caption: &str| {
        let mut fig = Figure::grid(1, 1, (2.0, 2.0), &StyleConfig::default());
        let panel = ImagePanel::new(photo([200, 30, 30])).with_label(caption, 10.0);
        assert!(fig.set_panel(0, 0, Panel::Image(panel)));
        render_rgb(&fig, 100).unwrap()
    };
    let short = render_with("Frontal");
    let long = render_with("Frontal view at twelve months after primary cleft lip repair");
    let short_top = first_row_of(&short, [200, 30, 30]).unwrap();
    let long_top = first_row_of(&long, [200, 30, 30]).unwrap();
    assert!(long_top > short_top, "{long_top} <= {short_top}");
}
