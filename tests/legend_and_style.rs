use prs_viz::axes::{Axes, GridMode, Line};
use prs_viz::legend::{HandleSizing, LegendSpacing, Location, optimal_columns, resolve_legend};
use prs_viz::palettes::{COMPARISON, ColorCycle, NAMED_PALETTES, Rgb8, cmyk_to_rgb, rgb_to_cmyk};
use prs_viz::style::{
    ComparisonKind, ScaleBarOptions, add_scale_bar, format_comparison_plot,
    format_statistical_plot, prs_legend,
};
use prs_viz::{LegendPosition, LegendRequest, StyleConfig, VizError};

#[test]
fn syndromic_labels_take_two_columns() {
    let labels = [
        "Non-syndromic: No",
        "Non-syndromic: Yes",
        "Syndromic: No",
        "Syndromic: Yes",
    ];
    assert_eq!(optimal_columns(&labels, 4), 2);
}

#[test]
fn very_long_label_takes_one_column() {
    assert_eq!(
        optimal_columns(&["Very long label describing something in detail"], 4),
        1
    );
    assert_eq!(optimal_columns::<&str>(&[], 4), 1);
}

#[test]
fn many_short_labels_use_square_root() {
    let labels: Vec<String> = (0..10).map(|i| format!("G{i}")).collect();
    assert_eq!(optimal_columns(&labels, 4), 4);
    assert_eq!(optimal_columns(&labels[..9], 4), 3);
    assert_eq!(optimal_columns(&labels[..3], 2), 2);
}

#[test]
fn top_legend_plan() {
    let labels = ["Control", "Treatment", "Sham"];
    let plan = resolve_legend(&LegendRequest::at(LegendPosition::Top), &labels, false);
    assert_eq!(plan.ncol, 3);
    assert_eq!(plan.location, Location::UpperCenter);
    assert_eq!(plan.anchor, Some((0.4, 1.12)));
    assert!(!plan.frame);
    assert_eq!(plan.spacing, LegendSpacing::COMPACT);
}

#[test]
fn outside_legend_caps_at_two_columns() {
    let labels = ["a", "b", "c", "d", "e"];
    let plan = resolve_legend(&LegendRequest::at(LegendPosition::Outside), &labels, true);
    assert_eq!(plan.ncol, 2);
    assert_eq!(plan.location, Location::CenterLeft);
    assert_eq!(plan.anchor, Some((1.02, 0.5)));
    assert!(plan.frame);
    assert_eq!(plan.handles, HandleSizing::BAR);
}

#[test]
fn explicit_ncol_and_location() {
    let request = LegendRequest {
        position: "lower right".parse().unwrap(),
        ncol: Some(5),
        compact: true,
        ..LegendRequest::default()
    };
    let plan = resolve_legend(&request, &["x"], false);
    assert_eq!(plan.ncol, 5);
    assert_eq!(plan.location, Location::LowerRight);
    assert_eq!(plan.anchor, None);
    assert_eq!(plan.spacing, LegendSpacing::COMPACT);
}

#[test]
fn unknown_position_is_rejected() {
    let err = "somewhere".parse::<LegendPosition>().unwrap_err();
    assert!(matches!(err, VizError::UnknownPosition(s) if s == "somewhere"));
}

#[test]
fn prs_legend_reads_labels_in_legend_order() {
    let mut ax = Axes::new(&StyleConfig::default());
    ax.bar(&[0.0, 1.0], &[1.0, 2.0], 0.5).label("Bars");
    ax.plot(&[0.0, 1.0], &[1.0, 1.5]).label("Trend");
    prs_legend(&mut ax, &LegendRequest::default());
    assert_eq!(ax.legend_labels(), vec!["Trend", "Bars"]);
    let plan = ax.legend.as_ref().unwrap();
    assert_eq!(plan.location, Location::Best);
    assert_eq!(plan.handles, HandleSizing::BAR);
}

#[test]
fn cmyk_conversion_matches_print_values() {
    let (c, m, y, k) = rgb_to_cmyk(0.0, 0.0, 0.0);
    assert_eq!((c, m, y, k), (0.0, 0.0, 0.0, 1.0));
    let navy = Rgb8::from_hex("#1F4788").unwrap();
    let (c, m, y, k) = navy.to_cmyk();
    let (r, g, b) = cmyk_to_rgb(c, m, y, k);
    let (er, eg, eb) = navy.to_unit();
    assert!((r - er).abs() < 1e-9 && (g - eg).abs() < 1e-9 && (b - eb).abs() < 1e-9);
    assert!(matches!(Rgb8::from_hex("#12"), Err(VizError::InvalidColor(_))));
}

#[test]
fn palettes_are_named_and_non_empty() {
    assert_eq!(NAMED_PALETTES.len(), 5);
    assert!(NAMED_PALETTES.iter().all(|p| !p.entries.is_empty()));
    assert!(COMPARISON.get("Control").is_some());
    assert!(COMPARISON.get("Placebo").is_none());
}

#[test]
fn style_json_overrides_only_listed_fields() {
    let style =
        StyleConfig::from_json_str(r#"{"cycle": "clinical", "font_size": 12.0}"#).unwrap();
    assert_eq!(style.cycle, ColorCycle::Clinical);
    assert_eq!(style.theme().title_size, 14.0);
    assert_eq!(style.locale, "en");
    assert!(!style.show_grid);

    assert!(StyleConfig::from_json_str(r#"{"cycle": "neon"}"#).is_err());
    assert!(matches!(StyleConfig::prs("neon"), Err(VizError::UnknownCycle(_))));
}

#[test]
fn style_json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("style.json");
    let style = StyleConfig::with_cycle(ColorCycle::Comparison).grid(true);
    std::fs::write(&path, serde_json::to_string(&style).unwrap()).unwrap();
    assert_eq!(StyleConfig::from_json_file(&path).unwrap(), style);
    assert!(StyleConfig::from_json_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn statistical_and_comparison_formatting() {
    let mut ax = Axes::new(&StyleConfig::default());
    ax.plot(&[0.0, 1.0], &[1.0, 2.0]);
    ax.plot(&[0.0, 1.0], &[2.0, 3.0]);
    format_statistical_plot(&mut ax);
    assert_eq!(ax.grid, GridMode::Y { dashed: true });
    assert!(!ax.spines.top && !ax.spines.right);
    assert!(ax.spines.left && ax.spines.bottom);

    format_comparison_plot(&mut ax, ComparisonKind::BeforeAfter);
    let colors: Vec<Rgb8> = ax.lines.iter().map(|l: &Line| l.color).collect();
    assert_eq!(colors, COMPARISON.colors()[..2].to_vec());
}

#[test]
fn scale_bar_sits_in_lower_right_corner() {
    let mut ax = Axes::new(&StyleConfig::default());
    ax.set_xlim(0.0, 100.0);
    ax.set_ylim(0.0, 50.0);
    add_scale_bar(&mut ax, 10.0, "1 cm", &ScaleBarOptions::default());
    let seg = &ax.segments[0];
    assert_eq!(seg.from, (85.0, 2.5));
    assert_eq!(seg.to, (95.0, 2.5));
    let label = &ax.texts[0];
    assert_eq!(label.text, "1 cm");
    assert_eq!((label.x, label.y), (90.0, 3.5));
    assert!(label.bold);
}
