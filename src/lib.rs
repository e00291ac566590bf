//! prs_viz
//!
//! Publication styling for scientific charts, tuned to the figure requirements
//! of a surgical journal (300 DPI minimum, CMYK for print, 3.25" / 5" minimum
//! width). Pairs with the `prsviz` CLI.
//!
//! ### Features
//! - Clinical colour palettes, colour cycles and RGB⇄CMYK conversion
//! - An explicit [`StyleConfig`] instead of process-wide style state
//! - Significance brackets that stack without colliding, with y-limits
//!   planned so they fit
//! - Legend column and placement heuristics
//! - Comparison bar charts, time series, and photograph layouts
//! - TIFF/PNG/JPEG/SVG export with resolution metadata, and validation of
//!   existing figure files
//!
//! ### Example
//! ```no_run
//! use prs_viz::charts::{ComparisonPlot, Group, create_comparison_plot};
//! use prs_viz::export::{ExportOptions, save_prs_figure};
//! use prs_viz::{Comparison, StyleConfig};
//!
//! let mut plot = ComparisonPlot::new(
//!     vec![Group::new("Treatment", vec![1250.0, 1680.0, 2150.0, 2890.0])],
//!     vec!["Baseline".into(), "1 Month".into(), "3 Months".into(), "6 Months".into()],
//!     "Wound area (mm²)",
//! );
//! plot.comparisons = vec![Comparison::new(0, 3, 0.0002)];
//! let fig = create_comparison_plot(&plot, &StyleConfig::default())?;
//! let saved = save_prs_figure(&fig, "figure1.tiff", &ExportOptions::default())?;
//! println!("{}", saved.path.display());
//! # Ok::<(), prs_viz::VizError>(())
//! ```

pub mod annotate;
pub mod axes;
pub mod charts;
pub mod error;
pub mod export;
pub mod figure;
pub mod geometry;
pub mod layout;
pub mod legend;
pub mod palettes;
pub mod style;
pub mod viz;

pub use annotate::{AnnotationSpacing, BracketPlan, Comparison, ComparisonSpan};
pub use axes::Axes;
pub use error::{Result, VizError};
pub use figure::{Figure, Panel};
pub use geometry::{AxisRange, PlotGeometry};
pub use legend::{LegendPlan, LegendPosition, LegendRequest};
pub use palettes::{ColorCycle, Rgb8};
pub use style::StyleConfig;
