//! Figures: rows of panels with a physical size in inches.

use std::path::Path;

use image::RgbImage;

use crate::axes::Axes;
use crate::error::{Result, VizError};
use crate::style::StyleConfig;

/// Photograph shown without axes, with an optional caption below it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePanel {
    pub image: RgbImage,
    pub label: Option<String>,
    pub label_size: f64,
    pub label_bold: bool,
}

impl ImagePanel {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            label: None,
            label_size: 11.0,
            label_bold: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>, size: f64) -> Self {
        self.label = Some(label.into());
        self.label_size = size;
        self
    }

    /// Load any PNG, JPEG or TIFF file as RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
        let img = image::open(path.as_ref()).map_err(|e| VizError::Encode(e.to_string()))?;
        Ok(img.to_rgb8())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Chart(Box<Axes>),
    Image(ImagePanel),
    /// Unused cell; rendered blank.
    Empty,
}

/// Panels sharing one row; each row splits its width evenly.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureRow {
    pub panels: Vec<Panel>,
    /// Relative height against the other rows.
    pub height_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub rows: Vec<FigureRow>,
    pub suptitle: Option<String>,
    pub style: StyleConfig,
}

impl Figure {
    pub fn new(size: (f64, f64), style: &StyleConfig) -> Self {
        Self {
            width_in: size.0,
            height_in: size.1,
            rows: Vec::new(),
            suptitle: None,
            style: style.clone(),
        }
    }

    /// Figure holding one chart.
    pub fn single(axes: Axes, size: (f64, f64)) -> Self {
        let mut fig = Self::new(size, &axes.style);
        fig.push_row(vec![Panel::Chart(Box::new(axes))], 1.0);
        fig
    }

    /// `nrows` x `ncols` grid of empty panels.
    pub fn grid(nrows: usize, ncols: usize, size: (f64, f64), style: &StyleConfig) -> Self {
        let mut fig = Self::new(size, style);
        for _ in 0..nrows {
            fig.push_row((0..ncols).map(|_| Panel::Empty).collect(), 1.0);
        }
        fig
    }

    pub fn push_row(&mut self, panels: Vec<Panel>, height_ratio: f64) {
        self.rows.push(FigureRow {
            panels,
            height_ratio,
        });
    }

    pub fn set_suptitle(&mut self, title: impl Into<String>) {
        self.suptitle = Some(title.into());
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width_in, self.height_in)
    }

    /// Resize to `width` inches keeping the aspect ratio.
    pub fn scale_to_width(&mut self, width: f64) {
        if self.width_in > 0.0 {
            self.height_in *= width / self.width_in;
        }
        self.width_in = width;
    }

    pub fn panel(&self, row: usize, col: usize) -> Option<&Panel> {
        self.rows.get(row)?.panels.get(col)
    }

    pub fn set_panel(&mut self, row: usize, col: usize, panel: Panel) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.panels.get_mut(col)) {
            Some(slot) => {
                *slot = panel;
                true
            }
            None => false,
        }
    }

    pub fn axes(&self, row: usize, col: usize) -> Option<&Axes> {
        match self.panel(row, col)? {
            Panel::Chart(ax) => Some(&**ax),
            _ => None,
        }
    }

    pub fn axes_mut(&mut self, row: usize, col: usize) -> Option<&mut Axes> {
        match self.rows.get_mut(row)?.panels.get_mut(col)? {
            Panel::Chart(ax) => Some(&mut **ax),
            _ => None,
        }
    }

    /// First chart in row-major order.
    pub fn first_axes(&self) -> Option<&Axes> {
        self.panels().find_map(|p| match p {
            Panel::Chart(ax) => Some(&**ax),
            _ => None,
        })
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.rows.iter().flat_map(|r| r.panels.iter())
    }

    pub fn has_images(&self) -> bool {
        self.panels().any(|p| matches!(p, Panel::Image(_)))
    }

    /// Pixel size at `dpi`.
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        (
            (self.width_in * dpi as f64).round().max(1.0) as u32,
            (self.height_in * dpi as f64).round().max(1.0) as u32,
        )
    }
}
