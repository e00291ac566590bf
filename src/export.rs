//! Journal-ready figure export and validation of existing figure files.
//!
//! Raster output is rendered at the requested dpi and written with the
//! resolution recorded in the file: TIFF resolution tags, the PNG `pHYs`
//! chunk, the JPEG JFIF density. TIFF can carry CMYK; PNG and JPEG are RGB.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{ExtendedColorType, RgbImage};
use log::{debug, info, warn};
use serde::Serialize;
use tiff::decoder::{Decoder as TiffDecoder, ifd::Value};
use tiff::encoder::{Rational, TiffEncoder, colortype, compression::Lzw};
use tiff::tags::{ResolutionUnit, Tag};

use crate::error::{Result, VizError};
use crate::figure::Figure;
use crate::palettes::rgb_to_cmyk;
use crate::viz;

pub const PRS_MIN_DPI: u32 = 300;
/// Minimum width in inches for a single image.
pub const PRS_MIN_WIDTH_SINGLE: f64 = 3.25;
/// Minimum width in inches for graphs and images with text.
pub const PRS_MIN_WIDTH_GRAPH: f64 = 5.0;
/// Vector output is SVG only; PDF and EPS are not written.
pub const SUPPORTED_FORMATS: [&str; 6] = ["tiff", "tif", "png", "jpeg", "jpg", "svg"];

const JPEG_QUALITY: u8 = 95;
const METERS_PER_INCH: f64 = 0.0254;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Tiff,
    Png,
    Jpeg,
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Tiff => "tiff",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
        }
    }

    /// Format named by the file extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .parse()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tiff" | "tif" => Ok(ExportFormat::Tiff),
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(VizError::UnsupportedFormat {
                format: other.to_string(),
                supported: SUPPORTED_FORMATS.join(", "),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub dpi: u32,
    /// Target width; the height follows the figure's aspect ratio. `None`
    /// keeps the figure's own size.
    pub width_inches: Option<f64>,
    /// Output format; taken from the file extension when `None`.
    pub format: Option<ExportFormat>,
    /// Write CMYK where the format allows it (TIFF).
    pub cmyk: bool,
    /// Check dpi and width against the journal minimums and warn.
    pub validate: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dpi: PRS_MIN_DPI,
            width_inches: Some(PRS_MIN_WIDTH_GRAPH),
            format: None,
            cmyk: true,
            validate: true,
        }
    }
}

impl ExportOptions {
    /// Defaults for multi-panel export: 3.5" TIFF panels.
    pub fn panels() -> Self {
        Self {
            width_inches: Some(3.5),
            format: Some(ExportFormat::Tiff),
            ..Self::default()
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedFigure {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub pixels: (u32, u32),
    /// Journal requirement warnings raised while saving (also logged).
    pub warnings: Vec<String>,
}

/// Warnings for a dpi or width below the journal minimums.
pub fn requirement_warnings(dpi: u32, width_inches: f64) -> Vec<String> {
    let mut issues = Vec::new();
    if dpi < PRS_MIN_DPI {
        issues.push(format!(
            "DPI {dpi} is below PRS minimum of {PRS_MIN_DPI}. Figure may be rejected."
        ));
    }
    if width_inches < PRS_MIN_WIDTH_SINGLE {
        issues.push(format!(
            "Width {width_inches}\" is below PRS minimum of {PRS_MIN_WIDTH_SINGLE}\". \
             For graphs or text, use {PRS_MIN_WIDTH_GRAPH}\" minimum."
        ));
    }
    issues
}

/// Save `figure` to `path` in a journal-compliant format.
///
/// The figure is resized to the requested width before rendering; the
/// caller's figure is left untouched.
pub fn save_prs_figure<P: AsRef<Path>>(
    figure: &Figure,
    path: P,
    options: &ExportOptions,
) -> Result<SavedFigure> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => ExportFormat::from_path(path)?,
    };

    let mut fig = figure.clone();
    if let Some(width) = options.width_inches {
        fig.scale_to_width(width);
    }

    let mut warnings = if options.validate {
        requirement_warnings(options.dpi, fig.width_in)
    } else {
        Vec::new()
    };

    let pixels = fig.pixel_size(options.dpi);
    match format {
        ExportFormat::Svg => viz::render_svg(&fig, path, options.dpi)?,
        ExportFormat::Tiff => {
            let img = viz::render_rgb(&fig, options.dpi)?;
            write_tiff(&img, path, options.dpi, options.cmyk)?;
        }
        ExportFormat::Png => {
            if options.cmyk {
                warnings.push(
                    "PNG does not natively support CMYK. Consider using TIFF format for CMYK output."
                        .to_string(),
                );
            }
            let img = viz::render_rgb(&fig, options.dpi)?;
            write_png(&img, path, options.dpi)?;
        }
        ExportFormat::Jpeg => {
            let img = viz::render_rgb(&fig, options.dpi)?;
            write_jpeg(&img, path, options.dpi)?;
        }
    }

    for w in &warnings {
        warn!("{}: {w}", path.display());
    }
    info!(
        "saved {} ({format}, {}x{} px at {} dpi)",
        path.display(),
        pixels.0,
        pixels.1,
        options.dpi
    );
    Ok(SavedFigure {
        path: path.to_path_buf(),
        format,
        pixels,
        warnings,
    })
}

/// Save each labelled panel as its own file, `<stem><label>.<ext>` next to
/// `base` (e.g. `Figure1a.tiff`, `Figure1b.tiff`).
pub fn save_multi_panel_figure<P: AsRef<Path>>(
    figures: &[(String, Figure)],
    base: P,
    options: &ExportOptions,
) -> Result<BTreeMap<String, PathBuf>> {
    let base = base.as_ref();
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match base.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let format = options.format.unwrap_or(ExportFormat::Tiff);
    let panel_options = ExportOptions {
        format: Some(format),
        ..options.clone()
    };

    let mut saved = BTreeMap::new();
    for (label, fig) in figures {
        let path = dir.join(format!("{stem}{label}.{}", format.extension()));
        let out = save_prs_figure(fig, &path, &panel_options)?;
        saved.insert(label.clone(), out.path);
    }
    Ok(saved)
}

fn encode_err<E: fmt::Display>(e: E) -> VizError {
    VizError::Encode(e.to_string())
}

fn rgb_to_cmyk_bytes(img: &RgbImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(img.as_raw().len() / 3 * 4);
    for px in img.pixels() {
        let [r, g, b] = px.0;
        let (c, m, y, k) = rgb_to_cmyk(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
        out.extend([c, m, y, k].map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8));
    }
    out
}

pub fn write_tiff(img: &RgbImage, path: &Path, dpi: u32, cmyk: bool) -> Result<()> {
    let (w, h) = img.dimensions();
    let mut file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(&mut file).map_err(encode_err)?;
    let resolution = Rational { n: dpi, d: 1 };
    if cmyk {
        let data = rgb_to_cmyk_bytes(img);
        let mut image = encoder
            .new_image_with_compression::<colortype::CMYK8, _>(w, h, Lzw::default())
            .map_err(encode_err)?;
        image.resolution(ResolutionUnit::Inch, resolution);
        image.write_data(&data).map_err(encode_err)?;
    } else {
        let mut image = encoder
            .new_image_with_compression::<colortype::RGB8, _>(w, h, Lzw::default())
            .map_err(encode_err)?;
        image.resolution(ResolutionUnit::Inch, resolution);
        image.write_data(img.as_raw()).map_err(encode_err)?;
    }
    file.flush()?;
    debug!("wrote TIFF {}x{} ({})", w, h, if cmyk { "CMYK" } else { "RGB" });
    Ok(())
}

pub fn write_png(img: &RgbImage, path: &Path, dpi: u32) -> Result<()> {
    let (w, h) = img.dimensions();
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, w, h);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = (dpi as f64 / METERS_PER_INCH).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer.write_image_data(img.as_raw()).map_err(encode_err)?;
    writer.finish().map_err(encode_err)?;
    Ok(())
}

pub fn write_jpeg(img: &RgbImage, path: &Path, dpi: u32) -> Result<()> {
    let (w, h) = img.dimensions();
    let mut file = BufWriter::new(File::create(path)?);
    let mut encoder = JpegEncoder::new_with_quality(&mut file, JPEG_QUALITY);
    encoder.set_pixel_density(PixelDensity::dpi(dpi.min(u16::MAX as u32) as u16));
    encoder
        .encode(img.as_raw(), w, h, ExtendedColorType::Rgb8)
        .map_err(encode_err)?;
    file.flush()?;
    Ok(())
}

/// Colour model of a figure file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ColorMode {
    Rgb,
    Rgba,
    Cmyk,
    Gray,
    Other(String),
}

impl ColorMode {
    fn print_ready(&self) -> bool {
        matches!(self, ColorMode::Rgb | ColorMode::Cmyk)
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Rgb => f.write_str("RGB"),
            ColorMode::Rgba => f.write_str("RGBA"),
            ColorMode::Cmyk => f.write_str("CMYK"),
            ColorMode::Gray => f.write_str("L"),
            ColorMode::Other(s) => f.write_str(s),
        }
    }
}

/// Outcome of [`validate_figure_file`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureReport {
    pub valid: bool,
    pub dpi: Option<f64>,
    pub width_inches: Option<f64>,
    pub height_inches: Option<f64>,
    pub width_pixels: Option<u32>,
    pub height_pixels: Option<u32>,
    pub color_mode: Option<ColorMode>,
    pub issues: Vec<String>,
}

impl FigureReport {
    fn unreadable(reason: String) -> Self {
        Self {
            valid: false,
            dpi: None,
            width_inches: None,
            height_inches: None,
            width_pixels: None,
            height_pixels: None,
            color_mode: None,
            issues: vec![format!("Error reading file: {reason}")],
        }
    }
}

impl fmt::Display for FigureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "valid: {}", if self.valid { "yes" } else { "no" })?;
        if let Some(dpi) = self.dpi {
            writeln!(f, "dpi: {dpi:.0}")?;
        }
        if let (Some(w), Some(h)) = (self.width_inches, self.height_inches) {
            writeln!(f, "size: {w:.2}\" x {h:.2}\"")?;
        }
        if let (Some(w), Some(h)) = (self.width_pixels, self.height_pixels) {
            writeln!(f, "pixels: {w} x {h}")?;
        }
        if let Some(mode) = &self.color_mode {
            writeln!(f, "color mode: {mode}")?;
        }
        for issue in &self.issues {
            writeln!(f, "issue: {issue}")?;
        }
        Ok(())
    }
}

/// What a file header tells about a raster figure.
struct RasterInfo {
    width: u32,
    height: u32,
    /// Horizontal and vertical dots per inch.
    dpi: Option<(f64, f64)>,
    color_mode: ColorMode,
}

/// Check an existing figure file against `min_dpi` and `min_width_inches`.
/// Unreadable or unknown files give an invalid report, never an error.
pub fn validate_figure_file<P: AsRef<Path>>(
    path: P,
    min_dpi: u32,
    min_width_inches: f64,
) -> FigureReport {
    let path = path.as_ref();
    let info = match read_raster_info(path) {
        Ok(info) => info,
        Err(e) => return FigureReport::unreadable(e.to_string()),
    };

    let mut issues = Vec::new();
    let dpi = info.dpi.map(|(x, y)| (x + y) / 2.0).filter(|d| *d > 0.0);
    let (width_inches, height_inches) = match dpi {
        Some(d) => {
            let w = info.width as f64 / d;
            if d.round() < min_dpi as f64 {
                issues.push(format!("DPI {d:.0} is below minimum {min_dpi}"));
            }
            if w < min_width_inches {
                issues.push(format!("Width {w:.2}\" is below minimum {min_width_inches}\""));
            }
            (Some(w), Some(info.height as f64 / d))
        }
        None => {
            issues.push("DPI information not found in image metadata".to_string());
            (None, None)
        }
    };
    if !info.color_mode.print_ready() {
        issues.push(format!(
            "Color mode '{}' may not be suitable. PRS recommends CMYK for print.",
            info.color_mode
        ));
    }

    FigureReport {
        valid: issues.is_empty(),
        dpi,
        width_inches,
        height_inches,
        width_pixels: Some(info.width),
        height_pixels: Some(info.height),
        color_mode: Some(info.color_mode),
        issues,
    }
}

fn read_raster_info(path: &Path) -> Result<RasterInfo> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Tiff => read_tiff_info(path),
        ExportFormat::Png => read_png_info(path),
        ExportFormat::Jpeg => read_jpeg_info(path),
        ExportFormat::Svg => Err(VizError::UnsupportedFormat {
            format: "svg".to_string(),
            supported: "tiff, png, jpeg".to_string(),
        }),
    }
}

fn rational(v: Value) -> Option<f64> {
    match v {
        Value::Rational(n, d) if d != 0 => Some(n as f64 / d as f64),
        Value::Short(n) => Some(n as f64),
        Value::Unsigned(n) => Some(n as f64),
        _ => None,
    }
}

fn read_tiff_info(path: &Path) -> Result<RasterInfo> {
    let mut decoder = TiffDecoder::new(BufReader::new(File::open(path)?)).map_err(encode_err)?;
    let (width, height) = decoder.dimensions().map_err(encode_err)?;
    let color_mode = match decoder.colortype().map_err(encode_err)? {
        tiff::ColorType::RGB(_) => ColorMode::Rgb,
        tiff::ColorType::RGBA(_) => ColorMode::Rgba,
        tiff::ColorType::CMYK(_) => ColorMode::Cmyk,
        tiff::ColorType::Gray(_) => ColorMode::Gray,
        other => ColorMode::Other(format!("{other:?}")),
    };
    let tag = |decoder: &mut TiffDecoder<_>, t: Tag| {
        decoder.find_tag(t).ok().flatten().and_then(rational)
    };
    let x = tag(&mut decoder, Tag::XResolution);
    let y = tag(&mut decoder, Tag::YResolution);
    // 2 = inch (the default), 3 = centimetre
    let per_inch = match tag(&mut decoder, Tag::ResolutionUnit) {
        Some(u) if u == 3.0 => 2.54,
        Some(u) if u == 1.0 => 0.0,
        _ => 1.0,
    };
    let dpi = match (x, y) {
        (Some(x), Some(y)) if per_inch > 0.0 => Some((x * per_inch, y * per_inch)),
        (Some(x), None) if per_inch > 0.0 => Some((x * per_inch, x * per_inch)),
        _ => None,
    };
    Ok(RasterInfo {
        width,
        height,
        dpi,
        color_mode,
    })
}

fn read_png_info(path: &Path) -> Result<RasterInfo> {
    let decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    let reader = decoder.read_info().map_err(encode_err)?;
    let info = reader.info();
    let color_mode = match info.color_type {
        png::ColorType::Rgb => ColorMode::Rgb,
        png::ColorType::Rgba => ColorMode::Rgba,
        png::ColorType::Grayscale => ColorMode::Gray,
        png::ColorType::GrayscaleAlpha => ColorMode::Other("LA".to_string()),
        png::ColorType::Indexed => ColorMode::Other("P".to_string()),
    };
    let dpi = info.pixel_dims.and_then(|d| match d.unit {
        png::Unit::Meter => Some((
            d.xppu as f64 * METERS_PER_INCH,
            d.yppu as f64 * METERS_PER_INCH,
        )),
        png::Unit::Unspecified => None,
    });
    Ok(RasterInfo {
        width: info.width,
        height: info.height,
        dpi,
        color_mode,
    })
}

fn read_jpeg_info(path: &Path) -> Result<RasterInfo> {
    let bytes = fs::read(path)?;
    parse_jpeg_header(&bytes).ok_or_else(|| VizError::Encode("malformed JPEG header".to_string()))
}

/// Walk JPEG marker segments up to the frame header, picking up the JFIF
/// density on the way.
fn parse_jpeg_header(bytes: &[u8]) -> Option<RasterInfo> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let be16 = |at: usize| -> Option<u16> {
        Some(u16::from_be_bytes([*bytes.get(at)?, *bytes.get(at + 1)?]))
    };

    let mut dpi = None;
    let mut pos = 2;
    loop {
        while *bytes.get(pos)? != 0xFF {
            pos += 1;
        }
        while *bytes.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos)?;
        pos += 1;
        if marker == 0xD8 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }
        let len = be16(pos)? as usize;
        let seg = pos + 2;
        match marker {
            0xE0 if bytes.get(seg..seg + 5)? == b"JFIF\0" => {
                let unit = *bytes.get(seg + 7)?;
                let (x, y) = (be16(seg + 8)? as f64, be16(seg + 10)? as f64);
                dpi = match unit {
                    1 => Some((x, y)),
                    2 => Some((x * 2.54, y * 2.54)),
                    _ => None,
                };
            }
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be16(seg + 1)? as u32;
                let width = be16(seg + 3)? as u32;
                let color_mode = match *bytes.get(seg + 5)? {
                    1 => ColorMode::Gray,
                    3 => ColorMode::Rgb,
                    4 => ColorMode::Cmyk,
                    n => ColorMode::Other(format!("{n} components")),
                };
                return Some(RasterInfo {
                    width,
                    height,
                    dpi,
                    color_mode,
                });
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }
        pos += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_and_name() {
        assert_eq!(ExportFormat::from_path(Path::new("fig.TIF")).unwrap(), ExportFormat::Tiff);
        assert_eq!("jpg".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        let err = ExportFormat::from_path(Path::new("fig.bmp")).unwrap_err();
        assert!(matches!(err, VizError::UnsupportedFormat { ref format, .. } if format == "bmp"));
        assert!(ExportFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn warnings_for_low_dpi_and_narrow_width() {
        assert!(requirement_warnings(300, 5.0).is_empty());
        let w = requirement_warnings(150, 3.0);
        assert_eq!(w.len(), 2);
        assert!(w[0].contains("DPI 150"));
        assert!(w[1].contains("3.25"));
    }

    #[test]
    fn cmyk_bytes_for_primaries() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, image::Rgb([0, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([255, 255, 255]));
        img.put_pixel(2, 0, image::Rgb([255, 0, 0]));
        let bytes = rgb_to_cmyk_bytes(&img);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 255]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[0, 255, 255, 0]);
    }

    #[test]
    fn jpeg_header_parsing() {
        let mut jpeg = vec![0xFF, 0xD8];
        // APP0 JFIF, 300 dpi
        jpeg.extend([0xFF, 0xE0, 0x00, 0x10]);
        jpeg.extend(b"JFIF\0");
        jpeg.extend([1, 2, 1, 0x01, 0x2C, 0x01, 0x2C, 0, 0]);
        // SOF0: 8-bit, 20 x 40, 3 components
        jpeg.extend([0xFF, 0xC0, 0x00, 0x11, 8, 0x00, 0x14, 0x00, 0x28, 3]);
        jpeg.extend([0; 9]);
        let info = parse_jpeg_header(&jpeg).unwrap();
        assert_eq!((info.width, info.height), (40, 20));
        assert_eq!(info.dpi, Some((300.0, 300.0)));
        assert_eq!(info.color_mode, ColorMode::Rgb);
        assert!(parse_jpeg_header(b"not a jpeg").is_none());
    }

    #[test]
    fn missing_file_gives_invalid_report() {
        let report =
            validate_figure_file("/no/such/figure.tiff", PRS_MIN_DPI, PRS_MIN_WIDTH_SINGLE);
        assert!(!report.valid);
        assert!(report.dpi.is_none());
        assert!(report.issues[0].starts_with("Error reading file"));
    }
}
