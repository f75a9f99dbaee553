//! Document x topic heatmap rendering.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use log::debug;
use ndarray::Array2;
use serde::Serialize;

use crate::error::{Error, Result};

/// Figures with more rows or columns than this get the large canvas.
const LARGE_FIGURE_THRESHOLD: usize = 20;
const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);
const LARGE_FIGURE_INCHES: (f64, f64) = (20.0, 20.0);
/// Largest canvas `save` will allocate.
const MAX_PIXELS: f64 = 100_000_000.0;

const GRID_LINE: Rgb<u8> = Rgb([255, 255, 255]);

/// Sequential white-to-dark-red colour map.
const REDS: [Rgb<u8>; 5] = [
    Rgb([255, 245, 240]),
    Rgb([252, 187, 161]),
    Rgb([251, 106, 74]),
    Rgb([203, 24, 29]),
    Rgb([103, 0, 13]),
];

fn interpolate_color(from: Rgb<u8>, to: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Rgb([
        channel(from[0], to[0]),
        channel(from[1], to[1]),
        channel(from[2], to[2]),
    ])
}

/// Colour for `t` in `[0, 1]`.
pub fn reds(t: f64) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let segments = (REDS.len() - 1) as f64;
    let position = t * segments;
    let index = (position.floor() as usize).min(REDS.len() - 2);
    interpolate_color(REDS[index], REDS[index + 1], position - index as f64)
}

#[derive(Debug, Serialize)]
struct HeatmapLabels<'a> {
    rows: &'a [String],
    columns: &'a [String],
}

/// A document x topic probability grid with its axis labels.
#[derive(Debug, Clone)]
pub struct HeatmapFigure {
    doc_topic: Array2<f64>,
    row_labels: Vec<String>,
    column_labels: Vec<String>,
}

impl HeatmapFigure {
    pub fn new(doc_topic: Array2<f64>, row_labels: Vec<String>, column_labels: Vec<String>) -> Result<Self> {
        if doc_topic.nrows() != row_labels.len() || doc_topic.ncols() != column_labels.len() {
            return Err(Error::mismatch(format!(
                "{} x {} grid with {} row and {} column labels",
                doc_topic.nrows(),
                doc_topic.ncols(),
                row_labels.len(),
                column_labels.len()
            )));
        }
        Ok(HeatmapFigure {
            doc_topic,
            row_labels,
            column_labels,
        })
    }

    pub fn doc_topic(&self) -> &Array2<f64> {
        &self.doc_topic
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    fn inches(&self) -> (f64, f64) {
        if self.doc_topic.nrows() > LARGE_FIGURE_THRESHOLD
            || self.doc_topic.ncols() > LARGE_FIGURE_THRESHOLD
        {
            LARGE_FIGURE_INCHES
        } else {
            FIGURE_INCHES
        }
    }

    /// Canvas size in pixels at `dpi`.
    pub fn size(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.inches();
        let px = |inches: f64| ((inches * dpi as f64).round() as u32).max(1);
        (px(w), px(h))
    }

    /// Rows are documents top to bottom, columns topics left to right.
    /// Colours are scaled between the grid's minimum and maximum.
    pub fn render(&self, dpi: u32) -> RgbImage {
        let (width, height) = self.size(dpi);
        let mut img = RgbImage::from_pixel(width, height, REDS[0]);

        let (rows, cols) = self.doc_topic.dim();
        if rows == 0 || cols == 0 {
            return img;
        }

        let min = self.doc_topic.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.doc_topic.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        let cell_width = width as f64 / cols as f64;
        let cell_height = height as f64 / rows as f64;

        for ((row, col), &value) in self.doc_topic.indexed_iter() {
            let t = if range > 0.0 { (value - min) / range } else { 0.0 };
            let color = reds(t);

            let x0 = (col as f64 * cell_width) as u32;
            let x1 = (((col + 1) as f64 * cell_width) as u32).min(width);
            let y0 = (row as f64 * cell_height) as u32;
            let y1 = (((row + 1) as f64 * cell_height) as u32).min(height);
            for y in y0..y1 {
                for x in x0..x1 {
                    let on_edge = (x == x0 && col > 0) || (y == y0 && row > 0);
                    img.put_pixel(x, y, if on_edge { GRID_LINE } else { color });
                }
            }
        }

        img
    }

    /// Write `<dir>/<filename>.<ext>` and the axis labels to
    /// `<dir>/<filename>_labels.json`. Returns the image path.
    pub fn save(&self, dir: &Path, filename: &str, ext: &str, dpi: u32) -> Result<PathBuf> {
        let format = ImageFormat::from_extension(ext)
            .ok_or_else(|| Error::invalid_argument(format!("unsupported image extension '{ext}'")))?;
        if dpi == 0 {
            return Err(Error::invalid_argument("dpi must be positive"));
        }
        let (w, h) = self.inches();
        let pixels = w * h * f64::from(dpi) * f64::from(dpi);
        if pixels > MAX_PIXELS {
            return Err(Error::invalid_argument(format!(
                "{dpi} dpi gives a {pixels:.0} pixel canvas, at most {MAX_PIXELS:.0} supported"
            )));
        }

        let image_path = dir.join(format!("{filename}.{ext}"));
        self.render(dpi).save_with_format(&image_path, format)?;

        let labels = HeatmapLabels {
            rows: &self.row_labels,
            columns: &self.column_labels,
        };
        let labels_path = dir.join(format!("{filename}_labels.json"));
        fs::write(&labels_path, serde_json::to_string_pretty(&labels)?)?;

        debug!("Heatmap figure available at {}.", image_path.display());
        Ok(image_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_colour_map_endpoints() {
        assert_eq!(reds(0.0), REDS[0]);
        assert_eq!(reds(1.0), REDS[4]);
        assert_eq!(reds(0.5), REDS[2]);
        assert_eq!(reds(f64::NAN), REDS[0]);
    }

    #[test]
    fn test_large_grids_get_large_canvas() {
        let small = HeatmapFigure::new(Array2::zeros((3, 2)), labels("d", 3), labels("t", 2)).unwrap();
        assert_eq!(small.size(100), (640, 480));

        let large = HeatmapFigure::new(Array2::zeros((21, 2)), labels("d", 21), labels("t", 2)).unwrap();
        assert_eq!(large.size(10), (200, 200));
    }

    #[test]
    fn test_render_places_extremes() {
        let figure = HeatmapFigure::new(
            array![[1.0, 0.0], [0.0, 0.5]],
            labels("d", 2),
            labels("t", 2),
        )
        .unwrap();
        let img = figure.render(10);
        assert_eq!(img.dimensions(), (64, 48));
        // Centre of the top-left cell holds the maximum, top-right the minimum.
        assert_eq!(*img.get_pixel(16, 12), REDS[4]);
        assert_eq!(*img.get_pixel(48, 12), REDS[0]);
        assert_eq!(*img.get_pixel(48, 36), reds(0.5));
    }

    #[test]
    fn test_label_count_must_match_grid() {
        let err = HeatmapFigure::new(Array2::zeros((2, 2)), labels("d", 3), labels("t", 2)).unwrap_err();
        assert!(matches!(err, Error::Mismatch(_)));
    }

    #[test]
    fn test_save_writes_image_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let figure = HeatmapFigure::new(array![[0.2, 0.8]], labels("doc", 1), labels("topic", 2)).unwrap();

        let path = figure.save(dir.path(), "heatmap", "png", 20).unwrap();
        assert_eq!(path, dir.path().join("heatmap.png"));
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (128, 96));

        let labels = std::fs::read_to_string(dir.path().join("heatmap_labels.json")).unwrap();
        let labels: serde_json::Value = serde_json::from_str(&labels).unwrap();
        assert_eq!(labels["columns"][1], "topic1");

        assert!(matches!(
            figure.save(dir.path(), "heatmap", "xyz", 20),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_save_rejects_huge_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let figure = HeatmapFigure::new(array![[0.2, 0.8]], labels("doc", 1), labels("topic", 2)).unwrap();

        for dpi in [5_000, u32::MAX] {
            assert!(matches!(
                figure.save(dir.path(), "heatmap", "png", dpi),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(!dir.path().join("heatmap.png").exists());
    }
}
