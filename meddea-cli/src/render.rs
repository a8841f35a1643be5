//! Bitmap spectrogram rendering with plotters.

use std::path::PathBuf;

use clap::ValueEnum;
use log::debug;
use meddea_spectrum::{Spectrogram, SpectrogramRenderer};
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;

use crate::CliError;

/// Available colormaps for spectrogram images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Colormap {
    /// Hot (Thermal) - red to yellow to white.
    Hot,
    /// Grayscale - black to white.
    Grayscale,
    /// Viridis (approximate) - blue to teal to green to yellow.
    Viridis,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(val: f64) -> u8 {
    (val.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Colormap {
    /// Maps a normalized value in `[0, 1]` to a color.
    #[must_use]
    pub fn apply(self, val: f64) -> RGBColor {
        match self {
            Colormap::Grayscale => {
                let v = unit_to_u8(val);
                RGBColor(v, v, v)
            }
            Colormap::Hot => {
                if val < 0.5 {
                    RGBColor(255, unit_to_u8(val * 2.0), 0)
                } else {
                    RGBColor(255, 255, unit_to_u8((val - 0.5) * 2.0))
                }
            }
            Colormap::Viridis => RGBColor(
                unit_to_u8(val.powi(2)),
                unit_to_u8(val),
                unit_to_u8(1.0 - val),
            ),
        }
    }
}

/// Draws spectrograms into a bitmap file, time on x and spectral bin on y.
pub struct PlottersRenderer {
    pub path: PathBuf,
    pub size: (u32, u32),
    pub colormap: Colormap,
}

impl PlottersRenderer {
    fn render_error(err: impl std::fmt::Display) -> CliError {
        CliError::Render(err.to_string())
    }
}

impl SpectrogramRenderer for PlottersRenderer {
    type Error = CliError;

    fn render(&mut self, spectrogram: &Spectrogram) -> Result<(), CliError> {
        let Some((first, last)) = spectrogram.time_extent() else {
            return Err(CliError::Render("spectrogram has no rows".to_string()));
        };
        let times: Vec<f64> = spectrogram.time.iter().map(|t| t.as_secs()).collect();
        // the last row is drawn as wide as the one before it
        let tail = match times.len() {
            0 | 1 => 1.0,
            n => times[n - 1] - times[n - 2],
        };
        let x_range = first.as_secs()..last.as_secs() + tail;
        let edges = spectrogram.edges.edges();
        let y_range = edges[0]..edges[edges.len() - 1];

        let max = spectrogram.max_count();
        let norm = if max > 0.0 { max } else { 1.0 };
        debug!(
            "rendering {}x{} spectrogram to {}",
            spectrogram.counts.nrows(),
            spectrogram.counts.ncols(),
            self.path.display()
        );

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(Self::render_error)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(x_range, y_range)
            .map_err(Self::render_error)?;

        let colormap = self.colormap;
        let cells = spectrogram
            .counts
            .indexed_iter()
            .map(move |((row, bin), &count)| {
                let x0 = times[row];
                let x1 = times.get(row + 1).copied().unwrap_or(x0 + tail);
                let color = colormap.apply(count / norm);
                Rectangle::new([(x0, edges[bin]), (x1, edges[bin + 1])], color.filled())
            });
        chart.draw_series(cells).map_err(Self::render_error)?;
        root.present().map_err(Self::render_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meddea_spectrum::{BinEdges, Timestamp, Unit};
    use ndarray::{array, Array2};

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Grayscale.apply(0.0), RGBColor(0, 0, 0));
        assert_eq!(Colormap::Grayscale.apply(1.0), RGBColor(255, 255, 255));
        assert_eq!(Colormap::Hot.apply(0.0), RGBColor(255, 0, 0));
        assert_eq!(Colormap::Hot.apply(1.0), RGBColor(255, 255, 255));
        assert_eq!(Colormap::Viridis.apply(0.0), RGBColor(0, 0, 255));
        assert_eq!(Colormap::Viridis.apply(1.0), RGBColor(255, 255, 0));
    }

    #[test]
    fn test_colormap_clamps() {
        assert_eq!(Colormap::Grayscale.apply(2.0), RGBColor(255, 255, 255));
        assert_eq!(Colormap::Grayscale.apply(-1.0), RGBColor(0, 0, 0));
    }

    #[test]
    fn test_render_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrogram.png");
        let spectrogram = Spectrogram {
            time: vec![Timestamp(0.0), Timestamp(4.0), Timestamp(8.0)],
            edges: BinEdges::new(array![0.0, 8.0, 16.0], Unit::Channel).unwrap(),
            counts: array![[1.0, 2.0], [0.0, 5.0], [3.0, 3.0]],
        };
        let mut renderer = PlottersRenderer {
            path: path.clone(),
            size: (64, 48),
            colormap: Colormap::Viridis,
        };
        renderer.render(&spectrogram).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_render_spectrum_list() {
        let mut packets = meddea_core::PacketBatch::default();
        packets.push(Timestamp(0.0), 100);
        packets.push(Timestamp(1.0), 100);
        let spectra = ndarray::Array3::<u32>::ones((2, 1, 512));
        let pixel_ids = ndarray::arr2(&[[0xCA00u16], [0xCA00]]);
        let list = meddea_spectrum::SpectrumList::new(packets, spectra, pixel_ids)
            .unwrap()
            .into_value();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.png");
        let mut renderer = PlottersRenderer {
            path: path.clone(),
            size: (32, 32),
            colormap: Colormap::Hot,
        };
        list.render_spectrogram(&mut renderer).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_render_empty_spectrogram() {
        let dir = tempfile::tempdir().unwrap();
        let spectrogram = Spectrogram {
            time: Vec::new(),
            edges: BinEdges::summary_spectrum(),
            counts: Array2::zeros((0, 512)),
        };
        let mut renderer = PlottersRenderer {
            path: dir.path().join("empty.png"),
            size: (64, 48),
            colormap: Colormap::Hot,
        };
        assert!(matches!(
            renderer.render(&spectrogram),
            Err(CliError::Render(_))
        ));
    }
}
