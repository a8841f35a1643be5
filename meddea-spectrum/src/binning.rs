//! Fixed-width time binning.

use meddea_core::{Error, Quantity, Result, Timestamp, Unit};
use ndarray::Array1;

/// Upper bound on the number of bins in one grid.
pub const MAX_TIME_BINS: usize = 100_000_000;

/// Contiguous time bins `[start + i·width, start + (i+1)·width)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    start: Timestamp,
    width: f64,
    n_bins: usize,
}

impl TimeGrid {
    /// Bins of `width` starting at `first`, extended until `last` is covered.
    pub fn covering(first: Timestamp, last: Timestamp, width: Quantity) -> Result<Self> {
        let width = width.value_in(Unit::Second)?;
        if !(width > 0.0 && width.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "time bin width must be positive, got {width} s"
            )));
        }
        let span = last.seconds_since(first).max(0.0);
        let full_bins = (span / width).floor();
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_TIME_BINS as f64;
        if !full_bins.is_finite() || full_bins >= limit {
            return Err(Error::InvalidParameter(format!(
                "{span} s in {width} s bins exceeds {MAX_TIME_BINS} bins"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_bins = full_bins as usize + 1;
        Ok(Self {
            start: first,
            width,
            n_bins,
        })
    }

    /// Number of bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Bin width as a quantity in seconds.
    #[must_use]
    pub fn width(&self) -> Quantity {
        Quantity::seconds(self.width)
    }

    /// Bin holding `time`, if any.
    #[must_use]
    pub fn bin_of(&self, time: Timestamp) -> Option<usize> {
        let offset = time.seconds_since(self.start);
        if !(offset >= 0.0) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = (offset / self.width).floor() as usize;
        (bin < self.n_bins).then_some(bin)
    }

    /// Start time of every bin.
    #[must_use]
    pub fn starts(&self) -> Vec<Timestamp> {
        #[allow(clippy::cast_precision_loss)]
        (0..self.n_bins)
            .map(|i| Timestamp(self.start.as_secs() + self.width * i as f64))
            .collect()
    }

    /// Sums `(time, weight)` samples into the bins; samples outside are dropped.
    pub fn accumulate(&self, samples: impl IntoIterator<Item = (Timestamp, f64)>) -> Array1<f64> {
        let mut sums = Array1::<f64>::zeros(self.n_bins);
        for (time, weight) in samples {
            if let Some(bin) = self.bin_of(time) {
                sums[bin] += weight;
            }
        }
        sums
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_covers_last_sample() {
        let grid =
            TimeGrid::covering(Timestamp(1.0), Timestamp(10.0), Quantity::seconds(1.0)).unwrap();
        assert_eq!(grid.n_bins(), 10);
        assert_eq!(grid.bin_of(Timestamp(10.0)), Some(9));
        assert_eq!(grid.bin_of(Timestamp(0.5)), None);
        assert_relative_eq!(grid.starts()[3].as_secs(), 4.0);
    }

    #[test]
    fn test_accumulate() {
        let grid =
            TimeGrid::covering(Timestamp(0.0), Timestamp(2.5), Quantity::seconds(1.0)).unwrap();
        let sums = grid.accumulate([
            (Timestamp(0.1), 1.0),
            (Timestamp(0.9), 2.0),
            (Timestamp(2.2), 5.0),
            (Timestamp(7.0), 100.0),
        ]);
        assert_eq!(sums.to_vec(), vec![3.0, 0.0, 5.0]);
    }

    #[test]
    fn test_too_many_bins() {
        assert!(matches!(
            TimeGrid::covering(Timestamp(0.0), Timestamp(1000.0), Quantity::seconds(1e-300)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            TimeGrid::covering(Timestamp(0.0), Timestamp(f64::INFINITY), Quantity::seconds(1.0)),
            Err(Error::InvalidParameter(_))
        ));
        let grid =
            TimeGrid::covering(Timestamp(0.0), Timestamp(99.5), Quantity::seconds(1.0)).unwrap();
        assert_eq!(grid.n_bins(), 100);
    }

    #[test]
    fn test_invalid_width() {
        assert!(TimeGrid::covering(Timestamp(0.0), Timestamp(1.0), Quantity::seconds(0.0)).is_err());
        assert!(matches!(
            TimeGrid::covering(Timestamp(0.0), Timestamp(1.0), Quantity::kev(1.0)),
            Err(Error::UnsupportedUnit { .. })
        ));
    }
}
