//! Configuration for photon-list spectra and light curves.

use meddea_core::{BinEdges, Error, Quantity, Result, Unit};

/// Default event subsampling stride for photon-list light curves.
pub const DEFAULT_LIGHTCURVE_STRIDE: usize = 10;

/// Configuration for [`crate::PhotonList::spectrum`].
#[derive(Debug, Clone, Default)]
pub struct SpectrumConfig {
    /// Histogram bin edges. `None` selects unit-width channel bins, or
    /// 0.1 keV bins up to 100 keV when calibrated.
    pub bin_edges: Option<BinEdges>,
    /// Subtract baseline measurements. Accepted but currently has no effect.
    pub baseline_subtract: bool,
    /// Histogram calibrated energies instead of raw channels.
    pub calibrate: bool,
}

impl SpectrumConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets explicit bin edges.
    #[must_use]
    pub fn with_bin_edges(mut self, edges: BinEdges) -> Self {
        self.bin_edges = Some(edges);
        self
    }

    /// Requests baseline subtraction.
    #[must_use]
    pub fn with_baseline_subtract(mut self, enabled: bool) -> Self {
        self.baseline_subtract = enabled;
        self
    }

    /// Histograms calibrated energies.
    #[must_use]
    pub fn calibrated(mut self) -> Self {
        self.calibrate = true;
        self
    }

    /// Bin edges to histogram into, checked against the selected field.
    pub(crate) fn resolve_edges(&self) -> Result<BinEdges> {
        let field_unit = if self.calibrate {
            Unit::KiloElectronVolt
        } else {
            Unit::Channel
        };
        match &self.bin_edges {
            Some(edges) if edges.unit() != field_unit => Err(Error::UnsupportedUnit {
                found: edges.unit(),
                expected: field_unit.symbol(),
            }),
            Some(edges) => Ok(edges.clone()),
            None if self.calibrate => Ok(BinEdges::default_energy()),
            None => Ok(BinEdges::raw_channels()),
        }
    }
}

/// Configuration for [`crate::PhotonList::lightcurve`].
#[derive(Debug, Clone, PartialEq)]
pub struct LightCurveConfig {
    /// Width of each time bin.
    pub integration_time: Quantity,
    /// Only every `stride`-th selected event is counted; counts are scaled
    /// back up by `stride`.
    pub stride: usize,
}

impl LightCurveConfig {
    /// Creates a configuration for the given integration time.
    pub fn new(integration_time: Quantity) -> Result<Self> {
        let seconds = integration_time.value_in(Unit::Second)?;
        if !(seconds > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "integration time must be positive, got {integration_time}"
            )));
        }
        Ok(Self {
            integration_time,
            stride: DEFAULT_LIGHTCURVE_STRIDE,
        })
    }

    /// Sets the subsampling stride.
    pub fn with_stride(mut self, stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(Error::InvalidParameter(
                "stride must be at least 1".to_string(),
            ));
        }
        self.stride = stride;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_config_defaults() {
        let config = SpectrumConfig::new();
        assert_eq!(config.resolve_edges().unwrap(), BinEdges::raw_channels());
        let config = SpectrumConfig::new().calibrated();
        assert_eq!(config.resolve_edges().unwrap(), BinEdges::default_energy());
    }

    #[test]
    fn test_spectrum_config_unit_mismatch() {
        let config = SpectrumConfig::new()
            .with_bin_edges(BinEdges::default_energy())
            .with_baseline_subtract(true);
        assert!(matches!(
            config.resolve_edges(),
            Err(Error::UnsupportedUnit { .. })
        ));
    }

    #[test]
    fn test_lightcurve_config() {
        let config = LightCurveConfig::new(Quantity::seconds(2.0)).unwrap();
        assert_eq!(config.stride, DEFAULT_LIGHTCURVE_STRIDE);
        assert_eq!(config.clone().with_stride(1).unwrap().stride, 1);
        assert!(config.with_stride(0).is_err());
        assert!(LightCurveConfig::new(Quantity::seconds(-1.0)).is_err());
        assert!(LightCurveConfig::new(Quantity::bytes(1.0)).is_err());
    }
}
