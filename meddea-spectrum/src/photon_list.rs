//! Photon (event) list container.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, warn};
use meddea_core::{
    BinnedTimeSeries, Error, Event, EventBatch, PacketBatch, Pixel, PixelList, Quantity, Result,
    SpectralRegion, SpectralRegions, Spectrum, Timestamp, Unit,
};

use crate::binning::TimeGrid;
use crate::config::{LightCurveConfig, SpectrumConfig};
use crate::summary::{group_thousands, time_span};

/// Bytes missing from the CCSDS packet length field: the 6-byte primary
/// header plus the field's off-by-one.
pub const PACKET_HEADER_BYTES: u32 = 7;

/// Nominal maximum photon data rate in bytes per second.
pub const MAX_PHOTON_DATA_RATE: f64 = 100_000.0;

/// Photon event list with the headers of the packets that carried it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PhotonList {
    packets: PacketBatch,
    events: EventBatch,
}

impl PhotonList {
    /// Creates a photon list from already parsed packet and event series.
    pub fn new(packets: PacketBatch, events: EventBatch) -> Result<Self> {
        packets.validate()?;
        events.validate()?;
        Ok(Self { packets, events })
    }

    /// Packet header series.
    #[must_use]
    pub fn packets(&self) -> &PacketBatch {
        &self.packets
    }

    /// Event series.
    #[must_use]
    pub fn events(&self) -> &EventBatch {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns event `i`.
    #[must_use]
    pub fn event(&self, i: usize) -> Option<Event> {
        self.events.event(i)
    }

    /// True if the events carry calibrated energies.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.events.is_calibrated()
    }

    /// Packets and events strictly inside `(start, end)`.
    ///
    /// Each series is filtered on its own time column.
    #[must_use]
    pub fn select_time_range(&self, start: Timestamp, end: Timestamp) -> Self {
        Self {
            packets: self.packets.select_time_range(start, end),
            events: self.events.select_time_range(start, end),
        }
    }

    /// Pixels that recorded at least one event, in flat id order.
    ///
    /// Scans every event; not cached, so avoid calling it repeatedly on
    /// large lists.
    #[must_use]
    pub fn present_pixels(&self) -> PixelList {
        let pairs: BTreeSet<(u8, u8)> = self
            .events
            .module
            .iter()
            .copied()
            .zip(self.events.pixel.iter().copied())
            .collect();
        pairs
            .into_iter()
            .filter_map(|(module, pixel)| Pixel::new(module, pixel).ok())
            .collect()
    }

    /// Events recorded by any of the given pixels.
    #[must_use]
    pub fn select_events_for_pixels(&self, pixels: &PixelList) -> EventBatch {
        select_pixels(&self.events, pixels)
    }

    /// Events whose amplitude lies inside the single given region.
    ///
    /// Channel regions select on the raw amplitude, keV regions on the
    /// calibrated energy.
    pub fn select_events_in_region(&self, regions: &SpectralRegions) -> Result<EventBatch> {
        let region = regions.single()?;
        let rows = region_rows(&self.events, region)?;
        Ok(self.events.take(&rows))
    }

    /// Histogram of the events from the given pixels.
    ///
    /// Counts carry `sqrt(N)` uncertainties; the spectrum is reported at
    /// bin centers. `baseline_subtract` is accepted but not applied.
    pub fn spectrum(&self, pixels: &PixelList, config: &SpectrumConfig) -> Result<Spectrum> {
        if config.calibrate && !self.is_calibrated() {
            return Err(Error::NotCalibrated);
        }
        let edges = config.resolve_edges()?;
        if config.baseline_subtract {
            debug!("baseline subtraction requested but not applied");
        }
        let selected = self.select_events_for_pixels(pixels);
        let counts = match (&selected.energy, config.calibrate) {
            (Some(energy), true) => edges.histogram(energy.iter().copied()),
            _ => edges.histogram(selected.atod.iter().map(|&a| f64::from(a))),
        };
        #[allow(clippy::cast_precision_loss)]
        let counts = counts.mapv(|c| c as f64);
        Spectrum::from_counts(edges, counts)
    }

    /// Binned count light curve, one column per spectral region.
    ///
    /// All columns share one time grid anchored on the first event. Within
    /// each region only every `stride`-th event is counted and the counts
    /// are multiplied by `stride`.
    pub fn lightcurve(
        &self,
        pixels: &PixelList,
        regions: &SpectralRegions,
        config: &LightCurveConfig,
    ) -> Result<BinnedTimeSeries> {
        if regions.is_empty() {
            return Err(Error::InvalidParameter(
                "light curve needs at least one spectral region".to_string(),
            ));
        }
        let (Some(&first), Some(&last)) = (self.events.time.first(), self.events.time.last())
        else {
            return Err(Error::EmptySeries("event"));
        };
        let grid = TimeGrid::covering(first, last, config.integration_time)?;
        let selected = self.select_events_for_pixels(pixels);

        let mut lc = BinnedTimeSeries::new(grid.starts(), Some(grid.width()))?;
        #[allow(clippy::cast_precision_loss)]
        let scale = config.stride as f64;
        for region in regions.iter() {
            let rows = region_rows(&selected, region)?;
            let counts = grid.accumulate(
                rows.iter()
                    .step_by(config.stride)
                    .map(|&i| (selected.time[i], 1.0)),
            );
            lc.push_column(region.label(), Unit::Count, counts * scale)?;
        }
        Ok(lc)
    }

    /// Telemetry data rate in bytes per second, in 1 s bins.
    ///
    /// The first packet only anchors time and is excluded, as its timestamp
    /// is unreliable.
    pub fn data_rate(&self) -> Result<BinnedTimeSeries> {
        let Some(&anchor) = self.packets.time.first() else {
            return Err(Error::EmptySeries("packet"));
        };
        let good: Vec<usize> = (0..self.packets.len())
            .filter(|&i| self.packets.time[i] > anchor)
            .collect();
        let bin_size = Quantity::seconds(1.0);

        let (Some(&first), Some(&last)) = (good.first(), good.last()) else {
            let mut rate = BinnedTimeSeries::new(Vec::new(), Some(bin_size))?;
            rate.push_column("data_rate", Unit::BytePerSecond, ndarray::Array1::zeros(0))?;
            return Ok(rate);
        };
        let grid = TimeGrid::covering(self.packets.time[first], self.packets.time[last], bin_size)?;
        let bytes = grid.accumulate(good.iter().map(|&i| {
            let size = u32::from(self.packets.length[i]) + PACKET_HEADER_BYTES;
            (self.packets.time[i], f64::from(size))
        }));
        let per_second = bytes / bin_size.value();

        if let Some(peak) = per_second.iter().copied().reduce(f64::max) {
            if peak > MAX_PHOTON_DATA_RATE {
                warn!(
                    "data rate peaks at {peak} B/s, above the nominal {MAX_PHOTON_DATA_RATE} B/s"
                );
            }
        }

        let mut rate = BinnedTimeSeries::new(grid.starts(), Some(bin_size))?;
        rate.push_column("data_rate", Unit::BytePerSecond, per_second)?;
        Ok(rate)
    }
}

impl fmt::Display for PhotonList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PhotonList ({} events)",
            group_thousands(self.events.len() as u64)
        )?;
        if let Some(span) = time_span(&self.events.time) {
            writeln!(f, "{span}")?;
        }
        Ok(())
    }
}

fn select_pixels(events: &EventBatch, pixels: &PixelList) -> EventBatch {
    let wanted: BTreeSet<(u8, u8)> = pixels.iter().map(|p| (p.module(), p.pixel())).collect();
    events.filter(|i| wanted.contains(&(events.module[i], events.pixel[i])))
}

fn region_rows(events: &EventBatch, region: &SpectralRegion) -> Result<Vec<usize>> {
    match region.unit() {
        Unit::Channel => Ok((0..events.len())
            .filter(|&i| region.contains_value(f64::from(events.atod[i])))
            .collect()),
        Unit::KiloElectronVolt => {
            let energy = events.energy.as_ref().ok_or(Error::NotCalibrated)?;
            Ok((0..events.len())
                .filter(|&i| region.contains_value(energy[i]))
                .collect())
        }
        other => Err(Error::UnsupportedUnit {
            found: other,
            expected: "chan or keV",
        }),
    }
}
