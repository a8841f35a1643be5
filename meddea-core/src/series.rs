//! Columnar event and packet series.
//!
//! Both series store their rows as parallel vectors (`SoA` layout), the
//! shape in which upstream parsers hand telemetry tables over. Rows are
//! ordered by time; [`EventBatch::validate`] and [`PacketBatch::validate`]
//! check that before a container accepts them.

use std::fmt;

use crate::error::{Error, Result};
use crate::pixel::{self, Pixel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mission-clock time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub f64);

impl Timestamp {
    #[inline]
    #[must_use]
    pub fn new(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Returns the raw seconds value.
    #[inline]
    #[must_use]
    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// Signed difference `self - earlier` in seconds.
    #[inline]
    #[must_use]
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }

    /// Returns true if the timestamp lies strictly inside `(start, end)`.
    #[inline]
    #[must_use]
    pub fn is_between(&self, start: Timestamp, end: Timestamp) -> bool {
        self.0 > start.0 && self.0 < end.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} s", self.0)
    }
}

fn check_time_order(series: &'static str, time: &[Timestamp]) -> Result<()> {
    if let Some(row) = time.iter().position(|t| !t.0.is_finite()) {
        return Err(Error::NonFiniteTime { series, row });
    }
    match time.windows(2).position(|w| w[1] < w[0]) {
        Some(row) => Err(Error::Unsorted {
            series,
            row: row + 1,
        }),
        None => Ok(()),
    }
}

fn check_len(column: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            column,
            expected,
            actual,
        })
    }
}

/// One detected photon.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    pub time: Timestamp,
    pub pixel: Pixel,
    /// Raw pulse height in ADC channels.
    pub atod: u16,
    /// Calibrated energy in keV, when available.
    pub energy: Option<f64>,
}

/// Photon events stored in `SoA` format.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventBatch {
    /// Arrival time of each photon.
    pub time: Vec<Timestamp>,
    /// Module (ASIC) index of each photon.
    pub module: Vec<u8>,
    /// Pixel index within the module.
    pub pixel: Vec<u8>,
    /// Raw pulse height in ADC channels.
    pub atod: Vec<u16>,
    /// Calibrated energy in keV. `None` for uncalibrated lists.
    pub energy: Option<Vec<f64>>,
}

impl EventBatch {
    /// Creates an empty batch with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize, calibrated: bool) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            module: Vec::with_capacity(capacity),
            pixel: Vec::with_capacity(capacity),
            atod: Vec::with_capacity(capacity),
            energy: calibrated.then(|| Vec::with_capacity(capacity)),
        }
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns true if the batch holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Returns true if calibrated energies are present.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.energy.is_some()
    }

    /// Appends one event.
    ///
    /// `energy` must be given exactly when the batch is calibrated.
    pub fn push(
        &mut self,
        time: Timestamp,
        module: u8,
        pixel: u8,
        atod: u16,
        energy: Option<f64>,
    ) -> Result<()> {
        pixel::encode(module, pixel)?;
        match (&mut self.energy, energy) {
            (Some(column), Some(value)) => column.push(value),
            (None, None) => {}
            (Some(_), None) => {
                return Err(Error::InvalidParameter(
                    "calibrated batch requires an energy".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(Error::InvalidParameter(
                    "uncalibrated batch cannot store an energy".to_string(),
                ))
            }
        }
        self.time.push(time);
        self.module.push(module);
        self.pixel.push(pixel);
        self.atod.push(atod);
        Ok(())
    }

    /// Returns the pixel address of row `i`.
    ///
    /// Rows are validated on construction, so an address that fails to
    /// encode only appears in batches that skipped [`EventBatch::validate`].
    pub fn pixel_at(&self, i: usize) -> Result<Pixel> {
        Pixel::new(self.module[i], self.pixel[i])
    }

    /// Returns row `i` as an [`Event`].
    #[must_use]
    pub fn event(&self, i: usize) -> Option<Event> {
        if i >= self.len() {
            return None;
        }
        Some(Event {
            time: self.time[i],
            pixel: self.pixel_at(i).ok()?,
            atod: self.atod[i],
            energy: self.energy.as_ref().map(|e| e[i]),
        })
    }

    /// Checks column lengths, pixel addresses and time order.
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        check_len("module", n, self.module.len())?;
        check_len("pixel", n, self.pixel.len())?;
        check_len("atod", n, self.atod.len())?;
        if let Some(energy) = &self.energy {
            check_len("energy", n, energy.len())?;
        }
        for (&module, &pixel) in self.module.iter().zip(&self.pixel) {
            pixel::encode(module, pixel)?;
        }
        check_time_order("event", &self.time)
    }

    /// Returns the rows for which `keep(row)` is true, in order.
    #[must_use]
    pub fn filter(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        self.take(&rows)
    }

    /// Returns the given rows, in the given order.
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            time: rows.iter().map(|&i| self.time[i]).collect(),
            module: rows.iter().map(|&i| self.module[i]).collect(),
            pixel: rows.iter().map(|&i| self.pixel[i]).collect(),
            atod: rows.iter().map(|&i| self.atod[i]).collect(),
            energy: self
                .energy
                .as_ref()
                .map(|e| rows.iter().map(|&i| e[i]).collect()),
        }
    }

    /// Rows strictly inside `(start, end)`.
    #[must_use]
    pub fn select_time_range(&self, start: Timestamp, end: Timestamp) -> Self {
        self.filter(|i| self.time[i].is_between(start, end))
    }
}

/// Telemetry packet headers stored in `SoA` format.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PacketBatch {
    /// Packet time.
    pub time: Vec<Timestamp>,
    /// Raw CCSDS packet length field.
    pub length: Vec<u16>,
}

impl PacketBatch {
    /// Creates an empty batch with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            length: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Appends one packet header.
    pub fn push(&mut self, time: Timestamp, length: u16) {
        self.time.push(time);
        self.length.push(length);
    }

    /// Checks column lengths and time order.
    pub fn validate(&self) -> Result<()> {
        check_len("length", self.len(), self.length.len())?;
        check_time_order("packet", &self.time)
    }

    /// Returns the given rows, in the given order.
    #[must_use]
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            time: rows.iter().map(|&i| self.time[i]).collect(),
            length: rows.iter().map(|&i| self.length[i]).collect(),
        }
    }

    /// Indices of rows strictly inside `(start, end)`.
    #[must_use]
    pub fn rows_between(&self, start: Timestamp, end: Timestamp) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.time[i].is_between(start, end))
            .collect()
    }

    /// Rows strictly inside `(start, end)`.
    #[must_use]
    pub fn select_time_range(&self, start: Timestamp, end: Timestamp) -> Self {
        self.take(&self.rows_between(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> EventBatch {
        let mut batch = EventBatch::with_capacity(4, false);
        batch.push(Timestamp(1.0), 0, 1, 100, None).unwrap();
        batch.push(Timestamp(2.0), 1, 2, 200, None).unwrap();
        batch.push(Timestamp(3.0), 2, 3, 300, None).unwrap();
        batch.push(Timestamp(4.0), 3, 4, 400, None).unwrap();
        batch
    }

    #[test]
    fn test_event_batch_push() {
        let batch = sample_events();
        assert_eq!(batch.len(), 4);
        assert!(!batch.is_calibrated());
        assert!(batch.validate().is_ok());

        let event = batch.event(1).unwrap();
        assert_eq!(event.pixel, Pixel::new(1, 2).unwrap());
        assert_eq!(event.atod, 200);
        assert_eq!(event.energy, None);
        assert!(batch.event(4).is_none());
    }

    #[test]
    fn test_push_rejects_bad_rows() {
        let mut batch = EventBatch::with_capacity(1, true);
        assert!(matches!(
            batch.push(Timestamp(0.0), 4, 0, 1, Some(1.0)),
            Err(Error::InvalidAddress { .. })
        ));
        assert!(batch.push(Timestamp(0.0), 0, 0, 1, None).is_err());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_time_range_is_open() {
        let batch = sample_events();
        let sliced = batch.select_time_range(Timestamp(1.0), Timestamp(4.0));
        assert_eq!(sliced.time, vec![Timestamp(2.0), Timestamp(3.0)]);
        assert_eq!(sliced.atod, vec![200, 300]);
    }

    #[test]
    fn test_validate_detects_problems() {
        let mut batch = sample_events();
        batch.time.swap(0, 1);
        assert_eq!(
            batch.validate(),
            Err(Error::Unsorted {
                series: "event",
                row: 1
            })
        );

        let mut batch = sample_events();
        batch.atod.pop();
        assert!(matches!(
            batch.validate(),
            Err(Error::LengthMismatch { column: "atod", .. })
        ));

        let mut batch = sample_events();
        batch.pixel[2] = 12;
        assert!(matches!(
            batch.validate(),
            Err(Error::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_times() {
        let mut batch = sample_events();
        batch.time[0] = Timestamp(f64::NEG_INFINITY);
        assert_eq!(
            batch.validate(),
            Err(Error::NonFiniteTime {
                series: "event",
                row: 0
            })
        );

        let mut packets = PacketBatch::default();
        packets.push(Timestamp(0.0), 10);
        packets.push(Timestamp(f64::INFINITY), 10);
        assert_eq!(
            packets.validate(),
            Err(Error::NonFiniteTime {
                series: "packet",
                row: 1
            })
        );

        let mut packets = PacketBatch::default();
        packets.push(Timestamp(f64::NAN), 10);
        assert!(matches!(
            packets.validate(),
            Err(Error::NonFiniteTime { row: 0, .. })
        ));
    }

    #[test]
    fn test_packet_batch() {
        let mut packets = PacketBatch::with_capacity(3);
        packets.push(Timestamp(0.0), 10);
        packets.push(Timestamp(1.0), 20);
        packets.push(Timestamp(2.0), 30);
        assert!(packets.validate().is_ok());
        assert_eq!(packets.rows_between(Timestamp(0.0), Timestamp(2.5)), vec![1, 2]);
        assert_eq!(
            packets.select_time_range(Timestamp(0.5), Timestamp(1.5)).length,
            vec![20]
        );
    }
}
