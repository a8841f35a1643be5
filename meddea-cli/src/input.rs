//! Loading already-parsed telemetry tables from JSON.
//!
//! The JSON mirrors the serde shape of the core batch types; the `kind`
//! field selects the container.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{info, warn};
use meddea_core::{BinEdges, EventBatch, PacketBatch};
use meddea_spectrum::{PhotonList, SpectrumList};
use ndarray::{Array2, Array3};
use serde::Deserialize;

use crate::Result;

/// Raw JSON document.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InputDocument {
    PhotonList {
        packets: PacketBatch,
        events: EventBatch,
    },
    SpectrumList {
        packets: PacketBatch,
        spectra: Array3<u32>,
        pixel_ids: Array2<u16>,
        #[serde(default)]
        bin_edges: Option<BinEdges>,
    },
}

/// A validated container loaded from disk.
pub enum Loaded {
    Photons(PhotonList),
    Spectra(SpectrumList),
}

/// Reads and validates a JSON input file.
pub fn load(path: &Path) -> Result<Loaded> {
    let reader = BufReader::new(File::open(path)?);
    let document: InputDocument = serde_json::from_reader(reader)?;
    match document {
        InputDocument::PhotonList { packets, events } => {
            let list = PhotonList::new(packets, events)?;
            info!("loaded {} events from {}", list.len(), path.display());
            Ok(Loaded::Photons(list))
        }
        InputDocument::SpectrumList {
            packets,
            spectra,
            pixel_ids,
            bin_edges,
        } => {
            let built = SpectrumList::new(packets, spectra, pixel_ids)?;
            for diagnostic in &built.diagnostics {
                warn!("{}: {diagnostic}", path.display());
            }
            let mut list = built.into_value();
            if let Some(edges) = bin_edges {
                list = list.with_bin_edges(edges)?;
            }
            info!("loaded {} spectra from {}", list.len(), path.display());
            Ok(Loaded::Spectra(list))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliError;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_photon_list() {
        let file = write_temp(
            r#"{
                "kind": "photon_list",
                "packets": {"time": [0.0, 1.0], "length": [100, 120]},
                "events": {
                    "time": [0.2, 0.4, 0.9],
                    "module": [0, 1, 3],
                    "pixel": [0, 5, 11],
                    "atod": [10, 20, 30],
                    "energy": null
                }
            }"#,
        );
        let Loaded::Photons(list) = load(file.path()).unwrap() else {
            panic!("expected a photon list");
        };
        assert_eq!(list.len(), 3);
        assert!(!list.is_calibrated());
        assert_eq!(list.packets().len(), 2);
    }

    #[test]
    fn test_load_rejects_invalid_address() {
        let file = write_temp(
            r#"{
                "kind": "photon_list",
                "packets": {"time": [], "length": []},
                "events": {
                    "time": [0.2],
                    "module": [7],
                    "pixel": [0],
                    "atod": [10],
                    "energy": null
                }
            }"#,
        );
        assert!(matches!(
            load(file.path()),
            Err(CliError::Core(meddea_core::Error::InvalidAddress { .. }))
        ));
    }

    fn spectrum_list_json(bin_edges: &serde_json::Value) -> String {
        let spectra = ndarray::Array3::<u32>::ones((1, 2, 512));
        let pixel_ids = ndarray::arr2(&[[0xCA00u16, 0xCA01]]);
        serde_json::json!({
            "kind": "spectrum_list",
            "packets": {"time": [0.0], "length": [2000]},
            "spectra": spectra,
            "pixel_ids": pixel_ids,
            "bin_edges": bin_edges,
        })
        .to_string()
    }

    #[test]
    fn test_load_spectrum_list_with_energy_edges() {
        let edges: Vec<f64> = (0..=512).map(|i| f64::from(i) * 0.2).collect();
        let file = write_temp(&spectrum_list_json(
            &serde_json::json!({"edges": {"v": 1, "dim": [513], "data": edges}, "unit": "kilo_electron_volt"}),
        ));
        let Loaded::Spectra(list) = load(file.path()).unwrap() else {
            panic!("expected a spectrum list");
        };
        assert!(list.is_calibrated());
        assert_eq!(list.pixel_list().len(), 2);
    }

    #[test]
    fn test_load_rejects_invalid_bin_edges() {
        let descending: Vec<f64> = (0..=512).rev().map(f64::from).collect();
        let file = write_temp(&spectrum_list_json(
            &serde_json::json!({"edges": {"v": 1, "dim": [513], "data": descending}, "unit": "channel"}),
        ));
        assert!(matches!(load(file.path()), Err(CliError::Json(_))));

        let ascending: Vec<f64> = (0..=512).map(f64::from).collect();
        let file = write_temp(&spectrum_list_json(
            &serde_json::json!({"edges": {"v": 1, "dim": [513], "data": ascending}, "unit": "second"}),
        ));
        assert!(matches!(load(file.path()), Err(CliError::Json(_))));

        let file = write_temp(&spectrum_list_json(
            &serde_json::json!({"edges": {"v": 1, "dim": [0], "data": []}, "unit": "channel"}),
        ));
        assert!(matches!(load(file.path()), Err(CliError::Json(_))));
    }

    #[test]
    fn test_load_malformed_json() {
        let file = write_temp("{\"kind\": \"photon_list\"");
        assert!(matches!(load(file.path()), Err(CliError::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("missing.json")),
            Err(CliError::Io(_))
        ));
    }
}
