//! End-to-end runs of the `meddea` binary.

use std::io::Write;
use std::process::Command;

const PHOTONS: &str = r#"{
    "kind": "photon_list",
    "packets": {"time": [0.0, 1.0, 2.0, 3.0], "length": [93, 93, 193, 93]},
    "events": {
        "time": [0.1, 0.5, 1.2, 1.7, 2.4, 3.9],
        "module": [0, 0, 1, 2, 3, 3],
        "pixel": [0, 1, 5, 8, 11, 11],
        "atod": [5, 15, 25, 35, 45, 55],
        "energy": null
    }
}"#;

fn input_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn meddea(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_meddea"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn info_reports_event_count() {
    let file = input_file(PHOTONS);
    let output = meddea(&["info", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("PhotonList (6 events)"));
}

#[test]
fn data_rate_skips_first_packet() {
    let file = input_file(PHOTONS);
    let output = meddea(&["data-rate", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "time_s,data_rate [B/s]");
    assert_eq!(&lines[1..], ["1,100", "2,200", "3,100"]);
}

#[test]
fn lightcurve_counts_each_region() {
    let file = input_file(PHOTONS);
    let output = meddea(&[
        "lightcurve",
        file.path().to_str().unwrap(),
        "--region",
        "0:30",
        "--region",
        "30:60",
        "--stride",
        "1",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    let totals = lines[1..].iter().fold((0.0, 0.0), |(a, b), line| {
        let fields: Vec<f64> = line.split(',').map(|v| v.parse().unwrap()).collect();
        (a + fields[1], b + fields[2])
    });
    assert_eq!(totals, (3.0, 3.0));
}

#[test]
fn spectrogram_of_photon_list_fails() {
    let file = input_file(PHOTONS);
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("out.png");
    let output = meddea(&[
        "spectrogram",
        file.path().to_str().unwrap(),
        "--output",
        png.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(!png.exists());
}
