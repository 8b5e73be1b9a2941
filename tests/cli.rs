// this_file: tests/cli.rs
//! End-to-end seed scenarios (§8 Testable Properties): frame count and
//! determinism, stream order, and crash safety on malformed overrides.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn sample_animation() -> String {
    r#"{
        "v": "5.7.0", "fr": 25, "ip": 0, "op": 50, "w": 512, "h": 512,
        "fonts": {"list": [{"fName": "Arial", "fFamily": "Arial", "fStyle": "Regular"}]},
        "layers": [
            {"nm": "Title", "ty": 5, "t": {"d": {"k": [
                {"s": {"s": 100, "f": "Arial", "t": "A", "sz": [500, 200]}}
            ]}}, "a": [{"a": {"p": {"k": [{"s": [-600, 0, 0]}]}}}]}
        ]
    }"#
    .to_string()
}

#[test]
fn frame_count_and_determinism_across_worker_counts() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("anim.json");
    fs::write(&input, sample_animation()).unwrap();

    let out1 = tmp.path().join("out1");
    Command::cargo_bin("render")
        .unwrap()
        .arg("--workers")
        .arg("1")
        .arg(&input)
        .arg(out1.to_str().unwrap())
        .assert()
        .success();

    let out4 = tmp.path().join("out4");
    Command::cargo_bin("render")
        .unwrap()
        .arg("--workers")
        .arg("4")
        .arg(&input)
        .arg(out4.to_str().unwrap())
        .assert()
        .success();

    for i in 0..50 {
        let name = format!("frame_{i:05}.png");
        let a = fs::read(out1.join(&name)).unwrap_or_else(|_| panic!("missing {name} in out1"));
        let b = fs::read(out4.join(&name)).unwrap_or_else(|_| panic!("missing {name} in out4"));
        assert_eq!(a, b, "frame {name} differs between worker counts");
    }
    assert!(!out1.join("frame_00050.png").exists());
}

#[test]
fn stream_order_matches_file_mode_pixels() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("anim.json");
    fs::write(&input, sample_animation()).unwrap();

    let files_dir = tmp.path().join("files");
    Command::cargo_bin("render")
        .unwrap()
        .arg(&input)
        .arg(files_dir.to_str().unwrap())
        .assert()
        .success();

    let output = Command::cargo_bin("render")
        .unwrap()
        .arg("--stream")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let pngs = split_png_stream(&output.stdout);
    assert_eq!(pngs.len(), 50);

    for (i, png_bytes) in pngs.iter().enumerate() {
        let streamed = image::load_from_memory(png_bytes).unwrap().to_rgba8();
        let file_bytes = fs::read(files_dir.join(format!("frame_{i:05}.png"))).unwrap();
        let from_file = image::load_from_memory(&file_bytes).unwrap().to_rgba8();
        assert_eq!(streamed, from_file, "frame {i} pixels differ between stream and file mode");
    }
}

/// Splits a concatenated PNG byte stream on the PNG signature, since
/// `--stream` writes each frame's encoded bytes back-to-back with no
/// framing (§4.9).
fn split_png_stream(bytes: &[u8]) -> Vec<Vec<u8>> {
    const SIG: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    let mut starts = Vec::new();
    let mut i = 0;
    while i + SIG.len() <= bytes.len() {
        if bytes[i..i + SIG.len()] == SIG {
            starts.push(i);
        }
        i += 1;
    }
    starts
        .windows(2)
        .map(|w| bytes[w[0]..w[1]].to_vec())
        .chain(starts.last().map(|&s| bytes[s..].to_vec()))
        .collect()
}

#[test]
fn crash_safety_on_malformed_overrides() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("anim.json");
    fs::write(&input, sample_animation()).unwrap();
    let overrides = tmp.path().join("overrides.json");
    fs::write(&overrides, r#"{"textLayers": { "Title": { "minSize": }"#).unwrap();

    let out = tmp.path().join("out");
    Command::cargo_bin("render")
        .unwrap()
        .arg("--layer-overrides")
        .arg(&overrides)
        .arg(&input)
        .arg(out.to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("invalid override document"));

    assert!(out.join("frame_00000.png").exists());
    assert!(out.join("frame_00049.png").exists());
}

#[test]
fn unknown_measurement_mode_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("anim.json");
    fs::write(&input, sample_animation()).unwrap();

    Command::cargo_bin("render")
        .unwrap()
        .arg("--text-measurement-mode")
        .arg("bogus")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("text-measurement-mode"));
}
