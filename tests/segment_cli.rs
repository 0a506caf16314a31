use std::f32::consts::PI;
use std::fs;
use std::path::Path;
use std::process::Command;

use cough_detector::audio::{read_audio, write_wav, Waveform};

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_segment_cough"))
}

/// Two 0.3 s tone bursts in two seconds of silence
fn two_bursts(sample_rate: u32) -> Waveform {
    let samples = (0..2 * sample_rate as usize)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            if (0.2..0.5).contains(&t) || (1.0..1.3).contains(&t) {
                0.9 * (2.0 * PI * 1_000.0 * t).sin()
            } else {
                0.0
            }
        })
        .collect();
    Waveform::new(samples, sample_rate).unwrap()
}

fn write_recording(root: &Path, date: &str, participant: &str, name: &str, wave: &Waveform) {
    let folder = root.join(date).join(participant);
    fs::create_dir_all(&folder).unwrap();
    write_wav(&folder.join(name), wave).unwrap();
}

#[test]
fn segments_each_participant_into_numbered_files() {
    let workspace = tempfile::tempdir().unwrap();
    let root = workspace.path().join("recordings");
    let output_dir = workspace.path().join("segmented_coughs");
    write_recording(&root, "2024-01-01", "alice", "cough-heavy.wav", &two_bursts(16_000));
    fs::create_dir_all(root.join("2024-01-01").join("bob")).unwrap();

    let output = cli()
        .args(["-i", root.to_str().unwrap(), "-o", output_dir.to_str().unwrap()])
        .output()
        .expect("run segment_cough");

    assert!(
        output.status.success(),
        "segment_cough exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let alice = output_dir.join("alice");
    assert!(alice.join("cough-1.wav").exists());
    assert!(alice.join("cough-2.wav").exists());
    assert!(!alice.join("cough-3.wav").exists());
    assert!(!output_dir.join("bob").exists());
    assert!(!output_dir.join("2024-01-01").exists());
}

#[test]
fn resamples_to_requested_rate() {
    let workspace = tempfile::tempdir().unwrap();
    let root = workspace.path().join("recordings");
    let output_dir = workspace.path().join("out");
    write_recording(&root, "2024-02-01", "dave", "cough-heavy.wav", &two_bursts(48_000));

    let output = cli()
        .args([
            "--input_dir",
            root.to_str().unwrap(),
            "--output_dir",
            output_dir.to_str().unwrap(),
            "--fs",
            "16000",
        ])
        .output()
        .expect("run segment_cough");
    assert!(output.status.success());

    for name in ["cough-1.wav", "cough-2.wav"] {
        let clip = read_audio(&output_dir.join("dave").join(name)).unwrap();
        assert_eq!(clip.sample_rate(), 16_000);
        assert!(clip.duration_secs() > 0.2, "{} is {} s", name, clip.duration_secs());
    }
}

#[test]
fn custom_filename_is_honored() {
    let workspace = tempfile::tempdir().unwrap();
    let root = workspace.path().join("recordings");
    let output_dir = workspace.path().join("out");
    write_recording(&root, "2024-03-01", "erin", "cough-shallow.wav", &two_bursts(16_000));
    write_recording(&root, "2024-03-01", "frank", "cough-heavy.wav", &two_bursts(16_000));

    let output = cli()
        .args([
            "-i",
            root.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "-f",
            "cough-shallow.wav",
        ])
        .output()
        .expect("run segment_cough");
    assert!(output.status.success());

    assert!(output_dir.join("erin").join("cough-1.wav").exists());
    assert!(!output_dir.join("frank").exists());
}

#[test]
fn missing_input_dir_exits_with_error() {
    let workspace = tempfile::tempdir().unwrap();
    let missing = workspace.path().join("does-not-exist");

    let output = cli()
        .args(["-i", missing.to_str().unwrap()])
        .current_dir(workspace.path())
        .output()
        .expect("run segment_cough");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Input directory not found"),
        "unexpected stderr: {stderr}"
    );
    assert!(!workspace.path().join("segmented_coughs").exists());
}

#[test]
fn default_output_dir_is_segmented_coughs() {
    let workspace = tempfile::tempdir().unwrap();
    let root = workspace.path().join("recordings");
    write_recording(&root, "2024-01-01", "alice", "cough-heavy.wav", &two_bursts(16_000));
    fs::create_dir_all(root.join("2024-01-01").join("bob")).unwrap();

    let output = cli()
        .args(["-i", root.to_str().unwrap()])
        .current_dir(workspace.path())
        .output()
        .expect("run segment_cough");
    assert!(
        output.status.success(),
        "segment_cough exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let output_dir = workspace.path().join("segmented_coughs");
    assert!(output_dir.join("alice").join("cough-1.wav").exists());
    assert!(output_dir.join("alice").join("cough-2.wav").exists());
    assert!(!output_dir.join("bob").exists());
}

#[test]
fn single_dash_fs_sets_output_rate() {
    let workspace = tempfile::tempdir().unwrap();
    let root = workspace.path().join("recordings");
    let output_dir = workspace.path().join("out");
    write_recording(&root, "2024-04-01", "gina", "cough-heavy.wav", &two_bursts(48_000));

    let output = cli()
        .args([
            "-i",
            root.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "-fs",
            "16000",
        ])
        .output()
        .expect("run segment_cough");
    assert!(
        output.status.success(),
        "segment_cough exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let clip = read_audio(&output_dir.join("gina").join("cough-1.wav")).unwrap();
    assert_eq!(clip.sample_rate(), 16_000);
}
