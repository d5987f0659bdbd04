use std::path::Path;

use super::*;

/// Writes `seconds` of silence as 16 kHz mono WAV.
struct FakeEngine {
    seconds: f64,
}

impl SpeechEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn file_extension(&self) -> &str {
        "wav"
    }

    fn synthesize_to_file(&self, _text: &str, _language: &str, out_path: &Path) -> LeapsResult<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(out_path, spec).unwrap();
        for _ in 0..(self.seconds * 16_000.0).round() as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
        Ok(())
    }
}

struct RejectingEngine;

impl SpeechEngine for RejectingEngine {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn file_extension(&self) -> &str {
        "wav"
    }

    fn synthesize_to_file(&self, _: &str, _: &str, _: &Path) -> LeapsResult<()> {
        Err(LeapsError::synthesis("backend rejected text"))
    }
}

#[test]
fn duration_is_measured_from_audio() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path());
    let asset = synthesize(&FakeEngine { seconds: 2.1 }, "Hello", "en", &mut temps).unwrap();

    assert!((asset.duration_sec - 2.1).abs() < 1e-9);
    assert!(asset.path.exists());
    assert_eq!(temps.tracked(), &[asset.path.clone()]);
}

#[test]
fn empty_text_is_passed_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path());
    let asset = synthesize(&FakeEngine { seconds: 0.0 }, "", "de", &mut temps).unwrap();
    assert_eq!(asset.duration_sec, 0.0);
}

#[test]
fn unsupported_language_allocates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path());
    let err = synthesize(&FakeEngine { seconds: 1.0 }, "Hola", "xx", &mut temps).unwrap_err();

    assert!(matches!(err, LeapsError::Synthesis(_)));
    assert!(err.to_string().contains("'xx'"));
    assert!(temps.tracked().is_empty());
}

#[test]
fn backend_failure_still_tracks_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path());
    let err = synthesize(&RejectingEngine, "x", "en", &mut temps).unwrap_err();
    assert!(matches!(err, LeapsError::Synthesis(_)));
    assert_eq!(temps.tracked().len(), 1);

    temps.cleanup();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
