use super::*;

#[test]
fn supported_languages_match_deck_options() {
    for code in ["en", "es", "fr", "de"] {
        assert!(is_supported_language(code));
    }
    for code in ["xx", "EN", "", "en-US"] {
        assert!(!is_supported_language(code));
    }
}

#[test]
fn factory_picks_backend() {
    let espeak = create_engine(TtsBackendKind::Espeak);
    assert_eq!(espeak.name(), "espeak-ng");
    assert_eq!(espeak.file_extension(), "wav");

    let gtts = create_engine(TtsBackendKind::Gtts);
    assert_eq!(gtts.name(), "gtts");
    assert_eq!(gtts.file_extension(), "mp3");
    assert!(gtts.supports("fr"));
    assert!(!gtts.supports("zz"));
}

#[test]
fn missing_backend_binary_is_synthesis_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EspeakEngine::with_program("leaps-definitely-missing-tts-binary");
    let err = engine
        .synthesize_to_file("hello", "en", &dir.path().join("a.wav"))
        .unwrap_err();
    assert!(matches!(err, LeapsError::Synthesis(_)));
    assert!(err.to_string().starts_with("synthesis error: failed to start"));
}

#[cfg(unix)]
#[test]
fn failing_backend_reports_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let engine = GttsEngine::with_program("false");
    let err = engine
        .synthesize_to_file("hello", "en", &dir.path().join("a.mp3"))
        .unwrap_err();
    assert!(matches!(err, LeapsError::Synthesis(_)));
    assert!(err.to_string().contains("exited with status"));
}

#[test]
fn backend_kind_parses_from_snake_case() {
    let kind: TtsBackendKind = serde_json::from_str("\"gtts\"").unwrap();
    assert_eq!(kind, TtsBackendKind::Gtts);
    assert_eq!(TtsBackendKind::default(), TtsBackendKind::Espeak);
}
