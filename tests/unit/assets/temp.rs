use super::*;

#[test]
fn allocate_creates_tracked_files_with_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path());

    let a = temps.allocate("leaps_voice_", ".wav").unwrap();
    let b = temps.allocate("leaps_voice_", ".wav").unwrap();
    assert_ne!(a, b);
    assert!(a.exists() && b.exists());
    assert!(a.to_string_lossy().ends_with(".wav"));
    assert_eq!(temps.tracked().len(), 2);

    assert_eq!(temps.cleanup(), 2);
    assert!(!a.exists() && !b.exists());
    assert!(temps.tracked().is_empty());
}

#[test]
fn drop_releases_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = {
        let mut temps = TempAssetManager::in_dir(dir.path());
        temps.allocate("x_", ".mp3").unwrap()
    };
    assert!(!path.exists());
}

#[test]
fn cleanup_ignores_files_already_gone() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path());
    let path = temps.allocate("gone_", ".wav").unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(temps.cleanup(), 0);
}

#[test]
fn allocate_in_missing_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempAssetManager::in_dir(dir.path().join("nope"));
    assert!(temps.allocate("x_", ".wav").is_err());
}
