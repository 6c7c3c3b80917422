use crate::settings::manager::SettingsManager;
use crate::settings::{FsSettings, Settings};
use tempfile::TempDir;

#[test]
fn test_missing_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("nested").join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(settings_path.exists());
    assert_eq!(manager.settings(), Settings::default());
    assert_eq!(manager.path(), settings_path.as_path());
}

#[test]
fn test_reads_fs_table() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &settings_path,
        r#"
[fs]
base_path = "/inst"
cd_path = "/mnt/cdrom"
game = "mygame"
"#,
    )
    .unwrap();

    let manager = SettingsManager::from_path(settings_path).unwrap();

    assert_eq!(
        manager.settings().fs,
        FsSettings {
            base_path: Some("/inst".to_string()),
            cd_path: Some("/mnt/cdrom".to_string()),
            game: "mygame".to_string(),
        }
    );
}

#[test]
fn test_corrupt_file_is_backed_up() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "[fs\nbase_path = ").unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert_eq!(manager.settings(), Settings::default());
    let backup = temp_dir.path().join("settings.toml.backup");
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "[fs\nbase_path = "
    );
    let rewritten: Settings =
        toml::from_str(&std::fs::read_to_string(&settings_path).unwrap()).unwrap();
    assert_eq!(rewritten, Settings::default());
}

#[test]
fn test_update_is_in_memory_until_saved() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    manager.update_setting(|settings| settings.fs.game = "mygame".to_string());
    assert_eq!(manager.settings().fs.game, "mygame");

    let reloaded = SettingsManager::from_path(settings_path.clone()).unwrap();
    assert_eq!(reloaded.settings().fs.game, "");

    manager.save().unwrap();
    let reloaded = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(reloaded.settings().fs.game, "mygame");
}
