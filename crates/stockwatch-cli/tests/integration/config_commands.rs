//! Config file round trips through the `config` handlers.

use stockwatch_cli::config_handlers::{cmd_config_init, config_value};
use stockwatch_core::Config;

#[test]
fn test_init_then_load_then_get() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let path_str = path.to_str().unwrap();

    cmd_config_init(Some(path_str), false).unwrap();

    let edited = std::fs::read_to_string(&path)
        .unwrap()
        .replace("interval_secs = 300", "interval_secs = 45");
    std::fs::write(&path, edited).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.schedule.interval_secs, 45);
    assert_eq!(config_value(&config, "schedule.interval_secs").unwrap(), "45");
    assert_eq!(
        config_value(&config, "product.selector").unwrap(),
        "[itemprop=availability]"
    );
}

#[test]
fn test_load_explicit_missing_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(Config::load(Some(path.to_str().unwrap())).is_err());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[product]\nname = \"Console\"\nurl = \"https://shop.example/console\"\n\n[email]\nenabled = false\n",
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.product.name, "Console");
    assert_eq!(config.product.selector, "[itemprop=availability]");
    assert_eq!(config.schedule.interval_secs, 300);
    assert!(!config.email.enabled);
    assert!(config.telegram.enabled);
}
