use super::*;

use std::collections::HashMap;

#[test]
fn defaults_match_the_gateway_wiring() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr, "0.0.0.0:3000");
    assert_eq!(settings.baud_rate, 115_200);
    assert_eq!(
        settings.votes_log_path,
        PathBuf::from("./data/votes-log.jsonl")
    );
    assert_eq!(settings.static_dir, PathBuf::from("public"));
}

#[test]
fn unparseable_config_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("gateway.toml");
    fs::write(&path, "baud_rate = \"fast\"\n").expect("write");

    let settings = load_settings(&path);
    assert_eq!(
        settings.log_queue_capacity,
        Settings::default().log_queue_capacity
    );
}

#[test]
fn file_values_override_defaults() {
    let file_cfg: FileSettings = toml::from_str(
        r#"
        serial_port = "/dev/ttyACM1"
        baud_rate = 57600
        votes_log_path = "/var/lib/votes/log.jsonl"
        "#,
    )
    .expect("toml");

    let mut settings = Settings::default();
    settings.apply_file(file_cfg);
    assert_eq!(settings.serial_port, "/dev/ttyACM1");
    assert_eq!(settings.baud_rate, 57_600);
    assert_eq!(
        settings.votes_log_path,
        PathBuf::from("/var/lib/votes/log.jsonl")
    );
    assert_eq!(settings.bind_addr, "0.0.0.0:3000");
}

#[test]
fn env_overrides_prefer_app_prefixed_keys_and_skip_bad_numbers() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("SERIAL_PORT", "/dev/ttyUSB3"),
        ("APP__SERIAL_PORT", "COM7"),
        ("SERIAL_BAUD_RATE", "9600"),
        ("APP__BAUD_RATE", "fast"),
        ("SERVER_BIND", "127.0.0.1:4000"),
    ]);
    let mut settings = Settings::default();
    settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.serial_port, "COM7");
    assert_eq!(settings.baud_rate, 9_600);
    assert_eq!(settings.bind_addr, "127.0.0.1:4000");
}

#[test]
fn cli_overrides_win() {
    let settings = Settings::default().apply(SettingsOverrides {
        serial_port: Some("/dev/ttyS0".into()),
        baud_rate: None,
        bind: Some("127.0.0.1:8080".into()),
        votes_log: Some(PathBuf::from("votes.jsonl")),
    });
    assert_eq!(settings.serial_port, "/dev/ttyS0");
    assert_eq!(settings.baud_rate, 115_200);
    assert_eq!(settings.bind_addr, "127.0.0.1:8080");
    assert_eq!(settings.votes_log_path, PathBuf::from("votes.jsonl"));
}

#[test]
fn load_settings_reads_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("gateway.toml");
    fs::write(&path, "static_dir = \"web\"\nlog_queue_capacity = 8\n").expect("write");

    let settings = load_settings(&path);
    assert_eq!(settings.static_dir, PathBuf::from("web"));
    assert_eq!(settings.log_queue_capacity, 8);
}
