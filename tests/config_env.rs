// tests/config_env.rs
use nowplaying_announcer::config::{AnnouncerConfig, ENV_CONFIG_PATH};
use nowplaying_announcer::error::ConfigError;
use std::{env, fs};

const KEYS: &[&str] = &[
    ENV_CONFIG_PATH,
    "FB_PAGE_ID",
    "FB_ACCESS_TOKEN",
    "POST_INTERVAL_SECS",
    "LAST_POSTED_PATH",
];

fn clear_env() {
    for k in KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn load_requires_credentials() {
    // Isolate CWD so a real config/announcer.toml is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    let err = AnnouncerConfig::load().unwrap_err();
    assert!(matches!(err, ConfigError::Missing("FB_PAGE_ID")));

    env::set_var("FB_PAGE_ID", "182798681767685");
    env::set_var("FB_ACCESS_TOKEN", "tok");
    let cfg = AnnouncerConfig::load().unwrap();
    assert_eq!(cfg.page_id, "182798681767685");
    assert_eq!(cfg.poll_interval_secs, 7200);

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn file_then_env_overrides() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Default path ./config/announcer.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/announcer.toml"),
        r#"
page_id = "from-default-file"
access_token = "file-token"
poll_interval_secs = 600
"#,
    )
    .unwrap();
    let cfg = AnnouncerConfig::load().unwrap();
    assert_eq!(cfg.page_id, "from-default-file");
    assert_eq!(cfg.poll_interval_secs, 600);

    // 2) Env path wins over the default file
    let p_env = tmp.path().join("elsewhere.toml");
    fs::write(&p_env, "page_id = \"from-env-file\"\naccess_token = \"t\"\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = AnnouncerConfig::load().unwrap();
    assert_eq!(cfg.page_id, "from-env-file");
    assert_eq!(cfg.poll_interval_secs, 7200);

    // 3) Plain env vars override file values
    env::set_var("POST_INTERVAL_SECS", "120");
    env::set_var("LAST_POSTED_PATH", "/tmp/marker.txt");
    let cfg = AnnouncerConfig::load().unwrap();
    assert_eq!(cfg.poll_interval_secs, 120);
    assert_eq!(cfg.marker_path, std::path::PathBuf::from("/tmp/marker.txt"));

    // 4) Env path pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(matches!(
        AnnouncerConfig::load(),
        Err(ConfigError::Invalid { .. })
    ));

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn broken_toml_is_a_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("bad.toml");
    fs::write(&p, "page_id = [unclosed").unwrap();
    assert!(matches!(
        AnnouncerConfig::from_file(&p),
        Err(ConfigError::Parse { .. })
    ));
}
