use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// 2000-01-06 is the reference full moon; fifteen days on the age is 15.0.
const FULL_MOON_2000: &str = "2000-01-21";

fn kronos_cmd(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kronos-eye").expect("bin");
    cmd.current_dir(root)
        .env("HOME", root)
        .env("KODI_HOME", root.join("kodi"))
        .env("KRONOS_HOST_BACKEND", "log")
        .env("KRONOS_BOOT_WAIT_SECS", "0")
        .env("KRONOS_STAGGER_MS", "0")
        .env_remove("KRONOS_DATA_DIR")
        .env_remove("KRONOS_ADDON_DIR")
        .env_remove("KRONOS_STATE_FILE")
        .env_remove("KRONOS_ABORT_FILE")
        .env_remove("KRONOS_CONFIG_PATH");
    cmd
}

fn state_file(root: &Path) -> PathBuf {
    root.join("kodi/userdata/addon_data/service.kronos.eye/saturn_moon_status.txt")
}

fn read_state(root: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(state_file(root)).expect("state file");
    serde_json::from_str(&raw).expect("state json")
}

#[test]
fn full_moon_run_records_the_day() {
    let tmp = tempdir().expect("tempdir");

    kronos_cmd(tmp.path())
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("moon=notified"))
        .stdout(contains("saturn=not-due"))
        .stdout(contains("state_saved=true"));

    let state = read_state(tmp.path());
    assert_eq!(state["last_fullmoon"], FULL_MOON_2000);
    assert!(state.get("last_saturn_year").is_none());
    assert!(
        tmp.path()
            .join("kodi/userdata/addon_data/service.kronos.eye/logs/runs.jsonl")
            .is_file()
    );
}

#[test]
fn repeat_run_on_same_day_is_a_noop() {
    let tmp = tempdir().expect("tempdir");

    kronos_cmd(tmp.path())
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success();
    let before = fs::read(state_file(tmp.path())).expect("state");

    kronos_cmd(tmp.path())
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("moon=already-notified"))
        .stdout(contains("state_saved=skipped"));
    assert_eq!(fs::read(state_file(tmp.path())).expect("state"), before);
}

#[test]
fn saturn_year_without_full_moon_sends_ingress_only() {
    let tmp = tempdir().expect("tempdir");

    // Seven days past the January full moon of 2025.
    kronos_cmd(tmp.path())
        .args(["run", "--date", "2025-01-21"])
        .assert()
        .success()
        .stdout(contains("moon=not-due"))
        .stdout(contains("saturn=notified"))
        .stdout(contains("stagger_applied=false"));

    assert_eq!(read_state(tmp.path())["last_saturn_year"], 2025);
}

#[test]
fn corrupt_state_is_treated_as_first_run() {
    let tmp = tempdir().expect("tempdir");
    let file = state_file(tmp.path());
    fs::create_dir_all(file.parent().expect("parent")).expect("mkdir");
    fs::write(&file, "{ not json at all").expect("write");

    kronos_cmd(tmp.path())
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("moon=notified"));

    assert_eq!(read_state(tmp.path())["last_fullmoon"], FULL_MOON_2000);
}

#[test]
fn unreachable_kodi_still_completes_the_run() {
    let tmp = tempdir().expect("tempdir");

    kronos_cmd(tmp.path())
        .env("KRONOS_HOST_BACKEND", "kodi")
        .env("KODI_JSONRPC_URL", "http://127.0.0.1:9/jsonrpc")
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("moon=notified(undelivered)"));

    assert_eq!(read_state(tmp.path())["last_fullmoon"], FULL_MOON_2000);
}

#[test]
fn dry_run_overrides_configured_backend() {
    let tmp = tempdir().expect("tempdir");

    kronos_cmd(tmp.path())
        .env("KRONOS_HOST_BACKEND", "kodi")
        .env("KODI_JSONRPC_URL", "http://127.0.0.1:9/jsonrpc")
        .args(["run", "--dry-run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("backend=log"))
        .stdout(contains("moon=notified"));
}

#[test]
fn config_file_is_honoured() {
    let tmp = tempdir().expect("tempdir");
    let config_path = tmp.path().join("kronos.toml");
    fs::write(&config_path, "[host]\nbackend = \"log\"\n[notify]\nstagger_ms = 0\n")
        .expect("write config");

    kronos_cmd(tmp.path())
        .env_remove("KRONOS_HOST_BACKEND")
        .env("KRONOS_CONFIG_PATH", &config_path)
        .args(["--json", "run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("\"command\": \"run\""))
        .stdout(contains("backend=log"));
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let tmp = tempdir().expect("tempdir");
    let config_path = tmp.path().join("kronos.toml");
    fs::write(&config_path, "[notify]\nstagger_ms = \"fast\"\n").expect("write config");

    kronos_cmd(tmp.path())
        .env("KRONOS_CONFIG_PATH", &config_path)
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("backend=log"))
        .stdout(contains("moon=notified"))
        .stderr(contains("using defaults"));
    assert_eq!(read_state(tmp.path())["last_fullmoon"], FULL_MOON_2000);
}

#[test]
fn unknown_backend_keeps_the_default() {
    let tmp = tempdir().expect("tempdir");

    kronos_cmd(tmp.path())
        .env("KRONOS_HOST_BACKEND", "dbus")
        .env("KODI_JSONRPC_URL", "http://127.0.0.1:9/jsonrpc")
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stdout(contains("backend=kodi"))
        .stdout(contains("moon=notified(undelivered)"))
        .stderr(contains("invalid host backend `dbus`"));
    assert_eq!(read_state(tmp.path())["last_fullmoon"], FULL_MOON_2000);
}

#[test]
fn wrongly_typed_state_is_repaired() {
    let tmp = tempdir().expect("tempdir");
    let file = state_file(tmp.path());
    fs::create_dir_all(file.parent().expect("parent")).expect("mkdir");
    fs::write(&file, r#"{"last_fullmoon":7,"last_saturn_year":"2025"}"#).expect("write");

    // January 2025 full moon, inside a Saturn ingress year.
    kronos_cmd(tmp.path())
        .args(["run", "--date", "2025-01-14"])
        .assert()
        .success()
        .stdout(contains("moon=notified"))
        .stdout(contains("saturn=notified"));
    let state = read_state(tmp.path());
    assert_eq!(state["last_fullmoon"], "2025-01-14");
    assert_eq!(state["last_saturn_year"], 2025);

    kronos_cmd(tmp.path())
        .args(["run", "--date", "2025-01-14"])
        .assert()
        .success()
        .stdout(contains("moon=already-notified"))
        .stdout(contains("saturn=already-notified"));
}

#[test]
fn fallback_env_file_is_loaded_and_logged() {
    let tmp = tempdir().expect("tempdir");
    let kodi_home = tmp.path().join("kodi");
    fs::create_dir_all(&kodi_home).expect("mkdir");
    let custom_state = tmp.path().join("custom-state.json");
    fs::write(
        kodi_home.join("kronos-eye.env"),
        format!("KRONOS_STATE_FILE={}\n", custom_state.display()),
    )
    .expect("write env file");

    kronos_cmd(tmp.path())
        .env_remove("KRONOS_LOG")
        .env_remove("RUST_LOG")
        .args(["run", "--date", FULL_MOON_2000])
        .assert()
        .success()
        .stderr(contains("loaded env file"));
    assert!(custom_state.is_file());
    assert!(!state_file(tmp.path()).exists());
}

#[test]
fn malformed_date_is_rejected() {
    let tmp = tempdir().expect("tempdir");

    kronos_cmd(tmp.path())
        .args(["run", "--date", "21/01/2000"])
        .assert()
        .failure()
        .stderr(contains("YYYY-MM-DD"));
}
