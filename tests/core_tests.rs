//! Integration tests for settings persistence and validation
//!
//! Each test writes into its own directory under the system temp dir.

use damalink::core::settings_persistence::{load_settings_from, save_settings_to};
use damalink::core::{CoreError, SessionPhase, Settings};
use damalink::game::ai::AdvisorConfig;
use draughts_engine::{CaptureRule, RuleSet};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Fresh settings path inside a unique temp directory
fn temp_settings_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("damalink-test-{}", Uuid::new_v4()))
        .join("settings.json")
}

#[test]
fn test_settings_round_trip() {
    //! Saved settings load back unchanged, and the parent directory is
    //! created on demand.
    let path = temp_settings_path();
    let settings = Settings {
        player_name: "Ada".to_string(),
        listen_addr: "127.0.0.1:9000".to_string(),
        strict_capture: true,
        advisor: AdvisorConfig {
            timeout_secs: 3,
            ..AdvisorConfig::default()
        },
    };

    save_settings_to(&path, &settings).expect("Should save");
    assert_eq!(load_settings_from(&path), settings);

    let _ = fs::remove_dir_all(path.parent().expect("has parent"));
}

#[test]
fn test_missing_or_broken_file_falls_back_to_defaults() {
    let path = temp_settings_path();
    assert_eq!(load_settings_from(&path), Settings::default());

    fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
    fs::write(&path, "{ not json").expect("write");
    assert_eq!(load_settings_from(&path), Settings::default());

    let _ = fs::remove_dir_all(path.parent().expect("has parent"));
}

#[test]
fn test_partial_file_keeps_defaults_for_missing_keys() {
    let path = temp_settings_path();
    fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
    fs::write(&path, r#"{ "player_name": "Grace", "advisor": { "enabled": false } }"#)
        .expect("write");

    let settings = load_settings_from(&path);
    assert_eq!(settings.player_name, "Grace");
    assert_eq!(settings.listen_addr, Settings::default().listen_addr);
    assert!(!settings.advisor.enabled);
    assert_eq!(settings.advisor.model, AdvisorConfig::default().model);

    let _ = fs::remove_dir_all(path.parent().expect("has parent"));
}

#[test]
fn test_api_key_is_never_persisted() {
    let settings = Settings {
        advisor: AdvisorConfig {
            api_key: Some("secret".to_string()),
            ..AdvisorConfig::default()
        },
        ..Settings::default()
    };
    let json = serde_json::to_string(&settings).expect("Should serialize");
    assert!(!json.contains("secret"));
    assert!(!json.contains("api_key"));
}

#[test]
fn test_validation_rejects_unusable_values() {
    assert!(Settings::default().validate().is_ok());

    let unnamed = Settings {
        player_name: "   ".to_string(),
        ..Settings::default()
    };
    assert!(matches!(
        unnamed.validate(),
        Err(CoreError::InvalidSetting {
            key: "player_name",
            ..
        })
    ));

    let bad_addr = Settings {
        listen_addr: "not an address".to_string(),
        ..Settings::default()
    };
    assert!(matches!(
        bad_addr.validate(),
        Err(CoreError::InvalidSetting {
            key: "listen_addr",
            ..
        })
    ));
}

#[test]
fn test_strict_capture_maps_to_rules() {
    assert_eq!(Settings::default().rules(), RuleSet::default());
    let strict = Settings {
        strict_capture: true,
        ..Settings::default()
    };
    assert_eq!(strict.rules().capture, CaptureRule::Mandatory);
}

#[test]
fn test_session_phase_flags() {
    assert_eq!(SessionPhase::default(), SessionPhase::AwaitingSync);
    assert!(SessionPhase::InMatch.is_playing());
    assert!(!SessionPhase::AwaitingSync.is_playing());
    assert!(SessionPhase::Closed.is_closed());
    assert_eq!(SessionPhase::Closed.to_string(), "closed");
}
