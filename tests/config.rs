mod common;

use common::create_workspace;
use phpantom_typearg::config::{Config, ConfigError, WORKSPACE_CONFIG_FILE};
use phpantom_typearg::diagnostics::{IssueKind, Severity};

#[test]
fn test_workspace_config_is_discovered() {
    let dir = create_workspace(&[(
        WORKSPACE_CONFIG_FILE,
        "marker = \"@factory-arg\"\n\n[severity]\nnot-inferable = \"error\"\n",
    )]);

    let (config, source) = Config::discover(None, Some(dir.path())).unwrap();
    assert_eq!(config.marker, "@factory-arg");
    assert_eq!(config.severity_for(IssueKind::NotInferable), Severity::Error);
    assert_eq!(config.severity_for(IssueKind::UnknownParameter), Severity::Warning);
    assert_eq!(source, Some(dir.path().join(WORKSPACE_CONFIG_FILE)));
}

#[test]
fn test_explicit_path_wins_over_workspace_file() {
    let dir = create_workspace(&[
        (WORKSPACE_CONFIG_FILE, "log_level = \"debug\"\n"),
        ("other.toml", "log_level = \"trace\"\n"),
    ]);
    let explicit = dir.path().join("other.toml");

    let (config, source) = Config::discover(Some(&explicit), Some(dir.path())).unwrap();
    assert_eq!(config.log_level, "trace");
    assert_eq!(source, Some(explicit));
}

#[test]
fn test_missing_explicit_path_is_an_io_error() {
    let dir = create_workspace(&[]);
    let missing = dir.path().join("nope.toml");

    let err = Config::discover(Some(&missing), None).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn test_broken_workspace_file_is_reported() {
    let dir = create_workspace(&[(WORKSPACE_CONFIG_FILE, "exclude = \"vendor\"\n")]);

    let err = Config::discover(None, Some(dir.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = Config::from_toml_str("colour = \"blue\"\n", "inline.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
}

#[test]
fn test_marker_must_be_a_tag() {
    for marker in ["returnTypeArg", "@return type"] {
        let text = format!("marker = {:?}\n", marker);
        let err = Config::from_toml_str(&text, "inline.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{marker} should be rejected");
    }
}
