use super::{
    default_config, load_config, validate_config, validate_for_run, write_config, ModelBackend,
    CONFIG_SCHEMA_VERSION,
};
use std::path::PathBuf;

#[test]
fn default_config_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("conf").join("rectify.json");
    let config = default_config();

    write_config(&path, &config).expect("write config");
    let loaded = load_config(&path).expect("load config");

    assert_eq!(loaded, config);
}

#[test]
fn minimal_config_fills_defaults() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("rectify.json");
    std::fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "io": { "repo": "https://example.com/project.git" },
            "analysis_model": { "kind": "command", "command": "llm -s {system}" }
        }"#,
    )
    .expect("write config");

    let config = load_config(&path).expect("load config");

    assert_eq!(config.io.repo, "https://example.com/project.git");
    assert_eq!(config.io.output_csv_path, PathBuf::from("results.csv"));
    assert_eq!(config.io.file_extensions, vec![".py".to_string()]);
    assert_eq!(config.inference.max_input_chars, 4000);
    assert_eq!(
        config.analysis_model,
        ModelBackend::Command {
            command: "llm -s {system}".to_string()
        }
    );
    assert!(matches!(config.baseline_model, ModelBackend::Http(_)));
    validate_for_run(&config).expect("config is runnable");
}

#[test]
fn unknown_fields_are_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("rectify.json");
    std::fs::write(
        &path,
        r#"{ "schema_version": 1, "inference": { "max_input_char": 10 } }"#,
    )
    .expect("write config");

    assert!(load_config(&path).is_err());
}

#[test]
fn misspelled_http_backend_settings_are_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("rectify.json");
    std::fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "analysis_model": {
                "kind": "http",
                "endpoint": "http://localhost:8080/v1/chat/completions",
                "model": "m",
                "temprature": 0.5
            }
        }"#,
    )
    .expect("write config");

    let err = load_config(&path).expect_err("typo in backend settings");
    assert!(format!("{err:#}").contains("temprature"), "{err:#}");
}

#[test]
fn invalid_settings_are_rejected() {
    let mut config = default_config();
    config.inference.max_input_chars = 0;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.inference.baseline_batch_size = 0;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.inference.rectify_fallback_message = "  ".to_string();
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.inference.baseline_fallback_message = String::new();
    let err = validate_config(&config).expect_err("blank baseline fallback");
    assert!(err.to_string().contains("baseline_fallback_message"), "{err}");

    let mut config = default_config();
    config.schema_version = CONFIG_SCHEMA_VERSION + 1;
    assert!(validate_config(&config).is_err());

    let mut config = default_config();
    config.analysis_model = ModelBackend::Command {
        command: String::new(),
    };
    let err = validate_config(&config).expect_err("empty command");
    assert!(err.to_string().contains("analysis_model"), "{err}");
}

#[test]
fn run_requires_a_repository() {
    let config = default_config();
    validate_config(&config).expect("default config is valid");
    let err = validate_for_run(&config).expect_err("repo missing");
    assert!(err.to_string().contains("io.repo"), "{err}");
}
