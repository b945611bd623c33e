//! Integration tests for theme assembly from fragment files.

use std::fs;
use std::path::Path;

use forja_core::error::ThemeError;
use forja_core::theme::{FragmentStore, ThemeAssembler};
use forja_core::ThemeConfig;
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_fragment(root: &Path, category: &str, name: &str, value: Value) {
    let dir = root.join(category);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{}.json", name)),
        serde_json::to_string_pretty(&value).unwrap(),
    )
    .unwrap();
}

fn fragments() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_fragment(
        root,
        "base",
        "global",
        json!({
            "colors": {
                "primary": "#111111",
                "secondary": "#222222",
                "accent": "#333333",
                "background": "#ffffff",
                "foreground": "#000000",
                "muted": "#eeeeee"
            },
            "fonts": {
                "heading": {"family": ["system-ui", "sans-serif"], "weights": [600, 700]},
                "body": {"family": ["system-ui", "sans-serif"]}
            },
            "radii": {"sm": "2px", "md": "4px", "lg": "8px"},
            "spacing": {"section": "4rem"}
        }),
    );
    write_fragment(
        root,
        "colors",
        "ocean",
        json!({"colors": {"primary": "#0e7490", "accent": "#f97316"}}),
    );
    write_fragment(
        root,
        "fonts",
        "editorial",
        json!({"fonts": {"heading": {"family": ["Playfair Display", "serif"], "weights": [700]}}}),
    );
    write_fragment(
        root,
        "radii",
        "pill",
        json!({"radii": {"lg": "9999px"}}),
    );
    tmp
}

fn assembler(tmp: &TempDir) -> ThemeAssembler {
    ThemeAssembler::new(FragmentStore::new(tmp.path()), "global").unwrap()
}

#[tokio::test]
async fn base_alone_is_a_valid_theme() {
    let tmp = fragments();
    let theme = assembler(&tmp)
        .assemble(&ThemeConfig::default())
        .await
        .unwrap();
    assert_eq!(theme.as_value()["colors"]["primary"], "#111111");
}

#[tokio::test]
async fn presets_and_overrides_apply_in_order() {
    let tmp = fragments();
    let config = ThemeConfig {
        colors: Some("ocean".to_string()),
        fonts: Some("editorial".to_string()),
        radii: Some("pill".to_string()),
        overrides: json!({"colors": {"accent": "#ff0000"}, "radii": {"sm": "0"}}),
    };
    let theme = assembler(&tmp).assemble(&config).await.unwrap();
    let v = theme.as_value();

    assert_eq!(v["colors"]["primary"], "#0e7490");
    assert_eq!(v["colors"]["accent"], "#ff0000");
    assert_eq!(v["colors"]["muted"], "#eeeeee");
    assert_eq!(
        v["fonts"]["heading"]["family"],
        json!(["Playfair Display", "serif"])
    );
    assert_eq!(v["fonts"]["heading"]["weights"], json!([700]));
    assert_eq!(v["radii"], json!({"sm": "0", "md": "4px", "lg": "9999px"}));
}

#[tokio::test]
async fn missing_preset_is_reported() {
    let tmp = fragments();
    let config = ThemeConfig {
        colors: Some("sunset".to_string()),
        ..ThemeConfig::default()
    };
    let err = assembler(&tmp).assemble(&config).await.unwrap_err();
    match err {
        ThemeError::FragmentNotFound { category, name, .. } => {
            assert_eq!(category, "colors");
            assert_eq!(name, "sunset");
        }
        other => panic!("expected FragmentNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn preset_outside_the_fragments_dir_is_refused() {
    let tmp = fragments();
    fs::write(
        tmp.path().join("secret.json"),
        json!({"colors": {"primary": "LEAKED"}}).to_string(),
    )
    .unwrap();
    let config = ThemeConfig {
        colors: Some("../../secret".to_string()),
        ..ThemeConfig::default()
    };

    let err = assembler(&tmp).assemble(&config).await.unwrap_err();

    match err {
        ThemeError::InvalidName { category, name } => {
            assert_eq!(category, "colors");
            assert_eq!(name, "../../secret");
        }
        other => panic!("expected InvalidName, got {:?}", other),
    }
}

#[tokio::test]
async fn schema_violation_names_the_field() {
    let tmp = fragments();
    let config = ThemeConfig {
        overrides: json!({"radii": {"md": 4}}),
        ..ThemeConfig::default()
    };
    let err = assembler(&tmp).assemble(&config).await.unwrap_err();
    match err {
        ThemeError::Schema { path, .. } => assert_eq!(path, "radii.md"),
        other => panic!("expected Schema error, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_required_field_fails_validation() {
    let tmp = TempDir::new().unwrap();
    write_fragment(
        tmp.path(),
        "base",
        "global",
        json!({"colors": {"primary": "#000"}, "fonts": {}, "radii": {}}),
    );
    let err = assembler(&tmp)
        .assemble(&ThemeConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ThemeError::Schema { .. }));
}

#[tokio::test]
async fn malformed_fragment_is_reported() {
    let tmp = fragments();
    fs::write(tmp.path().join("colors/broken.json"), "{ not json").unwrap();
    let config = ThemeConfig {
        colors: Some("broken".to_string()),
        ..ThemeConfig::default()
    };
    let err = assembler(&tmp).assemble(&config).await.unwrap_err();
    assert!(matches!(err, ThemeError::Malformed { .. }));
}
