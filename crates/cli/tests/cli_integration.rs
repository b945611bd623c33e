//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `forja` binary inside a fixture host
//! project (sections, theme fragments, forja.toml) and verify exit codes,
//! stdout, stderr, and files on disk. Builds use a fake `npm` placed first
//! on PATH.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// A host project with two sections, a base theme, a color preset, and a
/// config pointing everything at the temp dir.
fn host_project() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();

    write(
        root,
        "forja.toml",
        r#"
source_root = "src"
fragments_dir = "themes"
work_dir = ".forja/builds"

[build]
package_manager = "npm"

[storage]
kind = "local"
dir = "store"
"#,
    );
    write(
        root,
        "src/components/sections/Hero.tsx",
        "import { Button } from \"@/components/ui/Button\";\n\
         export default function Hero() { return <Button>Go</Button>; }\n",
    );
    write(
        root,
        "src/components/ui/Button.tsx",
        "export function Button(props: any) { return <button {...props} />; }\n",
    );
    write(
        root,
        "themes/base/global.json",
        r##"{
  "colors": {
    "primary": "#0e7490", "secondary": "#334155", "accent": "#f97316",
    "background": "#ffffff", "foreground": "#0f172a", "muted": "#f1f5f9"
  },
  "fonts": {
    "heading": {"family": ["Inter", "sans-serif"]},
    "body": {"family": ["Inter", "sans-serif"]}
  },
  "radii": {"sm": "4px", "md": "8px", "lg": "16px"}
}"##,
    );
    write(
        root,
        "themes/colors/sunset.json",
        r##"{"colors": {"primary": "#ea580c", "accent": "#facc15"}}"##,
    );
    write(root, "draft.json", &draft_json("Hero", Some("sunset")));
    tmp
}

fn draft_json(section: &str, colors: Option<&str>) -> String {
    let theme = match colors {
        Some(preset) => format!(r#"{{"colors": "{}"}}"#, preset),
        None => "{}".to_string(),
    };
    format!(
        r#"{{
  "id": "summer-promo",
  "layout": [{{"name": "{}"}}],
  "theme": {},
  "content": {{"hero": {{"en": {{"title": "Summer"}}}}}},
  "metadata": {{"name": "Summer Promo", "defaultLocale": "en", "locales": ["en"]}}
}}"#,
        section, theme
    )
}

/// Install a fake `npm` that runs `body` as a shell script.
#[cfg(unix)]
fn fake_npm(root: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = root.join("bin");
    fs::create_dir_all(&bin).unwrap();
    let npm = bin.join("npm");
    fs::write(&npm, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&npm, fs::Permissions::from_mode(0o755)).unwrap();
    bin
}

#[cfg(unix)]
fn path_with(bin: &Path) -> String {
    let existing = std::env::var("PATH").unwrap_or_default();
    format!("{}:{}", bin.display(), existing)
}

/// Helper: create a Command for the `forja` binary, rooted at `dir`.
fn forja(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("forja");
    cmd.current_dir(dir)
        .env_remove("FORJA_WORK_DIR")
        .env_remove("FORJA_STORE_URL")
        .env_remove("FORJA_STORE_TOKEN")
        .env_remove("FORJA_PACKAGE_MANAGER")
        .env_remove("RUST_LOG");
    cmd
}

// ──────────────────────────────────────────────
// 1. Help
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let tmp = TempDir::new().unwrap();
    forja(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Campaign landing-page build pipeline"));
}

// ──────────────────────────────────────────────
// 2. theme
// ──────────────────────────────────────────────

#[test]
fn theme_prints_merged_theme() {
    let tmp = host_project();
    let output = forja(tmp.path())
        .args(["theme", "draft.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let theme: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(theme["colors"]["primary"], "#ea580c");
    assert_eq!(theme["colors"]["background"], "#ffffff");
    assert_eq!(theme["radii"]["md"], "8px");
}

#[test]
fn theme_with_unknown_preset_fails() {
    let tmp = host_project();
    write(tmp.path(), "draft.json", &draft_json("Hero", Some("neon")));
    forja(tmp.path())
        .args(["theme", "draft.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("colors/neon"));
}

#[test]
fn missing_draft_file_fails() {
    let tmp = host_project();
    forja(tmp.path())
        .args(["theme", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file"));
}

// ──────────────────────────────────────────────
// 3. generate
// ──────────────────────────────────────────────

#[test]
fn generate_writes_project_and_copies_imports() {
    let tmp = host_project();
    forja(tmp.path())
        .args(["generate", "draft.json", "--out", "site"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 modules copied"));

    let site = tmp.path().join("site");
    assert!(site.join("package.json").exists());
    assert!(site.join("next.config.mjs").exists());
    assert!(site.join("src/components/sections/Hero.tsx").exists());
    assert!(site.join("src/components/ui/Button.tsx").exists());
    let css = fs::read_to_string(site.join("src/app/globals.css")).unwrap();
    assert!(css.contains("--colors-primary: #ea580c;"));
}

#[test]
fn generate_json_reports_unresolved_imports() {
    let tmp = host_project();
    write(
        tmp.path(),
        "src/components/sections/Hero.tsx",
        "import Missing from \"@/components/ui/Missing\";\nexport default function Hero() { return null; }\n",
    );
    let output = forja(tmp.path())
        .args(["--output", "json", "generate", "draft.json", "--out", "site"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["copied"].as_array().unwrap().len(), 1);
    assert_eq!(
        report["unresolved"][0]["specifier"],
        "@/components/ui/Missing"
    );
}

// ──────────────────────────────────────────────
// 4. package
// ──────────────────────────────────────────────

#[test]
fn package_rejects_invalid_draft_as_json() {
    let tmp = host_project();
    write(tmp.path(), "draft.json", &draft_json("hero-banner", None));
    let output = forja(tmp.path())
        .args(["--output", "json", "package", "draft.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().last().unwrap();
    let err: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(err["kind"], "input_validation");
    assert!(err["error"].as_str().unwrap().contains("layout[0].name"));
}

#[cfg(unix)]
#[test]
fn package_builds_and_uploads() {
    let tmp = host_project();
    let bin = fake_npm(
        tmp.path(),
        "[ \"$1\" = run ] && [ \"$2\" = build ] || exit 2\nmkdir -p out && echo '<html></html>' > out/index.html",
    );

    let output = forja(tmp.path())
        .env("PATH", path_with(&bin))
        .args(["--output", "json", "package", "draft.json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let artifact: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let key = artifact["key"].as_str().unwrap();
    let stored = tmp.path().join("store").join(key);
    let bytes = fs::read(&stored).unwrap();
    assert!(bytes.len() > 2 && bytes[0] == 0x1f && bytes[1] == 0x8b);
    assert!(artifact["url"].as_str().unwrap().starts_with("file://"));
    assert!(!tmp.path().join(".forja/builds/summer-promo").exists());
}

#[cfg(unix)]
#[test]
fn package_reports_build_stderr() {
    let tmp = host_project();
    let bin = fake_npm(tmp.path(), "echo 'type error: x is not assignable' >&2\nexit 1");

    forja(tmp.path())
        .env("PATH", path_with(&bin))
        .args(["package", "draft.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("type error: x is not assignable"));
    assert!(!tmp.path().join(".forja/builds/summer-promo").exists());
}
