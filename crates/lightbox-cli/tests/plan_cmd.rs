//! Black-box tests for `lbx plan` and `lbx graph`.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Session JSON for a workspace JPG with an original to branch from and
/// one reproducible edit applied this session.
fn session_json(dir: &Path) -> String {
    let dir = dir.display();
    format!(
        r#"{{
  "loaded_file": {{ "path": "{dir}", "file_name": "IMG_0001.JPG", "format": "JPG" }},
  "resolved_initial": {{
    "entries": [
      {{
        "action": null,
        "referred": [
          {{ "id": 1, "modified": "2026-03-14T12:00:00Z", "content_group": "grp-1", "roles": "ORIGINAL | CURRENT" }}
        ]
      }}
    ]
  }},
  "current": {{
    "entries": [
      {{
        "action": null,
        "referred": [
          {{ "id": 1, "modified": "2026-03-14T12:00:00Z", "content_group": "grp-1", "roles": "ORIGINAL | CURRENT" }}
        ]
      }},
      {{
        "action": {{ "identifier": "bcg:adjust", "version": 1, "category": "reproducible" }},
        "referred": []
      }}
    ]
  }}
}}"#
    )
}

fn write_session(dir: &TempDir) -> std::path::PathBuf {
    fs::File::create(dir.path().join("IMG_0001.JPG")).expect("fixture image");
    let session = dir.path().join("session.json");
    fs::write(&session, session_json(dir.path())).expect("write session");
    session
}

#[test]
fn plan_replaces_in_place_for_workspace_file() {
    let dir = TempDir::new().expect("tempdir");
    let session = write_session(&dir);

    Command::cargo_bin("lbx")
        .expect("binary")
        .args(["plan", "--history"])
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"REPLACE\""))
        .stdout(predicate::str::contains("IMG_0001.JPG"));
}

#[test]
fn plan_fork_probes_a_free_versioned_name() {
    let dir = TempDir::new().expect("tempdir");
    let session = write_session(&dir);
    fs::File::create(dir.path().join("IMG_0001_v1.JPG")).expect("occupy v1");

    Command::cargo_bin("lbx")
        .expect("binary")
        .args(["plan", "--fork", "--history"])
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"NEW_FILE\""))
        .stdout(predicate::str::contains("IMG_0001_v2.JPG"));
}

#[test]
fn plan_with_settings_file_stores_intermediates() {
    let dir = TempDir::new().expect("tempdir");
    let session = write_session(&dir);
    let settings = dir.path().join("lightbox.toml");
    fs::write(&settings, "save_intermediates = \"AFTER_EACH_SESSION\"\n").expect("write settings");

    Command::cargo_bin("lbx")
        .expect("binary")
        .args(["plan", "--history"])
        .arg(&session)
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("MOVE_TO_INTERMEDIATE"))
        .stdout(predicate::str::contains("IMG_0001_v1-1.jpg"));
}

#[test]
fn graph_summarizes_the_session() {
    let dir = TempDir::new().expect("tempdir");
    let session = write_session(&dir);

    Command::cargo_bin("lbx")
        .expect("binary")
        .args(["graph", "--history"])
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fingerprint\": \"blake3:"))
        .stdout(predicate::str::contains("ORIGINAL"));
}

#[test]
fn missing_session_file_fails_with_context() {
    Command::cargo_bin("lbx")
        .expect("binary")
        .args(["plan", "--history", "/no/such/session.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading session file"));
}
