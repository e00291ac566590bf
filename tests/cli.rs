use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("prsviz"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn palettes_lists_hex_and_cmyk() {
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.arg("palettes");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Clinical Blue"))
        .stdout(predicate::str::contains("#1F4788"))
        .stdout(predicate::str::contains("K"));
}

#[test]
fn columns_for_syndromic_labels() {
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.args([
        "columns",
        "Non-syndromic: No",
        "Non-syndromic: Yes",
        "Syndromic: No",
        "Syndromic: Yes",
        "--position",
        "top",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("columns:  2"))
        .stdout(predicate::str::contains("upper center"));
}

#[test]
fn columns_rejects_unknown_position() {
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.args(["columns", "a", "--position", "sideways"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown legend position"));
}

#[test]
fn validate_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.arg("validate").arg(dir.path().join("missing.tiff"));
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("valid: no"));
}

#[test]
fn validate_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ok.tiff");
    let img = image::RgbImage::from_pixel(1500, 300, image::Rgb([255, 255, 255]));
    prs_viz::export::write_tiff(&img, &path, 300, true).unwrap();

    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.args(["validate", "--json"]).arg(&path);
    let out = cmd.assert().success().get_output().stdout.clone();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["color_mode"], "Cmyk");
    assert_eq!(report["width_pixels"], 1500);
}

#[test]
fn bad_style_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let style = dir.path().join("style.json");
    std::fs::write(&style, r#"{"cycle": "neon"}"#).unwrap();
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.arg("--style").arg(&style).arg("palettes");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load style"));
}

#[test]
fn demo_writes_validated_tiff() {
    if !prs_viz::viz::fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("demo.tiff");
    let mut cmd = Command::cargo_bin("prsviz").unwrap();
    cmd.args(["demo", "--out"]).arg(&out);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Wrote"));

    let mut check = Command::cargo_bin("prsviz").unwrap();
    check.arg("validate").arg(&out);
    check.assert().success();
}
