use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn preset(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp preset");
    tmp.write_all(xml.as_bytes()).expect("write preset");
    tmp
}

#[test]
fn summary_lists_the_parameter_table() {
    let mut cmd = Command::cargo_bin("eyeball").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("[Pupil]"))
        .stdout(contains("pupilSize"))
        .stdout(contains("envMapBlur"))
        .stdout(contains("40 parameters"));
}

#[test]
fn dump_preset_prints_defaults() {
    let mut cmd = Command::cargo_bin("eyeball").expect("binary exists");
    cmd.arg("--dump-preset");
    cmd.assert()
        .success()
        .stdout(contains("<eyeball>"))
        .stdout(contains(r#"<param name="veinColor">200 50 50</param>"#))
        .stdout(contains(r#"<param name="noiseOctaves">8</param>"#));
}

#[test]
fn preset_values_are_clamped_before_use() {
    let file = preset(
        r#"<eyeball>
  <param name="pupilSize">0.9</param>
  <param name="scleraColor">10 20 30</param>
</eyeball>"#,
    );
    let mut cmd = Command::cargo_bin("eyeball").expect("binary exists");
    cmd.arg("--preset").arg(file.path()).arg("--dump-preset");
    cmd.assert()
        .success()
        .stdout(contains(r#"<param name="pupilSize">0.3</param>"#))
        .stdout(contains(r#"<param name="scleraColor">10 20 30</param>"#));
}

#[test]
fn invalid_preset_fails_with_context() {
    let file = preset(r#"<eyeball><param name="noSuchThing">1</param></eyeball>"#);
    let mut cmd = Command::cargo_bin("eyeball").expect("binary exists");
    cmd.arg("--preset").arg(file.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to apply preset"))
        .stderr(contains("noSuchThing"));
}

#[test]
fn cpu_render_writes_png_with_missing_environment() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("eye.png");
    let mut cmd = Command::cargo_bin("eyeball").expect("binary exists");
    cmd.arg("--env")
        .arg(dir.path().join("missing.jpg"))
        .arg("--cpu-render")
        .arg(&out)
        .arg("--size")
        .arg("24");
    cmd.assert().success().stdout(contains("Wrote 24x24 render"));

    let image = image::open(&out).expect("rendered png");
    assert_eq!((image.width(), image.height()), (24, 24));
}

#[test]
fn unknown_argument_is_rejected() {
    let mut cmd = Command::cargo_bin("eyeball").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
}
