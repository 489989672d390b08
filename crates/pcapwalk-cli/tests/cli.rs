use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pcapwalk"))
}

fn capture_bytes(big_endian: bool, payload_lens: &[u32]) -> Vec<u8> {
    let u16b = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
    let u32b = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&u32b(0xa1b2_c3d4));
    bytes.extend_from_slice(&u16b(2));
    bytes.extend_from_slice(&u16b(4));
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&u32b(65535));
    bytes.extend_from_slice(&u32b(1));
    for (idx, len) in payload_lens.iter().enumerate() {
        for field in [1_700_000_000 + idx as u32, 0, *len, *len] {
            bytes.extend_from_slice(&u32b(field));
        }
        bytes.extend(std::iter::repeat_n(idx as u8, *len as usize));
    }
    bytes
}

fn write_capture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write capture");
    path
}

fn stdout_json(assert: assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("info").and(contains("packets")));
    cmd().arg("packets").arg("--help").assert().success();
    cmd().arg("list").arg("--help").assert().success();
}

#[test]
fn info_reports_swapped_header() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "big.pcap", &capture_bytes(true, &[3]));

    let json = stdout_json(cmd().arg("info").arg(&input).assert().success());
    assert_eq!(json["header"]["magic"], "0xd4c3b2a1");
    assert_eq!(json["header"]["version"], "2.4");
    assert_eq!(json["header"]["byte_order"], "big");
    assert_eq!(json["header"]["snap_len"], 65535);
    assert_eq!(json["header"]["link_type"], 1);
    assert_eq!(json["input"]["bytes"], 24 + 16 + 3);
}

#[test]
fn packets_to_stdout_filters_by_length() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(
        temp.path(),
        "mixed.pcap",
        &capture_bytes(false, &[200, 20, 99, 100, 5]),
    );

    let json = stdout_json(
        cmd()
            .arg("packets")
            .arg(&input)
            .arg("--stdout")
            .arg("--max-len")
            .arg("100")
            .assert()
            .success(),
    );
    assert_eq!(json["capture_summary"]["packets_total"], 5);
    let ordinals: Vec<u64> = json["packets"]
        .as_array()
        .expect("packets array")
        .iter()
        .map(|p| p["ordinal"].as_u64().expect("ordinal"))
        .collect();
    assert_eq!(ordinals, vec![1, 2, 4]);
}

#[test]
fn packets_writes_report_file() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "small.pcap", &capture_bytes(false, &[1, 2, 3]));
    let report = temp.path().join("out").join("listing.json");

    cmd()
        .arg("packets")
        .arg(&input)
        .arg("-o")
        .arg(&report)
        .arg("--limit")
        .arg("2")
        .assert()
        .success()
        .stderr(contains("OK:"));

    let listing: Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("read listing"))
            .expect("valid json");
    assert_eq!(listing["packets"].as_array().map(Vec::len), Some(2));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "small.pcap", &capture_bytes(false, &[1]));
    let report = temp.path().join("listing.json");

    cmd()
        .arg("packets")
        .arg(&input)
        .arg("-o")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcap");

    cmd()
        .arg("info")
        .arg(missing)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn non_pcap_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "capture.pcapng", &capture_bytes(false, &[]));

    cmd()
        .arg("info")
        .arg(input)
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn truncated_capture_fails_with_ordinal() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = capture_bytes(false, &[4, 8]);
    bytes.truncate(bytes.len() - 3);
    let input = write_capture(temp.path(), "cut.pcap", &bytes);

    cmd()
        .arg("packets")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("packet 1").and(contains("hint:")));
}

#[test]
fn unsupported_version_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = capture_bytes(false, &[]);
    bytes[6] = 2;
    let input = write_capture(temp.path(), "old.pcap", &bytes);

    cmd()
        .arg("info")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("unsupported capture format version 2.2"));
}

#[test]
fn glob_pattern_resolves_single_file() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path(), "only.pcap", &capture_bytes(false, &[7]));
    let pattern = temp.path().join("*.pcap");

    let json = stdout_json(cmd().arg("info").arg(pattern).assert().success());
    assert_eq!(json["header"]["version"], "2.4");
}

#[test]
fn glob_pattern_with_multiple_matches_fails() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path(), "a.pcap", &capture_bytes(false, &[]));
    write_capture(temp.path(), "b.pcap", &capture_bytes(false, &[]));
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg("info")
        .arg(pattern)
        .assert()
        .failure()
        .stderr(contains("multiple files match"));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "small.pcap", &capture_bytes(false, &[1]));

    cmd()
        .arg("packets")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(temp.path().join("listing.json"))
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(temp.path(), "self.pcap", &capture_bytes(false, &[1]));

    cmd()
        .arg("packets")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("must differ from input"));
}

#[test]
fn strict_rejects_zero_snap_len() {
    let temp = TempDir::new().expect("tempdir");
    let mut bytes = capture_bytes(false, &[]);
    bytes[16..20].copy_from_slice(&0u32.to_le_bytes());
    let input = write_capture(temp.path(), "zero.pcap", &bytes);

    cmd().arg("info").arg(&input).assert().success();
    cmd()
        .arg("--strict")
        .arg("info")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("snap length is zero"));
}
