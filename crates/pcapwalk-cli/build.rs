use std::env;
use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let commit_full = env::var("GITHUB_SHA").ok().filter(|v| !v.is_empty());
    let commit_full = commit_full.or_else(|| run_git(&["rev-parse", "HEAD"]));
    let commit_short = commit_full
        .as_deref()
        .map(shorten_commit)
        .unwrap_or_else(|| "unknown".to_string());

    let build_date = run_git(&["log", "-1", "--format=%cI"])
        .or_else(build_time)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=PCAPWALK_BUILD_COMMIT={}", commit_short);
    println!(
        "cargo:rustc-env=PCAPWALK_BUILD_COMMIT_FULL={}",
        commit_full.as_deref().unwrap_or("unknown")
    );
    println!("cargo:rustc-env=PCAPWALK_BUILD_DATE={}", build_date);
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

// Honors SOURCE_DATE_EPOCH for reproducible builds outside a git checkout.
fn build_time() -> Option<String> {
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => OffsetDateTime::from_unix_timestamp(epoch.trim().parse().ok()?).ok()?,
        Err(_) => OffsetDateTime::now_utc(),
    };
    now.format(&Rfc3339).ok()
}

fn shorten_commit(full: &str) -> String {
    full.chars().take(7).collect()
}
