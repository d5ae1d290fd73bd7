//! Build script for flacrec
//!
//! Sets `FLACREC_BUILD_INFO`, the version line logged at startup:
//! `<git describe> <build date> <profile>`.

use std::process::Command;

/// Output of a git command, if git is present and succeeds
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string()).filter(|s| !s.is_empty())
}

fn main() {
    // Release tarballs have no .git; fall back to the crate version
    let revision = git(&["describe", "--always", "--dirty", "--tags"])
        .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION")));
    let built_on = chrono::Utc::now().format("%Y-%m-%d");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!(
        "cargo:rustc-env=FLACREC_BUILD_INFO={} {} {}",
        revision, built_on, profile
    );

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/index");
}
