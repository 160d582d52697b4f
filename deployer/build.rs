//! Embeds the commit and build time reported by `deploy-pages --version`

use std::env;
use std::process::Command;

use chrono::{SecondsFormat, Utc};

/// Trimmed stdout of a successful git invocation
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn main() {
    // Release builds on Actions may run from an exported tree without .git
    let commit = git(&["rev-parse", "--short=12", "HEAD"])
        .or_else(|| env::var("GITHUB_SHA").ok().map(|sha| sha.chars().take(12).collect()))
        .unwrap_or_else(|| "unknown".to_string());

    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());
    let git_hash = if dirty {
        format!("{}-dirty", commit)
    } else {
        commit
    };

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!(
        "cargo:rustc-env=BUILD_TIME={}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
}
