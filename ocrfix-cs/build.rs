//! Build script for ocrfix-cs
//!
//! Emits the build identification logged in the startup banner:
//! - `GIT_HASH`: short commit hash, or `OCRFIX_GIT_HASH` when set (builds
//!   from a source archive have no repository to ask)
//! - `BUILD_TIMESTAMP`: RFC 3339, UTC, seconds precision
//! - `BUILD_PROFILE`: cargo profile (debug/release)

use std::path::Path;
use std::process::Command;

const GIT_HASH_OVERRIDE: &str = "OCRFIX_GIT_HASH";

fn main() {
    let git_hash = std::env::var(GIT_HASH_OVERRIDE)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".to_string());

    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // Declaring any trigger replaces cargo's default "any package file"
    // rule, so sources and the checked-out commit are listed explicitly
    println!("cargo:rerun-if-env-changed={}", GIT_HASH_OVERRIDE);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
    for git_file in ["../.git/HEAD", "../.git/refs"] {
        if Path::new(git_file).exists() {
            println!("cargo:rerun-if-changed={}", git_file);
        }
    }
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}
