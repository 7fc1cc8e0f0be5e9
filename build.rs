// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=VIRTUALCAM_VERSION");

    // Packagers can pin the version string without a git checkout
    let version = std::env::var("VIRTUALCAM_VERSION").unwrap_or_else(|_| describe_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`, falling back to the crate version.
///
/// - exact tag `v0.2.0` becomes `0.2.0`
/// - `v0.2.0-3-gabc1234` becomes `0.2.0+3.abc1234`
fn describe_version() -> String {
    let described = git(&["describe", "--tags", "--match", "v*"]);

    match described {
        Some(described) => {
            let described = described.strip_prefix('v').unwrap_or(&described);
            let parts: Vec<&str> = described.rsplitn(3, '-').collect();
            if parts.len() == 3 {
                let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
                format!("{}+{}.{}", parts[2], parts[1], hash)
            } else {
                described.to_string()
            }
        }
        None => {
            let crate_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
            match git(&["rev-parse", "--short", "HEAD"]) {
                Some(hash) => format!("{}+{}", crate_version, hash),
                None => crate_version,
            }
        }
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
