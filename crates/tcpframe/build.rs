use std::path::Path;
use std::process::Command;

// Build facts for `tcpframe version --extended`.
fn main() {
    for (var, exported) in [
        ("TARGET", "TCPFRAME_BUILD_TARGET"),
        ("PROFILE", "TCPFRAME_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env={exported}={value}");
        }
        println!("cargo:rerun-if-env-changed={var}");
    }

    // Source tarballs have no repository; the hash is then reported as unknown.
    let revision = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok());
    if let Some(hash) = revision.map(|hash| hash.trim().to_string()) {
        if !hash.is_empty() {
            println!("cargo:rustc-env=TCPFRAME_GIT_HASH={hash}");
        }
    }

    let head = Path::new("../../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }
}
