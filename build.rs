use std::process::Command;

/// Short commit id of the checkout, or `None` outside a git work tree.
fn git_short_hash() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let hash = String::from_utf8(out.stdout).ok()?;
    Some(hash.trim().to_owned())
}

fn main() {
    // GIT_HASH is read by `--version`; empty when unknown.
    for watched in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }
    let hash = git_short_hash().unwrap_or_default();
    println!("cargo:rustc-env=GIT_HASH={hash}");
}
