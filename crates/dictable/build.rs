use std::process::Command;

/// Run a tool and keep the first line of its stdout, if it succeeds.
fn first_line(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let line = text.lines().next()?.trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn main() {
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=DICTABLE_BUILD_TARGET={target}");
    }
    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=DICTABLE_BUILD_PROFILE={profile}");
    }

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    if let Some(version) = first_line(&rustc, &["--version"]) {
        println!("cargo:rustc-env=DICTABLE_RUSTC_VERSION={version}");
    }
    // Outside a checkout (e.g. a packaged crate) the hash stays unset.
    if let Some(hash) = first_line("git", &["rev-parse", "--short=12", "HEAD"]) {
        println!("cargo:rustc-env=DICTABLE_GIT_HASH={hash}");
    }

    println!("cargo:rerun-if-env-changed=TARGET");
    println!("cargo:rerun-if-env-changed=PROFILE");
    println!("cargo:rerun-if-env-changed=RUSTC");
    println!("cargo:rerun-if-changed=build.rs");
}
