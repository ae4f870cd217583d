use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

/// Internal crates each workspace crate may depend on.
fn allowed_dependencies() -> BTreeMap<&'static str, BTreeSet<&'static str>> {
    BTreeMap::from([
        ("fixdesk-domain", BTreeSet::new()),
        ("fixdesk-shared", BTreeSet::from(["fixdesk-domain"])),
        (
            "fixdesk-console",
            BTreeSet::from(["fixdesk-domain", "fixdesk-shared"]),
        ),
        ("xtask", BTreeSet::new()),
    ])
}

#[derive(Deserialize)]
struct Metadata {
    packages: Vec<Package>,
}

#[derive(Deserialize)]
struct Package {
    name: String,
    manifest_path: PathBuf,
    dependencies: Vec<Dependency>,
}

#[derive(Deserialize)]
struct Dependency {
    name: String,
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata")?;
    let allowed = allowed_dependencies();
    let internal: BTreeSet<&str> = allowed.keys().copied().collect();
    let mut violations = Vec::new();

    for package in &metadata.packages {
        let Some(permitted) = allowed.get(package.name.as_str()) else {
            violations.push(format!("{} is not a known workspace crate", package.name));
            continue;
        };

        for dep in &package.dependencies {
            if internal.contains(dep.name.as_str()) && !permitted.contains(dep.name.as_str()) {
                violations.push(format!("{} must not depend on {}", package.name, dep.name));
            }
        }

        if let Some(src) = package.manifest_path.parent().map(|dir| dir.join("src")) {
            violations.extend(scan_imports(&package.name, &src, &internal, permitted)?);
        }
    }

    if violations.is_empty() {
        println!("arch-check: {} crates OK", metadata.packages.len());
        Ok(())
    } else {
        for violation in &violations {
            eprintln!("arch-check: {violation}");
        }
        anyhow::bail!("{} architecture violation(s)", violations.len())
    }
}

/// Flag `use` paths into internal crates the package may not depend on.
fn scan_imports(
    package: &str,
    src: &Path,
    internal: &BTreeSet<&str>,
    permitted: &BTreeSet<&str>,
) -> anyhow::Result<Vec<String>> {
    let pattern = regex_lite::Regex::new(r"\b(fixdesk_[a-z]+)::").context("compiling import pattern")?;
    let mut violations = Vec::new();

    for file in rust_files(src)? {
        let text = fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        for caps in pattern.captures_iter(&text) {
            let crate_name = caps[1].replace('_', "-");
            if crate_name == package {
                continue;
            }
            if internal.contains(crate_name.as_str()) && !permitted.contains(crate_name.as_str()) {
                violations.push(format!("{} imports {} ({})", package, crate_name, file.display()));
            }
        }
    }
    Ok(violations)
}

fn rust_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(rust_files(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    Ok(files)
}
