//! Bevy version detection and manifest updates
//!
//! Detection reads Cargo.toml first, falling back to Cargo.lock. Versions are
//! normalized to `major.minor` so `"0.16.1"` and `"0.16"` compare equal.

use crate::error::MigrateError;
use regex::Regex;
use std::path::Path;

/// The single-line dependency forms recognized in Cargo.toml, most specific
/// first. The `[dependencies.bevy]` table form is handled separately via
/// [`bevy_table_bodies`].
fn cargo_patterns() -> Vec<Regex> {
    vec![
        // bevy = "0.16"
        Regex::new(r#"(?im)^\s*bevy\s*=\s*["']([0-9]+\.[0-9]+(?:\.[0-9]+)?)["']"#).unwrap(),
        // bevy = { version = "0.16", ... }
        Regex::new(r#"(?im)bevy\s*=\s*\{\s*version\s*=\s*["']([0-9]+\.[0-9]+(?:\.[0-9]+)?)["']"#)
            .unwrap(),
        // bevy = { git = "...", tag = "v0.16.0" }
        Regex::new(r#"(?im)bevy\s*=\s*\{[^}]*tag\s*=\s*["']v?([0-9]+\.[0-9]+(?:\.[0-9]+)?)["']"#)
            .unwrap(),
        // bevy = { git = "...", branch = "release-0.16" }
        Regex::new(r#"(?im)bevy\s*=\s*\{[^}]*branch\s*=\s*["']release-([0-9]+\.[0-9]+)["']"#)
            .unwrap(),
    ]
}

/// The body of every `[dependencies.bevy]` (or `[dev-dependencies.bevy]`,
/// etc.) table, as byte ranges into `manifest`. Each body runs from the line
/// after the header to the next table header or end of input, so keys like
/// `features = ["wayland"]` between the header and the version line do not
/// hide the version.
fn bevy_table_bodies(manifest: &str) -> Vec<std::ops::Range<usize>> {
    let header = Regex::new(r"(?m)^\s*\[(?:[a-z-]+-)?dependencies\.bevy\]\s*$").unwrap();
    let next_table = Regex::new(r"(?m)^\s*\[").unwrap();
    header
        .find_iter(manifest)
        .map(|h| {
            let body_start = match manifest[h.end()..].find('\n') {
                Some(i) => h.end() + i + 1,
                None => manifest.len(),
            };
            let body_end = next_table
                .find(&manifest[body_start..])
                .map(|t| body_start + t.start())
                .unwrap_or(manifest.len());
            body_start..body_end
        })
        .collect()
}

/// A `version = "..."` line inside a table body
fn table_version_line() -> Regex {
    Regex::new(r#"(?im)(^\s*version\s*=\s*["'])([0-9]+\.[0-9]+(?:\.[0-9]+)?)(["'])"#).unwrap()
}

/// Trim a version to its first two components
pub fn normalize_version(version: &str) -> String {
    let mut parts = version.split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) => format!("{major}.{minor}"),
        _ => version.to_string(),
    }
}

/// Detect the bevy version declared in Cargo.toml text
pub fn detect_in_manifest(manifest: &str) -> Option<String> {
    for pattern in cargo_patterns() {
        if let Some(caps) = pattern.captures(manifest) {
            return Some(normalize_version(&caps[1]));
        }
    }
    let version_line = table_version_line();
    for body in bevy_table_bodies(manifest) {
        if let Some(caps) = version_line.captures(&manifest[body]) {
            return Some(normalize_version(&caps[2]));
        }
    }
    None
}

/// Detect the bevy version pinned in Cargo.lock text
pub fn detect_in_lockfile(lockfile: &str) -> Option<String> {
    let pattern = Regex::new(
        r#"\[\[package\]\]\s*\nname\s*=\s*["']bevy["']\s*\nversion\s*=\s*["']([0-9]+\.[0-9]+(?:\.[0-9]+)?)["']"#,
    )
    .unwrap();
    pattern
        .captures(lockfile)
        .map(|caps| normalize_version(&caps[1]))
}

/// Detect the project's bevy version from its manifest, then its lock file.
///
/// `NotAProject` if the root has no Cargo.toml; `Ok(None)` if no bevy
/// dependency is found in either file.
pub fn detect_version(project_root: &Path) -> Result<Option<String>, MigrateError> {
    let manifest_path = project_root.join("Cargo.toml");
    if !manifest_path.is_file() {
        return Err(MigrateError::NotAProject(project_root.to_path_buf()));
    }
    let manifest = std::fs::read_to_string(&manifest_path)?;
    if let Some(version) = detect_in_manifest(&manifest) {
        return Ok(Some(version));
    }
    let lock_path = project_root.join("Cargo.lock");
    if lock_path.is_file() {
        let lockfile = std::fs::read_to_string(&lock_path)?;
        if let Some(version) = detect_in_lockfile(&lockfile) {
            return Ok(Some(version));
        }
    }
    Ok(None)
}

/// Rewrite every recognized bevy version declaration in manifest text to
/// `target`. Returns the updated text and whether anything changed.
pub fn update_bevy_version(manifest: &str, target: &str) -> (String, bool) {
    let mut out = manifest.to_string();
    let mut changed = false;
    // Quoted version in a plain or inline-table bevy dependency
    let inline = Regex::new(
        r#"(?m)(^\s*bevy\s*=\s*(?:\{[^}]*version\s*=\s*)?["'])[0-9]+\.[0-9]+(?:\.[0-9]+)?(["'])"#,
    )
    .unwrap();
    let updated = inline.replace_all(&out, format!("${{1}}{target}${{2}}"));
    if updated != out {
        out = updated.into_owned();
        changed = true;
    }
    // [dependencies.bevy] table form, rewritten section by section. Ranges
    // are applied back to front so earlier ones stay valid.
    let version_line = table_version_line();
    for body in bevy_table_bodies(&out).into_iter().rev() {
        let updated = version_line
            .replace(&out[body.clone()], format!("${{1}}{target}${{3}}"))
            .into_owned();
        if updated.as_str() != &out[body.clone()] {
            out.replace_range(body, &updated);
            changed = true;
        }
    }
    (out, changed)
}
