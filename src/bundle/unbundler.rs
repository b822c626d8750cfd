//! Bundle parsing and per-file reconstruction.

use std::fs;
use std::path::Path;

use crate::asset::RelPath;
use crate::core::{IoResultExt, StageError, StageReport, StageResult};
use crate::{debug, log};

use super::marker::{LEGACY_BLOCK, LEGACY_LINE, MARKER};
use super::sanitize::sanitize_entry_path;

/// One captured asset, path still as written in the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub path: String,
    pub content: String,
}

/// Which marker syntax an artifact was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerFormat {
    Current,
    Legacy,
}

#[derive(Debug)]
pub struct Parsed {
    pub entries: Vec<BundleEntry>,
    pub format: MarkerFormat,
    /// Recoverable irregularities (bad lengths, duplicate paths).
    pub notes: Vec<String>,
}

/// Split a bundle artifact into its entries.
///
/// Fails when the artifact holds no marker/content pair at all.
pub fn parse_bundle(text: &str) -> Result<Parsed, String> {
    let parsed = parse_current(text);
    let parsed = if parsed.entries.is_empty() {
        parse_legacy(text)
    } else {
        parsed
    };
    if parsed.entries.is_empty() {
        return Err("no asset markers found".into());
    }
    Ok(parsed)
}

fn parse_current(text: &str) -> Parsed {
    let mut parsed = Parsed {
        entries: Vec::new(),
        format: MarkerFormat::Current,
        notes: Vec::new(),
    };

    let mut pos = 0;
    let mut next = MARKER.captures_at(text, pos);
    while let Some(caps) = next {
        let (Some(line), Some(path)) = (caps.get(0), caps.get(2)) else {
            break;
        };
        let path = path.as_str().to_string();
        let start = (line.end() + 1).min(text.len());
        let declared = caps[1].parse::<usize>().ok();

        let content = match declared.and_then(|len| framed_content(text, start, len)) {
            Some(content) => {
                pos = start + content.len();
                next = MARKER.captures_at(text, pos);
                content
            }
            None => {
                parsed
                    .notes
                    .push(format!("`{path}`: declared length does not match, using next marker"));
                next = MARKER.captures_at(text, start);
                let end = next
                    .as_ref()
                    .and_then(|c| c.get(0))
                    .map_or(text.len(), |m| m.start());
                let raw = &text[start..end];
                raw.strip_suffix('\n').unwrap_or(raw)
            }
        };

        if parsed.entries.iter().any(|entry| entry.path == path) {
            parsed.notes.push(format!("`{path}`: duplicate marker ignored"));
            continue;
        }
        parsed.entries.push(BundleEntry {
            path,
            content: content.to_string(),
        });
    }
    parsed
}

/// The `len` bytes at `start`, if they end on a char boundary followed by
/// the blank separator line or end of file.
fn framed_content(text: &str, start: usize, len: usize) -> Option<&str> {
    let end = start.checked_add(len)?;
    let content = text.get(start..end)?;
    let rest = &text[end..];
    (rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n")).then_some(content)
}

/// Older artifacts delimit entries by comment lines only. Content is
/// trimmed and newline terminated; a leading `;` guard is dropped.
fn parse_legacy(text: &str) -> Parsed {
    let pattern = if LEGACY_BLOCK.is_match(text) {
        &*LEGACY_BLOCK
    } else {
        &*LEGACY_LINE
    };

    let markers: Vec<_> = pattern
        .captures_iter(text)
        .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?.as_str().trim().to_string())))
        .collect();

    let mut parsed = Parsed {
        entries: Vec::new(),
        format: MarkerFormat::Legacy,
        notes: Vec::new(),
    };
    for (idx, (line, path)) in markers.iter().enumerate() {
        let end = markers.get(idx + 1).map_or(text.len(), |(next, _)| next.start());
        let body = text[line.end()..end].trim();
        let body = body.strip_prefix(';').map_or(body, str::trim_start);
        if parsed.entries.iter().any(|entry| &entry.path == path) {
            parsed.notes.push(format!("`{path}`: duplicate marker ignored"));
            continue;
        }
        parsed.entries.push(BundleEntry {
            path: path.clone(),
            content: format!("{body}\n"),
        });
    }
    parsed
}

/// What to do when a reconstructed file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Recovery tool semantics: last bundle wins.
    Overwrite,
    /// Restore semantics: never clobber a present file.
    KeepExisting,
}

#[derive(Debug, Default)]
pub struct UnbundleOutcome {
    pub written: Vec<RelPath>,
    pub kept: usize,
    pub rejected: usize,
}

/// Write every entry under `dest`, sanitizing paths first.
///
/// Individual write failures are reported and do not stop the remaining
/// entries.
pub fn restore_entries(
    entries: &[BundleEntry],
    dest: &Path,
    policy: WritePolicy,
    report: &mut StageReport,
) -> UnbundleOutcome {
    let mut outcome = UnbundleOutcome::default();

    for entry in entries {
        let Some(rel) = sanitize_entry_path(&entry.path) else {
            report.skip("unbundle", &entry.path, "unsafe path with no usable segments");
            outcome.rejected += 1;
            continue;
        };
        if rel.as_str() != entry.path {
            log!("warn"; "unbundle: rewrote unsafe path `{}` to `{}`", entry.path, rel);
        }

        let target = rel.to_path(dest);
        if policy == WritePolicy::KeepExisting && target.exists() {
            debug!("unbundle"; "kept existing {}", rel);
            outcome.kept += 1;
            continue;
        }

        match write_entry(&target, &entry.content) {
            Ok(()) => {
                report.written("unbundle", &rel);
                outcome.written.push(rel);
            }
            Err(err) => report.record("unbundle", err),
        }
    }
    outcome
}

fn write_entry(target: &Path, content: &str) -> StageResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).op("create directory", parent)?;
    }
    fs::write(target, content).op("write", target)
}

/// Reconstruct the per-file tree captured in `artifact` under `dest`.
pub fn unbundle_file(
    artifact: &Path,
    dest: &Path,
    policy: WritePolicy,
    report: &mut StageReport,
) -> StageResult<UnbundleOutcome> {
    let text = fs::read_to_string(artifact).op("read", artifact)?;
    let parsed = parse_bundle(&text).map_err(|reason| StageError::parse(artifact, reason))?;
    for note in &parsed.notes {
        log!("warn"; "unbundle: {}: {}", artifact.display(), note);
    }
    if parsed.format == MarkerFormat::Legacy {
        debug!("unbundle"; "{} uses legacy markers", artifact.display());
    }

    let outcome = restore_entries(&parsed.entries, dest, policy, report);
    log!(
        "unbundle";
        "{}: {} restored, {} kept, {} rejected",
        artifact.display(), outcome.written.len(), outcome.kept, outcome.rejected
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(parsed: &Parsed) -> Vec<&str> {
        parsed.entries.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_parse_current_format() {
        let text = "'use strict';\n/*@asset 9 shared/utils.js */;\nvar U=1;\n\n/*@asset 9 shared/state.js */;\nvar S=2;\n\n";
        let parsed = parse_bundle(text).unwrap();
        assert_eq!(parsed.format, MarkerFormat::Current);
        assert_eq!(paths(&parsed), ["shared/utils.js", "shared/state.js"]);
        assert_eq!(parsed.entries[0].content, "var U=1;\n");
        assert_eq!(parsed.entries[1].content, "var S=2;\n");
        assert!(parsed.notes.is_empty());
    }

    #[test]
    fn test_marker_lookalike_inside_content() {
        let inner = "/*@asset 3 fake.js */;\nx;\n";
        let text = format!(
            "/*@asset {} real.js */;\n{inner}\n/*@asset 2 b.js */;\n;\n\n",
            inner.len()
        );
        let parsed = parse_bundle(&text).unwrap();
        assert_eq!(paths(&parsed), ["real.js", "b.js"]);
        assert_eq!(parsed.entries[0].content, inner);
    }

    #[test]
    fn test_bad_length_falls_back_to_next_marker() {
        let text = "/*@asset 99 a.css */\na{}\n\n/*@asset 4 b.css */\nb{}\n\n";
        let parsed = parse_bundle(text).unwrap();
        assert_eq!(parsed.entries[0].content, "a{}\n");
        assert_eq!(parsed.entries[1].content, "b{}\n");
        assert_eq!(parsed.notes.len(), 1);
    }

    #[test]
    fn test_duplicate_markers_keep_first() {
        let text = "/*@asset 2 a.css */\n1\n\n/*@asset 2 a.css */\n2\n\n";
        let parsed = parse_bundle(text).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].content, "1\n");
    }

    #[test]
    fn test_legacy_formats() {
        let block = "\n/* css/a.css */\na { color: red; }\n\n/* css/b.css */\nb {}\n";
        let parsed = parse_bundle(block).unwrap();
        assert_eq!(parsed.format, MarkerFormat::Legacy);
        assert_eq!(paths(&parsed), ["css/a.css", "css/b.css"]);
        assert_eq!(parsed.entries[0].content, "a { color: red; }\n");

        let line = "\n// --- js/a.js ---\n;var a = 1;\n\n// --- js/b.js ---\n;\nvar b;\n";
        let parsed = parse_bundle(line).unwrap();
        assert_eq!(paths(&parsed), ["js/a.js", "js/b.js"]);
        assert_eq!(parsed.entries[0].content, "var a = 1;\n");
        assert_eq!(parsed.entries[1].content, "var b;\n");
    }

    #[test]
    fn test_no_markers_is_parse_error() {
        assert!(parse_bundle("var x = 1;\n").is_err());
        assert!(parse_bundle("").is_err());
    }

    #[test]
    fn test_unbundle_never_escapes_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out");
        let artifact = dir.path().join("bundle.js");
        fs::write(
            &artifact,
            "/*@asset 3 ../secret */;\nA;\n\n/*@asset 3 /etc/passwd */;\nB;\n\n",
        )
        .unwrap();

        let mut report = StageReport::new();
        let outcome = unbundle_file(&artifact, &dest, WritePolicy::Overwrite, &mut report).unwrap();
        assert_eq!(outcome.written.len(), 2);
        assert!(!dir.path().join("secret").exists());
        assert_eq!(fs::read_to_string(dest.join("secret")).unwrap(), "A;\n");
        assert_eq!(fs::read_to_string(dest.join("etc_passwd")).unwrap(), "B;\n");
    }

    #[test]
    fn test_write_policies() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "edited\n").unwrap();
        let entries = vec![BundleEntry {
            path: "a.css".into(),
            content: "bundled\n".into(),
        }];

        let mut report = StageReport::new();
        let kept = restore_entries(&entries, dir.path(), WritePolicy::KeepExisting, &mut report);
        assert_eq!(kept.kept, 1);
        assert_eq!(fs::read_to_string(dir.path().join("a.css")).unwrap(), "edited\n");

        let written = restore_entries(&entries, dir.path(), WritePolicy::Overwrite, &mut report);
        assert_eq!(written.written.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("a.css")).unwrap(), "bundled\n");
    }

    #[test]
    fn test_malformed_artifact_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("bundle.css");
        fs::write(&artifact, "body { margin: 0 }\n").unwrap();
        let mut report = StageReport::new();
        let err = unbundle_file(&artifact, dir.path(), WritePolicy::Overwrite, &mut report)
            .unwrap_err();
        assert!(matches!(err, StageError::Parse { .. }));
    }
}
