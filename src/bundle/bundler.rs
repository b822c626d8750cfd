//! Bundle generation.
//!
//! A bundle is always regenerated in full: collect the class's sources,
//! order them by priority, read them (skipping unreadable files), render,
//! and overwrite the artifact.

use std::fs;
use std::path::PathBuf;

use crate::asset::{RelPath, scan_sources};
use crate::config::Layout;
use crate::core::{AssetClass, IoResultExt, StageError, StageReport, StageResult};
use crate::{debug, log};

use super::marker;

/// A rendered bundle that has not been written yet.
#[derive(Debug)]
pub struct PreparedBundle {
    pub class: AssetClass,
    pub path: PathBuf,
    /// Captured entries, in bundle order.
    pub entries: Vec<(RelPath, String)>,
    /// Sources that could not be captured.
    pub skipped: Vec<RelPath>,
    pub text: String,
}

impl PreparedBundle {
    /// Overwrite the artifact unconditionally.
    pub fn write(&self, report: &mut StageReport) -> StageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).op("create directory", parent)?;
        }
        fs::write(&self.path, &self.text).op("write", &self.path)?;
        report.written("bundle", self.path.display());
        log!(
            "bundle";
            "{}: {} files, {} bytes{}",
            self.path.display(),
            self.entries.len(),
            self.text.len(),
            if self.skipped.is_empty() {
                String::new()
            } else {
                format!(", {} skipped", self.skipped.len())
            }
        );
        Ok(())
    }

    pub fn entry_paths(&self) -> impl Iterator<Item = &RelPath> {
        self.entries.iter().map(|(rel, _)| rel)
    }
}

/// Bundle sources of `class` in the deployment root, in bundle order.
pub fn collect_sources(layout: &Layout, class: AssetClass) -> StageResult<Vec<RelPath>> {
    let exclude: Vec<PathBuf> = layout
        .bundle_rel(class)
        .map(|rel| layout.deploy_path(rel))
        .into_iter()
        .collect();

    let mut sources: Vec<RelPath> =
        scan_sources(&layout.deploy_root, class.extensions(), &exclude, &layout.suffix)?
            .filter_map(|path| RelPath::from_root(&layout.deploy_root, &path))
            .filter(|rel| layout.is_bundle_source(rel))
            .collect();

    layout.priority(class).order(&mut sources);
    Ok(sources)
}

/// Read each source; failures are reported and the file is left out.
pub fn read_sources(
    layout: &Layout,
    sources: &[RelPath],
    report: &mut StageReport,
) -> (Vec<(RelPath, String)>, Vec<RelPath>) {
    let mut entries = Vec::with_capacity(sources.len());
    let mut skipped = Vec::new();

    for rel in sources {
        if !marker::is_markable(rel.as_str()) {
            report.skip("bundle", rel, "path cannot be carried in a marker");
            skipped.push(rel.clone());
            continue;
        }
        let path = layout.deploy_path(rel);
        let content = fs::read(&path).op("read", &path).and_then(|bytes| {
            String::from_utf8(bytes).map_err(|_| StageError::parse(&path, "source is not UTF-8"))
        });
        match content {
            Ok(content) => entries.push((rel.clone(), content)),
            Err(err) => {
                report.record("bundle", err);
                skipped.push(rel.clone());
            }
        }
    }
    (entries, skipped)
}

/// Render entries into bundle text.
///
/// Content is newline terminated before its length is recorded, so the
/// reconstruction of a file without a final newline gains exactly one.
pub fn render_bundle(
    class: AssetClass,
    prelude: Option<&str>,
    entries: &[(RelPath, String)],
) -> String {
    let size = entries.iter().map(|(rel, c)| c.len() + rel.as_str().len() + 32);
    let mut out = String::with_capacity(size.sum::<usize>() + 16);

    if let Some(prelude) = prelude {
        out.push_str(prelude);
        out.push('\n');
    }
    for (rel, content) in entries {
        let terminated = !content.is_empty() && !content.ends_with('\n');
        let len = content.len() + usize::from(terminated || content.is_empty());
        out.push_str(&marker::render(class, rel.as_str(), len));
        out.push_str(content);
        if terminated || content.is_empty() {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Collect, read and render the bundle of `class` without writing it.
pub fn prepare_bundle(
    layout: &Layout,
    class: AssetClass,
    report: &mut StageReport,
) -> StageResult<Option<PreparedBundle>> {
    let Some(bundle_rel) = layout.bundle_rel(class) else {
        return Ok(None);
    };
    let sources = collect_sources(layout, class)?;
    if sources.is_empty() {
        debug!("bundle"; "no {} sources found", class);
        return Ok(None);
    }

    let (entries, skipped) = read_sources(layout, &sources, report);
    let text = render_bundle(class, layout.prelude(class), &entries);
    Ok(Some(PreparedBundle {
        class,
        path: layout.deploy_path(bundle_rel),
        entries,
        skipped,
        text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{WritePolicy, parse_bundle, unbundle_file};
    use std::path::Path;
    use tempfile::TempDir;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, Layout) {
        let dir = TempDir::new().unwrap();
        let layout = Layout::with_roots(&dir.path().join("data"), &dir.path().join("data_src"));
        fs::create_dir_all(&layout.deploy_root).unwrap();
        (dir, layout)
    }

    #[test]
    fn test_render_format() {
        let text = render_bundle(
            AssetClass::Script,
            Some("'use strict';"),
            &[(rel("a.js"), "var a;".into()), (rel("b.js"), "var b;\n".into())],
        );
        assert_eq!(
            text,
            "'use strict';\n/*@asset 7 a.js */;\nvar a;\n\n/*@asset 7 b.js */;\nvar b;\n\n"
        );
    }

    #[test]
    fn test_empty_source_round_trips() {
        let text = render_bundle(AssetClass::Style, None, &[(rel("empty.css"), String::new())]);
        let parsed = parse_bundle(&text).unwrap();
        assert_eq!(parsed.entries[0].content, "\n");
    }

    #[test]
    fn test_collect_excludes_pages_keep_set_and_siblings() {
        let (_dir, layout) = fixture();
        let root = &layout.deploy_root;
        write(root, "bundle.js", "old");
        write(root, "shared/utils.js", "var U=1;");
        write(root, "shared/utils.js.gz", "gz");
        write(root, "pages/home.js", "page");
        write(root, "theme.js", "var T;");
        write(root, "app.css", "a{}");

        let sources = collect_sources(&layout, AssetClass::Script).unwrap();
        let names: Vec<_> = sources.iter().map(RelPath::as_str).collect();
        assert_eq!(names, ["shared/utils.js", "theme.js"]);
    }

    #[test]
    fn test_scenario_utils_then_state() {
        let (dir, mut layout) = fixture();
        layout.script_priority = crate::core::PriorityTable::new(["utils", "state"]);
        write(&layout.deploy_root, "shared/state.js", "var S=2;");
        write(&layout.deploy_root, "shared/utils.js", "var U=1;");

        let mut report = StageReport::new();
        let bundle = prepare_bundle(&layout, AssetClass::Script, &mut report)
            .unwrap()
            .unwrap();
        bundle.write(&mut report).unwrap();
        let order: Vec<_> = bundle.entry_paths().map(RelPath::as_str).collect();
        assert_eq!(order, ["shared/utils.js", "shared/state.js"]);

        let dest = dir.path().join("restored");
        let outcome =
            unbundle_file(&bundle.path, &dest, WritePolicy::Overwrite, &mut report).unwrap();
        let written: Vec<_> = outcome.written.iter().map(RelPath::as_str).collect();
        assert_eq!(written, ["shared/utils.js", "shared/state.js"]);
        assert_eq!(fs::read_to_string(dest.join("shared/utils.js")).unwrap(), "var U=1;\n");
        assert_eq!(fs::read_to_string(dest.join("shared/state.js")).unwrap(), "var S=2;\n");
    }

    #[test]
    fn test_round_trip_reproduces_tree() {
        let (dir, layout) = fixture();
        let files = [
            ("css/variables.css", ":root { --a: 1; }\n"),
            ("css/tricky.css", "/* css/fake.css */\n/*@asset 1 x.css */\nb{}"),
            ("css/crlf.css", "a{}\r\nb{}\r\n"),
            ("css/blank.css", "\n\n"),
        ];
        for (rel, content) in files {
            write(&layout.deploy_root, rel, content);
        }

        let mut report = StageReport::new();
        let bundle = prepare_bundle(&layout, AssetClass::Style, &mut report)
            .unwrap()
            .unwrap();
        bundle.write(&mut report).unwrap();

        let dest = dir.path().join("restored");
        unbundle_file(&bundle.path, &dest, WritePolicy::Overwrite, &mut report).unwrap();

        let restored: Vec<_> = crate::asset::walk_files(&dest).unwrap().collect();
        assert_eq!(restored.len(), files.len());
        for (rel, content) in files {
            let got = fs::read_to_string(dest.join(rel)).unwrap();
            let expected = if content.ends_with('\n') {
                content.to_string()
            } else {
                format!("{content}\n")
            };
            assert_eq!(got, expected, "{rel}");
        }
    }

    #[test]
    fn test_unreadable_source_is_skipped() {
        let (_dir, layout) = fixture();
        write(&layout.deploy_root, "a.js", "var a;\n");
        fs::write(layout.deploy_root.join("b.js"), [0xff, 0xfe, 0x00]).unwrap();

        let mut report = StageReport::new();
        let bundle = prepare_bundle(&layout, AssetClass::Script, &mut report)
            .unwrap()
            .unwrap();
        assert_eq!(bundle.entries.len(), 1);
        assert_eq!(bundle.skipped, [rel("b.js")]);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn test_path_changed_by_restore_is_skipped() {
        let (_dir, layout) = fixture();
        write(&layout.deploy_root, " a.js", "var a;\n");
        write(&layout.deploy_root, "b.js", "var b;\n");

        let mut report = StageReport::new();
        let bundle = prepare_bundle(&layout, AssetClass::Script, &mut report)
            .unwrap()
            .unwrap();
        let order: Vec<_> = bundle.entry_paths().map(RelPath::as_str).collect();
        assert_eq!(order, ["b.js"]);
        assert_eq!(bundle.skipped, [rel(" a.js")]);
    }
}
