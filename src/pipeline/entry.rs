//! Entry page reference rewriting.
//!
//! After bundles are regenerated, the entry page must load exactly the
//! bundles: tags that load individual bundled sources are removed, bundle
//! tags get a content version (`?v=`), and missing bundle tags are inserted
//! (style before `</head>`, script before `</body>`).

use std::fs;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::asset::RelPath;
use crate::asset::version::versioned_url;
use crate::config::Layout;
use crate::core::{AssetClass, IoResultExt, StageReport, StageResult};
use crate::debug;

static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[ \t]*<script\b[^>]*?\bsrc\s*=\s*["']([^"']+)["'][^>]*>\s*</script>[ \t]*(\r?\n)?"#)
        .unwrap()
});

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[ \t]*<link\b[^>]*?\bhref\s*=\s*["']([^"']+)["'][^>]*>[ \t]*(\r?\n)?"#).unwrap()
});

/// What the entry page should reference for one bundle class.
#[derive(Debug, Clone)]
pub struct EntryRefs {
    pub class: AssetClass,
    pub bundle: RelPath,
    /// Cache-busting version, `None` to reference the bare path.
    pub version: Option<String>,
    /// Sources captured in the bundle; tags loading them are dropped.
    pub sources: Vec<RelPath>,
}

/// Resolve a `src`/`href` value against the entry page's directory.
/// External and root-escaping URLs resolve to `None`.
fn resolve_ref(entry_dir: &str, url: &str) -> Option<RelPath> {
    let url = url.split(['?', '#']).next().unwrap_or_default().trim();
    if url.is_empty() || url.contains("://") || url.starts_with("//") || url.starts_with("data:") {
        return None;
    }
    let (base, rest) = match url.strip_prefix('/') {
        Some(rest) => ("", rest),
        None => (entry_dir, url),
    };

    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for seg in rest.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            seg => segments.push(seg),
        }
    }
    RelPath::new(segments.join("/"))
}

/// URL of `target` as written in a page living in `entry_dir`.
fn relative_url(entry_dir: &str, target: &RelPath) -> String {
    if entry_dir.is_empty() {
        return target.to_string();
    }
    match target.as_str().strip_prefix(entry_dir).and_then(|r| r.strip_prefix('/')) {
        Some(rest) => rest.to_string(),
        None => format!("/{target}"),
    }
}

fn bundle_url(entry_dir: &str, refs: &EntryRefs) -> String {
    let base = relative_url(entry_dir, &refs.bundle);
    match &refs.version {
        Some(version) => versioned_url(&base, version),
        None => base,
    }
}

/// Rewrite one tag kind. Returns the new text and whether the bundle is
/// referenced at least once.
fn rewrite_tags(
    html: &str,
    pattern: &Regex,
    entry_dir: &str,
    refs: &EntryRefs,
    is_stylesheet: bool,
) -> (String, bool) {
    let mut found = false;
    let rewritten = pattern.replace_all(html, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let (Some(tag), Some(url)) = (caps.get(0), caps.get(1)) else {
            return whole.to_string();
        };
        if is_stylesheet && !whole.to_ascii_lowercase().contains("stylesheet") {
            return whole.to_string();
        }
        let Some(target) = resolve_ref(entry_dir, url.as_str()) else {
            return whole.to_string();
        };

        if target == refs.bundle {
            found = true;
            let (start, end) = (url.start() - tag.start(), url.end() - tag.start());
            return format!("{}{}{}", &whole[..start], bundle_url(entry_dir, refs), &whole[end..]);
        }
        if refs.sources.contains(&target) {
            // Keep the line break when the tag shares its line with other markup
            let at_line_start = html[..tag.start()].ends_with('\n') || tag.start() == 0;
            return match caps.get(2) {
                Some(newline) if !at_line_start => newline.as_str().to_string(),
                _ => String::new(),
            };
        }
        whole.to_string()
    });
    (rewritten.into_owned(), found)
}

/// Insert `tag` before the last `closer`, on its own line when the closer
/// starts one.
fn insert_before(html: &str, closer: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let Some(idx) = lower.rfind(closer) else {
        return format!("{html}{tag}\n");
    };
    let line_start = html[..idx].rfind('\n').map_or(0, |i| i + 1);
    let indent = &html[line_start..idx];
    if indent.trim().is_empty() {
        format!("{}{indent}    {tag}\n{}", &html[..line_start], &html[line_start..])
    } else {
        format!("{}{tag}{}", &html[..idx], &html[idx..])
    }
}

/// Rewrite entry page markup for the given bundles.
pub fn rewrite_entry_html(html: &str, entry_dir: &str, all_refs: &[EntryRefs]) -> String {
    let mut out = html.to_string();
    for refs in all_refs {
        let (pattern, is_stylesheet) = match refs.class {
            AssetClass::Style => (&*LINK_TAG, true),
            _ => (&*SCRIPT_TAG, false),
        };
        let (rewritten, found) = rewrite_tags(&out, pattern, entry_dir, refs, is_stylesheet);
        out = rewritten;
        if found {
            continue;
        }
        let url = bundle_url(entry_dir, refs);
        out = match refs.class {
            AssetClass::Style => {
                insert_before(&out, "</head>", &format!(r#"<link rel="stylesheet" href="{url}">"#))
            }
            _ => insert_before(&out, "</body>", &format!(r#"<script src="{url}"></script>"#)),
        };
    }
    out
}

/// Rewrite the entry page in place. Returns whether the file changed.
///
/// A missing entry page is not an error: there is nothing to rewrite.
pub fn update_entry_page(
    layout: &Layout,
    all_refs: &[EntryRefs],
    report: &mut StageReport,
) -> StageResult<bool> {
    let path = layout.deploy_path(&layout.entry_page);
    if !path.is_file() {
        debug!("entry"; "no entry page at {}", path.display());
        return Ok(false);
    }
    let html = fs::read_to_string(&path).op("read", &path)?;
    let rewritten = rewrite_entry_html(&html, layout.entry_page.parent(), all_refs);
    if rewritten == html {
        return Ok(false);
    }
    fs::write(&path, rewritten).op("write", &path)?;
    report.written("entry", &layout.entry_page);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    fn script_refs(sources: &[&str]) -> EntryRefs {
        EntryRefs {
            class: AssetClass::Script,
            bundle: rel("bundle.js"),
            version: Some("0badc0de".into()),
            sources: sources.iter().map(|s| rel(s)).collect(),
        }
    }

    fn style_refs(sources: &[&str]) -> EntryRefs {
        EntryRefs {
            class: AssetClass::Style,
            bundle: rel("bundle.css"),
            version: Some("12345678".into()),
            sources: sources.iter().map(|s| rel(s)).collect(),
        }
    }

    const PAGE: &str = "<html>
<head>
    <link rel=\"stylesheet\" href=\"css/variables.css\">
    <link rel=\"icon\" href=\"favicon.ico\">
</head>
<body>
    <script src=\"shared/utils.js\"></script>
    <script src=\"./shared/state.js?v=1\"></script>
    <script src=\"https://cdn.example.com/lib.js\"></script>
</body>
</html>
";

    #[test]
    fn test_replaces_sources_with_bundles() {
        let out = rewrite_entry_html(
            PAGE,
            "",
            &[
                script_refs(&["shared/utils.js", "shared/state.js"]),
                style_refs(&["css/variables.css"]),
            ],
        );
        assert_eq!(
            out,
            "<html>
<head>
    <link rel=\"icon\" href=\"favicon.ico\">
    <link rel=\"stylesheet\" href=\"bundle.css?v=12345678\">
</head>
<body>
    <script src=\"https://cdn.example.com/lib.js\"></script>
    <script src=\"bundle.js?v=0badc0de\"></script>
</body>
</html>
"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let refs = [script_refs(&["shared/utils.js"]), style_refs(&[])];
        let once = rewrite_entry_html(PAGE, "", &refs);
        let twice = rewrite_entry_html(&once, "", &refs);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_bundle_tag_gets_new_version() {
        let html = "<script src=\"/bundle.js?v=old\"></script>\n";
        let out = rewrite_entry_html(html, "", &[script_refs(&[])]);
        assert_eq!(out, "<script src=\"bundle.js?v=0badc0de\"></script>\n");
    }

    #[test]
    fn test_no_version_without_cache_busting() {
        let mut refs = script_refs(&[]);
        refs.version = None;
        let out = rewrite_entry_html("<body>\n</body>\n", "", &[refs]);
        assert_eq!(out, "<body>\n    <script src=\"bundle.js\"></script>\n</body>\n");
    }

    #[test]
    fn test_tag_patterns_ignore_case() {
        assert!(SCRIPT_TAG.is_match("<SCRIPT SRC=\"a.js\"></Script>\n"));
        assert!(LINK_TAG.is_match("<Link REL=\"stylesheet\" HREF='a.css'>"));

        let html = "<BODY>\n    <SCRIPT SRC=\"shared/utils.js\"></SCRIPT>\n</BODY>\n";
        let out = rewrite_entry_html(html, "", &[script_refs(&["shared/utils.js"])]);
        assert_eq!(
            out,
            "<BODY>\n    <script src=\"bundle.js?v=0badc0de\"></script>\n</BODY>\n"
        );
    }

    #[test]
    fn test_resolve_ref() {
        assert_eq!(resolve_ref("", "./a/b.js?x#y"), Some(rel("a/b.js")));
        assert_eq!(resolve_ref("ui", "../a.js"), Some(rel("a.js")));
        assert_eq!(resolve_ref("ui", "/a.js"), Some(rel("a.js")));
        assert_eq!(resolve_ref("", "../a.js"), None);
        assert_eq!(resolve_ref("", "http://x/a.js"), None);
    }

    #[test]
    fn test_relative_url() {
        assert_eq!(relative_url("", &rel("bundle.js")), "bundle.js");
        assert_eq!(relative_url("ui", &rel("ui/bundle.js")), "bundle.js");
        assert_eq!(relative_url("ui", &rel("bundle.js")), "/bundle.js");
    }
}
