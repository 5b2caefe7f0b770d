use dirdelta_common::{ComparisonMode, TreeSide};
use dirdelta_core::{groups_containing, ComparisonResult, HashGroup};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Document written by `--json` and `--save-output`; field order is part of the format
#[derive(Debug, Serialize)]
pub struct JsonReport {
    /// New root first, then original root
    pub directories: [String; 2],
    pub new_files: Vec<String>,
    pub common_files: Vec<String>,
    pub have_changed: Vec<String>,
    pub unchanged: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_by_hashes: Option<HashMapping>,
}

/// digest -> {original root: [paths], new root: [paths]}
#[derive(Debug)]
pub struct HashMapping {
    original_root: String,
    new_root: String,
    groups: Vec<(String, HashGroup)>,
}

impl Serialize for HashMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (digest, group) in &self.groups {
            map.serialize_entry(
                digest,
                &RootGroups {
                    original_root: &self.original_root,
                    new_root: &self.new_root,
                    group,
                },
            )?;
        }
        map.end()
    }
}

struct RootGroups<'a> {
    original_root: &'a str,
    new_root: &'a str,
    group: &'a HashGroup,
}

impl Serialize for RootGroups<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // A tree compared with itself gets one entry, holding the new side
        if self.original_root == self.new_root {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(self.new_root, &path_strings(&self.group.new))?;
            return map.end();
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.original_root, &path_strings(&self.group.original))?;
        map.serialize_entry(self.new_root, &path_strings(&self.group.new))?;
        map.end()
    }
}

pub fn build_json_report(result: &ComparisonResult) -> JsonReport {
    let original_root = path_string(&result.original_root);
    let new_root = path_string(&result.new_root);

    let mapping_by_hashes = result.hash_groups.as_ref().map(|groups| HashMapping {
        original_root: original_root.clone(),
        new_root: new_root.clone(),
        groups: groups
            .iter()
            .map(|(digest, group)| (digest.to_hex(), group.clone()))
            .collect(),
    });

    JsonReport {
        directories: [new_root, original_root],
        new_files: path_strings(&result.only_in_new),
        common_files: path_strings(&result.common),
        have_changed: path_strings(&result.changed),
        unchanged: path_strings(&result.unchanged),
        mapping_by_hashes,
    }
}

pub fn render_text(result: &ComparisonResult, use_color: bool) -> String {
    let rule = "-".repeat(80);
    let original = result.original_root.display();
    let new = result.new_root.display();
    let paint = |code: &str, text: &str| {
        if use_color && !code.is_empty() {
            format!("{code}{text}\x1b[0m")
        } else {
            text.to_string()
        }
    };

    let mut out = String::new();
    let mut section = |title: String, paths: &[PathBuf], color: &str| {
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{rule}");
        for path in paths {
            let _ = writeln!(out, "{}", paint(color, &path.display().to_string()));
        }
    };

    if !result.only_in_original.is_empty() {
        section(
            format!("The following files are only in {original}:"),
            &result.only_in_original,
            "\x1b[33m",
        );
    }

    if result.only_in_new.is_empty() {
        section(format!("No new files in {new}"), &[], "");
    } else {
        section(
            format!("The following files are new in {new}:"),
            &result.only_in_new,
            "\x1b[34m",
        );
    }

    if result.common.is_empty() {
        section(
            format!("No files with the same name in both {original} and {new}"),
            &[],
            "",
        );
    } else {
        section(
            format!("The following files exist both in {original} and {new}:"),
            &result.common,
            "",
        );
        let changed_title = match result.mode {
            ComparisonMode::FullHash => format!("These files are changed or new in {new}:"),
            _ => format!("These files are different between {original} and {new}:"),
        };
        section(changed_title, &result.changed, "\x1b[31m");
        section(
            format!("These files are same between {original} and {new}:"),
            &result.unchanged,
            "\x1b[32m",
        );
    }

    if !result.skipped.is_empty() {
        section("These files were skipped:".to_string(), &result.skipped, "\x1b[36m");
    }

    if let Some(groups) = &result.hash_groups {
        let moves = relocated_content(groups, &result.changed);
        if !moves.is_empty() {
            let _ = writeln!(out, "{rule}");
            let _ = writeln!(out, "Content found in {original} under another name:");
            let _ = writeln!(out, "{rule}");
            for (path, sources) in moves {
                let sources: Vec<String> =
                    sources.iter().map(|p| p.display().to_string()).collect();
                let _ = writeln!(out, "{} <- {}", path.display(), sources.join(", "));
            }
        }
    }

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Summary ({} mode):", result.mode);
    let _ = writeln!(out, "  Only in original: {}", result.only_in_original.len());
    let _ = writeln!(out, "  New:              {}", result.only_in_new.len());
    let _ = writeln!(out, "  Common:           {}", result.common.len());
    let _ = writeln!(out, "  Changed:          {}", result.changed.len());
    let _ = writeln!(out, "  Unchanged:        {}", result.unchanged.len());
    if !result.skipped.is_empty() {
        let _ = writeln!(out, "  Skipped:          {}", result.skipped.len());
    }
    let _ = writeln!(out, "{rule}");
    out
}

/// For changed paths of the new tree, original paths holding identical content
fn relocated_content(
    groups: &std::collections::BTreeMap<dirdelta_common::Sha256Digest, HashGroup>,
    changed: &[PathBuf],
) -> Vec<(PathBuf, Vec<PathBuf>)> {
    changed
        .iter()
        .filter_map(|path| {
            let sources: Vec<PathBuf> = groups_containing(groups, TreeSide::New, path)
                .flat_map(|(_, group)| group.original.iter().cloned())
                .collect();
            (!sources.is_empty()).then(|| (path.clone(), sources))
        })
        .collect()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn path_strings(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| path_string(p)).collect()
}
