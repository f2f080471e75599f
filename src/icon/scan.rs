//! Icon discovery over the template tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::asset::{WalkMode, walk_tree};
use crate::build::BuildError;
use crate::debug;
use crate::template::macros::icon_names;
use crate::utils::fs::read_bytes;

/// An icon to resolve: `name` is what templates use and what the cache file
/// is called, `remote` is what the icon source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    pub name: String,
    pub remote: String,
}

/// Collect every distinct icon name used by the templates, plus the ones
/// declared in the configuration. Read-only over the templates; only
/// `icons_dir` is created.
pub fn discover_icons(
    templates_dir: &Path,
    icons_dir: &Path,
    declared: &BTreeMap<String, String>,
) -> Result<Vec<IconRequest>, BuildError> {
    let mut sources: Vec<PathBuf> = Vec::new();
    walk_tree(templates_dir, icons_dir, WalkMode::Flattened, &mut |entry| {
        sources.push(entry.source.to_path_buf());
        Ok(())
    })?;

    let per_file: Vec<Vec<String>> = sources
        .par_iter()
        .map(|path| {
            let bytes = read_bytes(path)?;
            let Ok(text) = std::str::from_utf8(&bytes) else {
                return Ok(Vec::new());
            };
            let names: Vec<String> = icon_names(text).map(str::to_string).collect();
            if !names.is_empty() {
                debug!("icon"; "{} uses {}", path.display(), names.join(", "));
            }
            Ok(names)
        })
        .collect::<Result<_, BuildError>>()?;

    let mut wanted: BTreeMap<String, String> = declared.clone();
    for name in per_file.into_iter().flatten() {
        wanted.entry(name.clone()).or_insert(name);
    }

    Ok(wanted
        .into_iter()
        .map(|(name, remote)| IconRequest { name, remote })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(requests: &[IconRequest]) -> Vec<&str> {
        requests.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_deduplicates_across_templates() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(templates.join("partials")).unwrap();
        fs::write(templates.join("index.html"), r#"{{ icon "a" }} {{ icon "b" c(big) }}"#).unwrap();
        fs::write(templates.join("partials/nav.html"), r#"{{ icon "a" }}{{ icon "c" }}"#).unwrap();

        let icons_dir = dir.path().join("build/icons");
        let requests = discover_icons(&templates, &icons_dir, &BTreeMap::new()).unwrap();

        assert_eq!(names(&requests), vec!["a", "b", "c"]);
        assert!(requests.iter().all(|r| r.name == r.remote));
        assert!(icons_dir.is_dir());
        // Templates are never mirrored into the icon directory
        assert_eq!(fs::read_dir(&icons_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_declared_icons_are_seeded() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("page.html"), r#"{{ icon "brand" }}{{ icon "sun" }}"#).unwrap();

        let declared = BTreeMap::from([
            ("brand".to_string(), "github".to_string()),
            ("menu".to_string(), "menu".to_string()),
        ]);
        let requests = discover_icons(&templates, &dir.path().join("icons"), &declared).unwrap();

        assert_eq!(names(&requests), vec!["brand", "menu", "sun"]);
        assert_eq!(requests[0].remote, "github");
    }

    #[test]
    fn test_binary_templates_are_skipped() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("logo.png"), [0xff, 0xfe, b'{', b'{']).unwrap();

        let requests = discover_icons(&templates, &dir.path().join("icons"), &BTreeMap::new()).unwrap();
        assert!(requests.is_empty());
    }

    #[test]
    fn test_missing_templates_dir_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = discover_icons(&dir.path().join("nope"), &dir.path().join("icons"), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, BuildError::SourceRead { .. }));
    }
}
