//! Category build: walk, compile, hash, rewrite, write.
//!
//! All files of a category are compiled in memory before anything is
//! written, so a malformed source aborts the category with no output.
//! Files are then emitted in reference order: a file that references a
//! sibling is hashed after that sibling, which puts the sibling's hashed
//! name into the bytes being digested.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::hash::{HashTable, HashedAsset, HashingPolicy, hashed_name, is_hashed};
use super::minify::{Compiled, Compiler};
use super::rewrite::{Rewriter, mentions};
use super::walk::{WalkMode, walk_tree};
use super::AssetCategory;
use crate::build::BuildError;
use crate::logger::ProgressLine;
use crate::utils::fs::{read_text, write_file};
use crate::{debug, log};

/// Inputs for one category pass.
pub struct CategoryBuild<'a> {
    pub category: AssetCategory,
    pub source_dir: &'a Path,
    /// Build root; output lands in `<build_root>/<category dir>/`.
    pub build_root: &'a Path,
    pub compiler: &'a dyn Compiler,
    pub policy: HashingPolicy,
    pub public_path: &'a str,
}

/// A source file located by the walk.
#[derive(Debug)]
struct SourceFile {
    name: String,
    source: PathBuf,
    dest_dir: PathBuf,
    rel_dir: String,
}

impl SourceFile {
    fn rel_name(&self) -> String {
        format!("{}{}", self.rel_dir, self.name)
    }
}

/// Build one category into the build root, recording hashed names in
/// `table`. Returns the paths written, in emit order.
pub fn compile_category(
    job: &CategoryBuild<'_>,
    table: &mut HashTable,
    progress: Option<&ProgressLine>,
) -> Result<Vec<PathBuf>, BuildError> {
    let dest_root = job.build_root.join(job.category.dir_name());
    let label = job.category.dir_name();

    let mut files = Vec::new();
    walk_tree(job.source_dir, &dest_root, WalkMode::Mirrored, &mut |entry| {
        files.push(SourceFile {
            name: entry.name.to_string(),
            source: entry.source.to_path_buf(),
            dest_dir: entry
                .dest
                .parent()
                .map_or_else(|| dest_root.clone(), Path::to_path_buf),
            rel_dir: entry.url_dir(),
        });
        Ok(())
    })?;

    let compiled: Vec<Compiled> = files
        .par_iter()
        .map(|file| {
            let source = read_text(&file.source)?;
            debug!(label; "min {}", file.rel_name());
            let out = job
                .compiler
                .compile(&file.name, &source)
                .map_err(|message| BuildError::Compile {
                    file: file.rel_name(),
                    message,
                })?;
            if let Some(p) = progress {
                p.inc(label);
            }
            Ok(out)
        })
        .collect::<Result<_, BuildError>>()?;

    let order = reference_order(job, &files, &compiled);

    let mut written = Vec::with_capacity(files.len());
    for index in order {
        let file = &files[index];
        let code = Rewriter::new(table, job.public_path)
            .rewrite_except(&compiled[index].code, Some(file.name.as_str()));

        let file_name = match job.policy {
            // Prebuilt files that already carry a digest keep their name
            HashingPolicy::Hash if is_hashed(&file.name) => file.name.clone(),
            HashingPolicy::Hash => {
                let hashed = hashed_name(&file.name, code.as_bytes());
                let asset = HashedAsset {
                    hashed: hashed.clone(),
                    category: job.category,
                    rel_dir: file.rel_dir.clone(),
                };
                if let Some(previous) = table.insert(file.name.clone(), asset) {
                    log!("warn"; "`{}` shadows `{}{}`: references by name now resolve to `{}`",
                        file.rel_name(), previous.rel_dir, file.name, hashed);
                }
                hashed
            }
            HashingPolicy::PassThrough => file.name.clone(),
        };

        let dest = file.dest_dir.join(&file_name);
        write_file(&dest, &code)?;
        if let Some(map) = &compiled[index].source_map {
            write_file(&file.dest_dir.join(format!("{file_name}.map")), map)?;
        }
        debug!(label; "{} -> {}", file.rel_name(), file_name);
        written.push(dest);
    }

    Ok(written)
}

/// Emit order where referenced siblings come first.
///
/// Ties keep walk order. A reference cycle cannot be satisfied; it is
/// broken at the earliest remaining file and the references that point
/// forward stay un-hashed.
fn reference_order(job: &CategoryBuild<'_>, files: &[SourceFile], compiled: &[Compiled]) -> Vec<usize> {
    let deps: Vec<Vec<usize>> = compiled
        .iter()
        .enumerate()
        .map(|(i, out)| {
            files
                .iter()
                .enumerate()
                .filter(|(j, other)| {
                    *j != i
                        && other.name != files[i].name
                        && mentions(&out.code, job.category, &other.name, &other.rel_dir, job.public_path)
                })
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut done = vec![false; files.len()];
    let mut order = Vec::with_capacity(files.len());
    while order.len() < files.len() {
        let ready = (0..files.len()).find(|&i| !done[i] && deps[i].iter().all(|&d| done[d]));
        let next = match ready {
            Some(i) => i,
            None => {
                let Some(i) = (0..files.len()).find(|&i| !done[i]) else {
                    break;
                };
                log!("warn"; "reference cycle through `{}`; some references stay unhashed", files[i].rel_name());
                i
            }
        };
        done[next] = true;
        order.push(next);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::CssCompiler;
    use std::fs;
    use tempfile::TempDir;

    const PUBLIC: &str = "/static/build";

    /// Returns the source unchanged.
    struct Verbatim;

    impl Compiler for Verbatim {
        fn compile(&self, _file_name: &str, source: &str) -> Result<Compiled, String> {
            Ok(Compiled::code(source))
        }
    }

    /// Rejects any source containing `SYNTAX ERROR`.
    struct Strict;

    impl Compiler for Strict {
        fn compile(&self, _file_name: &str, source: &str) -> Result<Compiled, String> {
            if source.contains("SYNTAX ERROR") {
                Err("unexpected token".into())
            } else {
                Ok(Compiled::code(source))
            }
        }
    }

    fn write_sources(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn run(
        src: &Path,
        build: &Path,
        category: AssetCategory,
        compiler: &dyn Compiler,
        policy: HashingPolicy,
    ) -> (Result<Vec<PathBuf>, BuildError>, HashTable) {
        let mut table = HashTable::new();
        let job = CategoryBuild {
            category,
            source_dir: src,
            build_root: build,
            compiler,
            policy,
            public_path: PUBLIC,
        };
        let result = compile_category(&job, &mut table, None);
        (result, table)
    }

    fn find_output(dir: &Path, suffix: &str) -> PathBuf {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| p.to_string_lossy().ends_with(suffix))
            .unwrap_or_else(|| panic!("no output ending with {suffix}"))
    }

    #[test]
    fn test_import_rewritten_across_files() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("css");
        write_sources(&src, &[("a.css", "@import \"b.css\";\nbody { margin: 0 }"), ("b.css", "p { color: red }")]);
        let build = dir.path().join("build");

        let (result, table) = run(&src, &build, AssetCategory::Style, &CssCompiler::default(), HashingPolicy::Hash);
        result.unwrap();

        let hashed_b = table.hashed_name("b.css").unwrap().to_string();
        let hashed_a = table.hashed_name("a.css").unwrap().to_string();
        assert!(hashed_a.ends_with(".h.a.css"));

        let a = fs::read_to_string(build.join("css").join(&hashed_a)).unwrap();
        assert!(a.contains(&format!("@import \"{hashed_b}\"")));
        assert!(!a.contains("@import \"b.css\""));
        assert!(build.join("css").join(&hashed_b).exists());
    }

    #[test]
    fn test_hash_covers_written_bytes() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("js");
        write_sources(&src, &[("app.js", "use(\"util\");"), ("util.js", "export const x = 1;")]);
        let build = dir.path().join("build");

        let (result, table) = run(&src, &build, AssetCategory::Script, &Verbatim, HashingPolicy::Hash);
        let written = result.unwrap();
        assert_eq!(written.len(), 2);

        // util.js is emitted first because app.js references it.
        assert!(written[0].to_string_lossy().ends_with(".h.util.js"));

        for path in written {
            let bytes = fs::read(&path).unwrap();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let original = name.split_once(".h.").unwrap().1;
            assert_eq!(name, hashed_name(original, &bytes));
        }
        let app = table.hashed_name("app.js").unwrap();
        let util = table.hashed_name("util.js").unwrap().trim_end_matches(".js");
        let app_code = fs::read_to_string(build.join("js").join(app)).unwrap();
        assert_eq!(app_code, format!("use(\"{util}\");"));
    }

    #[test]
    fn test_rebuild_is_stable_and_change_busts_dependents() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("css");
        write_sources(&src, &[("a.css", "@import \"b.css\";"), ("b.css", "p{color:red}")]);

        let (r1, t1) = run(&src, &dir.path().join("b1"), AssetCategory::Style, &Verbatim, HashingPolicy::Hash);
        let (r2, t2) = run(&src, &dir.path().join("b2"), AssetCategory::Style, &Verbatim, HashingPolicy::Hash);
        r1.unwrap();
        r2.unwrap();
        assert_eq!(t1.hashed_name("a.css"), t2.hashed_name("a.css"));
        assert_eq!(t1.hashed_name("b.css"), t2.hashed_name("b.css"));

        fs::write(src.join("b.css"), "p{color:blue}").unwrap();
        let (r3, t3) = run(&src, &dir.path().join("b3"), AssetCategory::Style, &Verbatim, HashingPolicy::Hash);
        r3.unwrap();
        assert_ne!(t1.hashed_name("b.css"), t3.hashed_name("b.css"));
        // a.css embeds b's hashed name, so its own name moves too.
        assert_ne!(t1.hashed_name("a.css"), t3.hashed_name("a.css"));
    }

    #[test]
    fn test_malformed_source_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("js");
        write_sources(&src, &[("good.js", "ok();"), ("bad.js", "SYNTAX ERROR")]);
        let build = dir.path().join("build");

        let (result, table) = run(&src, &build, AssetCategory::Script, &Strict, HashingPolicy::Hash);
        match result {
            Err(BuildError::Compile { file, .. }) => assert_eq!(file, "bad.js"),
            other => panic!("expected compile error, got {other:?}"),
        }
        assert!(table.is_empty());
        assert_eq!(fs::read_dir(build.join("js")).unwrap().count(), 0);
    }

    #[test]
    fn test_nested_sources_mirror_layout() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("css");
        write_sources(&src, &[("admin/panel.css", "div{}")]);
        let build = dir.path().join("build");

        let (result, table) = run(&src, &build, AssetCategory::Style, &Verbatim, HashingPolicy::Hash);
        result.unwrap();

        let asset = table.get("panel.css").unwrap();
        assert_eq!(asset.rel_dir, "admin/");
        assert!(build.join("css/admin").join(&asset.hashed).exists());
    }

    #[test]
    fn test_pass_through_keeps_names() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("css");
        write_sources(&src, &[("a.css", "@import \"b.css\";"), ("b.css", "p{}")]);
        let build = dir.path().join("build");

        let (result, table) = run(&src, &build, AssetCategory::Style, &Verbatim, HashingPolicy::PassThrough);
        result.unwrap();

        assert!(table.is_empty());
        assert_eq!(fs::read_to_string(build.join("css/a.css")).unwrap(), "@import \"b.css\";");
        let _ = find_output(&build.join("css"), "b.css");
    }

    #[test]
    fn test_cycle_still_emits_everything() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("css");
        write_sources(&src, &[("a.css", "@import \"b.css\";"), ("b.css", "@import \"a.css\";")]);
        let build = dir.path().join("build");

        let (result, table) = run(&src, &build, AssetCategory::Style, &Verbatim, HashingPolicy::Hash);
        assert_eq!(result.unwrap().len(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_self_reference_untouched() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("js");
        write_sources(&src, &[("app.js", "const self = reg_ns(\"app\");")]);
        let build = dir.path().join("build");

        let (result, _) = run(&src, &build, AssetCategory::Script, &Verbatim, HashingPolicy::Hash);
        let written = result.unwrap();
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            "const self = reg_ns(\"app\");"
        );
    }
}
