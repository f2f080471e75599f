//! Build orchestration.
//!
//! One build walks a fixed sequence of states:
//!
//! ```text
//! Init -> PrepareDirs -> ClearStale -> SeedTemplates -> CompileStyles
//!      -> CompileScripts -> DiscoverIcons -> FetchIcons -> ExpandTemplates -> Done
//! ```
//!
//! Any error moves straight to `Failed` and the remaining states are skipped.

mod error;
mod vars;

pub use error::{BuildError, BuildFailure, FetchFailures};
pub use vars::{BuildVariables, UNKNOWN_REVISION};

use std::fmt;
use std::time::{Duration, Instant};

use crate::asset::{
    AssetCategory, CategoryBuild, Compiler, CssCompiler, HashTable, HashingPolicy, JsCompiler,
    Rewriter, compile_category,
};
use crate::config::BuildOptions;
use crate::icon::{FetchSummary, IconRequest, IconSource, IconStore, discover_icons};
use crate::logger::ProgressLine;
use crate::template::{self, Expander};
use crate::utils::fs::{collect_all_files, ensure_dir, remove_dir};
use crate::{debug, log};

/// Pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    PrepareDirs,
    ClearStale,
    SeedTemplates,
    CompileStyles,
    CompileScripts,
    DiscoverIcons,
    FetchIcons,
    ExpandTemplates,
    Done,
    Failed,
}

impl BuildState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::PrepareDirs => "prepare-dirs",
            Self::ClearStale => "clear-stale",
            Self::SeedTemplates => "seed-templates",
            Self::CompileStyles => "compile-styles",
            Self::CompileScripts => "compile-scripts",
            Self::DiscoverIcons => "discover-icons",
            Self::FetchIcons => "fetch-icons",
            Self::ExpandTemplates => "expand-templates",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful build did.
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    pub styles: usize,
    pub scripts: usize,
    pub templates: usize,
    /// Files copied while seeding; `None` if already seeded.
    pub seeded: Option<usize>,
    /// `clear_dirs` entries that existed and were removed.
    pub cleared: usize,
    pub icons: FetchSummary,
    pub elapsed: Duration,
}

/// Icons resolved by an icons-only run.
#[derive(Debug, Default, Clone)]
pub struct IconReport {
    pub names: Vec<String>,
    pub summary: FetchSummary,
}

/// Runs the pipeline for one [`BuildOptions`].
pub struct Builder<'a> {
    options: &'a BuildOptions,
    vars: BuildVariables,
    css: CssCompiler,
    js: JsCompiler,
    icon_source: Box<dyn IconSource>,
    progress: bool,
    state: BuildState,
}

impl<'a> Builder<'a> {
    pub fn new(
        options: &'a BuildOptions,
        vars: BuildVariables,
        icon_source: Box<dyn IconSource>,
    ) -> Self {
        Self {
            options,
            vars,
            css: CssCompiler::new(options.css.clone()),
            js: JsCompiler::new(options.js.clone()),
            icon_source,
            progress: true,
            state: BuildState::Init,
        }
    }

    /// Show the `css(n/N) js(n/N) templates(n/N)` line.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run every state.
    pub fn run(mut self) -> Result<BuildReport, BuildFailure> {
        let started = Instant::now();
        let options = self.options;
        let mut report = BuildReport::default();
        let mut table = HashTable::new();

        self.step(BuildState::PrepareDirs, |b| b.prepare_dirs())?;
        report.cleared = self.step(BuildState::ClearStale, |b| b.clear_stale())?;
        report.seeded = self.step(BuildState::SeedTemplates, |_| {
            template::seed_templates(&options.templates_dir, &options.templates_build_dir)
        })?;

        let progress = self.progress.then(|| {
            ProgressLine::new(&[
                (AssetCategory::Style.dir_name(), collect_all_files(&options.css_dir).len()),
                (AssetCategory::Script.dir_name(), collect_all_files(&options.js_dir).len()),
                (template::PROGRESS_LABEL, collect_all_files(&options.templates_dir).len()),
            ])
        });

        report.styles = self.step(BuildState::CompileStyles, |b| {
            b.compile(AssetCategory::Style, &mut table, progress.as_ref())
        })?;
        report.scripts = self.step(BuildState::CompileScripts, |b| {
            b.compile(AssetCategory::Script, &mut table, progress.as_ref())
        })?;

        let requests = self.step(BuildState::DiscoverIcons, |b| b.discover())?;
        let store = IconStore::new(options.icons_dir());
        report.icons = self.step(BuildState::FetchIcons, |b| b.fetch(&store, &requests))?;

        report.templates = self.step(BuildState::ExpandTemplates, |b| {
            let expander = Expander {
                vars: &b.vars,
                icons: &store,
                rewriter: Rewriter::new(&table, &options.public_path),
                text_lookup: &options.text_lookup,
            };
            template::expand_templates(
                &options.templates_dir,
                &options.templates_build_dir,
                &expander,
                progress.as_ref(),
            )
        })?;

        if let Some(progress) = progress {
            progress.finish();
        }
        self.enter(BuildState::Done);

        report.elapsed = started.elapsed();
        log!(
            "build";
            "{} styles, {} scripts, {} templates, {} icons ({} fetched, {} cached)",
            report.styles,
            report.scripts,
            report.templates,
            report.icons.total(),
            report.icons.fetched,
            report.icons.cached
        );
        Ok(report)
    }

    /// Resolve icons only: no compile, no template writes.
    pub fn run_icons(mut self) -> Result<IconReport, BuildFailure> {
        self.step(BuildState::PrepareDirs, |b| b.prepare_dirs())?;
        let requests = self.step(BuildState::DiscoverIcons, |b| b.discover())?;
        let store = IconStore::new(self.options.icons_dir());
        let summary = self.step(BuildState::FetchIcons, |b| b.fetch(&store, &requests))?;
        self.enter(BuildState::Done);

        Ok(IconReport {
            names: store.names(),
            summary,
        })
    }

    fn step<T>(
        &mut self,
        state: BuildState,
        run: impl FnOnce(&mut Self) -> Result<T, BuildError>,
    ) -> Result<T, BuildFailure> {
        self.enter(state);
        run(self).map_err(|error| {
            debug!("build"; "{} -> {}", self.state, BuildState::Failed);
            let failure = BuildFailure {
                state: self.state,
                error,
            };
            self.state = BuildState::Failed;
            failure
        })
    }

    fn enter(&mut self, state: BuildState) {
        debug!("build"; "{} -> {}", self.state, state);
        self.state = state;
    }

    fn prepare_dirs(&self) -> Result<(), BuildError> {
        ensure_dir(&self.options.build_dir)?;
        ensure_dir(&self.options.icons_dir())
    }

    fn clear_stale(&self) -> Result<usize, BuildError> {
        let mut cleared = 0;
        for dir in &self.options.clear_dirs {
            let path = self.options.build_dir.join(dir);
            if remove_dir(&path)? {
                debug!("build"; "cleared {}", path.display());
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    fn compile(
        &self,
        category: AssetCategory,
        table: &mut HashTable,
        progress: Option<&ProgressLine>,
    ) -> Result<usize, BuildError> {
        let compiler: &dyn Compiler = match category {
            AssetCategory::Style => &self.css,
            AssetCategory::Script => &self.js,
        };
        let source_dir = match category {
            AssetCategory::Style => &self.options.css_dir,
            AssetCategory::Script => &self.options.js_dir,
        };
        let job = CategoryBuild {
            category,
            source_dir,
            build_root: &self.options.build_dir,
            compiler,
            policy: HashingPolicy::from_flag(self.options.hash),
            public_path: &self.options.public_path,
        };
        let written = compile_category(&job, table, progress)?;
        debug!("build"; "{} {} files", category, written.len());
        Ok(written.len())
    }

    fn discover(&self) -> Result<Vec<IconRequest>, BuildError> {
        let requests = discover_icons(
            &self.options.templates_dir,
            &self.options.icons_dir(),
            &self.options.icons,
        )?;
        debug!("icons"; "{} distinct icons", requests.len());
        Ok(requests)
    }

    fn fetch(&self, store: &IconStore, requests: &[IconRequest]) -> Result<FetchSummary, BuildError> {
        let summary =
            store.resolve_all(requests, self.icon_source.as_ref(), self.options.on_fetch_error)?;
        if summary.fetched > 0 {
            log!("icons"; "fetched {} new icons into {}", summary.fetched, store.dir().display());
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::hash::is_hashed;
    use crate::icon::{IconErrorKind, OfflineSource};
    use crate::utils::date::DateTimeUtc;
    use parking_lot::Mutex;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Serves a fixed SVG for every name and counts calls.
    #[derive(Default)]
    struct FakeIcons {
        calls: std::sync::Arc<Mutex<Vec<String>>>,
    }

    impl IconSource for FakeIcons {
        fn fetch(&self, remote: &str) -> Result<String, IconErrorKind> {
            self.calls.lock().push(remote.to_string());
            Ok(format!("<svg data-name=\"{remote}\"><path/></svg>"))
        }
    }

    fn project() -> (TempDir, BuildOptions) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("static/css")).unwrap();
        fs::create_dir_all(root.join("static/js")).unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();

        fs::write(root.join("static/css/a.css"), "@import \"b.css\";\n.a { color: red; }\n").unwrap();
        fs::write(root.join("static/css/b.css"), ".b { margin: 0; }\n").unwrap();
        fs::write(
            root.join("static/js/app.js"),
            "reg_ns(\"app\");\nuse(\"util\");\nexport const answer = 40 + 2;\n",
        )
        .unwrap();
        fs::write(root.join("static/js/util.js"), "export function twice(x) { return x * 2; }\n")
            .unwrap();
        fs::write(
            root.join("templates/index.html"),
            concat!(
                "<link href=\"/static/build/css/a.css\">\n",
                "<script src=\"/static/build/js/app.js\"></script>\n",
                "<p>{{ var \"commit_short\" }}</p>\n",
                "<h1>{{ text \"title\" }}</h1>\n",
                "{{ icon \"sun\" }}{{ icon \"moon\" c(big) }}{{ icon \"sun\" }}\n",
            ),
        )
        .unwrap();

        let options = BuildOptions::default().resolve(root);
        options.validate().unwrap();
        (dir, options)
    }

    fn vars() -> BuildVariables {
        BuildVariables::new(DateTimeUtc::new(2024, 5, 1, 12, 0, 0), "c0ffee1234")
    }

    fn hashed_file(dir: &Path, name: &str) -> String {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .find(|f| is_hashed(f) && f.ends_with(&format!(".h.{name}")))
            .unwrap_or_else(|| panic!("no hashed {name} in {}", dir.display()))
    }

    #[test]
    fn test_state_names() {
        assert_eq!(BuildState::PrepareDirs.to_string(), "prepare-dirs");
        assert_eq!(BuildState::ExpandTemplates.to_string(), "expand-templates");
        assert_eq!(BuildState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_end_to_end() {
        let (_dir, options) = project();
        let source = FakeIcons::default();
        let calls = std::sync::Arc::clone(&source.calls);

        let report = Builder::new(&options, vars(), Box::new(source))
            .with_progress(false)
            .run()
            .unwrap();
        assert_eq!((report.styles, report.scripts, report.templates), (2, 2, 1));
        assert_eq!(report.icons, FetchSummary { fetched: 2, cached: 0 });

        let css_dir = options.build_dir.join("css");
        let a = hashed_file(&css_dir, "a.css");
        let b = hashed_file(&css_dir, "b.css");
        let a_text = fs::read_to_string(css_dir.join(&a)).unwrap();
        assert!(a_text.contains(&format!("@import \"{b}\"")));

        let js_dir = options.build_dir.join("js");
        let app = hashed_file(&js_dir, "app.js");
        let util = hashed_file(&js_dir, "util.js");
        let app_text = fs::read_to_string(js_dir.join(&app)).unwrap();
        assert!(app_text.contains(&format!("\"{}\"", util.trim_end_matches(".js"))));

        let page = fs::read_to_string(options.templates_build_dir.join("index.html")).unwrap();
        assert!(page.contains(&format!("href=\"/static/build/css/{a}\"")));
        assert!(page.contains(&format!("src=\"/static/build/js/{app}\"")));
        assert!(page.contains("<p>c0ffee1</p>"));
        assert!(page.contains("{{ lang(\"title\") }}"));
        assert!(page.contains("class=\"icon\""));
        assert!(page.contains("class=\"icon big\""));
        assert!(!page.contains("{{ icon"));

        let mut calls = calls.lock().clone();
        calls.sort();
        assert_eq!(calls, vec!["moon", "sun"]);
        assert!(options.icons_dir().join("sun.svg").is_file());
    }

    #[test]
    fn test_rebuild_is_stable_and_uses_icon_cache() {
        let (_dir, options) = project();
        Builder::new(&options, vars(), Box::new(FakeIcons::default()))
            .with_progress(false)
            .run()
            .unwrap();
        let css_dir = options.build_dir.join("css");
        let first = hashed_file(&css_dir, "a.css");

        // Offline: every icon must come from the cache
        let report = Builder::new(&options, vars(), Box::new(OfflineSource))
            .with_progress(false)
            .run()
            .unwrap();
        assert_eq!(report.icons, FetchSummary { fetched: 0, cached: 2 });
        assert_eq!(report.cleared, 2);
        assert_eq!(hashed_file(&css_dir, "a.css"), first);

        // Changing b.css busts both b and its importer a
        fs::write(options.css_dir.join("b.css"), ".b { margin: 1px; }\n").unwrap();
        Builder::new(&options, vars(), Box::new(OfflineSource))
            .with_progress(false)
            .run()
            .unwrap();
        assert_ne!(hashed_file(&css_dir, "a.css"), first);
    }

    #[test]
    fn test_malformed_script_fails_in_compile_scripts() {
        let (_dir, options) = project();
        fs::write(options.js_dir.join("broken.js"), "function (").unwrap();

        let failure = Builder::new(&options, vars(), Box::new(FakeIcons::default()))
            .with_progress(false)
            .run()
            .unwrap_err();

        assert_eq!(failure.state, BuildState::CompileScripts);
        assert!(matches!(failure.error, BuildError::Compile { ref file, .. } if file == "broken.js"));
        assert_eq!(fs::read_dir(options.build_dir.join("js")).unwrap().count(), 0);
        // Templates were seeded but never expanded
        assert!(
            fs::read_to_string(options.templates_build_dir.join("index.html"))
                .unwrap()
                .contains("{{ icon")
        );
    }

    #[test]
    fn test_offline_cache_miss_fails_fetch() {
        let (_dir, options) = project();
        let failure = Builder::new(&options, vars(), Box::new(OfflineSource))
            .with_progress(false)
            .run()
            .unwrap_err();

        assert_eq!(failure.state, BuildState::FetchIcons);
        let BuildError::Fetch(failures) = failure.error else {
            panic!("expected fetch failure");
        };
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn test_icons_only() {
        let (_dir, options) = project();
        let report = Builder::new(&options, vars(), Box::new(FakeIcons::default()))
            .with_progress(false)
            .run_icons()
            .unwrap();

        assert_eq!(report.names, vec!["moon", "sun"]);
        assert_eq!(report.summary.fetched, 2);
        assert!(!options.build_dir.join("css").exists());
        assert!(!options.templates_build_dir.exists());
    }
}
