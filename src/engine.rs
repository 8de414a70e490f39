//! Migration engine
//!
//! Orchestrates a run: resolve the plan, pull candidate files into an
//! in-memory working set, chain each unit's rewrites over that set, then
//! persist in one final phase. Nothing touches disk until every unit has run,
//! so a failed run leaves the project exactly as it was.

use crate::backup::{FsBackup, FsPersist, Persist, Snapshot};
use crate::chain::MigrationSet;
use crate::detect::{detect_version, update_bevy_version};
use crate::error::MigrateError;
use crate::files::{build_globset, FileScanner};
use crate::rewrite::{AppliedTransform, RewriteExecutor, RewriteResult};
use crate::rule::{CallbackRegistry, MigrationUnit, Rule};
use globset::GlobSet;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Run configuration
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub dry_run: bool,
    pub exclude: Vec<String>,
    pub force: bool,
    pub backup_dir: Option<PathBuf>,
    /// Worker threads, 0 means one per CPU
    pub jobs: usize,
    /// Time limit for rewriting a single file within one unit
    pub file_timeout: Duration,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        MigrationOptions {
            dry_run: false,
            exclude: Vec::new(),
            force: false,
            backup_dir: None,
            jobs: 0,
            file_timeout: Duration::from_secs(30),
        }
    }
}

/// Per-file outcome in the report
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub modified: bool,
    pub transforms: Vec<AppliedTransform>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Default)]
pub struct MigrationReport {
    pub from_version: String,
    pub to_version: String,
    pub plan_applied: Vec<String>,
    pub files_scanned: usize,
    pub files_modified: usize,
    pub total_transformations: usize,
    pub manifest_updated: bool,
    pub per_file: Vec<FileReport>,
    pub warnings: Vec<String>,
    /// Rule ids that matched via the regex fallback, so their rewrites
    /// deserve a manual review
    pub degraded_rules: Vec<String>,
    pub backup: Option<PathBuf>,
    pub dry_run: bool,
}

impl MigrationReport {
    /// 0 for a clean run (including a no-op), 2 when the run completed with
    /// warnings. Degraded-accuracy notes do not affect the exit code. Fatal
    /// errors never produce a report.
    pub fn exit_code(&self) -> i32 {
        if self.warnings.is_empty() {
            0
        } else {
            2
        }
    }
}

struct FileState {
    original: String,
    current: String,
    transforms: Vec<AppliedTransform>,
}

impl FileState {
    fn modified(&self) -> bool {
        self.current != self.original
    }
}

/// The migration driver
pub struct MigrationEngine {
    set: MigrationSet,
    callbacks: CallbackRegistry,
    options: MigrationOptions,
    snapshot: Box<dyn Snapshot>,
    persist: Box<dyn Persist>,
}

impl MigrationEngine {
    pub fn new(set: MigrationSet, callbacks: CallbackRegistry, options: MigrationOptions) -> Self {
        let snapshot: Box<dyn Snapshot> = match &options.backup_dir {
            Some(dir) => Box::new(FsBackup::with_dir(dir.clone())),
            None => Box::new(FsBackup::new()),
        };
        MigrationEngine {
            set,
            callbacks,
            options,
            snapshot,
            persist: Box::new(FsPersist),
        }
    }

    pub fn with_snapshot(mut self, snapshot: Box<dyn Snapshot>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn with_persist(mut self, persist: Box<dyn Persist>) -> Self {
        self.persist = persist;
        self
    }

    /// Register an extra migration unit, e.g. from a `--rules-dir` file
    pub fn add_unit(&mut self, unit: MigrationUnit) {
        self.set.add_unit(unit);
    }

    /// Settle the start version: detect, then reconcile with any explicit
    /// claim. A mismatch is fatal unless `force` accepts the claim.
    fn start_version(&self, root: &Path, declared: Option<&str>) -> Result<String, MigrateError> {
        let detected = detect_version(root)?;
        match (declared, detected) {
            (Some(declared), Some(detected)) if declared != detected && !self.options.force => {
                Err(MigrateError::VersionMismatch {
                    declared: declared.to_string(),
                    detected,
                })
            }
            (Some(declared), _) => Ok(declared.to_string()),
            (None, Some(detected)) => {
                info!("detected bevy {detected}");
                Ok(detected)
            }
            (None, None) => Err(MigrateError::VersionUndetected),
        }
    }

    /// Run the migration. Fatal errors abort before any file is touched;
    /// per-file problems become report warnings and exit code 2.
    pub fn run(
        &self,
        root: &Path,
        from: Option<&str>,
        target: &str,
    ) -> Result<MigrationReport, MigrateError> {
        let start = self.start_version(root, from)?;
        let plan = self.set.resolve(&start, target)?;

        let mut report = MigrationReport {
            from_version: start.clone(),
            to_version: target.to_string(),
            plan_applied: plan.keys(),
            dry_run: self.options.dry_run,
            ..MigrationReport::default()
        };
        if plan.is_empty() {
            info!("already at {target}, nothing to do");
            return Ok(report);
        }
        info!(
            "migrating {} from {start} to {target} ({} steps)",
            root.display(),
            plan.units.len()
        );

        let mut working: BTreeMap<PathBuf, FileState> = BTreeMap::new();
        for unit in &plan.units {
            self.apply_unit(root, unit, &mut working, &mut report)?;
        }

        self.bump_manifest(root, target, &mut working, &mut report)?;

        report.files_scanned = working.len();
        for (path, state) in &working {
            if state.modified() || !state.transforms.is_empty() {
                report.per_file.push(FileReport {
                    path: path.clone(),
                    modified: state.modified(),
                    transforms: state.transforms.clone(),
                });
            }
        }
        report.files_modified = report.per_file.iter().filter(|f| f.modified).count();
        report.total_transformations = report
            .per_file
            .iter()
            .map(|f| f.transforms.len())
            .sum();

        if !self.options.dry_run {
            self.persist_phase(root, &working, &mut report);
        }
        Ok(report)
    }

    /// Apply one unit across the working set, reading new candidates from
    /// disk and running files in parallel.
    fn apply_unit(
        &self,
        root: &Path,
        unit: &MigrationUnit,
        working: &mut BTreeMap<PathBuf, FileState>,
        report: &mut MigrationReport,
    ) -> Result<(), MigrateError> {
        debug!("applying {}", unit.key());
        let scanner = FileScanner::new(root, &unit.file_globs(), &self.options.exclude)?;
        let candidates = scanner.scan()?;

        for rel in &candidates {
            if working.contains_key(rel) {
                continue;
            }
            match std::fs::read_to_string(root.join(rel)) {
                Ok(content) => {
                    working.insert(
                        rel.clone(),
                        FileState {
                            original: content.clone(),
                            current: content,
                            transforms: Vec::new(),
                        },
                    );
                }
                Err(e) => {
                    warn!("skipping {}: {e}", rel.display());
                    report.warnings.push(format!("{}: skipped, {e}", rel.display()));
                }
            }
        }

        // Rule globs are resolved once per unit, not per file
        let rules: Vec<(&Rule, GlobSet)> = unit
            .rules
            .iter()
            .map(|rule| Ok((rule, build_globset(&rule.file_globs)?)))
            .collect::<Result<_, MigrateError>>()?;

        let inputs: Vec<(&PathBuf, &str)> = working
            .iter()
            .filter(|(path, _)| candidates.contains(path))
            .map(|(path, state)| (path, state.current.as_str()))
            .collect();

        let timeout = self.options.file_timeout;
        let registry = &self.callbacks;
        let run_file = |(path, content): &(&PathBuf, &str)| -> (PathBuf, Result<RewriteResult, String>) {
            let applicable: Vec<Rule> = rules
                .iter()
                .filter(|(_, globs)| globs.is_match(path))
                .map(|(rule, _)| (*rule).clone())
                .collect();
            let deadline = Instant::now() + timeout;
            let outcome = RewriteExecutor::new(registry)
                .with_deadline(deadline, timeout.as_secs())
                .apply(&applicable, path, content)
                .map_err(|e| e.to_string());
            ((*path).clone(), outcome)
        };

        let results: Vec<(PathBuf, Result<RewriteResult, String>)> = if self.options.jobs == 1 {
            inputs.iter().map(run_file).collect()
        } else {
            let threads = if self.options.jobs > 0 {
                self.options.jobs
            } else {
                num_cpus::get()
            };
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| inputs.par_iter().map(run_file).collect()),
                Err(e) => {
                    warn!("thread pool unavailable, running sequentially: {e}");
                    inputs.iter().map(run_file).collect()
                }
            }
        };

        for (path, outcome) in results {
            match outcome {
                Ok(result) => {
                    for degraded in result.degraded_rules {
                        let rewrote = result.transforms.iter().any(|t| t.rule_id == degraded);
                        if rewrote && !report.degraded_rules.contains(&degraded) {
                            warn!("rule {degraded} rewrote via regex fallback, review its changes");
                            report.degraded_rules.push(degraded);
                        }
                    }
                    let state = working.get_mut(&path).unwrap();
                    state.current = result.content;
                    state.transforms.extend(result.transforms);
                }
                Err(message) => {
                    warn!("{} in {}: {message}", unit.key(), path.display());
                    report
                        .warnings
                        .push(format!("{} ({}): {message}", path.display(), unit.key()));
                }
            }
        }
        Ok(())
    }

    /// Rewrite the bevy dependency version in Cargo.toml after the last unit
    fn bump_manifest(
        &self,
        root: &Path,
        target: &str,
        working: &mut BTreeMap<PathBuf, FileState>,
        report: &mut MigrationReport,
    ) -> Result<(), MigrateError> {
        let manifest_rel = PathBuf::from("Cargo.toml");
        if !working.contains_key(&manifest_rel) {
            let content = std::fs::read_to_string(root.join(&manifest_rel))?;
            working.insert(
                manifest_rel.clone(),
                FileState {
                    original: content.clone(),
                    current: content,
                    transforms: Vec::new(),
                },
            );
        }
        let state = working.get_mut(&manifest_rel).unwrap();
        let (updated, changed) = update_bevy_version(&state.current, target);
        if changed {
            state.current = updated;
            report.manifest_updated = true;
            info!("Cargo.toml: bevy version set to {target}");
        }
        Ok(())
    }

    /// Snapshot then write every modified file. Failures here never fail the
    /// run; they surface as warnings and exit code 2.
    fn persist_phase(
        &self,
        root: &Path,
        working: &BTreeMap<PathBuf, FileState>,
        report: &mut MigrationReport,
    ) {
        let modified: Vec<&PathBuf> = working
            .iter()
            .filter(|(_, state)| state.modified())
            .map(|(path, _)| path)
            .collect();
        if modified.is_empty() {
            return;
        }

        let to_backup: Vec<PathBuf> = modified.iter().map(|p| (*p).clone()).collect();
        match self.snapshot.snapshot(root, &to_backup) {
            Ok(handle) => {
                info!(
                    "backed up {} files to {}",
                    handle.file_count,
                    handle.location.display()
                );
                report.backup = Some(handle.location);
            }
            Err(e) => {
                warn!("backup failed, no files written: {e}");
                report
                    .warnings
                    .push(format!("backup failed, no files written: {e}"));
                return;
            }
        }

        for (written, path) in modified.iter().enumerate() {
            let state = &working[*path];
            if let Err(e) = self.persist.persist(root, path, &state.current) {
                // Files after the failure stay on disk untouched; the report
                // must not claim them as modified.
                let unwritten: Vec<String> = modified[written..]
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                warn!("write failed, stopping: {e}");
                report.warnings.push(format!(
                    "write failed, stopping: {e}; left unwritten: {}",
                    unwritten.join(", ")
                ));
                for unwritten_path in &modified[written..] {
                    if let Some(entry) = report
                        .per_file
                        .iter_mut()
                        .find(|entry| entry.path == **unwritten_path)
                    {
                        entry.modified = false;
                    }
                }
                report.files_modified = report.per_file.iter().filter(|f| f.modified).count();
                return;
            }
            debug!("wrote {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupHandle;
    use crate::catalog;
    use crate::rule::Rule;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn project(bevy_version: &str, main_rs: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            format!("[package]\nname = \"game\"\n\n[dependencies]\nbevy = \"{bevy_version}\"\n"),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), main_rs).unwrap();
        dir
    }

    fn engine(options: MigrationOptions) -> MigrationEngine {
        MigrationEngine::new(catalog::builtin(), catalog::callbacks(), options)
    }

    struct CountingPersist(Arc<AtomicUsize>);

    impl Persist for CountingPersist {
        fn persist(&self, _: &Path, _: &Path, _: &str) -> Result<(), MigrateError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailSecondWrite(Arc<AtomicUsize>);

    impl Persist for FailSecondWrite {
        fn persist(&self, root: &Path, rel: &Path, content: &str) -> Result<(), MigrateError> {
            if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                FsPersist.persist(root, rel, content)
            } else {
                Err(MigrateError::Persist {
                    path: rel.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                })
            }
        }
    }

    struct FailingSnapshot;

    impl Snapshot for FailingSnapshot {
        fn snapshot(&self, _: &Path, _: &[PathBuf]) -> Result<BackupHandle, MigrateError> {
            Err(MigrateError::Snapshot("disk full".to_string()))
        }
    }

    #[test]
    fn test_single_step_run_writes_and_bumps_manifest() {
        let dir = project("0.12", "fn jump(keys: Res<Input<KeyCode>>) {}\n");
        let report = engine(MigrationOptions::default())
            .run(dir.path(), None, "0.13")
            .unwrap();

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.from_version, "0.12");
        assert_eq!(report.files_modified, 2);
        assert!(report.manifest_updated);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.rs")).unwrap(),
            "fn jump(keys: Res<ButtonInput<KeyCode>>) {}\n"
        );
        assert!(fs::read_to_string(dir.path().join("Cargo.toml"))
            .unwrap()
            .contains("bevy = \"0.13\""));
        let backup = report.backup.unwrap();
        assert_eq!(
            fs::read_to_string(backup.join("src/main.rs")).unwrap(),
            "fn jump(keys: Res<Input<KeyCode>>) {}\n"
        );
    }

    #[test]
    fn test_multi_hop_chains_units_in_memory() {
        // 0.12 Input must pass through ButtonInput before the 0.15->0.16
        // query change can see the same file.
        let dir = project(
            "0.12",
            "fn pause(keys: Res<Input<KeyCode>>, q: Query<&Player>) {\n    let p = q.get_single();\n}\n",
        );
        let report = engine(MigrationOptions::default())
            .run(dir.path(), None, "0.16")
            .unwrap();
        assert_eq!(report.exit_code(), 0);
        let out = fs::read_to_string(dir.path().join("src/main.rs")).unwrap();
        assert!(out.contains("Res<ButtonInput<KeyCode>>"));
        assert!(out.contains("q.single()"));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = project("0.12", "fn jump(keys: Res<Input<KeyCode>>) {}\n");
        let options = MigrationOptions {
            dry_run: true,
            ..MigrationOptions::default()
        };
        let report = engine(options).run(dir.path(), None, "0.13").unwrap();

        assert!(report.files_modified > 0);
        assert!(report.backup.is_none());
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.rs")).unwrap(),
            "fn jump(keys: Res<Input<KeyCode>>) {}\n"
        );
        assert!(fs::read_to_string(dir.path().join("Cargo.toml"))
            .unwrap()
            .contains("bevy = \"0.12\""));
    }

    #[test]
    fn test_dry_run_report_matches_real_run() {
        let source = "fn jump(keys: Res<Input<KeyCode>>) {}\n";
        let dry_dir = project("0.12", source);
        let wet_dir = project("0.12", source);
        let dry = engine(MigrationOptions {
            dry_run: true,
            ..MigrationOptions::default()
        })
        .run(dry_dir.path(), None, "0.13")
        .unwrap();
        let wet = engine(MigrationOptions::default())
            .run(wet_dir.path(), None, "0.13")
            .unwrap();
        assert_eq!(dry.files_modified, wet.files_modified);
        assert_eq!(dry.total_transformations, wet.total_transformations);
        let by_main = |r: &MigrationReport| {
            r.per_file
                .iter()
                .find(|f| f.path.ends_with("main.rs"))
                .unwrap()
                .transforms[0]
                .after
                .clone()
        };
        assert_eq!(by_main(&dry), by_main(&wet));
    }

    #[test]
    fn test_per_file_failure_is_isolated() {
        let dir = project("0.12", "fn ok(keys: Res<Input<KeyCode>>) {}\n");
        fs::write(dir.path().join("src/audio.rs"), "fn also_ok() {}\n").unwrap();

        let mut set = MigrationSet::new(&["0.12", "0.13"]);
        set.add_unit(MigrationUnit::new(
            "0.12",
            "0.13",
            "",
            vec![
                Rule::new("rename", "Input<$T>", "ButtonInput<$T>", ""),
                Rule::with_callback("broken", "fn also_ok", "missing_callback", "")
                    .globs(&["**/audio.rs"]),
            ],
        ));
        let report = MigrationEngine::new(set, CallbackRegistry::new(), MigrationOptions::default())
            .run(dir.path(), None, "0.13")
            .unwrap();

        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("missing_callback"));
        // The healthy file still migrated
        assert!(fs::read_to_string(dir.path().join("src/main.rs"))
            .unwrap()
            .contains("ButtonInput"));
        assert_eq!(
            fs::read_to_string(dir.path().join("src/audio.rs")).unwrap(),
            "fn also_ok() {}\n"
        );
    }

    #[test]
    fn test_resolution_failure_never_persists() {
        let dir = project("0.14", "fn x() {}\n");
        let count = Arc::new(AtomicUsize::new(0));
        let err = engine(MigrationOptions::default())
            .with_persist(Box::new(CountingPersist(count.clone())))
            .run(dir.path(), None, "0.12")
            .unwrap_err();
        assert!(matches!(err, MigrateError::NoPathFound { .. }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_snapshot_failure_blocks_all_writes() {
        let dir = project("0.12", "fn jump(keys: Res<Input<KeyCode>>) {}\n");
        let count = Arc::new(AtomicUsize::new(0));
        let report = engine(MigrationOptions::default())
            .with_snapshot(Box::new(FailingSnapshot))
            .with_persist(Box::new(CountingPersist(count.clone())))
            .run(dir.path(), None, "0.13")
            .unwrap();
        assert_eq!(report.exit_code(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_partial_write_downgrades_unwritten_files() {
        // Cargo.toml writes first (BTreeMap order), then src/main.rs fails.
        let dir = project("0.12", "fn jump(keys: Res<Input<KeyCode>>) {}\n");
        let count = Arc::new(AtomicUsize::new(0));
        let report = engine(MigrationOptions::default())
            .with_persist(Box::new(FailSecondWrite(count)))
            .run(dir.path(), None, "0.13")
            .unwrap();

        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.files_modified, 1);
        let main = report
            .per_file
            .iter()
            .find(|f| f.path.ends_with("main.rs"))
            .unwrap();
        assert!(!main.modified);
        // Its rewrites are still listed so the user can apply them by hand
        assert!(!main.transforms.is_empty());
        assert!(report.warnings[0].contains("main.rs"));
    }

    #[test]
    fn test_degraded_rule_surfaces_in_report() {
        let dir = project(
            "0.16",
            "fn setup() { commands.spawn(Camera { hdr: true, ..default() }); }\n",
        );
        let report = engine(MigrationOptions {
            dry_run: true,
            ..MigrationOptions::default()
        })
        .run(dir.path(), None, "0.17")
        .unwrap();
        assert!(report.degraded_rules.contains(&"camera-hdr".to_string()));
        // Reduced accuracy is advisory, not a failure
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let source = "fn jump(keys: Res<Input<KeyCode>>) {}\n";
        let seq_dir = project("0.12", source);
        let par_dir = project("0.12", source);
        let seq = engine(MigrationOptions {
            jobs: 1,
            ..MigrationOptions::default()
        })
        .run(seq_dir.path(), None, "0.13")
        .unwrap();
        let par = engine(MigrationOptions {
            jobs: 4,
            ..MigrationOptions::default()
        })
        .run(par_dir.path(), None, "0.13")
        .unwrap();
        assert_eq!(seq.total_transformations, par.total_transformations);
        assert_eq!(
            fs::read_to_string(seq_dir.path().join("src/main.rs")).unwrap(),
            fs::read_to_string(par_dir.path().join("src/main.rs")).unwrap()
        );
    }

    #[test]
    fn test_already_at_target_is_noop() {
        let dir = project("0.18", "fn x() {}\n");
        let count = Arc::new(AtomicUsize::new(0));
        let report = engine(MigrationOptions::default())
            .with_persist(Box::new(CountingPersist(count.clone())))
            .run(dir.path(), None, "0.18")
            .unwrap();
        assert_eq!(report.exit_code(), 0);
        assert!(report.plan_applied.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_version_mismatch_requires_force() {
        let dir = project("0.14", "fn x() {}\n");
        let err = engine(MigrationOptions::default())
            .run(dir.path(), Some("0.13"), "0.15")
            .unwrap_err();
        assert!(matches!(err, MigrateError::VersionMismatch { .. }));

        let report = engine(MigrationOptions {
            force: true,
            ..MigrationOptions::default()
        })
        .run(dir.path(), Some("0.13"), "0.15")
        .unwrap();
        assert_eq!(report.from_version, "0.13");
    }

    #[test]
    fn test_undetectable_version_without_flag_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();
        let err = engine(MigrationOptions::default())
            .run(dir.path(), None, "0.18")
            .unwrap_err();
        assert!(matches!(err, MigrateError::VersionUndetected));
    }

    #[test]
    fn test_second_run_is_noop() {
        let dir = project("0.12", "fn jump(keys: Res<Input<KeyCode>>) {}\n");
        engine(MigrationOptions::default())
            .run(dir.path(), None, "0.13")
            .unwrap();
        // The manifest bump moves detection forward, so the rerun resolves
        // an empty plan.
        let again = engine(MigrationOptions::default())
            .run(dir.path(), None, "0.13")
            .unwrap();
        assert_eq!(again.files_modified, 0);
        assert!(again.plan_applied.is_empty());

        // Forcing the same step again must not rewrite anything either
        let forced = engine(MigrationOptions {
            force: true,
            exclude: vec!["migration_backup/**".to_string()],
            ..MigrationOptions::default()
        })
        .run(dir.path(), Some("0.12"), "0.13")
        .unwrap();
        assert_eq!(forced.total_transformations, 0);
    }

    #[test]
    fn test_excludes_respected() {
        let dir = project("0.12", "fn jump(keys: Res<Input<KeyCode>>) {}\n");
        fs::create_dir_all(dir.path().join("legacy")).unwrap();
        fs::write(
            dir.path().join("legacy/old.rs"),
            "fn old(keys: Res<Input<KeyCode>>) {}\n",
        )
        .unwrap();
        let report = engine(MigrationOptions {
            exclude: vec!["legacy/**".to_string()],
            ..MigrationOptions::default()
        })
        .run(dir.path(), None, "0.13")
        .unwrap();
        assert_eq!(report.exit_code(), 0);
        assert!(fs::read_to_string(dir.path().join("legacy/old.rs"))
            .unwrap()
            .contains("Res<Input<KeyCode>>"));
    }

    #[test]
    fn test_extra_unit_from_yaml() {
        let dir = project("0.12", "fn x() { legacy_api(); }\n");
        let yaml = r#"
from: "0.12"
to: "0.13"
part: 9
description: project-local rules
rules:
  - id: local-rename
    pattern: "legacy_api()"
    replacement: "modern_api()"
"#;
        let mut eng = engine(MigrationOptions::default());
        eng.add_unit(MigrationUnit::from_yaml(yaml).unwrap());
        let report = eng.run(dir.path(), None, "0.13").unwrap();
        assert_eq!(report.exit_code(), 0);
        assert!(fs::read_to_string(dir.path().join("src/main.rs"))
            .unwrap()
            .contains("modern_api()"));
    }
}
