//! Snapshot command orchestration.
//!
//! For each granularity with a non-zero retention, creates the current
//! snapshot directory and then rotates that granularity's old ones. All
//! granularities share one clock sample.

use std::path::{Path, PathBuf};

use snapkeep_clock::Clock;
use snapkeep_fs::{
    ensure_snapshot, parse_snapshot_label, rotate_snapshots, snapshot_label, CreateOutcome,
    Filesystem, Granularity, LabelZone,
};

use crate::cli::Cli;
use crate::logger::Logger;

use super::{CommandError, CommandResult};

/// What a run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    /// Granularities that were enabled, in processing order.
    pub processed: Vec<Granularity>,
    /// Snapshot directories created by this run.
    pub created: Vec<PathBuf>,
    /// Current snapshots that were already present.
    pub existing: Vec<PathBuf>,
    /// Old snapshot directories removed by rotation.
    pub removed: Vec<PathBuf>,
    /// Non-fatal failures reported during the run.
    pub errors: usize,
}

impl SnapshotSummary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Execute a snapshot run.
///
/// Fails only on invalid arguments or when the snapshot root cannot be
/// created. Every other failure is reported through `logger`, counted in
/// the summary, and isolated to the step that hit it.
pub fn execute_snapshot<C, F, L>(
    args: &Cli,
    clock: &C,
    fs: &F,
    logger: &L,
) -> CommandResult<SnapshotSummary>
where
    C: Clock,
    F: Filesystem,
    L: Logger,
{
    args.validate()?;

    let root = args.snapshot_root();
    fs.create_dir_all(&root)
        .map_err(|source| CommandError::SnapshotRoot {
            path: root.clone(),
            source,
        })?;

    let now = clock.now_unix_sec();
    let zone = args.label_zone();

    logger.verbose(&format!(
        "Snapshot root {}: hourly={}, daily={}, monthly={}, zone={:?}, now={}",
        root.display(),
        args.hourly,
        args.daily,
        args.monthly,
        zone,
        now
    ));

    let mut summary = SnapshotSummary::default();

    for granularity in Granularity::ALL {
        let retention = args.retention(granularity);
        if retention == 0 {
            logger.verbose(&format!("{} snapshots disabled", granularity));
            continue;
        }

        summary.processed.push(granularity);
        create_current(fs, &root, granularity, now, zone, logger, &mut summary);
        rotate(fs, &root, granularity, retention, logger, &mut summary);
    }

    logger.verbose(&format!(
        "Done: {} created, {} already present, {} removed, {} errors",
        summary.created.len(),
        summary.existing.len(),
        summary.removed.len(),
        summary.errors
    ));

    Ok(summary)
}

/// Creator step for one granularity.
fn create_current<F: Filesystem, L: Logger>(
    fs: &F,
    root: &Path,
    granularity: Granularity,
    now: u64,
    zone: LabelZone,
    logger: &L,
    summary: &mut SnapshotSummary,
) {
    let Some(label) = snapshot_label(granularity, now, zone) else {
        logger.info(&format!(
            "failed to compute {} label for timestamp {}",
            granularity, now
        ));
        summary.errors += 1;
        return;
    };

    match ensure_snapshot(fs, root, &label) {
        Ok(CreateOutcome::Created(path)) => {
            logger.info(&format!("Created snapshot: {}", path.display()));
            summary.created.push(path);
        }
        Ok(CreateOutcome::AlreadyExists(path)) => {
            logger.info(&format!("Snapshot {} already exists", path.display()));
            summary.existing.push(path);
        }
        Ok(CreateOutcome::Occupied(path)) => {
            logger.info(&format!(
                "Snapshot {} already exists but is not a directory, leaving it alone",
                path.display()
            ));
            summary.existing.push(path);
        }
        Err(e) => {
            logger.info(&e.to_string());
            summary.errors += 1;
        }
    }
}

/// Rotator step for one granularity.
fn rotate<F: Filesystem, L: Logger>(
    fs: &F,
    root: &Path,
    granularity: Granularity,
    retention: usize,
    logger: &L,
    summary: &mut SnapshotSummary,
) {
    let result = match rotate_snapshots(fs, root, granularity.prefix(), retention) {
        Ok(result) => result,
        Err(e) => {
            logger.info(&format!(
                "failed to read directory {}: {}",
                root.display(),
                e
            ));
            summary.errors += 1;
            return;
        }
    };

    for name in &result.matched {
        let well_formed = parse_snapshot_label(name)
            .map(|(_, stamp)| {
                stamp.len() == granularity.timestamp_width()
                    && stamp.bytes().all(|b| b.is_ascii_digit())
            })
            .unwrap_or(false);
        if !well_formed {
            logger.debug(&format!(
                "{} is not a {} label, ordering it by name only",
                name, granularity
            ));
        }
    }

    logger.verbose(&format!(
        "{}: {} snapshots, retention {}, removing {}",
        granularity,
        result.matched.len(),
        retention,
        result.excess()
    ));

    for path in result.removed {
        logger.info(&format!("Removed old snapshot: {}", path.display()));
        summary.removed.push(path);
    }

    for failure in &result.failed {
        logger.info(&format!(
            "failed to remove snapshot {}: {}",
            failure.path.display(),
            failure.error
        ));
        summary.errors += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_from;
    use crate::logger::{MockLogger, NullLogger, Verbosity};
    use snapkeep_clock::MockClock;
    use snapkeep_fs::MockFilesystem;

    // 2024-01-01 10:00:00 UTC
    const NOW: u64 = 1704103200;

    fn args(extra: &[&str]) -> Cli {
        let mut argv = vec!["snapkeep", "--path", "/data", "--utc"];
        argv.extend_from_slice(extra);
        parse_from(argv).expect("parse")
    }

    fn root() -> PathBuf {
        PathBuf::from("/data/.snap")
    }

    fn seed(fs: &MockFilesystem, names: &[&str]) {
        fs.add_dir(root());
        for name in names {
            fs.add_dir(root().join(name));
        }
    }

    // ===========================================
    // Creation
    // ===========================================

    #[test]
    fn test_creates_root_and_hourly_snapshot() {
        let fs = MockFilesystem::new();
        let logger = MockLogger::new();

        let summary =
            execute_snapshot(&args(&["--hourly", "3"]), &MockClock::new(NOW), &fs, &logger)
                .expect("run");

        assert!(fs.is_dir(&root()));
        assert_eq!(fs.dir_names(&root()), vec!["hourly-2024010110"]);
        assert_eq!(summary.created, vec![root().join("hourly-2024010110")]);
        assert_eq!(summary.processed, vec![Granularity::Hourly]);
        assert!(summary.is_clean());
        assert!(logger.contains("Created snapshot: /data/.snap/hourly-2024010110"));
    }

    #[test]
    fn test_all_granularities_share_one_clock_sample() {
        let fs = MockFilesystem::new();

        // 2024-01-31 23:59:59 UTC
        let clock = MockClock::new(1706745599);
        let summary = execute_snapshot(
            &args(&["--hourly", "1", "--daily", "1", "--monthly", "1"]),
            &clock,
            &fs,
            &NullLogger,
        )
        .expect("run");

        assert_eq!(
            fs.dir_names(&root()),
            vec!["daily-20240131", "hourly-2024013123", "monthly-202401"]
        );
        assert_eq!(
            summary.processed,
            vec![Granularity::Hourly, Granularity::Daily, Granularity::Monthly]
        );
    }

    #[test]
    fn test_second_run_same_hour_is_idempotent() {
        let fs = MockFilesystem::new();
        let cli = args(&["--hourly", "5", "--daily", "5", "--monthly", "5"]);

        let clock = MockClock::new(NOW);
        execute_snapshot(&cli, &clock, &fs, &NullLogger).expect("first");
        let before = fs.dir_names(&root());

        let logger = MockLogger::new();
        let second = execute_snapshot(&cli, &clock.advanced_by(1800), &fs, &logger)
            .expect("second");

        assert_eq!(fs.dir_names(&root()), before);
        assert!(second.created.is_empty());
        assert_eq!(second.existing.len(), 3);
        assert!(second.is_clean());
        assert_eq!(logger.count_containing("already exists"), 3);
    }

    #[test]
    fn test_occupied_label_path_is_reported_not_replaced() {
        let fs = MockFilesystem::new();
        fs.add_file(root().join("daily-20240101"));
        let logger = MockLogger::new();

        let summary =
            execute_snapshot(&args(&["--daily", "2"]), &MockClock::new(NOW), &fs, &logger)
                .expect("run");

        assert!(fs.is_file(&root().join("daily-20240101")));
        assert!(summary.created.is_empty());
        assert!(logger.contains("is not a directory"));
    }

    // ===========================================
    // Disabled granularities
    // ===========================================

    #[test]
    fn test_nothing_enabled_only_creates_root() {
        let fs = MockFilesystem::new();
        let logger = MockLogger::new();

        let summary =
            execute_snapshot(&args(&[]), &MockClock::new(NOW), &fs, &logger).expect("run");

        assert!(fs.is_dir(&root()));
        assert!(fs.dir_names(&root()).is_empty());
        assert!(summary.processed.is_empty());
        assert_eq!(logger.messages_at_level(Verbosity::Normal).len(), 0);
        assert_eq!(logger.count_containing("snapshots disabled"), 3);
    }

    #[test]
    fn test_disabled_granularity_left_untouched() {
        let fs = MockFilesystem::new();
        let old_hourly = [
            "hourly-2023010100",
            "hourly-2023010101",
            "hourly-2023010102",
            "hourly-2023010103",
        ];
        seed(&fs, &old_hourly);

        execute_snapshot(&args(&["--daily", "1"]), &MockClock::new(NOW), &fs, &MockLogger::new())
            .expect("run");

        let names = fs.dir_names(&root());
        for name in old_hourly {
            assert!(names.iter().any(|n| n == name), "{} was touched", name);
        }
        assert!(!names.iter().any(|n| n == "hourly-2024010110"));
        assert!(names.iter().any(|n| n == "daily-20240101"));
    }

    // ===========================================
    // Rotation scenarios
    // ===========================================

    #[test]
    fn test_daily_rotation_today_already_present() {
        let fs = MockFilesystem::new();
        seed(
            &fs,
            &[
                "daily-20231228",
                "daily-20231229",
                "daily-20231230",
                "daily-20231231",
                "daily-20240101",
            ],
        );
        let logger = MockLogger::new();

        let summary =
            execute_snapshot(&args(&["--daily", "3"]), &MockClock::new(NOW), &fs, &logger)
                .expect("run");

        assert!(summary.created.is_empty());
        assert_eq!(
            fs.dir_names(&root()),
            vec!["daily-20231230", "daily-20231231", "daily-20240101"]
        );
        assert_eq!(logger.count_containing("Removed old snapshot"), 2);
    }

    #[test]
    fn test_daily_rotation_new_day() {
        let fs = MockFilesystem::new();
        seed(
            &fs,
            &[
                "daily-20240101",
                "daily-20240102",
                "daily-20240103",
                "daily-20240104",
                "daily-20240105",
            ],
        );

        // 2024-01-06 08:00:00 UTC
        let summary = execute_snapshot(
            &args(&["--daily", "3"]),
            &MockClock::new(1704528000),
            &fs,
            &MockLogger::new(),
        )
        .expect("run");

        assert_eq!(summary.created, vec![root().join("daily-20240106")]);
        assert_eq!(
            fs.dir_names(&root()),
            vec!["daily-20240104", "daily-20240105", "daily-20240106"]
        );
        assert_eq!(summary.removed.len(), 3);
    }

    #[test]
    fn test_monthly_at_exact_retention() {
        let fs = MockFilesystem::new();
        let months = [
            "monthly-202401",
            "monthly-202402",
            "monthly-202403",
            "monthly-202404",
            "monthly-202405",
            "monthly-202406",
        ];
        seed(&fs, &months);

        // 2024-06-15 12:00:00 UTC
        let summary = execute_snapshot(
            &args(&["--monthly", "6"]),
            &MockClock::new(1718452800),
            &fs,
            &MockLogger::new(),
        )
        .expect("run");

        assert!(summary.created.is_empty());
        assert!(summary.removed.is_empty());
        assert_eq!(fs.dir_names(&root()), months);
    }

    #[test]
    fn test_prefix_isolation_across_granularities() {
        let fs = MockFilesystem::new();
        seed(
            &fs,
            &[
                "hourly-2024010107",
                "hourly-2024010108",
                "hourly-2024010109",
                "daily-20231229",
                "daily-20231230",
                "daily-20231231",
            ],
        );

        execute_snapshot(
            &args(&["--hourly", "2", "--daily", "2"]),
            &MockClock::new(NOW),
            &fs,
            &MockLogger::new(),
        )
        .expect("run");

        assert_eq!(
            fs.dir_names(&root()),
            vec![
                "daily-20231231",
                "daily-20240101",
                "hourly-2024010109",
                "hourly-2024010110",
            ]
        );
    }

    #[test]
    fn test_malformed_name_reported_at_debug() {
        let fs = MockFilesystem::new();
        seed(&fs, &["daily-old"]);
        let logger = MockLogger::new();

        execute_snapshot(&args(&["--daily", "5"]), &MockClock::new(NOW), &fs, &logger)
            .expect("run");

        let debug = logger.messages_at_level(Verbosity::Debug);
        assert_eq!(debug.len(), 1);
        assert!(debug[0].contains("daily-old"));
    }

    // ===========================================
    // Error isolation
    // ===========================================

    #[test]
    fn test_invalid_args_touch_nothing() {
        let fs = MockFilesystem::new();
        let mut cli = args(&["--hourly", "1"]);
        cli.path = PathBuf::new();

        let err = execute_snapshot(&cli, &MockClock::new(NOW), &fs, &MockLogger::new())
            .unwrap_err();

        assert!(matches!(err, CommandError::InvalidArgument(_)));
        assert!(!fs.is_dir(Path::new(".snap")));
    }

    #[test]
    fn test_root_creation_failure_is_fatal() {
        let fs = MockFilesystem::new();
        fs.fail_create(root());
        let logger = MockLogger::new();

        let err = execute_snapshot(&args(&["--hourly", "1"]), &MockClock::new(NOW), &fs, &logger)
            .unwrap_err();

        assert!(matches!(err, CommandError::SnapshotRoot { .. }));
        assert!(err.to_string().contains("/data/.snap"));
        assert!(!fs.is_dir(&root()));
        assert_eq!(logger.count(), 0);
    }

    #[test]
    fn test_create_failure_still_rotates_and_continues() {
        let fs = MockFilesystem::new();
        seed(&fs, &["hourly-2024010108", "hourly-2024010109"]);
        fs.fail_create(root().join("hourly-2024010110"));
        let logger = MockLogger::new();

        let summary = execute_snapshot(
            &args(&["--hourly", "1", "--daily", "1"]),
            &MockClock::new(NOW),
            &fs,
            &logger,
        )
        .expect("run");

        assert_eq!(summary.errors, 1);
        assert!(logger.contains("failed to create snapshot /data/.snap/hourly-2024010110"));
        // Hourly rotation still ran
        assert_eq!(summary.removed, vec![root().join("hourly-2024010108")]);
        // Daily still processed
        assert_eq!(summary.created, vec![root().join("daily-20240101")]);
        assert_eq!(fs.dir_names(&root()), vec!["daily-20240101", "hourly-2024010109"]);
    }

    #[test]
    fn test_stat_failure_is_reported() {
        let fs = MockFilesystem::new();
        fs.add_dir(root());
        fs.fail_stat(root().join("monthly-202401"));
        let logger = MockLogger::new();

        let summary =
            execute_snapshot(&args(&["--monthly", "1"]), &MockClock::new(NOW), &fs, &logger)
                .expect("run");

        assert_eq!(summary.errors, 1);
        assert!(logger.contains("failed to stat snapshot /data/.snap/monthly-202401"));
    }

    #[test]
    fn test_listing_failure_skips_rotation_only() {
        let fs = MockFilesystem::new();
        seed(&fs, &["daily-20231230", "daily-20231231"]);
        fs.fail_list(root());
        let logger = MockLogger::new();

        let summary = execute_snapshot(
            &args(&["--daily", "1", "--monthly", "1"]),
            &MockClock::new(NOW),
            &fs,
            &logger,
        )
        .expect("run");

        // One listing failure per enabled granularity
        assert_eq!(summary.errors, 2);
        assert_eq!(logger.count_containing("failed to read directory /data/.snap"), 2);
        // Creation still happened, nothing was removed
        assert_eq!(summary.created.len(), 2);
        assert!(summary.removed.is_empty());
        assert_eq!(fs.dir_names(&root()).len(), 4);
    }

    #[test]
    fn test_removal_failure_continues_with_next() {
        let fs = MockFilesystem::new();
        seed(
            &fs,
            &["hourly-2024010106", "hourly-2024010107", "hourly-2024010108"],
        );
        fs.fail_remove(root().join("hourly-2024010106"));
        let logger = MockLogger::new();

        let summary =
            execute_snapshot(&args(&["--hourly", "1"]), &MockClock::new(NOW), &fs, &logger)
                .expect("run");

        assert_eq!(summary.errors, 1);
        assert!(logger.contains("failed to remove snapshot /data/.snap/hourly-2024010106"));
        assert_eq!(
            summary.removed,
            vec![root().join("hourly-2024010107"), root().join("hourly-2024010108")]
        );
        assert_eq!(
            fs.dir_names(&root()),
            vec!["hourly-2024010106", "hourly-2024010110"]
        );
    }

    #[test]
    fn test_unrepresentable_timestamp_skips_creation() {
        let fs = MockFilesystem::new();
        seed(&fs, &["daily-20240101", "daily-20240102"]);
        let logger = MockLogger::new();

        let summary = execute_snapshot(
            &args(&["--daily", "1"]),
            &MockClock::new(u64::MAX),
            &fs,
            &logger,
        )
        .expect("run");

        assert_eq!(summary.errors, 1);
        assert!(logger.contains("failed to compute daily label"));
        assert_eq!(fs.dir_names(&root()), vec!["daily-20240102"]);
    }

    #[test]
    fn test_verbose_summary_line() {
        let fs = MockFilesystem::new();
        let logger = MockLogger::new();

        execute_snapshot(&args(&["--hourly", "2"]), &MockClock::new(NOW), &fs, &logger)
            .expect("run");

        let verbose = logger.messages_at_level(Verbosity::Verbose);
        assert!(verbose.iter().any(|m| m.starts_with("Snapshot root /data/.snap")));
        assert!(verbose.iter().any(|m| m == "hourly: 1 snapshots, retention 2, removing 0"));
        assert!(verbose
            .iter()
            .any(|m| m == "Done: 1 created, 0 already present, 0 removed, 0 errors"));
    }
}
