//! End-to-end behaviour of a sync pass over real temporary trees

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use mirror_core::{
    OperationKind, OperationLog, OperationSink, Result, SyncEngine, SyncOperation, SyncOptions,
    SyncTarget, Ticker,
};
use mirror_test_utils::TreePair;
use pretty_assertions::assert_eq;

fn engine(pair: &TreePair) -> SyncEngine<Vec<SyncOperation>> {
    let target = SyncTarget::new(pair.source.root(), pair.replica.root()).unwrap();
    SyncEngine::new(target, Vec::new(), SyncOptions::default())
}

fn replica_root(pair: &TreePair) -> PathBuf {
    dunce::canonicalize(pair.replica.root()).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_source_only_file_is_created() {
    let pair = TreePair::new();
    pair.source.write("a.txt", "alpha");

    let mut engine = engine(&pair);
    engine.run_pass();

    pair.replica.assert_file("a.txt", "alpha");
    let ops = engine.sink();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationKind::Create);
    assert!(!ops[0].is_dir);
    assert_eq!(
        ops[0].to_string(),
        format!("File a.txt created in {}", replica_root(&pair).display())
    );
}

#[test]
fn scenario_b_replica_only_file_is_deleted() {
    let pair = TreePair::new();
    pair.replica.write("b.txt", "beta");

    let mut engine = engine(&pair);
    engine.run_pass();

    pair.replica.assert_missing("b.txt");
    let ops = engine.sink();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationKind::Delete);
    assert_eq!(
        ops[0].to_string(),
        format!("File b.txt deleted from {}", replica_root(&pair).display())
    );
}

#[test]
fn scenario_c_changed_file_gets_content_and_mtime() {
    let pair = TreePair::new();
    pair.source.write("c.txt", "v2");
    pair.source.set_mtime_secs("c.txt", 2_000_000);
    pair.replica.write("c.txt", "v1");
    pair.replica.set_mtime_secs("c.txt", 1_000_000);

    let mut engine = engine(&pair);
    engine.run_pass();

    pair.replica.assert_file("c.txt", "v2");
    assert_eq!(pair.replica.mtime("c.txt"), pair.source.mtime("c.txt"));
    let ops = engine.sink();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationKind::Copy);
    assert_eq!(
        ops[0].to_string(),
        format!(
            "File c.txt content's copied to {}",
            replica_root(&pair).display()
        )
    );
}

#[test]
fn scenario_d_new_directory_is_copied_as_one_operation() {
    let pair = TreePair::new();
    pair.source.write("dir/x.txt", "x");

    let mut engine = engine(&pair);
    engine.run_pass();

    pair.replica.assert_file("dir/x.txt", "x");
    let ops = engine.sink();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationKind::Create);
    assert!(ops[0].is_dir);
    assert_eq!(
        ops[0].to_string(),
        format!("Directory dir created in {}", replica_root(&pair).display())
    );
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn converges_at_every_depth() {
    let pair = TreePair::new();
    pair.source.write("top.txt", "top");
    pair.source.write("a/b/c/deep.txt", "deep");
    pair.source.write("a/shared.txt", "new shared");
    pair.source.mkdir("a/empty");
    pair.replica.write("a/shared.txt", "old shared");
    pair.replica.write("a/b/stale.txt", "stale");
    pair.replica.write("gone/x.txt", "x");
    pair.source.set_mtime_secs("a/shared.txt", 2_000);
    pair.replica.set_mtime_secs("a/shared.txt", 1_000);

    let report = engine(&pair).run_pass();

    pair.assert_converged();
    assert!(!report.has_errors());
    assert_eq!(report.count(OperationKind::Copy), 1);
    // gone/ and a/b/stale.txt
    assert_eq!(report.count(OperationKind::Delete), 2);
}

#[test]
fn second_pass_is_a_no_op() {
    let pair = TreePair::new();
    pair.source.write("one.txt", "1");
    pair.source.write("nested/two.txt", "22");
    pair.source.write("created/three.txt", "333");
    pair.replica.write("nested/two.txt", "xx");
    pair.replica.write("extra.txt", "e");
    pair.source.set_mtime_secs("nested/two.txt", 2_000);
    pair.replica.set_mtime_secs("nested/two.txt", 1_000);

    let mut engine = engine(&pair);
    let first = engine.run_pass();
    let second = engine.run_pass();

    assert!(!first.is_clean());
    assert!(second.is_clean(), "second pass did: {second}");
    pair.assert_converged();
}

#[test]
fn only_replica_only_entries_are_deleted() {
    let pair = TreePair::new();
    pair.source.write("keep.txt", "k");
    pair.source.write("dir/keep.txt", "k");
    pair.replica.write("keep.txt", "k");
    pair.replica.write("dir/keep.txt", "k");
    pair.replica.write("dir/drop.txt", "d");
    pair.replica.write("drop_dir/inner.txt", "i");
    for path in ["keep.txt", "dir/keep.txt"] {
        pair.source.set_mtime_secs(path, 5_000);
        pair.replica.set_mtime_secs(path, 5_000);
    }

    let report = engine(&pair).run_pass();

    let deleted: Vec<_> = report
        .operations
        .iter()
        .filter(|op| op.kind == OperationKind::Delete)
        .map(|op| op.name().into_owned())
        .collect();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&"drop.txt".to_string()));
    assert!(deleted.contains(&"drop_dir".to_string()));
    pair.replica.assert_file("keep.txt", "k");
    pair.replica.assert_file("dir/keep.txt", "k");
    assert_eq!(report.operations.len(), 2);
}

#[test]
fn file_replaced_by_directory_and_back() {
    let pair = TreePair::new();
    pair.source.write("was_file/inner.txt", "i");
    pair.replica.write("was_file", "plain");
    pair.source.write("was_dir", "now a file");
    pair.replica.write("was_dir/old.txt", "o");

    let report = engine(&pair).run_pass();

    pair.assert_converged();
    assert_eq!(report.count(OperationKind::Delete), 2);
    assert_eq!(report.count(OperationKind::Create), 2);
}

#[test]
fn vanished_source_root_never_deletes_replica() {
    let pair = TreePair::new();
    pair.source.write("a.txt", "a");
    pair.replica.write("keep.txt", "k");
    let target = SyncTarget::new(pair.source.root(), pair.replica.root()).unwrap();
    let gone = pair.source.root().to_path_buf();
    let mut engine = SyncEngine::new(target, Vec::new(), SyncOptions::default());

    std::fs::remove_dir_all(&gone).unwrap();
    let report = engine.run_pass();

    assert!(report.has_errors());
    pair.replica.assert_file("keep.txt", "k");
    assert!(engine.sink().is_empty());
}

// ============================================================================
// Entries that cannot be mirrored
// ============================================================================

#[cfg(unix)]
mod unix_faults {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{self, Permissions};
    use std::os::unix::fs::{PermissionsExt, symlink};
    use std::process::Command;
    use std::sync::mpsc;

    fn mkfifo(path: &std::path::Path) -> bool {
        Command::new("mkfifo")
            .arg(path)
            .status()
            .is_ok_and(|status| status.success())
    }

    #[test]
    fn unreadable_source_file_is_reported_and_pass_continues() {
        let pair = TreePair::new();
        pair.source.write("good.txt", "g");
        let locked = pair.source.write("locked.txt", "secret");
        fs::set_permissions(&locked, Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&locked).is_ok() {
            // Privileged users bypass file modes.
            return;
        }

        let mut engine = engine(&pair);
        let report = engine.run_pass();

        pair.replica.assert_file("good.txt", "g");
        pair.replica.assert_missing("locked.txt");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("locked.txt"));
        assert_eq!(report.count(OperationKind::Create), 1);
    }

    #[test]
    fn symlink_loop_in_source_does_not_abort_the_directory() {
        let pair = TreePair::new();
        pair.source.write("a.txt", "a");
        symlink(pair.source.path("loop"), pair.source.path("loop")).unwrap();
        pair.replica.write("stale.txt", "old");
        pair.replica.write("loop", "last good copy");

        let mut engine = engine(&pair);
        let report = engine.run_pass();

        pair.replica.assert_file("a.txt", "a");
        pair.replica.assert_missing("stale.txt");
        pair.replica.assert_file("loop", "last good copy");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("loop"));
    }

    #[test]
    fn fifos_are_skipped_without_blocking() {
        let pair = TreePair::new();
        pair.source.write("a.txt", "a");
        pair.source.write("sub/b.txt", "b");
        if !mkfifo(&pair.source.path("pipe")) || !mkfifo(&pair.source.path("sub/pipe")) {
            return;
        }

        let mut engine = engine(&pair);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(engine.run_pass());
        });
        let report = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("pass blocked on a FIFO");

        pair.replica.assert_file("a.txt", "a");
        pair.replica.assert_file("sub/b.txt", "b");
        assert!(!pair.replica.exists("pipe"));
        assert!(!pair.replica.exists("sub/pipe"));
        // One for the top-level FIFO, one for the FIFO inside the copied subtree.
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn looping_replica_link_is_replaced_with_source_file() {
        let pair = TreePair::new();
        pair.source.write("a.txt", "a");
        symlink(pair.replica.path("a.txt"), pair.replica.path("a.txt")).unwrap();

        let mut engine = engine(&pair);
        let report = engine.run_pass();

        assert!(!report.has_errors());
        assert!(fs::symlink_metadata(pair.replica.path("a.txt")).unwrap().is_file());
        pair.replica.assert_file("a.txt", "a");
        assert_eq!(report.count(OperationKind::Delete), 1);
        assert_eq!(report.count(OperationKind::Create), 1);
    }

    #[test]
    fn dangling_replica_link_is_not_written_through() {
        let pair = TreePair::new();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("escaped.txt");
        pair.source.write("a.txt", "a");
        symlink(&target, pair.replica.path("a.txt")).unwrap();

        let mut engine = engine(&pair);
        engine.run_pass();

        assert!(!target.exists());
        assert!(fs::symlink_metadata(pair.replica.path("a.txt")).unwrap().is_file());
        pair.replica.assert_file("a.txt", "a");
    }
}

// ============================================================================
// Race tolerance
// ============================================================================

/// Deletes a source file the first time anything is recorded, simulating an
/// external mutation between classification and copy.
struct DeleteOnFirstRecord {
    victim: Option<PathBuf>,
    seen: Vec<SyncOperation>,
}

impl OperationSink for DeleteOnFirstRecord {
    fn record(&mut self, operation: &SyncOperation) -> Result<()> {
        if let Some(victim) = self.victim.take() {
            std::fs::remove_file(victim)?;
        }
        self.seen.push(operation.clone());
        Ok(())
    }
}

#[test]
fn source_file_deleted_after_classification_is_removed_from_replica() {
    let pair = TreePair::new();
    // a_new.txt is source-only, so it is handled before the changed c.txt.
    pair.source.write("a_new.txt", "new");
    pair.source.write("c.txt", "v2");
    pair.source.set_mtime_secs("c.txt", 2_000);
    pair.replica.write("c.txt", "v1");
    pair.replica.set_mtime_secs("c.txt", 1_000);

    let target = SyncTarget::new(pair.source.root(), pair.replica.root()).unwrap();
    let sink = DeleteOnFirstRecord {
        victim: Some(pair.source.path("c.txt")),
        seen: Vec::new(),
    };
    let mut engine = SyncEngine::new(target, sink, SyncOptions::default());

    let report = engine.run_pass();

    pair.replica.assert_missing("c.txt");
    pair.replica.assert_file("a_new.txt", "new");
    assert_eq!(report.recovered, 1);
    assert!(!report.has_errors());
    let kinds: Vec<_> = engine.sink().seen.iter().map(|op| op.kind).collect();
    assert_eq!(kinds, vec![OperationKind::Create, OperationKind::Delete]);
    pair.assert_converged();
}

// ============================================================================
// Loop and log
// ============================================================================

#[test]
fn run_stops_after_shutdown() {
    let pair = TreePair::new();
    pair.source.write("a.txt", "a");
    let mut engine = engine(&pair);
    let ticker = Ticker::new(Duration::from_millis(10));
    let handle = ticker.shutdown_handle();

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle.shutdown();
    });
    engine.run(&ticker);
    stopper.join().unwrap();

    pair.replica.assert_file("a.txt", "a");
    assert!(engine.last_synced().is_some());
    // Later passes found nothing to do.
    assert_eq!(engine.sink().len(), 1);
}

#[test]
fn run_with_pending_shutdown_does_one_pass() {
    let pair = TreePair::new();
    pair.source.write("a.txt", "a");
    let mut engine = engine(&pair);
    let ticker = Ticker::new(Duration::from_secs(3600));
    ticker.shutdown_handle().shutdown();

    engine.run(&ticker);

    pair.replica.assert_file("a.txt", "a");
}

#[test]
fn operation_log_appends_across_engines() {
    let pair = TreePair::new();
    let log_path = pair.scratch.path("log.txt");
    pair.source.write("a.txt", "a");

    {
        let target = SyncTarget::new(pair.source.root(), pair.replica.root()).unwrap();
        let log = OperationLog::with_console(&log_path, Box::new(std::io::sink())).unwrap();
        SyncEngine::new(target, log, SyncOptions::default()).run_pass();
    }
    pair.source.remove("a.txt");
    {
        let target = SyncTarget::new(pair.source.root(), pair.replica.root()).unwrap();
        let log = OperationLog::with_console(&log_path, Box::new(std::io::sink())).unwrap();
        SyncEngine::new(target, log, SyncOptions::default()).run_pass();
    }

    let content = pair.scratch.read("log.txt");
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(", File a.txt created in "), "{}", lines[0]);
    assert!(lines[1].contains(", File a.txt deleted from "), "{}", lines[1]);
}
