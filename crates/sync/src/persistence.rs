//! Coalesces `SyncState` snapshots onto a single background writer: producers always overwrite
//! the one pending snapshot rather than queuing one write per update, and the writer only ever
//! persists the newest value it's seen, per §4.3/§5's "keeps at most one newest pending
//! snapshot" rule.

use crate::fast_sync::SyncState;
use etc_db::tables::FastSyncState;
use etc_db::{Database, DatabaseReader, DatabaseWriter, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Submission side of the persister: cheap to clone, held by whatever drives `FastSync`.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    tx: watch::Sender<Option<SyncState>>,
    flush_now: Arc<Notify>,
}

impl SnapshotWriter {
    /// Replaces the pending snapshot. A snapshot submitted before the writer wakes up is
    /// silently superseded — `watch` only ever retains the latest value.
    pub fn submit(&self, state: SyncState) {
        let _ = self.tx.send(Some(state));
    }

    /// Wakes the writer immediately instead of waiting for the next interval tick, for terminal
    /// transitions (pivot finalized, fast sync finished) that must not wait out the interval.
    pub fn flush_now(&self) {
        self.flush_now.notify_one();
    }
}

/// Background half of the persister: owns the watch receiver and writes to `FastSyncState` on
/// its own schedule. Runs for the lifetime of the sync core; stops when every [`SnapshotWriter`]
/// handle (and the loop's own clone of the channel) is dropped.
pub struct SnapshotPersister<DB> {
    db: DB,
    rx: watch::Receiver<Option<SyncState>>,
    flush_now: Arc<Notify>,
    interval: Duration,
}

impl<DB: Database> SnapshotPersister<DB> {
    /// Builds a writer/persister pair over `db`, flushing the latest submitted snapshot every
    /// `interval` and whenever [`SnapshotWriter::flush_now`] is called.
    pub fn new(db: DB, interval: Duration) -> (SnapshotWriter, Self) {
        let (tx, rx) = watch::channel(None);
        let flush_now = Arc::new(Notify::new());
        let writer = SnapshotWriter { tx, flush_now: flush_now.clone() };
        let persister = Self { db, rx, flush_now, interval };
        (writer, persister)
    }

    /// Restores the last persisted snapshot, if any — the crash-recovery entry point `FastSync`
    /// resumes from.
    pub fn load(db: &DB) -> etc_db::DbResult<Option<SyncState>> {
        let Some(bytes) = db.reader().get::<FastSyncState>(&())? else { return Ok(None) };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|_| etc_db::DbError::Corrupt { table: "FastSyncState", key: "()".into() })
    }

    /// Runs the writer loop until every [`SnapshotWriter`] clone is dropped. Intended to be
    /// handed to a [`etc_tasks::TaskSpawner`].
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.flush_now.notified() => {}
                changed = self.rx.changed() => if changed.is_err() { return },
            }
            self.flush_once();
        }
    }

    fn flush_once(&mut self) {
        let snapshot = self.rx.borrow_and_update().clone();
        let Some(state) = snapshot else { return };
        let Ok(bytes) = serde_json::to_vec(&state) else { return };
        let _ = self.db.write::<FastSyncState>(vec![Write::Put { key: (), value: bytes }]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast_sync::SyncState;
    use etc_db::mem::MemoryDatabase;
    use etc_primitives::BlockHeader;

    fn sample_state() -> SyncState {
        SyncState::new(BlockHeader { number: 1000, ..Default::default() }, 64)
    }

    #[test]
    fn load_returns_none_when_nothing_persisted() {
        let db = MemoryDatabase::new();
        assert!(SnapshotPersister::load(&db).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_tick_persists_the_latest_submitted_snapshot() {
        let db = MemoryDatabase::new();
        let (writer, persister) = SnapshotPersister::new(db.clone(), Duration::from_millis(100));
        let handle = tokio::spawn(persister.run());

        writer.submit(sample_state());
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        let loaded = SnapshotPersister::load(&db).unwrap();
        assert_eq!(loaded.unwrap().pivot.number, 1000);

        drop(writer);
        let _ = handle.await;
    }

    #[tokio::test]
    async fn flush_now_persists_without_waiting_for_the_interval() {
        let db = MemoryDatabase::new();
        let (writer, persister) = SnapshotPersister::new(db.clone(), Duration::from_secs(3600));
        let handle = tokio::spawn(persister.run());

        writer.submit(sample_state());
        writer.flush_now();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(SnapshotPersister::load(&db).unwrap().is_some());

        drop(writer);
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_newest_snapshot_before_a_tick_is_ever_written() {
        let db = MemoryDatabase::new();
        let (writer, persister) = SnapshotPersister::new(db.clone(), Duration::from_millis(100));
        let handle = tokio::spawn(persister.run());

        writer.submit(SyncState::new(BlockHeader { number: 1, ..Default::default() }, 64));
        writer.submit(SyncState::new(BlockHeader { number: 2, ..Default::default() }, 64));
        writer.submit(sample_state());
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        assert_eq!(SnapshotPersister::load(&db).unwrap().unwrap().pivot.number, 1000);

        drop(writer);
        let _ = handle.await;
    }
}
