//! Table-keyed storage abstraction over the persisted state layout described in the component
//! spec's External Interfaces section.
//!
//! The actual on-disk key-value engine is explicitly out of scope for this workspace (it is an
//! external collaborator); what lives here is the table schema every other crate programs
//! against, plus an in-memory implementation ([`mem::MemoryDatabase`]) used by tests so the sync
//! core can be exercised without an embedded database.

pub mod mem;
pub mod tables;

use std::fmt::Debug;
use tables::Table;

/// Errors returned by a [`Database`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The underlying storage engine rejected a read or write (e.g. I/O failure, corruption).
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A value stored under a key failed to decode back into the expected type.
    #[error("corrupt value in table {table} for key {key}")]
    Corrupt { table: &'static str, key: String },
}

/// Result type used throughout the storage layer.
pub type DbResult<T> = Result<T, DbError>;

/// A single write against one table, collected into a [`WriteBatch`] so a group of writes can be
/// applied atomically — the "writers use atomic batches" rule from the component spec's
/// concurrency model.
pub enum Write<T: Table> {
    /// Insert or overwrite `key` with `value`.
    Put { key: T::Key, value: T::Value },
    /// Remove `key`, if present.
    Delete { key: T::Key },
}

/// A read-only snapshot handle over the persisted store. Cheaply cloneable, matching the
/// "read-only snapshot handle" split called for in the component spec's design notes — readers
/// never see partial writes from an in-flight batch.
pub trait DatabaseReader: Send + Sync + Debug {
    /// Reads a single value by key, or `None` if absent.
    fn get<T: Table>(&self, key: &T::Key) -> DbResult<Option<T::Value>>;

    /// Reads every `(key, value)` pair currently in a table. Used sparingly — by the scheduler's
    /// restart path and by tests — never on a request-serving hot path.
    fn iter<T: Table>(&self) -> DbResult<Vec<(T::Key, T::Value)>>;
}

/// A typed writer accepting atomic batches, matching the component spec's split between
/// read-only snapshots and a writer that only ever applies whole batches.
pub trait DatabaseWriter: Send + Sync + Debug {
    /// Applies every write in `batch` atomically: either all of them are visible to subsequent
    /// readers, or none are.
    fn write<T: Table>(&self, batch: Vec<Write<T>>) -> DbResult<()>;
}

/// A single write transaction spanning multiple tables. Every `put`/`delete` staged against it
/// is only buffered; none of them are visible to readers until `commit()` returns, and then all
/// of them are — the single-persisted-transaction guarantee §4.6/§5 require of a canonical-chain
/// update that touches headers, bodies, receipts, chain weight and the canonical index together.
pub trait DbTxMut: Send {
    /// Stages an insert/overwrite of `key` in table `T`.
    fn put<T: Table>(&mut self, key: T::Key, value: T::Value);

    /// Stages a removal of `key` from table `T`, if present.
    fn delete<T: Table>(&mut self, key: T::Key);

    /// Applies every staged write atomically.
    fn commit(self) -> DbResult<()>;
}

/// Full database handle: something that can mint reader snapshots, accepts writer batches, and
/// opens multi-table transactions. Real deployments back this with an embedded engine; tests
/// back it with [`mem::MemoryDatabase`].
pub trait Database: DatabaseReader + DatabaseWriter {
    /// Reader type this database mints — usually `Self`, since the in-memory and embedded-engine
    /// implementations are both already safe to read concurrently with writes in flight.
    type Reader: DatabaseReader + Clone;

    /// Transaction type this database mints, spanning every table.
    type Tx: DbTxMut;

    /// Returns a cheaply cloneable read-only handle.
    fn reader(&self) -> Self::Reader;

    /// Opens a new multi-table write transaction.
    fn tx_mut(&self) -> Self::Tx;
}
