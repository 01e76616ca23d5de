//! In-memory [`Database`] implementation, used by every other crate's test suite in place of an
//! embedded engine.

use crate::tables::Table;
use crate::{Database, DatabaseReader, DatabaseWriter, DbResult, DbTxMut, Write};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-erased per-table map, downcast on access. Each table's entries are a
/// `HashMap<T::Key, T::Value>` boxed behind `Any`; the outer map is keyed by [`TypeId`] so one
/// [`MemoryDatabase`] can host every table without a separate field per table.
#[derive(Default)]
struct Tables(HashMap<TypeId, Box<dyn Any + Send + Sync>>);

impl Tables {
    fn table<T: Table>(&self) -> Option<&HashMap<T::Key, T::Value>> {
        self.0.get(&TypeId::of::<T>()).and_then(|b| b.downcast_ref())
    }

    fn table_mut<T: Table>(&mut self) -> &mut HashMap<T::Key, T::Value> {
        self.0
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(HashMap::<T::Key, T::Value>::new()))
            .downcast_mut()
            .expect("TypeId collision across tables")
    }
}

/// An in-memory, process-local database. Cloning shares the same backing store — every clone is
/// a handle onto the same `Arc<RwLock<Tables>>`.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase").finish_non_exhaustive()
    }
}

impl MemoryDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatabaseReader for MemoryDatabase {
    fn get<T: Table>(&self, key: &T::Key) -> DbResult<Option<T::Value>> {
        Ok(self.tables.read().table::<T>().and_then(|t| t.get(key).cloned()))
    }

    fn iter<T: Table>(&self) -> DbResult<Vec<(T::Key, T::Value)>> {
        Ok(self
            .tables
            .read()
            .table::<T>()
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

impl DatabaseWriter for MemoryDatabase {
    fn write<T: Table>(&self, batch: Vec<Write<T>>) -> DbResult<()> {
        let mut tables = self.tables.write();
        let table = tables.table_mut::<T>();
        for write in batch {
            match write {
                Write::Put { key, value } => {
                    table.insert(key, value);
                }
                Write::Delete { key } => {
                    table.remove(&key);
                }
            }
        }
        Ok(())
    }
}

impl Database for MemoryDatabase {
    type Reader = Self;
    type Tx = MemoryTx;

    fn reader(&self) -> Self::Reader {
        self.clone()
    }

    fn tx_mut(&self) -> Self::Tx {
        MemoryTx { tables: self.tables.clone(), ops: Vec::new() }
    }
}

/// [`MemoryDatabase`]'s transaction handle. Staged `put`/`delete` calls are type-erased closures
/// over the shared [`Tables`] map so operations against different table types can be buffered in
/// one `Vec` and applied under a single lock acquisition in `commit`.
pub struct MemoryTx {
    tables: Arc<RwLock<Tables>>,
    ops: Vec<Box<dyn FnOnce(&mut Tables) + Send>>,
}

impl fmt::Debug for MemoryTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTx").field("staged", &self.ops.len()).finish()
    }
}

impl DbTxMut for MemoryTx {
    fn put<T: Table>(&mut self, key: T::Key, value: T::Value) {
        self.ops.push(Box::new(move |tables| {
            tables.table_mut::<T>().insert(key, value);
        }));
    }

    fn delete<T: Table>(&mut self, key: T::Key) {
        self.ops.push(Box::new(move |tables| {
            tables.table_mut::<T>().remove(&key);
        }));
    }

    fn commit(self) -> DbResult<()> {
        let mut tables = self.tables.write();
        for op in self.ops {
            op(&mut tables);
        }
        Ok(())
    }
}
