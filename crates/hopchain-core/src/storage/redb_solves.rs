//! # redb-backed Solve Storage
//!
//! Solves are postcard-encoded under their id. A second table maps each
//! composite key to the id that claimed it. Both tables are written in one
//! write transaction, so a solve and its index entry appear together or
//! not at all.

use super::SolveStore;
use crate::query::SolveFilter;
use crate::{ChainError, Solve};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for solves: solve id -> postcard bytes
const SOLVES: TableDefinition<&str, &[u8]> = TableDefinition::new("solves");

/// Table for the duplicate guard: composite key -> solve id
const COMPOSITE_INDEX: TableDefinition<&str, &str> = TableDefinition::new("composite_index");

fn io_err(e: impl std::fmt::Display) -> ChainError {
    ChainError::IoError(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<Solve, ChainError> {
    postcard::from_bytes(bytes).map_err(|e| ChainError::SerializationError(e.to_string()))
}

/// A disk-backed solve store.
pub struct RedbSolveStore {
    db: Database,
}

impl std::fmt::Debug for RedbSolveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSolveStore").finish_non_exhaustive()
    }
}

impl RedbSolveStore {
    /// Open or create a solve database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(SOLVES).map_err(io_err)?;
            let _ = write_txn.open_table(COMPOSITE_INDEX).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }
}

impl SolveStore for RedbSolveStore {
    fn get(&self, id: &str) -> Result<Option<Solve>, ChainError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SOLVES).map_err(io_err)?;

        match table.get(id).map_err(io_err)? {
            Some(guard) => decode(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    fn find_by_composite_key(&self, composite_key: &str) -> Result<Option<Solve>, ChainError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let index = read_txn.open_table(COMPOSITE_INDEX).map_err(io_err)?;

        let Some(id) = index
            .get(composite_key)
            .map_err(io_err)?
            .map(|guard| guard.value().to_string())
        else {
            return Ok(None);
        };

        let solves = read_txn.open_table(SOLVES).map_err(io_err)?;
        match solves.get(id.as_str()).map_err(io_err)? {
            Some(guard) => decode(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    fn create(&self, solve: &Solve) -> Result<(), ChainError> {
        let bytes = postcard::to_allocvec(solve)
            .map_err(|e| ChainError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut solves = write_txn.open_table(SOLVES).map_err(io_err)?;
            let mut index = write_txn.open_table(COMPOSITE_INDEX).map_err(io_err)?;

            if solves.get(solve.id.as_str()).map_err(io_err)?.is_some() {
                return Err(ChainError::Conflict(format!(
                    "solve '{}' already exists",
                    solve.id
                )));
            }
            if index
                .get(solve.composite_key.as_str())
                .map_err(io_err)?
                .is_some()
            {
                return Err(ChainError::Conflict(format!(
                    "composite key '{}' already recorded",
                    solve.composite_key
                )));
            }

            solves
                .insert(solve.id.as_str(), bytes.as_slice())
                .map_err(io_err)?;
            index
                .insert(solve.composite_key.as_str(), solve.id.as_str())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn query(&self, filter: &SolveFilter) -> Result<Vec<Solve>, ChainError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SOLVES).map_err(io_err)?;

        let mut out = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            let solve = decode(value.value())?;
            if filter.matches(&solve) {
                out.push(solve);
            }
        }
        Ok(out)
    }

    fn count(&self) -> Result<usize, ChainError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SOLVES).map_err(io_err)?;
        let len = table.len().map_err(io_err)?;
        usize::try_from(len).map_err(io_err)
    }

    fn backend_name(&self) -> &'static str {
        "redb"
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;
    use tempfile::tempdir;

    #[test]
    fn create_then_lookup() {
        let temp = tempdir().expect("temp dir");
        let store = RedbSolveStore::open(temp.path().join("solves.redb")).expect("open db");
        contract::create_then_lookup(&store);
    }

    #[test]
    fn duplicate_id_conflicts() {
        let temp = tempdir().expect("temp dir");
        let store = RedbSolveStore::open(temp.path().join("solves.redb")).expect("open db");
        contract::duplicate_id_conflicts(&store);
    }

    #[test]
    fn duplicate_composite_key_conflicts() {
        let temp = tempdir().expect("temp dir");
        let store = RedbSolveStore::open(temp.path().join("solves.redb")).expect("open db");
        contract::duplicate_composite_key_conflicts(&store);
    }

    #[test]
    fn query_filters() {
        let temp = tempdir().expect("temp dir");
        let store = RedbSolveStore::open(temp.path().join("solves.redb")).expect("open db");
        contract::query_filters(&store);
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("solves.redb");

        {
            let store = RedbSolveStore::open(&db_path).expect("open db");
            store
                .create(&contract::solve("attempt-1", "user-1", "game-1", &["h1", "h2"]))
                .expect("create");
        }

        let store = RedbSolveStore::open(&db_path).expect("reopen db");
        assert_eq!(store.count().expect("count"), 1);
        let found = store
            .find_by_composite_key("user-1|game-1|h1,h2")
            .expect("find")
            .expect("present");
        assert_eq!(found.id, "attempt-1");
        assert_eq!(found.length, 1);
    }
}
