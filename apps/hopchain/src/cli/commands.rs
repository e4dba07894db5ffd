//! # CLI Command Implementations

use super::Backend;
use crate::api::{self, ServerSettings};
use crate::collaborators::http_collaborators;
use crate::config::Config;
use crate::engine::{Engine, SolveBook};
use hopchain_core::{
    ChainError, Hop, MemorySolveStore, RedbSolveStore, ResultCache, Solve, SolveQuery, SolveStore,
    compute_open_edges, merged_associations,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a replay file (10 MB).
const MAX_REPLAY_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Canonicalize an input path and make sure it is a regular file of
/// acceptable size.
fn validate_input_file(path: &Path, max_size: u64) -> Result<PathBuf, ChainError> {
    let canonical = path.canonicalize().map_err(|e| {
        ChainError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(ChainError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| ChainError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > max_size {
        return Err(ChainError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }

    Ok(canonical)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: Backend,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
) -> Result<(), ChainError> {
    let config = Config::load(config_path)?;
    config.validate_for_server()?;

    let store = open_store(db_path, backend)?;
    let (hops, games) = http_collaborators(&config)?;
    let book = SolveBook::new(
        store,
        ResultCache::new(config.solve_cache_capacity, config.query_cache_capacity),
    );
    let engine = Engine::new(hops, games, book, config.request_timeout());

    println!("hopchain Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", host);
    println!("  Port:      {}", port);
    println!("  Backend:   {}", backend.as_str());
    println!("  Database:  {:?}", db_path);
    println!("  Hops API:  {}", config.hops_api_url.as_deref().unwrap_or("-"));
    println!("  Games API: {}", config.games_api_url.as_deref().unwrap_or("-"));
    println!("  Timeout:   {} ms", config.request_timeout_ms);
    println!();
    println!("Endpoints:");
    println!("  POST /attempt/hop   - Attempt a hop");
    println!("  GET  /solves/{{id}}   - Get a solve");
    println!("  POST /solves/query  - Query solves");
    println!("  POST /solves/batch  - Finalize completed attempts");
    println!("  GET  /status        - Store and cache status");
    println!("  GET  /health        - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, engine, &ServerSettings::from_env()).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show solve store status.
pub fn cmd_status(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), ChainError> {
    let store = open_store(db_path, backend)?;
    let count = store.count()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend.as_str(),
            "solve_count": count,
        }));
        return Ok(());
    }

    println!("hopchain Status");
    println!("===============");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend.as_str());
    println!();
    println!("Solves:   {}", count);

    Ok(())
}

// =============================================================================
// EDGES COMMAND
// =============================================================================

/// Offline replay input.
#[derive(Debug, Clone, Deserialize)]
pub struct Replay {
    pub words: Vec<String>,
    #[serde(default)]
    pub hops: Vec<Hop>,
}

/// Read and parse a replay file.
pub fn load_replay(path: &Path) -> Result<Replay, ChainError> {
    let validated = validate_input_file(path, MAX_REPLAY_FILE_SIZE)?;
    let data = std::fs::read(&validated)
        .map_err(|e| ChainError::IoError(format!("Read file: {}", e)))?;
    serde_json::from_slice(&data)
        .map_err(|e| ChainError::SerializationError(format!("Replay file: {}", e)))
}

/// Fold a recorded hop history and print what is still open.
pub fn cmd_edges(file: &Path, json_mode: bool) -> Result<(), ChainError> {
    let replay = load_replay(file)?;
    let open = compute_open_edges(&replay.words, &replay.hops);
    let associations = merged_associations(&replay.hops);

    if json_mode {
        print_json(&serde_json::json!({
            "words": replay.words,
            "hop_count": replay.hops.len(),
            "open_edges": open,
            "complete": open.is_empty(),
            "associations_key": associations,
        }));
        return Ok(());
    }

    println!("Starting words: {}", replay.words.join(", "));
    println!("Hops replayed:  {}", replay.hops.len());
    if open.is_empty() {
        println!("Open edges:     none (complete)");
    } else {
        println!("Open edges:     {}", open.join(", "));
    }
    if !associations.is_empty() {
        println!("Associations:   {}", associations);
    }

    Ok(())
}

// =============================================================================
// SHOW / LIST COMMANDS
// =============================================================================

fn print_solve(solve: &Solve) {
    println!("Solve {}", solve.id);
    println!("  Owner:        {}", solve.owner_id);
    println!("  Puzzle:       {}", solve.puzzle_id);
    println!("  Length:       {}", solve.length);
    println!("  Hops:         {}", solve.hop_ids.join(", "));
    println!("  Associations: {}", solve.associations_key);
    println!("  Created:      {}", solve.created_at);
}

/// Print one committed solve.
pub fn cmd_show(db_path: &Path, backend: Backend, json_mode: bool, id: &str) -> Result<(), ChainError> {
    let store = open_store(db_path, backend)?;
    let solve = store.get(id)?;

    if json_mode {
        print_json(&serde_json::json!({ "found": solve.is_some(), "solve": solve }));
        return Ok(());
    }

    match solve {
        Some(solve) => print_solve(&solve),
        None => println!("No solve with id '{}'", id),
    }
    Ok(())
}

/// List committed solves matching `query`.
pub fn cmd_list(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    query: &SolveQuery,
) -> Result<(), ChainError> {
    let store = open_store(db_path, backend)?;
    let solves = store.query(&query.normalize())?;

    if json_mode {
        print_json(&serde_json::json!({ "count": solves.len(), "solves": solves }));
        return Ok(());
    }

    println!("{} solve(s)", solves.len());
    for solve in &solves {
        println!();
        print_solve(solve);
    }
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(db_path: &Path, backend: Backend, force: bool) -> Result<(), ChainError> {
    if backend == Backend::Memory {
        println!("Memory backend needs no initialization");
        return Ok(());
    }

    if db_path.exists() {
        if !force {
            return Err(ChainError::ConfigError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| ChainError::IoError(format!("Remove old database: {}", e)))?;
    }

    let _store = RedbSolveStore::open(db_path)?;
    println!("Initialized new redb database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the solve store for `backend`.
pub fn open_store(db_path: &Path, backend: Backend) -> Result<Arc<dyn SolveStore>, ChainError> {
    match backend {
        Backend::Redb => Ok(Arc::new(RedbSolveStore::open(db_path)?)),
        Backend::Memory => Ok(Arc::new(MemorySolveStore::new())),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replay_file_parses_camel_case_hops() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("replay.json");
        std::fs::write(
            &path,
            r#"{"words": ["chicanery", "mountain"],
                "hops": [{"id": "hop1", "from": "chicanery", "to": "mountain",
                          "linkKey": "chicanery::mountain", "associationsKey": null}]}"#,
        )
        .unwrap();

        let replay = load_replay(&path).unwrap();
        assert!(compute_open_edges(&replay.words, &replay.hops).is_empty());
    }

    #[test]
    fn replay_rejects_directory() {
        let dir = tempdir().unwrap();
        assert_eq!(load_replay(dir.path()).unwrap_err().kind(), "io_error");
    }

    #[test]
    fn init_refuses_existing_database_without_force() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("solves.redb");

        cmd_init(&db, Backend::Redb, false).unwrap();
        assert!(cmd_init(&db, Backend::Redb, false).is_err());
        cmd_init(&db, Backend::Redb, true).unwrap();
    }

    #[test]
    fn open_store_reports_backend() {
        let dir = tempdir().unwrap();
        let redb = open_store(&dir.path().join("s.redb"), Backend::Redb).unwrap();
        let memory = open_store(&dir.path().join("unused"), Backend::Memory).unwrap();

        assert_eq!(redb.backend_name(), "redb");
        assert_eq!(memory.backend_name(), "memory");
    }
}
