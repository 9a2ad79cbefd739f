//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use waitroom_core::application::AdmissionQueue;
use waitroom_core::domain::QueueKeyspace;
use waitroom_core::port::{OrderedSetStore, TimeProvider};
use waitroom_infra_sqlite::{create_pool, run_migrations, SqliteOrderedSetStore};

/// Fresh in-memory SQLite store with the schema applied
pub async fn memory_store() -> Arc<SqliteOrderedSetStore> {
    let pool = create_pool("sqlite::memory:", 1).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteOrderedSetStore::new(pool))
}

/// File-backed store; every call with the same path shares the data, like
/// separate processes pointed at one store
pub async fn file_store(path: &Path) -> Arc<SqliteOrderedSetStore> {
    let url = format!("sqlite://{}", path.display());
    let pool = create_pool(&url, 4).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteOrderedSetStore::new(pool))
}

/// Unique database path under the temp dir, with leftovers removed
pub fn temp_db_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "waitroom-it-{}-{}.db",
        std::process::id(),
        name
    ));
    remove_db(&path);
    path
}

pub fn remove_db(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

pub fn admission(
    store: Arc<dyn OrderedSetStore>,
    clock: Arc<dyn TimeProvider>,
) -> Arc<AdmissionQueue> {
    Arc::new(AdmissionQueue::new(store, QueueKeyspace::default(), clock))
}
