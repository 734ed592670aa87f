//! Process-lifetime table cache
//!
//! The table is loaded at most once. Concurrent first requests wait on the
//! same load. A failed load is logged and cached as an empty table; restart
//! the service to retry.

use crate::table::FlatTable;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

pub struct TableCache {
    path: PathBuf,
    cell: OnceCell<Arc<FlatTable>>,
}

impl TableCache {
    /// Cache that loads `path` on first access
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Cache already holding a table
    pub fn with_table(table: FlatTable) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::with_value(Arc::new(table)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The cached table, loading it on a blocking thread if needed
    pub async fn table(self: &Arc<Self>) -> Arc<FlatTable> {
        if let Some(table) = self.cell.get() {
            return Arc::clone(table);
        }

        let cache = Arc::clone(self);
        match tokio::task::spawn_blocking(move || cache.table_blocking()).await {
            Ok(table) => table,
            Err(e) => {
                error!("Table load task failed: {}", e);
                Arc::new(FlatTable::empty())
            }
        }
    }

    /// Synchronous variant of [`TableCache::table`]
    pub fn table_blocking(&self) -> Arc<FlatTable> {
        Arc::clone(self.cell.get_or_init(|| Arc::new(load_or_empty(&self.path))))
    }
}

fn load_or_empty(path: &Path) -> FlatTable {
    info!("Loading table {}", path.display());
    match FlatTable::load(path) {
        Ok(table) => table,
        Err(e) => {
            error!(
                "Failed to load table {}: {}; serving an empty table",
                path.display(),
                e
            );
            FlatTable::empty()
        }
    }
}
