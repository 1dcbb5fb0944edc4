use std::fs;
use std::path::PathBuf;
use log;

use crate::error::DashboardError;
use crate::interface::Snapshot;

pub const CACHE_FILE_NAME : &str = "last_status.json";

/// Last successfully retrieved snapshot, kept across restarts.
pub trait CacheStore {
  /// Unreadable or corrupt data counts as "nothing cached".
  fn load(&self) -> Option<Snapshot>;
  fn save(&mut self, snapshot : &Snapshot) -> Result<(), DashboardError>;
  /// Rewrites the stored snapshot without the given home.
  fn prune(&mut self, home_id : &str) -> Result<(), DashboardError> {
    match self.load() {
      None => Ok(()),
      Some( mut snapshot ) => {
        snapshot.homes.retain(|h| h.home_id != home_id);
        self.save(&snapshot)
      },
    }
  }
}

/// Serialized snapshot in a single file.
pub struct FileCacheStore {
  path : PathBuf,
}

impl FileCacheStore {
  pub fn new(path : PathBuf) -> Self {
    FileCacheStore { path }
  }
}

impl CacheStore for FileCacheStore {
  fn load(&self) -> Option<Snapshot> {
    let bytes = match fs::read(&self.path) {
      Ok( bytes ) => bytes,
      Err( e ) => {
        log::debug!("No cached status at {} : {}", self.path.display(), e);
        return None;
      },
    };
    parse_cached(&bytes)
  }

  fn save(&mut self, snapshot : &Snapshot) -> Result<(), DashboardError> {
    let bytes = serde_json::to_vec(snapshot).map_err(|e| DashboardError::Cache(e.to_string()))?;
    if let Some( dir ) = self.path.parent() {
      fs::create_dir_all(dir).map_err(|e| DashboardError::Cache(format!("{} : {}", dir.display(), e)))?;
    }
    // write-then-rename: a reader never sees half a file
    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).map_err(|e| DashboardError::Cache(format!("{} : {}", tmp.display(), e)))?;
    fs::rename(&tmp, &self.path).map_err(|e| DashboardError::Cache(format!("{} : {}", self.path.display(), e)))
  }
}

/// Keeps the serialized form, like the file store, so the same parsing
/// rules apply under test.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryCacheStore {
  raw : Option<Vec<u8>>,
}

#[cfg(test)]
impl MemoryCacheStore {
  pub fn with_raw(raw : &[u8]) -> Self {
    MemoryCacheStore { raw : Some( raw.to_vec() ) }
  }
}

#[cfg(test)]
impl CacheStore for MemoryCacheStore {
  fn load(&self) -> Option<Snapshot> {
    self.raw.as_deref().and_then(parse_cached)
  }

  fn save(&mut self, snapshot : &Snapshot) -> Result<(), DashboardError> {
    let bytes = serde_json::to_vec(snapshot).map_err(|e| DashboardError::Cache(e.to_string()))?;
    self.raw = Some( bytes );
    Ok(())
  }
}

fn parse_cached(bytes : &[u8]) -> Option<Snapshot> {
  match serde_json::from_slice::<Snapshot>(bytes) {
    Ok( snapshot ) => Some( snapshot ),
    Err( e ) => {
      log::warn!("Cached status is unreadable, ignoring it : {}", e);
      None
    },
  }
}
