//! Append-only ALT address hotlist: addresses resolved at least once are
//! persisted so the next startup can warm the ALT cache's fetch queue ahead
//! of live traffic.

use crate::types::Address;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::Mutex;

pub struct Hotlist {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl Hotlist {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Hotlist { path: path.to_path_buf(), file: Mutex::new(file) })
    }

    /// Loads every address currently on disk. Lines that fail to parse are
    /// skipped rather than aborting startup.
    pub fn load(&self) -> Vec<Address> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else { return Vec::new() };
        contents.lines().filter_map(|line| Address::from_str(line.trim()).ok()).collect()
    }

    /// Appends a newly-resolved address. Failures are logged, never fatal —
    /// the hotlist is an optimization, not a correctness dependency.
    pub async fn append(&self, address: Address) {
        let mut file = self.file.lock().await;
        if let Err(e) = writeln!(file, "{address}") {
            tracing::warn!(error = %e, "failed to append to alt hotlist");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_addresses_through_disk() {
        let path = std::env::temp_dir().join(format!("hotlist_test_{}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let hotlist = Hotlist::open(&path).unwrap();

        let a = Address::new([1; 32]);
        let b = Address::new([2; 32]);
        hotlist.append(a).await;
        hotlist.append(b).await;

        let loaded = hotlist.load();
        assert_eq!(loaded, vec![a, b]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let path = std::env::temp_dir().join("hotlist_never_created_xyz");
        let _ = std::fs::remove_file(&path);
        let hotlist = Hotlist { path: path.clone(), file: Mutex::new(std::fs::OpenOptions::new().create(true).append(true).open(&path).unwrap()) };
        let _ = std::fs::remove_file(&path);
        assert!(hotlist.load().is_empty());
    }
}
