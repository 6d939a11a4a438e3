use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::KvStore;

/// One JSON file per key under a data directory.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        Self::ensure_dir(&self.dir).await?;
        let path = self.path_for(key);
        // Write to a sibling temp file first so a crash mid-write cannot
        // truncate the previous state.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
