use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// On-disk store for idea images.
///
/// Each image lives at `{dir}/{filename}` under the name the browser sent,
/// so a second upload with the same name replaces the first.
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Writes an upload and returns the name it was stored under, or `None`
    /// when the client sent no usable filename.
    pub async fn save(&self, client_name: &str, data: &[u8]) -> Result<Option<String>> {
        let Some(name) = storage_name(client_name) else {
            return Ok(None);
        };

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.file_path(&name), data).await?;
        info!("Stored upload {} ({} bytes)", name, data.len());
        Ok(Some(name))
    }

    /// Removes a stored image. A file that is already gone is not an error.
    pub async fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.file_path(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted upload {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Final path component of a client filename. Browsers on some platforms
/// send full paths, and a name must never point outside the upload directory.
pub fn storage_name(client_name: &str) -> Option<String> {
    let name = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}
