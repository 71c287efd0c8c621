use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::Result;
use crate::domain::river::{River, CALLBACK};

/// Destination for the published river.
pub trait RiverStore {
    fn persist(&self, river: &River) -> Result<()>;
}

/// Render the river as `onGetRiverStream(<json>)`.
pub fn render_jsonp(river: &River) -> Result<String> {
    let json = serde_json::to_string(river)?;
    Ok(format!("{}({})", CALLBACK, json))
}

/// Writes the river to a file, replacing it whole on every update.
#[derive(Debug, Clone)]
pub struct FileRiverStore {
    path: PathBuf,
}

impl FileRiverStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "river.js".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RiverStore for FileRiverStore {
    fn persist(&self, river: &River) -> Result<()> {
        let document = render_jsonp(river)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target, then swap it in.
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(document.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
