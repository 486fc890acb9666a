//! Lattice persistence: one text file per crystal, numbered backups on overwrite

use crate::error::{CrystalError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where lattice text lives between runs
pub trait LatticeStore {
    /// Read the stored text for `name`, or `MissingModel` when there is none
    fn load(&self, name: &str) -> Result<String>;

    /// Store `text` for `name`, backing up whatever was there before
    fn save(&self, name: &str, text: &str) -> Result<()>;
}

/// Filesystem store rooted at a directory.
///
/// Models live at `<root>/<name>_crystal_model.txt`, backups at
/// `<root>/backups/<name>_crystal_model_bkp<N>.txt`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}_crystal_model.txt"))
    }

    /// Smallest `N >= 1` whose backup path is still free
    pub fn next_backup_path(&self, name: &str) -> PathBuf {
        let dir = self.root.join("backups");
        (1u32..)
            .map(|i| dir.join(format!("{name}_crystal_model_bkp{i}.txt")))
            .find(|p| !p.exists())
            .unwrap_or_else(|| dir.join(format!("{name}_crystal_model_bkp.txt")))
    }

    /// Copy the current model aside. Returns the backup path, if anything was copied.
    pub fn backup(&self, name: &str) -> Result<Option<PathBuf>> {
        let current = self.model_path(name);
        if !current.exists() {
            return Ok(None);
        }

        fs::create_dir_all(self.root.join("backups"))?;
        let target = self.next_backup_path(name);
        fs::copy(&current, &target)?;
        info!("Previous model saved to {:?}", target);
        Ok(Some(target))
    }
}

impl LatticeStore for FsStore {
    fn load(&self, name: &str) -> Result<String> {
        let path = self.model_path(name);
        if !path.exists() {
            return Err(CrystalError::MissingModel {
                name: name.to_string(),
                path,
            });
        }
        Ok(fs::read_to_string(&path)?)
    }

    fn save(&self, name: &str, text: &str) -> Result<()> {
        self.backup(name)?;
        let path = self.model_path(name);
        fs::write(&path, text)?;
        info!("Lattice model written to {:?}", path);
        Ok(())
    }
}
