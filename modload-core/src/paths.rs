//! Process-level paths the loader searches from.
//!
//! The binary path, the default install path and the default CD path are set
//! once during startup and then handed to whoever needs them by reference.

use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemPaths {
    binary_path: Option<PathBuf>,
    install_path: Option<PathBuf>,
    cd_path: Option<PathBuf>,
    cwd: PathBuf,
}

impl SystemPaths {
    /// Paths rooted at the given working directory with nothing else set.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    /// Detects the running executable's directory and the working directory.
    pub fn detect() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut paths = Self::new(cwd);

        match std::env::current_exe() {
            Ok(exe) => {
                if let Some(dir) = exe.parent() {
                    paths.set_binary_path(dir);
                }
            }
            Err(e) => debug!("Unable to locate running executable: {e:?}"),
        }

        paths
    }

    pub fn set_binary_path(&mut self, path: impl AsRef<Path>) {
        self.binary_path = non_empty(path.as_ref());
    }

    /// Directory of the running binary, if known.
    pub fn binary_path(&self) -> Option<&Path> {
        self.binary_path.as_deref()
    }

    pub fn set_default_install_path(&mut self, path: impl AsRef<Path>) {
        self.install_path = non_empty(path.as_ref());
    }

    /// The configured install path, or the working directory when unset.
    pub fn default_install_path(&self) -> &Path {
        self.install_path.as_deref().unwrap_or(&self.cwd)
    }

    pub fn set_default_cd_path(&mut self, path: impl AsRef<Path>) {
        self.cd_path = non_empty(path.as_ref());
    }

    pub fn default_cd_path(&self) -> Option<&Path> {
        self.cd_path.as_deref()
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

fn non_empty(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path.to_path_buf())
    }
}
