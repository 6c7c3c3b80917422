use serde::{Deserialize, Serialize};

/// Filesystem values the loader searches with. Each one mirrors a console
/// variable of the engine (`fs_basepath`, `fs_cdpath`, `fs_game`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FsSettings {
    /// Install root. When unset the default install path is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Secondary install root, searched after the base path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cd_path: Option<String>,

    /// Variant (mod) subdirectory below each root. Empty means the root itself.
    #[serde(default)]
    pub game: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub fs: FsSettings,
}
