//! Ordered candidate locations for a module artifact.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::loader::ModuleRequest;
use crate::paths::SystemPaths;
use crate::settings::FsSettings;

/// Variant directory searched last, whatever variant is configured.
pub const BASEGAME: &str = "basegame";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateLocation {
    /// Bare file name handed to the platform loader's own search.
    System,
    /// Next to the running binary.
    Executable,
    /// Base path, configured variant.
    BasePath,
    /// Secondary path, configured variant.
    CdPath,
    /// Base path, [`BASEGAME`] variant.
    BaseGame,
}

impl CandidateLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateLocation::System => "system",
            CandidateLocation::Executable => "executable",
            CandidateLocation::BasePath => "base_path",
            CandidateLocation::CdPath => "cd_path",
            CandidateLocation::BaseGame => "base_game",
        }
    }
}

impl std::fmt::Display for CandidateLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub location: CandidateLocation,
    pub path: PathBuf,
}

impl Candidate {
    fn new(location: CandidateLocation, path: PathBuf) -> Self {
        Self { location, path }
    }
}

/// Directories searched for modules, fixed for the life of a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub binary_dir: PathBuf,
    pub base_path: PathBuf,
    pub cd_path: Option<PathBuf>,
    pub game: String,
}

impl SearchConfig {
    /// Combines startup paths with the filesystem settings. Unset settings
    /// fall back to the matching [`SystemPaths`] default.
    pub fn new(paths: &SystemPaths, fs: &FsSettings) -> Self {
        let binary_dir = or_current_dir(paths.binary_path().unwrap_or(paths.cwd()));

        let base_path = match fs.base_path.as_deref().filter(|p| !p.is_empty()) {
            Some(base) => PathBuf::from(base),
            None => or_current_dir(paths.default_install_path()),
        };

        let cd_path = match fs.cd_path.as_deref() {
            Some(cd) if !cd.is_empty() => Some(PathBuf::from(cd)),
            Some(_) => None,
            None => paths.default_cd_path().map(Path::to_path_buf),
        };

        Self {
            binary_dir,
            base_path,
            cd_path,
            game: fs.game.clone(),
        }
    }

    fn cd_path(&self) -> Option<&Path> {
        self.cd_path
            .as_deref()
            .filter(|cd| !cd.as_os_str().is_empty())
    }
}

fn or_current_dir(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        path.to_path_buf()
    }
}

fn game_dir(root: &Path, game: &str) -> PathBuf {
    if game.is_empty() {
        root.to_path_buf()
    } else {
        root.join(game)
    }
}

/// Locations for a module artifact, highest priority first:
///
/// 1. the bare file name, when the request asks for a system search
/// 2. the binary directory
/// 3. base path / variant, unless that is the binary directory
/// 4. secondary path / variant, when one is configured
/// 5. base path / [`BASEGAME`]
pub fn resolve_candidates(
    request: &ModuleRequest,
    file_name: &str,
    config: &SearchConfig,
) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(5);

    if request.requires_system_search {
        candidates.push(Candidate::new(
            CandidateLocation::System,
            PathBuf::from(file_name),
        ));
    }

    candidates.push(Candidate::new(
        CandidateLocation::Executable,
        config.binary_dir.join(file_name),
    ));

    let variant_dir = game_dir(&config.base_path, &config.game);
    let variant_path = variant_dir.join(file_name);
    if variant_dir != config.binary_dir {
        candidates.push(Candidate::new(
            CandidateLocation::BasePath,
            variant_path.clone(),
        ));
    } else {
        debug!("Base path {:?} is the binary directory, skipping", variant_dir);
    }

    if let Some(cd) = config.cd_path() {
        candidates.push(Candidate::new(
            CandidateLocation::CdPath,
            game_dir(cd, &config.game).join(file_name),
        ));
    }

    let basegame_path = config.base_path.join(BASEGAME).join(file_name);
    if basegame_path != variant_path {
        candidates.push(Candidate::new(CandidateLocation::BaseGame, basegame_path));
    }

    candidates
}

/// Locations for a plain library: the bare name when `use_system_lib` is set,
/// then the binary directory, then the base path unless it is the binary
/// directory.
pub fn resolve_library_candidates(
    name: &str,
    use_system_lib: bool,
    config: &SearchConfig,
) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(3);

    if use_system_lib {
        candidates.push(Candidate::new(CandidateLocation::System, PathBuf::from(name)));
    }

    candidates.push(Candidate::new(
        CandidateLocation::Executable,
        config.binary_dir.join(name),
    ));

    if config.base_path != config.binary_dir {
        candidates.push(Candidate::new(
            CandidateLocation::BasePath,
            config.base_path.join(name),
        ));
    }

    candidates
}
