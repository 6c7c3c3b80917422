use std::path::PathBuf;

use modload_core::{LoadError, ModuleLoader, ModuleRequest, SearchConfig, SyscallFn};
use tempfile::TempDir;

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn host_syscall(
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
    _: i32,
) -> i32 {
    0
}

struct Dirs {
    binary: TempDir,
    base: TempDir,
}

impl Dirs {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Self {
            binary: TempDir::new().unwrap(),
            base: TempDir::new().unwrap(),
        }
    }

    fn config(&self) -> SearchConfig {
        SearchConfig {
            binary_dir: self.binary.path().to_path_buf(),
            base_path: self.base.path().to_path_buf(),
            cd_path: None,
            game: "mygame".to_string(),
        }
    }
}

#[test]
fn test_absent_module_fails_the_same_way_twice() {
    let dirs = Dirs::new();
    let loader = ModuleLoader::native(dirs.config());
    let request = ModuleRequest::new("modload_absent_module");
    let dispatch: SyscallFn = host_syscall;

    let first = loader.load_module(&request, dispatch).unwrap_err();
    let second = loader.load_module(&request, dispatch).unwrap_err();

    assert_eq!(first, second);
    let attempts = match first {
        LoadError::PathExhausted { attempts, .. } => attempts,
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(attempts.len(), 3);
    assert!(attempts[0].path.starts_with(dirs.binary.path()));
    assert!(attempts.iter().all(|attempt| !attempt.reason.is_empty()));
}

#[test]
fn test_non_library_file_is_rejected() {
    let dirs = Dirs::new();
    let loader = ModuleLoader::native(dirs.config());
    let request = ModuleRequest::new("game");
    let candidates = loader.candidates(&request).unwrap();
    std::fs::write(&candidates[0].path, b"not a shared object").unwrap();

    let err = loader.load_module(&request, host_syscall).unwrap_err();

    let attempts = match err {
        LoadError::PathExhausted { attempts, .. } => attempts,
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(attempts[0].path, candidates[0].path);
}

#[test]
fn test_library_search_misses_in_empty_dirs() {
    let dirs = Dirs::new();
    let loader = ModuleLoader::native(dirs.config());

    let err = loader.load_library("libmodload_absent.so", false).unwrap_err();

    let (name, attempts) = match err {
        LoadError::PathExhausted { name, attempts } => (name, attempts),
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(name, "libmodload_absent.so");
    assert_eq!(
        attempts.iter().map(|a| a.path.clone()).collect::<Vec<PathBuf>>(),
        vec![
            dirs.binary.path().join("libmodload_absent.so"),
            dirs.base.path().join("libmodload_absent.so"),
        ]
    );
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_system_library_found_by_bare_name() {
    use modload_core::module::abi::DLL_ENTRY_SYMBOL;
    use modload_core::NativeLoader;

    let dirs = Dirs::new();
    let loader = ModuleLoader::native(dirs.config());

    let libc = loader.load_library("libc.so.6", true).unwrap();
    assert!(loader.loader().resolve(&libc, "malloc").is_some());
    assert!(loader.loader().resolve(&libc, DLL_ENTRY_SYMBOL).is_none());
    loader.loader().close(libc);

    assert!(loader.load_library("libc.so.6", false).is_err());
}
