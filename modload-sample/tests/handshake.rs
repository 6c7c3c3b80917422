use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::c_int;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use modload_core::module::artifact::artifact_name;
use modload_core::{ModuleLoader, ModuleRequest, SearchConfig};
use modload_sample::{GAME_ADD, GAME_INIT, HOST_NOTIFY};
use tempfile::TempDir;

macro_rules! counting_host {
    ($name:ident, $counter:ident) => {
        static $counter: AtomicUsize = AtomicUsize::new(0);

        #[allow(clippy::too_many_arguments)]
        unsafe extern "C" fn $name(
            command: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
            _: c_int,
        ) -> c_int {
            if command == HOST_NOTIFY {
                $counter.fetch_add(1, Ordering::SeqCst);
            }
            0
        }
    };
}

counting_host!(host_single, SINGLE_CALLS);
counting_host!(host_first, FIRST_CALLS);
counting_host!(host_second, SECOND_CALLS);

/// The `cdylib` cargo builds next to this test binary.
fn built_sample() -> Option<PathBuf> {
    let file_name = format!("{DLL_PREFIX}modload_sample{DLL_SUFFIX}");
    let exe = std::env::current_exe().ok()?;
    let deps = exe.parent()?;
    let found = [Some(deps), deps.parent()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file());
    found
}

/// Installs the built sample as the `game` module of a fresh binary directory.
fn install_sample() -> Option<(TempDir, SearchConfig)> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let Some(sample) = built_sample() else {
        eprintln!("modload_sample library not found next to the test binary, skipping");
        return None;
    };

    let dir = TempDir::new().unwrap();
    let binary_dir = dir.path().join("bin");
    std::fs::create_dir_all(&binary_dir).unwrap();
    std::fs::copy(&sample, binary_dir.join(artifact_name("game").unwrap())).unwrap();

    let config = SearchConfig {
        binary_dir,
        base_path: dir.path().to_path_buf(),
        cd_path: None,
        game: "mygame".to_string(),
    };
    Some((dir, config))
}

#[cfg(target_os = "linux")]
fn is_mapped(dir: &TempDir) -> bool {
    let maps = std::fs::read_to_string("/proc/self/maps").unwrap();
    maps.contains(dir.path().to_str().unwrap())
}

#[test]
fn test_handshake_with_built_library() {
    let Some((dir, config)) = install_sample() else {
        return;
    };
    let loader = ModuleLoader::native(config);

    let module = loader
        .load_module(&ModuleRequest::new("game"), host_single)
        .unwrap();

    assert!(module.path().starts_with(dir.path()));
    assert!(module.failed_attempts().is_empty());
    assert_eq!(module.call(GAME_ADD, &[40, 2]), 42);
    assert_eq!(module.call(GAME_INIT, &[]), 0);
    assert_eq!(SINGLE_CALLS.load(Ordering::SeqCst), 1);

    #[cfg(target_os = "linux")]
    assert!(is_mapped(&dir));

    loader.unload(module);

    #[cfg(target_os = "linux")]
    assert!(!is_mapped(&dir));
}

#[test]
fn test_second_handshake_replaces_host_callback() {
    let Some((_dir, config)) = install_sample() else {
        return;
    };
    let loader = ModuleLoader::native(config);
    let request = ModuleRequest::new("game");

    let first = loader.load_module(&request, host_first).unwrap();
    let second = loader.load_module(&request, host_second).unwrap();

    assert_eq!(second.call(GAME_INIT, &[]), 0);
    assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(SECOND_CALLS.load(Ordering::SeqCst), 1);

    // Both loads share one mapping, so the first module now reaches the same host.
    assert_eq!(first.call(GAME_INIT, &[]), 0);
    assert_eq!(SECOND_CALLS.load(Ordering::SeqCst), 2);

    loader.unload(second);
    loader.unload(first);
}
