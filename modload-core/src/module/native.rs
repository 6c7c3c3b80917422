//! Uniform access to the platform's dynamic loader.

use std::cell::RefCell;
use std::ffi::c_void;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

use libloading::Library;
use tracing::{debug, warn};

/// Open, resolve and close native libraries.
///
/// Failures are reported as `None`; the reason is available from
/// [`NativeLoader::last_error`] until the next call on the same thread.
pub trait NativeLoader {
    type Handle;

    /// Loads the library at `path`. A bare file name is resolved by the
    /// platform's own search rules.
    fn open(&self, path: &Path) -> Option<Self::Handle>;

    /// Address of `symbol` in `handle`, or `None` if it is missing.
    fn resolve(&self, handle: &Self::Handle, symbol: &str) -> Option<NonNull<c_void>>;

    fn close(&self, handle: Self::Handle);

    fn last_error(&self) -> String;
}

static NATIVE_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn native_lock() -> MutexGuard<'static, ()> {
    NATIVE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_last_error(reason: String) {
    LAST_ERROR.with(|last| *last.borrow_mut() = Some(reason));
}

/// [`NativeLoader`] backed by `libloading`. Calls are serialised process wide.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibLoader;

impl LibLoader {
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn open_library(path: &Path) -> Result<Library, libloading::Error> {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_LOCAL, RTLD_NOW};

        // SAFETY: running library initialisers is inherent to loading a
        // module; callers only load modules they trust.
        unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_LOCAL) }.map(Library::from)
    }

    #[cfg(not(unix))]
    fn open_library(path: &Path) -> Result<Library, libloading::Error> {
        // SAFETY: see the unix variant.
        unsafe { Library::new(path) }
    }
}

impl NativeLoader for LibLoader {
    type Handle = Library;

    fn open(&self, path: &Path) -> Option<Library> {
        let _guard = native_lock();
        match Self::open_library(path) {
            Ok(library) => {
                debug!("Opened native library {:?}", path);
                Some(library)
            }
            Err(e) => {
                set_last_error(e.to_string());
                None
            }
        }
    }

    fn resolve(&self, handle: &Library, symbol: &str) -> Option<NonNull<c_void>> {
        let _guard = native_lock();
        // SAFETY: the symbol is read as an address only; nothing is called here.
        let resolved = unsafe { handle.get::<*mut c_void>(symbol.as_bytes()) };
        match resolved {
            Ok(address) => {
                let address = NonNull::new(*address);
                if address.is_none() {
                    set_last_error(format!("symbol {symbol} resolved to null"));
                }
                address
            }
            Err(e) => {
                set_last_error(e.to_string());
                None
            }
        }
    }

    fn close(&self, handle: Library) {
        let _guard = native_lock();
        if let Err(e) = handle.close() {
            warn!("Closing native library failed: {e}");
            set_last_error(e.to_string());
        }
    }

    fn last_error(&self) -> String {
        LAST_ERROR
            .with(|last| last.borrow().clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library_sets_error() {
        let loader = LibLoader::new();
        let path = Path::new("/nonexistent/modload/gamex86_64.so");

        assert!(loader.open(path).is_none());
        let reason = loader.last_error();
        assert!(!reason.is_empty());
        assert_ne!(reason, "unknown error");
    }

    #[test]
    fn test_last_error_is_per_thread() {
        let loader = LibLoader::new();
        assert!(loader.open(Path::new("/nonexistent/modload/a.so")).is_none());

        let other = std::thread::spawn(move || LibLoader::new().last_error())
            .join()
            .unwrap();
        assert_eq!(other, "unknown error");
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_system_library_symbols() {
        let loader = LibLoader::new();
        let libc = loader.open(Path::new("libc.so.6")).expect("libc should load");

        assert!(loader.resolve(&libc, "malloc").is_some());
        assert!(loader.resolve(&libc, "dllEntry").is_none());
        assert!(loader.last_error().contains("dllEntry"));

        loader.close(libc);
    }
}
