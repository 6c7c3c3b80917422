//! Finds, opens and handshakes with native modules.

use std::ffi::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tracing::{error, info, warn};

use super::abi::{DllEntryFn, ModuleEntry, SyscallFn, DLL_ENTRY_SYMBOL, VM_MAIN_SYMBOL};
use super::artifact::artifact_name;
use super::error::{FailedAttempt, LoadError};
use super::native::{LibLoader, NativeLoader};
use super::resolver::{resolve_candidates, resolve_library_candidates, Candidate, SearchConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Logical module name, without architecture tag or extension.
    pub name: String,
    /// Also try the bare artifact name through the platform's library search.
    pub requires_system_search: bool,
}

impl ModuleRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires_system_search: false,
        }
    }

    pub fn with_system_search(mut self, enabled: bool) -> Self {
        self.requires_system_search = enabled;
        self
    }
}

/// A module that passed the handshake. Owns the native handle; dropping it
/// or passing it to [`ModuleLoader::unload`] releases the library.
pub struct LoadedModule<H> {
    name: String,
    path: PathBuf,
    entry: ModuleEntry,
    failed_attempts: Vec<FailedAttempt>,
    handle: H,
}

impl<H> LoadedModule<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location the module was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self) -> &ModuleEntry {
        &self.entry
    }

    /// Runs the module's `vmMain`.
    pub fn call(&self, command: c_int, args: &[c_int]) -> c_int {
        self.entry.call(command, args)
    }

    /// Candidates that failed before the one that loaded.
    pub fn failed_attempts(&self) -> &[FailedAttempt] {
        &self.failed_attempts
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn into_handle(self) -> H {
        self.handle
    }
}

impl<H> std::fmt::Debug for LoadedModule<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("entry", &self.entry)
            .field("failed_attempts", &self.failed_attempts)
            .finish_non_exhaustive()
    }
}

/// Loads modules through a [`NativeLoader`] using a fixed [`SearchConfig`].
pub struct ModuleLoader<L = LibLoader> {
    loader: L,
    config: SearchConfig,
}

impl ModuleLoader<LibLoader> {
    /// Loader backed by the platform's dynamic loader.
    pub fn native(config: SearchConfig) -> Self {
        Self::new(LibLoader::new(), config)
    }
}

impl<L: NativeLoader> ModuleLoader<L> {
    pub fn new(loader: L, config: SearchConfig) -> Self {
        Self { loader, config }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Locations `load_module` would try for `request`, in order.
    pub fn candidates(&self, request: &ModuleRequest) -> Result<Vec<Candidate>, LoadError> {
        let file_name = artifact_name(&request.name)?;
        Ok(resolve_candidates(request, &file_name, &self.config))
    }

    /// Opens the first loadable candidate for `request`, checks that it
    /// exports `dllEntry` and `vmMain`, then calls `dllEntry(dispatch)`.
    ///
    /// On any failure after the library was opened it is closed again before
    /// returning.
    pub fn load_module(
        &self,
        request: &ModuleRequest,
        dispatch: SyscallFn,
    ) -> Result<LoadedModule<L::Handle>, LoadError> {
        let candidates = self.candidates(request)?;
        let (handle, path, failed_attempts) = self.open_first(&request.name, &candidates)?;

        let symbols = self
            .resolve_symbol(&handle, &request.name, DLL_ENTRY_SYMBOL)
            .and_then(|dll_entry| {
                let vm_main = self.resolve_symbol(&handle, &request.name, VM_MAIN_SYMBOL)?;
                Ok((dll_entry, vm_main))
            });

        let (dll_entry, vm_main) = match symbols {
            Ok(symbols) => symbols,
            Err(e) => {
                error!("Loading module \"{}\" from {:?} failed: {e}", request.name, path);
                self.loader.close(handle);
                return Err(e);
            }
        };

        // SAFETY: both symbols follow the module ABI by contract, and the
        // handle stored next to them keeps the library mapped.
        let entry = unsafe { ModuleEntry::from_raw(vm_main) };
        info!(
            "Module \"{}\" found {VM_MAIN_SYMBOL} at {:p}",
            request.name,
            entry.as_ptr()
        );

        // SAFETY: as above. The module stores `dispatch` for later calls.
        unsafe {
            let dll_entry = std::mem::transmute::<*mut c_void, DllEntryFn>(dll_entry.as_ptr());
            dll_entry(dispatch);
        }
        info!("Module \"{}\" loaded from {:?}", request.name, path);

        Ok(LoadedModule {
            name: request.name.clone(),
            path,
            entry,
            failed_attempts,
            handle,
        })
    }

    /// Finds a plain library by file name: the platform search when
    /// `use_system_lib` is set, then the binary directory, then the base path.
    /// No symbols are checked.
    pub fn load_library(&self, name: &str, use_system_lib: bool) -> Result<L::Handle, LoadError> {
        let candidates = resolve_library_candidates(name, use_system_lib, &self.config);
        let (handle, _, _) = self.open_first(name, &candidates)?;
        Ok(handle)
    }

    pub fn unload(&self, module: LoadedModule<L::Handle>) {
        info!("Unloading module \"{}\"", module.name);
        self.loader.close(module.handle);
    }

    fn open_first(
        &self,
        name: &str,
        candidates: &[Candidate],
    ) -> Result<(L::Handle, PathBuf, Vec<FailedAttempt>), LoadError> {
        let mut attempts = Vec::new();

        for candidate in candidates {
            info!(
                "Trying to load \"{name}\" from {:?} ({})",
                candidate.path, candidate.location
            );

            match self.loader.open(&candidate.path) {
                Some(handle) => {
                    info!("Loaded \"{name}\" from {:?}", candidate.path);
                    return Ok((handle, candidate.path.clone(), attempts));
                }
                None => {
                    let reason = self.loader.last_error();
                    warn!("Loading {:?} failed: \"{reason}\"", candidate.path);
                    attempts.push(FailedAttempt {
                        path: candidate.path.clone(),
                        reason,
                    });
                }
            }
        }

        warn!("Loading \"{name}\" failed");
        Err(LoadError::PathExhausted {
            name: name.to_string(),
            attempts,
        })
    }

    fn resolve_symbol(
        &self,
        handle: &L::Handle,
        module: &str,
        symbol: &'static str,
    ) -> Result<NonNull<c_void>, LoadError> {
        self.loader
            .resolve(handle, symbol)
            .ok_or_else(|| LoadError::SymbolMissing {
                module: module.to_string(),
                symbol,
                reason: self.loader.last_error(),
            })
    }
}
