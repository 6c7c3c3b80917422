//! In-memory [`NativeLoader`] for tests.
//!
//! Libraries are registered by path with a symbol table. Every `open` and
//! `close` is recorded. A path that still has a live handle refuses a second
//! open, so a handle leaked by the code under test shows up as a failed reopen.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use super::abi::{DllEntryFn, VmMainFn, DLL_ENTRY_SYMBOL, VM_MAIN_SYMBOL};
use super::native::NativeLoader;

/// Symbol table of one fake library.
#[derive(Debug, Clone, Default)]
pub struct MockLibrary {
    symbols: HashMap<String, usize>,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, name: &str, address: *const c_void) -> Self {
        self.symbols.insert(name.to_string(), address as usize);
        self
    }

    /// A library exporting both module entry points.
    pub fn game_module(dll_entry: DllEntryFn, vm_main: VmMainFn) -> Self {
        Self::new()
            .with_symbol(DLL_ENTRY_SYMBOL, dll_entry as *const c_void)
            .with_symbol(VM_MAIN_SYMBOL, vm_main as *const c_void)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle {
    id: u64,
    path: PathBuf,
}

impl MockHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Default)]
struct MockState {
    opened: Vec<PathBuf>,
    closed: Vec<PathBuf>,
    live: HashMap<u64, PathBuf>,
    next_id: u64,
    last_error: Option<String>,
}

#[derive(Default)]
pub struct MockLoader {
    libraries: HashMap<PathBuf, MockLibrary>,
    state: RefCell<MockState>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `library` openable at `path`.
    pub fn with_library(mut self, path: impl Into<PathBuf>, library: MockLibrary) -> Self {
        self.libraries.insert(path.into(), library);
        self
    }

    /// Every path passed to `open`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.state.borrow().opened.clone()
    }

    /// Paths of handles passed to `close`, in call order.
    pub fn closed(&self) -> Vec<PathBuf> {
        self.state.borrow().closed.clone()
    }

    pub fn live_handles(&self) -> usize {
        self.state.borrow().live.len()
    }

    fn fail(&self, reason: String) {
        self.state.borrow_mut().last_error = Some(reason);
    }
}

impl NativeLoader for MockLoader {
    type Handle = MockHandle;

    fn open(&self, path: &Path) -> Option<MockHandle> {
        let mut state = self.state.borrow_mut();
        state.opened.push(path.to_path_buf());

        if !self.libraries.contains_key(path) {
            state.last_error = Some(format!(
                "{}: cannot open shared object file: No such file or directory",
                path.display()
            ));
            return None;
        }

        if state.live.values().any(|open| open == path) {
            state.last_error = Some(format!("{}: already open", path.display()));
            return None;
        }

        let id = state.next_id;
        state.next_id += 1;
        state.live.insert(id, path.to_path_buf());
        Some(MockHandle {
            id,
            path: path.to_path_buf(),
        })
    }

    fn resolve(&self, handle: &MockHandle, symbol: &str) -> Option<NonNull<c_void>> {
        let address = self
            .libraries
            .get(&handle.path)
            .and_then(|library| library.symbols.get(symbol))
            .and_then(|address| NonNull::new(*address as *mut c_void));

        if address.is_none() {
            self.fail(format!(
                "{}: undefined symbol: {symbol}",
                handle.path.display()
            ));
        }
        address
    }

    fn close(&self, handle: MockHandle) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&handle.id);
        state.closed.push(handle.path);
    }

    fn last_error(&self) -> String {
        self.state
            .borrow()
            .last_error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string())
    }
}
