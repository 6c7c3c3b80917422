//! C ABI shared by the host and native modules.

use std::ffi::{c_int, c_void};
use std::ptr::NonNull;
use std::sync::RwLock;

use tracing::warn;

/// Registration symbol. Receives the host's dispatch callback.
pub const DLL_ENTRY_SYMBOL: &str = "dllEntry";

/// Main dispatch symbol of a module.
pub const VM_MAIN_SYMBOL: &str = "vmMain";

/// Number of integer arguments that follow the command in every call across
/// the boundary.
pub const VM_ARG_COUNT: usize = 12;

/// Host call surface handed to the module: command followed by 12 arguments.
pub type SyscallFn = unsafe extern "C" fn(
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
) -> c_int;

/// `vmMain`, same shape as [`SyscallFn`] in the opposite direction.
pub type VmMainFn = SyscallFn;

/// `dllEntry`.
pub type DllEntryFn = unsafe extern "C" fn(SyscallFn);

/// Spreads `args` into the fixed argument block, zero filling the rest.
/// Arguments beyond [`VM_ARG_COUNT`] are dropped.
pub fn pack_args(args: &[c_int]) -> [c_int; VM_ARG_COUNT] {
    if args.len() > VM_ARG_COUNT {
        warn!(
            "Dropping {} arguments beyond the {VM_ARG_COUNT} supported by the module ABI",
            args.len() - VM_ARG_COUNT
        );
    }

    let mut packed = [0; VM_ARG_COUNT];
    for (slot, arg) in packed.iter_mut().zip(args) {
        *slot = *arg;
    }
    packed
}

/// Calls a command-plus-12-arguments function pointer.
///
/// # Safety
///
/// `f` must point to a function with exactly that signature that is still
/// mapped into the process.
pub unsafe fn invoke(f: SyscallFn, command: c_int, args: &[c_int]) -> c_int {
    let a = pack_args(args);
    f(
        command, a[0], a[1], a[2], a[3], a[4], a[5], a[6], a[7], a[8], a[9], a[10], a[11],
    )
}

/// Typed `vmMain` of a loaded module.
///
/// Only reachable by reference through the owning
/// [`LoadedModule`](crate::LoadedModule), so it cannot be kept past an unload:
///
/// ```compile_fail
/// use modload_core::{LoadedModule, ModuleEntry};
///
/// fn detach<H>(module: &LoadedModule<H>) -> ModuleEntry {
///     *module.entry()
/// }
/// ```
pub struct ModuleEntry {
    vm_main: VmMainFn,
}

impl ModuleEntry {
    /// # Safety
    ///
    /// `symbol` must be the address of a `vmMain` with the [`VmMainFn`]
    /// signature, and the library it lives in must outlive every call.
    pub unsafe fn from_raw(symbol: NonNull<c_void>) -> Self {
        Self {
            vm_main: std::mem::transmute::<*mut c_void, VmMainFn>(symbol.as_ptr()),
        }
    }

    /// Runs `vmMain(command, args...)`.
    pub fn call(&self, command: c_int, args: &[c_int]) -> c_int {
        // SAFETY: guaranteed by `from_raw`; the owning `LoadedModule` keeps the
        // library mapped.
        unsafe { invoke(self.vm_main, command, args) }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.vm_main as *const c_void
    }
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModuleEntry({:p})", self.as_ptr())
    }
}

/// Module side storage for the dispatch callback received in `dllEntry`.
///
/// Every handshake replaces the stored callback, so a library that stays
/// mapped across loads always calls the host that loaded it last.
pub struct HostSyscalls {
    syscall: RwLock<Option<SyscallFn>>,
}

impl HostSyscalls {
    pub const fn new() -> Self {
        Self {
            syscall: RwLock::new(None),
        }
    }

    /// Stores the host callback, returning the one it replaced.
    pub fn register(&self, syscall: SyscallFn) -> Option<SyscallFn> {
        let mut slot = self.syscall.write().unwrap_or_else(|e| e.into_inner());
        slot.replace(syscall)
    }

    pub fn is_registered(&self) -> bool {
        self.current().is_some()
    }

    /// Calls into the host, or `None` before the handshake happened.
    pub fn call(&self, command: c_int, args: &[c_int]) -> Option<c_int> {
        let syscall = self.current()?;
        // SAFETY: the host passed this pointer in `dllEntry` and stays loaded
        // for as long as the module is.
        Some(unsafe { invoke(syscall, command, args) })
    }

    fn current(&self) -> Option<SyscallFn> {
        *self.syscall.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for HostSyscalls {
    fn default() -> Self {
        Self::new()
    }
}

/// Exports `dllEntry` and `vmMain` from a Rust module.
///
/// The handler receives the stored host callbacks, the command and the 12
/// argument block.
///
/// # Example
///
/// ```rust,ignore
/// use std::ffi::c_int;
/// use modload_core::module::abi::{HostSyscalls, VM_ARG_COUNT};
///
/// fn dispatch(host: &HostSyscalls, command: c_int, args: &[c_int; VM_ARG_COUNT]) -> c_int {
///     host.call(0, &[command]).unwrap_or(-1) + args[0]
/// }
///
/// modload_core::game_module!(dispatch);
/// ```
#[macro_export]
macro_rules! game_module {
    ($handler:path) => {
        static MODLOAD_HOST: $crate::module::abi::HostSyscalls =
            $crate::module::abi::HostSyscalls::new();

        #[no_mangle]
        #[allow(non_snake_case)]
        pub unsafe extern "C" fn dllEntry(syscall: $crate::module::abi::SyscallFn) {
            MODLOAD_HOST.register(syscall);
        }

        #[no_mangle]
        #[allow(non_snake_case, clippy::too_many_arguments)]
        pub unsafe extern "C" fn vmMain(
            command: ::std::ffi::c_int,
            arg0: ::std::ffi::c_int,
            arg1: ::std::ffi::c_int,
            arg2: ::std::ffi::c_int,
            arg3: ::std::ffi::c_int,
            arg4: ::std::ffi::c_int,
            arg5: ::std::ffi::c_int,
            arg6: ::std::ffi::c_int,
            arg7: ::std::ffi::c_int,
            arg8: ::std::ffi::c_int,
            arg9: ::std::ffi::c_int,
            arg10: ::std::ffi::c_int,
            arg11: ::std::ffi::c_int,
        ) -> ::std::ffi::c_int {
            $handler(
                &MODLOAD_HOST,
                command,
                &[
                    arg0, arg1, arg2, arg3, arg4, arg5, arg6, arg7, arg8, arg9, arg10, arg11,
                ],
            )
        }
    };
}
