//! Native game module loading.
//!
//! A module is a dynamic library that exports two C symbols:
//!
//! ```c
//! // Called once with the host's dispatch callback.
//! void dllEntry(int (*syscall)(int command, int arg0, ..., int arg11));
//!
//! // The module's command dispatch routine.
//! int vmMain(int command, int arg0, ..., int arg11);
//! ```
//!
//! [`loader::ModuleLoader`] finds the library through an ordered list of
//! candidate paths ([`resolver`]), opens it through a [`native::NativeLoader`],
//! checks both symbols and performs the `dllEntry` handshake. Rust modules can
//! export the symbols with the [`game_module!`](crate::game_module) macro.

pub mod abi;
pub mod artifact;
pub mod error;
pub mod loader;
pub mod mock;
pub mod native;
pub mod resolver;

pub use abi::{DllEntryFn, HostSyscalls, ModuleEntry, SyscallFn, VmMainFn, VM_ARG_COUNT};
pub use error::{FailedAttempt, LoadError};
pub use loader::{LoadedModule, ModuleLoader, ModuleRequest};
pub use native::{LibLoader, NativeLoader};
