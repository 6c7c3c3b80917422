pub mod console;
pub mod module;
pub mod paths;
pub mod settings;

// Public library API - hosts embedding the loader should only need these.
pub use module::abi::{HostSyscalls, ModuleEntry, SyscallFn, VM_ARG_COUNT};
pub use module::error::{FailedAttempt, LoadError};
pub use module::loader::{LoadedModule, ModuleLoader, ModuleRequest};
pub use module::native::{LibLoader, NativeLoader};
pub use module::resolver::{Candidate, CandidateLocation, SearchConfig};
pub use paths::SystemPaths;
pub use settings::{Settings, SettingsManager};
