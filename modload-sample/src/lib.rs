//! Minimal native module. Build it as a `cdylib`, rename the artifact to the
//! name `modload candidates sample` prints and load it with `modload load`.

use std::ffi::c_int;

use modload_core::module::abi::{HostSyscalls, VM_ARG_COUNT};

pub const GAME_INIT: c_int = 0;
pub const GAME_SHUTDOWN: c_int = 1;
/// Returns the sum of all arguments.
pub const GAME_ADD: c_int = 2;

/// Host command used to announce lifecycle changes: `(HOST_NOTIFY, command, arg0)`.
pub const HOST_NOTIFY: c_int = 0;

fn dispatch(host: &HostSyscalls, command: c_int, args: &[c_int; VM_ARG_COUNT]) -> c_int {
    match command {
        GAME_INIT | GAME_SHUTDOWN => match host.call(HOST_NOTIFY, &[command, args[0]]) {
            Some(_) => 0,
            None => -1,
        },
        GAME_ADD => args.iter().fold(0, |sum, arg| sum.wrapping_add(*arg)),
        _ => -1,
    }
}

modload_core::game_module!(dispatch);
