use std::ffi::c_int;

use tracing::info;

/// Dispatch callback handed to modules. The CLI hosts no services, so every
/// call is logged and answered with 0.
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn host_syscall(
    command: c_int,
    arg0: c_int,
    arg1: c_int,
    arg2: c_int,
    arg3: c_int,
    arg4: c_int,
    arg5: c_int,
    arg6: c_int,
    arg7: c_int,
    arg8: c_int,
    arg9: c_int,
    arg10: c_int,
    arg11: c_int,
) -> c_int {
    let args = [
        arg0, arg1, arg2, arg3, arg4, arg5, arg6, arg7, arg8, arg9, arg10, arg11,
    ];
    info!(target: "syscall", "Module called host: command={command} args={args:?}");
    0
}
