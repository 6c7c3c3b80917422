//! File names of module artifacts for the current build.

use std::env::consts;

use super::error::LoadError;

/// Tag used in artifact names for a Rust target architecture.
pub fn arch_tag_for(arch: &str) -> Option<&'static str> {
    match arch {
        "x86" => Some("i386"),
        "x86_64" => Some("x86_64"),
        "powerpc" => Some("ppc"),
        "mips" => Some("mips"),
        "aarch64" => Some("aarch64"),
        _ => None,
    }
}

/// Tag of the architecture this crate was built for.
pub fn arch_tag() -> Result<&'static str, LoadError> {
    arch_tag_for(consts::ARCH)
        .ok_or_else(|| LoadError::UnsupportedArchitecture(consts::ARCH.to_string()))
}

pub fn debug_suffix() -> &'static str {
    if cfg!(debug_assertions) {
        "-debug"
    } else {
        ""
    }
}

/// `<name><arch>[-debug]<dll suffix>`, e.g. `gamex86_64.so` in a release
/// build on 64-bit Linux.
pub fn artifact_name(name: &str) -> Result<String, LoadError> {
    Ok(format!(
        "{name}{}{}{}",
        arch_tag()?,
        debug_suffix(),
        consts::DLL_SUFFIX
    ))
}

/// The `"<os> <arch>"` string the host publishes about itself.
pub fn platform_string() -> String {
    format!("{} {}", consts::OS, consts::ARCH)
}
