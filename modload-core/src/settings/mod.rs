pub mod config;
pub mod manager;

pub use config::{FsSettings, Settings};
pub use manager::SettingsManager;

#[cfg(test)]
mod tests;
