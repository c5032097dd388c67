//! Configuration module for lookgen.
//!
//! Handles the TOML settings file and value precedence.

mod settings;

pub use settings::{
    expand_env_vars, GenerationSettings, OutputSettings, Settings, SettingsError,
};

/// First present value of an ordered precedence chain.
///
/// ```rust,ignore
/// let entity = first_present([meta.primary_entity, config.meta.primary_entity]);
/// ```
pub fn first_present<T>(sources: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    sources.into_iter().flatten().next()
}
