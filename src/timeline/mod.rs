//! Read-only timeline snapshot consumed by the compositor and export engines.

/// Builder and element constructors.
pub mod dsl;
/// Tracks, elements and the media table.
pub mod model;
/// Per-job export settings.
pub mod settings;
