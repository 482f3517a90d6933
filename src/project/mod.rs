//! Project files: pyproject.toml, CHANGELOG.md and version arithmetic

pub mod changelog;
pub mod pyproject;
pub mod version;

pub use changelog::Changelog;
pub use pyproject::Manifest;
pub use version::BumpType;
