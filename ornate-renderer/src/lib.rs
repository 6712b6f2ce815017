//! Materializes processed templates into host nodes and drives mounting:
//! event and binding wiring, the visibility ticker, configuration, and the
//! [`Ornate`] engine tying builder, cache, processor and renderer together.

pub mod config;
pub mod error;
pub mod events;
pub mod mount;
pub mod render;
pub mod visibility;

pub use config::{Config, ConfigError};
pub use error::MountError;
pub use mount::Ornate;
pub use render::Renderer;
pub use visibility::VisibilityTicker;
