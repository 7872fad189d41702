//! Montage event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the envelope for row changes and toast
//!   notifications, always scoped to a project.
//! - [`topics`]: names of the tables clients can subscribe to.

pub mod bus;
pub mod topics;

pub use bus::{ChangeKind, EventBus, PlatformEvent, Toast, ToastVariant};
