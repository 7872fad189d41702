//! Domain logic shared by every Montage crate.
//!
//! Nothing in here performs I/O: the database, API and coordinator layers
//! call into these modules for constants, validation and policy decisions.

pub mod changelog;
pub mod clip_status;
pub mod effects;
pub mod error;
pub mod payments;
pub mod timeline;
pub mod types;
pub mod voting;
