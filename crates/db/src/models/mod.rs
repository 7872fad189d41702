//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and patches where the table accepts them

pub mod changelog;
pub mod chat_message;
pub mod clip_like;
pub mod pending_clip;
pub mod project;
pub mod user;
pub mod video_clip;
