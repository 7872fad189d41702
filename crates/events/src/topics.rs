//! Realtime topic names.
//!
//! Clients subscribe per `(table, project_id)`. Toasts are delivered to
//! every subscriber of the project regardless of table.

pub const TABLE_PENDING_CLIPS: &str = "pending_clips";
pub const TABLE_VIDEO_CLIPS: &str = "video_clips";
pub const TABLE_PROJECT_MESSAGES: &str = "project_messages";
pub const TABLE_PROJECT_CHANGELOG: &str = "project_changelog";

/// Every table that publishes change events.
pub const REALTIME_TABLES: &[&str] = &[
    TABLE_PENDING_CLIPS,
    TABLE_VIDEO_CLIPS,
    TABLE_PROJECT_MESSAGES,
    TABLE_PROJECT_CHANGELOG,
];

/// Event type of toast notifications.
pub const EVENT_TOAST: &str = "toast";

/// Whether clients may subscribe to `table`.
pub fn is_realtime_table(table: &str) -> bool {
    REALTIME_TABLES.contains(&table)
}
