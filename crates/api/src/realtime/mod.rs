//! Fan-out of bus events to WebSocket subscribers.

mod router;

pub use router::RealtimeRouter;
