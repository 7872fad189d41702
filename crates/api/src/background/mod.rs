//! Long-running background tasks spawned at server start-up.

pub mod voting;
