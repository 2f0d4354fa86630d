//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the feed's scheduling and broadcast so route
//! handlers can stay focused on protocol translation.

pub mod feed;
pub mod scheduler;
