//! Feed core: everything the overlay simulates, with no I/O and no timers.
//!
//! ARCHITECTURE
//! ============
//! `controls` holds the panel parameters and manual log, `simulator` owns
//! the retained buffer and live hearts. The remaining modules are the
//! building blocks both of them draw on. Async scheduling and broadcast live
//! in `services`.

pub mod buffer;
pub mod cadence;
pub mod controls;
pub mod entry;
pub mod hearts;
pub mod picker;
pub mod pools;
pub mod simulator;
