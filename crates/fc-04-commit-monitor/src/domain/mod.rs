//! Pure commit-tracking logic.

pub mod state;
