//! Pure submission logic.

pub mod assembler;
pub mod retry;
