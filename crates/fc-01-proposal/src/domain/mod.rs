//! Pure proposal logic.

pub mod validation;
