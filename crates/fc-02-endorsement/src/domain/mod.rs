//! Pure endorsement logic: no I/O, no clocks.

pub mod entities;
pub mod policy;
