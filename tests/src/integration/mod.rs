//! Cross-crate flows over the simulated network.

pub mod harness;

#[cfg(test)]
mod channel_flows;
#[cfg(test)]
mod concurrency;
#[cfg(test)]
mod fault_tolerance;
