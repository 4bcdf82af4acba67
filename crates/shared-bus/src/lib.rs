//! # Shared Bus - Ledger Event Bus
//!
//! Carries block-commit and chaincode-readiness events from peers to
//! whoever is waiting on them.
//!
//! ```text
//! ┌──────────────┐                    ┌────────────────┐
//! │ Peer (event  │    publish()       │ Commit Monitor │
//! │   source)    │ ──────┐            │                │
//! └──────────────┘       │            └────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐           │
//!                  │  Event Bus   │           │
//!                  │              │ ──────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Subscriptions only see events published after they were created, so a
//! waiter must subscribe before the action that produces the event.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent, TxValidation};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
