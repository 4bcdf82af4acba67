//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::{EndorsementRequest, EndorsementSet};
use crate::error::EndorsementResult;
use async_trait::async_trait;
use shared_types::CallContext;

/// Primary Endorsement Collector API.
#[async_trait]
pub trait EndorsementApi: Send + Sync {
    /// Fan the proposal out to every target and resolve under the policy.
    ///
    /// Bounded by `ctx.timeouts.endorsement`; aborted by `ctx.cancel`.
    async fn collect(
        &self,
        request: EndorsementRequest,
        ctx: &CallContext,
    ) -> EndorsementResult<EndorsementSet>;
}
