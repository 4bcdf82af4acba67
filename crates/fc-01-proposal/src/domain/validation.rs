//! Request validation and system chaincode routing.

use crate::error::{ProposalError, ProposalResult};
use shared_types::{system_chaincode, Invocation, ProposalKind};

/// Check that `invocation` carries every field `kind` depends on.
pub fn validate_request(
    channel: &str,
    kind: ProposalKind,
    invocation: &Invocation,
) -> ProposalResult<()> {
    let missing =
        |field: &'static str| -> ProposalResult<()> { Err(ProposalError::MissingField { kind, field }) };

    if kind.requires_channel() && channel.trim().is_empty() {
        return missing("channel name");
    }
    if invocation.chaincode.trim().is_empty() {
        match kind {
            ProposalKind::JoinChannel => {}
            ProposalKind::SystemQuery => return missing("system chaincode"),
            _ => return missing("chaincode name"),
        }
    }

    match kind {
        ProposalKind::Install | ProposalKind::Instantiate | ProposalKind::Upgrade
            if invocation.version.as_deref().map_or(true, str::is_empty) =>
        {
            missing("chaincode version")
        }
        ProposalKind::JoinChannel if invocation.args.first().map_or(true, Vec::is_empty) => {
            missing("genesis block")
        }
        _ if invocation.fcn.trim().is_empty() => missing("function name"),
        _ => Ok(()),
    }
}

/// Name of the chaincode a peer must route the proposal to.
///
/// Lifecycle operations go to the lifecycle system chaincode, channel joins to
/// the configuration system chaincode; everything else is addressed directly.
pub fn target_chaincode(kind: ProposalKind, invocation: &Invocation) -> &str {
    match kind {
        ProposalKind::Install | ProposalKind::Instantiate | ProposalKind::Upgrade => {
            system_chaincode::LIFECYCLE
        }
        ProposalKind::JoinChannel => system_chaincode::CONFIG,
        ProposalKind::Invoke | ProposalKind::Query | ProposalKind::SystemQuery => {
            &invocation.chaincode
        }
    }
}
