//! Transaction envelope assembly.

use crate::error::{SubmissionError, SubmissionResult};
use shared_types::{
    to_canonical_bytes, EndorsementResponse, Envelope, EnvelopePayload, SignedProposal,
    SigningIdentity, TransactionPayload,
};

/// Wrap a proposal and its accepted endorsements into a signed envelope.
///
/// The envelope reuses the proposal's headers, so its transaction ID is the
/// proposal's. `identity` must be the proposal's creator.
pub fn assemble_transaction(
    identity: &dyn SigningIdentity,
    proposal: &SignedProposal,
    endorsements: &[EndorsementResponse],
) -> SubmissionResult<Envelope> {
    let tx_id = proposal.tx_id();
    let first = endorsements
        .first()
        .ok_or_else(|| SubmissionError::NoEndorsements {
            tx_id: tx_id.clone(),
        })?;

    if let Some(other) = endorsements
        .iter()
        .find(|e| e.result_digest != first.result_digest)
    {
        return Err(SubmissionError::InconsistentEndorsements {
            tx_id: tx_id.clone(),
            first_peer: first.peer.clone(),
            peer: other.peer.clone(),
        });
    }

    if identity.descriptor().to_bytes()? != proposal.proposal.signature_header.creator {
        return Err(SubmissionError::CreatorMismatch {
            tx_id: tx_id.clone(),
        });
    }

    let transaction = TransactionPayload {
        proposal_bytes: proposal.proposal_bytes.clone(),
        response_payload: first.payload.clone(),
        result_digest: first.result_digest,
        endorsements: endorsements.iter().map(|e| e.endorsement.clone()).collect(),
    };
    let payload = EnvelopePayload {
        header: proposal.proposal.header.clone(),
        signature_header: proposal.proposal.signature_header.clone(),
        data: to_canonical_bytes(&transaction)?,
    };
    let payload_bytes = to_canonical_bytes(&payload)?;
    let signature = identity.sign(&payload_bytes)?;

    Ok(Envelope {
        header: payload.header,
        payload_bytes,
        signature,
    })
}
