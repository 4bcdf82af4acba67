//! Endorsement policy evaluation.
//!
//! Nested `OutOf` rules are evaluated independently: one endorser may count
//! toward several rules.

use shared_types::{EndorsementPolicy, PeerEndpoint};
use std::collections::HashSet;

/// Who endorsed: peer name and organization.
pub type Endorser<'a> = (&'a str, &'a str);

/// Evaluates one policy against the peers a proposal was sent to.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEvaluator<'a> {
    policy: &'a EndorsementPolicy,
    targets: &'a [PeerEndpoint],
}

impl<'a> PolicyEvaluator<'a> {
    pub fn new(policy: &'a EndorsementPolicy, targets: &'a [PeerEndpoint]) -> Self {
        Self { policy, targets }
    }

    /// Whether `endorsers` satisfy the policy.
    pub fn is_satisfied(&self, endorsers: &[Endorser<'_>]) -> bool {
        Self::evaluate(self.policy, self.targets, endorsers)
    }

    /// Whether the policy could still be met if every `pending` peer endorsed.
    pub fn is_reachable(&self, accepted: &[Endorser<'_>], pending: &[Endorser<'_>]) -> bool {
        let mut all = Vec::with_capacity(accepted.len() + pending.len());
        all.extend_from_slice(accepted);
        all.extend_from_slice(pending);
        self.is_satisfied(&all)
    }

    /// Whether the targets alone could ever meet the policy.
    pub fn is_feasible(&self) -> bool {
        let everyone: Vec<Endorser<'_>> = self
            .targets
            .iter()
            .map(|p| (p.name.as_str(), p.org.as_str()))
            .collect();
        self.is_satisfied(&everyone)
    }

    fn evaluate(policy: &EndorsementPolicy, targets: &[PeerEndpoint], endorsers: &[Endorser<'_>]) -> bool {
        match policy {
            EndorsementPolicy::AllTargets => {
                let endorsed: HashSet<&str> = endorsers.iter().map(|(peer, _)| *peer).collect();
                !targets.is_empty() && targets.iter().all(|t| endorsed.contains(t.name.as_str()))
            }
            EndorsementPolicy::AnyPeers { count } => {
                let distinct: HashSet<&str> = endorsers.iter().map(|(peer, _)| *peer).collect();
                *count > 0 && distinct.len() >= *count
            }
            EndorsementPolicy::SignedBy { org } => endorsers.iter().any(|(_, o)| o == org),
            EndorsementPolicy::OutOf { n, rules } => {
                *n > 0
                    && rules
                        .iter()
                        .filter(|rule| Self::evaluate(rule, targets, endorsers))
                        .count()
                        >= *n
            }
        }
    }
}
