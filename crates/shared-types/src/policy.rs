//! Endorsement policy expressions.
//!
//! Only the data lives here; evaluation against a set of endorsers is done by
//! the endorsement collector.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which combination of peers/organizations must endorse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndorsementPolicy {
    /// Every peer the proposal was sent to must endorse.
    AllTargets,
    /// Any `count` distinct peers.
    AnyPeers { count: usize },
    /// At least one peer of the named organization.
    SignedBy { org: String },
    /// At least `n` of the nested rules.
    OutOf {
        n: usize,
        rules: Vec<EndorsementPolicy>,
    },
}

impl Default for EndorsementPolicy {
    fn default() -> Self {
        Self::AnyPeers { count: 1 }
    }
}

impl EndorsementPolicy {
    pub fn any_peers(count: usize) -> Self {
        Self::AnyPeers { count }
    }

    pub fn signed_by(org: impl Into<String>) -> Self {
        Self::SignedBy { org: org.into() }
    }

    /// "Any `n` of these organizations".
    pub fn any_of_orgs<I, S>(n: usize, orgs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OutOf {
            n,
            rules: orgs.into_iter().map(Self::signed_by).collect(),
        }
    }

    /// "All of these organizations".
    pub fn all_of_orgs<I, S>(orgs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rules: Vec<_> = orgs.into_iter().map(Self::signed_by).collect();
        Self::OutOf {
            n: rules.len(),
            rules,
        }
    }
}

impl fmt::Display for EndorsementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllTargets => f.write_str("ALL_TARGETS"),
            Self::AnyPeers { count } => write!(f, "ANY_PEERS({count})"),
            Self::SignedBy { org } => write!(f, "'{org}.member'"),
            Self::OutOf { n, rules } => {
                write!(f, "OutOf({n}")?;
                for rule in rules {
                    write!(f, ", {rule}")?;
                }
                f.write_str(")")
            }
        }
    }
}
