//! Operation payloads.
//!
//! Peer and orderer fields hold registry names. An empty list means "use the
//! channel's defaults".

use shared_types::{ChaincodeSpec, EndorsementPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateChannelRequest {
    pub channel: String,
    /// Channel profile name (e.g. `TwoOrgsChannel`).
    pub profile: String,
    pub organizations: Vec<String>,
    /// Configuration transaction produced by external tooling.
    pub config_tx: Vec<u8>,
    /// Orderers to broadcast to; all known orderers when empty.
    pub orderers: Vec<String>,
    /// Endorsement policy recorded for the new channel.
    pub policy: Option<EndorsementPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinChannelRequest {
    pub channel: String,
    /// Peers to join. Required.
    pub peers: Vec<String>,
    pub orderers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstallRequest {
    pub chaincode: ChaincodeSpec,
    /// Packaged chaincode source.
    pub package: Vec<u8>,
    pub targets: Vec<String>,
    /// Channel whose peers are targeted when `targets` is empty. Install
    /// itself is not channel scoped.
    pub channel: Option<String>,
    /// Defaults to every target.
    pub policy: Option<EndorsementPolicy>,
}

/// Instantiate or upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeployRequest {
    pub channel: String,
    pub chaincode: ChaincodeSpec,
    /// Init function, `init` when empty.
    pub fcn: String,
    pub args: Vec<Vec<u8>>,
    pub targets: Vec<String>,
    pub orderers: Vec<String>,
    /// Defaults to the channel policy.
    pub policy: Option<EndorsementPolicy>,
}

impl DeployRequest {
    pub fn new(channel: impl Into<String>, chaincode: ChaincodeSpec) -> Self {
        Self {
            channel: channel.into(),
            chaincode,
            ..Self::default()
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvokeRequest {
    pub channel: String,
    pub chaincode: String,
    pub fcn: String,
    pub args: Vec<Vec<u8>>,
    pub targets: Vec<String>,
    pub orderers: Vec<String>,
    pub policy: Option<EndorsementPolicy>,
}

impl InvokeRequest {
    pub fn new(channel: impl Into<String>, chaincode: impl Into<String>, fcn: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chaincode: chaincode.into(),
            fcn: fcn.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRequest {
    pub channel: String,
    pub chaincode: String,
    pub fcn: String,
    pub args: Vec<Vec<u8>>,
    pub targets: Vec<String>,
}

impl QueryRequest {
    pub fn new(channel: impl Into<String>, chaincode: impl Into<String>, fcn: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chaincode: chaincode.into(),
            fcn: fcn.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }
}
