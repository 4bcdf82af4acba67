//! Simulated chaincode execution.
//!
//! Chaincode runs against a read-only view of the committed world state and
//! records what it read and what it wants to write. Nothing touches the
//! ledger until the transaction is validated inside a block.

use shared_crypto::sha256;
use shared_types::Hash;
use std::collections::{BTreeMap, HashMap};

/// A committed value and the block that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: u64,
}

/// Committed key/value state of one channel, namespaced by chaincode.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    namespaces: HashMap<String, BTreeMap<String, VersionedValue>>,
}

impl WorldState {
    pub fn get(&self, namespace: &str, key: &str) -> Option<&VersionedValue> {
        self.namespaces.get(namespace).and_then(|ns| ns.get(key))
    }

    /// Whether every recorded read still sees the same version.
    pub fn reads_current(&self, rwset: &ReadWriteSet) -> bool {
        rwset
            .reads
            .iter()
            .all(|(key, version)| self.get(&rwset.namespace, key).map(|v| v.version) == *version)
    }

    /// Apply the writes of a validated transaction committed in `block`.
    pub fn apply(&mut self, rwset: &ReadWriteSet, block: u64) {
        let ns = self.namespaces.entry(rwset.namespace.clone()).or_default();
        for (key, value) in &rwset.writes {
            match value {
                Some(value) => {
                    ns.insert(
                        key.clone(),
                        VersionedValue {
                            value: value.clone(),
                            version: block,
                        },
                    );
                }
                None => {
                    ns.remove(key);
                }
            }
        }
    }
}

/// Keys read (with the version seen) and written by one simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadWriteSet {
    pub namespace: String,
    pub reads: Vec<(String, Option<u64>)>,
    /// `None` deletes the key.
    pub writes: Vec<(String, Option<Vec<u8>>)>,
}

impl ReadWriteSet {
    /// Digest over the read/write set and the response payload. Identical
    /// simulations on different peers produce identical digests.
    pub fn digest(&self, payload: &[u8]) -> Hash {
        let mut buf = Vec::new();
        push_field(&mut buf, self.namespace.as_bytes());
        for (key, version) in &self.reads {
            push_field(&mut buf, key.as_bytes());
            match version {
                Some(v) => push_field(&mut buf, &v.to_be_bytes()),
                None => push_field(&mut buf, &[]),
            }
        }
        buf.push(0xFF);
        for (key, value) in &self.writes {
            push_field(&mut buf, key.as_bytes());
            match value {
                Some(v) => push_field(&mut buf, v),
                None => buf.push(0xFE),
            }
        }
        push_field(&mut buf, payload);
        sha256(&buf)
    }
}

fn push_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(&(field.len() as u32).to_be_bytes());
    buf.extend_from_slice(field);
}

/// Stub handed to chaincode during simulation.
pub struct TxContext<'a> {
    state: &'a WorldState,
    rwset: ReadWriteSet,
}

impl<'a> TxContext<'a> {
    pub fn new(state: &'a WorldState, namespace: &str) -> Self {
        Self {
            state,
            rwset: ReadWriteSet {
                namespace: namespace.to_string(),
                ..ReadWriteSet::default()
            },
        }
    }

    /// Read committed state. Pending writes of this transaction are not
    /// visible.
    pub fn get_state(&mut self, key: &str) -> Option<Vec<u8>> {
        let found = self.state.get(&self.rwset.namespace, key);
        if !self.rwset.reads.iter().any(|(k, _)| k == key) {
            self.rwset
                .reads
                .push((key.to_string(), found.map(|v| v.version)));
        }
        found.map(|v| v.value.clone())
    }

    pub fn put_state(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.write(key, Some(value.into()));
    }

    pub fn del_state(&mut self, key: &str) {
        self.write(key, None);
    }

    fn write(&mut self, key: &str, value: Option<Vec<u8>>) {
        self.rwset.writes.retain(|(k, _)| k != key);
        self.rwset.writes.push((key.to_string(), value));
    }

    pub fn into_rwset(self) -> ReadWriteSet {
        self.rwset
    }
}

/// A chaincode the simulated peers can run.
pub trait Chaincode: Send + Sync {
    /// Called once per instantiate or upgrade.
    fn init(&self, ctx: &mut TxContext<'_>, fcn: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, String>;

    fn invoke(&self, ctx: &mut TxContext<'_>, fcn: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, String>;
}

fn utf8(arg: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(arg).map_err(|_| "argument is not valid UTF-8".to_string())
}

fn int(arg: &[u8]) -> Result<i64, String> {
    utf8(arg)?
        .trim()
        .parse()
        .map_err(|_| "Expecting integer value for asset holding".to_string())
}

/// Two accounts and transfers between them.
///
/// - `init a aval b bval`
/// - `invoke a b x` moves `x` from `a` to `b`
/// - `query a` returns the balance as decimal text
/// - `delete a`
#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleChaincode;

impl Chaincode for ExampleChaincode {
    fn init(&self, ctx: &mut TxContext<'_>, _fcn: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, String> {
        let [a, aval, b, bval] = args else {
            return Err("Incorrect number of arguments. Expecting 4".into());
        };
        let (aval, bval) = (int(aval)?, int(bval)?);
        ctx.put_state(utf8(a)?, aval.to_string());
        ctx.put_state(utf8(b)?, bval.to_string());
        Ok(Vec::new())
    }

    fn invoke(&self, ctx: &mut TxContext<'_>, fcn: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, String> {
        match fcn {
            "invoke" | "move" => {
                let [a, b, x] = args else {
                    return Err("Incorrect number of arguments. Expecting 3".into());
                };
                let (a, b) = (utf8(a)?, utf8(b)?);
                let amount: i64 = utf8(x)?
                    .trim()
                    .parse()
                    .map_err(|_| "Invalid transaction amount, expecting a integer value".to_string())?;
                let aval = ctx
                    .get_state(a)
                    .ok_or_else(|| "Entity not found".to_string())
                    .and_then(|v| int(&v))?;
                let bval = ctx
                    .get_state(b)
                    .ok_or_else(|| "Entity not found".to_string())
                    .and_then(|v| int(&v))?;
                ctx.put_state(a, (aval - amount).to_string());
                ctx.put_state(b, (bval + amount).to_string());
                Ok(Vec::new())
            }
            "query" => {
                let [a] = args else {
                    return Err("Incorrect number of arguments. Expecting name of the person to query".into());
                };
                let a = utf8(a)?;
                ctx.get_state(a)
                    .ok_or_else(|| format!("Nil amount for {a}"))
            }
            "delete" => {
                let [a] = args else {
                    return Err("Incorrect number of arguments. Expecting 1".into());
                };
                ctx.del_state(utf8(a)?);
                Ok(Vec::new())
            }
            other => Err(format!(
                "Invalid invoke function name {other:?}. Expecting \"invoke\" \"delete\" \"query\""
            )),
        }
    }
}

/// Plain key/value store used for any chaincode without a dedicated
/// implementation: `put k v`, `get k`, `del k`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyValueChaincode;

impl Chaincode for KeyValueChaincode {
    fn init(&self, ctx: &mut TxContext<'_>, _fcn: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, String> {
        for pair in args.chunks(2) {
            if let [key, value] = pair {
                ctx.put_state(utf8(key)?, value.clone());
            }
        }
        Ok(Vec::new())
    }

    fn invoke(&self, ctx: &mut TxContext<'_>, fcn: &str, args: &[Vec<u8>]) -> Result<Vec<u8>, String> {
        match (fcn, args) {
            ("put", [key, value]) => {
                ctx.put_state(utf8(key)?, value.clone());
                Ok(Vec::new())
            }
            ("get", [key]) => {
                let key = utf8(key)?;
                ctx.get_state(key).ok_or_else(|| format!("key {key} not found"))
            }
            ("del", [key]) => {
                ctx.del_state(utf8(key)?);
                Ok(Vec::new())
            }
            (other, _) => Err(format!("unsupported function {other} with {} args", args.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    fn seeded() -> WorldState {
        let mut state = WorldState::default();
        let mut ctx = TxContext::new(&state, "example_cc");
        ExampleChaincode
            .init(&mut ctx, "init", &args(&["a", "200", "b", "300"]))
            .unwrap();
        let rwset = ctx.into_rwset();
        state.apply(&rwset, 1);
        state
    }

    #[test]
    fn test_example_cc_transfer() {
        let mut state = seeded();
        let mut ctx = TxContext::new(&state, "example_cc");
        ExampleChaincode
            .invoke(&mut ctx, "invoke", &args(&["a", "b", "100"]))
            .unwrap();
        let rwset = ctx.into_rwset();
        assert_eq!(rwset.reads.len(), 2);
        assert!(state.reads_current(&rwset));
        state.apply(&rwset, 2);

        let mut ctx = TxContext::new(&state, "example_cc");
        let b = ExampleChaincode.invoke(&mut ctx, "query", &args(&["b"])).unwrap();
        assert_eq!(b, b"400");
        assert_eq!(state.get("example_cc", "a").unwrap().value, b"100");
        assert_eq!(state.get("example_cc", "a").unwrap().version, 2);
    }

    #[test]
    fn test_example_cc_argument_errors() {
        let state = seeded();
        let mut ctx = TxContext::new(&state, "example_cc");
        let err = ExampleChaincode
            .invoke(&mut ctx, "invoke", &args(&["a", "b"]))
            .unwrap_err();
        assert!(err.contains("Expecting 3"));

        let err = ExampleChaincode
            .invoke(&mut ctx, "query", &args(&["z"]))
            .unwrap_err();
        assert_eq!(err, "Nil amount for z");

        let err = ExampleChaincode.invoke(&mut ctx, "burn", &[]).unwrap_err();
        assert!(err.contains("Invalid invoke function name"));
    }

    #[test]
    fn test_stale_read_detected() {
        let mut state = seeded();
        let mut first = TxContext::new(&state, "example_cc");
        ExampleChaincode
            .invoke(&mut first, "invoke", &args(&["a", "b", "10"]))
            .unwrap();
        let first = first.into_rwset();

        let mut second = TxContext::new(&state, "example_cc");
        ExampleChaincode
            .invoke(&mut second, "invoke", &args(&["a", "b", "20"]))
            .unwrap();
        let second = second.into_rwset();

        state.apply(&first, 2);
        assert!(!state.reads_current(&second));
    }

    #[test]
    fn test_digest_is_deterministic_and_sensitive() {
        let state = seeded();
        let run = |amount: &str| {
            let mut ctx = TxContext::new(&state, "example_cc");
            ExampleChaincode
                .invoke(&mut ctx, "invoke", &args(&["a", "b", amount]))
                .unwrap();
            ctx.into_rwset().digest(&[])
        };
        assert_eq!(run("100"), run("100"));
        assert_ne!(run("100"), run("101"));
    }

    #[test]
    fn test_key_value_chaincode() {
        let mut state = WorldState::default();
        let mut ctx = TxContext::new(&state, "kv");
        KeyValueChaincode
            .invoke(&mut ctx, "put", &args(&["k", "v"]))
            .unwrap();
        let rwset = ctx.into_rwset();
        state.apply(&rwset, 1);

        let mut ctx = TxContext::new(&state, "kv");
        assert_eq!(KeyValueChaincode.invoke(&mut ctx, "get", &args(&["k"])).unwrap(), b"v");
        assert!(KeyValueChaincode.invoke(&mut ctx, "get", &args(&["x"])).is_err());
    }
}
