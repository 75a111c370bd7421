use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{LinkdropError, Result};

/// Struct tag of the native coin object
pub const SUI_COIN_TYPE: &str = "0x2::coin::Coin<0x2::sui::SUI>";

/// Type tag of the native currency
pub const SUI_TYPE: &str = "0x2::sui::SUI";

/// 1 SUI = 10^9 MIST
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Parse a `0x`-prefixed hex string into 32 bytes, left-padding short forms
/// such as `0x2`.
fn parse_hex_32(s: &str) -> Option<[u8; 32]> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() || digits.len() > 64 {
        return None;
    }
    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(padded).ok()?;
    bytes.try_into().ok()
}

// =========================================================================
// Identifiers
// =========================================================================

/// 32-byte on-chain object identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub [u8; 32]);

impl ObjectId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self)
    }
}

impl FromStr for ObjectId {
    type Err = LinkdropError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_32(s)
            .map(Self)
            .ok_or_else(|| LinkdropError::InvalidObjectId(s.to_string()))
    }
}

/// 32-byte account address (BLAKE2b-256 of flag || public key)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LinkdropError;

    fn from_str(s: &str) -> Result<Self> {
        parse_hex_32(s)
            .map(Self)
            .ok_or_else(|| LinkdropError::InvalidAddress(s.to_string()))
    }
}

/// 32-byte object content digest, rendered in base58
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectDigest(pub [u8; 32]);

impl ObjectDigest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectDigest({})", self)
    }
}

impl FromStr for ObjectDigest {
    type Err = LinkdropError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| LinkdropError::InvalidDigest(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LinkdropError::InvalidDigest(s.to_string()))?;
        Ok(Self(bytes))
    }
}

// Identifiers travel as strings in JSON (RPC payloads and reports).

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for ObjectDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific version of an owned object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
}

impl ObjectRef {
    pub fn new(object_id: ObjectId, version: u64, digest: ObjectDigest) -> Self {
        Self { object_id, version, digest }
    }
}

// =========================================================================
// Distribution data model
// =========================================================================

/// An owned asset eligible for bundling into a claim link.
///
/// `object` is `None` when the owner listing returned an entry without
/// object data; such entries still occupy a position (and a funding coin)
/// but can never be claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAsset {
    /// Position in discovery order
    pub index: usize,
    pub object: Option<ObjectRef>,
    pub object_type: Option<String>,
}

impl TargetAsset {
    pub fn id(&self) -> Option<ObjectId> {
        self.object.map(|o| o.object_id)
    }
}

/// A native coin freshly split off the signer's balance to pay for exactly
/// one claim transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingCoin {
    pub object: ObjectRef,
    /// gas budget + tip, in MIST
    pub value: u64,
}

impl FundingCoin {
    pub fn id(&self) -> ObjectId {
        self.object.object_id
    }
}

/// Shareable link that lets its holder redeem one asset plus the tip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLink {
    pub asset_id: ObjectId,
    pub tip_amount: u64,
    pub url: String,
}

impl fmt::Display for ClaimLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Why an asset produced no link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The listing entry carried no object data
    MissingObjectData,
    /// The claim transaction executed with a non-success status
    ExecutionFailed(String),
    /// Building, signing or submitting the transaction errored
    Submission(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingObjectData => write!(f, "missing object data"),
            FailureReason::ExecutionFailed(e) => write!(f, "execution failed: {}", e),
            FailureReason::Submission(e) => write!(f, "submission error: {}", e),
        }
    }
}

/// A claim that produced no link, with the funding coin it was paired with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimFailure {
    pub index: usize,
    pub asset_id: Option<ObjectId>,
    pub funding_coin: ObjectId,
    pub reason: FailureReason,
}

/// Terminal state of one (asset, coin) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(ClaimLink),
    Failed(ClaimFailure),
}

impl ClaimOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed(_))
    }
}
