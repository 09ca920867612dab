//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout Railbook.
//! Each identifier is a distinct type: you cannot pass a [`TicketId`]
//! where a [`TrainId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`AccountId`], [`StationName`]) validate
//! format at construction time and on deserialization. UUID-based
//! identifiers ([`TrainId`], [`TicketId`], [`DeploymentId`]) are always
//! valid by construction, and freshly minted ones are random v4 UUIDs, so
//! an identifier retired by closing a train is never handed out again.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for one scheduled train run.
///
/// The train's id doubles as its owner reference: a ticket records the id
/// of the train it was sold on and membership is checked by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrainId(Uuid);

impl TrainId {
    /// Create a new random train identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a train identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TrainId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "train:{}", self.0)
    }
}

/// A unique identifier for an issued ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Create a new random ticket identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ticket identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ticket:{}", self.0)
    }
}

/// Identifies one ledger deployment. Capabilities are bound to the
/// deployment that minted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(Uuid);

impl DeploymentId {
    /// Create a new random deployment identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deployment:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// The identity of a buyer or ticket holder, as authenticated by the
/// substrate (wallet address, account handle, ...).
///
/// # Validation
///
/// - 1 to 128 characters
/// - No whitespace and no control characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    const MAX_LEN: usize = 128;

    /// Create an account identifier, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAccountId`] if the value is empty,
    /// longer than 128 characters, or contains whitespace or control
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let len = s.chars().count();
        if len == 0
            || len > Self::MAX_LEN
            || s.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValidationError::InvalidAccountId(s));
        }
        Ok(Self(s))
    }

    /// Access the account string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name of a route endpoint (origin or destination station).
///
/// Names are compared exactly: `"Paris"` and `"paris"` are different
/// stations.
///
/// # Validation
///
/// - 1 to 64 characters
/// - No leading or trailing whitespace, no control characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationName(String);

impl StationName {
    const MAX_LEN: usize = 64;

    /// Create a station name, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidStationName`] if the value is
    /// empty, too long, padded, or contains control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let len = s.chars().count();
        if len == 0
            || len > Self::MAX_LEN
            || s.trim() != s
            || s.chars().any(char::is_control)
        {
            return Err(ValidationError::InvalidStationName(s));
        }
        Ok(Self(s))
    }

    /// Access the station name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StationName> for String {
    fn from(name: StationName) -> Self {
        name.0
    }
}

impl std::fmt::Display for StationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
