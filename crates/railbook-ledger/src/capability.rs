//! # Admin Capability
//!
//! Creating and closing trains is reserved to one principal per
//! deployment. That principal holds an [`AdminCapability`]: a token that
//! is minted exactly once, when the engine is initialized, and that cannot
//! be copied, cloned, serialized, or constructed outside this crate.
//!
//! Privileged operations borrow the capability, so the holder keeps it
//! across calls. The engine keeps the matching secret and checks the
//! presented token against it in constant time; a capability minted by a
//! different deployment is refused.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use railbook_core::DeploymentId;

use crate::error::BookingError;

const SECRET_LEN: usize = 32;

/// The administrator credential for one deployment.
///
/// Deliberately neither `Clone` nor `Copy` nor `Serialize`. Custom `Debug`
/// redacts the secret so the token never leaks into logs.
pub struct AdminCapability {
    deployment: DeploymentId,
    secret: [u8; SECRET_LEN],
}

impl AdminCapability {
    /// The deployment that minted this capability.
    pub fn deployment(&self) -> DeploymentId {
        self.deployment
    }
}

impl std::fmt::Debug for AdminCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCapability")
            .field("deployment", &self.deployment)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// The engine-side half of the capability: verifies presented tokens.
pub(crate) struct CapabilityAuthority {
    deployment: DeploymentId,
    secret: [u8; SECRET_LEN],
}

impl CapabilityAuthority {
    /// Mint the deployment's single capability together with its verifier.
    pub(crate) fn mint() -> (Self, AdminCapability) {
        let deployment = DeploymentId::new();
        let mut secret = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        (
            Self { deployment, secret },
            AdminCapability { deployment, secret },
        )
    }

    pub(crate) fn deployment(&self) -> DeploymentId {
        self.deployment
    }

    /// Check that `capability` was minted by this authority.
    pub(crate) fn verify(
        &self,
        capability: &AdminCapability,
        operation: &'static str,
    ) -> Result<(), BookingError> {
        let same_secret: bool = capability.secret[..].ct_eq(&self.secret[..]).into();
        if capability.deployment != self.deployment || !same_secret {
            tracing::warn!(
                operation,
                presented = %capability.deployment,
                expected = %self.deployment,
                "rejected foreign admin capability"
            );
            return Err(BookingError::Unauthorized {
                operation,
                reason: format!("capability was not minted by {}", self.deployment),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for CapabilityAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityAuthority")
            .field("deployment", &self.deployment)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
