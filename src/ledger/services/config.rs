//! Deployment configuration for the escrow ledger service.

use crate::ledger::domain::{CreationPolicy, FundingMode, PartyId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deployment-mode settings for an escrow ledger.
///
/// # Examples
///
/// ```
/// use escrow_ledger::ledger::{
///     domain::{CreationPolicy, FundingMode, PartyId},
///     services::LedgerConfig,
/// };
///
/// let config = LedgerConfig::funder_created().with_funding_mode(FundingMode::Token);
/// assert_eq!(config.creation, CreationPolicy::Funder);
///
/// let parsed = LedgerConfig::from_json(
///     r#"{"creation":{"type":"manager","manager":"ops"},"funding":"native"}"#,
/// )
/// .expect("valid configuration");
/// assert_eq!(
///     parsed.creation,
///     CreationPolicy::Manager { manager: PartyId::new("ops").expect("valid party") },
/// );
/// assert!(parsed.dispute_resolver.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Who may create tasks.
    pub creation: CreationPolicy,
    /// How escrow is collected at creation and on agreed increases.
    #[serde(default)]
    pub funding: FundingMode,
    /// Identity allowed to open and clear disputes, if any.
    #[serde(default)]
    pub dispute_resolver: Option<PartyId>,
}

/// Error returned when a configuration document cannot be read.
#[derive(Debug, Error)]
#[error("invalid ledger configuration: {0}")]
pub struct LedgerConfigError(#[from] serde_json::Error);

impl LedgerConfig {
    /// Creates a configuration where only `manager` creates tasks.
    #[must_use]
    pub const fn managed_by(manager: PartyId) -> Self {
        Self {
            creation: CreationPolicy::Manager { manager },
            funding: FundingMode::Native,
            dispute_resolver: None,
        }
    }

    /// Creates a configuration where each funder creates its own tasks.
    #[must_use]
    pub const fn funder_created() -> Self {
        Self {
            creation: CreationPolicy::Funder,
            funding: FundingMode::Native,
            dispute_resolver: None,
        }
    }

    /// Sets the funding mode.
    #[must_use]
    pub const fn with_funding_mode(mut self, funding: FundingMode) -> Self {
        self.funding = funding;
        self
    }

    /// Sets the dispute resolver identity.
    #[must_use]
    pub fn with_dispute_resolver(mut self, resolver: PartyId) -> Self {
        self.dispute_resolver = Some(resolver);
        self
    }

    /// Reads a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerConfigError`] when the document is malformed or holds
    /// a blank party identity.
    pub fn from_json(document: &str) -> Result<Self, LedgerConfigError> {
        Ok(serde_json::from_str(document)?)
    }
}
