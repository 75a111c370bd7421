//! Claim link construction

use serde::{Deserialize, Serialize};
use tracing::debug;

use linkdrop_chain::{Argument, ProgrammableTransaction, ProgrammableTransactionBuilder};
use linkdrop_core::{Address, ClaimLink, ObjectRef};
use linkdrop_crypto::SignerKeypair;

use crate::{LinkError, Result};

pub const DEFAULT_LINK_HOST: &str = "https://zksend.com";
pub const DEFAULT_LINK_PATH: &str = "/claim";

/// Where generated links point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOptions {
    pub host: String,
    pub path: String,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_LINK_HOST.to_string(),
            path: DEFAULT_LINK_PATH.to_string(),
        }
    }
}

impl LinkOptions {
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}

/// Builds one claim link.
///
/// Each builder owns a freshly generated credential; the send transaction
/// transfers the bundle to that credential's address. The link must only be
/// finalized once the send transaction has executed successfully.
pub struct ClaimLinkBuilder {
    sender: Address,
    options: LinkOptions,
    credential: SignerKeypair,
    objects: Vec<ObjectRef>,
    mist: u64,
}

impl ClaimLinkBuilder {
    pub fn new(sender: Address, options: LinkOptions) -> Self {
        Self {
            sender,
            options,
            credential: SignerKeypair::generate(),
            objects: Vec::new(),
            mist: 0,
        }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Address the bundle is sent to
    pub fn claim_address(&self) -> Address {
        self.credential.address()
    }

    pub fn tip_amount(&self) -> u64 {
        self.mist
    }

    pub fn add_claimable_object(&mut self, object: ObjectRef) -> &mut Self {
        if !self.objects.iter().any(|o| o.object_id == object.object_id) {
            self.objects.push(object);
        }
        self
    }

    /// Add native currency to the bundle, split from the gas coin at send time
    pub fn add_claimable_mist(&mut self, amount: u64) -> &mut Self {
        self.mist = self.mist.saturating_add(amount);
        self
    }

    /// Unsigned transaction moving the bundle to the claim address.
    ///
    /// The tip is split from the gas coin, so whichever coin pays for the
    /// transaction also funds the tip.
    pub fn create_send_transaction(&self) -> Result<ProgrammableTransaction> {
        if self.objects.is_empty() && self.mist == 0 {
            return Err(LinkError::EmptyBundle);
        }

        let mut ptb = ProgrammableTransactionBuilder::new();
        let mut transfers: Vec<Argument> = self.objects.iter().map(|o| ptb.object(*o)).collect();
        if self.mist > 0 {
            let amount = ptb.pure_u64(self.mist);
            transfers.extend(ptb.split_coins(Argument::GasCoin, vec![amount]));
        }
        let recipient = ptb.pure_address(self.claim_address());
        ptb.transfer_objects(transfers, recipient);

        debug!(
            "Send transaction for {} object(s) + {} MIST to {}",
            self.objects.len(),
            self.mist,
            self.claim_address()
        );
        Ok(ptb.finish())
    }

    fn url(&self) -> String {
        format!(
            "{}{}#{}",
            self.options.host,
            self.options.path,
            self.credential.export_secret()
        )
    }

    /// Turn the credential into a shareable link
    pub fn finalize(self) -> Result<ClaimLink> {
        let asset = self.objects.first().ok_or(LinkError::NoClaimableObject)?;
        Ok(ClaimLink {
            asset_id: asset.object_id,
            tip_amount: self.mist,
            url: self.url(),
        })
    }
}

/// A claim link decoded back into its credential
#[derive(Debug)]
pub struct ParsedLink {
    /// `{host}{path}` part of the link
    pub location: String,
    pub credential: SignerKeypair,
}

impl ParsedLink {
    pub fn parse(url: &str) -> Result<Self> {
        let (location, secret) = url
            .trim()
            .split_once('#')
            .ok_or_else(|| LinkError::MalformedLink("missing '#' fragment".to_string()))?;
        if location.is_empty() {
            return Err(LinkError::MalformedLink("missing host".to_string()));
        }

        Ok(Self {
            location: location.to_string(),
            credential: SignerKeypair::import_secret(secret)?,
        })
    }

    /// Address holding the bundled assets
    pub fn claim_address(&self) -> Address {
        self.credential.address()
    }
}
