//! Relay contracts the deployer knows how to ship, and the per-network rules around them.

use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use relay_types::{is_dev_network, is_local_network, NetworkAddressBook};

/// Networks where a `GelatoMetaBoxPullFee` deployment pauses for a manual abort.
const META_BOX_GUARDED_NETWORKS: &[&str] = &["mainnet", "goerli", "matic", "mumbai", "kovan"];

pub const RELAY_DEPLOYER_KEY_ENV: &str = "RELAY_DEPLOYER_PK";
pub const DEV_RELAY_DEPLOYER_KEY_ENV: &str = "DEV_RELAY_DEPLOYER_PK";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeployTarget {
    GelatoRelay,
    GelatoMetaBoxPullFee,
    MockGelatoRelayContext,
}

impl DeployTarget {
    /// Contract name as compiled by the build framework.
    pub fn contract_name(self) -> &'static str {
        match self {
            DeployTarget::GelatoRelay => "GelatoRelay",
            DeployTarget::GelatoMetaBoxPullFee => "GelatoMetaBoxPullFee",
            DeployTarget::MockGelatoRelayContext => "MockGelatoRelayContext",
        }
    }

    /// Default `forge create` contract identifier.
    pub fn default_contract_path(self) -> String {
        let name = self.contract_name();
        match self {
            DeployTarget::MockGelatoRelayContext => format!("contracts/__mocks__/{name}.sol:{name}"),
            _ => format!("contracts/{name}.sol:{name}"),
        }
    }

    /// Key under `deployments` in the deployments JSON.
    pub fn deployment_key(self) -> &'static str {
        self.contract_name()
    }

    /// Check the target may be deployed to `network` at all.
    ///
    /// `GelatoRelay` stays on the local network unless `allow_remote` is set; the mock never leaves it.
    pub fn check_network(self, network: &str, allow_remote: bool) -> Result<()> {
        if is_local_network(network) {
            return Ok(());
        }
        match self {
            DeployTarget::MockGelatoRelayContext => Err(anyhow!(
                "{} is only deployed on the local network, not {network}",
                self.contract_name()
            )),
            DeployTarget::GelatoRelay if !allow_remote => Err(anyhow!(
                "{} deploys to {network} need --allow-remote",
                self.contract_name()
            )),
            _ => Ok(()),
        }
    }

    /// Constructor arguments, resolved from the address book.
    pub fn constructor_args(self, book: &NetworkAddressBook, network: &str) -> Result<Vec<Address>> {
        match self {
            DeployTarget::GelatoRelay | DeployTarget::GelatoMetaBoxPullFee => {
                let gelato = book.gelato(network)?;
                if gelato == Address::ZERO {
                    return Err(anyhow!("GELATO not defined on network: {network}"));
                }
                Ok(vec![gelato])
            }
            DeployTarget::MockGelatoRelayContext => Ok(Vec::new()),
        }
    }

    /// Pause before broadcasting so a live deployment can still be aborted.
    pub fn confirmation_delay(self, network: &str) -> Option<Duration> {
        match self {
            DeployTarget::GelatoRelay if !is_local_network(network) => Some(Duration::from_secs(5)),
            DeployTarget::GelatoMetaBoxPullFee if META_BOX_GUARDED_NETWORKS.contains(&network) => {
                Some(Duration::from_secs(10))
            }
            _ => None,
        }
    }
}

/// Environment variable holding the deployer key for `network`.
pub fn deployer_key_env(network: &str) -> &'static str {
    if is_dev_network(network) {
        DEV_RELAY_DEPLOYER_KEY_ENV
    } else {
        RELAY_DEPLOYER_KEY_ENV
    }
}
