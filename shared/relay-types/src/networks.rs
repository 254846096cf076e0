//! Per-network address book for the Gelato diamond.
//!
//! The book is an explicit value handed to whoever needs it (deployer, signer). Unknown networks
//! are a typed error rather than a process exit so the caller decides how to report them.

use std::{collections::BTreeMap, fs, path::Path};

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network name used for the in-process development chain.
pub const LOCAL_NETWORK: &str = "hardhat";

/// Suffix marking a development deployment of a live network (eg, `polygonDev`).
pub const DEV_NETWORK_SUFFIX: &str = "Dev";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no addresses for network: {0}")]
    UnknownNetwork(String),
    #[error("duplicate network in address book: {0}")]
    DuplicateNetwork(String),
    #[error("network name must not be empty")]
    EmptyNetworkName,
    #[error("zero address configured for {network}.{field}")]
    ZeroAddress { network: String, field: &'static str },
    #[error("failed reading address book {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing address book: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Contract addresses known for a single network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAddresses {
    /// Gelato diamond (verifying contract for `execWithSigsFeeCollector`).
    pub gelato: Address,
}

impl NetworkAddresses {
    pub const fn new(gelato: Address) -> Self {
        Self { gelato }
    }
}

const BUILTIN: &[(&str, Address)] = &[
    ("hardhat", address!("F82D64357D9120a760e1E4C75f646C0618eFc2F3")),
    ("alfajores", address!("Cf8EDB3333Fae73b23f689229F4De6Ac95d1f707")),
    ("arbitrum", address!("4775aF8FEf4809fE10bf05867d2b038a4b5B2146")),
    ("avalanche", address!("7C5c4Af1618220C090A6863175de47afb20fa9Df")),
    ("bnb", address!("7C5c4Af1618220C090A6863175de47afb20fa9Df")),
    ("celo", address!("8b3387eFf12D425839a7e33351e64F9fD9527262")),
    ("cronos", address!("91f2A140cA47DdF438B9c583b7E71987525019bB")),
    ("evmos", address!("91f2A140cA47DdF438B9c583b7E71987525019bB")),
    ("ethereum", address!("3CACa7b48D0573D793d3b0279b5F0029180E83b6")),
    ("fantom", address!("ebA27A2301975FF5BF7864b99F55A4f7A457ED10")),
    ("gnosis", address!("29b6603D17B9D8f021EcB8845B6FD06E1Adf89DE")),
    ("fuji", address!("F82D64357D9120a760e1E4C75f646C0618eFc2F3")),
    ("goerli", address!("683913B3A32ada4F8100458A3E1675425BdAa7DF")),
    ("arbitrumGoerli", address!("F82D64357D9120a760e1E4C75f646C0618eFc2F3")),
    ("polygon", address!("7598e84B2E114AB62CAB288CE5f7d5f6bad35BbA")),
    ("mumbai", address!("25aD59adbe00C2d80c86d01e2E05e1294DA84823")),
    ("moonriver", address!("91f2A140cA47DdF438B9c583b7E71987525019bB")),
    ("moonbeam", address!("91f2A140cA47DdF438B9c583b7E71987525019bB")),
    ("optimisticGoerli", address!("F82D64357D9120a760e1E4C75f646C0618eFc2F3")),
    ("optimism", address!("01051113D81D7d6DA508462F2ad6d7fD96cF42Ef")),
];

/// Validated mapping of network name to [`NetworkAddresses`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkAddressBook {
    networks: BTreeMap<String, NetworkAddresses>,
}

impl NetworkAddressBook {
    /// Build a book from explicit entries, rejecting empty names, duplicates and zero addresses.
    pub fn new<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, NetworkAddresses)>,
        S: Into<String>,
    {
        let mut networks = BTreeMap::new();
        for (name, addresses) in entries {
            let name = name.into();
            validate_entry(&name, &addresses)?;
            if networks.insert(name.clone(), addresses).is_some() {
                return Err(ConfigError::DuplicateNetwork(name));
            }
        }
        Ok(Self { networks })
    }

    /// Addresses of the deployed Gelato diamonds.
    pub fn builtin() -> Self {
        let networks = BUILTIN
            .iter()
            .map(|(name, gelato)| ((*name).to_string(), NetworkAddresses::new(*gelato)))
            .collect();
        Self { networks }
    }

    /// Parse a JSON object of the form `{"<network>": {"gelato": "0x..."}}`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, NetworkAddresses> = serde_json::from_str(json)?;
        Self::new(raw)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Entries of `overrides` replace or extend entries of `self`.
    pub fn with_overrides(mut self, overrides: NetworkAddressBook) -> Self {
        self.networks.extend(overrides.networks);
        self
    }

    pub fn get(&self, network: &str) -> Result<&NetworkAddresses, ConfigError> {
        self.networks
            .get(network)
            .ok_or_else(|| ConfigError::UnknownNetwork(network.to_string()))
    }

    /// Gelato diamond address for `network`.
    pub fn gelato(&self, network: &str) -> Result<Address, ConfigError> {
        self.get(network).map(|a| a.gelato)
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

fn validate_entry(name: &str, addresses: &NetworkAddresses) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyNetworkName);
    }
    if addresses.gelato == Address::ZERO {
        return Err(ConfigError::ZeroAddress {
            network: name.to_string(),
            field: "gelato",
        });
    }
    Ok(())
}

/// `true` for development deployments such as `polygonDev`.
pub fn is_dev_network(network: &str) -> bool {
    network.ends_with(DEV_NETWORK_SUFFIX)
}

pub fn is_local_network(network: &str) -> bool {
    network == LOCAL_NETWORK
}
