//! Shared types for the Gelato relay fee-collector flow.
//!
//! Used by the message codec, the signer CLI and the deployer so that the ABI surface and the
//! per-network address book live in exactly one place.

pub mod abi;
pub mod networks;

pub use abi::{ExecWithSigsFeeCollector, IGelato, IGelatoRelay, MessageFeeCollector};
pub use networks::{is_dev_network, is_local_network, ConfigError, NetworkAddressBook, NetworkAddresses};
