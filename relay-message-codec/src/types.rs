use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use relay_types::{ExecWithSigsFeeCollector, IGelato, MessageFeeCollector};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CodecError;

/// Relayed call signed by the executor and checker (`MessageFeeCollector` on-chain).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    service: Address,
    data: Bytes,
    salt: U256,
    deadline: U256,
    fee_token: Address,
}

impl RelayMessage {
    pub fn new(
        service: Address,
        data: impl Into<Bytes>,
        salt: U256,
        deadline: U256,
        fee_token: Address,
    ) -> Self {
        Self {
            service,
            data: data.into(),
            salt,
            deadline,
            fee_token,
        }
    }

    /// Build a message from raw bytes, enforcing 20-byte addresses and 256-bit integers.
    ///
    /// `salt` and `deadline` are big-endian; leading zero bytes are ignored.
    pub fn from_parts(
        service: &[u8],
        data: &[u8],
        salt: &[u8],
        deadline: &[u8],
        fee_token: &[u8],
    ) -> Result<Self, CodecError> {
        Ok(Self {
            service: address_from_slice("service", service)?,
            data: Bytes::copy_from_slice(data),
            salt: uint_from_be_slice("salt", salt)?,
            deadline: uint_from_be_slice("deadline", deadline)?,
            fee_token: address_from_slice("feeToken", fee_token)?,
        })
    }

    pub fn service(&self) -> Address {
        self.service
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn salt(&self) -> U256 {
        self.salt
    }

    pub fn deadline(&self) -> U256 {
        self.deadline
    }

    pub fn fee_token(&self) -> Address {
        self.fee_token
    }

    /// Copy with a different salt; the service and payload stay fixed.
    pub fn with_salt(&self, salt: U256) -> Self {
        Self { salt, ..self.clone() }
    }

    pub fn with_deadline(&self, deadline: U256) -> Self {
        Self {
            deadline,
            ..self.clone()
        }
    }

    pub fn to_abi(&self) -> MessageFeeCollector {
        MessageFeeCollector {
            service: self.service,
            data: self.data.clone(),
            salt: self.salt,
            deadline: self.deadline,
            feeToken: self.fee_token,
        }
    }
}

/// 65-byte ECDSA signature in `r || s || v` layout with v in {27, 28}.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelaySignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl RelaySignature {
    pub const LEN: usize = 65;

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    /// Parse a joined signature. v may be given as 0/1 or 27/28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::LEN {
            return Err(CodecError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let v = match bytes[64] {
            0 | 1 => bytes[64] + 27,
            27 | 28 => bytes[64],
            other => {
                return Err(CodecError::InvalidSignature(format!(
                    "unsupported v value {other}"
                )))
            }
        };
        Ok(Self {
            r: B256::from_slice(&bytes[0..32]),
            s: B256::from_slice(&bytes[32..64]),
            v,
        })
    }

    /// Recovery id (0 or 1) encoded in `v`; accepts v as 0/1 or 27/28.
    pub fn recovery_id(&self) -> Result<u8, CodecError> {
        match self.v {
            27 | 28 => Ok(self.v - 27),
            0 | 1 => Ok(self.v),
            other => Err(CodecError::InvalidSignature(format!(
                "unsupported v value {other}"
            ))),
        }
    }
}

impl Serialize for RelaySignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.to_bytes())))
    }
}

impl<'de> Deserialize<'de> for RelaySignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)?;
        RelaySignature::from_bytes(&raw).map_err(de::Error::custom)
    }
}

/// Argument bundle for `execWithSigsFeeCollector`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionEnvelope {
    /// Tracing id; not covered by either signature.
    pub correlation_id: B256,
    pub msg: RelayMessage,
    pub executor_signer_sig: RelaySignature,
    pub checker_signer_sig: RelaySignature,
}

impl ExecutionEnvelope {
    pub fn to_abi(&self) -> ExecWithSigsFeeCollector {
        ExecWithSigsFeeCollector {
            correlationId: self.correlation_id,
            msg: self.msg.to_abi(),
            executorSignerSig: Bytes::copy_from_slice(&self.executor_signer_sig.to_bytes()),
            checkerSignerSig: Bytes::copy_from_slice(&self.checker_signer_sig.to_bytes()),
        }
    }

    /// ABI-encoded `execWithSigsFeeCollector(envelope)` calldata.
    pub fn exec_calldata(&self) -> Vec<u8> {
        IGelato::execWithSigsFeeCollectorCall {
            _call: self.to_abi(),
        }
        .abi_encode()
    }
}

/// Encode a short string as a right-padded bytes32 (ethers' `formatBytes32String`).
pub fn correlation_id_from_str(value: &str) -> Result<B256, CodecError> {
    let bytes = value.as_bytes();
    // One byte is kept for the null terminator.
    if bytes.len() > 31 {
        return Err(CodecError::CorrelationIdTooLong(bytes.len()));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::from(out))
}

pub fn address_from_slice(field: &'static str, bytes: &[u8]) -> Result<Address, CodecError> {
    if bytes.len() != 20 {
        return Err(CodecError::InvalidAddressFormat {
            field,
            len: bytes.len(),
        });
    }
    Ok(Address::from_slice(bytes))
}

pub fn parse_address(field: &'static str, value: &str) -> Result<Address, CodecError> {
    let raw = hex::decode(value.trim().trim_start_matches("0x"))
        .map_err(|_| CodecError::InvalidHex { field })?;
    address_from_slice(field, &raw)
}

pub fn uint_from_be_slice(field: &'static str, bytes: &[u8]) -> Result<U256, CodecError> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[first..];
    if significant.len() > 32 {
        return Err(CodecError::EncodingOverflow { field });
    }
    Ok(U256::from_be_slice(significant))
}

/// Parse a decimal or `0x`-prefixed hex integer into a uint256 word.
pub fn parse_uint(field: &'static str, value: &str) -> Result<U256, CodecError> {
    let value = value.trim();
    if let Ok(parsed) = U256::from_str(value) {
        return Ok(parsed);
    }
    let well_formed = match value.strip_prefix("0x") {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
    };
    if well_formed {
        Err(CodecError::EncodingOverflow { field })
    } else {
        Err(CodecError::InvalidInteger {
            field,
            value: value.to_string(),
        })
    }
}

pub fn parse_hex_bytes(field: &'static str, value: &str) -> Result<Bytes, CodecError> {
    hex::decode(value.trim().trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|_| CodecError::InvalidHex { field })
}
