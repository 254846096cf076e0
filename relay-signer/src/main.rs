use std::{fs, path::PathBuf};

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{transaction::eip2718::TypedTransaction, TransactionRequest, H160},
};
use relay_message_codec::{
    correlation_id_from_str, sign_execution_envelope, signer_address,
    signing_key_from_hex,
    types::{parse_address, parse_hex_bytes, parse_uint},
    RelayMessage,
};
use relay_types::{IGelato, IGelatoRelay, NetworkAddressBook};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sign a `MessageFeeCollector` with the executor and checker keys and print the
/// `execWithSigsFeeCollector` envelope plus its calldata.
///
/// The domain separator is read from the network's Gelato diamond unless given explicitly.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Network name in the address book (eg, fuji, polygon).
    #[arg(long, env = "NETWORK", default_value = "hardhat")]
    network: String,

    /// RPC URL used to read `DOMAIN_SEPARATOR()`.
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// JSON address book merged over the built-in one.
    #[arg(long)]
    address_book: Option<PathBuf>,

    /// Use this domain separator instead of querying the diamond.
    #[arg(long)]
    domain_separator: Option<String>,

    /// Contract receiving the relayed call (usually GelatoRelay).
    #[arg(long)]
    service: String,

    /// Hex calldata forwarded to `service`.
    #[arg(long, conflicts_with = "target")]
    data: Option<String>,

    /// Build `data` as `callWithSyncFeeV2(target, target_data, false, correlationId)`.
    #[arg(long, requires = "target_data")]
    target: Option<String>,

    /// Hex calldata for `target`.
    #[arg(long)]
    target_data: Option<String>,

    #[arg(long, default_value = "0")]
    salt: String,

    /// Unix timestamp after which the message is rejected.
    #[arg(long)]
    deadline: String,

    #[arg(long)]
    fee_token: String,

    /// Short string encoded as bytes32.
    #[arg(long, default_value = "CORRELATION_ID")]
    correlation_id: String,

    #[arg(long, env = "EXECUTOR_SIGNER_PK", hide_env_values = true)]
    executor_key: String,

    #[arg(long, env = "CHECKER_SIGNER_PK", hide_env_values = true)]
    checker_key: String,

    /// Also write the output JSON here.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let book = load_address_book(&cli)?;
    let gelato = book.gelato(&cli.network)?;

    let domain_separator = match &cli.domain_separator {
        Some(raw) => parse_b256(raw).context("invalid --domain-separator")?,
        None => {
            let rpc_url = cli
                .rpc_url
                .as_deref()
                .ok_or_else(|| anyhow!("missing --rpc-url (or RPC_URL) to read DOMAIN_SEPARATOR()"))?;
            fetch_domain_separator(rpc_url, gelato).await?
        }
    };
    info!(network = %cli.network, %gelato, %domain_separator, "using domain separator");

    let correlation_id = correlation_id_from_str(&cli.correlation_id)?;
    let msg = build_message(&cli, correlation_id)?;

    let executor_key = signing_key_from_hex(&cli.executor_key).context("invalid executor key")?;
    let checker_key = signing_key_from_hex(&cli.checker_key).context("invalid checker key")?;

    let (envelope, digest) =
        sign_execution_envelope(correlation_id, msg, &domain_separator, &executor_key, &checker_key)?;

    let output = json!({
        "network": cli.network,
        "verifyingContract": gelato,
        "domainSeparator": domain_separator,
        "digest": digest,
        "executorSigner": signer_address(&executor_key),
        "checkerSigner": signer_address(&checker_key),
        "envelope": envelope,
        "calldata": Bytes::from(envelope.exec_calldata()),
    });
    let serialised = serde_json::to_string_pretty(&output).context("failed serialising envelope")?;

    if let Some(path) = &cli.out {
        fs::write(path, serialised.as_bytes())
            .with_context(|| format!("failed writing {}", path.display()))?;
        info!(path = %path.display(), "wrote envelope");
    }
    println!("{serialised}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_address_book(cli: &Cli) -> Result<NetworkAddressBook> {
    let book = NetworkAddressBook::builtin();
    match &cli.address_book {
        Some(path) => Ok(book.with_overrides(NetworkAddressBook::from_json_path(path)?)),
        None => Ok(book),
    }
}

fn build_message(cli: &Cli, correlation_id: B256) -> Result<RelayMessage> {
    let service = parse_address("service", &cli.service)?;
    let data = match (&cli.target, &cli.data) {
        (Some(target), _) => {
            let target_data = cli.target_data.as_deref().unwrap_or_default();
            IGelatoRelay::callWithSyncFeeV2Call {
                _target: parse_address("target", target)?,
                _data: parse_hex_bytes("targetData", target_data)?,
                _isRelayContext: false,
                _correlationId: correlation_id,
            }
            .abi_encode()
            .into()
        }
        (None, Some(data)) => parse_hex_bytes("data", data)?,
        (None, None) => return Err(anyhow!("provide --data or --target/--target-data")),
    };

    Ok(RelayMessage::new(
        service,
        data,
        parse_uint("salt", &cli.salt)?,
        parse_uint("deadline", &cli.deadline)?,
        parse_address("feeToken", &cli.fee_token)?,
    ))
}

fn parse_b256(raw: &str) -> Result<B256> {
    let bytes = parse_hex_bytes("domainSeparator", raw)?;
    if bytes.len() != 32 {
        return Err(anyhow!("expected 32 bytes, got {}", bytes.len()));
    }
    Ok(B256::from_slice(&bytes))
}

async fn fetch_domain_separator(rpc_url: &str, gelato: Address) -> Result<B256> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .with_context(|| format!("invalid RPC URL {rpc_url}"))?;
    let tx: TypedTransaction = TransactionRequest::new()
        .to(H160::from_slice(gelato.as_slice()))
        .data(IGelato::DOMAIN_SEPARATORCall {}.abi_encode())
        .into();

    let raw = provider
        .call(&tx, None)
        .await
        .with_context(|| format!("DOMAIN_SEPARATOR() call to {gelato} failed"))?;
    let decoded = IGelato::DOMAIN_SEPARATORCall::abi_decode_returns(&raw, true)
        .context("malformed DOMAIN_SEPARATOR() return data")?;
    Ok(decoded._0)
}
