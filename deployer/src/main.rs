use std::{
    env, fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use regex::Regex;
use relay_types::{is_dev_network, NetworkAddressBook};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod target;

use target::{deployer_key_env, DeployTarget};

/// Deploy a relay contract with `forge create`, then write/update a deployments JSON.
///
/// Constructor arguments come from the network address book, so a network without a Gelato
/// diamond fails before anything is broadcast.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Contract to deploy.
    #[arg(value_enum)]
    target: DeployTarget,

    /// Network name in the address book (eg, fuji, polygon, polygonDev).
    #[arg(long, env = "NETWORK", default_value = "hardhat")]
    network: String,

    /// RPC URL used by `forge create`.
    #[arg(long, env = "RPC_URL")]
    rpc_url: String,

    /// JSON address book merged over the built-in one.
    #[arg(long)]
    address_book: Option<PathBuf>,

    /// Directory of the Foundry project (where `forge create` should be run).
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Contract identifier passed to forge (defaults per target, eg `contracts/GelatoRelay.sol:GelatoRelay`).
    #[arg(long)]
    contract: Option<String>,

    /// Path to a file containing the deployer private key.
    #[arg(long, env = "PRIV_KEY_PATH", conflicts_with = "private_key")]
    private_key_path: Option<PathBuf>,

    /// Private key (hex string, 0x...). Falls back to RELAY_DEPLOYER_PK, or DEV_RELAY_DEPLOYER_PK on `*Dev` networks.
    #[arg(long, conflicts_with = "private_key_path")]
    private_key: Option<String>,

    /// Path to write deployment info.
    #[arg(long, default_value = "deployments.json")]
    deployments_path: PathBuf,

    /// Skip the abort window before live deployments.
    #[arg(long)]
    yes: bool,

    /// Permit deploying GelatoRelay to a network other than hardhat.
    #[arg(long)]
    allow_remote: bool,

    /// Extra args to pass through to `forge create` (after `--`).
    ///
    /// Example:
    /// `-- --broadcast --verify`
    #[arg(last = true)]
    passthrough: Vec<String>,
}

/// Parsed result of a successful `forge create`.
#[derive(Debug, PartialEq, Eq)]
struct ForgeDeployment {
    address: String,
    tx_hashes: Vec<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let book = match &cli.address_book {
        Some(path) => NetworkAddressBook::builtin().with_overrides(NetworkAddressBook::from_json_path(path)?),
        None => NetworkAddressBook::builtin(),
    };

    cli.target.check_network(&cli.network, cli.allow_remote)?;
    let constructor_args = cli.target.constructor_args(&book, &cli.network)?;
    let private_key = resolve_private_key(&cli)?;

    if let Some(delay) = cli.target.confirmation_delay(&cli.network) {
        if !cli.yes {
            warn!(
                "Deploying {} to {}. Hit ctrl + c to abort",
                cli.target.contract_name(),
                cli.network
            );
            info!(dev_env = is_dev_network(&cli.network), "deployer environment");
            thread::sleep(delay);
        }
    }

    let constructor_args: Vec<String> = constructor_args.iter().map(ToString::to_string).collect();
    let (deployment, raw_output) = run_forge_create(&cli, &private_key, &constructor_args)?;
    write_deployments_json(
        &cli.deployments_path,
        &cli.network,
        &cli.rpc_url,
        cli.target.deployment_key(),
        &deployment,
        &raw_output,
    )?;

    info!(
        contract = cli.target.contract_name(),
        address = %deployment.address,
        network = %cli.network,
        "deployed"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn resolve_private_key(cli: &Cli) -> Result<String> {
    if let Some(ref pk_path) = cli.private_key_path {
        let pk = fs::read_to_string(pk_path)
            .with_context(|| format!("failed reading {}", pk_path.display()))?;
        return Ok(pk.trim().to_string());
    }
    if let Some(ref pk) = cli.private_key {
        return Ok(pk.clone());
    }
    let var = deployer_key_env(&cli.network);
    env::var(var).map_err(|_| {
        anyhow!("missing deployer key: provide --private-key-path or --private-key (or set {var})")
    })
}

fn run_forge_create(
    cli: &Cli,
    private_key: &str,
    constructor_args: &[String],
) -> Result<(ForgeDeployment, String)> {
    let contract = cli
        .contract
        .clone()
        .unwrap_or_else(|| cli.target.default_contract_path());

    let mut cmd = Command::new("forge");
    cmd.current_dir(&cli.project_dir);
    cmd.arg("create").arg(&contract);
    cmd.arg("--rpc-url").arg(&cli.rpc_url);
    cmd.arg("--private-key").arg(private_key);

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    // Passthrough goes before `--constructor-args`, which consumes the rest of the line.
    if !cli.passthrough.is_empty() {
        cmd.args(&cli.passthrough);
    }
    if !constructor_args.is_empty() {
        cmd.arg("--constructor-args").args(constructor_args);
    }

    let output = cmd.output().context("failed to run `forge create`")?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let combined = format!("{stdout}\n{stderr}");

    if !output.status.success() {
        return Err(anyhow!(
            "`forge create {contract}` failed (exit {}):\n{}",
            output.status,
            combined
        ));
    }

    let deployment = parse_forge_output(&combined)?;
    Ok((deployment, combined))
}

fn parse_forge_output(output: &str) -> Result<ForgeDeployment> {
    // forge prints `Deployed to: <address>` once and one `Transaction hash: <hash>` per broadcast.
    let re_address = Regex::new(r"Deployed to: (0x[a-fA-F0-9]{40})")?;
    let re_tx = Regex::new(r"Transaction hash: (0x[a-fA-F0-9]{64})")?;

    let address = re_address
        .captures_iter(output)
        .next()
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
        .ok_or_else(|| anyhow!("could not parse deployed address from `forge create` output"))?;

    let tx_hashes: Vec<String> = re_tx
        .captures_iter(output)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    Ok(ForgeDeployment { address, tx_hashes })
}

/// Upper bound on the forge transcript stored per deployment entry.
const FORGE_OUTPUT_LIMIT: usize = 16_000;

/// Merge `deployment` under `deployments.<contract_key>` of the JSON at `path`.
///
/// Entries for other contracts survive; a root that is not a JSON object is replaced.
fn write_deployments_json(
    path: &Path,
    network: &str,
    rpc_url: &str,
    contract_key: &str,
    deployment: &ForgeDeployment,
    raw_output: &str,
) -> Result<()> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let mut root = match fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text)
            .with_context(|| format!("failed parsing JSON in {}", path.display()))?,
        Ok(_) => json!({}),
        Err(e) if e.kind() == io::ErrorKind::NotFound => json!({}),
        Err(e) => return Err(e).with_context(|| format!("failed reading {}", path.display())),
    };
    if !root.is_object() {
        warn!(path = %path.display(), "deployments file root is not an object, replacing it");
        root = json!({});
    }

    root["network"] = json!(network);
    root["updated_at"] = json!(now);
    if !root["deployments"].is_object() {
        root["deployments"] = json!({});
    }

    let mut entry = json!({
        "address": deployment.address,
        "rpc_url": rpc_url,
        "deployed_at": now,
    });
    if !deployment.tx_hashes.is_empty() {
        entry["tx_hashes"] = json!(deployment.tx_hashes);
    }
    let transcript = truncate_on_char_boundary(raw_output.trim(), FORGE_OUTPUT_LIMIT);
    if !transcript.is_empty() {
        entry["forge_output"] = json!(transcript);
    }

    root["deployments"][contract_key] = entry;
    write_json_atomic(path, &root)
}

fn truncate_on_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Write via a sibling `.tmp` file and rename, so readers never see a half-written file.
fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised =
        serde_json::to_string_pretty(value).context("failed serialising deployments JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
