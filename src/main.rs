use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ethers::signers::LocalWallet;
use ethers::types::U256;
use std::fs;
use std::path::{Path, PathBuf};
use userop_codec::config::{load_network, Network};
use userop_codec::encoding::{self, parse_address};
use userop_codec::{account, entrypoint, UserOperation, UserOperationBuilder};

#[derive(Parser, Debug)]
#[command(name = "userop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the userOpHash of an unsigned UserOperation.
    Hash(HashArgs),

    /// Sign a UserOperation and print it in bundler JSON form.
    Sign(SignArgs),

    /// Sign one or more UserOperations and print `handleOps` call data.
    HandleOps(HandleOpsArgs),

    /// Print the initCode deploying a SimpleAccount for `owner`.
    InitCode(InitCodeArgs),
}

#[derive(Args, Debug)]
struct NetworkArgs {
    /// Network file: `{ "chainId": .., "entryPoint": "0x..", "factory": "0x.." }`.
    #[arg(long, env = "USEROP_NETWORK", default_value = "network.json")]
    network: PathBuf,

    /// Override the EntryPoint address from the network file.
    #[arg(long, env = "USEROP_ENTRYPOINT")]
    entrypoint: Option<String>,
}

#[derive(Args, Debug)]
struct HashArgs {
    #[command(flatten)]
    network: NetworkArgs,

    /// UserOperation JSON (camelCase, hex quantities).
    #[arg(long)]
    op: PathBuf,
}

#[derive(Args, Debug)]
struct SignArgs {
    #[command(flatten)]
    network: NetworkArgs,

    #[arg(long)]
    op: PathBuf,

    /// Smart account owner private key.
    ///
    /// Recommended: set via env var USEROP_OWNER_PRIVATE_KEY.
    #[arg(long, env = "USEROP_OWNER_PRIVATE_KEY", hide_env_values = true)]
    owner_private_key: String,
}

#[derive(Args, Debug)]
struct HandleOpsArgs {
    #[command(flatten)]
    network: NetworkArgs,

    /// UserOperation JSON files, in bundle order.
    #[arg(long = "op", required = true)]
    ops: Vec<PathBuf>,

    /// Receives the gas refunds of the bundle.
    #[arg(long, env = "USEROP_BENEFICIARY")]
    beneficiary: String,

    #[arg(long, env = "USEROP_OWNER_PRIVATE_KEY", hide_env_values = true)]
    owner_private_key: String,
}

#[derive(Args, Debug)]
struct InitCodeArgs {
    #[command(flatten)]
    network: NetworkArgs,

    #[arg(long)]
    owner: String,

    /// CREATE2 salt for the smart account.
    #[arg(long, default_value_t = 0)]
    salt: u64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        // Logs go to stderr; stdout carries only the command's result.
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Hash(args) => cmd_hash(args),
        Command::Sign(args) => cmd_sign(args),
        Command::HandleOps(args) => cmd_handle_ops(args),
        Command::InitCode(args) => cmd_init_code(args),
    }
}

fn cmd_hash(args: HashArgs) -> Result<()> {
    let net = network(&args.network)?;
    let op = load_op(&args.op)?;

    let hash = op.hash(&net.domain());
    println!("{}", encoding::fmt_h256(hash));
    Ok(())
}

fn cmd_sign(args: SignArgs) -> Result<()> {
    let net = network(&args.network)?;
    let wallet = load_wallet(&args.owner_private_key)?;
    let op = load_op(&args.op)?;

    let signed = op
        .sign(&wallet, &net.domain())
        .context("failed to sign userOpHash")?;
    tracing::info!(
        "userOpHash: {}",
        encoding::fmt_h256(signed.hash(&net.domain()))
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&encoding::user_op_to_json(&signed)?)?
    );
    Ok(())
}

fn cmd_handle_ops(args: HandleOpsArgs) -> Result<()> {
    let net = network(&args.network)?;
    let wallet = load_wallet(&args.owner_private_key)?;
    let beneficiary = parse_address(&args.beneficiary).context("invalid beneficiary address")?;
    let domain = net.domain();

    let builders = args
        .ops
        .iter()
        .map(|path| load_builder(path))
        .collect::<Result<Vec<_>>>()?;

    let (signed, calldata) = entrypoint::bundle(builders, &wallet, &domain, beneficiary)
        .context("failed to build handleOps bundle")?;
    for (path, op) in args.ops.iter().zip(&signed) {
        tracing::info!(
            op = %path.display(),
            user_op_hash = %encoding::fmt_h256(op.hash(&domain)),
            "signed"
        );
    }
    tracing::info!(ops = signed.len(), bytes = calldata.len(), "encoded handleOps");

    println!("{}", encoding::fmt_bytes(&calldata));
    Ok(())
}

fn cmd_init_code(args: InitCodeArgs) -> Result<()> {
    let net = network(&args.network)?;
    let factory = net
        .factory
        .ok_or_else(|| anyhow!("network file has no factory address"))?;
    let owner = parse_address(&args.owner).context("invalid owner address")?;

    let init_code = account::init_code(factory, owner, U256::from(args.salt))?;
    println!("{}", encoding::fmt_bytes(&init_code));
    Ok(())
}

fn network(args: &NetworkArgs) -> Result<Network> {
    let net = load_network(&args.network, args.entrypoint.as_deref())?;
    tracing::info!(
        chain_id = net.chain_id,
        entry_point = %encoding::fmt_address(net.entry_point),
        "loaded network"
    );
    Ok(net)
}

fn load_builder(path: &Path) -> Result<UserOperationBuilder> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read user operation at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse user operation at {}", path.display()))
}

fn load_op(path: &Path) -> Result<UserOperation> {
    load_builder(path)?
        .build()
        .with_context(|| format!("incomplete user operation at {}", path.display()))
}

fn load_wallet(private_key: &str) -> Result<LocalWallet> {
    private_key
        .trim()
        .parse::<LocalWallet>()
        .map_err(|e| anyhow!("invalid owner private key: {e}"))
}
