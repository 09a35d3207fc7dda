use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use arbor_crypto::Padding;

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "arbor: commitment indexer and Merkle proof-path service",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML). Every setting has a default.
    #[arg(short, long, global = true, env = "ARBOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override `storage.data_dir`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the indexer and the query API until Ctrl-C
    Serve(ServeArgs),
    /// Print the current root rebuilt from the ledger
    Root,
    /// Print the inclusion path of one leaf
    Path(PathArgs),
    /// Replay the ledger and check every path against the root
    Verify,
    /// List roots not yet accepted on-chain, oldest first
    Pending,
    /// Print `submit_merkle_root` calldata for a root
    Calldata(CalldataArgs),
    /// Print the empty-subtree constant of every level
    Zeros(ZerosArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Starknet JSON-RPC endpoint
    #[arg(long, env = "ARBOR_RPC_URL")]
    pub rpc_url: Option<String>,
    /// Contract emitting commitment events
    #[arg(long, env = "ARBOR_CONTRACT")]
    pub contract: Option<String>,
    /// Address for the query API
    #[arg(long, env = "ARBOR_BIND")]
    pub bind: Option<SocketAddr>,
    /// First block to scan when the ledger is empty
    #[arg(long)]
    pub start_block: Option<u64>,
    /// Signing relay used to submit roots
    #[arg(long, env = "ARBOR_RELAY_URL")]
    pub relay_url: Option<String>,
    /// Account that signs root submissions itself
    #[arg(long, env = "ARBOR_ACCOUNT_ADDRESS")]
    pub account_address: Option<String>,
    /// Private key of the submitting account
    #[arg(long, env = "ARBOR_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    /// Keep all state in memory
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Args)]
pub struct PathArgs {
    /// Leaf index
    #[arg(required_unless_present = "commitment", conflicts_with = "commitment")]
    pub index: Option<u64>,
    /// Look the leaf up by commitment (decimal or 0x hex)
    #[arg(long)]
    pub commitment: Option<String>,
}

#[derive(Args)]
pub struct CalldataArgs {
    /// Root as decimal or 0x hex
    pub root: String,
}

#[derive(Args)]
pub struct ZerosArgs {
    /// Override `tree.height`
    #[arg(long)]
    pub height: Option<usize>,
    /// Override `tree.padding`
    #[arg(long, value_enum)]
    pub padding: Option<PaddingArg>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PaddingArg {
    Subtree,
    Zero,
}

impl From<PaddingArg> for Padding {
    fn from(arg: PaddingArg) -> Self {
        match arg {
            PaddingArg::Subtree => Padding::Subtree,
            PaddingArg::Zero => Padding::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "arbor",
            "serve",
            "--bind",
            "127.0.0.1:4100",
            "--contract",
            "0x04f2",
            "--start-block",
            "120",
            "--ephemeral",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("127.0.0.1:4100".parse().unwrap()));
            assert_eq!(args.contract.as_deref(), Some("0x04f2"));
            assert_eq!(args.start_block, Some(120));
            assert!(args.ephemeral);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_account_flags() {
        let cli = Cli::try_parse_from([
            "arbor",
            "serve",
            "--account-address",
            "0x4a",
            "--private-key",
            "0x2b",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.account_address.as_deref(), Some("0x4a"));
        assert_eq!(args.private_key.as_deref(), Some("0x2b"));
    }

    #[test]
    fn parse_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["arbor", "serve", "--bind", "not-an-addr"]).is_err());
    }

    #[test]
    fn parse_path_by_index() {
        let cli = Cli::try_parse_from(["arbor", "path", "7"]).unwrap();
        if let Command::Path(args) = cli.command {
            assert_eq!(args.index, Some(7));
            assert!(args.commitment.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_path_by_commitment() {
        let cli = Cli::try_parse_from(["arbor", "path", "--commitment", "0x2a"]).unwrap();
        if let Command::Path(args) = cli.command {
            assert_eq!(args.commitment.as_deref(), Some("0x2a"));
            assert!(args.index.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_path_needs_exactly_one_selector() {
        assert!(Cli::try_parse_from(["arbor", "path"]).is_err());
        assert!(Cli::try_parse_from(["arbor", "path", "1", "--commitment", "5"]).is_err());
    }

    #[test]
    fn parse_zeros_overrides() {
        let cli =
            Cli::try_parse_from(["arbor", "zeros", "--height", "4", "--padding", "zero"]).unwrap();
        if let Command::Zeros(args) = cli.command {
            assert_eq!(args.height, Some(4));
            assert!(matches!(args.padding, Some(PaddingArg::Zero)));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_calldata() {
        let cli = Cli::try_parse_from(["arbor", "calldata", "12345"]).unwrap();
        if let Command::Calldata(args) = cli.command {
            assert_eq!(args.root, "12345");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "arbor",
            "root",
            "--data-dir",
            "/tmp/arbor",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Root));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/arbor")));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
    }

    #[test]
    fn padding_arg_maps_to_padding() {
        assert_eq!(Padding::from(PaddingArg::Subtree), Padding::Subtree);
        assert_eq!(Padding::from(PaddingArg::Zero), Padding::Zero);
    }
}
