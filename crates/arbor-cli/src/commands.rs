use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use arbor_chain::{
    AccountSettings, AccountSubmitter, EventSource, RelaySubmitter, RootSubmitter,
    StarknetEventSource, SubmitCall, SUBMIT_ENTRYPOINT,
};
use arbor_crypto::{EmptyHashes, MerklePath, PoseidonHasher, Side};
use arbor_indexer::{
    replay, Indexer, IndexerConfig, IngestLoop, LoopTiming, ProofService, SnapshotCell,
};
use arbor_server::{AppState, ArborServer};
use arbor_store::Storage;
use arbor_tree::{MerkleTree, TreeBuilder};
use arbor_types::{FieldElement, LeafIndex};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        data_dir,
        format,
        ..
    } = cli;

    let mut settings = match &config {
        Some(path) => IndexerConfig::load(path)?,
        None => IndexerConfig::default(),
    };
    if let Some(dir) = data_dir {
        settings.storage.data_dir = dir;
    }
    if let Command::Serve(args) = &command {
        apply_serve_overrides(&mut settings, args);
    }
    settings.validate()?;

    match command {
        Command::Serve(args) => cmd_serve(settings, args.ephemeral),
        Command::Root => cmd_root(&settings, &format),
        Command::Path(args) => cmd_path(&settings, args, &format),
        Command::Verify => cmd_verify(&settings, &format),
        Command::Pending => cmd_pending(&settings, &format),
        Command::Calldata(args) => cmd_calldata(&settings, args, &format),
        Command::Zeros(args) => cmd_zeros(&settings, args, &format),
        Command::Config => cmd_config(&settings),
    }
}

fn apply_serve_overrides(config: &mut IndexerConfig, args: &ServeArgs) {
    if let Some(url) = &args.rpc_url {
        config.chain.rpc_url = url.clone();
    }
    if let Some(contract) = &args.contract {
        config.chain.contract = contract.clone();
    }
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    if let Some(block) = args.start_block {
        config.chain.start_block = block;
    }
    if let Some(relay) = &args.relay_url {
        config.publisher.relay_url = Some(relay.clone());
    }
    if let Some(address) = &args.account_address {
        config.publisher.account_address = Some(address.clone());
    }
    if let Some(key) = &args.private_key {
        config.publisher.private_key = Some(key.clone());
    }
}

fn cmd_serve(config: IndexerConfig, ephemeral: bool) -> anyhow::Result<()> {
    if config.chain.contract.is_empty() {
        bail!("chain.contract is not set; pass --contract or set it in the config file");
    }
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config, ephemeral))
}

async fn serve(config: IndexerConfig, ephemeral: bool) -> anyhow::Result<()> {
    let storage = if ephemeral {
        warn!("ephemeral storage: ledger and roots are lost on exit");
        Storage::in_memory()
    } else {
        Storage::open(&config.storage)
            .with_context(|| format!("opening {}", config.storage.data_dir.display()))?
    };

    let source: Arc<dyn EventSource> = Arc::new(StarknetEventSource::new(&config.chain)?);
    let submitter = build_submitter(&config)?;
    let indexer = Indexer::bootstrap(
        config.tree,
        config.chain.start_block,
        storage.clone(),
        source,
        submitter,
    )?;
    let proofs = indexer.proof_service();

    let (stop_tx, stop_rx) = watch::channel(false);
    let timing = LoopTiming::from(&config.chain);
    let (ingest, handle) = IngestLoop::new(indexer, timing, stop_rx.clone());
    let mut state = AppState::new(proofs, Arc::clone(&storage.roots), handle);
    if let Some(contract) = config.publisher_contract() {
        state = state.with_contract(contract);
    }
    let server = ArborServer::new(config.server.clone(), state);

    let ingest_task = tokio::spawn(ingest.run());
    let mut server_stop = stop_rx;
    let mut server_task = tokio::spawn(server.serve(async move {
        let _ = server_stop.wait_for(|stop| *stop).await;
    }));

    let server_done = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            false
        }
        served = &mut server_task => {
            let _ = stop_tx.send(true);
            served??;
            true
        }
    };

    let _ = stop_tx.send(true);
    if !server_done {
        server_task.await??;
    }
    ingest_task.await??;
    info!("arbor stopped");
    Ok(())
}

fn build_submitter(config: &IndexerConfig) -> anyhow::Result<Option<Arc<dyn RootSubmitter>>> {
    if !config.publisher.is_enabled() {
        info!("no relay or account configured; roots are recorded but not submitted");
        return Ok(None);
    }
    let contract = config
        .publisher_contract()
        .context("publisher contract is not configured")?;

    if let Some(creds) = config.publisher.account() {
        let submitter = AccountSubmitter::new(&AccountSettings {
            rpc_url: &config.chain.rpc_url,
            contract,
            account_address: creds.account_address,
            private_key: creds.private_key,
            chain_id: config.publisher.chain_id(),
        })?;
        info!(
            account = creds.account_address,
            contract,
            chain_id = config.publisher.chain_id(),
            "publishing roots from account"
        );
        return Ok(Some(Arc::new(submitter) as Arc<dyn RootSubmitter>));
    }

    let Some(relay_url) = config.publisher.relay_url.as_deref() else {
        return Ok(None);
    };
    let token = config.publisher.auth_token.as_deref();
    let submitter = RelaySubmitter::new(relay_url, contract, token)?;
    info!(relay_url, contract, "publishing roots through relay");
    Ok(Some(Arc::new(submitter) as Arc<dyn RootSubmitter>))
}

/// Tree rebuilt from the on-disk ledger, for commands that run without the
/// ingestion loop. Nothing is appended to either table.
struct OfflineView {
    storage: Storage,
    builder: TreeBuilder,
    tree: MerkleTree,
}

impl OfflineView {
    fn open(config: &IndexerConfig) -> anyhow::Result<Self> {
        let storage = Storage::open(&config.storage)
            .with_context(|| format!("opening {}", config.storage.data_dir.display()))?;
        Self::from_storage(config, storage)
    }

    fn from_storage(config: &IndexerConfig, storage: Storage) -> anyhow::Result<Self> {
        let mut builder = TreeBuilder::poseidon(config.tree)?;
        let tree = replay(&mut builder, storage.ledger.as_ref())?;
        Ok(Self {
            storage,
            builder,
            tree,
        })
    }

    fn proofs(&self) -> anyhow::Result<ProofService> {
        let block = self.storage.ledger.last_block()?;
        let snapshots = Arc::new(SnapshotCell::new(self.tree.clone(), block));
        Ok(ProofService::new(snapshots, Arc::clone(&self.storage.ledger)))
    }
}

fn cmd_root(config: &IndexerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let view = OfflineView::open(config)?;
    let last_block = view.storage.ledger.last_block()?;
    let populated = (!view.tree.is_empty()).then(|| view.tree.root());

    match format {
        OutputFormat::Json => {
            let out = json!({
                "root": populated,
                "leaves": view.tree.len(),
                "lastBlock": last_block,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => match populated {
            Some(root) => {
                println!("Root:       {}", root.to_string().cyan());
                println!("Leaves:     {}", view.tree.len().to_string().bold());
                if let Some(block) = last_block {
                    println!("Last block: {block}");
                }
            }
            None => {
                println!("{}", "Tree is empty.".yellow());
                println!("Empty root: {}", view.tree.root().to_string().dimmed());
            }
        },
    }
    Ok(())
}

fn cmd_path(config: &IndexerConfig, args: PathArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let view = OfflineView::open(config)?;
    let proofs = view.proofs()?;
    let path = match (args.index, args.commitment) {
        (_, Some(raw)) => {
            let commitment: FieldElement =
                raw.parse().with_context(|| format!("invalid commitment {raw:?}"))?;
            proofs.path_for_commitment(&commitment)?
        }
        (Some(index), None) => proofs.path_for_index(index)?,
        (None, None) => bail!("pass a leaf index or --commitment"),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&path)?),
        OutputFormat::Text => print_path(&path),
    }
    Ok(())
}

fn print_path(path: &MerklePath) {
    println!("Leaf {} {}", path.leaf_index.to_string().bold(), path.commitment.to_string().cyan());
    for (level, sibling) in path.siblings.iter().enumerate() {
        let side = match Side::of_sibling(path.leaf_index, level) {
            Side::Left => "left ",
            Side::Right => "right",
        };
        println!("  {level:>2} {} {sibling}", side.dimmed());
    }
    println!("Root {}", path.root.to_string().green());
}

/// Outcome of re-deriving the root from every leaf's path.
#[derive(Debug, Default, PartialEq, Eq)]
struct VerifyReport {
    checked: u64,
    failed: Vec<LeafIndex>,
    /// Newest recorded root, when it differs from the replayed one.
    stale_record: Option<FieldElement>,
}

fn verify_view(view: &mut OfflineView) -> anyhow::Result<VerifyReport> {
    let height = view.tree.height();
    let root = view.tree.root();
    let mut report = VerifyReport::default();

    for index in 0..view.tree.len() {
        let path = view.tree.path(index)?;
        let valid = path.root == root && path.verify(height, view.builder.hasher_mut())?;
        if !valid {
            report.failed.push(index);
        }
        report.checked += 1;
    }

    if let Some(record) = view.storage.roots.latest()? {
        if !view.tree.is_empty() && record.root != root {
            report.stale_record = Some(record.root);
        }
    }
    Ok(report)
}

fn cmd_verify(config: &IndexerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let mut view = OfflineView::open(config)?;
    let report = verify_view(&mut view)?;

    match format {
        OutputFormat::Json => {
            let out = json!({
                "root": (!view.tree.is_empty()).then(|| view.tree.root()),
                "checked": report.checked,
                "failed": report.failed,
                "staleRecord": report.stale_record,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for index in &report.failed {
                println!("  {} leaf {index}: path does not reproduce the root", "✗".red());
            }
            if let Some(recorded) = &report.stale_record {
                println!(
                    "  {} newest recorded root {} differs from the replayed root; \
                     the next serve run records it",
                    "!".yellow(),
                    recorded
                );
            }
            if report.failed.is_empty() {
                println!("{} {} paths verified", "✓".green().bold(), report.checked);
            }
        }
    }

    if !report.failed.is_empty() {
        bail!("{} of {} paths failed verification", report.failed.len(), report.checked);
    }
    Ok(())
}

fn cmd_pending(config: &IndexerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let storage = Storage::open(&config.storage)?;
    let pending = storage.roots.list_unsubmitted()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pending)?),
        OutputFormat::Text => {
            if pending.is_empty() {
                println!("{} No roots awaiting submission.", "✓".green());
            }
            for record in &pending {
                println!(
                    "{} block {} recorded {}",
                    record.root.to_string().cyan(),
                    record.observed_at_block,
                    record.recorded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
                );
            }
        }
    }
    Ok(())
}

fn cmd_calldata(
    config: &IndexerConfig,
    args: CalldataArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let root: FieldElement = args
        .root
        .parse()
        .with_context(|| format!("invalid root {:?}", args.root))?;
    let calldata = root.to_u256_halves().calldata();
    let contract = config.publisher_contract();

    match format {
        OutputFormat::Json => {
            let out = match contract {
                Some(contract) => serde_json::to_value(SubmitCall::for_root(contract, &root))?,
                None => json!({ "entrypoint": SUBMIT_ENTRYPOINT, "calldata": calldata }),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("Root: {}", root.to_string().cyan());
            match contract {
                Some(contract) => {
                    println!("{}", SubmitCall::for_root(contract, &root).starkli_command().bold())
                }
                None => println!("{} {} {}", SUBMIT_ENTRYPOINT.bold(), calldata[0], calldata[1]),
            }
        }
    }
    Ok(())
}

fn cmd_zeros(config: &IndexerConfig, args: ZerosArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let height = args.height.unwrap_or(config.tree.height);
    let padding = args.padding.map(Into::into).unwrap_or(config.tree.padding);
    let mut hasher = PoseidonHasher::new()?;
    let table = EmptyHashes::compute(height, padding, &mut hasher)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(table.as_slice())?),
        OutputFormat::Text => {
            for (level, value) in table.as_slice().iter().enumerate() {
                let marker = if level == height { " (empty root)" } else { "" };
                println!("{level:>2} {value}{}", marker.dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_config(config: &IndexerConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_store::StorageConfig;
    use arbor_tree::TreeConfig;
    use arbor_types::CommitmentLeaf;

    fn config_in(dir: &std::path::Path) -> IndexerConfig {
        IndexerConfig {
            tree: TreeConfig::with_height(4),
            storage: StorageConfig {
                data_dir: dir.to_path_buf(),
                ..StorageConfig::default()
            },
            ..IndexerConfig::default()
        }
    }

    fn seed(storage: &Storage, count: u64) {
        for i in 0..count {
            storage
                .ledger_writer
                .insert(&CommitmentLeaf::new(i, FieldElement::from_u64(100 + i), 10 + i))
                .unwrap();
        }
    }

    #[test]
    fn serve_overrides_replace_file_values() {
        let mut config = IndexerConfig::default();
        let args = ServeArgs {
            rpc_url: Some("http://node:5050/rpc".into()),
            contract: Some("0x04f2".into()),
            bind: Some("127.0.0.1:4100".parse().unwrap()),
            start_block: Some(77),
            relay_url: Some("http://relay/invoke".into()),
            account_address: None,
            private_key: None,
            ephemeral: false,
        };
        apply_serve_overrides(&mut config, &args);
        assert_eq!(config.chain.rpc_url, "http://node:5050/rpc");
        assert_eq!(config.chain.contract, "0x04f2");
        assert_eq!(config.server.bind_addr.port(), 4100);
        assert_eq!(config.chain.start_block, 77);
        assert_eq!(config.publisher_contract(), Some("0x04f2"));
        config.validate().unwrap();
    }

    #[test]
    fn no_relay_means_no_submitter() {
        assert!(build_submitter(&IndexerConfig::default()).unwrap().is_none());
    }

    #[test]
    fn relay_builds_submitter() {
        let mut config = IndexerConfig::default();
        config.chain.contract = "0x04f2".into();
        config.publisher.relay_url = Some("http://127.0.0.1:8090/invoke".into());
        assert!(build_submitter(&config).unwrap().is_some());
    }

    #[test]
    fn account_credentials_build_signing_submitter() {
        let mut config = IndexerConfig::default();
        let args = ServeArgs {
            rpc_url: None,
            contract: Some("0x04f2".into()),
            bind: None,
            start_block: None,
            relay_url: None,
            account_address: Some("0x4a0f7b1d3e5c9a8e2b6d0f4c8a2e6b0d".into()),
            private_key: Some("0x2bbf4f9fd0bbb2e60b0316c1fe0b76cf".into()),
            ephemeral: false,
        };
        apply_serve_overrides(&mut config, &args);
        config.validate().unwrap();
        assert!(build_submitter(&config).unwrap().is_some());

        config.publisher.private_key = Some("not-a-key".into());
        assert!(build_submitter(&config).is_err());
    }

    #[test]
    fn offline_view_matches_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        seed(&Storage::open(&config.storage).unwrap(), 3);

        let view = OfflineView::open(&config).unwrap();
        assert_eq!(view.tree.len(), 3);

        let proofs = view.proofs().unwrap();
        let path = proofs.path_for_commitment(&FieldElement::from_u64(101)).unwrap();
        assert_eq!(path.leaf_index, 1);
        assert_eq!(path.root, view.tree.root());
        assert_eq!(path.height(), 4);
    }

    #[test]
    fn verify_accepts_consistent_state() {
        let config = config_in(std::path::Path::new("unused"));
        let storage = Storage::in_memory();
        seed(&storage, 5);

        let mut view = OfflineView::from_storage(&config, storage.clone()).unwrap();
        storage.root_writer.record_if_new(&view.tree.root(), 14).unwrap();

        let report = verify_view(&mut view).unwrap();
        assert_eq!(report.checked, 5);
        assert!(report.failed.is_empty());
        assert_eq!(report.stale_record, None);
    }

    #[test]
    fn verify_reports_stale_root_record() {
        let config = config_in(std::path::Path::new("unused"));
        let storage = Storage::in_memory();
        seed(&storage, 2);
        storage.root_writer.record_if_new(&FieldElement::from_u64(1), 10).unwrap();

        let mut view = OfflineView::from_storage(&config, storage).unwrap();
        let report = verify_view(&mut view).unwrap();
        assert_eq!(report.stale_record, Some(FieldElement::from_u64(1)));
        assert!(report.failed.is_empty());
    }

    #[test]
    fn verify_empty_ledger_checks_nothing() {
        let config = config_in(std::path::Path::new("unused"));
        let mut view = OfflineView::from_storage(&config, Storage::in_memory()).unwrap();
        assert_eq!(verify_view(&mut view).unwrap(), VerifyReport::default());
    }
}
