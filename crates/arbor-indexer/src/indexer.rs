use std::sync::Arc;

use tracing::{debug, info, warn};

use arbor_chain::{CommitmentEvent, EventSource, RootSubmitter};
use arbor_store::{LedgerReader, Storage};
use arbor_tree::{MerkleTree, TreeBuilder, TreeConfig};
use arbor_types::{BlockNumber, FieldElement};

use crate::error::IndexerResult;
use crate::proof::ProofService;
use crate::publisher::{PublishReport, Publisher};
use crate::snapshot::SnapshotCell;

/// Rebuild the tree from the full ledger.
///
/// Fails with `TreeError::InconsistentLeaf` if the ledger has a gap.
pub fn replay(builder: &mut TreeBuilder, ledger: &dyn LedgerReader) -> IndexerResult<MerkleTree> {
    let leaves = ledger.list_ordered()?;
    Ok(builder.build(&leaves)?)
}

/// What one call to [`Indexer::ingest`] changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub events: usize,
    pub inserted: usize,
    /// Root of the new snapshot, if one was built.
    pub root: Option<FieldElement>,
    /// Whether that root was new to the root store.
    pub root_recorded: bool,
}

/// What one poll cycle did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub from: BlockNumber,
    pub to: Option<BlockNumber>,
    pub ingest: IngestReport,
    pub published: PublishReport,
}

/// Owner of every write path: ledger inserts, tree rebuilds, root records,
/// snapshot swaps and publication.
///
/// Exactly one `Indexer` exists per deployment; readers get a
/// [`ProofService`] over the same snapshot cell.
pub struct Indexer {
    builder: TreeBuilder,
    storage: Storage,
    snapshots: Arc<SnapshotCell>,
    source: Arc<dyn EventSource>,
    publisher: Publisher,
    next_from: BlockNumber,
}

impl Indexer {
    /// Replay the ledger into the first snapshot and work out where polling
    /// resumes.
    ///
    /// The replayed root is recorded if missing, which heals a crash between
    /// a root record and the snapshot swap.
    pub fn bootstrap(
        tree: TreeConfig,
        start_block: BlockNumber,
        storage: Storage,
        source: Arc<dyn EventSource>,
        submitter: Option<Arc<dyn RootSubmitter>>,
    ) -> IndexerResult<Self> {
        let mut builder = TreeBuilder::poseidon(tree)?;
        let replayed = replay(&mut builder, storage.ledger.as_ref())?;
        let last_block = storage.ledger.last_block()?;

        if !replayed.is_empty() {
            let block = last_block.unwrap_or(start_block);
            let outcome = storage.root_writer.record_if_new(&replayed.root(), block)?;
            if outcome.recorded {
                warn!(
                    root = %replayed.root(),
                    "replayed root was missing from the root store; recorded"
                );
            }
        }

        // Re-poll the last block inclusively so a block holding several
        // commitments is never half-read.
        let next_from = last_block.unwrap_or(start_block);
        info!(
            leaves = replayed.len(),
            root = %replayed.root(),
            next_from,
            "indexer bootstrapped"
        );

        let publisher = Publisher::new(
            Arc::clone(&storage.roots),
            Arc::clone(&storage.root_writer),
            submitter,
        );

        Ok(Self {
            builder,
            snapshots: Arc::new(SnapshotCell::new(replayed, last_block)),
            storage,
            source,
            publisher,
            next_from,
        })
    }

    pub fn snapshots(&self) -> Arc<SnapshotCell> {
        Arc::clone(&self.snapshots)
    }

    pub fn proof_service(&self) -> ProofService {
        ProofService::new(self.snapshots(), Arc::clone(&self.storage.ledger))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// First block the next cycle will fetch.
    pub fn next_from(&self) -> BlockNumber {
        self.next_from
    }

    /// Poll once: fetch new events, ingest them, publish pending roots.
    ///
    /// On error nothing advances, so the same range is fetched again.
    pub async fn run_cycle(&mut self) -> IndexerResult<CycleReport> {
        let from = self.next_from;
        let latest = self.source.latest_block().await?;
        if from > latest {
            debug!(from, latest, "chain head not past resume point");
            let mut ingest = IngestReport::default();
            self.catch_up(latest, &mut ingest)?;
            // Roots that failed to publish earlier are retried every cycle.
            let published = self.publisher.publish_pending().await?;
            return Ok(CycleReport {
                from,
                ingest,
                published,
                ..CycleReport::default()
            });
        }

        let events = self.source.fetch(from, latest).await?;
        let ingest = self.ingest(&events, latest)?;
        self.next_from = latest + 1;

        let published = self.publisher.publish_pending().await?;

        info!(
            from,
            to = latest,
            events = ingest.events,
            inserted = ingest.inserted,
            leaves = self.snapshots.load().tree.len(),
            published = published.submitted.len(),
            "cycle complete"
        );

        Ok(CycleReport {
            from,
            to: Some(latest),
            ingest,
            published,
        })
    }

    /// Insert decoded events and, if the ledger is now ahead of the
    /// snapshot, extend the tree, record its root and swap the snapshot.
    pub fn ingest(
        &mut self,
        events: &[CommitmentEvent],
        observed_block: BlockNumber,
    ) -> IndexerResult<IngestReport> {
        let mut report = IngestReport {
            events: events.len(),
            ..IngestReport::default()
        };

        for event in events {
            let expected = self.storage.ledger.count()?;
            let outcome = self.storage.ledger_writer.insert(&event.to_leaf())?;
            if outcome.inserted {
                if event.leaf_index != expected {
                    warn!(
                        leaf_index = event.leaf_index,
                        expected,
                        "commitment arrived out of leaf order"
                    );
                }
                debug!(
                    leaf_index = event.leaf_index,
                    commitment = %event.commitment,
                    "commitment ingested"
                );
                report.inserted += 1;
            }
        }

        self.catch_up(observed_block, &mut report)?;
        Ok(report)
    }

    /// Bring the snapshot level with the ledger.
    ///
    /// The ledger can run ahead when a cycle failed after its inserts landed;
    /// the retry then sees only duplicates, so the comparison is against the
    /// ledger length rather than this call's inserts.
    fn catch_up(
        &mut self,
        observed_block: BlockNumber,
        report: &mut IngestReport,
    ) -> IndexerResult<()> {
        let current = self.snapshots.load();
        let stored = self.storage.ledger.count()?;
        if stored == current.tree.len() {
            return Ok(());
        }
        if report.inserted == 0 {
            warn!(
                stored,
                snapshot = current.tree.len(),
                "snapshot behind ledger; rebuilding"
            );
        }

        let fresh = self.storage.ledger.list_from(current.tree.len())?;
        let tree = self.builder.extend(&current.tree, &fresh)?;
        let root = tree.root();

        // Record before swapping: a crash in between is healed by bootstrap.
        report.root_recorded = self
            .storage
            .root_writer
            .record_if_new(&root, observed_block)?
            .recorded;
        report.root = Some(root);

        let snapshot = self.snapshots.swap(tree, Some(observed_block));
        info!(
            generation = snapshot.generation,
            leaves = snapshot.tree.len(),
            %root,
            new_root = report.root_recorded,
            "snapshot swapped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_chain::{ChainError, MemoryEventSource, MemorySubmitter};
    use arbor_crypto::{PairHasher, PoseidonHasher};
    use std::sync::atomic::{AtomicBool, Ordering};

    use arbor_store::{
        InMemoryLedger, InMemoryRootStore, LedgerWriter, RootReader, RootWriter, StorageConfig,
        StoreError, StoreResult, SyncMode,
    };
    use arbor_tree::TreeError;
    use arbor_types::{CommitmentLeaf, InsertOutcome, LeafIndex, RecordOutcome, RootRecord};

    use crate::error::{ErrorClass, IndexerError};

    const HEIGHT: usize = 16;

    fn fe(n: u64) -> FieldElement {
        FieldElement::from_u64(n)
    }

    fn indexer_with(storage: Storage, source: Arc<MemoryEventSource>) -> Indexer {
        Indexer::bootstrap(TreeConfig::with_height(HEIGHT), 0, storage, source, None).unwrap()
    }

    fn disk_full() -> StoreError {
        StoreError::Io(std::io::Error::other("disk full"))
    }

    /// Root store whose next `record_if_new` fails once when armed.
    #[derive(Default)]
    struct FlakyRoots {
        inner: InMemoryRootStore,
        fail_record: AtomicBool,
    }

    impl RootWriter for FlakyRoots {
        fn record_if_new(
            &self,
            root: &FieldElement,
            block: BlockNumber,
        ) -> StoreResult<RecordOutcome> {
            if self.fail_record.swap(false, Ordering::SeqCst) {
                return Err(disk_full());
            }
            self.inner.record_if_new(root, block)
        }

        fn mark_submitted(&self, root: &FieldElement, tx_hash: Option<&str>) -> StoreResult<()> {
            self.inner.mark_submitted(root, tx_hash)
        }
    }

    impl RootReader for FlakyRoots {
        fn get(&self, root: &FieldElement) -> StoreResult<Option<RootRecord>> {
            self.inner.get(root)
        }

        fn latest(&self) -> StoreResult<Option<RootRecord>> {
            self.inner.latest()
        }

        fn list_unsubmitted(&self) -> StoreResult<Vec<RootRecord>> {
            self.inner.list_unsubmitted()
        }

        fn count(&self) -> StoreResult<u64> {
            self.inner.count()
        }
    }

    /// Ledger whose next `list_from` fails once when armed.
    #[derive(Default)]
    struct FlakyLedger {
        inner: InMemoryLedger,
        fail_list_from: AtomicBool,
    }

    impl LedgerWriter for FlakyLedger {
        fn insert(&self, leaf: &CommitmentLeaf) -> StoreResult<InsertOutcome> {
            self.inner.insert(leaf)
        }
    }

    impl LedgerReader for FlakyLedger {
        fn list_ordered(&self) -> StoreResult<Vec<CommitmentLeaf>> {
            self.inner.list_ordered()
        }

        fn list_from(&self, from: LeafIndex) -> StoreResult<Vec<CommitmentLeaf>> {
            if self.fail_list_from.swap(false, Ordering::SeqCst) {
                return Err(disk_full());
            }
            self.inner.list_from(from)
        }

        fn get(&self, leaf_index: LeafIndex) -> StoreResult<Option<CommitmentLeaf>> {
            self.inner.get(leaf_index)
        }

        fn find_by_commitment(&self, commitment: &FieldElement) -> StoreResult<Option<LeafIndex>> {
            self.inner.find_by_commitment(commitment)
        }

        fn count(&self) -> StoreResult<u64> {
            self.inner.count()
        }

        fn last_block(&self) -> StoreResult<Option<BlockNumber>> {
            self.inner.last_block()
        }
    }

    #[test]
    fn empty_bootstrap_serves_empty_root() {
        let indexer = indexer_with(Storage::in_memory(), Arc::new(MemoryEventSource::new()));
        let svc = indexer.proof_service();
        let builder = TreeBuilder::poseidon(TreeConfig::with_height(HEIGHT)).unwrap();
        assert_eq!(svc.current_root(), *builder.empty_hashes().empty_root());
        assert_eq!(indexer.storage().roots.count().unwrap(), 0);
        assert_eq!(indexer.next_from(), 0);
    }

    #[test]
    fn single_leaf_then_duplicate() {
        let mut indexer = indexer_with(Storage::in_memory(), Arc::new(MemoryEventSource::new()));
        let c = fe(0xC0FFEE);

        let report = indexer.ingest(&[CommitmentEvent::new(0, c, 10)], 10).unwrap();
        assert_eq!(report.inserted, 1);
        assert!(report.root_recorded);

        let svc = indexer.proof_service();
        let path = svc.path_for_index(0).unwrap();
        let root = svc.current_root();
        assert_eq!(path.root, root);

        let mut h = PoseidonHasher::new().unwrap();
        let builder = TreeBuilder::poseidon(TreeConfig::with_height(HEIGHT)).unwrap();
        let mut expected = c;
        for level in 0..HEIGHT {
            assert_eq!(path.siblings[level], *builder.empty_hashes().at(level));
            expected = h.hash_pair(&expected, builder.empty_hashes().at(level)).unwrap();
        }
        assert_eq!(root, expected);

        let generation = indexer.snapshots().generation();
        let again = indexer.ingest(&[CommitmentEvent::new(0, c, 10)], 11).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(svc.current_root(), root);
        assert_eq!(indexer.snapshots().generation(), generation);
        assert_eq!(indexer.storage().roots.count().unwrap(), 1);
    }

    #[test]
    fn incremental_ingest_matches_replay() {
        let mut indexer = indexer_with(Storage::in_memory(), Arc::new(MemoryEventSource::new()));
        let batches: [&[u64]; 3] = [&[0, 1, 2], &[3], &[4, 5, 6, 7, 8]];
        for batch in batches {
            let events: Vec<_> = batch
                .iter()
                .map(|i| CommitmentEvent::new(*i, fe(100 + i), 20 + i))
                .collect();
            indexer.ingest(&events, 30).unwrap();
        }

        let mut builder = TreeBuilder::poseidon(TreeConfig::with_height(HEIGHT)).unwrap();
        let replayed = replay(&mut builder, indexer.storage().ledger.as_ref()).unwrap();
        assert_eq!(indexer.proof_service().current_root(), replayed.root());
        assert_eq!(indexer.snapshots().generation(), 3);
    }

    #[test]
    fn batch_out_of_order_within_cycle_is_accepted() {
        let mut indexer = indexer_with(Storage::in_memory(), Arc::new(MemoryEventSource::new()));
        let events = vec![
            CommitmentEvent::new(1, fe(2), 5),
            CommitmentEvent::new(0, fe(1), 5),
        ];
        indexer.ingest(&events, 5).unwrap();
        assert_eq!(indexer.snapshots().load().tree.len(), 2);
    }

    #[test]
    fn gap_is_flagged_and_previous_snapshot_kept() {
        let mut indexer = indexer_with(Storage::in_memory(), Arc::new(MemoryEventSource::new()));
        indexer.ingest(&[CommitmentEvent::new(0, fe(1), 1)], 1).unwrap();
        let before = indexer.proof_service().current_root();

        let err = indexer
            .ingest(&[CommitmentEvent::new(5, fe(6), 2)], 2)
            .unwrap_err();
        assert!(matches!(
            err,
            IndexerError::Tree(TreeError::InconsistentLeaf {
                expected: 1,
                found: 5
            })
        ));
        assert_eq!(err.class(), ErrorClass::Integrity);
        assert_eq!(indexer.proof_service().current_root(), before);
        assert!(indexer.proof_service().path_for_index(5).is_err());
    }

    #[test]
    fn conflicting_commitment_is_integrity_error() {
        let mut indexer = indexer_with(Storage::in_memory(), Arc::new(MemoryEventSource::new()));
        indexer.ingest(&[CommitmentEvent::new(0, fe(1), 1)], 1).unwrap();
        let err = indexer
            .ingest(&[CommitmentEvent::new(0, fe(2), 2)], 2)
            .unwrap_err();
        assert!(matches!(err, IndexerError::Store(StoreError::Conflict { .. })));
        assert_eq!(err.class(), ErrorClass::Integrity);
    }

    #[tokio::test]
    async fn cycle_resumes_and_advances() {
        let source = Arc::new(MemoryEventSource::new());
        source.push(CommitmentEvent::new(0, fe(1), 3));
        source.push(CommitmentEvent::new(1, fe(2), 4));
        let mut indexer = indexer_with(Storage::in_memory(), source.clone());

        let report = indexer.run_cycle().await.unwrap();
        assert_eq!(report.to, Some(4));
        assert_eq!(report.ingest.inserted, 2);
        assert_eq!(indexer.next_from(), 5);

        let idle = indexer.run_cycle().await.unwrap();
        assert_eq!(idle.to, None);

        source.push(CommitmentEvent::new(2, fe(3), 9));
        let report = indexer.run_cycle().await.unwrap();
        assert_eq!(report.from, 5);
        assert_eq!(report.ingest.inserted, 1);
        assert_eq!(indexer.proof_service().snapshot().tree.len(), 3);
    }

    #[tokio::test]
    async fn transient_failure_retries_same_range() {
        let source = Arc::new(MemoryEventSource::new());
        source.push(CommitmentEvent::new(0, fe(1), 3));
        let mut indexer = indexer_with(Storage::in_memory(), source.clone());

        source.fail_next(ChainError::Rpc {
            code: -32603,
            message: "node busy".into(),
        });
        let err = indexer.run_cycle().await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(indexer.next_from(), 0);

        let report = indexer.run_cycle().await.unwrap();
        assert_eq!(report.ingest.inserted, 1);
    }

    #[tokio::test]
    async fn cycle_publishes_new_roots() {
        let source = Arc::new(MemoryEventSource::new());
        source.push(CommitmentEvent::new(0, fe(1), 3));
        let submitter = Arc::new(MemorySubmitter::new());
        let mut indexer = Indexer::bootstrap(
            TreeConfig::with_height(HEIGHT),
            0,
            Storage::in_memory(),
            source,
            Some(submitter.clone() as Arc<dyn RootSubmitter>),
        )
        .unwrap();

        let report = indexer.run_cycle().await.unwrap();
        let root = indexer.proof_service().current_root();
        assert_eq!(report.published.submitted, vec![root]);
        assert_eq!(submitter.submitted(), vec![root]);
        assert!(indexer.storage().roots.list_unsubmitted().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_publication_is_retried_on_idle_cycle() {
        let source = Arc::new(MemoryEventSource::new());
        source.push(CommitmentEvent::new(0, fe(1), 3));
        let submitter = Arc::new(MemorySubmitter::new());
        submitter.fail_next(ChainError::Api {
            status: 503,
            message: "relay down".into(),
        });
        let mut indexer = Indexer::bootstrap(
            TreeConfig::with_height(HEIGHT),
            0,
            Storage::in_memory(),
            source,
            Some(submitter.clone() as Arc<dyn RootSubmitter>),
        )
        .unwrap();

        let first = indexer.run_cycle().await.unwrap();
        let root = indexer.proof_service().current_root();
        assert_eq!(first.published.blocked_at, Some(root));
        assert_eq!(indexer.storage().roots.list_unsubmitted().unwrap().len(), 1);

        let idle = indexer.run_cycle().await.unwrap();
        assert_eq!(idle.to, None);
        assert_eq!(idle.published.submitted, vec![root]);
        assert_eq!(submitter.submitted(), vec![root]);
    }

    #[tokio::test]
    async fn restart_replays_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            sync_mode: SyncMode::OsDefault,
        };

        let source = Arc::new(MemoryEventSource::new());
        for i in 0..5 {
            source.push(CommitmentEvent::new(i, fe(50 + i), 10 + i));
        }

        let root = {
            let mut indexer = indexer_with(Storage::open(&config).unwrap(), source.clone());
            indexer.run_cycle().await.unwrap();
            indexer.proof_service().current_root()
        };

        let indexer = indexer_with(Storage::open(&config).unwrap(), source);
        assert_eq!(indexer.proof_service().current_root(), root);
        assert_eq!(indexer.next_from(), 14);
        assert_eq!(indexer.storage().roots.count().unwrap(), 1);
        assert_eq!(indexer.snapshots().load().observed_block, Some(14));
    }

    #[test]
    fn snapshot_catches_up_after_root_record_failure() {
        let roots = Arc::new(FlakyRoots::default());
        let storage = Storage::from_parts(Arc::new(InMemoryLedger::new()), roots.clone());
        let mut indexer = indexer_with(storage, Arc::new(MemoryEventSource::new()));
        let event = CommitmentEvent::new(0, fe(7), 5);

        roots.fail_record.store(true, Ordering::SeqCst);
        let err = indexer.ingest(&[event.clone()], 5).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(indexer.storage().ledger.count().unwrap(), 1);
        assert_eq!(indexer.snapshots().load().tree.len(), 0);

        let retry = indexer.ingest(&[event], 5).unwrap();
        assert_eq!(retry.inserted, 0);
        assert!(retry.root_recorded);
        assert_eq!(retry.root, Some(indexer.proof_service().current_root()));
        assert_eq!(indexer.snapshots().load().tree.len(), 1);
        assert_eq!(roots.count().unwrap(), 1);

        let path = indexer.proof_service().path_for_commitment(&fe(7)).unwrap();
        assert_eq!(path.leaf_index, 0);
    }

    #[test]
    fn snapshot_catches_up_after_ledger_read_failure() {
        let ledger = Arc::new(FlakyLedger::default());
        let storage = Storage::from_parts(ledger.clone(), Arc::new(InMemoryRootStore::new()));
        let mut indexer = indexer_with(storage, Arc::new(MemoryEventSource::new()));
        let events = vec![CommitmentEvent::new(0, fe(7), 5), CommitmentEvent::new(1, fe(8), 5)];

        ledger.fail_list_from.store(true, Ordering::SeqCst);
        let err = indexer.ingest(&events, 5).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(indexer.snapshots().load().tree.len(), 0);

        let retry = indexer.ingest(&events, 5).unwrap();
        assert_eq!(retry.inserted, 0);
        assert!(retry.root_recorded);
        assert_eq!(indexer.snapshots().load().tree.len(), 2);
        assert!(indexer.proof_service().path_for_commitment(&fe(8)).is_ok());
        assert_eq!(indexer.storage().roots.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn cycle_retry_rebuilds_after_partial_failure() {
        let source = Arc::new(MemoryEventSource::new());
        source.push(CommitmentEvent::new(0, fe(7), 3));
        let roots = Arc::new(FlakyRoots::default());
        let storage = Storage::from_parts(Arc::new(InMemoryLedger::new()), roots.clone());
        let mut indexer = indexer_with(storage, source);

        roots.fail_record.store(true, Ordering::SeqCst);
        let err = indexer.run_cycle().await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(indexer.next_from(), 0);

        let report = indexer.run_cycle().await.unwrap();
        assert_eq!(report.ingest.inserted, 0);
        assert!(report.ingest.root_recorded);
        assert_eq!(indexer.next_from(), 4);
        assert!(indexer.proof_service().path_for_commitment(&fe(7)).is_ok());
    }

    #[tokio::test]
    async fn idle_cycle_rebuilds_lagging_snapshot() {
        let source = Arc::new(MemoryEventSource::new());
        let roots = Arc::new(FlakyRoots::default());
        let storage = Storage::from_parts(Arc::new(InMemoryLedger::new()), roots.clone());
        let mut indexer =
            Indexer::bootstrap(TreeConfig::with_height(HEIGHT), 10, storage, source.clone(), None)
                .unwrap();

        roots.fail_record.store(true, Ordering::SeqCst);
        indexer.ingest(&[CommitmentEvent::new(0, fe(7), 9)], 9).unwrap_err();

        source.set_head(5);
        let idle = indexer.run_cycle().await.unwrap();
        assert_eq!(idle.to, None);
        assert!(idle.ingest.root_recorded);
        assert_eq!(indexer.snapshots().load().tree.len(), 1);
        assert_eq!(roots.latest().unwrap().unwrap().observed_at_block, 5);
    }

    #[test]
    fn bootstrap_heals_missing_root() {
        let storage = Storage::in_memory();
        storage
            .ledger_writer
            .insert(&CommitmentLeaf::new(0, fe(7), 12))
            .unwrap();
        let indexer = indexer_with(storage, Arc::new(MemoryEventSource::new()));

        let latest = indexer.storage().roots.latest().unwrap().unwrap();
        assert_eq!(latest.root, indexer.proof_service().current_root());
        assert_eq!(latest.observed_at_block, 12);
        assert_eq!(indexer.next_from(), 12);
    }

    #[test]
    fn bootstrap_refuses_gapped_ledger() {
        let storage = Storage::in_memory();
        storage
            .ledger_writer
            .insert(&CommitmentLeaf::new(3, fe(7), 12))
            .unwrap();
        let err = Indexer::bootstrap(
            TreeConfig::with_height(HEIGHT),
            0,
            storage,
            Arc::new(MemoryEventSource::new()),
            None,
        )
        .err()
        .unwrap();
        assert_eq!(err.class(), ErrorClass::Integrity);
    }
}
