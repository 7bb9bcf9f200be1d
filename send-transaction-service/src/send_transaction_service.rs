//! A multi-threaded pipeline that receives client transactions, batches and
//! forwards them to the current and upcoming slot leaders, and retries or
//! drops them based on signature status and block height.
//!
//! Three long-lived threads cooperate over shared guarded state: the service
//! info updater keeps the leader schedule and addresses fresh, the receiver
//! drains the inbound channel into batches, and the processor polls the RPC
//! oracle to decide the fate of every pending transaction.

use {
    crate::{
        service_info::ServiceInfo,
        tpu_connection::TpuConnection,
        tpu_info::TpuInfo,
    },
    crossbeam_channel::{Receiver, RecvTimeoutError},
    indexmap::IndexMap,
    ridgeline_measure::measure::Measure,
    ridgeline_metrics::{datapoint_info, datapoint_warn, histogram::Histogram},
    ridgeline_rpc_client_api::{
        client_error::{ClientError, Result as ClientResult},
        response::RpcSignatureStatusConfig,
    },
    ridgeline_sdk::{
        hash::Hash, pubkey::Pubkey, signature::Signature, timing::AtomicInterval,
    },
    std::{
        collections::{hash_map::Entry, HashMap, HashSet},
        sync::{
            atomic::{AtomicBool, AtomicU64, Ordering},
            Arc, RwLock,
        },
        thread::{self, sleep, Builder, JoinHandle},
        time::{Duration, Instant},
    },
};

/// Maximum size of the pending-transaction pool
pub const MAX_PENDING_POOL_SIZE: usize = 10_000;

/// Default retry interval; also how often the processor wakes up
const DEFAULT_PROCESS_TRANSACTIONS_RATE_MS: u64 = 2_000;

/// Default number of leaders to forward transactions to
const DEFAULT_LEADER_FORWARD_COUNT: u64 = 2;
/// Default max number of times the service will retry broadcast
const DEFAULT_SERVICE_MAX_RETRIES: usize = usize::MAX;

/// Default batch size for sending transactions in batch
/// When this size is reached, send out the transactions.
const DEFAULT_BATCH_SIZE: usize = 1;

// The maximum transaction batch size
pub const MAX_TRANSACTION_BATCH_SIZE: usize = 10_000;

/// Default maximum batch waiting time in ms. If this time is reached,
/// whatever transactions are cached will be sent.
const DEFAULT_BATCH_SEND_RATE_MS: u64 = 1;

/// How often the service info (epoch, schedule, leader addresses, blockhash)
/// is refreshed
const DEFAULT_INFO_UPDATE_RATE_MS: u64 = 60_000;

/// Report the send transaction metrics every 5 seconds.
const SEND_TRANSACTION_METRICS_REPORT_RATE_MS: u64 = 5000;

pub struct SendTransactionService {
    info_thread: JoinHandle<()>,
    receive_txn_thread: JoinHandle<()>,
    retry_thread: JoinHandle<()>,
    exit: Arc<AtomicBool>,
}

pub struct TransactionInfo {
    pub signature: Signature,
    pub wire_transaction: Vec<u8>,
    pub last_valid_block_height: u64,
    pub durable_nonce_info: Option<(Pubkey, Hash)>,
    pub max_retries: Option<usize>,
    retries: usize,
    /// Last time the transaction was sent
    last_sent_time: Option<Instant>,
}

impl TransactionInfo {
    pub fn new(
        signature: Signature,
        wire_transaction: Vec<u8>,
        last_valid_block_height: u64,
        durable_nonce_info: Option<(Pubkey, Hash)>,
        max_retries: Option<usize>,
        last_sent_time: Option<Instant>,
    ) -> Self {
        Self {
            signature,
            wire_transaction,
            last_valid_block_height,
            durable_nonce_info,
            max_retries,
            retries: 0,
            last_sent_time,
        }
    }
}

#[derive(Default, Debug, PartialEq, Eq)]
struct ProcessTransactionsResult {
    rooted: u64,
    expired: u64,
    retried: u64,
    max_retries_elapsed: u64,
    failed: u64,
    retained: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub retry_rate_ms: u64,
    pub leader_forward_count: u64,
    pub default_max_retries: Option<usize>,
    pub service_max_retries: usize,
    /// The batch size for sending transactions in batches
    pub batch_size: usize,
    /// How frequently batches are sent
    pub batch_send_rate_ms: u64,
    /// How frequently the leader schedule and addresses are rebuilt
    pub info_update_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry_rate_ms: DEFAULT_PROCESS_TRANSACTIONS_RATE_MS,
            leader_forward_count: DEFAULT_LEADER_FORWARD_COUNT,
            default_max_retries: None,
            service_max_retries: DEFAULT_SERVICE_MAX_RETRIES,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_send_rate_ms: DEFAULT_BATCH_SEND_RATE_MS,
            info_update_rate_ms: DEFAULT_INFO_UPDATE_RATE_MS,
        }
    }
}

/// The pending pool: insertion-ordered so the processor can align each entry
/// with the positional status response from the oracle.
type PendingTransactions = IndexMap<Signature, TransactionInfo>;

/// Metrics of the send-transaction-service.
#[derive(Default)]
struct SendTransactionServiceStats {
    /// Count of the received transactions
    received_transactions: AtomicU64,

    /// Count of the received duplicate transactions
    received_duplicate_transactions: AtomicU64,

    /// Count of transactions sent in batch
    sent_transactions: AtomicU64,

    /// Count of transactions not being added to the pending pool
    /// due to the pool size limit
    pending_pool_overflow: AtomicU64,

    /// Pending pool size
    pending_pool_size: AtomicU64,

    /// The count of calls of sending transactions which can be in batch or
    /// single.
    send_attempt_count: AtomicU64,

    /// Time distribution of sends, in microseconds
    send_us: Histogram,

    /// Send failure count
    send_failure_count: AtomicU64,

    /// Count of rooted transactions
    rooted_transactions: AtomicU64,

    /// Count of expired transactions
    expired_transactions: AtomicU64,

    /// Count of transactions exceeding max retries
    transactions_exceeding_max_retries: AtomicU64,

    /// Count of retries of transactions
    retries: AtomicU64,

    /// Count of transactions failed
    failed_transactions: AtomicU64,
}

#[derive(Default)]
struct SendTransactionServiceStatsReport {
    stats: SendTransactionServiceStats,
    last_report: AtomicInterval,
}

impl SendTransactionServiceStatsReport {
    /// Report metrics of the send transaction service
    fn report(&self) {
        if self
            .last_report
            .should_update(SEND_TRANSACTION_METRICS_REPORT_RATE_MS)
        {
            let send_us = self.stats.send_us.sum();
            self.stats.send_us.clear();
            datapoint_info!(
                "send_transaction_service",
                (
                    "recv-tx",
                    self.stats.received_transactions.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "recv-duplicate",
                    self.stats
                        .received_duplicate_transactions
                        .swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "sent-tx",
                    self.stats.sent_transactions.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "pending-pool-overflow",
                    self.stats.pending_pool_overflow.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "pending-pool-size",
                    self.stats.pending_pool_size.swap(0, Ordering::Relaxed),
                    i64
                ),
                ("send-us", send_us, i64),
                (
                    "send-attempt-count",
                    self.stats.send_attempt_count.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "send-failure-count",
                    self.stats.send_failure_count.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "rooted-tx",
                    self.stats.rooted_transactions.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "expired-tx",
                    self.stats.expired_transactions.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "max-retries-exceeded-tx",
                    self.stats
                        .transactions_exceeding_max_retries
                        .swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "retries",
                    self.stats.retries.swap(0, Ordering::Relaxed),
                    i64
                ),
                (
                    "failed-tx",
                    self.stats.failed_transactions.swap(0, Ordering::Relaxed),
                    i64
                )
            );
        }
    }
}

impl SendTransactionService {
    pub fn new<T: TpuInfo + Send + Sync + 'static>(
        service_info: ServiceInfo<T>,
        connection: Arc<dyn TpuConnection>,
        receiver: Receiver<TransactionInfo>,
        config: Config,
        exit: Arc<AtomicBool>,
    ) -> Self {
        let stats_report = Arc::new(SendTransactionServiceStatsReport::default());
        let pending_transactions = Arc::new(RwLock::new(PendingTransactions::default()));
        let service_info = Arc::new(RwLock::new(service_info));

        let info_thread = Self::info_thread(
            service_info.clone(),
            config.clone(),
            exit.clone(),
        );

        let receive_txn_thread = Self::receive_txn_thread(
            receiver,
            service_info.clone(),
            connection.clone(),
            config.clone(),
            pending_transactions.clone(),
            stats_report.clone(),
            exit.clone(),
        );

        let retry_thread = Self::retry_thread(
            service_info,
            connection,
            config,
            pending_transactions,
            stats_report,
            exit.clone(),
        );
        Self {
            info_thread,
            receive_txn_thread,
            retry_thread,
            exit,
        }
    }

    /// Thread responsible for keeping the service info snapshot fresh.
    fn info_thread<T: TpuInfo + Send + Sync + 'static>(
        service_info: Arc<RwLock<ServiceInfo<T>>>,
        config: Config,
        exit: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        Builder::new()
            .name("rlStxInfo".to_string())
            .spawn(move || loop {
                // sleep in short steps so shutdown is not delayed by the
                // long refresh interval
                let mut slept_ms = 0;
                while slept_ms < config.info_update_rate_ms {
                    if exit.load(Ordering::Relaxed) {
                        return;
                    }
                    sleep(Duration::from_millis(1000.min(config.info_update_rate_ms)));
                    slept_ms += 1000;
                }
                if exit.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(err) = service_info.write().unwrap().refresh() {
                    error!("Terminating service-info refresh: {err}");
                    exit.store(true, Ordering::Relaxed);
                    break;
                }
            })
            .unwrap()
    }

    /// Thread responsible for receiving transactions from RPC clients.
    fn receive_txn_thread<T: TpuInfo + Send + Sync + 'static>(
        receiver: Receiver<TransactionInfo>,
        service_info: Arc<RwLock<ServiceInfo<T>>>,
        connection: Arc<dyn TpuConnection>,
        config: Config,
        pending_transactions: Arc<RwLock<PendingTransactions>>,
        stats_report: Arc<SendTransactionServiceStatsReport>,
        exit: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let mut last_batch_sent = Instant::now();
        let mut batch: HashMap<Signature, TransactionInfo> = HashMap::new();

        info!(
            "Starting send-transaction-service::receive_txn_thread with config {:?}",
            config
        );
        Builder::new()
            .name("rlStxReceive".to_string())
            .spawn(move || loop {
                let stats = &stats_report.stats;
                let recv_result = receiver.recv_timeout(Duration::from_millis(
                    config.batch_send_rate_ms,
                ));
                if exit.load(Ordering::Relaxed) {
                    break;
                }
                match recv_result {
                    Err(RecvTimeoutError::Disconnected) => {
                        info!("Terminating send-transaction-service.");
                        exit.store(true, Ordering::Relaxed);
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(transaction_info) => {
                        stats.received_transactions.fetch_add(1, Ordering::Relaxed);
                        let entry = batch.entry(transaction_info.signature);
                        let mut new_transaction = false;
                        if let Entry::Vacant(_) = entry {
                            if !pending_transactions
                                .read()
                                .unwrap()
                                .contains_key(&transaction_info.signature)
                            {
                                entry.or_insert(transaction_info);
                                new_transaction = true;
                            }
                        }
                        if !new_transaction {
                            stats
                                .received_duplicate_transactions
                                .fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }

                if (!batch.is_empty()
                    && last_batch_sent.elapsed().as_millis() as u64 >= config.batch_send_rate_ms)
                    || batch.len() >= config.batch_size
                {
                    stats
                        .sent_transactions
                        .fetch_add(batch.len() as u64, Ordering::Relaxed);
                    let addresses = {
                        let service_info = service_info.read().unwrap();
                        service_info.leader_addresses(config.leader_forward_count)
                    };
                    match addresses {
                        Ok(addresses) => {
                            let wire_transactions = batch
                                .values()
                                .map(|transaction_info| {
                                    transaction_info.wire_transaction.as_ref()
                                })
                                .collect::<Vec<&[u8]>>();
                            for address in &addresses {
                                Self::send_transactions(
                                    address,
                                    &wire_transactions,
                                    &connection,
                                    stats,
                                );
                            }
                        }
                        Err(err) => {
                            error!("Terminating send-transaction-service: {err}");
                            exit.store(true, Ordering::Relaxed);
                            break;
                        }
                    }

                    {
                        // take the write lock and move the batch into the
                        // pending pool
                        let mut pending_transactions = pending_transactions.write().unwrap();
                        Self::add_batch_to_pending(
                            &mut pending_transactions,
                            batch.drain(),
                            Instant::now(),
                            stats,
                        );
                        stats
                            .pending_pool_size
                            .store(pending_transactions.len() as u64, Ordering::Relaxed);
                    }
                    last_batch_sent = Instant::now();
                }
                stats_report.report();
            })
            .unwrap()
    }

    /// Move a just-sent batch into the pending pool, stamping each entry's
    /// send time. Entries already pending are dropped; entries beyond the
    /// pool bound are skipped.
    fn add_batch_to_pending(
        pending_transactions: &mut PendingTransactions,
        batch: impl Iterator<Item = (Signature, TransactionInfo)>,
        last_sent_time: Instant,
        stats: &SendTransactionServiceStats,
    ) {
        for (signature, mut transaction_info) in batch {
            if pending_transactions.contains_key(&signature) {
                continue;
            }
            if pending_transactions.len() >= MAX_PENDING_POOL_SIZE {
                datapoint_warn!("send_transaction_service-queue-overflow");
                stats.pending_pool_overflow.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            transaction_info.last_sent_time = Some(last_sent_time);
            pending_transactions.insert(signature, transaction_info);
        }
    }

    /// Thread responsible for retrying transactions
    fn retry_thread<T: TpuInfo + Send + Sync + 'static>(
        service_info: Arc<RwLock<ServiceInfo<T>>>,
        connection: Arc<dyn TpuConnection>,
        config: Config,
        pending_transactions: Arc<RwLock<PendingTransactions>>,
        stats_report: Arc<SendTransactionServiceStatsReport>,
        exit: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        info!(
            "Starting send-transaction-service::retry_thread with config {:?}",
            config
        );
        Builder::new()
            .name("rlStxRetry".to_string())
            .spawn(move || loop {
                sleep(Duration::from_millis(config.retry_rate_ms));
                if exit.load(Ordering::Relaxed) {
                    break;
                }
                let stats = &stats_report.stats;
                let mut pending_transactions = pending_transactions.write().unwrap();
                if pending_transactions.is_empty() {
                    continue;
                }
                stats
                    .pending_pool_size
                    .store(pending_transactions.len() as u64, Ordering::Relaxed);

                // The oracle calls and the retry decisions happen under the
                // service-info write lock, linearizing them relative to
                // refreshes and send stamps
                let result = {
                    let service_info = service_info.write().unwrap();
                    Self::process_transactions(
                        &service_info,
                        &mut pending_transactions,
                        &connection,
                        &config,
                        stats,
                    )
                };
                match result {
                    Ok(result) => {
                        debug!("Processed pending transactions: {:?}", result);
                    }
                    Err(err) => {
                        error!("Terminating send-transaction-service: {err}");
                        exit.store(true, Ordering::Relaxed);
                        break;
                    }
                }
                stats_report.report();
            })
            .unwrap()
    }

    /// Retry transactions sent before.
    fn process_transactions<T: TpuInfo>(
        service_info: &ServiceInfo<T>,
        pending_transactions: &mut PendingTransactions,
        connection: &Arc<dyn TpuConnection>,
        config: &Config,
        stats: &SendTransactionServiceStats,
    ) -> ClientResult<ProcessTransactionsResult> {
        let mut result = ProcessTransactionsResult::default();

        let block_height = service_info.rpc_client().get_block_height()?;
        let signatures: Vec<Signature> = pending_transactions.keys().copied().collect();
        let statuses = service_info.rpc_client().get_signature_statuses(
            &signatures,
            RpcSignatureStatusConfig {
                search_transaction_history: false,
            },
        )?;
        if statuses.len() != signatures.len() {
            return Err(ClientError::RpcError(format!(
                "getSignatureStatuses returned {} statuses for {} signatures",
                statuses.len(),
                signatures.len()
            )));
        }

        let retry_rate = Duration::from_millis(config.retry_rate_ms);
        let mut batched_transactions = HashSet::new();
        let mut drop_signatures = vec![];

        // statuses are in request order, which is the pool's insertion order
        for (signature, status) in signatures.iter().zip(statuses) {
            let transaction_info = pending_transactions
                .get_mut(signature)
                .expect("pending transaction missing mid-iteration");
            match status {
                Some(status) => {
                    if status.confirmations.is_none() {
                        info!("Transaction is rooted: {}", signature);
                        result.rooted += 1;
                        stats.rooted_transactions.fetch_add(1, Ordering::Relaxed);
                        drop_signatures.push(*signature);
                    } else if let Some(err) = status.err {
                        info!("Dropping failed transaction: {} ({})", signature, err);
                        result.failed += 1;
                        stats.failed_transactions.fetch_add(1, Ordering::Relaxed);
                        drop_signatures.push(*signature);
                    } else if transaction_info.last_valid_block_height < block_height {
                        info!("Dropping expired transaction: {}", signature);
                        result.expired += 1;
                        stats.expired_transactions.fetch_add(1, Ordering::Relaxed);
                        drop_signatures.push(*signature);
                    } else {
                        result.retained += 1;
                    }
                }
                None => {
                    let max_retries = transaction_info
                        .max_retries
                        .or(config.default_max_retries)
                        .map(|max_retries| max_retries.min(config.service_max_retries));

                    if let Some(max_retries) = max_retries {
                        if transaction_info.retries >= max_retries {
                            info!("Dropping transaction due to max retries: {}", signature);
                            result.max_retries_elapsed += 1;
                            stats
                                .transactions_exceeding_max_retries
                                .fetch_add(1, Ordering::Relaxed);
                            drop_signatures.push(*signature);
                            continue;
                        }
                    }

                    let now = Instant::now();
                    let need_send = transaction_info
                        .last_sent_time
                        .map(|last| now.duration_since(last) >= retry_rate)
                        .unwrap_or(true);
                    if need_send {
                        if transaction_info.last_sent_time.is_some() {
                            // Transaction sent before is unknown to the
                            // cluster, it might have been dropped or landed
                            // in another fork.  Re-send it
                            info!("Retrying transaction: {}", signature);
                            result.retried += 1;
                            transaction_info.retries += 1;
                            stats.retries.fetch_add(1, Ordering::Relaxed);
                        }
                        transaction_info.last_sent_time = Some(now);
                        batched_transactions.insert(*signature);
                    }
                }
            }
        }

        if !batched_transactions.is_empty() {
            let wire_transactions = pending_transactions
                .iter()
                .filter(|(signature, _)| batched_transactions.contains(*signature))
                .map(|(_, transaction_info)| transaction_info.wire_transaction.as_ref())
                .collect::<Vec<&[u8]>>();

            for chunk in wire_transactions.chunks(config.batch_size) {
                let addresses = service_info.leader_addresses(config.leader_forward_count)?;
                for address in &addresses {
                    Self::send_transactions(address, chunk, connection, stats);
                }
            }
        }

        for signature in drop_signatures {
            // shift-remove: the pool must stay insertion-ordered for the
            // next positional status alignment
            pending_transactions.shift_remove(&signature);
        }

        Ok(result)
    }

    fn send_transactions(
        tpu_address: &std::net::SocketAddr,
        wire_transactions: &[&[u8]],
        connection: &Arc<dyn TpuConnection>,
        stats: &SendTransactionServiceStats,
    ) {
        let mut measure = Measure::start("send-us");
        let result = connection.send_wire_transaction_batch(wire_transactions, tpu_address);

        if let Err(err) = result {
            warn!(
                "Failed to send transaction batch to {}: {:?}",
                tpu_address, err
            );
            stats.send_failure_count.fetch_add(1, Ordering::Relaxed);
        }

        measure.stop();
        stats.send_us.observe(measure.as_us());
        stats.send_attempt_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exit(&self) {
        self.exit.store(true, Ordering::Relaxed);
    }

    pub fn join(self) -> thread::Result<()> {
        self.receive_txn_thread.join()?;
        self.exit.store(true, Ordering::Relaxed);
        self.info_thread.join()?;
        self.retry_thread.join()
    }
}
