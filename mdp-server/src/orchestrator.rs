//! Orchestrator lifecycle (§4.7): owns construction and teardown order for
//! everything this crate is responsible for. The wire session itself, the
//! event-dispatch task that drives client-session callbacks (§5), and the
//! SNMP/command-surface integrations are external collaborators (§1) and
//! are not started here — callers (the demo binary, or a production
//! embedding) wire those against the [`Provider`]/[`RequestTransport`] this
//! type hands back via [`OrchestratorHandle`].
//!
//! Grounded in `opcua-server/src/server.rs`'s `Server::run_with` (spawn
//! long-running tasks, then select! over their completion and a shutdown
//! signal) and `server_handle.rs`'s `ServerHandle` (a cloneable handle
//! carrying a `CancellationToken` so shutdown can be requested from outside
//! the construction call).

use std::sync::Arc;

use log::{error, info};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::errors::ConfigError;
use crate::provider::Provider;
use crate::transport::{self, RequestTransport};
use crate::wire::WireSink;
use crate::worker::{self, WorkerConfig};

/// A cloneable handle to a running orchestrator: everything a client
/// session dispatch callback or an external shutdown trigger needs, without
/// owning the worker join handles themselves.
#[derive(Clone)]
pub struct OrchestratorHandle {
    provider: Arc<Provider>,
    transport: RequestTransport,
    cool: Arc<Mutex<mdp_core::CoolRegistry>>,
    token: CancellationToken,
}

impl OrchestratorHandle {
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    pub fn transport(&self) -> &RequestTransport {
        &self.transport
    }

    pub fn cool(&self) -> &Arc<Mutex<mdp_core::CoolRegistry>> {
        &self.cool
    }

    /// Whether shutdown has been requested. The event-dispatch task (owned
    /// by the wire integration, out of scope here) should stop handing new
    /// work to this orchestrator once this is true.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Owns the worker tasks spawned at construction. `shutdown` performs the
/// teardown this crate is responsible for, in the reverse order of §4.7:
/// broadcast `ABORT`, join workers, clear registries.
pub struct Orchestrator {
    handle: OrchestratorHandle,
    worker_handles: Vec<JoinHandle<u64>>,
    worker_count: usize,
}

impl Orchestrator {
    /// Construct a provider, a request transport, and `config.worker_count`
    /// worker tasks — the portion of §4.7's construction order this crate
    /// owns (tick-store adapter and bin-declaration parsing are the
    /// caller's job; the wire session, SNMP agent, and command surface are
    /// out of scope entirely).
    pub fn start(
        config: &ServerConfig,
        tick_store: Arc<dyn mdp_core::TickStoreAdapter>,
        sink: Arc<dyn WireSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let default_bin = config.default_bin_decl()?;
        let fid_table = config.default_fid_table()?;
        let history_table_size = config.cool.as_ref().map(|c| c.history_table_size).unwrap_or(64);

        let provider = Arc::new(Provider::new(
            config.service_name.clone(),
            config.session_capacity,
            sink,
        ));
        let (tx, rx) = transport::channel();
        let cool = Arc::new(Mutex::new(mdp_core::CoolRegistry::new(history_table_size)));

        if let Some(cool_cfg) = &config.cool {
            let now = chrono::Utc::now();
            let mut registry = cool.lock();
            for name in &cool_cfg.registered_names {
                registry.register(name.clone(), now);
            }
        }

        let worker_config = WorkerConfig {
            default_bin,
            fid_table,
            tick_store,
            provider: provider.clone(),
            maximum_data_size: config.maximum_data_size,
        };

        let mut worker_handles = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            let rx = rx.clone();
            let worker_config = worker_config.clone();
            worker_handles.push(tokio::spawn(worker::run(id, rx, worker_config)));
        }
        info!("orchestrator started {} worker(s)", config.worker_count);

        Ok(Self {
            handle: OrchestratorHandle {
                provider,
                transport: tx,
                cool,
                token: CancellationToken::new(),
            },
            worker_handles,
            worker_count: config.worker_count,
        })
    }

    pub fn handle(&self) -> OrchestratorHandle {
        self.handle.clone()
    }

    /// Reverse-order teardown (§4.7): signal shutdown, enqueue one `ABORT`
    /// per worker, join every worker task, then clear the client and
    /// request registries. Idempotent with respect to the registries (a
    /// second call just finds them already empty).
    pub async fn shutdown(mut self) {
        self.handle.token.cancel();
        for _ in 0..self.worker_count {
            let _ = self.handle.transport.enqueue_abort();
        }
        for handle in self.worker_handles.drain(..) {
            if let Err(e) = handle.await {
                error!("worker task panicked during shutdown: {e}");
            }
        }
        self.handle.provider.clear();
        info!("orchestrator shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BinDeclConfig, FidTableConfig};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct NoopSink;
    impl WireSink for NoopSink {
        fn send(&self, _session: u64, _message: crate::wire::WireOutbound) {}
    }

    struct FakeStore;
    impl mdp_core::TickStoreAdapter for FakeStore {
        fn is_business_day(&self, _date: chrono::NaiveDate) -> bool {
            true
        }
        fn symbol_exists(&self, _symbol: &str) -> bool {
            true
        }
        fn symbol_handle(&self, _symbol: &str) -> Option<mdp_types::SymbolHandle> {
            Some(mdp_types::SymbolHandle(1))
        }
        fn for_each_trade(
            &self,
            _symbol: mdp_types::SymbolHandle,
            _from: i64,
            _to: i64,
            _callback: &mut dyn FnMut(mdp_types::Trade),
        ) {
        }
    }

    fn config(worker_count: usize) -> ServerConfig {
        ServerConfig {
            service_name: "MDP".into(),
            session_name: "mdp-session".into(),
            connection_name: "mdp-connection".into(),
            publisher_name: "mdp-publisher".into(),
            rssl_servers: vec![],
            default_port: 14002,
            maximum_data_size: 4096,
            session_capacity: 10,
            worker_count,
            symbol_map: vec!["IBM.N".into()],
            tz: "America/New_York".into(),
            default_day_count: 1,
            bins: HashMap::from([(
                "open30".into(),
                BinDeclConfig {
                    start_time: "09:00".into(),
                    end_time: "09:30".into(),
                },
            )]),
            default_bin_name: "open30".into(),
            realtime_fids: HashMap::from([(
                "open30".into(),
                FidTableConfig {
                    timact: 1,
                    activ_date: 2,
                    vma: 3,
                    nzero_vma: 4,
                    num_moves: 5,
                    nm_high: 6,
                    nm_low: 7,
                    nm_small: 8,
                    pctchg_10d: 9,
                    pctchg_15d: 10,
                    pctchg_20d: 11,
                    pctchg_10t: 12,
                    pctchg_15t: 13,
                    pctchg_20t: 14,
                },
            )]),
            archive_fids: None,
            cool: None,
        }
    }

    #[tokio::test]
    async fn starts_workers_and_shuts_down_cleanly() {
        let orchestrator = Orchestrator::start(&config(3), Arc::new(FakeStore), Arc::new(NoopSink)).unwrap();
        let handle = orchestrator.handle();
        assert!(!handle.is_shutting_down());
        orchestrator.shutdown().await;
        assert!(handle.is_shutting_down());
        assert!(handle.provider().clients().read().is_empty());
    }

    #[tokio::test]
    async fn serves_a_snapshot_end_to_end_through_the_orchestrator() {
        let sent: Arc<StdMutex<Vec<(u64, crate::wire::WireOutbound)>>> = Arc::new(StdMutex::new(Vec::new()));

        struct RecordingSink(Arc<StdMutex<Vec<(u64, crate::wire::WireOutbound)>>>);
        impl WireSink for RecordingSink {
            fn send(&self, session: u64, message: crate::wire::WireOutbound) {
                self.0.lock().unwrap().push((session, message));
            }
        }

        let orchestrator = Orchestrator::start(&config(1), Arc::new(FakeStore), Arc::new(RecordingSink(sent.clone()))).unwrap();
        let handle = orchestrator.handle();

        let crate::provider::AcceptOutcome::Accepted(session_handle) = handle.provider().accept("127.0.0.1:1", 14, 1) else {
            panic!()
        };
        let session = handle.provider().clients().read().get(session_handle).unwrap();
        handle
            .provider()
            .requests()
            .write()
            .insert(mdp_types::RequestToken(1), std::sync::Arc::downgrade(&session));
        handle
            .transport()
            .enqueue_snapshot(&mdp_types::Request::snapshot(
                mdp_types::RequestToken(1),
                1,
                mdp_types::ModelType::MarketPrice,
                "IBM.N?days=1",
                14,
                1,
            ))
            .unwrap();

        // give the worker a moment to drain the queue before shutdown flushes ABORT.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        orchestrator.shutdown().await;

        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
