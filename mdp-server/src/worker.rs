//! The worker pool (§4.3): each worker owns a receive endpoint on the
//! request transport, a pre-sized field-encoding scratch buffer, and a
//! per-worker tick-store view handle. Loop: wait, parse, compute, encode,
//! submit; `ABORT` exits the loop; any other error is logged, counted, and
//! the loop continues — the request simply goes unanswered (§9).

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use log::{error, warn};
use mdp_types::{BinDecl, FidTable, ModelType, Request, RequestKind};

use crate::config::MAX_OFFSET_AND_DAYS;
use crate::errors::DispatchError;
use crate::provider::Provider;
use crate::transport::RequestReceiver;
use crate::wire::WireOutbound;

/// Shared, read-only configuration every worker needs to turn a decoded
/// [`Request`] into a response. Cloned cheaply (an `Arc` of each field)
/// across workers.
#[derive(Clone)]
pub struct WorkerConfig {
    pub default_bin: BinDecl,
    pub fid_table: FidTable,
    pub tick_store: Arc<dyn mdp_core::TickStoreAdapter>,
    pub provider: Arc<Provider>,
    /// Size of the pre-sized field-encoding scratch buffer (§4.3). The
    /// typed `FieldEntry` encoding in this crate doesn't need a byte
    /// buffer, but the capacity is still reserved per worker so the shape
    /// of the original design (one fixed allocation per worker, reused
    /// across requests) survives the rewrite.
    pub maximum_data_size: usize,
}

/// Runs one worker's `{receive → compute → submit}` loop until it reads
/// `ABORT` or the transport closes. Returns the count of requests it
/// serviced, mainly so tests can assert on throughput.
pub async fn run(worker_id: usize, receiver: RequestReceiver, config: WorkerConfig) -> u64 {
    let mut scratch: Vec<u8> = Vec::with_capacity(config.maximum_data_size);
    let mut served = 0u64;

    loop {
        let request = match receiver.recv().await {
            None => {
                warn!("worker {worker_id}: transport closed, exiting");
                break;
            }
            Some(Err(e)) => {
                error!("worker {worker_id}: failed to decode envelope: {e}");
                continue;
            }
            Some(Ok(request)) => request,
        };

        if matches!(request.kind, RequestKind::Abort) {
            warn!("worker {worker_id}: received ABORT, exiting");
            break;
        }

        scratch.clear();
        match serve(&config, &request) {
            Ok(outbound) => {
                config.provider.send_reply(request.request_token, outbound);
                served += 1;
            }
            Err(e) => {
                error!(
                    "worker {worker_id}: dispatch error for token {:?}: {e}",
                    request.request_token
                );
                // §9: a production rewrite should close with InternalError
                // here; this rewrite intentionally leaves the request
                // unanswered, matching the documented limitation.
            }
        }
    }

    served
}

fn serve(config: &WorkerConfig, request: &Request) -> Result<WireOutbound, DispatchError> {
    if !matches!(request.model_type, ModelType::MarketPrice) {
        return Err(DispatchError::UnsupportedModelType);
    }

    let parsed = mdp_core::parse_item_name(
        &request.item_name,
        &config.default_bin,
        None,
        MAX_OFFSET_AND_DAYS,
    );

    let symbol_handle = config
        .tick_store
        .symbol_handle(&parsed.symbol)
        .ok_or_else(|| DispatchError::UnknownSymbol(parsed.symbol.clone()))?;

    let today = today_in_tz(parsed.bin_decl.timezone())?;
    let result = mdp_core::compute(
        config.tick_store.as_ref(),
        symbol_handle,
        &parsed.bin_decl,
        parsed.day_offset,
        today,
    )?;

    let fields = config.fid_table.encode(&result);
    Ok(WireOutbound::Snapshot {
        token: request.request_token,
        fields,
    })
}

fn today_in_tz(tz_name: &str) -> Result<chrono::NaiveDate, DispatchError> {
    let tz = chrono_tz::Tz::from_str(tz_name)
        .map_err(|_| DispatchError::Engine(mdp_core::CoreError::UnknownTimeZone(tz_name.to_string())))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel;
    use crate::wire::WireSink;
    use chrono::NaiveTime;
    use mdp_types::{RequestToken, SymbolHandle, Trade};
    use std::sync::Mutex;

    struct NoopSink;
    impl WireSink for NoopSink {
        fn send(&self, _session: u64, _message: WireOutbound) {}
    }

    struct FakeStore;
    impl mdp_core::TickStoreAdapter for FakeStore {
        fn is_business_day(&self, date: chrono::NaiveDate) -> bool {
            use chrono::Datelike;
            !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
        }
        fn symbol_exists(&self, symbol: &str) -> bool {
            symbol == "IBM.N"
        }
        fn symbol_handle(&self, symbol: &str) -> Option<SymbolHandle> {
            (symbol == "IBM.N").then_some(SymbolHandle(1))
        }
        fn for_each_trade(
            &self,
            _symbol: SymbolHandle,
            _from: i64,
            _to: i64,
            _callback: &mut dyn FnMut(Trade),
        ) {
        }
    }

    fn config() -> WorkerConfig {
        let bin = BinDecl::new(
            "open30",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            "America/New_York",
            1,
        )
        .unwrap();
        WorkerConfig {
            default_bin: bin,
            fid_table: FidTable {
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
            tick_store: Arc::new(FakeStore),
            provider: Arc::new(Provider::new("MDP", 10, Arc::new(NoopSink))),
            maximum_data_size: 4096,
        }
    }

    #[test]
    fn unknown_symbol_is_a_dispatch_error() {
        let cfg = config();
        let req = Request::snapshot(RequestToken(1), 1, ModelType::MarketPrice, "BOGUS", 1, 1);
        assert!(matches!(serve(&cfg, &req), Err(DispatchError::UnknownSymbol(_))));
    }

    #[test]
    fn unsupported_model_type_is_a_dispatch_error() {
        let cfg = config();
        let req = Request::snapshot(RequestToken(1), 1, ModelType::Directory, "IBM.N", 1, 1);
        assert!(matches!(serve(&cfg, &req), Err(DispatchError::UnsupportedModelType)));
    }

    #[test]
    fn known_symbol_produces_a_snapshot() {
        let cfg = config();
        let req = Request::snapshot(RequestToken(1), 1, ModelType::MarketPrice, "IBM.N?days=1", 1, 1);
        let outbound = serve(&cfg, &req).unwrap();
        assert!(matches!(outbound, WireOutbound::Snapshot { .. }));
    }

    #[tokio::test]
    async fn abort_stops_the_worker_loop() {
        let (tx, rx) = channel();
        tx.enqueue_abort().unwrap();
        let served = run(0, rx, config()).await;
        assert_eq!(served, 0);
    }

    #[tokio::test]
    async fn closing_the_transport_stops_the_worker_loop() {
        let (tx, rx) = channel();
        drop(tx);
        let served = run(0, rx, config()).await;
        assert_eq!(served, 0);
    }

    #[tokio::test]
    async fn serves_a_snapshot_end_to_end() {
        let (tx, rx) = channel();
        let cfg = config();
        let session_sink_calls: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

        struct RecordingSink(Arc<Mutex<Vec<u64>>>);
        impl WireSink for RecordingSink {
            fn send(&self, session: u64, _message: WireOutbound) {
                self.0.lock().unwrap().push(session);
            }
        }

        let provider = Arc::new(Provider::new("MDP", 10, Arc::new(RecordingSink(session_sink_calls.clone()))));
        let accepted = provider.accept("127.0.0.1:1", 14, 1);
        let crate::provider::AcceptOutcome::Accepted(handle) = accepted else {
            panic!()
        };
        let session = provider.clients().read().get(handle).unwrap();
        provider
            .requests()
            .write()
            .insert(RequestToken(1), Arc::downgrade(&session));

        let mut cfg = cfg;
        cfg.provider = provider.clone();

        tx.enqueue_snapshot(&Request::snapshot(RequestToken(1), 1, ModelType::MarketPrice, "IBM.N?days=1", 1, 1))
            .unwrap();
        tx.enqueue_abort().unwrap();

        let served = run(0, rx, cfg).await;
        assert_eq!(served, 1);
        assert_eq!(session_sink_calls.lock().unwrap().len(), 1);
        assert!(provider.requests().read().is_empty());
    }
}
