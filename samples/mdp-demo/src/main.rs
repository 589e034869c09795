//! Runnable demo: wires an in-memory tick store and an in-process wire stub
//! to the `mdp-core`/`mdp-server` library crates, accepts one client
//! session, logs in, and requests a snapshot for a seeded symbol.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mdp_core::CoolRegistry;
use mdp_demo::tick_store::InMemoryTickStore;
use mdp_demo::wire_stub::RecordingWireStub;
use mdp_server::config::{BinDeclConfig, FidTableConfig};
use mdp_server::handlers::{
    on_solicited_item_event, AttribInfo, InteractionFlags, ItemRequest, LoginRequest, NameType,
    SessionContext, SolicitedItemEvent,
};
use mdp_server::provider::AcceptOutcome;
use mdp_server::{Orchestrator, ServerConfig};
use mdp_types::{ModelType, RequestToken, Trade};
use parking_lot::Mutex;

fn demo_config() -> ServerConfig {
    ServerConfig {
        service_name: "MDP".into(),
        session_name: "mdp-demo-session".into(),
        connection_name: "mdp-demo-connection".into(),
        publisher_name: "mdp-demo-publisher".into(),
        rssl_servers: vec!["localhost:14002".into()],
        default_port: 14002,
        maximum_data_size: 65536,
        session_capacity: 100,
        worker_count: 2,
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
                timact: 1010,
                activ_date: 17,
                vma: 30001,
                nzero_vma: 30002,
                num_moves: 30003,
                nm_high: 30004,
                nm_low: 30005,
                nm_small: 30006,
                pctchg_10d: 30007,
                pctchg_15d: 30008,
                pctchg_20d: 30009,
                pctchg_10t: 30010,
                pctchg_15t: 30011,
                pctchg_20t: 30012,
            },
        )]),
        archive_fids: None,
        cool: None,
    }
}

fn seed_trades(store: &InMemoryTickStore) {
    let monday = Utc::now().date_naive();
    let base = monday
        .and_hms_opt(9, 5, 0)
        .unwrap()
        .and_local_timezone(chrono_tz::America::New_York)
        .single()
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| Utc::now().timestamp());

    for (i, price) in [100.0, 101.0, 102.5].into_iter().enumerate() {
        store.record_trade(
            "IBM.N",
            base + (i as i64) * 60,
            Trade {
                last_price: price,
                tick_volume: (i as u64 + 1) * 10,
            },
        );
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = demo_config();
    let tick_store = Arc::new(InMemoryTickStore::new());
    seed_trades(&tick_store);
    let sink = Arc::new(RecordingWireStub::new());

    let orchestrator = Orchestrator::start(&config, tick_store.clone(), sink.clone()).expect("valid demo config");
    let handle = orchestrator.handle();

    let AcceptOutcome::Accepted(session_handle) = handle.provider().accept("127.0.0.1:9001", 14, 1) else {
        panic!("demo provider rejected the only connection it will ever see");
    };
    let session = handle.provider().clients().read().get(session_handle).unwrap();

    let cool = Mutex::new(CoolRegistry::new(64));
    let ctx = SessionContext {
        provider: handle.provider(),
        session: &session,
        transport: handle.transport(),
        tick_store: tick_store.as_ref(),
        cool: &cool,
        now: Utc::now(),
    };

    on_solicited_item_event(
        &ctx,
        SolicitedItemEvent::Login(LoginRequest {
            token: RequestToken(1),
            interaction: InteractionFlags::STREAMING,
            attrib: Some(AttribInfo {
                name: "demo-user".into(),
                name_type: NameType::UserName,
            }),
        }),
    );

    on_solicited_item_event(
        &ctx,
        SolicitedItemEvent::Item(ItemRequest {
            token: RequestToken(2),
            interaction: InteractionFlags::INITIAL_IMAGE,
            model_type: ModelType::MarketPrice,
            service_name: Some("MDP".into()),
            service_id: 1,
            item_name: "IBM.N?days=1".into(),
        }),
    );

    // Give the worker pool a moment to drain the one enqueued snapshot
    // before tearing down.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    for delivery in sink.deliveries() {
        log::info!("session {} received {:?}", delivery.session, delivery.message);
    }

    orchestrator.shutdown().await;
}
