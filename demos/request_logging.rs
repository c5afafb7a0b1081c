use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ctx_log_bridge::context::{
    session_keys, PEER_ID_KEY, PEER_SERVICE_KEY, REQUEST_ID_KEY, ROUTE_KEY, START_TIME_KEY,
};
use ctx_log_bridge::layer::install_tracing_bridge;
use ctx_log_bridge::{init_global, Attach, LoggerConfig, RequestContext, StaticSession};

fn main() {
    let config = LoggerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("bad logging environment ({}), using defaults", e);
        LoggerConfig::default()
    });
    let log = init_global(&config);

    // Route `tracing` events from libraries through the same logger.
    if let Err(e) = install_tracing_bridge(log.inner().clone()) {
        eprintln!("tracing bridge not installed: {}", e);
    }

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let session = StaticSession::new("u-42")
        .with_data(session_keys::REGION_ID, "eu-1")
        .with_data(session_keys::APP, "arena");
    let ctx = RequestContext::new()
        .with_value(PEER_ID_KEY, "connector-1")
        .with_value(PEER_SERVICE_KEY, "connector")
        .with_value(ROUTE_KEY, "room.room.join")
        .with_value(REQUEST_ID_KEY, "7f7c1f7e")
        .with_value(START_TIME_KEY, started)
        .with_session(Arc::new(session));

    let req_log = log.attach_many([Attach::context(&ctx), Attach::field("room", "lobby-3")]);
    req_log.info(&[&"player joined room"]);
    req_log.debugf(format_args!("{} players waiting", 4));
    req_log
        .with_error(&std::io::Error::new(std::io::ErrorKind::TimedOut, "match server timeout"))
        .errorln(&[&"failed to start match for room", &"lobby-3"]);

    tracing::warn!(queue = "matchmaking", depth = 120, "queue is backing up");

    ctx_log_bridge::close();
}
