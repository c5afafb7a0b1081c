//! Chaining and context extraction through the public API.

use ctx_log_bridge::capture::CaptureSink;
use ctx_log_bridge::context::{
    extract_fields, session_keys, PropagatedContext, PEER_ID_KEY, SESSION_DATA_KEY,
    SESSION_UID_KEY,
};
use ctx_log_bridge::{Attach, ContextLogger, Level, Logger, RequestContext, Session};
use serde_json::Value;
use std::sync::Arc;
use std::thread;

fn capture() -> (ContextLogger, CaptureSink) {
    let sink = CaptureSink::new();
    let logger = Logger::new(Arc::new(sink.clone()), Level::Debug);
    (ContextLogger::new(logger), sink)
}

/// A host-side session backed by the game's own player record.
struct PlayerSession {
    player_id: u64,
    region: u32,
}

impl Session for PlayerSession {
    fn uid(&self) -> String {
        format!("u-{}", self.player_id)
    }

    fn get(&self, key: &str) -> Option<Value> {
        (key == session_keys::REGION_ID).then(|| Value::from(self.region))
    }
}

/// A host-side context that is not a `RequestContext`.
struct FrameworkCtx {
    peer: &'static str,
    session: Option<PlayerSession>,
}

impl PropagatedContext for FrameworkCtx {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            PEER_ID_KEY => Some(Value::from(self.peer)),
            SESSION_UID_KEY => Some(Value::from("stale-uid")),
            _ => None,
        }
    }

    fn session(&self) -> Option<&dyn Session> {
        self.session.as_ref().map(|s| s as &dyn Session)
    }
}

#[test]
fn shared_handles_work_through_the_opaque_path() {
    let (log, sink) = capture();
    let ctx: Arc<dyn PropagatedContext + Send + Sync> = Arc::new(RequestContext::new()
        .with_value(PEER_ID_KEY, "conn-1"));

    log.attach(Attach::opaque(&ctx)).info(&[&"shared handle"]);
    let record = sink.last().unwrap();
    assert_eq!(record.field(PEER_ID_KEY), Some(&Value::from("conn-1")));
}

#[test]
fn host_context_attaches_like_direct_extraction() {
    let (log, sink) = capture();
    let ctx = FrameworkCtx {
        peer: "conn-1",
        session: Some(PlayerSession {
            player_id: 7,
            region: 2,
        }),
    };
    let expected = extract_fields(&ctx);

    log.attach(Attach::context(&ctx)).info(&[&"single"]);
    log.attach_many([Attach::context(&ctx), Attach::field("room", "lobby")])
        .info(&[&"batch"]);
    log.attach(Attach::context(&&ctx)).info(&[&"by reference"]);
    let shared = Arc::new(ctx);
    log.attach(Attach::context(&shared)).info(&[&"shared"]);

    let records = sink.records();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].fields, expected);
    assert_eq!(records[1].fields[..expected.len()], expected[..]);
    assert_eq!(records[1].field("room"), Some(&Value::from("lobby")));
    assert_eq!(records[2].fields, expected);
    assert_eq!(records[3].fields, expected);
    assert_eq!(records[0].field(SESSION_UID_KEY), Some(&Value::from("u-7")));
}

#[test]
fn typed_context_prefers_session_uid() {
    let (log, sink) = capture();
    let ctx = FrameworkCtx {
        peer: "conn-9",
        session: Some(PlayerSession {
            player_id: 42,
            region: 7,
        }),
    };

    log.with_context(&ctx).warnf(format_args!("slow tick"));

    let record = sink.last().unwrap();
    assert_eq!(record.fields, extract_fields(&ctx));
    assert_eq!(record.field(SESSION_UID_KEY), Some(&Value::from("u-42")));
    assert_eq!(
        record.field(SESSION_DATA_KEY).map(|d| d[session_keys::REGION_ID].clone()),
        Some(Value::from("7"))
    );
}

#[test]
fn typed_context_without_session_falls_back() {
    let (log, sink) = capture();
    let ctx = FrameworkCtx {
        peer: "conn-9",
        session: None,
    };

    log.with_context(&ctx).info(&[&"no session"]);
    assert_eq!(
        sink.last().unwrap().field(SESSION_UID_KEY),
        Some(&Value::from("stale-uid"))
    );
}

#[test]
fn concurrent_derivations_do_not_interfere() {
    let (base, sink) = capture();
    let base = base.with_field("service", "battle");

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let base = base.clone();
            thread::spawn(move || base.with_field("worker", i).info(&[&"tick"]))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    base.info(&[&"base"]);

    let records = sink.records();
    assert_eq!(records.len(), 5);
    for record in &records[..4] {
        assert_eq!(record.fields.len(), 2);
    }
    let last = records.last().unwrap();
    assert_eq!(last.fields.len(), 1);
    assert_eq!(last.field("worker"), None);
}
