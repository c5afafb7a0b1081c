//! Request-context propagation boundary and field extraction.
//!
//! The host framework owns the real propagation mechanism; this module
//! only needs two things from it: a key lookup over the propagated values
//! and, optionally, the session attached to the request. Hosts implement
//! [`PropagatedContext`] for their own carrier or use [`RequestContext`].
//!
//! [`extract_fields`] turns a context into the fixed list of fields every
//! request-scoped log line carries:
//!
//! | key              | source                                             |
//! |------------------|----------------------------------------------------|
//! | `peer.id`        | context                                            |
//! | `req-route`      | context                                            |
//! | `peer.service`   | context                                            |
//! | `request.id`     | context                                            |
//! | `req-start-time` | context                                            |
//! | `session_uid`    | attached session's uid, else context               |
//! | `session_data`   | [`SessionData`], each member session first, then context |
//!
//! Keys are always present; a missing value is logged as `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::record::Field;

pub const PEER_ID_KEY: &str = "peer.id";
pub const ROUTE_KEY: &str = "req-route";
pub const PEER_SERVICE_KEY: &str = "peer.service";
pub const REQUEST_ID_KEY: &str = "request.id";
pub const START_TIME_KEY: &str = "req-start-time";
pub const SESSION_UID_KEY: &str = "session_uid";
pub const SESSION_DATA_KEY: &str = "session_data";

/// Keys copied straight from the context, in emission order.
const PROPAGATED_KEYS: [&str; 5] = [
    PEER_ID_KEY,
    ROUTE_KEY,
    PEER_SERVICE_KEY,
    REQUEST_ID_KEY,
    START_TIME_KEY,
];

/// Number of fields [`extract_fields`] always yields.
pub const CONTEXT_FIELD_COUNT: usize = PROPAGATED_KEYS.len() + 2;

/// Keys of the custom per-session data a game server stores on the
/// session or propagates with the request.
pub mod session_keys {
    pub const UUID: &str = "uuid";
    pub const USER_IP: &str = "userIP";
    pub const USER_ID: &str = "userID";
    pub const REGION_ID: &str = "regionID";
    pub const PACKAGE_ID: &str = "packageID";
    pub const RES_VERSION: &str = "resVersion";
    pub const PACKAGE_VERSION: &str = "packageVersion";
    pub const GAME_NODE_ID: &str = "gameNodeID";
    pub const CHANNEL: &str = "channel";
    pub const APP: &str = "app";
}

/// Read access to the values a host framework propagates along a call
/// chain.
pub trait PropagatedContext {
    /// Value stored under `key`, if the context carries one.
    fn get(&self, key: &str) -> Option<Value>;

    /// Session attached to the request, if any.
    fn session(&self) -> Option<&dyn Session> {
        None
    }
}

impl<T: PropagatedContext + ?Sized> PropagatedContext for &T {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn session(&self) -> Option<&dyn Session> {
        (**self).session()
    }
}

impl<T: PropagatedContext + ?Sized> PropagatedContext for Box<T> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn session(&self) -> Option<&dyn Session> {
        (**self).session()
    }
}

impl<T: PropagatedContext + ?Sized> PropagatedContext for Arc<T> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn session(&self) -> Option<&dyn Session> {
        (**self).session()
    }
}

/// Per-connection session reachable from a context.
pub trait Session {
    /// Stable user identifier bound to the session.
    fn uid(&self) -> String;

    /// Custom data stored on the session.
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }
}

/// Map-backed [`PropagatedContext`] for hosts without a richer carrier.
#[derive(Clone, Default)]
pub struct RequestContext {
    values: HashMap<String, Value>,
    session: Option<Arc<dyn Session + Send + Sync>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_session(mut self, session: Arc<dyn Session + Send + Sync>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }
}

impl PropagatedContext for RequestContext {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn session(&self) -> Option<&dyn Session> {
        self.session.as_deref().map(|s| s as &dyn Session)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("values", &self.values)
            .field("session_uid", &self.session.as_ref().map(|s| s.uid()))
            .finish()
    }
}

/// Simple in-memory session, mostly useful for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    uid: String,
    data: HashMap<String, Value>,
}

impl StaticSession {
    pub fn new(uid: impl Into<String>) -> Self {
        StaticSession {
            uid: uid.into(),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl Session for StaticSession {
    fn uid(&self) -> String {
        self.uid.clone()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.data.get(key).cloned()
    }
}

/// Custom session data reported under [`SESSION_DATA_KEY`].
///
/// Every member is serialized, as `null` when unknown, so all request
/// records share one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(rename = "uuid")]
    pub uuid: Option<String>,
    #[serde(rename = "userIP")]
    pub user_ip: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    #[serde(rename = "regionID")]
    pub region_id: Option<String>,
    #[serde(rename = "packageID")]
    pub package_id: Option<String>,
    #[serde(rename = "resVersion")]
    pub res_version: Option<String>,
    #[serde(rename = "packageVersion")]
    pub package_version: Option<String>,
    #[serde(rename = "gameNodeID")]
    pub game_node_id: Option<String>,
    #[serde(rename = "channel")]
    pub channel: Option<String>,
    #[serde(rename = "app")]
    pub app: Option<String>,
}

impl SessionData {
    /// Collect session data, preferring the attached session over the
    /// context for each member.
    pub fn from_context(ctx: &dyn PropagatedContext) -> Self {
        let session = ctx.session();
        let read = |key: &str| {
            session
                .and_then(|s| s.get(key))
                .filter(|v| !v.is_null())
                .or_else(|| ctx.get(key))
                .and_then(value_to_string)
        };

        SessionData {
            uuid: read(session_keys::UUID),
            user_ip: read(session_keys::USER_IP),
            user_id: read(session_keys::USER_ID),
            region_id: read(session_keys::REGION_ID),
            package_id: read(session_keys::PACKAGE_ID),
            res_version: read(session_keys::RES_VERSION),
            package_version: read(session_keys::PACKAGE_VERSION),
            game_node_id: read(session_keys::GAME_NODE_ID),
            channel: read(session_keys::CHANNEL),
            app: read(session_keys::APP),
        }
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Map a context to the fixed, ordered list of request fields.
///
/// Always returns [`CONTEXT_FIELD_COUNT`] fields in the same order; the
/// context is only read.
pub fn extract_fields(ctx: &dyn PropagatedContext) -> Vec<Field> {
    let mut fields = Vec::with_capacity(CONTEXT_FIELD_COUNT);

    for key in PROPAGATED_KEYS {
        fields.push(Field::new(key, ctx.get(key).unwrap_or(Value::Null)));
    }

    let uid = match ctx.session() {
        Some(session) => Value::from(session.uid()),
        None => ctx.get(SESSION_UID_KEY).unwrap_or(Value::Null),
    };
    fields.push(Field::new(SESSION_UID_KEY, uid));

    let data = serde_json::to_value(SessionData::from_context(ctx)).unwrap_or(Value::Null);
    fields.push(Field::new(SESSION_DATA_KEY, data));

    fields
}

/// Recognise an opaque value as a context.
///
/// Accepted carriers are [`RequestContext`], `Arc<RequestContext>` and
/// boxed or shared `dyn PropagatedContext + Send + Sync`. Anything else
/// is not a context and yields `None`.
pub fn as_context(value: &dyn Any) -> Option<&dyn PropagatedContext> {
    if let Some(ctx) = value.downcast_ref::<RequestContext>() {
        return Some(ctx);
    }
    if let Some(ctx) = value.downcast_ref::<Arc<RequestContext>>() {
        return Some(ctx.as_ref());
    }
    if let Some(ctx) = value.downcast_ref::<Arc<dyn PropagatedContext + Send + Sync>>() {
        return Some(ctx.as_ref());
    }
    if let Some(ctx) = value.downcast_ref::<Box<dyn PropagatedContext + Send + Sync>>() {
        return Some(ctx.as_ref());
    }
    None
}
