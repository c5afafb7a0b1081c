use crate::logger::Logger;
use crate::record::{Field, Level};
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Registry;

/// `tracing_subscriber` layer that writes `tracing` events through a
/// [`Logger`].
///
/// Libraries that log with the `tracing` macros then end up in the same
/// sinks, with the same JSON shape and the logger's accumulated fields,
/// as records written through [`crate::ContextLogger`]. `TRACE` events are
/// reported as `debug`.
pub struct SinkLayer {
    logger: Logger,
}

impl SinkLayer {
    pub fn new(logger: Logger) -> Self {
        SinkLayer { logger }
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Level::from(meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut fields = Vec::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        fields.push(Field::new("target", meta.target()));
        self.logger
            .with_fields(fields)
            .log(level, message.unwrap_or_default());
    }
}

/// Install [`SinkLayer`] over `logger` as the process-wide `tracing`
/// subscriber.
///
/// **Returns**
/// - `Err(..)` if another global subscriber was already set.
pub fn install_tracing_bridge(
    logger: Logger,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = Registry::default().with(SinkLayer::new(logger));
    tracing::subscriber::set_global_default(subscriber)
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Field>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.push(Field::new(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(Field::new(field.name(), value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(Field::new(field.name(), format!("{:?}", value)));
        }
    }
}
