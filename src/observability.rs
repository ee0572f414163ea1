use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("inventio.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("inventio.client.request_errors");
pub(crate) static CLIENT_CANCEL_NOTIFICATIONS: Counter =
    Counter::new("inventio.client.cancel_notifications");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("inventio.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("inventio.stream.errors");

pub(crate) static RUN_RETRIES: Counter = Counter::new("inventio.run.retries");
pub(crate) static RUN_COMPLETIONS: Counter = Counter::new("inventio.run.completions");
pub(crate) static RUN_FAILURES: Counter = Counter::new("inventio.run.failures");
pub(crate) static RUN_CANCELLATIONS: Counter = Counter::new("inventio.run.cancellations");
pub(crate) static RUN_RETRY_BACKOFF: Moments =
    Moments::new("inventio.run.retry_backoff_seconds");

pub(crate) static TRANSFORMS: Counter = Counter::new("inventio.transform.requests");
pub(crate) static TRANSFORM_ROLLBACKS: Counter = Counter::new("inventio.transform.rollbacks");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_CANCEL_NOTIFICATIONS);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);

    collector.register_counter(&RUN_RETRIES);
    collector.register_counter(&RUN_COMPLETIONS);
    collector.register_counter(&RUN_FAILURES);
    collector.register_counter(&RUN_CANCELLATIONS);
    collector.register_moments(&RUN_RETRY_BACKOFF);

    collector.register_counter(&TRANSFORMS);
    collector.register_counter(&TRANSFORM_ROLLBACKS);
}
