use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("cgpt.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("cgpt.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("cgpt.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("cgpt.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("cgpt.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("cgpt.stream.bytes");
pub(crate) static STREAM_DURATION: Moments = Moments::new("cgpt.stream.duration_seconds");

pub(crate) static STORE_READS: Counter = Counter::new("cgpt.store.reads");
pub(crate) static STORE_WRITES: Counter = Counter::new("cgpt.store.writes");
pub(crate) static STORE_ERRORS: Counter = Counter::new("cgpt.store.errors");

pub(crate) static CHAT_TURNS: Counter = Counter::new("cgpt.chat.turns");
pub(crate) static CHAT_RESETS: Counter = Counter::new("cgpt.chat.resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&STORE_READS);
    collector.register_counter(&STORE_WRITES);
    collector.register_counter(&STORE_ERRORS);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_RESETS);
}
