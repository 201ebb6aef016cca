use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("electrobot.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("electrobot.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("electrobot.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("electrobot.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("electrobot.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("electrobot.stream.bytes");

pub(crate) static SESSIONS_CREATED: Counter = Counter::new("electrobot.session.created");
pub(crate) static SESSION_ERRORS: Counter = Counter::new("electrobot.session.errors");

pub(crate) static TURNS_STARTED: Counter = Counter::new("electrobot.turn.started");
pub(crate) static TURNS_COMPLETED: Counter = Counter::new("electrobot.turn.completed");
pub(crate) static TURNS_FAILED: Counter = Counter::new("electrobot.turn.failed");
pub(crate) static TURNS_IGNORED: Counter = Counter::new("electrobot.turn.ignored");
pub(crate) static TURN_CHUNKS: Counter = Counter::new("electrobot.turn.chunks");
pub(crate) static TURN_DURATION: Moments = Moments::new("electrobot.turn.duration_seconds");
pub(crate) static TURN_FIRST_CHUNK: Moments =
    Moments::new("electrobot.turn.first_chunk_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&SESSION_ERRORS);

    collector.register_counter(&TURNS_STARTED);
    collector.register_counter(&TURNS_COMPLETED);
    collector.register_counter(&TURNS_FAILED);
    collector.register_counter(&TURNS_IGNORED);
    collector.register_counter(&TURN_CHUNKS);
    collector.register_moments(&TURN_DURATION);
    collector.register_moments(&TURN_FIRST_CHUNK);
}
