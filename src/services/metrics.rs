//! Prometheus counters, exported through GET /metrics

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Playlists stored, labelled by source (upload / xtream)
    pub static ref PLAYLISTS_CREATED: IntCounterVec = register_int_counter_vec!(
        "xstream_playlists_created_total",
        "Playlists stored, by source",
        &["source"]
    )
    .unwrap();

    /// Channels produced by the M3U parser
    pub static ref CHANNELS_PARSED: IntCounter = register_int_counter!(
        "xstream_channels_parsed_total",
        "Channels produced by the M3U parser"
    )
    .unwrap();
}

pub fn record_playlist(source: &str, channel_count: usize) {
    PLAYLISTS_CREATED.with_label_values(&[source]).inc();
    CHANNELS_PARSED.inc_by(channel_count as u64);
}
