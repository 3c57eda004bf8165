//! Runtime settings derived from CLI arguments and environment variables

use std::collections::HashSet;
use std::time::Duration;

use crate::select::{default_channel_rules, ChannelRule};

pub const DEFAULT_MATCH: &str = "setBfree";
pub const DEFAULT_EXCLUDE: &str = "System,Midi Through";

/// Everything the reconciler and event loop need to know
#[derive(Debug, Clone)]
pub struct Settings {
    /// Name match text identifying the instrument's ports
    pub instrument_match: String,
    /// Lowercased client names never used as MIDI sources
    pub exclude_clients: HashSet<String>,
    /// Minimum reconciliation cadence
    pub interval: Duration,
    /// Device-event poll timeout
    pub poll_timeout: Duration,
    /// Ordered left/right identification rules for the instrument's audio outputs
    pub channel_rules: Vec<ChannelRule>,
}

impl Settings {
    pub fn new(instrument_match: &str, exclude_raw: &str, interval_secs: u64) -> Self {
        Self {
            instrument_match: instrument_match.to_string(),
            exclude_clients: parse_exclude_list(exclude_raw),
            interval: Duration::from_secs(interval_secs),
            poll_timeout: Duration::from_secs(1),
            channel_rules: default_channel_rules(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH, DEFAULT_EXCLUDE, 1)
    }
}

/// Comma-separated client names, trimmed and lowercased; empty entries dropped
pub fn parse_exclude_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
        .collect()
}
