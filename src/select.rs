//! Target selection over a port-graph snapshot
//!
//! Pure functions only; every selection re-runs from scratch on each
//! reconciliation cycle. Results keep graph (listing) order unless a
//! preference rule says otherwise.

use std::collections::HashSet;

use crate::graph::PortGraph;

/// Instrument MIDI input ports: name contains `match_text` (case-insensitive),
/// tagged `input`, MIDI-typed. An instrument may expose more than one.
pub fn instrument_midi_inputs<'a>(graph: &'a PortGraph, match_text: &str) -> Vec<&'a str> {
    let needle = match_text.to_lowercase();
    graph
        .ports()
        .filter(|port| {
            port.name.to_lowercase().contains(&needle)
                && port.has_property("input")
                && port.is_midi()
        })
        .map(|port| port.name.as_str())
        .collect()
}

/// External MIDI source ports: tagged `output`, MIDI-typed, and not owned by
/// any client in `exclude_clients` (lowercased names).
pub fn external_midi_sources<'a>(
    graph: &'a PortGraph,
    exclude_clients: &HashSet<String>,
) -> Vec<&'a str> {
    graph
        .ports()
        .filter(|port| {
            !exclude_clients.contains(&port.client().to_lowercase())
                && port.has_property("output")
                && port.is_midi()
        })
        .map(|port| port.name.as_str())
        .collect()
}

/// Stereo channel a port name maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Left,
    Right,
}

/// One name-substring rule for channel identification
#[derive(Debug, Clone)]
pub struct ChannelRule {
    needle: String,
    role: ChannelRole,
}

impl ChannelRule {
    pub fn new(needle: &str, role: ChannelRole) -> Self {
        Self {
            needle: needle.to_lowercase(),
            role,
        }
    }
}

/// The instrument convention this was built around: `outL` / `outR` suffixes
pub fn default_channel_rules() -> Vec<ChannelRule> {
    vec![
        ChannelRule::new("outl", ChannelRole::Left),
        ChannelRule::new("outr", ChannelRole::Right),
    ]
}

/// Instrument stereo audio-output pair, or `None` unless both sides are found.
///
/// Candidates are ports whose name contains `marker` (case-insensitive),
/// tagged `output`, audio-typed. The first port in graph order matching a
/// role's rule claims that role; a port matches at most one rule (first rule
/// wins). No partial pairing: a lone left or right yields `None`.
pub fn instrument_audio_outputs<'a>(
    graph: &'a PortGraph,
    marker: &str,
    rules: &[ChannelRule],
) -> Option<(&'a str, &'a str)> {
    let marker = marker.to_lowercase();
    let mut left = None;
    let mut right = None;
    for port in graph.ports() {
        let lower = port.name.to_lowercase();
        if !lower.contains(&marker) || !port.has_property("output") || !port.is_audio() {
            continue;
        }
        for rule in rules {
            if lower.contains(&rule.needle) {
                let slot = match rule.role {
                    ChannelRole::Left => &mut left,
                    ChannelRole::Right => &mut right,
                };
                if slot.is_none() {
                    *slot = Some(port.name.as_str());
                }
                break;
            }
        }
    }
    match (left, right) {
        (Some(left), Some(right)) => Some((left, right)),
        _ => None,
    }
}

/// First two physical audio playback ports, `playback_fl`/`playback_fr`
/// preferred in that order; otherwise the first two in graph order. `None`
/// with fewer than two candidates.
pub fn playback_targets(graph: &PortGraph) -> Option<(&str, &str)> {
    let playback: Vec<&str> = graph
        .ports()
        .filter(|port| {
            port.has_property("input") && port.has_property("physical") && port.is_audio()
        })
        .map(|port| port.name.as_str())
        .collect();

    let front_left = playback
        .iter()
        .copied()
        .find(|name| name.to_lowercase().contains("playback_fl"));
    let front_right = playback
        .iter()
        .copied()
        .find(|name| name.to_lowercase().contains("playback_fr"));
    if let (Some(left), Some(right)) = (front_left, front_right) {
        return Some((left, right));
    }

    match playback.as_slice() {
        [first, second, ..] => Some((first, second)),
        _ => None,
    }
}
