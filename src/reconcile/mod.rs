//! One reconciliation pass: snapshot, select, diff, connect
//!
//! Every cycle re-evaluates the whole graph from a fresh snapshot. The only
//! thing carried between cycles is [`ReconcileState`], and it is used solely
//! to report ports appearing and disappearing, never to suppress a connect.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::connections::{ConnectionQuery, Connections};
use crate::graph::{client_of, PortGraph};
use crate::jack::GraphBackend;
use crate::select;

#[cfg(test)]
mod tests;

/// Tracking state threaded through cycles, replaced wholesale each pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileState {
    /// Instrument MIDI input port names seen last cycle
    pub instrument_inputs: BTreeSet<String>,
    /// External MIDI source port names seen last cycle
    pub sources: BTreeSet<String>,
}

pub struct Reconciler {
    backend: Arc<dyn GraphBackend>,
    settings: Settings,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn GraphBackend>, settings: Settings) -> Self {
        Self { backend, settings }
    }

    /// Run one cycle; consumes the previous tracking state and returns the new
    /// one.
    ///
    /// A failed port query aborts the cycle with the previous state preserved:
    /// the listing being unobtainable usually means the audio stack is
    /// restarting, and treating that as "everything disappeared" would produce
    /// spurious transition reports.
    pub async fn run_cycle(&self, prev: ReconcileState) -> ReconcileState {
        let listing = match self.backend.list_ports().await {
            Ok(listing) => listing,
            Err(err) => {
                warn!("port listing failed, skipping cycle: {err}");
                return prev;
            }
        };
        let graph = PortGraph::parse(&listing);
        debug!("snapshot has {} ports", graph.len());

        let inputs = select::instrument_midi_inputs(&graph, &self.settings.instrument_match);
        if inputs.is_empty() {
            info!("{} MIDI input not found yet", self.settings.instrument_match);
            if !prev.instrument_inputs.is_empty() {
                info!("{} MIDI input went away", self.settings.instrument_match);
            }
            return ReconcileState {
                instrument_inputs: BTreeSet::new(),
                sources: prev.sources,
            };
        }
        let instrument_inputs: BTreeSet<String> =
            inputs.iter().map(|name| name.to_string()).collect();

        // The instrument's own clients are never sources into itself.
        let mut exclude = self.settings.exclude_clients.clone();
        exclude.extend(inputs.iter().map(|name| client_of(name).to_lowercase()));
        let sources = select::external_midi_sources(&graph, &exclude);
        let current_sources: BTreeSet<String> =
            sources.iter().map(|name| name.to_string()).collect();

        for gone in prev.sources.difference(&current_sources) {
            info!("source disappeared: {gone}");
        }

        let connections = self.query_connections().await;

        self.wire_audio(&graph, &connections).await;

        for source in &sources {
            for dest in &inputs {
                self.connect_missing(source, dest, &connections).await;
            }
        }

        ReconcileState {
            instrument_inputs,
            sources: current_sources,
        }
    }

    async fn query_connections(&self) -> ConnectionQuery {
        match self.backend.list_connections().await {
            Ok(listing) => {
                let connections = Connections::parse(&listing);
                debug!("{} existing connection pairs", connections.len());
                ConnectionQuery::Known(connections)
            }
            Err(err) => {
                // Diff against nothing; jack_connect tolerates the redundant
                // attempts this causes.
                warn!("connection listing failed, diffing against empty set: {err}");
                ConnectionQuery::Unknown
            }
        }
    }

    /// Pair the instrument's stereo outputs with the physical playback pair.
    /// Both sides must resolve completely or nothing is wired.
    async fn wire_audio(&self, graph: &PortGraph, connections: &ConnectionQuery) {
        let Some((left, right)) = select::instrument_audio_outputs(
            graph,
            &self.settings.instrument_match,
            &self.settings.channel_rules,
        ) else {
            return;
        };
        let Some((front_left, front_right)) = select::playback_targets(graph) else {
            return;
        };
        self.connect_missing(left, front_left, connections).await;
        self.connect_missing(right, front_right, connections).await;
    }

    async fn connect_missing(&self, source: &str, dest: &str, connections: &ConnectionQuery) {
        if connections.contains(source, dest) {
            return;
        }
        match self.backend.connect(source, dest).await {
            Ok(()) => info!("connected {source} -> {dest}"),
            // Not an error: the pair stays missing from the diff and the next
            // cycle retries it.
            Err(err) => debug!("connect {source} -> {dest} failed: {err}"),
        }
    }
}
