//! Tests for the reconciler

use super::*;
use crate::jack::QueryError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Recording backend with scriptable query outcomes
struct MockBackend {
    ports: Result<String, ()>,
    connections: Result<String, ()>,
    fail_connects: bool,
    connects: Mutex<Vec<(String, String)>>,
}

impl MockBackend {
    fn new(ports: &str) -> Self {
        Self {
            ports: Ok(ports.to_string()),
            connections: Ok(String::new()),
            fail_connects: false,
            connects: Mutex::new(Vec::new()),
        }
    }

    fn ports_unavailable() -> Self {
        Self {
            ports: Err(()),
            connections: Ok(String::new()),
            fail_connects: false,
            connects: Mutex::new(Vec::new()),
        }
    }

    fn with_connections(mut self, listing: &str) -> Self {
        self.connections = Ok(listing.to_string());
        self
    }

    fn connections_unavailable(mut self) -> Self {
        self.connections = Err(());
        self
    }

    fn failing_connects(mut self) -> Self {
        self.fail_connects = true;
        self
    }

    fn connects(&self) -> Vec<(String, String)> {
        self.connects.lock().unwrap().clone()
    }
}

fn query_failed() -> QueryError {
    QueryError::Failed {
        command: "jack_lsp",
        message: "server is not running".to_string(),
    }
}

#[async_trait]
impl GraphBackend for MockBackend {
    async fn list_ports(&self) -> Result<String, QueryError> {
        self.ports.clone().map_err(|_| query_failed())
    }

    async fn list_connections(&self) -> Result<String, QueryError> {
        self.connections.clone().map_err(|_| query_failed())
    }

    async fn connect(&self, source: &str, dest: &str) -> Result<(), QueryError> {
        if self.fail_connects {
            return Err(QueryError::Failed {
                command: "jack_connect",
                message: "cannot connect".to_string(),
            });
        }
        self.connects
            .lock()
            .unwrap()
            .push((source.to_string(), dest.to_string()));
        Ok(())
    }
}

fn settings() -> Settings {
    Settings::new("synth", "System,Midi Through", 1)
}

fn reconciler(backend: Arc<MockBackend>) -> Reconciler {
    Reconciler::new(backend, settings())
}

fn state(inputs: &[&str], sources: &[&str]) -> ReconcileState {
    ReconcileState {
        instrument_inputs: inputs.iter().map(|s| s.to_string()).collect(),
        sources: sources.iter().map(|s| s.to_string()).collect(),
    }
}

const BASIC_PORTS: &str = "\
synth:midi_in
	8 bit raw midi
	properties: input,
controller:out1
	8 bit raw midi
	properties: output,
System:out1
	8 bit raw midi
	properties: output,
";

#[tokio::test]
async fn connects_eligible_source_to_instrument_input() {
    let backend = Arc::new(MockBackend::new(BASIC_PORTS));
    let next = reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    assert_eq!(
        backend.connects(),
        [("controller:out1".to_string(), "synth:midi_in".to_string())]
    );
    assert_eq!(next, state(&["synth:midi_in"], &["controller:out1"]));
}

#[tokio::test]
async fn already_wired_pairs_are_not_retried() {
    let backend = Arc::new(MockBackend::new(BASIC_PORTS).with_connections(
        "controller:out1\n\tsynth:midi_in\nsynth:midi_in\n\tcontroller:out1\n",
    ));
    let rec = reconciler(backend.clone());

    let state1 = rec.run_cycle(ReconcileState::default()).await;
    let state2 = rec.run_cycle(state1).await;

    assert!(backend.connects().is_empty());
    assert_eq!(state2, state(&["synth:midi_in"], &["controller:out1"]));
}

#[tokio::test]
async fn instrument_own_client_is_never_a_source() {
    let ports = "\
synth:midi_in
	8 bit raw midi
	properties: input,
synth:midi_out
	8 bit raw midi
	properties: output,
";
    let backend = Arc::new(MockBackend::new(ports));
    let next = reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    assert!(backend.connects().is_empty());
    assert_eq!(next, state(&["synth:midi_in"], &[]));
}

const AUDIO_PORTS: &str = "\
synth:midi_in
	8 bit raw midi
	properties: input,
synth:outL
	32 bit float mono audio
	properties: output,
synth:outR
	32 bit float mono audio
	properties: output,
system:playback_FL
	32 bit float mono audio
	properties: input,physical,
system:playback_FR
	32 bit float mono audio
	properties: input,physical,
";

#[tokio::test]
async fn pairs_stereo_outputs_with_playback() {
    let backend = Arc::new(MockBackend::new(AUDIO_PORTS));
    reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    assert_eq!(
        backend.connects(),
        [
            ("synth:outL".to_string(), "system:playback_FL".to_string()),
            ("synth:outR".to_string(), "system:playback_FR".to_string()),
        ]
    );
}

#[tokio::test]
async fn lone_left_output_wires_no_audio() {
    let ports = "\
synth:midi_in
	8 bit raw midi
	properties: input,
synth:outL
	32 bit float mono audio
	properties: output,
system:playback_FL
	32 bit float mono audio
	properties: input,physical,
system:playback_FR
	32 bit float mono audio
	properties: input,physical,
";
    let backend = Arc::new(MockBackend::new(ports));
    reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    assert!(backend.connects().is_empty());
}

#[tokio::test]
async fn missing_instrument_clears_inputs_and_keeps_sources() {
    let ports = "\
controller:out1
	8 bit raw midi
	properties: output,
";
    let backend = Arc::new(MockBackend::new(ports));
    let prev = state(&["synth:midi_in"], &["controller:out1"]);
    let next = reconciler(backend.clone()).run_cycle(prev).await;

    assert!(backend.connects().is_empty());
    assert!(next.instrument_inputs.is_empty());
    assert_eq!(next, state(&[], &["controller:out1"]));
}

#[tokio::test]
async fn tracked_sources_are_replaced_wholesale() {
    let backend = Arc::new(MockBackend::new(BASIC_PORTS));
    let prev = state(
        &["synth:midi_in"],
        &["controller:out1", "unplugged:out1", "unplugged:out2"],
    );
    let next = reconciler(backend.clone()).run_cycle(prev).await;

    assert_eq!(next.sources, state(&[], &["controller:out1"]).sources);
}

#[tokio::test]
async fn port_query_failure_preserves_previous_state() {
    let backend = Arc::new(MockBackend::ports_unavailable());
    let prev = state(&["synth:midi_in"], &["controller:out1"]);
    let next = reconciler(backend.clone()).run_cycle(prev.clone()).await;

    assert!(backend.connects().is_empty());
    assert_eq!(next, prev);
}

#[tokio::test]
async fn unknown_connection_listing_retries_every_pair() {
    // The pair is actually wired, but the listing is unobtainable, so the
    // reconciler attempts it anyway.
    let backend = Arc::new(MockBackend::new(BASIC_PORTS).connections_unavailable());
    reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    assert_eq!(
        backend.connects(),
        [("controller:out1".to_string(), "synth:midi_in".to_string())]
    );
}

#[tokio::test]
async fn failed_connects_are_skipped_not_fatal() {
    let backend = Arc::new(MockBackend::new(BASIC_PORTS).failing_connects());
    let next = reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    // State still reflects the snapshot; the missing pair is retried next cycle.
    assert_eq!(next, state(&["synth:midi_in"], &["controller:out1"]));
}

#[tokio::test]
async fn cross_product_wires_every_source_to_every_input() {
    let ports = "\
synth:midi_in1
	8 bit raw midi
	properties: input,
synth:midi_in2
	8 bit raw midi
	properties: input,
ctl_a:out
	8 bit raw midi
	properties: output,
ctl_b:out
	8 bit raw midi
	properties: output,
";
    let backend = Arc::new(MockBackend::new(ports));
    reconciler(backend.clone())
        .run_cycle(ReconcileState::default())
        .await;

    let connects = backend.connects();
    assert_eq!(connects.len(), 4);
    for source in ["ctl_a:out", "ctl_b:out"] {
        for dest in ["synth:midi_in1", "synth:midi_in2"] {
            assert!(connects.contains(&(source.to_string(), dest.to_string())));
        }
    }
}
