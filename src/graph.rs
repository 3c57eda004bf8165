//! Port graph model and `jack_lsp` listing parser
//!
//! One `PortGraph` is one snapshot of the JACK/PipeWire graph, parsed fresh on
//! every reconciliation cycle. Ports keep the insertion order of the listing.

use std::collections::BTreeSet;
use std::fmt::Write as _;

/// A single named endpoint in the audio/MIDI graph
///
/// `name` has the `client:port` shape; `port_type` is the free-form type string
/// from the listing (empty if the record carried none); `properties` is the set
/// of tags from the `properties:` attribute line(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub port_type: String,
    pub properties: BTreeSet<String>,
}

impl Port {
    /// Type string contains "midi" (case-insensitive)
    pub fn is_midi(&self) -> bool {
        self.port_type.to_lowercase().contains("midi")
    }

    /// Type string contains "audio" (case-insensitive)
    pub fn is_audio(&self) -> bool {
        self.port_type.to_lowercase().contains("audio")
    }

    /// Tag membership, exactly as stored in the listing
    pub fn has_property(&self, tag: &str) -> bool {
        self.properties.contains(tag)
    }

    /// Owning client of this port
    pub fn client(&self) -> &str {
        client_of(&self.name)
    }
}

/// Prefix before the first `:`, or the whole name if there is no separator
pub fn client_of(name: &str) -> &str {
    name.split_once(':').map(|(client, _)| client).unwrap_or(name)
}

/// Insertion-ordered snapshot of every port in the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortGraph {
    ports: Vec<Port>,
}

impl PortGraph {
    /// Parse a `jack_lsp -pt` style listing.
    ///
    /// Each non-indented, non-blank line starts a new port record; indented
    /// lines attach to the most recent record. A `properties:` line adds its
    /// comma-separated tags (trailing commas tolerated, as `jack_lsp` emits
    /// them); the first other non-blank indented line is the port's type, and
    /// later type-like lines are ignored. Indented lines before any record are
    /// dropped.
    pub fn parse(listing: &str) -> Self {
        let mut graph = PortGraph::default();
        for line in listing.lines() {
            let indented = line.starts_with(|c: char| c.is_whitespace());
            let trimmed = line.trim();
            if !indented && !trimmed.is_empty() {
                graph.ports.push(Port {
                    name: trimmed.to_string(),
                    port_type: String::new(),
                    properties: BTreeSet::new(),
                });
                continue;
            }
            let Some(port) = graph.ports.last_mut() else {
                continue;
            };
            if let Some(tags) = trimmed.strip_prefix("properties:") {
                port.properties.extend(
                    tags.split(',')
                        .map(str::trim)
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_string),
                );
                continue;
            }
            if !trimmed.is_empty() && port.port_type.is_empty() {
                port.port_type = trimmed.to_string();
            }
        }
        graph
    }

    /// Look up a port by its full name
    pub fn get(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|port| port.name == name)
    }

    /// Iterate ports in listing order
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Canonical re-serialization of the snapshot.
    ///
    /// Parsing the result yields a graph equal to this one.
    pub fn to_listing(&self) -> String {
        let mut out = String::new();
        for port in &self.ports {
            let _ = writeln!(out, "{}", port.name);
            if !port.port_type.is_empty() {
                let _ = writeln!(out, "\t{}", port.port_type);
            }
            if !port.properties.is_empty() {
                let tags: Vec<&str> = port.properties.iter().map(String::as_str).collect();
                let _ = writeln!(out, "\tproperties: {}", tags.join(","));
            }
        }
        out
    }
}

impl FromIterator<Port> for PortGraph {
    fn from_iter<I: IntoIterator<Item = Port>>(iter: I) -> Self {
        Self {
            ports: iter.into_iter().collect(),
        }
    }
}
