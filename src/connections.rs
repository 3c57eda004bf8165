//! Existing-connection snapshot and `jack_lsp -c` listing parser

use std::collections::HashSet;

/// Set of directed `(source, dest)` connection pairs
///
/// `jack_lsp -c` lists every connection from both endpoints, so a wired pair
/// usually appears here in both orders. The reconciler only ever checks the
/// source-to-destination order it intends to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections {
    pairs: HashSet<(String, String)>,
}

impl Connections {
    /// Parse a `jack_lsp -c` style listing: a non-indented line names a port,
    /// each indented non-blank line under it is a connected target.
    pub fn parse(listing: &str) -> Self {
        let mut pairs = HashSet::new();
        let mut current: Option<String> = None;
        for line in listing.lines() {
            let indented = line.starts_with(|c: char| c.is_whitespace());
            let trimmed = line.trim();
            if !indented && !trimmed.is_empty() {
                current = Some(trimmed.to_string());
                continue;
            }
            let Some(source) = &current else {
                continue;
            };
            if !trimmed.is_empty() {
                pairs.insert((source.clone(), trimmed.to_string()));
            }
        }
        Self { pairs }
    }

    pub fn contains(&self, source: &str, dest: &str) -> bool {
        self.pairs
            .contains(&(source.to_string(), dest.to_string()))
    }

    pub fn insert(&mut self, source: &str, dest: &str) {
        self.pairs.insert((source.to_string(), dest.to_string()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Outcome of the connection query
///
/// `Unknown` means the listing could not be obtained; it carries no information
/// about the graph, and in particular does not mean "no connections exist".
/// Policy for `Unknown` belongs to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionQuery {
    Known(Connections),
    Unknown,
}

impl ConnectionQuery {
    /// Whether the pair is known to already exist. `Unknown` reports `false`
    /// for every pair, so every desired connection gets attempted.
    pub fn contains(&self, source: &str, dest: &str) -> bool {
        match self {
            ConnectionQuery::Known(connections) => connections.contains(source, dest),
            ConnectionQuery::Unknown => false,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ConnectionQuery::Unknown)
    }
}
