//! Road network representation and builder.
//!
//! # Data layout
//!
//! Junctions and edges are addressed internally by dense indices
//! ([`JunctionIdx`], [`EdgeIdx`]); the simulator-facing string [`EdgeId`]s
//! are resolved once through a lookup table.  Outgoing edges use
//! **Compressed Sparse Row (CSR)** format.  Given a junction `j`, its
//! outgoing edges occupy
//!
//! ```text
//! edge_to[ node_out_start[j] .. node_out_start[j+1] ]
//! ```
//!
//! All edge arrays are sorted by source junction and indexed by `EdgeIdx`, so
//! scanning a junction's outgoing edges during routing is a contiguous read.
//!
//! # Signals
//!
//! A junction may own one [`SignalProgram`].  Every edge that ends at a
//! signalised junction is controlled by that program; its link index is its
//! rank among the junction's incoming edges, ordered by source junction and
//! then by insertion.

use std::collections::HashMap;

use mt_core::EdgeId;

use crate::signal::SignalProgram;

// ── Dense indices ─────────────────────────────────────────────────────────────

/// Dense junction index, assigned sequentially by the builder.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct JunctionIdx(pub u32);

/// Dense edge index, position in the CSR-sorted edge arrays.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EdgeIdx(pub u32);

impl JunctionIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeIdx {
    pub const INVALID: EdgeIdx = EdgeIdx(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Signal control of one edge's downstream end.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EdgeControl {
    /// Index into [`RoadNetwork::signals`].
    pub signal:     usize,
    pub link_index: usize,
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format with per-edge speed limits and optional
/// fixed-time signals.
///
/// Do not construct directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    // ── Junction data ─────────────────────────────────────────────────────
    pub junction_names: Vec<String>,

    /// CSR row pointer.  Length = `junction_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeIdx) ────────────────────────────────────
    pub edge_ids:        Vec<EdgeId>,
    pub edge_from:       Vec<JunctionIdx>,
    pub edge_to:         Vec<JunctionIdx>,
    pub edge_length_m:   Vec<f64>,
    pub edge_speed_mps:  Vec<f64>,
    /// Free-flow travel time in milliseconds.  Used as Dijkstra edge cost.
    pub edge_travel_ms:  Vec<u32>,
    pub edge_control:    Vec<Option<EdgeControl>>,

    pub signals: Vec<SignalProgram>,

    lookup: HashMap<EdgeId, EdgeIdx>,
}

impl RoadNetwork {
    pub fn junction_count(&self) -> usize {
        self.junction_names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_ids.is_empty()
    }

    /// Resolve a simulator edge id.
    #[inline]
    pub fn edge_idx(&self, id: &str) -> Option<EdgeIdx> {
        self.lookup.get(id).copied()
    }

    #[inline]
    pub fn edge_id(&self, edge: EdgeIdx) -> &EdgeId {
        &self.edge_ids[edge.index()]
    }

    /// Iterator over the outgoing edges of `junction`.
    #[inline]
    pub fn out_edges(&self, junction: JunctionIdx) -> impl Iterator<Item = EdgeIdx> + '_ {
        let start = self.node_out_start[junction.index()] as usize;
        let end   = self.node_out_start[junction.index() + 1] as usize;
        (start..end).map(|i| EdgeIdx(i as u32))
    }

    /// Edges that may follow `edge`: the outgoing edges of its downstream
    /// junction, excluding the immediate reversal back to where it came from.
    pub fn successors(&self, edge: EdgeIdx) -> impl Iterator<Item = EdgeIdx> + '_ {
        let from = self.edge_from[edge.index()];
        self.out_edges(self.edge_to[edge.index()])
            .filter(move |&next| self.edge_to[next.index()] != from)
    }

    /// `true` when `next` may directly follow `edge` on a route.
    pub fn connects(&self, edge: EdgeIdx, next: EdgeIdx) -> bool {
        self.edge_to[edge.index()] == self.edge_from[next.index()]
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use mt_link::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_junction("west");
/// let c = b.add_junction("east");
/// b.add_road("1", "-1", a, c, 200.0, 13.89);
/// let net = b.build();
/// assert_eq!(net.edge_count(), 2);
/// ```
pub struct RoadNetworkBuilder {
    junctions: Vec<String>,
    raw_edges: Vec<RawEdge>,
    signals:   Vec<(JunctionIdx, SignalProgram)>,
}

struct RawEdge {
    id:        EdgeId,
    from:      JunctionIdx,
    to:        JunctionIdx,
    length_m:  f64,
    speed_mps: f64,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { junctions: Vec::new(), raw_edges: Vec::new(), signals: Vec::new() }
    }

    /// Add a junction and return its index (sequential from 0).
    pub fn add_junction(&mut self, name: impl Into<String>) -> JunctionIdx {
        let idx = JunctionIdx(self.junctions.len() as u32);
        self.junctions.push(name.into());
        idx
    }

    /// Add a **directed** edge.  A later edge with the same id replaces the
    /// earlier one in the lookup table.
    pub fn add_edge(
        &mut self,
        id:        impl Into<EdgeId>,
        from:      JunctionIdx,
        to:        JunctionIdx,
        length_m:  f64,
        speed_mps: f64,
    ) {
        self.raw_edges.push(RawEdge { id: id.into(), from, to, length_m, speed_mps });
    }

    /// Convenience: a two-way road as a pair of directed edges.
    pub fn add_road(
        &mut self,
        forward:   impl Into<EdgeId>,
        backward:  impl Into<EdgeId>,
        a:         JunctionIdx,
        b:         JunctionIdx,
        length_m:  f64,
        speed_mps: f64,
    ) {
        self.add_edge(forward, a, b, length_m, speed_mps);
        self.add_edge(backward, b, a, length_m, speed_mps);
    }

    /// Attach a fixed-time program to `junction`.
    pub fn add_signal(&mut self, junction: JunctionIdx, program: SignalProgram) {
        self.signals.push((junction, program));
    }

    pub fn junction_count(&self) -> usize { self.junctions.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    pub fn build(self) -> RoadNetwork {
        let junction_count = self.junctions.len();

        // Stable sort keeps insertion order within a junction.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_ids:       Vec<EdgeId>      = raw.iter().map(|e| e.id.clone()).collect();
        let edge_from:      Vec<JunctionIdx> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<JunctionIdx> = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f64>         = raw.iter().map(|e| e.length_m).collect();
        let edge_speed_mps: Vec<f64>         = raw.iter().map(|e| e.speed_mps).collect();
        let edge_travel_ms: Vec<u32> = raw
            .iter()
            .map(|e| {
                if e.speed_mps > 0.0 {
                    (e.length_m / e.speed_mps * 1000.0).round() as u32
                } else {
                    u32::MAX
                }
            })
            .collect();

        let mut node_out_start = vec![0u32; junction_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=junction_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[junction_count] as usize, raw.len());

        // Signal control: incoming edges of a signalised junction get
        // consecutive link indices.
        let mut signal_of_junction: HashMap<JunctionIdx, usize> = HashMap::new();
        let mut signals = Vec::with_capacity(self.signals.len());
        for (junction, program) in self.signals {
            signal_of_junction.insert(junction, signals.len());
            signals.push(program);
        }
        let mut next_link: HashMap<JunctionIdx, usize> = HashMap::new();
        let edge_control: Vec<Option<EdgeControl>> = edge_to
            .iter()
            .map(|to| {
                let signal = *signal_of_junction.get(to)?;
                let slot = next_link.entry(*to).or_insert(0);
                let link_index = *slot;
                *slot += 1;
                Some(EdgeControl { signal, link_index })
            })
            .collect();

        let lookup = edge_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), EdgeIdx(i as u32)))
            .collect();

        RoadNetwork {
            junction_names: self.junctions,
            node_out_start,
            edge_ids,
            edge_from,
            edge_to,
            edge_length_m,
            edge_speed_mps,
            edge_travel_ms,
            edge_control,
            signals,
            lookup,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
