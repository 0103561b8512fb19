//! Facility network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! EdgeId( node_out_start[n] .. node_out_start[n+1] )
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`,
//! `edge_base_secs`) are sorted by source node and indexed by `EdgeId`.
//!
//! A second, reverse CSR (`node_in_start` / `in_edges`) lists incoming
//! edges per node.  The dispatcher uses it to run one backwards Dijkstra per
//! order origin instead of one forward search per candidate truck.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `NodeId`.  Used
//! by the k-nearest-neighbour topology generator and for snapping external
//! coordinates onto facilities.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use hs_core::{EdgeId, GeoPoint, NodeId, NodeKind};

use crate::{NetworkError, NetworkResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a 2-D `[lat, lon]` point with
/// the associated `NodeId`.
#[derive(Clone)]
pub(crate) struct NodeEntry {
    pub(crate) point: [f32; 2], // [lat, lon]
    pub(crate) id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Only used to rank
    /// candidates, never as a physical length.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── NetworkGraph ──────────────────────────────────────────────────────────────

/// Directed facility graph in CSR format plus a spatial index.
///
/// Immutable once built.  All fields are `pub` for direct indexed access on
/// hot paths; construct through [`NetworkBuilder`].
pub struct NetworkGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Facility type of each node.  Indexed by `NodeId`.
    pub node_kind: Vec<NodeKind>,

    /// Concurrent service slots of each node.  Always ≥ 1.
    pub node_capacity: Vec<u32>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Outgoing edges of node `n` are `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Reverse CSR row pointer into `in_edges`.  Length = `node_count + 1`.
    pub node_in_start: Vec<u32>,

    /// Incoming `EdgeId`s grouped by target node.
    pub in_edges: Vec<EdgeId>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,

    /// Physical length in metres.
    pub edge_length_m: Vec<f32>,

    /// Free-flow travel time in seconds.  Always ≥ 1.
    pub edge_base_secs: Vec<u32>,

    // ── Lookups ───────────────────────────────────────────────────────────
    edge_index: FxHashMap<(NodeId, NodeId), EdgeId>,
    spatial_idx: RTree<NodeEntry>,
}

impl NetworkGraph {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    // ── Node / edge accessors ─────────────────────────────────────────────

    #[inline]
    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.node_kind[node.index()]
    }

    /// How many trucks `node` can service at once.
    #[inline]
    pub fn capacity(&self, node: NodeId) -> u32 {
        self.node_capacity[node.index()]
    }

    #[inline]
    pub fn pos(&self, node: NodeId) -> GeoPoint {
        self.node_pos[node.index()]
    }

    #[inline]
    pub fn edge_source(&self, edge: EdgeId) -> NodeId {
        self.edge_from[edge.index()]
    }

    #[inline]
    pub fn edge_target(&self, edge: EdgeId) -> NodeId {
        self.edge_to[edge.index()]
    }

    #[inline]
    pub fn base_secs(&self, edge: EdgeId) -> u32 {
        self.edge_base_secs[edge.index()]
    }

    /// The single edge from `from` to `to`, if one exists.
    #[inline]
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.edge_index.get(&(from, to)).copied()
    }

    /// Position `progress ∈ [0, 1]` of the way along `edge`.
    pub fn point_on_edge(&self, edge: EdgeId, progress: f64) -> GeoPoint {
        let a = self.pos(self.edge_source(edge));
        let b = self.pos(self.edge_target(edge));
        a.lerp(b, progress)
    }

    /// All nodes of the given kind, ascending by id.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.node_kind
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == kind)
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    /// Iterator over the `EdgeId`s of all incoming edges to `node`.
    #[inline]
    pub fn in_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_in_start[node.index()] as usize;
        let end   = self.node_in_start[node.index() + 1] as usize;
        self.in_edges[start..end].iter().copied()
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The node nearest to `pos`.  `None` only for an empty network.
    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }

    /// Up to `k` nearest nodes to `pos`, sorted by ascending distance.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`NetworkGraph`] incrementally, then call [`build`](Self::build).
///
/// Nodes and directed edges may be added in any order.  `build()` rejects
/// duplicate ordered pairs, self-loops, dangling endpoints, zero travel
/// times and zero-capacity nodes, then lays out both CSR directions and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use hs_core::{GeoPoint, NodeKind};
/// use hs_network::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// let w = b.add_node(GeoPoint::new(50.06, 19.94), NodeKind::Warehouse);
/// let c = b.add_node(GeoPoint::new(50.10, 20.00), NodeKind::Customer);
/// b.add_link(w, c, 6_000.0, 420); // 6 km, 7 min each way
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2);
/// ```
pub struct NetworkBuilder {
    nodes:     Vec<(GeoPoint, NodeKind)>,
    capacity:  Vec<u32>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:      NodeId,
    to:        NodeId,
    length_m:  f32,
    base_secs: u32,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), capacity: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            capacity:  Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a facility and return its `NodeId` (sequential from 0).  Its
    /// capacity starts at the low end of [`NodeKind::capacity_range`].
    pub fn add_node(&mut self, pos: GeoPoint, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push((pos, kind));
        self.capacity.push(kind.capacity_range().0);
        id
    }

    /// Override the service capacity of an already-added node.  Unknown ids
    /// are ignored here and zero is rejected by `build()`.
    pub fn set_capacity(&mut self, node: NodeId, capacity: u32) {
        if let Some(slot) = self.capacity.get_mut(node.index()) {
            *slot = capacity;
        }
    }

    /// Add a **directed** edge from `from` to `to`.
    ///
    /// - `length_m`: physical length in metres.
    /// - `base_secs`: free-flow travel time in seconds.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, length_m: f32, base_secs: u32) {
        self.raw_edges.push(RawEdge { from, to, length_m, base_secs });
    }

    /// Convenience: add edges in **both directions** (symmetric road).
    pub fn add_link(&mut self, a: NodeId, b: NodeId, length_m: f32, base_secs: u32) {
        self.add_edge(a, b, length_m, base_secs);
        self.add_edge(b, a, length_m, base_secs);
    }

    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()].0
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`NetworkGraph`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> NetworkResult<NetworkGraph> {
        let node_count = self.nodes.len();
        if node_count == 0 {
            return Err(NetworkError::Empty);
        }

        if let Some(i) = self.capacity.iter().position(|c| *c == 0) {
            return Err(NetworkError::ZeroCapacity(NodeId(i as u32)));
        }

        let mut edge_index: FxHashMap<(NodeId, NodeId), EdgeId> =
            FxHashMap::with_capacity_and_hasher(self.raw_edges.len(), Default::default());

        // Stable sort keeps insertion order among a node's edges.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        for (i, e) in raw.iter().enumerate() {
            for n in [e.from, e.to] {
                if n.index() >= node_count {
                    return Err(NetworkError::NodeNotFound(n));
                }
            }
            if e.from == e.to {
                return Err(NetworkError::SelfLoop(e.from));
            }
            if e.base_secs == 0 {
                return Err(NetworkError::ZeroTravelTime { from: e.from, to: e.to });
            }
            if edge_index.insert((e.from, e.to), EdgeId(i as u32)).is_some() {
                return Err(NetworkError::DuplicateEdge { from: e.from, to: e.to });
            }
        }

        let edge_count = raw.len();
        let edge_from:      Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f32>    = raw.iter().map(|e| e.length_m).collect();
        let edge_base_secs: Vec<u32>    = raw.iter().map(|e| e.base_secs).collect();

        // Forward CSR row pointer.
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        // Reverse CSR: counting sort of EdgeIds by target node.
        let mut node_in_start = vec![0u32; node_count + 1];
        for to in &edge_to {
            node_in_start[to.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_in_start[i] += node_in_start[i - 1];
        }
        let mut fill = node_in_start.clone();
        let mut in_edges = vec![EdgeId::INVALID; edge_count];
        for (i, to) in edge_to.iter().enumerate() {
            let slot = &mut fill[to.index()];
            in_edges[*slot as usize] = EdgeId(i as u32);
            *slot += 1;
        }

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, (pos, _))| NodeEntry {
                point: [pos.lat, pos.lon],
                id: NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        let (node_pos, node_kind) = self.nodes.into_iter().unzip();

        Ok(NetworkGraph {
            node_pos,
            node_kind,
            node_capacity: self.capacity,
            node_out_start,
            node_in_start,
            in_edges,
            edge_from,
            edge_to,
            edge_length_m,
            edge_base_secs,
            edge_index,
            spatial_idx,
        })
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
