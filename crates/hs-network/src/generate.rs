//! Synthetic facility networks.
//!
//! Both the random generator and the TSPLIB loader funnel through
//! [`build_knn`]: every node is linked (in both directions) to its `k`
//! nearest neighbours, then any leftover connected components are chained
//! together at their closest node pair so every facility can reach every
//! other one.

use rstar::primitives::GeomWithData;
use rstar::RTree;
use rustc_hash::FxHashSet;
use tracing::debug;

use hs_core::{GeoPoint, NetworkParams, NodeId, NodeKind, SimRng};

use crate::network::{NetworkBuilder, NetworkGraph};
use crate::NetworkResult;

/// R-tree point in an equirectangular projection, carrying the node index.
type ProjectedPoint = GeomWithData<[f32; 2], u32>;

/// Facility mix by position in the (pre-shuffle) list.  Upper ratio bounds.
const KIND_BANDS: [(f64, NodeKind); 4] = [
    (0.10, NodeKind::Warehouse),
    (0.20, NodeKind::Hub),
    (0.25, NodeKind::Port),
    (0.30, NodeKind::Inspection),
];

/// Generate a random connected network from `params`.
///
/// Node positions are uniform in the configured bounding box; kinds follow
/// [`assign_kinds`].  All randomness comes from `rng`, so the same stream
/// always produces the same graph.
pub fn generate_random(params: &NetworkParams, rng: &mut SimRng) -> NetworkResult<NetworkGraph> {
    let kinds = assign_kinds(params.node_count, rng);
    let (lat_lo, lat_hi) = params.lat_range;
    let (lon_lo, lon_hi) = params.lon_range;

    let nodes: Vec<(GeoPoint, NodeKind)> = kinds
        .into_iter()
        .map(|kind| {
            let lat = rng.gen_range(lat_lo..=lat_hi);
            let lon = rng.gen_range(lon_lo..=lon_hi);
            (GeoPoint::new(lat, lon), kind)
        })
        .collect();
    let capacities = assign_capacities(&nodes, rng);

    build_knn(&nodes, &capacities, params.k_neighbors, params.speed_kmh)
}

/// Node kinds for an `n`-node network: about 10 % warehouses, 10 % hubs,
/// 5 % ports, 5 % inspection points, the rest customers, shuffled.
///
/// Node 0 of the unshuffled list is always a warehouse, so any non-empty
/// network has at least one supply node.
pub fn assign_kinds(n: usize, rng: &mut SimRng) -> Vec<NodeKind> {
    let mut kinds: Vec<NodeKind> = (0..n)
        .map(|i| {
            let ratio = i as f64 / n as f64;
            KIND_BANDS
                .iter()
                .find(|(bound, _)| ratio < *bound)
                .map(|(_, kind)| *kind)
                .unwrap_or(NodeKind::Customer)
        })
        .collect();
    rng.shuffle(&mut kinds);
    kinds
}

/// Service capacity per node, uniform in its kind's
/// [`capacity_range`](NodeKind::capacity_range).
pub fn assign_capacities(nodes: &[(GeoPoint, NodeKind)], rng: &mut SimRng) -> Vec<u32> {
    nodes
        .iter()
        .map(|(_, kind)| {
            let (lo, hi) = kind.capacity_range();
            rng.gen_range(lo..=hi)
        })
        .collect()
}

/// Build a connected, symmetric k-nearest-neighbour graph over `nodes`.
///
/// Edge length is the haversine distance; base travel time is that distance
/// at `speed_kmh`, rounded to whole seconds and never below one second.
/// `capacities` is indexed like `nodes`; missing entries keep the kind's
/// default.
pub fn build_knn(
    nodes: &[(GeoPoint, NodeKind)],
    capacities: &[u32],
    k: usize,
    speed_kmh: f64,
) -> NetworkResult<NetworkGraph> {
    let n = nodes.len();
    let mut builder = NetworkBuilder::with_capacity(n, n * k * 2);
    for (i, (pos, kind)) in nodes.iter().enumerate() {
        let id = builder.add_node(*pos, *kind);
        if let Some(cap) = capacities.get(i) {
            builder.set_capacity(id, *cap);
        }
    }

    let positions: Vec<GeoPoint> = nodes.iter().map(|(p, _)| *p).collect();
    let mut linked: FxHashSet<(u32, u32)> = FxHashSet::default();
    let mut uf = UnionFind::new(n);

    if n > 1 {
        let ref_lat = mean_lat(&positions);
        let tree = projected_tree(&positions, ref_lat);
        for (i, pos) in positions.iter().enumerate() {
            let neighbours = tree
                .nearest_neighbor_iter(&project(*pos, ref_lat))
                .filter(|p| p.data as usize != i)
                .take(k);
            for p in neighbours {
                let j = p.data as usize;
                if link(&mut builder, &mut linked, &positions, i, j, speed_kmh) {
                    uf.union(i, j);
                }
            }
        }
    }

    let repairs = repair_connectivity(&mut builder, &mut linked, &mut uf, &positions, speed_kmh);
    debug!(nodes = n, links = linked.len(), repairs, "built k-NN network");

    builder.build()
}

// ── Internals ─────────────────────────────────────────────────────────────────

fn mean_lat(positions: &[GeoPoint]) -> f32 {
    if positions.is_empty() {
        return 0.0;
    }
    positions.iter().map(|p| p.lat).sum::<f32>() / positions.len() as f32
}

/// Equirectangular projection around `ref_lat`: longitude is shrunk by
/// `cos(lat)` so planar distance ranks neighbours like great-circle distance.
fn project(pos: GeoPoint, ref_lat: f32) -> [f32; 2] {
    [pos.lat, pos.lon * ref_lat.to_radians().cos()]
}

fn projected_tree(positions: &[GeoPoint], ref_lat: f32) -> RTree<ProjectedPoint> {
    let points = positions
        .iter()
        .enumerate()
        .map(|(i, p)| GeomWithData::new(project(*p, ref_lat), i as u32))
        .collect();
    RTree::bulk_load(points)
}

/// Add the undirected link `i <-> j` unless it already exists.  Returns
/// `true` if a link was added.
fn link(
    builder: &mut NetworkBuilder,
    linked: &mut FxHashSet<(u32, u32)>,
    positions: &[GeoPoint],
    i: usize,
    j: usize,
    speed_kmh: f64,
) -> bool {
    let key = (i.min(j) as u32, i.max(j) as u32);
    if !linked.insert(key) {
        return false;
    }
    let length_m = positions[i].distance_m(positions[j]);
    let base_secs = ((length_m as f64 / 1_000.0) / speed_kmh * 3_600.0).round().max(1.0) as u32;
    builder.add_link(NodeId(i as u32), NodeId(j as u32), length_m, base_secs);
    true
}

/// Chain components `c0 - c1 - c2 …` (ordered by smallest member) through
/// their closest node pairs.  Returns the number of links added.
fn repair_connectivity(
    builder: &mut NetworkBuilder,
    linked: &mut FxHashSet<(u32, u32)>,
    uf: &mut UnionFind,
    positions: &[GeoPoint],
    speed_kmh: f64,
) -> usize {
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut slot_of_root: Vec<Option<usize>> = vec![None; positions.len()];
    for i in 0..positions.len() {
        let root = uf.find(i);
        match slot_of_root[root] {
            Some(slot) => components[slot].push(i),
            None => {
                slot_of_root[root] = Some(components.len());
                components.push(vec![i]);
            }
        }
    }

    let mut added = 0;
    for pair in components.windows(2) {
        let mut best: Option<(f32, usize, usize)> = None;
        for &u in &pair[0] {
            for &v in &pair[1] {
                let d = positions[u].distance_m(positions[v]);
                if best.is_none_or(|(bd, _, _)| d < bd) {
                    best = Some((d, u, v));
                }
            }
        }
        if let Some((_, u, v)) = best {
            if link(builder, linked, positions, u, v, speed_kmh) {
                uf.union(u, v);
                added += 1;
            }
        }
    }
    added
}

/// Disjoint-set forest with path halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so component order stays stable.
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi] = lo;
        }
    }
}
