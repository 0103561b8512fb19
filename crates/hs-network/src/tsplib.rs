//! TSPLIB instance loading.
//!
//! Only the `NAME` header and `NODE_COORD_SECTION` are read; every other
//! header (`TYPE`, `DIMENSION`, `EDGE_WEIGHT_TYPE`, …) is ignored.  Planar
//! coordinates are mapped into the configured latitude/longitude box with a
//! single uniform scale (aspect ratio preserved, longitude corrected for the
//! box's mean latitude) and then joined with the k-nearest-neighbour builder.

use std::io::BufRead;
use std::path::Path;

use tracing::info;

use hs_core::{GeoPoint, NetworkParams, NodeKind, SimRng};

use crate::generate::{assign_capacities, assign_kinds, build_knn};
use crate::network::NetworkGraph;
use crate::{NetworkError, NetworkResult};

/// One `NODE_COORD_SECTION` row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TspPoint {
    pub id: u32,
    pub x:  f64,
    pub y:  f64,
}

/// A parsed TSPLIB instance.
#[derive(Clone, Debug, PartialEq)]
pub struct TspInstance {
    pub name:   String,
    pub points: Vec<TspPoint>,
}

/// Parse a TSPLIB document.
///
/// Rows inside the coordinate section that do not start with three numeric
/// fields are an error rather than silently skipped.
pub fn parse_tsplib<R: BufRead>(reader: R) -> NetworkResult<TspInstance> {
    let mut name = String::from("unknown");
    let mut points = Vec::new();
    let mut in_coords = false;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line == "EOF" {
            continue;
        }
        if line.starts_with("NAME") {
            if let Some(value) = line.split(':').nth(1) {
                name = value.trim().to_owned();
            }
            continue;
        }
        if line == "NODE_COORD_SECTION" {
            in_coords = true;
            continue;
        }
        if !in_coords {
            continue;
        }

        match parse_row(line) {
            Some(p) => points.push(p),
            None => {
                return Err(NetworkError::Parse(format!(
                    "line {}: expected `id x y`, got {line:?}",
                    lineno + 1
                )));
            }
        }
    }

    if points.is_empty() {
        return Err(NetworkError::Empty);
    }
    Ok(TspInstance { name, points })
}

fn parse_row(line: &str) -> Option<TspPoint> {
    let mut fields = line.split_whitespace();
    let id = fields.next()?.parse::<u32>().ok()?;
    let x  = fields.next()?.parse::<f64>().ok()?;
    let y  = fields.next()?.parse::<f64>().ok()?;
    Some(TspPoint { id, x, y })
}

/// Map planar TSPLIB coordinates into `lat_range` × `lon_range`.
///
/// The instance is centred in the box and scaled uniformly so it fits both
/// spans; a degenerate (zero-width) axis is treated as span 1.
pub fn normalize(points: &[TspPoint], lat_range: (f32, f32), lon_range: (f32, f32)) -> Vec<GeoPoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }
    let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
    let y_span = if y_max > y_min { y_max - y_min } else { 1.0 };

    let (lat_lo, lat_hi) = (lat_range.0 as f64, lat_range.1 as f64);
    let (lon_lo, lon_hi) = (lon_range.0 as f64, lon_range.1 as f64);
    let lat_center = (lat_lo + lat_hi) / 2.0;
    let lon_center = (lon_lo + lon_hi) / 2.0;
    let lon_correction = lat_center.to_radians().cos().max(1e-6);

    let scale = ((lat_hi - lat_lo) / y_span).min((lon_hi - lon_lo) * lon_correction / x_span);
    let x_mid = (x_min + x_max) / 2.0;
    let y_mid = (y_min + y_max) / 2.0;

    points
        .iter()
        .map(|p| {
            let lat = lat_center + (p.y - y_mid) * scale;
            let lon = lon_center + (p.x - x_mid) * scale / lon_correction;
            GeoPoint::new(lat as f32, lon as f32)
        })
        .collect()
}

/// Build a network from a parsed instance using `params` for the bounding
/// box, neighbour count, and speed.  Node kinds and capacities are drawn
/// from `rng`.
///
/// `NodeId`s follow file order, not TSPLIB ids.
pub fn network_from_tsplib(
    instance: &TspInstance,
    params: &NetworkParams,
    rng: &mut SimRng,
) -> NetworkResult<NetworkGraph> {
    let coords = normalize(&instance.points, params.lat_range, params.lon_range);
    let kinds = assign_kinds(coords.len(), rng);
    let nodes: Vec<(GeoPoint, NodeKind)> = coords.into_iter().zip(kinds).collect();
    let capacities = assign_capacities(&nodes, rng);
    build_knn(&nodes, &capacities, params.k_neighbors, params.speed_kmh)
}

/// Read and build a TSPLIB file in one step.
pub fn load_tsplib(
    path: &Path,
    params: &NetworkParams,
    rng: &mut SimRng,
) -> NetworkResult<NetworkGraph> {
    let file = std::fs::File::open(path)?;
    let instance = parse_tsplib(std::io::BufReader::new(file))?;
    let net = network_from_tsplib(&instance, params, rng)?;
    info!(
        name = %instance.name,
        nodes = net.node_count(),
        edges = net.edge_count(),
        "loaded TSPLIB network"
    );
    Ok(net)
}
