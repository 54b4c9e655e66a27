use tracing::debug;

use crate::geometry::{Polygon, Ring};
use crate::operations::extract::RingRole;

/// Groups classified rings into polygons by containment depth.
///
/// Each exterior becomes a polygon. A hole joins the smallest ring that
/// contains it when that ring is an exterior exactly one level shallower;
/// any other hole is an orphan and is dropped. Exteriors nested inside holes
/// (islands) become polygons of their own.
pub(crate) fn build_polygons(rings: Vec<(Ring, RingRole)>) -> Vec<Polygon> {
    let mut rings = rings;
    // Containers are always larger than what they contain.
    rings.sort_by(|a, b| b.0.area().total_cmp(&a.0.area()));

    let n = rings.len();
    let mut depth = vec![0_usize; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        for j in 0..i {
            if rings[j].0.contains_ring(&rings[i].0) {
                depth[i] += 1;
                parent[i] = Some(j);
            }
        }
    }

    let mut polygon_of: Vec<Option<usize>> = vec![None; n];
    let mut polygons: Vec<Polygon> = Vec::new();
    for i in 0..n {
        if rings[i].1 == RingRole::Exterior {
            polygon_of[i] = Some(polygons.len());
            polygons.push(Polygon::solid(rings[i].0.to_ccw()));
        }
    }

    let mut orphans = 0_usize;
    for i in 0..n {
        if rings[i].1 != RingRole::Hole {
            continue;
        }
        let owner = parent[i]
            .filter(|&p| rings[p].1 == RingRole::Exterior && depth[p] + 1 == depth[i])
            .and_then(|p| polygon_of[p]);
        match owner {
            Some(k) => polygons[k].holes.push(rings[i].0.to_cw()),
            None => orphans += 1,
        }
    }
    if orphans > 0 {
        debug!(orphans, "dropped holes without an enclosing exterior");
    }

    polygons
}
