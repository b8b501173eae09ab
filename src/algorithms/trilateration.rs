//! Closed-form three-anchor trilateration
//!
//! The closed-form solve assumes a canonical anchor frame: A1 at the origin,
//! A2 on the +x axis, A3 in the xy-plane with positive y. Arbitrary anchor
//! placements are rotated/translated into that frame first and the solution
//! is mapped back, so the transform is part of the solver's contract rather
//! than a caller obligation.

use crate::core::types::{Position, ZSign};
use crate::validation::error::SolveError;
use nalgebra::Vector3;

/// Anchor separations below this are treated as degenerate geometry.
const DEGENERACY_EPS: f64 = 1e-9;

/// Solve for a position from exactly three anchors and their measured
/// distances.
///
/// When the measured ranges are inconsistent with an exact intersection the
/// squared vertical coordinate goes negative; it is clamped to zero and the
/// in-plane solution is returned. Coincident or collinear anchors fail with
/// a geometry error.
pub fn trilaterate(
    anchors: &[Vector3<f64>; 3],
    distances: &[f64; 3],
    z_sign: ZSign,
) -> Result<Position, SolveError> {
    let [p1, p2, p3] = anchors;
    let [d1, d2, d3] = distances;

    // Canonical frame basis: ex along A1->A2, ey the component of A1->A3
    // orthogonal to ex, ez completing the right-handed triad.
    let to_p2 = p2 - p1;
    let d = to_p2.norm();
    if d <= DEGENERACY_EPS {
        return Err(SolveError::Geometry {
            details: "anchors 1 and 2 are coincident".to_string(),
        });
    }
    let ex = to_p2 / d;

    let to_p3 = p3 - p1;
    let i = ex.dot(&to_p3);
    let ey_raw = to_p3 - ex * i;
    let j = ey_raw.norm();
    if j <= DEGENERACY_EPS {
        return Err(SolveError::Geometry {
            details: "anchors are collinear".to_string(),
        });
    }
    let ey = ey_raw / j;
    let ez = ex.cross(&ey);

    // In the canonical frame A1=(0,0,0), A2=(d,0,0), A3=(i,j,0).
    let x = (d * d + d1 * d1 - d2 * d2) / (2.0 * d);
    let y = (i * i + j * j + d1 * d1 - d3 * d3) / (2.0 * j) - (i / j) * x;

    // Inconsistent ranges leave no exact intersection; fall back to the
    // anchor plane rather than failing.
    let z_squared = (d1 * d1 - x * x - y * y).max(0.0);
    let z = match z_sign {
        ZSign::Lower => -z_squared.sqrt(),
        // Auto counts as the upper solution on the closed-form path.
        ZSign::Auto | ZSign::Upper => z_squared.sqrt(),
    };

    let solved = p1 + ex * x + ey * y + ez * z;
    Ok(Position::from_vector(&solved))
}
