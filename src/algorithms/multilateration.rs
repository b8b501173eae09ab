//! N-anchor multilateration
//!
//! For more than three participating anchors the squared-distance equations
//! are linearized against a reference anchor and solved as an overdetermined
//! least-squares system via the normal equations. nalgebra is used only as a
//! small fixed-size matrix primitive; the formulation itself is written out
//! here so there is no opaque solver dependency.

use crate::algorithms::trilateration::trilaterate;
use crate::core::types::{AnchorId, AnchorTable, MeasurementCycle, Position, ZSign};
use crate::validation::error::SolveError;
use nalgebra::{DMatrix, DVector};

/// Determinant magnitude below which the normal equations are treated as
/// rank-deficient.
const RANK_EPS: f64 = 1e-12;

/// Solve for a position from every anchor that has both a known position and
/// a distance sample this cycle.
///
/// Validation runs in a fixed order and the first failing check determines
/// the error: fewer than 3 known anchor positions, fewer than 3 samples,
/// fewer than 3 anchors in the intersection of the two.
///
/// Exactly three common anchors use the closed-form solve (the linearized
/// system is underdetermined there); four or more use least squares, after
/// which an `Upper`/`Lower` sign policy forces the sign of z while `Auto`
/// leaves the solved z untouched.
pub fn multilaterate(
    table: &AnchorTable,
    cycle: &MeasurementCycle,
    z_sign: ZSign,
) -> Result<Position, SolveError> {
    if table.len() < 3 {
        return Err(SolveError::InsufficientAnchors {
            available: table.len(),
        });
    }
    if cycle.len() < 3 {
        return Err(SolveError::InsufficientData {
            available: cycle.len(),
        });
    }

    let mut matched: Vec<AnchorId> = cycle
        .keys()
        .filter(|id| table.contains_key(*id))
        .copied()
        .collect();
    if matched.len() < 3 {
        return Err(SolveError::NoCommonAnchors {
            matched: matched.len(),
        });
    }
    // Lowest id becomes the reference anchor, for determinism.
    matched.sort_unstable();

    if matched.len() == 3 {
        let anchors = [
            table[&matched[0]],
            table[&matched[1]],
            table[&matched[2]],
        ];
        let distances = [
            cycle[&matched[0]],
            cycle[&matched[1]],
            cycle[&matched[2]],
        ];
        return trilaterate(&anchors, &distances, z_sign);
    }

    // One row per non-reference anchor i, from subtracting the reference
    // anchor's squared-distance equation:
    //   2 (Pi - P0) . p = (d0^2 - di^2) + (|Pi|^2 - |P0|^2)
    let p0 = table[&matched[0]];
    let d0 = cycle[&matched[0]];
    let rows = matched.len() - 1;
    let mut a = DMatrix::<f64>::zeros(rows, 3);
    let mut b = DVector::<f64>::zeros(rows);
    for (row, id) in matched[1..].iter().enumerate() {
        let pi = table[id];
        let di = cycle[id];
        let delta = pi - p0;
        a[(row, 0)] = 2.0 * delta.x;
        a[(row, 1)] = 2.0 * delta.y;
        a[(row, 2)] = 2.0 * delta.z;
        b[row] = (d0 * d0 - di * di) + (pi.norm_squared() - p0.norm_squared());
    }

    // Normal equations: (A^T A) p = A^T b, a 3x3 solve.
    let ata = a.transpose() * &a;
    let atb = a.transpose() * &b;
    if ata.determinant().abs() <= RANK_EPS {
        return Err(SolveError::Geometry {
            details: "normal equations are rank-deficient".to_string(),
        });
    }
    let solution = ata.lu().solve(&atb).ok_or_else(|| SolveError::Geometry {
        details: "normal equations are singular".to_string(),
    })?;

    let z = match z_sign {
        ZSign::Auto => solution[2],
        ZSign::Upper => solution[2].abs(),
        ZSign::Lower => -solution[2].abs(),
    };
    Ok(Position::new(solution[0], solution[1], z))
}
