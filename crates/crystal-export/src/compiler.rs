//! Lattice-to-geometry compiler
//!
//! Walks the flipped symbol matrix and turns every etched site into
//! shape directives with metric coordinates:
//! - circles become a single `addcircle`
//! - curves become a ten-vertex polygon plus a fillet circle, mirrored or
//!   shifted according to which neighbouring sites are empty
//! - sources and monitors are recorded as device placements for the scene

use crate::catalog::{Site, FILLET_RADIUS_FRACTION};
use crate::config::BoundaryPolicy;
use crate::crystal::Crystal;
use crate::directive::{Directive, DirectiveStream, ETCH_MATERIAL};
use crate::error::{CrystalError, Result};
use crate::grid::SymbolMatrix;
use nalgebra::{Point2, Vector2};
use tracing::debug;

/// A source or monitor site, numbered in compile order from 1
#[derive(Debug, Clone, PartialEq)]
pub struct DevicePlacement {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub position: Point2<f64>,
}

/// Everything one crystal compiles to
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCrystal {
    pub stream: DirectiveStream,
    pub sources: Vec<DevicePlacement>,
    pub monitors: Vec<DevicePlacement>,
}

/// Emptiness of the six sites around a curve ("up" is `row + 1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurveNeighbors {
    pub up_left: bool,
    pub up: bool,
    pub up_right: bool,
    pub down_left: bool,
    pub down: bool,
    pub down_right: bool,
}

/// Orientation of a curve, named after the empty neighbours that select it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveCase {
    UpLeftAndUp,
    UpAndUpRight,
    DownLeftAndDown,
    DownAndDownRight,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Straight,
}

/// Affine map applied to the canonical outline: `v ↦ v ∘ scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveTransform {
    pub scale: Vector2<f64>,
    pub offset: Vector2<f64>,
    /// Sign applied to each component of the fillet displacement
    pub fillet_sign: Vector2<f64>,
}

impl CurveNeighbors {
    /// First matching case wins; pairs are checked before single sites.
    pub fn classify(&self) -> CurveCase {
        if self.up_left && self.up {
            CurveCase::UpLeftAndUp
        } else if self.up && self.up_right {
            CurveCase::UpAndUpRight
        } else if self.down_left && self.down {
            CurveCase::DownLeftAndDown
        } else if self.down && self.down_right {
            CurveCase::DownAndDownRight
        } else if self.up_left {
            CurveCase::UpLeft
        } else if self.up_right {
            CurveCase::UpRight
        } else if self.down_left {
            CurveCase::DownLeft
        } else if self.down_right {
            CurveCase::DownRight
        } else {
            CurveCase::Straight
        }
    }
}

impl CurveCase {
    pub fn transform(self, a: f64, h: f64) -> CurveTransform {
        let (sx, sy, ox, oy, fx, fy) = match self {
            CurveCase::UpLeftAndUp => (-1.0, -1.0, 1.5 * a, h, 1.0, 1.0),
            CurveCase::UpAndUpRight => (-1.0, 1.0, 2.0 * a, 0.0, -1.0, 1.0),
            CurveCase::DownLeftAndDown => (-1.0, 1.0, 1.5 * a, -h, 1.0, -1.0),
            CurveCase::DownAndDownRight => (-1.0, -1.0, 2.0 * a, 0.0, -1.0, -1.0),
            CurveCase::UpLeft => (1.0, 1.0, -2.0 * a, 0.0, 1.0, 1.0),
            CurveCase::UpRight => (1.0, -1.0, -1.5 * a, h, -1.0, 1.0),
            CurveCase::DownLeft => (1.0, -1.0, -2.0 * a, 0.0, 1.0, -1.0),
            CurveCase::DownRight => (1.0, 1.0, -1.5 * a, -h, -1.0, -1.0),
            CurveCase::Straight => (1.0, 1.0, 0.0, 0.0, 1.0, 1.0),
        };
        CurveTransform {
            scale: Vector2::new(sx, sy),
            offset: Vector2::new(ox, oy),
            fillet_sign: Vector2::new(fx, fy),
        }
    }
}

impl CurveTransform {
    pub fn apply(&self, v: &Vector2<f64>) -> Vector2<f64> {
        v.component_mul(&self.scale) + self.offset
    }
}

fn polar(degrees: f64, r: f64) -> Vector2<f64> {
    let theta = degrees.to_radians();
    Vector2::new(theta.cos() * r, theta.sin() * r)
}

/// Curve outline in the site's local frame, before orientation
pub fn canonical_curve(a: f64, h: f64, r: f64) -> Vec<Vector2<f64>> {
    vec![
        Vector2::new(0.0, r),
        Vector2::new(a, r),
        Vector2::new(2.5 * a, h) + polar(120.0, r),
        Vector2::new(3.0 * a, 2.0 * h) + polar(150.0, r),
        Vector2::new(3.0 * a, 2.0 * h) + polar(-30.0, r),
        Vector2::new(2.5 * a, h) + polar(-30.0, r),
        Vector2::new(2.5 * a, h) + polar(-60.0, r),
        Vector2::new(a, 0.0) + polar(-60.0, r),
        Vector2::new(a, -r),
        Vector2::new(0.0, -r),
    ]
}

/// Fillet displacement from the curve's site before sign adjustment
pub fn fillet_offset(a: f64) -> Vector2<f64> {
    polar(-60.0, a / 3.0)
}

/// Metric position of a site: odd rows (relative to `first_null`) shift by `a/2`
pub fn site_position(matrix: &SymbolMatrix, row: usize, col: usize, a: f64, h: f64) -> Point2<f64> {
    let x = if matrix.is_offset_row(row) {
        col as f64 * a + a / 2.0
    } else {
        col as f64 * a
    };
    Point2::new(x, row as f64 * h)
}

/// Compiles crystals into directive streams.
///
/// Source and monitor numbering restarts on every `compile` call.
#[derive(Debug, Clone, Default)]
pub struct GeometryCompiler {
    boundary: BoundaryPolicy,
    source_index: usize,
    monitor_index: usize,
}

impl GeometryCompiler {
    pub fn new(boundary: BoundaryPolicy) -> Self {
        Self {
            boundary,
            ..Self::default()
        }
    }

    pub fn compile(&mut self, crystal: &Crystal) -> Result<CompiledCrystal> {
        self.source_index = 0;
        self.monitor_index = 0;

        let matrix = crystal.grid.to_matrix()?;
        let (a, h, zspan) = (crystal.a, crystal.h(), crystal.zspan);

        let mut stream = DirectiveStream::new();
        let mut sources = Vec::new();
        let mut monitors = Vec::new();

        for (row, col, site) in matrix.cells() {
            let position = site_position(&matrix, row, col, a, h);

            match site {
                Site::None => {}
                Site::Circle { radius_fraction } => {
                    stream.push(Directive::AddCircle {
                        center: position,
                        radius: a * radius_fraction,
                        z: 0.0,
                        z_span: zspan,
                        material: ETCH_MATERIAL.to_string(),
                    });
                }
                Site::Curve { radius_fraction } => {
                    let neighbors = self.curve_neighbors(&matrix, row, col)?;
                    let case = neighbors.classify();
                    debug!("Curve at ({}, {}) oriented as {:?}", row, col, case);

                    let transform = case.transform(a, h);
                    let vertices = canonical_curve(a, h, a * radius_fraction)
                        .iter()
                        .map(|v| transform.apply(v))
                        .collect();
                    let fillet = fillet_offset(a).component_mul(&transform.fillet_sign);

                    stream.push(Directive::AddPolygon {
                        center: position,
                        vertices,
                        z_span: zspan,
                        material: ETCH_MATERIAL.to_string(),
                    });
                    stream.push(Directive::AddCircle {
                        center: position + fillet,
                        radius: a * FILLET_RADIUS_FRACTION,
                        z: 0.0,
                        z_span: zspan,
                        material: ETCH_MATERIAL.to_string(),
                    });
                }
                Site::Source => {
                    self.source_index += 1;
                    sources.push(DevicePlacement {
                        index: self.source_index,
                        row,
                        col,
                        position,
                    });
                }
                Site::Monitor => {
                    self.monitor_index += 1;
                    monitors.push(DevicePlacement {
                        index: self.monitor_index,
                        row,
                        col,
                        position: position + Vector2::new(crystal.x_init, 0.0),
                    });
                }
                Site::Junction { .. } => {
                    debug!("Junction at ({}, {}) has no geometry yet, skipped", row, col);
                }
            }
        }

        debug!(
            "Crystal '{}' compiled: {} directives, {} sources, {} monitors",
            crystal.name,
            stream.len(),
            sources.len(),
            monitors.len()
        );

        Ok(CompiledCrystal {
            stream,
            sources,
            monitors,
        })
    }

    fn curve_neighbors(&self, matrix: &SymbolMatrix, row: usize, col: usize) -> Result<CurveNeighbors> {
        let empty = |dr: isize, dc: isize| -> Result<bool> {
            match matrix.neighbor(row as isize + dr, col as isize + dc) {
                Some(site) => Ok(site.is_empty()),
                None => match self.boundary {
                    BoundaryPolicy::Empty => Ok(true),
                    BoundaryPolicy::Reject => Err(CrystalError::NeighborBounds { row, col }),
                },
            }
        };

        Ok(CurveNeighbors {
            up_left: empty(1, -1)?,
            up: empty(1, 0)?,
            up_right: empty(1, 1)?,
            down_left: empty(-1, -1)?,
            down: empty(-1, 0)?,
            down_right: empty(-1, 1)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystal::{row_pitch, DEFAULT_ZSPAN};
    use crate::grid::LatticeGrid;

    const A: f64 = 0.426e-6;

    fn crystal(text: &str) -> Crystal {
        Crystal::new("pc", LatticeGrid::from_text(text), A, DEFAULT_ZSPAN)
    }

    fn assert_close(a: &Vector2<f64>, b: &Vector2<f64>) {
        assert!((a - b).norm() < 1e-18, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_circle_radius_and_position() {
        let crystal = crystal("0 1 2 \n3 4 5 \n");
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        let h = row_pitch(A);

        let circles: Vec<_> = compiled.stream.circles().collect();
        assert_eq!(circles.len(), 6);

        // Row 0 is the last stored line and is not offset
        let symbols = ["3", "4", "5", "0", "1", "2"];
        for (i, (center, radius)) in circles.iter().enumerate() {
            let (row, col) = (i / 3, i % 3);
            let Site::Circle { radius_fraction } = Site::from_symbol(symbols[i]) else {
                panic!("expected circle");
            };
            assert_eq!(*radius, A * radius_fraction);
            let x = if row % 2 == 1 { col as f64 * A + A / 2.0 } else { col as f64 * A };
            assert_eq!(center.x, x);
            assert_eq!(center.y, row as f64 * h);
        }
        assert_eq!(compiled.stream.directives()[0], Directive::DeleteAll);
    }

    #[test]
    fn test_single_hole_scenario() {
        // '1' at row 2, column 3; row 2 is even and first_null is false, so no offset
        let text = "0 . . . \n . . . .\n. . . 1 \n . . . .\n. . . . \n";
        let crystal = crystal(text);
        assert!(!crystal.grid.first_null());

        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        let circles: Vec<_> = compiled.stream.circles().collect();
        let (center, radius) = circles
            .iter()
            .find(|(c, _)| c.y > 0.0 && c.y < 4.0 * row_pitch(A))
            .unwrap();

        assert_eq!(*radius, 0.38 * 0.426e-6);
        assert_eq!(center.x, 3.0 * 0.426e-6);
        assert_eq!(center.y, 2.0 * (0.426e-6 * 3f64.sqrt() / 2.0));
    }

    #[test]
    fn test_first_null_moves_offset_to_even_rows() {
        let crystal = crystal(" 0 0\n0 0 \n 0 0\n");
        assert!(crystal.grid.first_null());
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        let xs: Vec<f64> = compiled.stream.circles().map(|(c, _)| c.x).collect();
        assert_eq!(xs, vec![A / 2.0, A + A / 2.0, 0.0, A, A / 2.0, A + A / 2.0]);
    }

    #[test]
    fn test_curve_cases_are_exclusive() {
        // Required empty neighbours per case, in priority order
        type Pred = fn(&CurveNeighbors) -> bool;
        let cases: [(CurveCase, Pred); 8] = [
            (CurveCase::UpLeftAndUp, |n| n.up_left && n.up),
            (CurveCase::UpAndUpRight, |n| n.up && n.up_right),
            (CurveCase::DownLeftAndDown, |n| n.down_left && n.down),
            (CurveCase::DownAndDownRight, |n| n.down && n.down_right),
            (CurveCase::UpLeft, |n| n.up_left),
            (CurveCase::UpRight, |n| n.up_right),
            (CurveCase::DownLeft, |n| n.down_left),
            (CurveCase::DownRight, |n| n.down_right),
        ];

        for bits in 0u8..64 {
            let n = CurveNeighbors {
                up_left: bits & 1 != 0,
                up: bits & 2 != 0,
                up_right: bits & 4 != 0,
                down_left: bits & 8 != 0,
                down: bits & 16 != 0,
                down_right: bits & 32 != 0,
            };
            let expected = cases
                .iter()
                .find(|(_, pred)| pred(&n))
                .map_or(CurveCase::Straight, |(case, _)| *case);
            assert_eq!(n.classify(), expected, "neighbours {:06b}", bits);
        }
    }

    #[test]
    fn test_curve_cases_all_reachable() {
        let mut seen = std::collections::HashSet::new();
        for bits in 0u8..64 {
            let n = CurveNeighbors {
                up_left: bits & 1 != 0,
                up: bits & 2 != 0,
                up_right: bits & 4 != 0,
                down_left: bits & 8 != 0,
                down: bits & 16 != 0,
                down_right: bits & 32 != 0,
            };
            seen.insert(format!("{:?}", n.classify()));
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn test_straight_curve_uses_canonical_outline() {
        let crystal = crystal("0 0 0 \n 0 c 0\n0 0 0 \n");
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        let h = row_pitch(A);

        let polygons: Vec<_> = compiled.stream.polygons().collect();
        assert_eq!(polygons.len(), 1);
        let (center, vertices) = polygons[0];
        assert_eq!(*center, Point2::new(A + A / 2.0, h));
        assert_eq!(vertices.len(), 10);
        for (v, c) in vertices.iter().zip(canonical_curve(A, h, 0.38 * A)) {
            assert_close(v, &c);
        }

        // Polygon is followed by its fillet
        let Directive::AddCircle { center: fillet, radius, .. } = &compiled.stream.directives()[6]
        else {
            panic!("expected fillet circle after polygon");
        };
        assert_eq!(*radius, 0.20 * A);
        assert_close(&(*fillet - *center), &Vector2::new(A / 6.0, -A * 3f64.sqrt() / 6.0));
    }

    #[test]
    fn test_curve_up_left_shifts_outline() {
        let crystal = crystal(". 0 0 \n 0 c 0\n0 0 0 \n");
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        let h = row_pitch(A);

        let (_, vertices) = compiled.stream.polygons().next().unwrap();
        for (v, c) in vertices.iter().zip(canonical_curve(A, h, 0.38 * A)) {
            assert_close(v, &Vector2::new(c.x - 2.0 * A, c.y));
        }
    }

    #[test]
    fn test_curve_down_pair_mirrors_outline_and_fillet() {
        // Row 0 holds down-left and down of the curve at (1, 1)
        let crystal = crystal("0 0 0 \n 0 c 0\n. . 0 \n");
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        let h = row_pitch(A);

        let directives = compiled.stream.directives();
        let (center, vertices) = compiled.stream.polygons().next().unwrap();
        for (v, c) in vertices.iter().zip(canonical_curve(A, h, 0.38 * A)) {
            assert_close(v, &Vector2::new(-c.x + 1.5 * A, c.y - h));
        }
        let fillet = directives
            .iter()
            .rev()
            .find_map(|d| match d {
                Directive::AddCircle { center, radius, .. } if *radius == 0.20 * A => Some(*center),
                _ => None,
            })
            .unwrap();
        assert_close(&(fillet - *center), &Vector2::new(A / 6.0, A * 3f64.sqrt() / 6.0));
    }

    #[test]
    fn test_every_curve_case_transform() {
        let h = row_pitch(A);
        type Map = fn(Vector2<f64>, f64, f64) -> Vector2<f64>;
        let cases: [(CurveCase, Map, (f64, f64)); 9] = [
            (CurveCase::UpLeftAndUp, |v, a, h| Vector2::new(-v.x + 1.5 * a, -v.y + h), (1.0, 1.0)),
            (CurveCase::UpAndUpRight, |v, a, _| Vector2::new(-v.x + 2.0 * a, v.y), (-1.0, 1.0)),
            (CurveCase::DownLeftAndDown, |v, a, h| Vector2::new(-v.x + 1.5 * a, v.y - h), (1.0, -1.0)),
            (CurveCase::DownAndDownRight, |v, a, _| Vector2::new(-v.x + 2.0 * a, -v.y), (-1.0, -1.0)),
            (CurveCase::UpLeft, |v, a, _| Vector2::new(v.x - 2.0 * a, v.y), (1.0, 1.0)),
            (CurveCase::UpRight, |v, a, h| Vector2::new(v.x - 1.5 * a, -v.y + h), (-1.0, 1.0)),
            (CurveCase::DownLeft, |v, a, _| Vector2::new(v.x - 2.0 * a, -v.y), (1.0, -1.0)),
            (CurveCase::DownRight, |v, a, h| Vector2::new(v.x - 1.5 * a, v.y - h), (-1.0, -1.0)),
            (CurveCase::Straight, |v, _, _| v, (1.0, 1.0)),
        ];

        let fillet = fillet_offset(A);
        for (case, expected, (fx, fy)) in cases {
            let transform = case.transform(A, h);
            for v in canonical_curve(A, h, 0.38 * A) {
                let got = transform.apply(&v);
                assert!((got - expected(v, A, h)).norm() < 1e-18, "{:?}: {:?}", case, got);
            }
            assert_eq!(transform.fillet_sign, Vector2::new(fx, fy), "{:?}", case);
            assert_close(
                &fillet.component_mul(&transform.fillet_sign),
                &Vector2::new(fx * A / 6.0, -fy * A * 3f64.sqrt() / 6.0),
            );
        }
    }

    #[test]
    fn test_boundary_policies() {
        let crystal = crystal("c 0 \n 0 0\n");

        let compiled = GeometryCompiler::new(BoundaryPolicy::Empty).compile(&crystal).unwrap();
        assert_eq!(compiled.stream.polygons().count(), 1);

        match GeometryCompiler::new(BoundaryPolicy::Reject).compile(&crystal) {
            Err(CrystalError::NeighborBounds { row, col }) => assert_eq!((row, col), (1, 0)),
            other => panic!("Expected NeighborBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_indices_reset_each_compile() {
        let crystal = crystal("s m s \n m 0 m\n");
        let mut compiler = GeometryCompiler::default();

        for _ in 0..2 {
            let compiled = compiler.compile(&crystal).unwrap();
            let sources: Vec<usize> = compiled.sources.iter().map(|p| p.index).collect();
            let monitors: Vec<usize> = compiled.monitors.iter().map(|p| p.index).collect();
            assert_eq!(sources, vec![1, 2]);
            assert_eq!(monitors, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_monitors_follow_crystal_offset() {
        let mut crystal = crystal("m 0 \n0 0 \n");
        crystal.x_init = 5e-6;
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        // 'm' sits on row 1, which is offset
        assert_eq!(compiled.monitors[0].position.x, 5e-6 + A / 2.0);
    }

    #[test]
    fn test_junction_and_unknown_symbols_emit_nothing() {
        let crystal = crystal("j x . \n ? j .\n");
        let compiled = GeometryCompiler::default().compile(&crystal).unwrap();
        assert_eq!(compiled.stream.directives(), &[Directive::DeleteAll]);
    }

    #[test]
    fn test_malformed_lattice_aborts() {
        let crystal = crystal("0 0 0 \n 0 c\n");
        assert!(matches!(
            GeometryCompiler::default().compile(&crystal),
            Err(CrystalError::MalformedLattice { .. })
        ));
    }
}
