//! Vector geometry of mesh elements:
//! lengths, areas, volumes, centroids and outward normals of ports.
//!
//! These are pure functions without error conditions.
//! Callers are expected to give them non-degenerate geometry;
//! degenerate input produces meaningless (possibly NaN) results rather than a panic.

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::{shape::ShapeKind, UnitVec3, Vec3};

/// Decomposition used to compute the volume of hexahedra.
///
/// The two agree on hexahedra with planar faces
/// but differ on strongly skewed cells,
/// which is why both are available for cross-checking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexVolumeMethod {
    /// Three triple products sharing the long diagonal of the cell
    /// (Grandy 1997, "Efficient computation of volume of hexahedral cells").
    /// Exact for the trilinear hexahedron.
    #[default]
    LongDiagonal,
    /// Every face fanned into four triangles through its centroid,
    /// each triangle closed into a tetrahedron at the cell centroid.
    Tetrakis,
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    (b - a).magnitude()
}

/// The scalar triple product `v1 · (v2 × v3)`.
#[inline]
pub fn triple_product(v1: &Vec3, v2: &Vec3, v3: &Vec3) -> f64 {
    v1.dot(&v2.cross(v3))
}

/// The average of a set of points.
pub fn centroid(points: &[Vec3]) -> Vec3 {
    points.iter().fold(Vec3::zeros(), |acc, p| acc + p) / points.len() as f64
}

/// Area of the triangle `abc`.
#[inline]
pub fn triangle_area(a: &Vec3, b: &Vec3, c: &Vec3) -> f64 {
    0.5 * (b - a).cross(&(c - a)).magnitude()
}

/// Area of a quadrangle given its corners in order,
/// as the sum of the four triangles fanned through its centroid.
///
/// Unlike a split along one diagonal, this doesn't depend on which diagonal is chosen,
/// and stays reasonable for quadrangles that aren't quite planar.
pub fn quadrangle_area(corners: &[Vec3]) -> f64 {
    assert!(corners.len() == 4, "a quadrangle has four corners");
    let center = centroid(corners);
    (0..4)
        .map(|i| triangle_area(&corners[i], &corners[(i + 1) % 4], &center))
        .sum()
}

fn signed_tetrahedron_volume(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> f64 {
    triple_product(&(b - a), &(c - a), &(d - a)) / 6.
}

/// Volume of the tetrahedron `abcd`.
#[inline]
pub fn tetrahedron_volume(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> f64 {
    signed_tetrahedron_volume(a, b, c, d).abs()
}

/// Volume of a polyhedron with consistently oriented faces,
/// computed from tetrahedra between the cell centroid
/// and the triangles fanned through each face centroid.
fn fanned_volume(points: &[Vec3], faces: &[&[usize]]) -> f64 {
    let center = centroid(points);
    let mut face_points: Vec<Vec3> = Vec::with_capacity(4);
    let mut volume = 0.;
    for face in faces {
        face_points.clear();
        face_points.extend(face.iter().map(|&i| points[i]));
        if face_points.len() == 3 {
            volume += signed_tetrahedron_volume(
                &center,
                &face_points[0],
                &face_points[1],
                &face_points[2],
            );
            continue;
        }
        let face_center = centroid(&face_points);
        for i in 0..face_points.len() {
            let next = (i + 1) % face_points.len();
            volume += signed_tetrahedron_volume(
                &center,
                &face_center,
                &face_points[i],
                &face_points[next],
            );
        }
    }
    volume.abs()
}

/// Hexahedron volume by the long-diagonal decomposition.
///
/// Corners are in Gmsh order: the bottom face counterclockwise, then the top face.
pub fn hexahedron_volume_long_diagonal(corners: &[Vec3]) -> f64 {
    assert!(corners.len() == 8, "a hexahedron has eight corners");
    // reorder into the binary corner numbering of the formula,
    // where corner i sits at (i & 1, i >> 1 & 1, i >> 2 & 1) on the unit cube
    let c = [
        corners[0], corners[1], corners[3], corners[2], corners[4], corners[5], corners[7],
        corners[6],
    ];
    let diagonal = c[7] - c[0];
    let volume = triple_product(&diagonal, &(c[1] - c[0]), &(c[3] - c[5]))
        + triple_product(&diagonal, &(c[4] - c[0]), &(c[5] - c[6]))
        + triple_product(&diagonal, &(c[2] - c[0]), &(c[6] - c[3]));
    volume.abs() / 6.
}

/// Hexahedron volume by the tetrakis decomposition
/// (24 tetrahedra, four per face).
///
/// Corners are in Gmsh order, as in [`hexahedron_volume_long_diagonal`].
pub fn hexahedron_volume_tetrakis(corners: &[Vec3]) -> f64 {
    assert!(corners.len() == 8, "a hexahedron has eight corners");
    fanned_volume(corners, ShapeKind::Hexahedron.faces())
}

/// Hexahedron volume with the chosen decomposition.
#[inline]
pub fn hexahedron_volume(corners: &[Vec3], method: HexVolumeMethod) -> f64 {
    match method {
        HexVolumeMethod::LongDiagonal => hexahedron_volume_long_diagonal(corners),
        HexVolumeMethod::Tetrakis => hexahedron_volume_tetrakis(corners),
    }
}

/// Volume of a triangular prism with corners in Gmsh order.
pub fn prism_volume(corners: &[Vec3]) -> f64 {
    assert!(corners.len() == 6, "a prism has six corners");
    fanned_volume(corners, ShapeKind::Prism.faces())
}

/// Volume of a pyramid with the base corners first and the apex last.
pub fn pyramid_volume(corners: &[Vec3]) -> f64 {
    assert!(corners.len() == 5, "a pyramid has five corners");
    fanned_volume(corners, ShapeKind::Pyramid.faces())
}

/// Measure of a port face given its corners:
/// 1 for a point (unit cross-section), the length of a segment,
/// or the area of a triangle or quadrangle.
pub fn face_measure(corners: &[Vec3]) -> f64 {
    match corners.len() {
        1 => 1.,
        2 => distance(&corners[0], &corners[1]),
        3 => triangle_area(&corners[0], &corners[1], &corners[2]),
        4 => quadrangle_area(corners),
        // face tables in `shape` only list faces of one to four corners
        n => unreachable!("no port face has {n} corners"),
    }
}

/// Length, area or volume of an element, depending on its dimension.
pub fn element_measure(shape: ShapeKind, corners: &[Vec3], hex_method: HexVolumeMethod) -> f64 {
    match shape {
        ShapeKind::Point => 0.,
        ShapeKind::Line => distance(&corners[0], &corners[1]),
        ShapeKind::Triangle => triangle_area(&corners[0], &corners[1], &corners[2]),
        ShapeKind::Quadrangle => quadrangle_area(corners),
        ShapeKind::Tetrahedron => {
            tetrahedron_volume(&corners[0], &corners[1], &corners[2], &corners[3])
        }
        ShapeKind::Hexahedron => hexahedron_volume(corners, hex_method),
        ShapeKind::Prism => prism_volume(corners),
        ShapeKind::Pyramid => pyramid_volume(corners),
    }
}

/// Per-port geometry of one element.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometricalVariables {
    /// Centroid of the element.
    pub centroid: Vec3,
    /// Distance from the element centroid to each port face's centroid.
    pub port_lengths: Vec<f64>,
    /// Measure of each port face (see [`face_measure`]).
    pub port_areas: Vec<f64>,
    /// Length, area or volume of the element itself.
    pub measure: f64,
}

/// Compute the port lengths, port areas and centroid of an element.
pub fn geometrical_variables(
    shape: ShapeKind,
    corners: &[Vec3],
    hex_method: HexVolumeMethod,
) -> GeometricalVariables {
    let center = centroid(corners);
    let mut face_points: Vec<Vec3> = Vec::with_capacity(4);
    let mut port_lengths = Vec::with_capacity(shape.faces().len());
    let mut port_areas = Vec::with_capacity(shape.faces().len());
    for face in shape.faces() {
        face_points.clear();
        face_points.extend(face.iter().map(|&i| corners[i]));
        port_lengths.push(distance(&center, &centroid(&face_points)));
        port_areas.push(face_measure(&face_points));
    }
    GeometricalVariables {
        centroid: center,
        port_lengths,
        port_areas,
        measure: element_measure(shape, corners, hex_method),
    }
}

/// If all the points lie in a plane normal to one of the coordinate axes,
/// return the index of that axis.
fn principal_plane(points: &[Vec3]) -> Option<usize> {
    let (min, max) = points.iter().skip(1).fold((points[0], points[0]), |(lo, hi), p| {
        (lo.inf(p), hi.sup(p))
    });
    let extent = max - min;
    let tolerance = 1e-12 * (1. + extent.amax());
    (0..3).find(|&axis| extent[axis] <= tolerance)
}

/// Compute the outward unit normal of every port face of an element.
///
/// Each normal is perpendicular to an edge lying in its face
/// and points away from the element centroid.
/// For surface elements the normals lie in the element's plane;
/// surfaces lying in a coordinate plane get their normals
/// by rotating the edge within that plane, which keeps them exactly in the plane.
pub fn outward_normals(shape: ShapeKind, corners: &[Vec3]) -> Vec<UnitVec3> {
    let center = centroid(corners);
    let plane_axis = if shape.dimension() == 2 {
        principal_plane(corners)
    } else {
        None
    };

    let mut face_points: Vec<Vec3> = Vec::with_capacity(4);
    shape
        .faces()
        .iter()
        .map(|face| {
            face_points.clear();
            face_points.extend(face.iter().map(|&i| corners[i]));
            let outward = centroid(&face_points) - center;
            let normal = match shape.dimension() {
                1 => outward,
                2 => {
                    let edge = face_points[1] - face_points[0];
                    match plane_axis {
                        Some(axis) => edge.cross(&Vec3::ith(axis, 1.)),
                        // remove the component along the edge,
                        // leaving the in-plane perpendicular
                        None => outward - edge * (outward.dot(&edge) / edge.dot(&edge)),
                    }
                }
                _ => (face_points[1] - face_points[0]).cross(&(face_points[2] - face_points[0])),
            };
            let normal = if normal.dot(&outward) < 0. {
                -normal
            } else {
                normal
            };
            na::Unit::new_normalize(normal)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn unit_cube() -> Vec<Vec3> {
        vec![
            Vec3::new(0., 0., 0.),
            Vec3::new(1., 0., 0.),
            Vec3::new(1., 1., 0.),
            Vec3::new(0., 1., 0.),
            Vec3::new(0., 0., 1.),
            Vec3::new(1., 0., 1.),
            Vec3::new(1., 1., 1.),
            Vec3::new(0., 1., 1.),
        ]
    }

    /// Volume of a hexahedron as six tetrahedra around the diagonal from corner 0 to 6.
    fn six_tetrahedra_volume(c: &[Vec3]) -> f64 {
        [[0, 1, 2, 6], [0, 2, 3, 6], [0, 3, 7, 6], [0, 7, 4, 6], [0, 4, 5, 6], [0, 5, 1, 6]]
            .iter()
            .map(|t| tetrahedron_volume(&c[t[0]], &c[t[1]], &c[t[2]], &c[t[3]]))
            .sum()
    }

    #[test]
    fn right_triangle_area_is_exact() {
        let area = triangle_area(
            &Vec3::new(0., 0., 0.),
            &Vec3::new(3., 0., 0.),
            &Vec3::new(0., 4., 0.),
        );
        assert_eq!(area, 6.0);
        assert_eq!(distance(&Vec3::new(0., 4., 0.), &Vec3::new(3., 0., 0.)), 5.0);
    }

    #[test]
    fn cube_volumes_agree() {
        let cube = unit_cube();
        let by_tets = six_tetrahedra_volume(&cube);
        let long_diagonal = hexahedron_volume_long_diagonal(&cube);
        let tetrakis = hexahedron_volume_tetrakis(&cube);
        assert_abs_diff_eq!(by_tets, 1., epsilon = 1e-12);
        assert_abs_diff_eq!(long_diagonal, by_tets, epsilon = 1e-12);
        assert_abs_diff_eq!(tetrakis, by_tets, epsilon = 1e-12);
        assert_abs_diff_eq!(
            hexahedron_volume(&cube, HexVolumeMethod::Tetrakis),
            tetrakis
        );
    }

    #[test]
    fn long_diagonal_matches_tetrahedra_on_skewed_cells() {
        // twisted top face: the faces aren't planar anymore
        let mut cells = unit_cube();
        cells[6] += Vec3::new(0.3, -0.2, 0.4);
        cells[4] += Vec3::new(-0.1, 0.2, 0.);
        let long_diagonal = hexahedron_volume_long_diagonal(&cells);
        let tetrakis = hexahedron_volume_tetrakis(&cells);
        assert!(long_diagonal > 0. && tetrakis > 0.);
        // both are approximations of the same cell,
        // so they should at least be in the same ballpark
        assert_relative_eq!(long_diagonal, tetrakis, max_relative = 0.1);
    }

    #[test]
    fn tetrahedron_and_triple_product() {
        let a = Vec3::new(1., 0., 0.);
        let b = Vec3::new(0., 1., 0.);
        let c = Vec3::new(0., 0., 1.);
        assert_eq!(triple_product(&a, &b, &c), 1.);
        assert_eq!(triple_product(&b, &a, &c), -1.);
        assert_relative_eq!(tetrahedron_volume(&Vec3::zeros(), &a, &b, &c), 1. / 6.);
        assert_relative_eq!(tetrahedron_volume(&Vec3::zeros(), &b, &a, &c), 1. / 6.);
    }

    #[test]
    fn prism_and_pyramid_volumes() {
        let cube = unit_cube();
        let prism = [cube[0], cube[1], cube[3], cube[4], cube[5], cube[7]];
        assert_relative_eq!(prism_volume(&prism), 0.5, epsilon = 1e-12);

        let pyramid = [cube[0], cube[1], cube[2], cube[3], Vec3::new(0.5, 0.5, 3.)];
        assert_relative_eq!(pyramid_volume(&pyramid), 1., epsilon = 1e-12);
        assert_relative_eq!(
            element_measure(ShapeKind::Pyramid, &pyramid, HexVolumeMethod::LongDiagonal),
            1.,
            epsilon = 1e-12
        );
    }

    #[test]
    fn quadrangle_area_is_diagonal_independent() {
        let square = [
            Vec3::new(0., 0., 0.),
            Vec3::new(2., 0., 0.),
            Vec3::new(2., 1., 0.),
            Vec3::new(0., 1., 0.),
        ];
        assert_relative_eq!(quadrangle_area(&square), 2.);

        // a bent quadrangle gives the same area whichever corner comes first
        let bent = [
            Vec3::new(0., 0., 0.),
            Vec3::new(1., 0., 0.2),
            Vec3::new(1., 1., 0.),
            Vec3::new(0., 1., 0.3),
        ];
        let rotated = [bent[1], bent[2], bent[3], bent[0]];
        assert_relative_eq!(quadrangle_area(&bent), quadrangle_area(&rotated), epsilon = 1e-14);
        assert!(quadrangle_area(&bent) > 1.);
    }

    #[test]
    fn square_variables() {
        let square = [
            Vec3::new(0., 0., 0.),
            Vec3::new(1., 0., 0.),
            Vec3::new(1., 1., 0.),
            Vec3::new(0., 1., 0.),
        ];
        let vars =
            geometrical_variables(ShapeKind::Quadrangle, &square, HexVolumeMethod::default());
        assert_eq!(vars.centroid, Vec3::new(0.5, 0.5, 0.));
        for (length, area) in vars.port_lengths.iter().zip(&vars.port_areas) {
            assert_relative_eq!(*length, 0.5);
            assert_relative_eq!(*area, 1.);
        }
        assert_relative_eq!(vars.measure, 1.);

        let line = [Vec3::new(0., 0., 0.), Vec3::new(0., 0., 4.)];
        let vars = geometrical_variables(ShapeKind::Line, &line, HexVolumeMethod::default());
        assert_eq!(vars.port_lengths, vec![2., 2.]);
        assert_eq!(vars.port_areas, vec![1., 1.]);
        assert_eq!(vars.measure, 4.);
    }

    #[test]
    fn every_face_table_entry_has_a_measure() {
        let cube = unit_cube();
        for shape in ShapeKind::ALL {
            for face in shape.faces() {
                let points: Vec<Vec3> = face.iter().map(|&i| cube[i]).collect();
                assert!(face_measure(&points).is_finite());
            }
        }
    }

    #[test]
    #[should_panic(expected = "no port face has 5 corners")]
    fn five_corner_faces_are_rejected() {
        face_measure(&unit_cube()[..5]);
    }

    /// Check normals, port areas and port lengths face by face against the face tables.
    fn check_faces(shape: ShapeKind, corners: &[Vec3], expected: &[(Vec3, f64, f64)]) {
        let normals = outward_normals(shape, corners);
        let vars = geometrical_variables(shape, corners, HexVolumeMethod::default());
        assert_eq!(normals.len(), expected.len());
        for (i, (normal, area, length)) in expected.iter().enumerate() {
            assert_relative_eq!(normals[i].into_inner(), normal.normalize(), epsilon = 1e-12);
            assert_relative_eq!(vars.port_areas[i], *area, epsilon = 1e-12);
            assert_relative_eq!(vars.port_lengths[i], *length, epsilon = 1e-12);
        }
    }

    #[test]
    fn tetrahedron_prism_and_pyramid_faces() {
        let o = Vec3::zeros();
        let (x, y, z) = (Vec3::x(), Vec3::y(), Vec3::z());

        let s3 = 3f64.sqrt();
        check_faces(
            ShapeKind::Tetrahedron,
            &[o, x, y, z],
            &[
                (-z, 0.5, 11f64.sqrt() / 12.),
                (-y, 0.5, 11f64.sqrt() / 12.),
                (-x, 0.5, 11f64.sqrt() / 12.),
                (Vec3::new(1., 1., 1.), s3 / 2., s3 / 12.),
            ],
        );

        let s5 = 5f64.sqrt();
        check_faces(
            ShapeKind::Prism,
            &[o, x, y, z, x + z, y + z],
            &[
                (-z, 0.5, 0.5),
                (z, 0.5, 0.5),
                (-y, 1., s5 / 6.),
                (-x, 1., s5 / 6.),
                (Vec3::new(1., 1., 0.), 2f64.sqrt(), 2f64.sqrt() / 6.),
            ],
        );

        let apex = Vec3::new(0.5, 0.5, 1.);
        let pyramid = [o, x, x + y, y, apex];
        let vars = geometrical_variables(ShapeKind::Pyramid, &pyramid, HexVolumeMethod::default());
        assert_relative_eq!(vars.centroid, Vec3::new(0.5, 0.5, 0.2), epsilon = 1e-12);
        assert_relative_eq!(vars.measure, 1. / 3., epsilon = 1e-12);
        // side face centroids sit a third of the way up to the apex
        let side = (1f64 / 9. + (2f64 / 15.).powi(2)).sqrt();
        check_faces(
            ShapeKind::Pyramid,
            &pyramid,
            &[
                (-z, 1., 0.2),
                (Vec3::new(0., -2., 1.), s5 / 4., side),
                (Vec3::new(-2., 0., 1.), s5 / 4., side),
                (Vec3::new(2., 0., 1.), s5 / 4., side),
                (Vec3::new(0., 2., 1.), s5 / 4., side),
            ],
        );
    }

    #[test]
    fn normals_of_a_square_in_the_xy_plane() {
        let square = [
            Vec3::new(0., 0., 0.),
            Vec3::new(1., 0., 0.),
            Vec3::new(1., 1., 0.),
            Vec3::new(0., 1., 0.),
        ];
        let normals = outward_normals(ShapeKind::Quadrangle, &square);
        let expected = [
            Vec3::new(0., -1., 0.),
            Vec3::new(1., 0., 0.),
            Vec3::new(0., 1., 0.),
            Vec3::new(-1., 0., 0.),
        ];
        for (n, e) in normals.iter().zip(&expected) {
            assert_eq!(n.into_inner(), *e);
        }
    }

    #[test]
    fn normals_point_outward_and_along_faces() {
        // a triangle tilted out of every coordinate plane
        let tri = [
            Vec3::new(0., 0., 0.),
            Vec3::new(1., 0.2, 0.5),
            Vec3::new(0.1, 1., 0.7),
        ];
        let plane_normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
        let center = centroid(&tri);
        for (face, n) in ShapeKind::Triangle
            .faces()
            .iter()
            .zip(outward_normals(ShapeKind::Triangle, &tri))
        {
            let edge = tri[face[1]] - tri[face[0]];
            assert_abs_diff_eq!(n.dot(&edge), 0., epsilon = 1e-12);
            assert_abs_diff_eq!(n.dot(&plane_normal), 0., epsilon = 1e-12);
            let mid = (tri[face[0]] + tri[face[1]]) / 2.;
            assert!(n.dot(&(mid - center)) > 0.);
        }

        let cube = unit_cube();
        let center = centroid(&cube);
        let normals = outward_normals(ShapeKind::Hexahedron, &cube);
        assert_eq!(normals.len(), 6);
        for (face, n) in ShapeKind::Hexahedron.faces().iter().zip(&normals) {
            let face_points: Vec<Vec3> = face.iter().map(|&i| cube[i]).collect();
            let out = centroid(&face_points) - center;
            // on a cube the normal is exactly the direction to the face center
            assert_relative_eq!(n.into_inner(), out.normalize(), epsilon = 1e-14);
        }

        let line = [Vec3::new(1., 1., 1.), Vec3::new(2., 1., 1.)];
        let normals = outward_normals(ShapeKind::Line, &line);
        assert_eq!(normals[0].into_inner(), Vec3::new(-1., 0., 0.));
        assert_eq!(normals[1].into_inner(), Vec3::new(1., 0., 0.));
    }
}
