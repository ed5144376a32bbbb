use super::MeshTable;
use crate::{shape::ShapeKind, Vec3};

/// Two line segments sharing their middle node, both tagged 1:
///
/// ```text
/// 1 ---- 2 -------- 3
/// ```
///
/// This is public for visibility in doctests and examples.
/// It is not meant to be used by users and thus hidden from docs.
#[doc(hidden)]
pub fn two_lines_mesh() -> MeshTable {
    MeshTable::new(vec![
        Vec3::new(0., 0., 0.),
        Vec3::new(1., 0., 0.),
        Vec3::new(3., 0., 0.),
    ])
    .with_element(ShapeKind::Line, 1, &[1, 2])
    .with_element(ShapeKind::Line, 1, &[2, 3])
}

/// The unit square split into two triangles tagged 1,
/// with each of its sides a line element of its own tag (10 to 13):
///
/// ```text
/// 4 --12-- 3
/// |      / |
/// 13   /   11
/// |  /     |
/// 1 --10-- 2
/// ```
#[doc(hidden)]
pub fn tagged_square_mesh() -> MeshTable {
    MeshTable::new(vec![
        Vec3::new(0., 0., 0.),
        Vec3::new(1., 0., 0.),
        Vec3::new(1., 1., 0.),
        Vec3::new(0., 1., 0.),
    ])
    .with_element(ShapeKind::Line, 10, &[1, 2])
    .with_element(ShapeKind::Line, 11, &[2, 3])
    .with_element(ShapeKind::Line, 12, &[3, 4])
    .with_element(ShapeKind::Line, 13, &[4, 1])
    .with_element(ShapeKind::Triangle, 1, &[1, 2, 3])
    .with_element(ShapeKind::Triangle, 1, &[1, 3, 4])
}

/// Two unit cubes side by side along the x axis,
/// the first tagged 1 and the second tagged 2.
/// The outer faces at x = 0 and x = 2 are quadrangles tagged 10 and 11.
///
/// Node `1 + x + 3y + 6z` sits at `(x, y, z)`.
#[doc(hidden)]
pub fn hex_pair_mesh() -> MeshTable {
    let mut nodes = Vec::with_capacity(12);
    for z in 0..2 {
        for y in 0..2 {
            for x in 0..3 {
                nodes.push(Vec3::new(x as f64, y as f64, z as f64));
            }
        }
    }
    MeshTable::new(nodes)
        .with_element(ShapeKind::Quadrangle, 10, &[1, 4, 10, 7])
        .with_element(ShapeKind::Quadrangle, 11, &[3, 6, 12, 9])
        .with_element(ShapeKind::Hexahedron, 1, &[1, 2, 5, 4, 7, 8, 11, 10])
        .with_element(ShapeKind::Hexahedron, 2, &[2, 3, 6, 5, 8, 9, 12, 11])
}

/// A unit cube capped by a pyramid, with a tetrahedron leaning on the pyramid's
/// y = 0 side and a triangular prism against the cube's x = 1 side.
/// The cube, prism and tetrahedron are tagged 1, the pyramid 2.
/// The cube's bottom is a quadrangle tagged 10
/// and the tetrahedron's face below the pyramid side is a triangle tagged 11.
///
/// Nodes 1 to 8 are the cube's corners in hexahedron order,
/// 9 is the pyramid apex at `(0.5, 0.5, 2)`,
/// 10 the tetrahedron's free corner at `(0.5, -1, 1)`
/// and 11, 12 the prism's ridge at `x = 2`.
#[doc(hidden)]
pub fn capped_cube_mesh() -> MeshTable {
    MeshTable::new(vec![
        Vec3::new(0., 0., 0.),
        Vec3::new(1., 0., 0.),
        Vec3::new(1., 1., 0.),
        Vec3::new(0., 1., 0.),
        Vec3::new(0., 0., 1.),
        Vec3::new(1., 0., 1.),
        Vec3::new(1., 1., 1.),
        Vec3::new(0., 1., 1.),
        Vec3::new(0.5, 0.5, 2.),
        Vec3::new(0.5, -1., 1.),
        Vec3::new(2., 0.5, 0.),
        Vec3::new(2., 0.5, 1.),
    ])
    .with_element(ShapeKind::Quadrangle, 10, &[1, 2, 3, 4])
    .with_element(ShapeKind::Triangle, 11, &[5, 6, 10])
    .with_element(ShapeKind::Tetrahedron, 1, &[5, 6, 9, 10])
    .with_element(ShapeKind::Hexahedron, 1, &[1, 2, 3, 4, 5, 6, 7, 8])
    .with_element(ShapeKind::Prism, 1, &[2, 3, 11, 6, 7, 12])
    .with_element(ShapeKind::Pyramid, 2, &[5, 6, 7, 8, 9])
}
