//! Element shape codes and their local topology.
//!
//! Local node orderings follow the Gmsh conventions,
//! since that's where meshes for this engine usually come from.
//! Every face listed here is a codimension-1 sub-entity of the shape,
//! and each one of them is a port of the element
//! when the shape has the full dimension of the equation being numbered.

use serde::{Deserialize, Serialize};

use crate::error::NumberingError;

/// The supported element shapes, in shape-code order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A single node.
    Point,
    /// Two-node line segment.
    Line,
    /// Three-node triangle.
    Triangle,
    /// Four-node quadrangle.
    Quadrangle,
    /// Four-node tetrahedron.
    Tetrahedron,
    /// Eight-node hexahedron.
    Hexahedron,
    /// Six-node triangular prism.
    Prism,
    /// Five-node pyramid with a quadrangular base.
    Pyramid,
}

const POINT_FACES: &[&[usize]] = &[];
const LINE_FACES: &[&[usize]] = &[&[0], &[1]];
const TRIANGLE_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const QUADRANGLE_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TETRAHEDRON_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[0, 3, 2], &[1, 2, 3]];
const HEXAHEDRON_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 5, 4],
    &[0, 4, 7, 3],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[4, 5, 6, 7],
];
const PRISM_FACES: &[&[usize]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[0, 3, 5, 2],
    &[1, 2, 5, 4],
];
const PYRAMID_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[0, 4, 3],
    &[1, 2, 4],
    &[2, 3, 4],
];

impl ShapeKind {
    /// Every shape, in shape-code order.
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Point,
        ShapeKind::Line,
        ShapeKind::Triangle,
        ShapeKind::Quadrangle,
        ShapeKind::Tetrahedron,
        ShapeKind::Hexahedron,
        ShapeKind::Prism,
        ShapeKind::Pyramid,
    ];

    /// Position of this shape in [`ShapeKind::ALL`].
    #[inline]
    pub fn code(self) -> usize {
        self as usize
    }

    /// Number of nodes defining an element of this shape.
    pub fn node_count(self) -> usize {
        match self {
            ShapeKind::Point => 1,
            ShapeKind::Line => 2,
            ShapeKind::Triangle => 3,
            ShapeKind::Quadrangle => 4,
            ShapeKind::Tetrahedron => 4,
            ShapeKind::Hexahedron => 8,
            ShapeKind::Prism => 6,
            ShapeKind::Pyramid => 5,
        }
    }

    /// Topological dimension of the shape.
    pub fn dimension(self) -> usize {
        match self {
            ShapeKind::Point => 0,
            ShapeKind::Line => 1,
            ShapeKind::Triangle | ShapeKind::Quadrangle => 2,
            ShapeKind::Tetrahedron
            | ShapeKind::Hexahedron
            | ShapeKind::Prism
            | ShapeKind::Pyramid => 3,
        }
    }

    /// Local node indices of each codimension-1 face, in local port order.
    pub fn faces(self) -> &'static [&'static [usize]] {
        match self {
            ShapeKind::Point => POINT_FACES,
            ShapeKind::Line => LINE_FACES,
            ShapeKind::Triangle => TRIANGLE_FACES,
            ShapeKind::Quadrangle => QUADRANGLE_FACES,
            ShapeKind::Tetrahedron => TETRAHEDRON_FACES,
            ShapeKind::Hexahedron => HEXAHEDRON_FACES,
            ShapeKind::Prism => PRISM_FACES,
            ShapeKind::Pyramid => PYRAMID_FACES,
        }
    }

    /// Number of ports a TLM node of this shape has in an equation of the given dimensionality.
    ///
    /// Shapes of any other dimension never carry TLM nodes and have no ports.
    #[inline]
    pub fn ports_per_node(self, dimensionality: Dimensionality) -> usize {
        if self.dimension() == dimensionality.get() {
            self.faces().len()
        } else {
            0
        }
    }
}

/// Spatial dimensionality of an equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensionality {
    /// Line elements carry the TLM nodes, points bound them.
    One,
    /// Surface elements carry the TLM nodes, lines bound them.
    Two,
    /// Volume elements carry the TLM nodes, surfaces bound them.
    Three,
}

impl Dimensionality {
    /// The dimensionality as a plain number.
    #[inline]
    pub fn get(self) -> usize {
        match self {
            Dimensionality::One => 1,
            Dimensionality::Two => 2,
            Dimensionality::Three => 3,
        }
    }

    /// Length of a canonical junction key, i.e. the largest face node count
    /// among the shapes that can carry TLM nodes at this dimensionality.
    #[inline]
    pub fn junction_key_len(self) -> usize {
        match self {
            Dimensionality::One => 1,
            Dimensionality::Two => 2,
            Dimensionality::Three => 4,
        }
    }
}

impl TryFrom<u8> for Dimensionality {
    type Error = NumberingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Dimensionality::One),
            2 => Ok(Dimensionality::Two),
            3 => Ok(Dimensionality::Three),
            other => Err(NumberingError::InvalidDimensionality(other)),
        }
    }
}

impl From<Dimensionality> for u8 {
    fn from(d: Dimensionality) -> u8 {
        d.get() as u8
    }
}
