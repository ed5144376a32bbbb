//! The mesh table handed over by mesh ingestion:
//! node coordinates plus tagged elements of every supported shape.

/// Small hand-built meshes for tests and examples.
mod fixtures;
#[doc(hidden)]
pub use fixtures::{capped_cube_mesh, hex_pair_mesh, tagged_square_mesh, two_lines_mesh};

mod views;
pub use views::{ElementIter, ElementView};

use crate::{shape::ShapeKind, Vec3};

/// Nodes and elements of an unstructured mesh.
///
/// Nodes are referenced by 1-based indices shared by all element shapes,
/// as in the Gmsh file format.
/// Elements are stored per shape in shape-code order,
/// each with an integer tag used to classify it.
///
/// ```
/// # use tlmesh_core::{mesh::MeshTable, shape::ShapeKind, Vec3};
/// let mesh = MeshTable::new(vec![
///     Vec3::new(0., 0., 0.),
///     Vec3::new(1., 0., 0.),
///     Vec3::new(2., 0., 0.),
/// ])
/// .with_element(ShapeKind::Line, 10, &[1, 2])
/// .with_element(ShapeKind::Line, 10, &[2, 3]);
/// assert_eq!(mesh.element_count(ShapeKind::Line), 2);
/// assert_eq!(mesh.element(ShapeKind::Line, 1).node_indices().collect::<Vec<_>>(), vec![2, 3]);
/// ```
#[derive(Clone, Debug)]
pub struct MeshTable {
    nodes: Vec<Vec3>,
    blocks: Vec<ElementBlock>,
}

#[derive(Clone, Debug)]
pub(crate) struct ElementBlock {
    shape: ShapeKind,
    tags: Vec<i32>,
    /// node indices stored in a flat Vec, `shape.node_count()` per element
    indices: Vec<usize>,
}

impl ElementBlock {
    fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            tags: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of elements in the block.
    #[inline]
    fn len(&self) -> usize {
        self.tags.len()
    }

    /// Get the slice of node indices corresponding to a single element.
    fn element_indices(&self, element: usize) -> &[usize] {
        let size = self.shape.node_count();
        let start = element * size;
        &self.indices[start..start + size]
    }
}

impl MeshTable {
    /// Create a mesh with the given node coordinates and no elements.
    ///
    /// The first coordinate is node 1.
    pub fn new(nodes: Vec<Vec3>) -> Self {
        Self {
            nodes,
            blocks: ShapeKind::ALL.iter().map(|&s| ElementBlock::new(s)).collect(),
        }
    }

    /// Add an element and return its index among the elements of its shape.
    ///
    /// Mesh ingestion is expected to have validated the mesh;
    /// this panics if the node count doesn't match the shape
    /// or a node index isn't in the mesh.
    pub fn push_element(&mut self, shape: ShapeKind, tag: i32, nodes: &[usize]) -> usize {
        assert!(
            nodes.len() == shape.node_count(),
            "{shape:?} needs {} nodes, got {}",
            shape.node_count(),
            nodes.len()
        );
        assert!(
            nodes.iter().all(|&n| n >= 1 && n <= self.nodes.len()),
            "element {nodes:?} references a node outside 1..={}",
            self.nodes.len()
        );
        let block = &mut self.blocks[shape.code()];
        block.tags.push(tag);
        block.indices.extend_from_slice(nodes);
        block.len() - 1
    }

    /// Builder-style version of [`push_element`][Self::push_element].
    pub fn with_element(mut self, shape: ShapeKind, tag: i32, nodes: &[usize]) -> Self {
        self.push_element(shape, tag, nodes);
        self
    }

    /// Get a slice of all node coordinates, node 1 first.
    #[inline]
    pub fn nodes(&self) -> &[Vec3] {
        &self.nodes
    }

    /// Coordinates of a node by its 1-based index.
    #[inline]
    pub fn node(&self, index: usize) -> Vec3 {
        self.nodes[index - 1]
    }

    /// Number of nodes in the mesh.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements of the given shape.
    #[inline]
    pub fn element_count(&self, shape: ShapeKind) -> usize {
        self.blocks[shape.code()].len()
    }

    /// Element counts of every shape, in shape-code order.
    pub fn element_counts(&self) -> [usize; 8] {
        std::array::from_fn(|code| self.blocks[code].len())
    }

    /// Number of elements of all shapes.
    pub fn total_element_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Get a view into an element by its shape and index.
    #[inline]
    pub fn element(&self, shape: ShapeKind, index: usize) -> ElementView<'_> {
        let block = &self.blocks[shape.code()];
        ElementView {
            shape,
            index,
            tag: block.tags[index],
            indices: block.element_indices(index),
            nodes: &self.nodes,
        }
    }

    /// Iterate over all elements of the given shape.
    pub fn elements(&self, shape: ShapeKind) -> ElementIter<'_> {
        ElementIter {
            mesh: self,
            shape,
            index: 0,
            len: self.element_count(shape),
        }
    }

    /// Iterate over all elements of every shape, in shape-code order.
    pub fn all_elements(&self) -> impl '_ + Iterator<Item = ElementView<'_>> {
        ShapeKind::ALL.into_iter().flat_map(|s| self.elements(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_per_shape() {
        let mesh = tagged_square_mesh();
        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.element_count(ShapeKind::Triangle), 2);
        assert_eq!(mesh.element_count(ShapeKind::Line), 4);
        assert_eq!(mesh.total_element_count(), 6);
        assert_eq!(mesh.element_counts(), [0, 4, 2, 0, 0, 0, 0, 0]);

        let tri = mesh.element(ShapeKind::Triangle, 1);
        assert_eq!(tri.index(), 1);
        assert_eq!(tri.shape(), ShapeKind::Triangle);
        itertools::assert_equal(tri.node_indices(), [1, 3, 4]);
        itertools::assert_equal(tri.vertices(), [1, 3, 4].map(|i| mesh.node(i)));

        // all_elements walks shapes in code order
        let shapes: Vec<ShapeKind> = mesh.all_elements().map(|e| e.shape()).collect();
        assert_eq!(
            shapes,
            [vec![ShapeKind::Line; 4], vec![ShapeKind::Triangle; 2]].concat()
        );
    }

    #[test]
    #[should_panic(expected = "needs 3 nodes")]
    fn wrong_arity_is_rejected() {
        let mut mesh = two_lines_mesh();
        mesh.push_element(ShapeKind::Triangle, 0, &[1, 2]);
    }
}
