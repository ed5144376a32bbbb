use super::MeshTable;
use crate::{shape::ShapeKind, Vec3};

/// A view into a single element's data.
#[derive(Clone, Copy, Debug)]
pub struct ElementView<'a> {
    pub(super) shape: ShapeKind,
    // index of the element among elements of the same shape
    pub(super) index: usize,
    pub(super) tag: i32,
    pub(super) indices: &'a [usize],
    // all node coordinates of the mesh,
    // indexed into by the 1-based values in `indices`
    pub(super) nodes: &'a [Vec3],
}

impl PartialEq for ElementView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.index == other.index
    }
}
impl Eq for ElementView<'_> {}

impl<'a> ElementView<'a> {
    /// Shape of this element.
    #[inline]
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Index of this element among the elements of its shape.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The classification tag of this element.
    #[inline]
    pub fn tag(&self) -> i32 {
        self.tag
    }

    /// Iterate over the 1-based node indices of this element.
    #[inline]
    pub fn node_indices(&self) -> impl 'a + Iterator<Item = usize> {
        self.indices.iter().cloned()
    }

    /// Iterate over the coordinates of this element's nodes.
    #[inline]
    pub fn vertices(&self) -> impl 'a + Iterator<Item = Vec3> {
        let nodes = self.nodes;
        self.indices.iter().map(move |&i| nodes[i - 1])
    }

    /// Collect the coordinates of this element's nodes.
    pub fn corners(&self) -> Vec<Vec3> {
        self.vertices().collect()
    }

    /// Iterate over the 1-based node indices of one of this element's faces.
    #[inline]
    pub fn face_node_indices(&self, face: usize) -> impl 'a + Iterator<Item = usize> {
        let indices = self.indices;
        self.shape.faces()[face].iter().map(move |&local| indices[local])
    }
}

/// Iterator over the elements of one shape in a mesh.
#[derive(Clone, Copy, Debug)]
pub struct ElementIter<'a> {
    pub(super) mesh: &'a MeshTable,
    pub(super) shape: ShapeKind,
    pub(super) index: usize,
    pub(super) len: usize,
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = ElementView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let ret = self.mesh.element(self.shape, self.index);
        self.index += 1;
        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ElementIter<'_> {}
