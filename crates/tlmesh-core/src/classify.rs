//! Classification of mesh elements against an equation's tag sets.

use crate::{
    equation::EquationDescriptor,
    shape::{Dimensionality, ShapeKind},
};

/// What an element's tag matched in the active equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The tag is in none of the equation's sets.
    Undefined,
    /// The tag is in a boundary group.
    Boundary {
        /// Index of the group in [`EquationDescriptor::boundaries`].
        group: usize,
    },
    /// The tag is in a material.
    Material {
        /// Index of the material in [`EquationDescriptor::materials`].
        material: usize,
        /// Whether the material has a non-zero relaxation time,
        /// giving the element an extra stub port.
        stub: bool,
    },
}

impl Classification {
    /// Whether this is a material classification.
    #[inline]
    pub fn is_material(&self) -> bool {
        matches!(self, Classification::Material { .. })
    }

    /// Whether this is a material classification with a stub port.
    #[inline]
    pub fn has_stub(&self) -> bool {
        matches!(self, Classification::Material { stub: true, .. })
    }
}

/// The part an element plays in numbering, given its shape and classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementRole {
    /// A material element of full dimension: a TLM node with one port per face.
    Node {
        /// Index of the material.
        material: usize,
        /// Whether the node has a stub port.
        stub: bool,
    },
    /// A boundary element one dimension lower than the equation.
    /// Its own node set is the key of the junction it bounds.
    BoundaryFace {
        /// Index of the boundary group.
        group: usize,
    },
    /// A boundary element of full dimension.
    /// Each of its faces bounds a junction.
    BoundaryRegion {
        /// Index of the boundary group.
        group: usize,
    },
    /// Nothing to number.
    Ignored,
}

/// Decides the classification and role of each element for one equation.
#[derive(Clone, Copy, Debug)]
pub struct ElementClassifier<'a> {
    equation: &'a EquationDescriptor,
}

impl<'a> ElementClassifier<'a> {
    /// Create a classifier for the given equation.
    pub fn new(equation: &'a EquationDescriptor) -> Self {
        Self { equation }
    }

    /// Dimensionality of the equation being classified against.
    #[inline]
    pub fn dimensionality(&self) -> Dimensionality {
        self.equation.dimensionality
    }

    /// Classify a tag.
    ///
    /// Boundary groups are checked before materials,
    /// so a tag present in both is treated as a boundary.
    /// Within each kind the first matching group wins.
    pub fn classify(&self, tag: i32) -> Classification {
        if let Some(group) = self
            .equation
            .boundaries
            .iter()
            .position(|b| b.tags.contains(tag))
        {
            return Classification::Boundary { group };
        }
        match self
            .equation
            .materials
            .iter()
            .position(|m| m.tags.contains(tag))
        {
            Some(material) => Classification::Material {
                material,
                stub: self.equation.materials[material].has_stub(),
            },
            None => Classification::Undefined,
        }
    }

    /// Decide the role of an element of the given shape and classification.
    pub fn role(&self, shape: ShapeKind, class: Classification) -> ElementRole {
        let dim = self.dimensionality().get();
        match class {
            Classification::Material { material, stub } if shape.dimension() == dim => {
                ElementRole::Node { material, stub }
            }
            Classification::Material { material, .. } => {
                log::warn!(
                    "{shape:?} elements can't be nodes of the {dim}-dimensional equation `{}`, \
                     ignoring material {material}",
                    self.equation.name,
                );
                ElementRole::Ignored
            }
            Classification::Boundary { group } if shape.dimension() + 1 == dim => {
                ElementRole::BoundaryFace { group }
            }
            Classification::Boundary { group } if shape.dimension() == dim => {
                ElementRole::BoundaryRegion { group }
            }
            Classification::Boundary { .. } | Classification::Undefined => ElementRole::Ignored,
        }
    }

    /// Classify an element and decide its role in one go.
    #[inline]
    pub fn classify_element(&self, shape: ShapeKind, tag: i32) -> (Classification, ElementRole) {
        let class = self.classify(tag);
        (class, self.role(shape, class))
    }
}
