//! The equation descriptor: which element tags are boundaries,
//! which are materials, and what the equation asks to save.
//!
//! Descriptors normally come from the configuration file,
//! so they can be deserialized directly:
//! ```
//! # use tlmesh_core::{equation::EquationDescriptor, shape::Dimensionality};
//! let eq: EquationDescriptor = serde_json::from_str(r#"{
//!     "name": "tissue",
//!     "dimensionality": 2,
//!     "boundaries": [{ "tags": [10, 11] }],
//!     "materials": [{ "name": "skin", "tags": [1], "relaxation_time": 16.0 }],
//!     "save": { "scalar_at_node": true }
//! }"#).unwrap();
//! assert_eq!(eq.dimensionality, Dimensionality::Two);
//! assert!(eq.materials[0].has_stub());
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::shape::Dimensionality;

/// A set of element tags identifying one boundary or material group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<i32>);

impl TagSet {
    /// Check whether a tag belongs to this set.
    #[inline]
    pub fn contains(&self, tag: i32) -> bool {
        self.0.contains(&tag)
    }

    /// Iterate over the tags in ascending order.
    pub fn iter(&self) -> impl '_ + Iterator<Item = i32> {
        self.0.iter().copied()
    }

    /// Number of tags in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no tags.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<i32> for TagSet {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[i32; N]> for TagSet {
    fn from(tags: [i32; N]) -> Self {
        tags.into_iter().collect()
    }
}

/// A group of boundary elements sharing a boundary condition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryGroup {
    /// Human-readable name, for diagnostics only.
    #[serde(default)]
    pub name: String,
    /// Tags of the elements in this group.
    pub tags: TagSet,
}

/// A material region of the equation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Human-readable name, for diagnostics only.
    #[serde(default)]
    pub name: String,
    /// Tags of the elements made of this material.
    pub tags: TagSet,
    /// Relaxation time of the hyperbolic variant of the equation.
    /// Elements of a material with a non-zero relaxation time get a stub port.
    #[serde(default)]
    pub relaxation_time: f64,
}

impl Material {
    /// Whether elements of this material carry a stub port.
    #[inline]
    pub fn has_stub(&self) -> bool {
        self.relaxation_time != 0.
    }
}

/// Which quantities the equation asks to write out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveFlags {
    /// The scalar at each TLM node (element centroid).
    pub scalar_at_node: bool,
    /// The scalar at each junction between nodes.
    pub scalar_between_nodes: bool,
    /// The flux through each junction between nodes.
    pub flux_between_nodes: bool,
}

/// Everything about one equation the numbering engine needs to know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquationDescriptor {
    /// Name of the equation, used in diagnostics.
    #[serde(default)]
    pub name: String,
    /// Spatial dimensionality of the equation.
    pub dimensionality: Dimensionality,
    /// Boundary groups, checked in order.
    #[serde(default)]
    pub boundaries: Vec<BoundaryGroup>,
    /// Material groups, checked in order after the boundaries.
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Requested output.
    #[serde(default)]
    pub save: SaveFlags,
}

impl EquationDescriptor {
    /// Create an equation with no boundaries, materials or output.
    pub fn new(name: impl Into<String>, dimensionality: Dimensionality) -> Self {
        Self {
            name: name.into(),
            dimensionality,
            boundaries: Vec::new(),
            materials: Vec::new(),
            save: SaveFlags::default(),
        }
    }

    /// Add a boundary group with the given tags.
    pub fn with_boundary(mut self, tags: impl Into<TagSet>) -> Self {
        self.boundaries.push(BoundaryGroup {
            name: String::new(),
            tags: tags.into(),
        });
        self
    }

    /// Add a material with the given tags and relaxation time.
    pub fn with_material(mut self, tags: impl Into<TagSet>, relaxation_time: f64) -> Self {
        self.materials.push(Material {
            name: String::new(),
            tags: tags.into(),
            relaxation_time,
        });
        self
    }

    /// Set the requested output.
    pub fn with_save(mut self, save: SaveFlags) -> Self {
        self.save = save;
        self
    }
}
