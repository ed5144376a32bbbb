//! This is the core crate containing all of `tlmesh`'s functionality.
//! See the `tlmesh` crate's documentation for an introduction.

#![warn(missing_docs)]

pub mod shape;
#[doc(inline)]
pub use shape::{Dimensionality, ShapeKind};

pub mod mesh;
#[doc(inline)]
pub use mesh::{ElementIter, ElementView, MeshTable};

pub mod equation;
#[doc(inline)]
pub use equation::{BoundaryGroup, EquationDescriptor, Material, SaveFlags, TagSet};

pub mod error;
#[doc(inline)]
pub use error::{status_of, AllocSite, NumberingError};

pub mod config;
#[doc(inline)]
pub use config::{GrowthPolicy, NumberingConfig};

pub mod geometry;

pub mod classify;
#[doc(inline)]
pub use classify::{Classification, ElementClassifier, ElementRole};

pub mod ports;
#[doc(inline)]
pub use ports::{AbstractPortAllocator, Membership, PortTranslation};

pub mod intersection;
#[doc(inline)]
pub use intersection::{canonical_key, IntersectionRegistry, JunctionRef};

pub mod numbering;
#[doc(inline)]
pub use numbering::{number, Numberer, Numbering, NumberingState, Totals};

pub mod lookup;
#[doc(inline)]
pub use lookup::{PortGeometry, PortLocation};

pub mod backend;
#[doc(inline)]
pub use backend::{assemble_connection, BackendKind, ConnectionBackend, CsrBackend, DenseBackend};

// nalgebra re-exports of common types for convenience

pub use nalgebra as na;
/// Type alias for a 3D `nalgebra` vector.
pub type Vec3 = na::Vector3<f64>;
/// Type alias for a 3D `nalgebra` unit vector.
pub type UnitVec3 = na::Unit<Vec3>;
