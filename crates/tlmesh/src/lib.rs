//! `tlmesh` turns a tagged, unstructured mesh into the index structure
//! of a transmission-line modeling (TLM) discretization.
//!
//! In TLM, every mesh element made of a material becomes a TLM node
//! with one port per face.
//! Ports of neighboring nodes meet at junctions,
//! where the pulses leaving them are scattered into each other.
//! Solving a TLM system needs
//! - a dense numbering of the ports, which become matrix rows and columns,
//! - the list of junctions and the ports coupled at each one,
//! - the geometry of each port to compute its impedance.
//!
//! This crate computes all of these for one equation at a time.
//!
//! # Meshes and equations
//!
//! A [`MeshTable`] holds node coordinates and elements of eight shapes,
//! each element with an integer tag.
//! An [`EquationDescriptor`] says which tags are boundaries
//! and which are materials, and in what dimensionality the equation lives.
//! Only elements of the equation's full dimension can be TLM nodes;
//! boundary elements one dimension lower mark the faces they cover.
//!
//! ```
//! use tlmesh as tlm;
//!
//! let mesh = tlm::mesh::tagged_square_mesh();
//! let eq = tlm::EquationDescriptor::new("heat", tlm::Dimensionality::Two)
//!     .with_boundary([10, 11, 12, 13])
//!     .with_material([1], 0.);
//! ```
//!
//! Equations are also deserializable, so they can come straight from a configuration file.
//!
//! # Numbering
//!
//! [`number`] scans the mesh and produces a [`Numbering`]:
//!
//! ```
//! # use tlmesh as tlm;
//! # let mesh = tlm::mesh::tagged_square_mesh();
//! # let eq = tlm::EquationDescriptor::new("heat", tlm::Dimensionality::Two)
//! #     .with_boundary([10, 11, 12, 13])
//! #     .with_material([1], 0.);
//! let numbering = tlm::number(&mesh, &eq, &tlm::NumberingConfig::default())?;
//! let totals = numbering.totals();
//! assert_eq!((totals.nodes, totals.ports, totals.intersections), (2, 6, 5));
//!
//! for junction in numbering.registry().iter() {
//!     println!("{:?} couples ports {:?}", junction.key, junction.ports);
//! }
//! # Ok::<(), tlm::NumberingError>(())
//! ```
//!
//! Elements of a material with a non-zero relaxation time get an extra stub port.
//! Stub ports are counted separately in [`Totals::stub_ports`];
//! [`PortTranslation`] gives positions in a layout
//! where each node's stub port follows its ordinary ports.
//!
//! The numbering can also be run step by step with a [`Numberer`].
//!
//! # Geometry and matrices
//!
//! [`Numbering::port_geometry`] gives the length, area and outward normal of a port,
//! computed with the functions in [`geometry`].
//! [`assemble_connection`] builds the junction scattering operator
//! into a dense or sparse matrix backend chosen by [`BackendKind`].
//!
//! # Errors
//!
//! Every fallible operation returns a [`NumberingError`].
//! [`status_of`] flattens a result into a numeric status code, 0 meaning success,
//! for callers that communicate with numbers only.
//!
//! # Logging
//!
//! Pass summaries are emitted through the [`log`](https://docs.rs/log) facade
//! at debug level. Install any logger to see them.

#[doc(inline)]
pub use tlmesh_core::*;
