//! Geometry of numbered ports, nodes and junctions.
//!
//! Matrix assembly needs the physical size and orientation of each port
//! (for impedances and fluxes),
//! and output writing needs a location for each saved value.
//! These queries go from real numbers back to mesh elements
//! and run them through the functions in [`geometry`][crate::geometry].

use crate::{
    error::NumberingError,
    geometry::{self, geometrical_variables, outward_normals},
    mesh::MeshTable,
    numbering::Numbering,
    shape::ShapeKind,
    UnitVec3, Vec3,
};

/// The element a real port belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortLocation {
    /// Shape of the element.
    pub shape: ShapeKind,
    /// Index of the element among elements of its shape.
    pub element: usize,
    /// Index of the port among the element's faces.
    pub local_port: usize,
}

/// Physical quantities of a single port.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortGeometry {
    /// Distance from the element centroid to the port face's centroid.
    pub length: f64,
    /// Measure of the port face.
    pub area: f64,
    /// Unit normal of the port face pointing out of the element.
    pub normal: UnitVec3,
    /// Centroid of the element.
    pub element_centroid: Vec3,
    /// Centroid of the port face.
    pub face_centroid: Vec3,
}

impl Numbering {
    /// Find the element and local port of a real port.
    pub fn locate_port(&self, real_port: usize) -> Result<PortLocation, NumberingError> {
        let translation = self.ports.translate(self.ports.abstract_port(real_port)?)?;
        let (shape, element) = self.ports.locate_node(translation.node)?;
        Ok(PortLocation {
            shape,
            element,
            local_port: real_port - translation.first_port,
        })
    }

    /// Compute the geometry of a real port.
    pub fn port_geometry(
        &self,
        mesh: &MeshTable,
        real_port: usize,
    ) -> Result<PortGeometry, NumberingError> {
        let loc = self.locate_port(real_port)?;
        let corners = mesh.element(loc.shape, loc.element).corners();
        let vars = geometrical_variables(loc.shape, &corners, self.hex_method);
        let face: Vec<Vec3> = loc.shape.faces()[loc.local_port]
            .iter()
            .map(|&i| corners[i])
            .collect();
        Ok(PortGeometry {
            length: vars.port_lengths[loc.local_port],
            area: vars.port_areas[loc.local_port],
            normal: outward_normals(loc.shape, &corners)[loc.local_port],
            element_centroid: vars.centroid,
            face_centroid: geometry::centroid(&face),
        })
    }

    /// Centroid of the element behind a real node.
    pub fn node_centroid(&self, mesh: &MeshTable, real_node: usize) -> Result<Vec3, NumberingError> {
        let (shape, element) = self.ports.locate_node(real_node)?;
        Ok(geometry::centroid(&mesh.element(shape, element).corners()))
    }

    /// Centroid of the face of a junction.
    pub fn junction_centroid(&self, mesh: &MeshTable, id: usize) -> Result<Vec3, NumberingError> {
        let junction = self
            .registry()
            .junction(id)
            .ok_or(NumberingError::JunctionOutOfRange {
                id,
                len: self.registry().len(),
            })?;
        // zeroes are key padding, not nodes
        let points: Vec<Vec3> = junction
            .key
            .iter()
            .filter(|&&n| n != 0)
            .map(|&n| mesh.node(n))
            .collect();
        Ok(geometry::centroid(&points))
    }

    /// Locations of the output points:
    /// node centroids if values at nodes are saved,
    /// then junction centroids if values between nodes are saved.
    pub fn output_points(&self, mesh: &MeshTable) -> Result<Vec<Vec3>, NumberingError> {
        let totals = self.totals();
        let mut points = Vec::with_capacity(totals.points_output);
        if self.save.scalar_at_node {
            for node in 0..totals.nodes {
                points.push(self.node_centroid(mesh, node)?);
            }
        }
        if self.save.scalar_between_nodes || self.save.flux_between_nodes {
            for id in 0..totals.intersections {
                points.push(self.junction_centroid(mesh, id)?);
            }
        }
        Ok(points)
    }
}
