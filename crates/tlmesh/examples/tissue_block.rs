//! Numbering a block of hexahedral tissue with a relaxing inclusion.
//!
//! The block is a grid of unit cubes.
//! The cubes in its middle are made of a material with a non-zero relaxation time,
//! so each of them gets a stub port on top of its six face ports.
//! The face at x = 0 is covered with boundary quadrangles.
//!
//! The equation and numbering configuration are read from JSON,
//! as an outer configuration layer would hand them over.
//! After numbering, the connection operator is assembled
//! and a single pulse is scattered through the block for a few steps,
//! which must conserve its energy.

use nalgebra as na;
use tlmesh as tlm;

const EQUATION: &str = r#"{
    "name": "bioheat",
    "dimensionality": 3,
    "boundaries": [{ "name": "skin surface", "tags": [100] }],
    "materials": [
        { "name": "muscle", "tags": [1] },
        { "name": "tumor", "tags": [2], "relaxation_time": 16.0 }
    ],
    "save": { "scalar_at_node": true, "flux_between_nodes": true }
}"#;

const CONFIG: &str = r#"{
    "hexahedron_volume": "Tetrakis",
    "backend": "SparseCpu"
}"#;

/// A grid of `n`×`n`×`n` unit cubes, tagged 2 in the middle and 1 elsewhere.
fn tissue_block(n: usize) -> tlm::MeshTable {
    let side = n + 1;
    let node = |x: usize, y: usize, z: usize| 1 + x + side * (y + side * z);

    let mut nodes = Vec::with_capacity(side.pow(3));
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                nodes.push(tlm::Vec3::new(x as f64, y as f64, z as f64));
            }
        }
    }
    let mut mesh = tlm::MeshTable::new(nodes);

    for y in 0..n {
        for z in 0..n {
            mesh.push_element(
                tlm::ShapeKind::Quadrangle,
                100,
                &[node(0, y, z), node(0, y + 1, z), node(0, y + 1, z + 1), node(0, y, z + 1)],
            );
        }
    }

    let inner = n / 3..n - n / 3;
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let tag = if inner.contains(&x) && inner.contains(&y) && inner.contains(&z) {
                    2
                } else {
                    1
                };
                mesh.push_element(
                    tlm::ShapeKind::Hexahedron,
                    tag,
                    &[
                        node(x, y, z),
                        node(x + 1, y, z),
                        node(x + 1, y + 1, z),
                        node(x, y + 1, z),
                        node(x, y, z + 1),
                        node(x + 1, y, z + 1),
                        node(x + 1, y + 1, z + 1),
                        node(x, y + 1, z + 1),
                    ],
                );
            }
        }
    }
    mesh
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let equation: tlm::EquationDescriptor = serde_json::from_str(EQUATION)?;
    let config: tlm::NumberingConfig = serde_json::from_str(CONFIG)?;
    let mesh = tissue_block(6);

    let numbering = tlm::number(&mesh, &equation, &config)?;
    let totals = numbering.totals();
    println!("{totals:#?}");

    let boundary_junctions = numbering
        .registry()
        .iter()
        .filter(|j| j.boundary.is_some())
        .count();
    println!("{boundary_junctions} junctions lie on the skin surface");

    let mut volume = 0.;
    for node in 0..totals.nodes {
        let (shape, element) = numbering.ports().locate_node(node)?;
        let corners = mesh.element(shape, element).corners();
        volume += tlm::geometry::element_measure(shape, &corners, config.hexahedron_volume);
    }
    println!("total volume {volume:.3}");

    let port = numbering.port_geometry(&mesh, 0)?;
    println!(
        "port 0: length {:.3}, area {:.3}, normal {:?}",
        port.length,
        port.area,
        port.normal.into_inner()
    );

    let operator = tlm::assemble_connection(&numbering, numbering.backend_kind())?;
    println!(
        "connection operator: {} x {}, {} entries",
        operator.dimension(),
        operator.dimension(),
        operator.nnz()
    );

    let mut pulses = na::DVector::zeros(operator.dimension());
    pulses[numbering.shifted_port(0)?] = 1.;
    for step in 1..=5 {
        pulses = operator.apply(&pulses);
        println!("step {step}: energy {:.6}", pulses.norm_squared());
    }

    Ok(())
}
