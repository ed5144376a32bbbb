//! The two-pass numbering of one equation over a mesh.
//!
//! The first pass scans every element in shape-code order,
//! registering the faces of TLM nodes as junctions
//! and recording which elements are nodes.
//! The second pass settles the port records,
//! translates the junctions' ports into the real numbering
//! and computes the totals.
//!
//! ```
//! # use tlmesh_core::{*, mesh::two_lines_mesh};
//! let mesh = two_lines_mesh();
//! let eq = EquationDescriptor::new("heat", Dimensionality::One).with_material([1], 0.);
//! let numbering = number(&mesh, &eq, &NumberingConfig::default())?;
//!
//! let totals = numbering.totals();
//! assert_eq!((totals.nodes, totals.ports, totals.intersections), (2, 4, 3));
//! // the middle node couples the second port of the first line
//! // with the first port of the second
//! assert_eq!(numbering.registry().ports_at(1), Some(&[1, 2][..]));
//! # Ok::<(), NumberingError>(())
//! ```

use crate::{
    backend::BackendKind,
    classify::{ElementClassifier, ElementRole},
    config::NumberingConfig,
    equation::{EquationDescriptor, SaveFlags},
    error::NumberingError,
    geometry::HexVolumeMethod,
    intersection::{canonical_key, IntersectionRegistry},
    mesh::MeshTable,
    ports::{AbstractPortAllocator, PortTotals, PortTranslation},
    shape::Dimensionality,
};

/// Where a [`Numberer`] is in its run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberingState {
    /// Created, the mesh has not been scanned yet.
    Scanning,
    /// The mesh has been scanned, counts are not final yet.
    Finalizing,
    /// Everything is numbered.
    Done,
    /// An operation failed. Nothing more can be done with this numberer.
    Failed,
}

impl NumberingState {
    fn name(self) -> &'static str {
        match self {
            NumberingState::Scanning => "scanning",
            NumberingState::Finalizing => "finalizing",
            NumberingState::Done => "done",
            NumberingState::Failed => "failed",
        }
    }
}

/// Sizes of everything numbered for an equation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Number of ordinary real ports.
    pub ports: usize,
    /// Number of TLM nodes.
    pub nodes: usize,
    /// Number of stub ports.
    pub stub_ports: usize,
    /// Number of junctions.
    pub intersections: usize,
    /// Number of output values requested by the equation's save flags.
    pub output: usize,
    /// Number of distinct points the output values are located at.
    pub points_output: usize,
}

impl Totals {
    fn new(ports: PortTotals, intersections: usize, save: SaveFlags) -> Self {
        let at_nodes = if save.scalar_at_node { ports.nodes } else { 0 };
        let between = |flag: bool| if flag { intersections } else { 0 };
        Self {
            ports: ports.ports,
            nodes: ports.nodes,
            stub_ports: ports.stub_ports,
            intersections,
            output: at_nodes
                + between(save.scalar_between_nodes)
                + between(save.flux_between_nodes),
            points_output: at_nodes
                + between(save.scalar_between_nodes || save.flux_between_nodes),
        }
    }

    /// Size of the system in the layout where stub ports follow their node's ports.
    #[inline]
    pub fn system_size(&self) -> usize {
        self.ports + self.stub_ports
    }
}

/// The numbering pass of one equation, run step by step.
///
/// Use [`number`] to run it all at once.
#[derive(Debug)]
pub struct Numberer<'a> {
    mesh: &'a MeshTable,
    equation: &'a EquationDescriptor,
    config: &'a NumberingConfig,
    state: NumberingState,
    ports: AbstractPortAllocator,
    registry: IntersectionRegistry,
    intersections: usize,
    totals: Totals,
}

impl<'a> Numberer<'a> {
    /// Allocate the structures of a numbering pass.
    pub fn new(
        mesh: &'a MeshTable,
        equation: &'a EquationDescriptor,
        config: &'a NumberingConfig,
    ) -> Result<Self, NumberingError> {
        let dimensionality = equation.dimensionality;
        let ports = AbstractPortAllocator::initiate(dimensionality, mesh.element_counts(), config)?;
        let registry = IntersectionRegistry::initiate(dimensionality.junction_key_len(), config)?;
        Ok(Self {
            mesh,
            equation,
            config,
            state: NumberingState::Scanning,
            ports,
            registry,
            intersections: 0,
            totals: Totals::default(),
        })
    }

    /// The current state of the pass.
    #[inline]
    pub fn state(&self) -> NumberingState {
        self.state
    }

    /// Number of junctions found so far.
    #[inline]
    pub fn intersections(&self) -> usize {
        self.intersections
    }

    fn expect_state(
        &self,
        expected: NumberingState,
        operation: &'static str,
    ) -> Result<(), NumberingError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(NumberingError::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }

    /// Move to the failed state if `result` is an error.
    fn track<T>(&mut self, result: Result<T, NumberingError>) -> Result<T, NumberingError> {
        if result.is_err() {
            self.state = NumberingState::Failed;
        }
        result
    }

    /// The first pass: classify every element and register the junctions of TLM nodes.
    pub fn scan(&mut self) -> Result<(), NumberingError> {
        self.expect_state(NumberingState::Scanning, "scan")?;
        let result = self.scan_elements();
        self.track(result)?;
        self.state = NumberingState::Finalizing;
        Ok(())
    }

    fn scan_elements(&mut self) -> Result<(), NumberingError> {
        let mesh = self.mesh;
        let classifier = ElementClassifier::new(self.equation);
        let depth = self.equation.dimensionality.junction_key_len();
        log::debug!(
            "scanning {} elements for equation `{}`",
            mesh.total_element_count(),
            self.equation.name
        );

        for element in mesh.all_elements() {
            let (shape, index) = (element.shape(), element.index());
            let (_, role) = classifier.classify_element(shape, element.tag());
            match role {
                ElementRole::Node { .. } => {
                    for face in 0..shape.faces().len() {
                        let key = canonical_key(element.face_node_indices(face), depth)?;
                        let port = self.ports.abstract_port_of(shape, index, face);
                        if self.registry.add(&key, &[port])?.created {
                            self.intersections += 1;
                        }
                    }
                }
                ElementRole::BoundaryFace { group } => {
                    let key = canonical_key(element.node_indices(), depth)?;
                    self.registry.mark_boundary(&key, group)?;
                }
                ElementRole::BoundaryRegion { group } => {
                    for face in 0..shape.faces().len() {
                        let key = canonical_key(element.face_node_indices(face), depth)?;
                        self.registry.mark_boundary(&key, group)?;
                    }
                }
                ElementRole::Ignored => {}
            }
            let (node, stub) = match role {
                ElementRole::Node { stub, .. } => (true, stub),
                _ => (false, false),
            };
            self.ports
                .add(self.ports.abstract_node_of(shape, index), node, stub)?;
        }

        log::debug!("scan found {} junctions", self.intersections);
        Ok(())
    }

    /// The second pass: settle the port records, renumber the junctions' ports
    /// and compute the totals.
    ///
    /// Calling this again once done has no effect.
    pub fn finalize(&mut self) -> Result<(), NumberingError> {
        if self.state == NumberingState::Done {
            return Ok(());
        }
        self.expect_state(NumberingState::Finalizing, "finalize")?;
        let result = self.finalize_counts();
        self.track(result)?;
        self.state = NumberingState::Done;
        Ok(())
    }

    fn finalize_counts(&mut self) -> Result<(), NumberingError> {
        self.ports.finalize()?;
        let ports = &self.ports;
        self.registry
            .map_ports(|p| ports.translate(p).map(|t| t.real_port))?;
        self.registry.finalize();
        debug_assert_eq!(self.registry.len(), self.intersections);

        self.totals = Totals::new(self.ports.totals(), self.intersections, self.equation.save);
        log::debug!("equation `{}`: {:?}", self.equation.name, self.totals);
        if self.totals.nodes == 0 {
            return Err(NumberingError::NoMaterialMatched {
                equation: self.equation.name.clone(),
            });
        }
        Ok(())
    }

    /// Hand over the finished numbering.
    pub fn finish(self) -> Result<Numbering, NumberingError> {
        self.expect_state(NumberingState::Done, "finish")?;
        Ok(Numbering {
            dimensionality: self.equation.dimensionality,
            save: self.equation.save,
            hex_method: self.config.hexahedron_volume,
            backend: self.config.backend,
            ports: self.ports,
            registry: self.registry,
            totals: self.totals,
        })
    }
}

/// Run the whole numbering pass of an equation.
pub fn number(
    mesh: &MeshTable,
    equation: &EquationDescriptor,
    config: &NumberingConfig,
) -> Result<Numbering, NumberingError> {
    let mut numberer = Numberer::new(mesh, equation, config)?;
    numberer.scan()?;
    numberer.finalize()?;
    numberer.finish()
}

/// The finished port and junction numbering of an equation.
#[derive(Clone, Debug)]
pub struct Numbering {
    dimensionality: Dimensionality,
    pub(crate) save: SaveFlags,
    pub(crate) hex_method: HexVolumeMethod,
    backend: BackendKind,
    pub(crate) ports: AbstractPortAllocator,
    registry: IntersectionRegistry,
    totals: Totals,
}

impl Numbering {
    /// Sizes of everything numbered.
    #[inline]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Dimensionality of the numbered equation.
    #[inline]
    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    /// The output requested by the numbered equation.
    #[inline]
    pub fn save_flags(&self) -> SaveFlags {
        self.save
    }

    /// The matrix backend configured for this numbering.
    #[inline]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }

    /// Per-shape port records.
    #[inline]
    pub fn ports(&self) -> &AbstractPortAllocator {
        &self.ports
    }

    /// The junctions with their real ports.
    #[inline]
    pub fn registry(&self) -> &IntersectionRegistry {
        &self.registry
    }

    /// Translate an abstract port number into the real numbering.
    #[inline]
    pub fn translate(&self, abstract_port: usize) -> Result<PortTranslation, NumberingError> {
        self.ports.translate(abstract_port)
    }

    /// Position of a real port in the layout where stub ports follow their node's ports.
    pub fn shifted_port(&self, real_port: usize) -> Result<usize, NumberingError> {
        let abstract_port = self.ports.abstract_port(real_port)?;
        Ok(self.ports.translate(abstract_port)?.shifted_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh::{capped_cube_mesh, hex_pair_mesh, tagged_square_mesh, two_lines_mesh},
        shape::ShapeKind,
        Vec3,
    };
    use proptest::prelude::*;

    #[test]
    fn two_lines() {
        let mesh = two_lines_mesh();
        let eq = EquationDescriptor::new("lines", Dimensionality::One).with_material([1], 0.);
        let n = number(&mesh, &eq, &NumberingConfig::default()).unwrap();
        let totals = n.totals();
        assert_eq!(
            totals,
            Totals {
                ports: 4,
                nodes: 2,
                stub_ports: 0,
                intersections: 3,
                output: 0,
                points_output: 0,
            }
        );
        let reg = n.registry();
        assert_eq!(reg.lookup(&[1]), Some(0));
        itertools::assert_equal(reg.iter().map(|j| j.ports.to_vec()), [vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn boundary_only_triangle_fails() {
        let mesh = MeshTable::new(vec![
            Vec3::new(0., 0., 0.),
            Vec3::new(1., 0., 0.),
            Vec3::new(0., 1., 0.),
        ])
        .with_element(ShapeKind::Line, 10, &[1, 2])
        .with_element(ShapeKind::Line, 10, &[2, 3])
        .with_element(ShapeKind::Line, 10, &[3, 1])
        .with_element(ShapeKind::Triangle, 1, &[1, 2, 3]);
        let eq = EquationDescriptor::new("empty", Dimensionality::Two).with_boundary([10]);
        let config = NumberingConfig::default();

        let mut numberer = Numberer::new(&mesh, &eq, &config).unwrap();
        numberer.scan().unwrap();
        let err = numberer.finalize().unwrap_err();
        assert_eq!(
            err,
            NumberingError::NoMaterialMatched {
                equation: "empty".into()
            }
        );
        assert!(err.is_equation_local());
        assert_eq!(numberer.state(), NumberingState::Failed);
        assert!(matches!(
            numberer.finish(),
            Err(NumberingError::InvalidState {
                state: "failed",
                ..
            })
        ));
    }

    #[test]
    fn square_with_boundaries() {
        let mesh = tagged_square_mesh();
        let eq = EquationDescriptor::new("square", Dimensionality::Two)
            .with_boundary([10, 11])
            .with_boundary([12, 13])
            .with_material([1], 0.)
            .with_save(SaveFlags {
                scalar_at_node: true,
                scalar_between_nodes: false,
                flux_between_nodes: true,
            });
        let n = number(&mesh, &eq, &NumberingConfig::default()).unwrap();
        let totals = n.totals();
        assert_eq!((totals.nodes, totals.ports, totals.intersections), (2, 6, 5));
        assert_eq!((totals.output, totals.points_output), (7, 7));

        let reg = n.registry();
        let diagonal = reg.junction(reg.lookup(&[1, 3]).unwrap()).unwrap();
        assert_eq!(diagonal.ports, &[2, 3]);
        assert_eq!(diagonal.boundary, None);
        let bottom = reg.junction(reg.lookup(&[1, 2]).unwrap()).unwrap();
        assert_eq!((bottom.ports, bottom.boundary), (&[0][..], Some(0)));
        let left = reg.junction(reg.lookup(&[1, 4]).unwrap()).unwrap();
        assert_eq!((left.ports, left.boundary), (&[5][..], Some(1)));
    }

    #[test]
    fn hex_pair_with_stub() {
        let mesh = hex_pair_mesh();
        let eq = EquationDescriptor::new("hexes", Dimensionality::Three)
            .with_boundary([10, 11])
            .with_material([1], 2.)
            .with_material([2], 0.)
            .with_save(SaveFlags {
                scalar_at_node: true,
                scalar_between_nodes: true,
                flux_between_nodes: true,
            });
        let n = number(&mesh, &eq, &NumberingConfig::default()).unwrap();
        let totals = n.totals();
        assert_eq!(
            totals,
            Totals {
                ports: 12,
                nodes: 2,
                stub_ports: 1,
                intersections: 11,
                output: 24,
                points_output: 13,
            }
        );
        assert_eq!(totals.system_size(), 13);

        let reg = n.registry();
        let shared = reg.lookup(&[2, 5, 8, 11]).unwrap();
        assert_eq!(reg.ports_at(shared), Some(&[3, 8][..]));
        let outer = reg.junction(reg.lookup(&[1, 4, 7, 10]).unwrap()).unwrap();
        assert_eq!((outer.ports, outer.boundary), (&[2][..], Some(0)));
        // boundary quads aren't nodes even though they're tagged
        assert_eq!(n.ports().record(ShapeKind::Quadrangle).nodes(), 0);

        // the first hex's stub follows its last port, shifting the second hex
        let last = n
            .translate(n.ports().abstract_port_of(ShapeKind::Hexahedron, 0, 5))
            .unwrap();
        assert_eq!(last.stub_port(), Some(6));
        let next = n
            .translate(n.ports().abstract_port_of(ShapeKind::Hexahedron, 1, 0))
            .unwrap();
        assert_eq!((next.real_port, next.shifted_port()), (6, 7));
    }

    #[test]
    fn mixed_volume_shapes_share_faces() {
        let mesh = capped_cube_mesh();
        let eq = EquationDescriptor::new("capped", Dimensionality::Three)
            .with_boundary([10])
            .with_boundary([11])
            .with_material([1], 0.)
            .with_material([2], 5.)
            .with_save(SaveFlags {
                scalar_at_node: true,
                scalar_between_nodes: false,
                flux_between_nodes: true,
            });
        let n = number(&mesh, &eq, &NumberingConfig::default()).unwrap();
        // 4 + 6 + 5 + 5 faces, three of them shared
        assert_eq!(
            n.totals(),
            Totals {
                ports: 20,
                nodes: 4,
                stub_ports: 1,
                intersections: 17,
                output: 21,
                points_output: 21,
            }
        );

        // real ports: tetrahedron 0..4, hexahedron 4..10, prism 10..15, pyramid 15..20
        let reg = n.registry();
        let shared: Vec<(Vec<usize>, &[usize])> = reg
            .iter()
            .filter(|j| j.ports.len() == 2)
            .map(|j| (j.key, j.ports))
            .collect();
        assert_eq!(
            shared,
            vec![
                (vec![0, 5, 6, 9], &[0, 16][..]),
                (vec![2, 3, 6, 7], &[7, 12][..]),
                (vec![5, 6, 7, 8], &[9, 15][..]),
            ]
        );
        assert!(reg.iter().all(|j| !j.ports.is_empty() && j.ports.len() <= 2));

        // triangle faces get zero-padded keys next to the quadrangles
        let bottom = reg.junction(reg.lookup(&[1, 2, 3, 4]).unwrap()).unwrap();
        assert_eq!((bottom.ports, bottom.boundary), (&[4][..], Some(0)));
        let under = reg.junction(reg.lookup(&[0, 5, 6, 10]).unwrap()).unwrap();
        assert_eq!((under.ports, under.boundary), (&[1][..], Some(1)));
        assert_eq!(reg.lookup(&[5, 6, 10]), None);
        let apex = reg.lookup(&[0, 7, 8, 9]).unwrap();
        assert_eq!(reg.ports_at(apex), Some(&[19][..]));

        // the pyramid's stub follows its last port
        let last = n
            .translate(n.ports().abstract_port_of(ShapeKind::Pyramid, 0, 4))
            .unwrap();
        assert_eq!((last.real_port, last.stub_port()), (19, Some(20)));
        assert_eq!(n.totals().system_size(), 21);
        assert_eq!(n.ports().locate_node(2), Ok((ShapeKind::Prism, 0)));

        // the faces shared by the cube and the pyramid point opposite ways
        let top = n.port_geometry(&mesh, 9).unwrap();
        let base = n.port_geometry(&mesh, 15).unwrap();
        assert_eq!(top.normal.into_inner(), Vec3::z());
        assert_eq!(base.normal.into_inner(), -Vec3::z());
        assert_eq!((top.area, base.area), (1., 1.));
        assert_eq!(top.face_centroid, base.face_centroid);
    }

    #[test]
    fn states_are_enforced() {
        let mesh = two_lines_mesh();
        let eq = EquationDescriptor::new("lines", Dimensionality::One).with_material([1], 0.);
        let config = NumberingConfig::default();
        let mut numberer = Numberer::new(&mesh, &eq, &config).unwrap();

        assert!(matches!(
            numberer.finalize(),
            Err(NumberingError::InvalidState {
                state: "scanning",
                ..
            })
        ));
        numberer.scan().unwrap();
        assert_eq!(numberer.state(), NumberingState::Finalizing);
        assert!(numberer.scan().is_err());

        numberer.finalize().unwrap();
        let totals = numberer.totals;
        numberer.finalize().unwrap();
        assert_eq!(numberer.totals, totals);
        assert_eq!(numberer.state(), NumberingState::Done);
        assert_eq!(numberer.finish().unwrap().totals(), totals);
    }

    /// A grid of `nx` by `ny` unit squares, each split into two triangles.
    fn triangle_grid(nx: usize, ny: usize, tags: &[i32]) -> MeshTable {
        let mut nodes = Vec::new();
        for y in 0..=ny {
            for x in 0..=nx {
                nodes.push(Vec3::new(x as f64, y as f64, 0.));
            }
        }
        let mut mesh = MeshTable::new(nodes);
        let node = |x: usize, y: usize| 1 + x + y * (nx + 1);
        let mut tags = tags.iter().copied();
        for y in 0..ny {
            for x in 0..nx {
                let (a, b, c, d) = (node(x, y), node(x + 1, y), node(x + 1, y + 1), node(x, y + 1));
                mesh.push_element(ShapeKind::Triangle, tags.next().unwrap_or(1), &[a, b, c]);
                mesh.push_element(ShapeKind::Triangle, tags.next().unwrap_or(1), &[a, c, d]);
            }
        }
        mesh
    }

    proptest! {
        #[test]
        fn random_materials_on_a_grid(tags in prop::collection::vec(0..4i32, 12)) {
            let mesh = triangle_grid(3, 2, &tags);
            let eq = EquationDescriptor::new("grid", Dimensionality::Two)
                .with_material([1], 0.)
                .with_material([2], 5.);
            let result = number(&mesh, &eq, &NumberingConfig::default());

            let materials = tags.iter().filter(|&&t| t == 1 || t == 2).count();
            if materials == 0 {
                let is_no_material = matches!(result, Err(NumberingError::NoMaterialMatched { .. }));
                prop_assert!(is_no_material);
                return Ok(());
            }
            let n = result.unwrap();
            let totals = n.totals();
            prop_assert_eq!(totals.nodes, materials);
            let record_sum: usize = n.ports().records().iter().map(|r| r.nodes()).sum();
            prop_assert_eq!(record_sum, totals.nodes);
            prop_assert_eq!(totals.ports, 3 * materials);
            prop_assert_eq!(totals.stub_ports, tags.iter().filter(|&&t| t == 2).count());

            // every real port sits in exactly one junction
            let mut seen = vec![0; totals.ports];
            for j in n.registry().iter() {
                prop_assert!(!j.ports.is_empty() && j.ports.len() <= 2);
                for &p in j.ports {
                    seen[p] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&s| s == 1));

            for real in 0..totals.ports {
                let abs = n.ports().abstract_port(real).unwrap();
                prop_assert_eq!(n.translate(abs).unwrap().real_port, real);
            }
        }
    }
}
