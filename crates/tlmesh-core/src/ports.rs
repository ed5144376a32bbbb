//! Translation between abstract and real port numbers.
//!
//! An abstract numbering assumes every element of every shape
//! is a material TLM node without a stub port:
//! the abstract node of an element is its index
//! offset by the element counts of all earlier shape codes,
//! and its abstract ports follow consecutively,
//! `ports_per_node` of them per element.
//! This numbering is known before the mesh is scanned.
//!
//! The real numbering keeps only the elements that turned out to be TLM nodes,
//! compacted into a dense 0-based range.
//! Each shape's record remembers which elements those are
//! in whichever form takes the least memory, see [`Membership`].
//!
//! Stub ports are numbered separately, one per node with a stub.
//! A layout where each node's stub port directly follows its ordinary ports
//! is available through the `shifted_*` accessors of [`PortTranslation`].

mod membership;
pub use membership::Membership;
use membership::{ScanTracker, Tracking};

use std::ops::Range;

use crate::{
    config::{fraction_of, NumberingConfig},
    error::{AllocSite, NumberingError},
    shape::{Dimensionality, ShapeKind},
};

/// Port bookkeeping of all elements of one shape.
#[derive(Clone, Debug)]
pub struct ShapeRecord {
    shape: ShapeKind,
    elements: usize,
    ports_per_node: usize,
    nodes: usize,
    stubs: usize,
    prev_abstract_node: usize,
    prev_abstract_port: usize,
    prev_real_node: usize,
    prev_real_port: usize,
    prev_stub_port: usize,
    state: RecordState,
}

#[derive(Clone, Debug)]
enum RecordState {
    Scanning {
        main: ScanTracker,
        stub: ScanTracker,
    },
    Final {
        /// which elements are nodes, out of all elements
        main: Membership,
        /// which nodes have a stub, indexed by rank among the nodes
        stub: Membership,
    },
}

impl ShapeRecord {
    fn new(
        shape: ShapeKind,
        elements: usize,
        dimensionality: Dimensionality,
        config: &NumberingConfig,
    ) -> Result<Self, NumberingError> {
        let ports_per_node = shape.ports_per_node(dimensionality);
        // nodes are the majority among full-dimensional shapes
        // and nonexistent among others
        let main_tracking = if ports_per_node > 0 {
            Tracking::Negatives
        } else {
            Tracking::Positives
        };
        let main = ScanTracker::new(
            main_tracking,
            fraction_of(elements, config.record_fraction),
            config.record_growth,
            AllocSite::RecordInit,
            AllocSite::RecordGrow,
        )?;
        let stub = ScanTracker::new(
            Tracking::Positives,
            fraction_of(elements, config.stub_fraction),
            config.stub_growth,
            AllocSite::StubRecordInit,
            AllocSite::StubRecordGrow,
        )?;
        Ok(Self {
            shape,
            elements,
            ports_per_node,
            nodes: 0,
            stubs: 0,
            prev_abstract_node: 0,
            prev_abstract_port: 0,
            prev_real_node: 0,
            prev_real_port: 0,
            prev_stub_port: 0,
            state: RecordState::Scanning { main, stub },
        })
    }

    fn add(&mut self, element: usize, node: bool, stub: bool) -> Result<(), NumberingError> {
        let RecordState::Scanning {
            main,
            stub: stub_tracker,
        } = &mut self.state
        else {
            return Err(NumberingError::InvalidState {
                operation: "add an element",
                state: "finalized",
            });
        };
        // shapes without ports never carry nodes
        let node = node && self.ports_per_node > 0;
        main.record(element, node)?;
        if node {
            self.nodes += 1;
            stub_tracker.record(element, stub)?;
            if stub {
                self.stubs += 1;
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), NumberingError> {
        if !matches!(self.state, RecordState::Scanning { .. }) {
            return Ok(());
        }
        // the trackers are consumed; a failure below fails the whole numbering
        let placeholder = RecordState::Final {
            main: Membership::None,
            stub: Membership::None,
        };
        let RecordState::Scanning { main, stub } = std::mem::replace(&mut self.state, placeholder)
        else {
            return Ok(());
        };
        let main = main.into_membership(self.elements, self.nodes, |e| e)?;
        // stub positions are relabeled from element indices to node ranks
        let stub = stub.into_membership(self.nodes, self.stubs, |e| main.rank(e))?;
        log::debug!(
            "{:?}: {} nodes out of {} elements, {} with stubs, storing {} + {} entries",
            self.shape,
            self.nodes,
            self.elements,
            self.stubs,
            main.stored_len(),
            stub.stored_len(),
        );
        self.state = RecordState::Final { main, stub };
        Ok(())
    }

    fn memberships(&self) -> Option<(&Membership, &Membership)> {
        match &self.state {
            RecordState::Final { main, stub } => Some((main, stub)),
            RecordState::Scanning { .. } => None,
        }
    }

    /// The shape this record is for.
    #[inline]
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Number of elements of this shape in the mesh.
    #[inline]
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Number of ports each node of this shape has.
    #[inline]
    pub fn ports_per_node(&self) -> usize {
        self.ports_per_node
    }

    /// Number of elements added so far that are TLM nodes.
    #[inline]
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Number of nodes added so far that have a stub port.
    #[inline]
    pub fn stubs(&self) -> usize {
        self.stubs
    }

    /// Number of entries currently stored in the element list.
    pub fn saved(&self) -> usize {
        match &self.state {
            RecordState::Scanning { main, .. } => main.saved(),
            RecordState::Final { main, .. } => main.stored_len(),
        }
    }

    /// Capacity of the element list during the scan,
    /// or its exact size after finalizing.
    pub fn allocated(&self) -> usize {
        match &self.state {
            RecordState::Scanning { main, .. } => main.allocated(),
            RecordState::Final { main, .. } => main.stored_len(),
        }
    }

    /// Total number of entries stored in both the element and stub lists.
    pub fn stored_len(&self) -> usize {
        match &self.state {
            RecordState::Scanning { main, stub } => main.saved() + stub.saved(),
            RecordState::Final { main, stub } => main.stored_len() + stub.stored_len(),
        }
    }

    /// Which elements are nodes, once finalized.
    pub fn membership(&self) -> Option<&Membership> {
        self.memberships().map(|(main, _)| main)
    }

    /// Which nodes have stubs, by rank among nodes of this shape, once finalized.
    pub fn stub_membership(&self) -> Option<&Membership> {
        self.memberships().map(|(_, stub)| stub)
    }

    /// Number of real ports of this shape.
    #[inline]
    fn real_ports(&self) -> usize {
        self.nodes * self.ports_per_node
    }

    /// Number of abstract ports of this shape.
    #[inline]
    fn abstract_ports(&self) -> usize {
        self.elements * self.ports_per_node
    }
}

/// Where an abstract port ended up in the real numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortTranslation {
    /// Real number of the node owning the port.
    pub node: usize,
    /// Real port number.
    pub real_port: usize,
    /// Real number of the first port of the same node.
    pub first_port: usize,
    /// Real number of the last port of the same node.
    pub last_port: usize,
    /// Number of stub ports numbered before this node.
    pub stub_offset: usize,
    /// Whether the node has a stub port.
    pub has_stub: bool,
}

impl PortTranslation {
    /// Port number in the layout where stub ports follow their node's ports.
    #[inline]
    pub fn shifted_port(&self) -> usize {
        self.real_port + self.stub_offset
    }

    /// First port of the node in the stub-shifted layout.
    #[inline]
    pub fn shifted_first_port(&self) -> usize {
        self.first_port + self.stub_offset
    }

    /// Last ordinary port of the node in the stub-shifted layout.
    #[inline]
    pub fn shifted_last_port(&self) -> usize {
        self.last_port + self.stub_offset
    }

    /// The node's stub port in the stub-shifted layout, if it has one.
    #[inline]
    pub fn stub_port(&self) -> Option<usize> {
        self.has_stub.then(|| self.shifted_last_port() + 1)
    }
}

/// Port counts over all shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortTotals {
    /// Number of TLM nodes.
    pub nodes: usize,
    /// Number of ordinary real ports.
    pub ports: usize,
    /// Number of stub ports.
    pub stub_ports: usize,
}

/// Per-shape bookkeeping of which elements are TLM nodes,
/// turning abstract port numbers into real ones.
///
/// ```
/// # use tlmesh_core::{ports::AbstractPortAllocator, config::NumberingConfig, Dimensionality};
/// // 3 lines in a 1D equation
/// let counts = [0, 3, 0, 0, 0, 0, 0, 0];
/// let mut alloc =
///     AbstractPortAllocator::initiate(Dimensionality::One, counts, &NumberingConfig::default())?;
/// alloc.add(0, true, false)?;
/// alloc.add(1, false, false)?;
/// alloc.add(2, true, true)?;
/// alloc.finalize()?;
///
/// // abstract ports of the third line are 4 and 5, real ports 2 and 3
/// let t = alloc.translate(5)?;
/// assert_eq!(t.real_port, 3);
/// assert_eq!(t.stub_port(), Some(4));
/// assert_eq!(alloc.abstract_port(3)?, 5);
/// # Ok::<(), tlmesh_core::NumberingError>(())
/// ```
#[derive(Clone, Debug)]
pub struct AbstractPortAllocator {
    dimensionality: Dimensionality,
    records: Vec<ShapeRecord>,
    abstract_nodes: usize,
    abstract_ports: usize,
    totals: PortTotals,
    finalized: bool,
}

impl AbstractPortAllocator {
    /// Set up records for a mesh with the given element counts per shape code.
    ///
    /// Abstract offsets are fixed here;
    /// tracked lists are preallocated at a fraction of each shape's element count.
    pub fn initiate(
        dimensionality: Dimensionality,
        element_counts: [usize; 8],
        config: &NumberingConfig,
    ) -> Result<Self, NumberingError> {
        let mut records = Vec::with_capacity(ShapeKind::ALL.len());
        let mut abstract_nodes = 0;
        let mut abstract_ports = 0;
        for shape in ShapeKind::ALL {
            let mut record =
                ShapeRecord::new(shape, element_counts[shape.code()], dimensionality, config)?;
            record.prev_abstract_node = abstract_nodes;
            record.prev_abstract_port = abstract_ports;
            abstract_nodes += record.elements;
            abstract_ports += record.abstract_ports();
            records.push(record);
        }
        Ok(Self {
            dimensionality,
            records,
            abstract_nodes,
            abstract_ports,
            totals: PortTotals::default(),
            finalized: false,
        })
    }

    /// Dimensionality the ports are numbered for.
    #[inline]
    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    /// Abstract node number of an element.
    #[inline]
    pub fn abstract_node_of(&self, shape: ShapeKind, element: usize) -> usize {
        self.records[shape.code()].prev_abstract_node + element
    }

    /// Abstract port number of an element's local port.
    #[inline]
    pub fn abstract_port_of(&self, shape: ShapeKind, element: usize, local_port: usize) -> usize {
        let rec = &self.records[shape.code()];
        rec.prev_abstract_port + element * rec.ports_per_node + local_port
    }

    /// Total number of abstract nodes, i.e. elements.
    #[inline]
    pub fn abstract_node_count(&self) -> usize {
        self.abstract_nodes
    }

    /// Total number of abstract ports.
    #[inline]
    pub fn abstract_port_count(&self) -> usize {
        self.abstract_ports
    }

    /// Record the classification of the element with the given abstract node number.
    ///
    /// Must be called exactly once per element before [`finalize`][Self::finalize].
    /// `stub` is only considered for nodes.
    pub fn add(&mut self, abstract_node: usize, node: bool, stub: bool) -> Result<(), NumberingError> {
        if abstract_node >= self.abstract_nodes {
            return Err(NumberingError::NodeOutOfRange {
                node: abstract_node,
                len: self.abstract_nodes,
            });
        }
        let code = self
            .records
            .partition_point(|r| r.prev_abstract_node <= abstract_node)
            - 1;
        let rec = &mut self.records[code];
        rec.add(abstract_node - rec.prev_abstract_node, node, stub)
    }

    /// Settle every record's membership lists and compute the real offsets.
    ///
    /// Calling this again has no effect.
    pub fn finalize(&mut self) -> Result<(), NumberingError> {
        let mut totals = PortTotals::default();
        for rec in &mut self.records {
            rec.finalize()?;
            rec.prev_real_node = totals.nodes;
            rec.prev_real_port = totals.ports;
            rec.prev_stub_port = totals.stub_ports;
            totals.nodes += rec.nodes;
            totals.ports += rec.real_ports();
            totals.stub_ports += rec.stubs;
        }
        if !self.finalized {
            log::debug!(
                "numbered {} nodes with {} ports and {} stub ports out of {} elements",
                totals.nodes,
                totals.ports,
                totals.stub_ports,
                self.abstract_nodes,
            );
        }
        self.totals = totals;
        self.finalized = true;
        Ok(())
    }

    /// Whether [`finalize`][Self::finalize] has been called.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Node, port and stub port totals. All zero before finalizing.
    #[inline]
    pub fn totals(&self) -> PortTotals {
        self.totals
    }

    /// The record of one shape.
    #[inline]
    pub fn record(&self, shape: ShapeKind) -> &ShapeRecord {
        &self.records[shape.code()]
    }

    /// Records of all shapes in shape-code order.
    #[inline]
    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    fn check_finalized(&self, operation: &'static str) -> Result<(), NumberingError> {
        if self.finalized {
            Ok(())
        } else {
            Err(NumberingError::InvalidState {
                operation,
                state: "scanning",
            })
        }
    }

    /// Translate an abstract port number into the real numbering.
    pub fn translate(&self, abstract_port: usize) -> Result<PortTranslation, NumberingError> {
        self.check_finalized("translate ports")?;
        if abstract_port >= self.abstract_ports {
            return Err(NumberingError::PortOutOfRange {
                port: abstract_port,
                len: self.abstract_ports,
            });
        }
        let code = self
            .records
            .partition_point(|r| r.prev_abstract_port <= abstract_port)
            - 1;
        let rec = &self.records[code];
        let Some((main, stubs)) = rec.memberships() else {
            return Err(NumberingError::UnnumberedPort(abstract_port));
        };

        let local = abstract_port - rec.prev_abstract_port;
        let element = local / rec.ports_per_node;
        if !main.contains(element) {
            return Err(NumberingError::UnnumberedPort(abstract_port));
        }
        let rank = main.rank(element);
        let first_port = rec.prev_real_port + rank * rec.ports_per_node;
        Ok(PortTranslation {
            node: rec.prev_real_node + rank,
            real_port: first_port + local % rec.ports_per_node,
            first_port,
            last_port: first_port + rec.ports_per_node - 1,
            stub_offset: rec.prev_stub_port + stubs.rank(rank),
            has_stub: stubs.contains(rank),
        })
    }

    /// The abstract port a real port was translated from.
    pub fn abstract_port(&self, real_port: usize) -> Result<usize, NumberingError> {
        self.check_finalized("look up abstract ports")?;
        let (rec, element) = self.locate(real_port, self.totals.ports, |r| r.prev_real_port)?;
        let local = (real_port - rec.prev_real_port) % rec.ports_per_node;
        Ok(rec.prev_abstract_port + element * rec.ports_per_node + local)
    }

    /// The shape and element index of a real node.
    pub fn locate_node(&self, real_node: usize) -> Result<(ShapeKind, usize), NumberingError> {
        self.check_finalized("locate nodes")?;
        if real_node >= self.totals.nodes {
            return Err(NumberingError::NodeOutOfRange {
                node: real_node,
                len: self.totals.nodes,
            });
        }
        let code = self
            .records
            .partition_point(|r| r.prev_real_node <= real_node)
            - 1;
        let rec = &self.records[code];
        let element = rec
            .membership()
            .and_then(|m| m.select(real_node - rec.prev_real_node, rec.elements))
            .ok_or(NumberingError::NodeOutOfRange {
                node: real_node,
                len: self.totals.nodes,
            })?;
        Ok((rec.shape, element))
    }

    /// Find the record and element owning a real port.
    fn locate(
        &self,
        real_port: usize,
        len: usize,
        offset: impl Fn(&ShapeRecord) -> usize,
    ) -> Result<(&ShapeRecord, usize), NumberingError> {
        let out_of_range = NumberingError::PortOutOfRange {
            port: real_port,
            len,
        };
        if real_port >= len {
            return Err(out_of_range);
        }
        let code = self.records.partition_point(|r| offset(r) <= real_port) - 1;
        let rec = &self.records[code];
        let rank = (real_port - offset(rec)) / rec.ports_per_node;
        let element = rec
            .membership()
            .and_then(|m| m.select(rank, rec.elements))
            .ok_or(out_of_range)?;
        Ok((rec, element))
    }

    /// Real node number of an element, if it is a node.
    pub fn real_node_of(
        &self,
        shape: ShapeKind,
        element: usize,
    ) -> Result<Option<usize>, NumberingError> {
        self.check_finalized("look up real nodes")?;
        let rec = &self.records[shape.code()];
        Ok(rec
            .membership()
            .filter(|m| m.contains(element))
            .map(|m| rec.prev_real_node + m.rank(element)))
    }

    /// The range of real ports of an element, if it is a node.
    pub fn real_ports_of(
        &self,
        shape: ShapeKind,
        element: usize,
    ) -> Result<Option<Range<usize>>, NumberingError> {
        let ppn = self.records[shape.code()].ports_per_node;
        let first_node = self.records[shape.code()].prev_real_node;
        let first_port = self.records[shape.code()].prev_real_port;
        Ok(self.real_node_of(shape, element)?.map(|node| {
            let start = first_port + (node - first_node) * ppn;
            start..start + ppn
        }))
    }

    /// Whether an element has a stub port.
    pub fn has_stub(&self, shape: ShapeKind, element: usize) -> Result<bool, NumberingError> {
        self.check_finalized("look up stubs")?;
        let rec = &self.records[shape.code()];
        Ok(match rec.memberships() {
            Some((main, stub)) => main.contains(element) && stub.contains(main.rank(element)),
            None => false,
        })
    }
}
