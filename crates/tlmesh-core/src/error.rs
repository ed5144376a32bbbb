//! Errors raised by the numbering engine and their flat numeric status codes.
//!
//! Every fallible operation returns a [`NumberingError`].
//! Callers on the other side of a numeric protocol
//! can turn a result into a status with [`status_of`],
//! where 0 means success and every failure has its own non-zero code.

use std::fmt;

/// Storage growth call sites, each reported with its own status code
/// when an allocation fails there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocSite {
    /// Preallocating a shape record's tracked element list.
    RecordInit,
    /// Growing a shape record's tracked element list during the scan.
    RecordGrow,
    /// Preallocating a shape record's stub list.
    StubRecordInit,
    /// Growing a shape record's stub list during the scan.
    StubRecordGrow,
    /// Building the complement of a tracked list at finalize time.
    ComplementInvert,
    /// Allocating the junction tree arena and its root.
    JunctionInit,
    /// Growing the junction tree arena.
    JunctionArenaGrow,
    /// Growing the key list of a junction tree branch.
    JunctionKeyGrow,
    /// Growing the port list of a junction.
    JunctionPortGrow,
}

impl AllocSite {
    /// Every call site, for enumeration in diagnostics and tests.
    pub const ALL: [AllocSite; 9] = [
        AllocSite::RecordInit,
        AllocSite::RecordGrow,
        AllocSite::StubRecordInit,
        AllocSite::StubRecordGrow,
        AllocSite::ComplementInvert,
        AllocSite::JunctionInit,
        AllocSite::JunctionArenaGrow,
        AllocSite::JunctionKeyGrow,
        AllocSite::JunctionPortGrow,
    ];

    /// Numeric identifier of this call site.
    pub fn code(self) -> u32 {
        match self {
            AllocSite::RecordInit => 1,
            AllocSite::RecordGrow => 2,
            AllocSite::StubRecordInit => 3,
            AllocSite::StubRecordGrow => 4,
            AllocSite::ComplementInvert => 5,
            AllocSite::JunctionInit => 11,
            AllocSite::JunctionArenaGrow => 12,
            AllocSite::JunctionKeyGrow => 13,
            AllocSite::JunctionPortGrow => 14,
        }
    }
}

impl fmt::Display for AllocSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllocSite::RecordInit => "shape record initialization",
            AllocSite::RecordGrow => "shape record growth",
            AllocSite::StubRecordInit => "stub record initialization",
            AllocSite::StubRecordGrow => "stub record growth",
            AllocSite::ComplementInvert => "tracked list inversion",
            AllocSite::JunctionInit => "junction tree initialization",
            AllocSite::JunctionArenaGrow => "junction tree growth",
            AllocSite::JunctionKeyGrow => "junction key growth",
            AllocSite::JunctionPortGrow => "junction port growth",
        };
        write!(f, "{name} (site {})", self.code())
    }
}

/// Error in numbering the ports and junctions of a mesh.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberingError {
    /// Growing some internal storage failed.
    /// Fatal for the whole numbering pass.
    #[error("Allocation failed during {site}")]
    Allocation {
        /// Where the allocation was attempted.
        site: AllocSite,
    },
    /// None of the mesh elements matched a material of the equation.
    /// Fatal for this equation only.
    #[error("No element matched the material tags of equation `{equation}`")]
    NoMaterialMatched {
        /// Name of the equation being numbered.
        equation: String,
    },
    /// Equations can only be one-, two- or three-dimensional.
    #[error("Unsupported dimensionality {0}, expected 1, 2 or 3")]
    InvalidDimensionality(u8),
    /// A junction key didn't have the length of the junction tree.
    #[error("Junction key has {found} nodes, expected {expected}")]
    InvalidKey {
        /// Depth of the junction tree.
        expected: usize,
        /// Length of the key given.
        found: usize,
    },
    /// A port number outside of the numbered range.
    #[error("Port {port} is outside of the numbered range 0..{len}")]
    PortOutOfRange {
        /// The port asked for.
        port: usize,
        /// Number of ports in the range.
        len: usize,
    },
    /// A TLM node number outside of the numbered range.
    #[error("Node {node} is outside of the numbered range 0..{len}")]
    NodeOutOfRange {
        /// The node asked for.
        node: usize,
        /// Number of nodes in the range.
        len: usize,
    },
    /// A junction id outside of the numbered range.
    #[error("Junction {id} is outside of the numbered range 0..{len}")]
    JunctionOutOfRange {
        /// The junction asked for.
        id: usize,
        /// Number of junctions.
        len: usize,
    },
    /// An abstract port belongs to an element that isn't a TLM node.
    #[error("Abstract port {0} belongs to an element without real ports")]
    UnnumberedPort(usize),
    /// An operation was called in a state of the numbering pass that doesn't allow it.
    #[error("Cannot {operation} while numbering is {state}")]
    InvalidState {
        /// The operation attempted.
        operation: &'static str,
        /// The state the pass was in.
        state: &'static str,
    },
}

impl NumberingError {
    /// Flat numeric status code of this error. Never 0.
    pub fn status_code(&self) -> u32 {
        match self {
            NumberingError::Allocation { site } => 100 + site.code(),
            NumberingError::NoMaterialMatched { .. } => 2,
            NumberingError::InvalidDimensionality(_) => 3,
            NumberingError::InvalidKey { .. } => 4,
            NumberingError::PortOutOfRange { .. } => 5,
            NumberingError::NodeOutOfRange { .. } => 6,
            NumberingError::UnnumberedPort(_) => 7,
            NumberingError::InvalidState { .. } => 8,
            NumberingError::JunctionOutOfRange { .. } => 9,
        }
    }

    /// Whether this error only concerns the current equation,
    /// so that other equations can still be attempted.
    pub fn is_equation_local(&self) -> bool {
        matches!(self, NumberingError::NoMaterialMatched { .. })
    }
}

/// Status code of a result: 0 on success, the error's code otherwise.
pub fn status_of<T>(result: &Result<T, NumberingError>) -> u32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.status_code(),
    }
}
