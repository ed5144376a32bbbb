//! Matrix backends receiving the TLM connection operator.
//!
//! The connection operator scatters the pulses leaving each port
//! into the ports it meets at a junction.
//! For a junction of `k` ports of equal impedance,
//! the pulse entering port `i` is `Σ_j (2/k - δ_ij) v_j`
//! over the ports `j` of the junction.
//! Stub ports are open-ended and reflect onto themselves.
//!
//! Rows and columns use the layout where each node's stub port
//! follows its ordinary ports (see [`PortTranslation`][crate::PortTranslation]).

use nalgebra as na;
use nalgebra_sparse as nas;
use serde::{Deserialize, Serialize};

use crate::{error::NumberingError, numbering::Numbering};

/// The available matrix backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// A dense `nalgebra` matrix. Only sensible for small systems.
    Dense,
    /// A compressed sparse row matrix from `nalgebra-sparse`.
    #[default]
    SparseCpu,
}

//
// traits
//

/// A square matrix built entry by entry and then applied to vectors.
pub trait ConnectionBackend: std::fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;
    /// Number of rows and columns.
    fn dimension(&self) -> usize;
    /// Add `value` to the entry at `(row, col)`.
    fn push(&mut self, row: usize, col: usize, value: f64) -> Result<(), NumberingError>;
    /// Finish building. No entries can be pushed afterwards.
    fn finish(&mut self);
    /// Multiply a vector with the matrix.
    fn apply(&self, input: &na::DVector<f64>) -> na::DVector<f64>;
    /// Number of non-zero entries.
    fn nnz(&self) -> usize;
    /// Copy the matrix into CSR form, e.g. for handing it to a solver.
    fn to_csr(&self) -> nas::CsrMatrix<f64>;
}

/// Create an empty backend of the given kind and dimension.
pub fn backend_for(kind: BackendKind, dimension: usize) -> Box<dyn ConnectionBackend> {
    match kind {
        BackendKind::Dense => Box::new(DenseBackend::new(dimension)),
        BackendKind::SparseCpu => Box::new(CsrBackend::new(dimension)),
    }
}

fn check_entry(dimension: usize, row: usize, col: usize) -> Result<(), NumberingError> {
    match [row, col].into_iter().find(|&i| i >= dimension) {
        Some(port) => Err(NumberingError::PortOutOfRange {
            port,
            len: dimension,
        }),
        None => Ok(()),
    }
}

fn finished_error() -> NumberingError {
    NumberingError::InvalidState {
        operation: "push matrix entries",
        state: "finished",
    }
}

//
// concrete backends
//

/// Backend storing every entry of the matrix.
#[derive(Clone, Debug)]
pub struct DenseBackend {
    mat: na::DMatrix<f64>,
    finished: bool,
}

impl DenseBackend {
    /// Create a zero matrix of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            mat: na::DMatrix::zeros(dimension, dimension),
            finished: false,
        }
    }

    /// The underlying matrix.
    #[inline]
    pub fn matrix(&self) -> &na::DMatrix<f64> {
        &self.mat
    }
}

impl ConnectionBackend for DenseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Dense
    }

    fn dimension(&self) -> usize {
        self.mat.nrows()
    }

    fn push(&mut self, row: usize, col: usize, value: f64) -> Result<(), NumberingError> {
        check_entry(self.dimension(), row, col)?;
        if self.finished {
            return Err(finished_error());
        }
        self.mat[(row, col)] += value;
        Ok(())
    }

    fn finish(&mut self) {
        self.finished = true;
    }

    fn apply(&self, input: &na::DVector<f64>) -> na::DVector<f64> {
        &self.mat * input
    }

    fn nnz(&self) -> usize {
        self.mat.iter().filter(|&&v| v != 0.).count()
    }

    fn to_csr(&self) -> nas::CsrMatrix<f64> {
        nas::CsrMatrix::from(&nas::CooMatrix::from(&self.mat))
    }
}

/// Backend collecting entries as triplets and compressing them into CSR form.
#[derive(Clone, Debug)]
pub struct CsrBackend {
    coo: nas::CooMatrix<f64>,
    csr: Option<nas::CsrMatrix<f64>>,
}

impl CsrBackend {
    /// Create an empty matrix of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            coo: nas::CooMatrix::new(dimension, dimension),
            csr: None,
        }
    }
}

impl ConnectionBackend for CsrBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SparseCpu
    }

    fn dimension(&self) -> usize {
        self.coo.nrows()
    }

    fn push(&mut self, row: usize, col: usize, value: f64) -> Result<(), NumberingError> {
        check_entry(self.dimension(), row, col)?;
        if self.csr.is_some() {
            return Err(finished_error());
        }
        self.coo.push(row, col, value);
        Ok(())
    }

    fn finish(&mut self) {
        // duplicate entries are summed in the conversion
        self.csr = Some(nas::CsrMatrix::from(&self.coo));
    }

    fn apply(&self, input: &na::DVector<f64>) -> na::DVector<f64> {
        match &self.csr {
            Some(csr) => csr * input,
            None => &nas::CsrMatrix::from(&self.coo) * input,
        }
    }

    fn nnz(&self) -> usize {
        match &self.csr {
            Some(csr) => csr.nnz(),
            None => nas::CsrMatrix::from(&self.coo).nnz(),
        }
    }

    fn to_csr(&self) -> nas::CsrMatrix<f64> {
        match &self.csr {
            Some(csr) => csr.clone(),
            None => nas::CsrMatrix::from(&self.coo),
        }
    }
}

//
// assembly
//

/// Build the connection operator of a numbering into a backend of the given kind.
pub fn assemble_connection(
    numbering: &Numbering,
    kind: BackendKind,
) -> Result<Box<dyn ConnectionBackend>, NumberingError> {
    let totals = numbering.totals();
    let mut backend = backend_for(kind, totals.system_size());

    let mut shifted: Vec<usize> = Vec::with_capacity(4);
    for junction in numbering.registry().iter() {
        shifted.clear();
        for &port in junction.ports {
            shifted.push(numbering.shifted_port(port)?);
        }
        let transmission = 2. / shifted.len() as f64;
        for (i, &row) in shifted.iter().enumerate() {
            for (j, &col) in shifted.iter().enumerate() {
                let value = if i == j {
                    transmission - 1.
                } else {
                    transmission
                };
                if value != 0. {
                    backend.push(row, col, value)?;
                }
            }
        }
    }

    for real_port in 0..totals.ports {
        let t = numbering.translate(numbering.ports().abstract_port(real_port)?)?;
        if t.real_port != t.last_port {
            continue;
        }
        if let Some(stub) = t.stub_port() {
            backend.push(stub, stub, 1.)?;
        }
    }

    backend.finish();
    log::debug!(
        "assembled {:?} connection operator of dimension {} with {} entries",
        kind,
        backend.dimension(),
        backend.nnz()
    );
    Ok(backend)
}
