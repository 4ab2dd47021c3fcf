//! Global MNA systems that device stamps are scattered into.
//!
//! Both systems order their unknowns as node potentials (ground excluded)
//! followed by auxiliary branch currents. Every entry point takes
//! `Option<usize>` indices where `None` is ground; ground rows and columns
//! are simply dropped, so callers never special-case the reference node.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

/// Real system `A·x = b` for DC and transient Newton iterations.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    num_nodes: usize,
}

impl MnaSystem {
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
            num_nodes,
        }
    }

    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Row and column of auxiliary branch current `k`.
    pub fn branch(&self, k: usize) -> usize {
        self.num_nodes + k
    }

    /// Zero the system before the next Newton iteration.
    pub fn clear(&mut self) {
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    pub fn add(&mut self, row: Option<usize>, col: Option<usize>, value: f64) {
        if let (Some(r), Some(c)) = (row, col) {
            self.matrix[(r, c)] += value;
        }
    }

    pub fn inject(&mut self, row: Option<usize>, value: f64) {
        if let Some(r) = row {
            self.rhs[r] += value;
        }
    }

    /// Couple the terminal pair `drive` to the controlling pair `sense`:
    /// `+g` on the like-signed entries, `-g` on the cross entries.
    pub fn stamp_block(
        &mut self,
        drive: (Option<usize>, Option<usize>),
        sense: (Option<usize>, Option<usize>),
        g: f64,
    ) {
        self.add(drive.0, sense.0, g);
        self.add(drive.1, sense.1, g);
        self.add(drive.0, sense.1, -g);
        self.add(drive.1, sense.0, -g);
    }

    pub fn stamp_conductance(&mut self, a: Option<usize>, b: Option<usize>, g: f64) {
        self.stamp_block((a, b), (a, b), g);
    }

    /// Current `i` leaving `from` and entering `to`.
    pub fn stamp_current_source(&mut self, from: Option<usize>, to: Option<usize>, i: f64) {
        self.inject(from, -i);
        self.inject(to, i);
    }

    /// `V(pos) - V(neg) = v`, with the source current as branch `k`.
    pub fn stamp_voltage_source(
        &mut self,
        pos: Option<usize>,
        neg: Option<usize>,
        k: usize,
        v: f64,
    ) {
        let row = Some(self.branch(k));
        self.add(pos, row, 1.0);
        self.add(row, pos, 1.0);
        self.add(neg, row, -1.0);
        self.add(row, neg, -1.0);
        self.inject(row, v);
    }
}

/// Complex system for small-signal AC sweeps.
#[derive(Debug, Clone)]
pub struct ComplexMna {
    matrix: DMatrix<Complex<f64>>,
    rhs: DVector<Complex<f64>>,
    num_nodes: usize,
}

impl ComplexMna {
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
            num_nodes,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn matrix(&self) -> &DMatrix<Complex<f64>> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<Complex<f64>> {
        &self.rhs
    }

    pub fn add(&mut self, row: Option<usize>, col: Option<usize>, value: Complex<f64>) {
        if let (Some(r), Some(c)) = (row, col) {
            self.matrix[(r, c)] += value;
        }
    }

    pub fn inject(&mut self, row: Option<usize>, value: Complex<f64>) {
        if let Some(r) = row {
            self.rhs[r] += value;
        }
    }

    pub fn stamp_admittance(&mut self, a: Option<usize>, b: Option<usize>, y: Complex<f64>) {
        self.add(a, a, y);
        self.add(b, b, y);
        self.add(a, b, -y);
        self.add(b, a, -y);
    }

    /// Phasor current leaving `from` and entering `to`.
    pub fn stamp_current_source(
        &mut self,
        from: Option<usize>,
        to: Option<usize>,
        i: Complex<f64>,
    ) {
        self.inject(from, -i);
        self.inject(to, i);
    }

    pub fn stamp_voltage_source(
        &mut self,
        pos: Option<usize>,
        neg: Option<usize>,
        k: usize,
        v: Complex<f64>,
    ) {
        let one = Complex::new(1.0, 0.0);
        let row = Some(self.num_nodes + k);
        self.add(pos, row, one);
        self.add(row, pos, one);
        self.add(neg, row, -one);
        self.add(row, neg, -one);
        self.inject(row, v);
    }
}
