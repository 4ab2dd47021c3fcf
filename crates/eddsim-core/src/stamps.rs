//! Port-local stamp matrices.
//!
//! A multi-terminal device writes its contributions against its own port
//! indices (`0..ports`). The surrounding netlist then scatters them into
//! the global MNA system through the device's terminal→node map, dropping
//! rows and columns that land on ground.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;

use crate::mna::{ComplexMna, MnaSystem};

/// Additional harmonic-balance stamp targets.
#[derive(Debug, Clone)]
pub struct HbStamps {
    /// Nonlinear source term `G·V` (routed here instead of into the RHS).
    pub gv: DVector<f64>,
    /// Charge vector.
    pub q: DVector<f64>,
    /// Charge-vs-voltage Jacobian.
    pub qv: DMatrix<f64>,
    /// Charge companion term `C·V`.
    pub cv: DVector<f64>,
}

impl HbStamps {
    fn new(ports: usize) -> Self {
        Self {
            gv: DVector::zeros(ports),
            q: DVector::zeros(ports),
            qv: DMatrix::zeros(ports, ports),
            cv: DVector::zeros(ports),
        }
    }
}

/// Port-local matrices of one device, shaped for the active analysis.
#[derive(Debug, Clone, Default)]
pub struct DeviceStamps {
    ports: usize,
    y: DMatrix<f64>,
    i: DVector<f64>,
    ac: DMatrix<Complex<f64>>,
    s: Option<DMatrix<Complex<f64>>>,
    hb: Option<HbStamps>,
}

impl DeviceStamps {
    /// Allocate the plain MNA shape (real Y and I, complex AC admittance).
    pub fn alloc_mna(ports: usize) -> Self {
        Self {
            ports,
            y: DMatrix::zeros(ports, ports),
            i: DVector::zeros(ports),
            ac: DMatrix::from_element(ports, ports, Complex::new(0.0, 0.0)),
            s: None,
            hb: None,
        }
    }

    /// Allocate the S-parameter shape.
    pub fn alloc_s(ports: usize) -> Self {
        Self {
            s: Some(DMatrix::from_element(ports, ports, Complex::new(0.0, 0.0))),
            ..Self::alloc_mna(ports)
        }
    }

    /// Allocate the harmonic-balance shape.
    pub fn alloc_hb(ports: usize) -> Self {
        Self {
            hb: Some(HbStamps::new(ports)),
            ..Self::alloc_mna(ports)
        }
    }

    /// Number of ports.
    pub fn ports(&self) -> usize {
        self.ports
    }

    pub fn set_y(&mut self, row: usize, col: usize, value: f64) {
        self.y[(row, col)] = value;
    }

    pub fn add_y(&mut self, row: usize, col: usize, value: f64) {
        self.y[(row, col)] += value;
    }

    pub fn set_i(&mut self, port: usize, value: f64) {
        self.i[port] = value;
    }

    pub fn add_i(&mut self, port: usize, value: f64) {
        self.i[port] += value;
    }

    /// Real Jacobian (conductance) matrix.
    pub fn y(&self) -> &DMatrix<f64> {
        &self.y
    }

    /// Right-hand side current vector.
    pub fn i(&self) -> &DVector<f64> {
        &self.i
    }

    /// Replace the complex small-signal admittance matrix.
    pub fn set_matrix_y(&mut self, y: DMatrix<Complex<f64>>) {
        self.ac = y;
    }

    /// Complex small-signal admittance matrix.
    pub fn matrix_y(&self) -> &DMatrix<Complex<f64>> {
        &self.ac
    }

    /// Replace the scattering matrix.
    pub fn set_matrix_s(&mut self, s: DMatrix<Complex<f64>>) {
        self.s = Some(s);
    }

    /// Scattering matrix, if the S-parameter shape was allocated.
    pub fn matrix_s(&self) -> Option<&DMatrix<Complex<f64>>> {
        self.s.as_ref()
    }

    /// Harmonic-balance targets, if the HB shape was allocated.
    pub fn hb(&self) -> Option<&HbStamps> {
        self.hb.as_ref()
    }

    pub fn set_gv(&mut self, port: usize, value: f64) {
        if let Some(hb) = self.hb.as_mut() {
            hb.gv[port] = value;
        }
    }

    pub fn set_q(&mut self, port: usize, value: f64) {
        if let Some(hb) = self.hb.as_mut() {
            hb.q[port] = value;
        }
    }

    pub fn set_qv(&mut self, row: usize, col: usize, value: f64) {
        if let Some(hb) = self.hb.as_mut() {
            hb.qv[(row, col)] = value;
        }
    }

    pub fn set_cv(&mut self, port: usize, value: f64) {
        if let Some(hb) = self.hb.as_mut() {
            hb.cv[port] = value;
        }
    }

    /// Stamp the current obtained by integrating a charge between two ports.
    pub fn transient_charge(&mut self, qpos: usize, qneg: usize, current: f64) {
        self.add_i(qpos, -current);
        self.add_i(qneg, current);
    }

    /// Stamp the companion conductance `g` of a charge between ports
    /// `qpos/qneg` controlled by the voltage `v` across `vpos/vneg`.
    pub fn transient_capacitance(
        &mut self,
        qpos: usize,
        qneg: usize,
        vpos: usize,
        vneg: usize,
        g: f64,
        v: f64,
    ) {
        let i = g * v;
        self.add_y(qpos, vpos, g);
        self.add_y(qneg, vneg, g);
        self.add_y(qpos, vneg, -g);
        self.add_y(qneg, vpos, -g);
        self.add_i(qpos, i);
        self.add_i(qneg, -i);
    }

    /// Add the real Jacobian and RHS into the global system.
    ///
    /// `nodes[p]` is the MNA index of port `p` (None for ground).
    pub fn scatter_into(&self, nodes: &[Option<usize>], mna: &mut MnaSystem) {
        for (r, &row) in nodes.iter().enumerate() {
            mna.inject(row, self.i[r]);
            for (c, &col) in nodes.iter().enumerate() {
                mna.add(row, col, self.y[(r, c)]);
            }
        }
    }

    /// Add the complex admittance matrix into the global AC system.
    pub fn scatter_ac_into(&self, nodes: &[Option<usize>], mna: &mut ComplexMna) {
        for (r, &row) in nodes.iter().enumerate() {
            for (c, &col) in nodes.iter().enumerate() {
                mna.add(row, col, self.ac[(r, c)]);
            }
        }
    }
}
