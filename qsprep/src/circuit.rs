//! Quantum circuits of multi-controlled Y rotations.
//!
//! This is the circuit handed back to the caller: an ordered list of
//! [`Gate`]s over a fixed number of qubits. A gate is a composition of a
//! target qubit, a [`Rotation`] payload and a list of [`Control`]s; there is
//! no gate hierarchy.

pub mod cost;

use std::f64::consts::PI;
use std::fmt;

use derive_more::{Display, Error};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use self::cost::mcry_cnot_cost;

/// A control qubit and the value it must hold for the gate to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Control {
    /// The control qubit.
    pub qubit: usize,
    /// `true` if the gate acts when the qubit is one, `false` when it is zero.
    pub phase: bool,
}

impl Control {
    /// Create a new control.
    pub fn new(qubit: usize, phase: bool) -> Self {
        Self { qubit, phase }
    }

    /// Returns `true` if the basis label satisfies the control.
    #[inline]
    pub fn is_satisfied(&self, index: usize) -> bool {
        ((index >> self.qubit) & 1 == 1) == self.phase
    }
}

/// The operation a gate applies to its target qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rotation {
    /// A bit flip (X gate).
    Flip,
    /// A Y rotation by an angle in `[0, 2π)`.
    Ry(f64),
    /// A multiplexed Y rotation.
    ///
    /// Applies `Ry(thetas[p])`, where `p` is the integer whose bit `j` is the
    /// value of qubit `selects[j]`.
    Multiplexed {
        /// The select qubits.
        selects: Vec<usize>,
        /// One angle per select pattern.
        thetas: Vec<f64>,
    },
}

/// A (multi-controlled) rotation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    target: usize,
    rotation: Rotation,
    controls: Vec<Control>,
}

impl Gate {
    /// Create a new gate.
    pub fn new(target: usize, rotation: Rotation, controls: Vec<Control>) -> Self {
        if let Rotation::Ry(theta) = rotation {
            debug_assert!((0.0..2.0 * PI).contains(&theta), "angle out of range");
        }
        Self {
            target,
            rotation,
            controls,
        }
    }

    /// An uncontrolled Y rotation.
    pub fn ry(theta: f64, target: usize) -> Self {
        Self::new(target, Rotation::Ry(theta), Vec::new())
    }

    /// A multi-controlled Y rotation.
    pub fn mcry(theta: f64, controls: Vec<Control>, target: usize) -> Self {
        Self::new(target, Rotation::Ry(theta), controls)
    }

    /// An uncontrolled bit flip.
    pub fn x(target: usize) -> Self {
        Self::new(target, Rotation::Flip, Vec::new())
    }

    /// A single-controlled bit flip.
    pub fn cx(control: Control, target: usize) -> Self {
        Self::new(target, Rotation::Flip, vec![control])
    }

    /// A Y rotation multiplexed by one select qubit.
    ///
    /// Applies `Ry(theta0)` when `select` is zero and `Ry(theta1)` otherwise.
    pub fn multiplexy(theta0: f64, theta1: f64, select: usize, target: usize) -> Self {
        Self::new(
            target,
            Rotation::Multiplexed {
                selects: vec![select],
                thetas: vec![theta0, theta1],
            },
            Vec::new(),
        )
    }

    /// A Y rotation multiplexed by several select qubits.
    ///
    /// # Errors
    ///
    /// Fails if there is not exactly one angle per select pattern.
    pub fn multiplexed(
        selects: Vec<usize>,
        thetas: Vec<f64>,
        target: usize,
    ) -> Result<Self, CircuitError> {
        if thetas.len() != 1 << selects.len() {
            return Err(CircuitError::InvalidMultiplexor {
                selects: selects.len(),
                angles: thetas.len(),
            });
        }
        Ok(Self::new(
            target,
            Rotation::Multiplexed { selects, thetas },
            Vec::new(),
        ))
    }

    /// The target qubit.
    #[inline]
    pub fn target(&self) -> usize {
        self.target
    }

    /// The rotation payload.
    #[inline]
    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// The controls of the gate.
    #[inline]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// The rotation angle of a flip or a plain rotation.
    ///
    /// A flip reports `π`. Multiplexed rotations report their first angle.
    pub fn angle(&self) -> f64 {
        match &self.rotation {
            Rotation::Flip => PI,
            Rotation::Ry(theta) => *theta,
            Rotation::Multiplexed { thetas, .. } => thetas.first().copied().unwrap_or(0.0),
        }
    }

    /// The number of CNOTs needed to implement the gate.
    pub fn cnot_cost(&self) -> usize {
        match &self.rotation {
            Rotation::Flip => mcry_cnot_cost(self.controls.len(), true),
            Rotation::Ry(_) => mcry_cnot_cost(self.controls.len(), false),
            Rotation::Multiplexed { selects, .. } => {
                mcry_cnot_cost(self.controls.len() + selects.len(), false)
            }
        }
    }

    /// All qubits the gate touches, target first.
    pub fn qubits(&self) -> impl Iterator<Item = usize> + '_ {
        let selects = match &self.rotation {
            Rotation::Multiplexed { selects, .. } => selects.as_slice(),
            _ => &[],
        };
        std::iter::once(self.target)
            .chain(self.controls.iter().map(|c| c.qubit))
            .chain(selects.iter().copied())
    }

    /// Rename the qubits of the gate.
    pub fn remap(&self, map: impl Fn(usize) -> usize) -> Self {
        let rotation = match &self.rotation {
            Rotation::Multiplexed { selects, thetas } => Rotation::Multiplexed {
                selects: selects.iter().map(|&q| map(q)).collect(),
                thetas: thetas.clone(),
            },
            other => other.clone(),
        };
        Self {
            target: map(self.target),
            rotation,
            controls: self
                .controls
                .iter()
                .map(|c| Control::new(map(c.qubit), c.phase))
                .collect(),
        }
    }

    /// Apply the gate to a dense real state vector.
    fn apply(&self, amplitudes: &mut [f64]) {
        let bit = 1 << self.target;
        for i in 0..amplitudes.len() {
            if i & bit != 0 || !self.controls.iter().all(|c| c.is_satisfied(i)) {
                continue;
            }
            let (v0, v1) = (amplitudes[i], amplitudes[i | bit]);
            let theta = match &self.rotation {
                Rotation::Flip => {
                    amplitudes.swap(i, i | bit);
                    continue;
                }
                Rotation::Ry(theta) => *theta,
                Rotation::Multiplexed { selects, thetas } => {
                    let pattern = selects
                        .iter()
                        .enumerate()
                        .fold(0, |p, (j, &q)| p | (((i >> q) & 1) << j));
                    thetas[pattern]
                }
            };
            let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
            amplitudes[i] = c * v0 - s * v1;
            amplitudes[i | bit] = s * v0 + c * v1;
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let controls = self
            .controls
            .iter()
            .map(|c| format!("{}{}", if c.phase { "" } else { "!" }, c.qubit))
            .join(", ");
        match &self.rotation {
            Rotation::Flip => write!(f, "MCX([{controls}], {})", self.target),
            Rotation::Ry(theta) => write!(f, "MCRY({theta:.4}, [{controls}], {})", self.target),
            Rotation::Multiplexed { selects, thetas } => write!(
                f,
                "MULTIPLEXY({:.4?}, {:?}, [{controls}], {})",
                thetas, selects, self.target
            ),
        }
    }
}

/// A quantum circuit over a fixed number of qubits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Circuit {
    num_qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    /// An empty circuit over `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
        }
    }

    /// The number of qubits.
    #[inline]
    pub fn qubit_count(&self) -> usize {
        self.num_qubits
    }

    /// The gates in application order.
    #[inline]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// The number of gates.
    #[inline]
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Append a gate.
    ///
    /// # Errors
    ///
    /// Fails if the gate touches a qubit outside the circuit or touches the
    /// same qubit twice.
    pub fn add_gate(&mut self, gate: Gate) -> Result<(), CircuitError> {
        if let Some(qubit) = gate.qubits().find(|&q| q >= self.num_qubits) {
            return Err(CircuitError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        if let Some(qubit) = gate.qubits().duplicates().next() {
            return Err(CircuitError::DuplicateQubit { qubit });
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Append several gates.
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = Gate>) -> Result<(), CircuitError> {
        gates.into_iter().try_for_each(|g| self.add_gate(g))
    }

    /// The total number of CNOTs of the circuit.
    pub fn cnot_cost(&self) -> usize {
        cost::gates_cnot_cost(&self.gates)
    }

    /// Simulate the circuit on `|0…0⟩` and return the dense state vector.
    pub fn simulate(&self) -> Vec<f64> {
        let mut amplitudes = vec![0.0; 1 << self.num_qubits];
        amplitudes[0] = 1.0;
        for gate in &self.gates {
            gate.apply(&mut amplitudes);
        }
        amplitudes
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Circuit({} qubits, {} CNOTs)", self.num_qubits, self.cnot_cost())?;
        for gate in &self.gates {
            writeln!(f, "  {gate}")?;
        }
        Ok(())
    }
}

/// Errors that can occur when building a circuit.
#[derive(Debug, Display, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CircuitError {
    /// A gate acts on a qubit the circuit does not have.
    #[display("Qubit {qubit} is out of range for a circuit with {num_qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: usize,
        /// The number of qubits of the circuit.
        num_qubits: usize,
    },
    /// A gate uses the same qubit twice.
    #[display("Qubit {qubit} appears more than once in a gate")]
    DuplicateQubit {
        /// The offending qubit.
        qubit: usize,
    },
    /// A multiplexor does not have one angle per select pattern.
    #[display("A multiplexor with {selects} select qubits needs {} angles, got {angles}", 1usize << selects)]
    InvalidMultiplexor {
        /// The number of select qubits.
        selects: usize,
        /// The number of angles given.
        angles: usize,
    },
}
