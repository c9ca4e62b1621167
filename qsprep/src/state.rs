//! Sparse representation of quantum states.
//!
//! A [`QState`] stores the non-zero amplitudes of a state vector over
//! `num_qubits` qubits, indexed by their basis label. Qubit `i` is bit `i` of
//! the label, so on three qubits the label `4` is `|100⟩` and sets qubit 2.
//!
//! All amplitudes are real: the gate model only uses Y rotations and bit
//! flips, which keep a real state real.

pub mod operator;

use std::collections::BTreeMap;
use std::fmt;

use derive_more::{Display, Error};
use itertools::Itertools;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

pub use operator::{McryOperator, OperatorError, QuantizedRotation};

/// Amplitudes with a smaller magnitude are considered to be zero.
pub const AMPLITUDE_TOLERANCE: f64 = 1e-12;

/// A single weighted basis label of a sparse state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PureState {
    /// The basis label.
    pub index: usize,
    /// The (real) amplitude of the label.
    pub amplitude: f64,
}

impl PureState {
    /// Create a new pure state.
    pub fn new(index: usize, amplitude: f64) -> Self {
        Self { index, amplitude }
    }

    /// Value of `qubit` in the label.
    #[inline]
    pub fn bit(&self, qubit: usize) -> bool {
        (self.index >> qubit) & 1 == 1
    }

    /// The same amplitude on the label with `qubit` flipped.
    #[inline]
    pub fn flip(&self, qubit: usize) -> Self {
        Self::new(self.index ^ (1 << qubit), self.amplitude)
    }

    /// The same amplitude on the label with `qubit` cleared.
    #[inline]
    pub fn set0(&self, qubit: usize) -> Self {
        Self::new(self.index & !(1 << qubit), self.amplitude)
    }

    /// The same amplitude on the label with `qubit` set.
    #[inline]
    pub fn set1(&self, qubit: usize) -> Self {
        Self::new(self.index | (1 << qubit), self.amplitude)
    }

    /// Bit-string of the label, most significant qubit first.
    pub fn to_bitstring(&self, num_qubits: usize) -> String {
        (0..num_qubits)
            .rev()
            .map(|q| if self.bit(q) { '1' } else { '0' })
            .collect()
    }
}

/// A sparse quantum state: a map from basis labels to amplitudes.
///
/// Only labels with a non-zero amplitude are stored, in ascending label
/// order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QState {
    num_qubits: usize,
    states: BTreeMap<usize, f64>,
}

impl QState {
    /// An empty state over `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            states: BTreeMap::new(),
        }
    }

    /// The reference state `|0…0⟩`.
    pub fn ground_state(num_qubits: usize) -> Self {
        Self::from_pure_states([PureState::new(0, 1.0)], num_qubits)
    }

    /// Build a state from a list of pure states.
    ///
    /// Labels appearing more than once keep the last amplitude.
    pub fn from_pure_states(
        pure_states: impl IntoIterator<Item = PureState>,
        num_qubits: usize,
    ) -> Self {
        let mut state = Self::new(num_qubits);
        for ps in pure_states {
            state.add_pure_state(ps);
        }
        state
    }

    /// Quantise a dense amplitude vector into a normalised sparse state.
    ///
    /// The qubit count is `log2` of the vector length.
    ///
    /// # Errors
    ///
    /// Fails if the vector is empty, its length is not a power of two, an
    /// amplitude is not finite, or the vector has zero norm.
    pub fn from_amplitudes(amplitudes: &[f64]) -> Result<Self, StateError> {
        let num_qubits = num_qubits_of(amplitudes.len())?;
        if let Some(index) = amplitudes.iter().position(|a| !a.is_finite()) {
            return Err(StateError::NonFinite { index });
        }
        let norm = amplitudes.iter().map(|a| a * a).sum::<f64>().sqrt();
        if norm <= AMPLITUDE_TOLERANCE {
            return Err(StateError::ZeroNorm);
        }
        let states = amplitudes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.abs() / norm > AMPLITUDE_TOLERANCE)
            .map(|(index, a)| (index, a / norm))
            .collect();
        Ok(Self { num_qubits, states })
    }

    /// Quantise a dense complex amplitude vector.
    ///
    /// Only real states can be prepared with Y rotations, so every amplitude
    /// must have a vanishing imaginary part.
    pub fn from_complex_amplitudes(amplitudes: &[Complex64]) -> Result<Self, StateError> {
        if let Some(index) = amplitudes
            .iter()
            .position(|a| a.im.abs() > AMPLITUDE_TOLERANCE)
        {
            return Err(StateError::ComplexAmplitude { index });
        }
        let real = amplitudes.iter().map(|a| a.re).collect_vec();
        Self::from_amplitudes(&real)
    }

    /// The number of qubits of the state.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The number of active labels (the cardinality of the state).
    #[inline]
    pub fn get_sparsity(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if the state has no active label.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The qubits on which any two active labels differ, in ascending order.
    pub fn get_supports(&self) -> Vec<usize> {
        let Some(&first) = self.states.keys().next() else {
            return Vec::new();
        };
        let varying = self.states.keys().fold(0, |acc, &l| acc | (l ^ first));
        (0..self.num_qubits)
            .filter(|q| (varying >> q) & 1 == 1)
            .collect()
    }

    /// The qubits whose value is one in every active label.
    pub fn constant_ones(&self) -> Vec<usize> {
        let Some(all) = self.states.keys().copied().reduce(|acc, l| acc & l) else {
            return Vec::new();
        };
        (0..self.num_qubits).filter(|q| (all >> q) & 1 == 1).collect()
    }

    /// Returns `true` if `index` is an active label.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.states.contains_key(&index)
    }

    /// The amplitude of a label, zero if the label is not active.
    #[inline]
    pub fn amplitude(&self, index: usize) -> f64 {
        self.states.get(&index).copied().unwrap_or(0.0)
    }

    /// Iterate over the active labels in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.states.keys().copied()
    }

    /// Iterate over the pure states in ascending label order.
    pub fn pure_states(&self) -> impl Iterator<Item = PureState> + '_ {
        self.states
            .iter()
            .map(|(&index, &amplitude)| PureState::new(index, amplitude))
    }

    /// Insert a pure state, replacing any amplitude already on its label.
    ///
    /// Vanishing amplitudes remove the label instead.
    pub fn add_pure_state(&mut self, pure_state: PureState) {
        if pure_state.amplitude.abs() <= AMPLITUDE_TOLERANCE {
            self.states.remove(&pure_state.index);
        } else {
            self.states.insert(pure_state.index, pure_state.amplitude);
        }
    }

    /// The dense amplitude vector of length `2^num_qubits`.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; 1 << self.num_qubits];
        for (&index, &amplitude) in &self.states {
            dense[index] = amplitude;
        }
        dense
    }
}

impl fmt::Display for QState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self
            .pure_states()
            .map(|ps| format!("{:.3}*|{}>", ps.amplitude, ps.to_bitstring(self.num_qubits)))
            .join(" + ");
        write!(f, "{terms}")
    }
}

/// Qubit count of a dense vector of length `len`.
pub(crate) fn num_qubits_of(len: usize) -> Result<usize, StateError> {
    if len == 0 {
        return Err(StateError::Empty);
    }
    if !len.is_power_of_two() {
        return Err(StateError::NotPowerOfTwo { len });
    }
    Ok(len.trailing_zeros() as usize)
}

/// The target state is not a valid state representation.
#[derive(Debug, Display, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StateError {
    /// The amplitude vector is empty.
    #[display("The amplitude vector is empty")]
    Empty,
    /// The amplitude vector length is not a power of two.
    #[display("The amplitude vector length {len} is not a power of two")]
    NotPowerOfTwo {
        /// The length of the vector.
        len: usize,
    },
    /// An amplitude is NaN or infinite.
    #[display("The amplitude at index {index} is not finite")]
    NonFinite {
        /// The position of the amplitude.
        index: usize,
    },
    /// A complex amplitude has a non-zero imaginary part.
    #[display("The amplitude at index {index} is not real")]
    ComplexAmplitude {
        /// The position of the amplitude.
        index: usize,
    },
    /// All amplitudes are zero.
    #[display("The amplitude vector has zero norm")]
    ZeroNorm,
}
