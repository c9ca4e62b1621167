//! Multi-controlled Y-rotation operators acting on sparse states.
//!
//! A [`McryOperator`] describes one reduction step on a [`QState`]: a bit
//! flip, a merge of two sibling labels into one, or the split of one label
//! into two. Applying it returns the reduced state together with the gate
//! that undoes the step, so that a sequence of reductions down to the ground
//! state yields a preparation circuit when its gates are replayed backwards.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use super::{PureState, QState};
use crate::circuit::cost::mcry_cnot_cost;
use crate::circuit::{Control, Gate, Rotation};

/// Two rotation angles closer than this are considered equal.
pub(crate) const ANGLE_TOLERANCE: f64 = 1e-9;

/// The kind of transition a [`McryOperator`] performs on its target qubit.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum QuantizedRotation {
    /// Flip the target bit of every controlled label.
    Swap,
    /// Merge each controlled sibling pair into the label with the target at 0.
    Merge0,
    /// Merge each controlled sibling pair into the label with the target at 1.
    Merge1,
    /// Split each controlled label with the target at 0 into a sibling pair.
    Split0,
    /// Split each controlled label with the target at 1 into a sibling pair.
    Split1,
}

impl QuantizedRotation {
    /// The rotation undoing this one.
    pub fn inverse(self) -> Self {
        match self {
            QuantizedRotation::Swap => QuantizedRotation::Swap,
            QuantizedRotation::Merge0 => QuantizedRotation::Split0,
            QuantizedRotation::Merge1 => QuantizedRotation::Split1,
            QuantizedRotation::Split0 => QuantizedRotation::Merge0,
            QuantizedRotation::Split1 => QuantizedRotation::Merge1,
        }
    }
}

/// A multi-controlled Y rotation acting on the labels of a sparse state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct McryOperator {
    target: usize,
    rotation: QuantizedRotation,
    controls: Vec<Control>,
}

impl McryOperator {
    /// Create a new operator.
    ///
    /// The target qubit must not appear among the controls.
    pub fn new(target: usize, rotation: QuantizedRotation, controls: Vec<Control>) -> Self {
        debug_assert!(controls.iter().all(|c| c.qubit != target));
        Self {
            target,
            rotation,
            controls,
        }
    }

    /// A (multi-controlled) bit flip.
    pub fn swap(target: usize, controls: Vec<Control>) -> Self {
        Self::new(target, QuantizedRotation::Swap, controls)
    }

    /// A (multi-controlled) merge towards the label with the target at 0.
    pub fn merge0(target: usize, controls: Vec<Control>) -> Self {
        Self::new(target, QuantizedRotation::Merge0, controls)
    }

    /// The target qubit.
    pub fn target(&self) -> usize {
        self.target
    }

    /// The rotation kind.
    pub fn rotation(&self) -> QuantizedRotation {
        self.rotation
    }

    /// The control qubits and their phases.
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Returns `true` if the label satisfies every control.
    #[inline]
    pub fn is_controlled(&self, index: usize) -> bool {
        self.controls.iter().all(|c| c.is_satisfied(index))
    }

    /// The CNOT cost of the operator.
    pub fn cost(&self) -> usize {
        mcry_cnot_cost(
            self.controls.len(),
            self.rotation == QuantizedRotation::Swap,
        )
    }

    /// The operator undoing this one.
    pub fn inverse(&self) -> Self {
        Self {
            rotation: self.rotation.inverse(),
            ..self.clone()
        }
    }

    /// Apply the operator to a state.
    ///
    /// Returns the new state and the gate mapping the new state back onto
    /// `state`.
    ///
    /// # Errors
    ///
    /// Merges fail if a controlled label has no sibling or if the controlled
    /// pairs need different rotation angles. Splits fail if a controlled
    /// label already has its sibling or sits on the wrong side of the
    /// target.
    pub fn apply(&self, state: &QState) -> Result<(QState, Gate), OperatorError> {
        let mut new_state = QState::new(state.num_qubits());
        let target = self.target;

        let gate = match self.rotation {
            QuantizedRotation::Swap => {
                for ps in state.pure_states() {
                    match self.is_controlled(ps.index) {
                        true => new_state.add_pure_state(ps.flip(target)),
                        false => new_state.add_pure_state(ps),
                    }
                }
                Gate::new(target, Rotation::Flip, self.controls.clone())
            }
            QuantizedRotation::Merge0 | QuantizedRotation::Merge1 => {
                let to_one = self.rotation == QuantizedRotation::Merge1;
                let mut theta: Option<f64> = None;
                for ps in state.pure_states() {
                    if !self.is_controlled(ps.index) {
                        new_state.add_pure_state(ps);
                        continue;
                    }
                    if !state.contains(ps.flip(target).index) {
                        return Err(OperatorError::MissingSibling { index: ps.index });
                    }
                    if ps.bit(target) {
                        // Handled together with its sibling.
                        continue;
                    }
                    let neg = ps.set0(target);
                    let a_pos = state.amplitude(ps.set1(target).index);
                    let (pair_theta, merged) = merge_rotation(neg.amplitude, a_pos, to_one);
                    match theta {
                        Some(t) if (t - pair_theta).abs() > ANGLE_TOLERANCE => {
                            return Err(OperatorError::AmbiguousRotation { target })
                        }
                        Some(_) => {}
                        None => theta = Some(pair_theta),
                    }
                    let dst = if to_one { ps.set1(target) } else { neg };
                    new_state.add_pure_state(PureState::new(dst.index, merged));
                }
                let theta = theta.ok_or(OperatorError::NothingControlled)?;
                Gate::mcry(theta, self.controls.clone(), target)
            }
            QuantizedRotation::Split0 | QuantizedRotation::Split1 => {
                let from_one = self.rotation == QuantizedRotation::Split1;
                let mut any = false;
                for ps in state.pure_states() {
                    if !self.is_controlled(ps.index) {
                        new_state.add_pure_state(ps);
                        continue;
                    }
                    if ps.bit(target) != from_one || state.contains(ps.flip(target).index) {
                        return Err(OperatorError::OccupiedSibling { index: ps.index });
                    }
                    // Even split, signed so that `Ry(π/2)` merges the pair back.
                    let half = ps.amplitude * FRAC_1_SQRT_2;
                    let sibling = if from_one { half } else { -half };
                    new_state.add_pure_state(PureState::new(ps.set0(target).index, half));
                    new_state.add_pure_state(PureState::new(ps.set1(target).index, sibling));
                    any = true;
                }
                if !any {
                    return Err(OperatorError::NothingControlled);
                }
                Gate::mcry(FRAC_PI_2, self.controls.clone(), target)
            }
        };
        Ok((new_state, gate))
    }
}

/// Rotation merging the amplitudes of a sibling pair into one label.
///
/// `a_neg` and `a_pos` are the amplitudes of the labels with the target
/// qubit at 0 and 1, `to_one` selects the label that keeps the weight.
/// Returns `(θ, r)` with `θ ∈ [0, 2π)` such that `Ry(θ)` maps `r` on the kept
/// label back onto the pair. The sign of `r` absorbs the sign that would
/// otherwise push `θ` out of range.
pub fn merge_rotation(a_neg: f64, a_pos: f64, to_one: bool) -> (f64, f64) {
    let (x, y) = match to_one {
        false => (a_neg, a_pos),
        true => (a_pos, -a_neg),
    };
    let norm = x.hypot(y);
    let mut half = y.atan2(x);
    let mut merged = norm;
    if half < 0.0 {
        half += PI;
        merged = -merged;
    }
    if half >= PI {
        half -= PI;
        merged = -merged;
    }
    (2.0 * half, merged)
}

/// Errors raised when applying a [`McryOperator`] to a state.
#[derive(Debug, Display, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OperatorError {
    /// A controlled label has no sibling to merge with.
    #[display("Label {index} has no sibling to merge with")]
    MissingSibling {
        /// The controlled label.
        index: usize,
    },
    /// A controlled label cannot be split.
    #[display("Label {index} cannot be split: its sibling is occupied")]
    OccupiedSibling {
        /// The controlled label.
        index: usize,
    },
    /// The controlled pairs need different rotation angles.
    #[display("The merged pairs on qubit {target} need different rotation angles")]
    AmbiguousRotation {
        /// The target qubit.
        target: usize,
    },
    /// No label satisfies the controls.
    #[display("No label satisfies the controls")]
    NothingControlled,
}
