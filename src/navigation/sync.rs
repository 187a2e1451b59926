//! Synchronization of inertial propagation with late GNSS information.
//!
//! Both wrappers keep a ring of per-step snapshots. [BackPropagation]
//! re-applies each correction to the state that actually observed it;
//! [DelayedUpdate] evaluates a late measurement at a past state and rolls
//! its observation matrix forward to the present.

use std::collections::VecDeque;

use nalgebra::{DMatrix, Vector3};

use crate::{
    cfg::DelayMode,
    error::Error,
    navigation::{
        ins::InertialState,
        tightly::{GnssObservation, TightlyCoupled},
        CorrectInfo,
    },
    space_node::SpaceNode,
};

/// A snapshot is considered settled once this much time passed since the
/// last correction; older ones beyond the configured depth are dropped.
const PRUNE_MIN_ELAPSED_S: f64 = 0.1;

/// Tolerance when matching a delayed measurement against the ring [s].
const SNAPSHOT_MATCH_TOLERANCE_S: f64 = 0.005;

struct PropagatedSnapshot<I: InertialState> {
    engine: TightlyCoupled<I>,
    phi: DMatrix<f64>,
    gqgt: DMatrix<f64>,
    /// Cumulated seconds since the last measurement update.
    elapsed_from_last_correct: f64,
}

/// Applies every correction back at the snapshot that observed it, then
/// keeps the corrected snapshot for smoothed output.
pub struct BackPropagation<I: InertialState> {
    engine: TightlyCoupled<I>,
    snapshots: VecDeque<PropagatedSnapshot<I>>,
    /// How far corrected states reach back [s]; zero keeps only the last
    /// snapshot, negative values reach deeper.
    depth_s: f64,
}

impl<I: InertialState> BackPropagation<I> {
    pub fn new(engine: TightlyCoupled<I>) -> Self {
        let depth_s = engine.cfg().back_propagate_depth_s;
        Self {
            engine,
            snapshots: VecDeque::new(),
            depth_s,
        }
    }

    pub fn engine(&self) -> &TightlyCoupled<I> {
        &self.engine
    }

    /// The most recent back-propagated state, once any correction
    /// happened.
    pub fn latest_smoothed(&self) -> Option<&TightlyCoupled<I>> {
        self.snapshots.back().map(|snapshot| &snapshot.engine)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Time update; the pre-update state is pushed onto the ring.
    pub fn propagate(&mut self, accel: &Vector3<f64>, gyro: &Vector3<f64>, delta_t: f64) {
        let before = self.engine.clone();
        let step = self.engine.propagate(accel, gyro, delta_t);

        let elapsed = delta_t
            + self
                .snapshots
                .back()
                .map(|snapshot| snapshot.elapsed_from_last_correct)
                .unwrap_or(0.0);

        self.snapshots.push_back(PropagatedSnapshot {
            engine: before,
            phi: step.phi,
            gqgt: step.gqgt,
            elapsed_from_last_correct: elapsed,
        });
    }

    /// Measurement update: corrects the present state, then re-applies
    /// the correction to the most recent snapshot through its stored
    /// transition.
    pub fn correct(&mut self, space: &SpaceNode, obs: &GnssObservation) -> Result<(), Error> {
        let (info, shift) = TightlyCoupled::clock_jump_checked_info(&self.engine, space, obs)?;
        if shift != 0.0 {
            self.engine.state_mut().clock_mut(obs.clock_index).bias_m += shift;
            for snapshot in &mut self.snapshots {
                snapshot.engine.state_mut().clock_mut(obs.clock_index).bias_m += shift;
            }
        }

        self.back_propagate(&info)?;
        self.engine.apply(&info)
    }

    fn back_propagate(&mut self, info: &CorrectInfo) -> Result<(), Error> {
        if self.snapshots.is_empty() {
            return Ok(());
        }

        let elapsed_latest = self
            .snapshots
            .back()
            .map(|snapshot| snapshot.elapsed_from_last_correct)
            .unwrap_or(0.0);
        if elapsed_latest > 0.0 {
            // Re-reference elapsed counters to this correction and drop
            // snapshots older than the configured depth.
            let mut index = self.snapshots.len();
            while index > 0 {
                index -= 1;
                if self.snapshots[index].elapsed_from_last_correct < self.depth_s {
                    if elapsed_latest > PRUNE_MIN_ELAPSED_S {
                        self.snapshots.drain(..=index);
                        if self.snapshots.is_empty() {
                            return Ok(());
                        }
                    }
                    break;
                }
                // negative afterwards: already back-propagated
                self.snapshots[index].elapsed_from_last_correct -= elapsed_latest;
            }
        }

        let mut previous = match self.snapshots.pop_back() {
            Some(snapshot) => snapshot,
            None => return Ok(()),
        };

        let h_dash = &info.h * &previous.phi;
        let r_dash = &info.r + &info.h * &previous.gqgt * info.h.transpose();
        previous.engine.apply(&CorrectInfo {
            h: h_dash,
            z: info.z.clone(),
            r: r_dash,
        })?;

        self.snapshots.push_back(previous);
        Ok(())
    }
}

struct InvertedSnapshot<I: InertialState> {
    engine: TightlyCoupled<I>,
    a: DMatrix<f64>,
    phi_inv: DMatrix<f64>,
    gqgt: DMatrix<f64>,
    /// Seconds covered by this single step.
    elapsed_from_last_update: f64,
}

/// Applies measurements that arrive late, in real time: the payload is
/// evaluated at the snapshot closest to the measurement epoch and rolled
/// forward through the stored transitions.
pub struct DelayedUpdate<I: InertialState> {
    engine: TightlyCoupled<I>,
    snapshots: VecDeque<InvertedSnapshot<I>>,
    mode: DelayMode,
}

impl<I: InertialState> DelayedUpdate<I> {
    pub fn new(engine: TightlyCoupled<I>) -> Self {
        let mode = engine.cfg().delay_mode;
        Self {
            engine,
            snapshots: VecDeque::new(),
            mode,
        }
    }

    pub fn engine(&self) -> &TightlyCoupled<I> {
        &self.engine
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Time update; the pre-update state and the inverted transition are
    /// pushed onto the ring. Surfaces [Error::MatrixInversion] if the
    /// transition cannot be inverted, which only happens on broken
    /// dynamics since Phi = I + A dt stays near identity.
    pub fn propagate(
        &mut self,
        accel: &Vector3<f64>,
        gyro: &Vector3<f64>,
        delta_t: f64,
    ) -> Result<(), Error> {
        let before = self.engine.clone();
        let step = self.engine.propagate(accel, gyro, delta_t);

        let phi_inv = step
            .phi
            .clone()
            .try_inverse()
            .ok_or(Error::MatrixInversion)?;

        self.snapshots.push_back(InvertedSnapshot {
            engine: before,
            a: step.a,
            phi_inv,
            gqgt: step.gqgt,
            elapsed_from_last_update: step.delta_t,
        });
        Ok(())
    }

    /// Drops snapshots older than a measurement `advance_t` seconds in
    /// the past (negative). The remaining front snapshot becomes the
    /// reference. Returns false when the measurement is from the future
    /// or older than the whole ring.
    pub fn setup_correct(&mut self, advance_t: f64) -> bool {
        if advance_t > 0.0 {
            // positive value (future) is odd
            return false;
        }

        let mut advance_t = advance_t;
        let mut index = self.snapshots.len();
        while index > 0 {
            index -= 1;
            advance_t += self.snapshots[index].elapsed_from_last_update;
            if advance_t > -SNAPSHOT_MATCH_TOLERANCE_S {
                // the first snapshot whose cumulated span covers the
                // delay is kept as the reference
                self.snapshots.drain(..index);
                return true;
            }
        }

        false // too old
    }

    /// Measurement update of an epoch `advance_t` seconds in the past
    /// (non-positive). The payload is evaluated at the reference snapshot
    /// and rolled forward per the configured [DelayMode].
    pub fn correct(
        &mut self,
        space: &SpaceNode,
        obs: &GnssObservation,
        advance_t: f64,
    ) -> Result<(), Error> {
        if !self.setup_correct(advance_t) {
            return Err(Error::DelayedMeasurementTooOld);
        }

        let Some(reference) = self.snapshots.front() else {
            return Err(Error::DelayedMeasurementTooOld);
        };
        let (info, shift) = TightlyCoupled::clock_jump_checked_info(&reference.engine, space, obs)?;
        if shift != 0.0 {
            for snapshot in &mut self.snapshots {
                snapshot.engine.state_mut().clock_mut(obs.clock_index).bias_m += shift;
            }
            self.engine.state_mut().clock_mut(obs.clock_index).bias_m += shift;
        }

        let info = self.roll_forward(info);
        self.engine.apply(&info)
    }

    fn roll_forward(&self, info: CorrectInfo) -> CorrectInfo {
        let CorrectInfo { mut h, z, mut r } = info;

        match self.mode {
            DelayMode::Normal => {
                for snapshot in &self.snapshots {
                    h = &h * &snapshot.phi_inv;
                    r += &h * &snapshot.gqgt * h.transpose();
                }
            }
            DelayMode::LightWeight => {
                if !self.snapshots.is_empty() {
                    let n = self.snapshots.len();
                    let columns = h.ncols();
                    let mut sum_a = DMatrix::zeros(columns, columns);
                    let mut sum_gqgt = DMatrix::zeros(columns, columns);
                    let mut mean_delta_t = 0.0;
                    for snapshot in &self.snapshots {
                        sum_a += &snapshot.a;
                        sum_gqgt += &snapshot.gqgt;
                        mean_delta_t += snapshot.elapsed_from_last_update;
                    }
                    mean_delta_t /= n as f64;

                    let sum_a_gqgt = &sum_a * &sum_gqgt;
                    let weighted = (&sum_a_gqgt + sum_a_gqgt.transpose())
                        * (mean_delta_t * (n as f64 - 1.0) / (2.0 * n as f64));
                    r += &h * (sum_gqgt - weighted) * h.transpose();
                    h = &h * (DMatrix::identity(columns, columns) - sum_a * mean_delta_t);
                }
            }
        }

        CorrectInfo { h, z, r }
    }
}
