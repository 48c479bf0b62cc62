//! Constant-velocity Kalman filter over `(x, y, a, h)` boxes.
//!
//! The 8-dimensional state is the box center `(x, y)`, aspect ratio `a`,
//! height `h` and their respective velocities. Noise is scaled by the box
//! height so that large (close) vehicles tolerate larger absolute jitter.

use crate::bbox::{BBox, Xyah};
use nalgebra as na;

pub type StateVector = na::SVector<f32, 8>;
pub type StateCovariance = na::SMatrix<f32, 8, 8>;

const STD_WEIGHT_POSITION: f32 = 1. / 20.;
const STD_WEIGHT_VELOCITY: f32 = 1. / 160.;

/// Motion estimate owned by a single track.
#[derive(Debug, Clone)]
pub struct MotionState {
    pub mean: StateVector,
    pub covariance: StateCovariance,
}

impl MotionState {
    #[inline]
    pub fn bbox(&self) -> BBox<Xyah> {
        BBox::xyah(self.mean[0], self.mean[1], self.mean[2], self.mean[3])
    }

    /// Estimated center displacement per frame.
    #[inline]
    pub fn velocity(&self) -> (f32, f32) {
        (self.mean[4], self.mean[5])
    }
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion: StateCovariance,
    update: na::SMatrix<f32, 4, 8>,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion = StateCovariance::identity();
        for i in 0..4 {
            motion[(i, i + 4)] = 1.0;
        }

        let mut update = na::SMatrix::<f32, 4, 8>::zeros();
        for i in 0..4 {
            update[(i, i)] = 1.0;
        }

        Self { motion, update }
    }

    /// Creates a track state from an unassociated measurement.
    pub fn initiate(&self, bbox: &BBox<Xyah>) -> MotionState {
        let h = bbox.height();
        let mut mean = StateVector::zeros();
        for (i, v) in bbox.as_slice().iter().enumerate() {
            mean[i] = *v;
        }

        let std = [
            2. * STD_WEIGHT_POSITION * h,
            2. * STD_WEIGHT_POSITION * h,
            1e-2,
            2. * STD_WEIGHT_POSITION * h,
            10. * STD_WEIGHT_VELOCITY * h,
            10. * STD_WEIGHT_VELOCITY * h,
            1e-5,
            10. * STD_WEIGHT_VELOCITY * h,
        ];

        MotionState {
            mean,
            covariance: StateCovariance::from_diagonal(&StateVector::from_column_slice(
                &std.map(|s| s * s),
            )),
        }
    }

    /// Advances the state by one frame and returns the predicted box.
    pub fn predict(&self, state: &mut MotionState) -> BBox<Xyah> {
        let h = state.mean[3];
        let std = [
            STD_WEIGHT_POSITION * h,
            STD_WEIGHT_POSITION * h,
            1e-2,
            STD_WEIGHT_POSITION * h,
            STD_WEIGHT_VELOCITY * h,
            STD_WEIGHT_VELOCITY * h,
            1e-5,
            STD_WEIGHT_VELOCITY * h,
        ];
        let motion_cov =
            StateCovariance::from_diagonal(&StateVector::from_column_slice(&std.map(|s| s * s)));

        state.mean = self.motion * state.mean;
        state.covariance = self.motion * state.covariance * self.motion.transpose() + motion_cov;

        state.bbox()
    }

    fn project(&self, state: &MotionState) -> (na::Vector4<f32>, na::Matrix4<f32>) {
        let h = state.mean[3];
        let std = na::Vector4::new(
            STD_WEIGHT_POSITION * h,
            STD_WEIGHT_POSITION * h,
            1e-1,
            STD_WEIGHT_POSITION * h,
        );
        let innovation_cov = na::Matrix4::from_diagonal(&std.component_mul(&std));

        let mean = self.update * state.mean;
        let covariance = self.update * state.covariance * self.update.transpose() + innovation_cov;

        (mean, covariance)
    }

    /// Blends an observed box into the state estimate.
    pub fn correct(&self, state: &mut MotionState, observed: &BBox<Xyah>) {
        let (projected_mean, projected_cov) = self.project(state);
        let measurement = na::Vector4::from_column_slice(observed.as_slice());

        let chol = match projected_cov.cholesky() {
            Some(chol) => chol,
            None => {
                // innovation covariance lost positive-definiteness, restart from the observation
                log::warn!("kalman: innovation covariance is not positive definite, reinitiating");
                *state = self.initiate(observed);
                return;
            }
        };

        let gain = chol.solve(&(self.update * state.covariance)).transpose();
        let innovation = measurement - projected_mean;

        state.mean += gain * innovation;

        let covariance = state.covariance - gain * projected_cov * gain.transpose();
        state.covariance = (covariance + covariance.transpose()) * 0.5;
    }
}
