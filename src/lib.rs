//! Attitude estimation core for motor controller and IMU firmware.
//!
//! - [`ukf`]: fixed-size Unscented Kalman Filter, models are passed in per step
//! - [`attitude`]: quaternion and roll/pitch/yaw math used by those models
//! - [`math`]: angle wrapping and unit conversion
//! - [`fields`]: named scalar fields for telemetry
//!
//! Nothing in here allocates or blocks, every call runs in time fixed by the
//! state and measurement dimensions.
//!
//! # Features
//! - `std`: link the standard library (host tools, simulation)
//! - Default: `no_std`, float math through `libm`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unused_must_use)]

pub mod attitude;
pub mod fields;
pub mod math;
pub mod ukf;

pub use attitude::{Euler, Quaternion};
pub use fields::{FieldVisitor, FieldVisitorMut, Fields};
pub use ukf::{FilterError, SigmaPoints, UkfFilter};
