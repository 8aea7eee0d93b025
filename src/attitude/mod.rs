//! Orientation math shared by the filter models: unit quaternions and
//! roll/pitch/yaw Euler angles.

mod euler;
mod quaternion;

pub use euler::Euler;
pub use quaternion::Quaternion;
