use crate::math::{degrees, radians, wrap_neg_pi_to_pi};

/// Roll, pitch and yaw, applied in that order.
///
///  +roll -> right side down
///  +pitch -> forward edge up
///  +yaw -> clockwise looking down
///
/// Units are whatever the producer says; [`Quaternion`](super::Quaternion)
/// always works in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Euler {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Euler {
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn to_degrees(self) -> Self {
        Self {
            roll: degrees(self.roll),
            pitch: degrees(self.pitch),
            yaw: degrees(self.yaw),
        }
    }

    pub fn from_degrees(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            roll: radians(roll),
            pitch: radians(pitch),
            yaw: radians(yaw),
        }
    }

    /// Every angle wrapped into (-PI, PI]
    pub fn wrapped(self) -> Self {
        Self {
            roll: wrap_neg_pi_to_pi(self.roll),
            pitch: wrap_neg_pi_to_pi(self.pitch),
            yaw: wrap_neg_pi_to_pi(self.yaw),
        }
    }
}
