//! Static description of robot and mechanism axes.

/// Rotary axes are measured in radians, linear ones in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    Revolute,
    Prismatic,
}

/// One axis of an arm or external mechanism. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    /// DH link length along the common normal (mm). Not used by external mechanisms.
    pub a: f64,

    /// DH link offset along the previous Z axis (mm). Not used by external mechanisms.
    pub d: f64,

    /// Permitted range, min and max, in the solver joint space.
    pub range: (f64, f64),

    /// Maximal speed, radians or millimeters per second.
    pub max_speed: f64,

    pub kind: JointKind,
}

impl Joint {
    pub fn revolute(a: f64, d: f64, range: (f64, f64), max_speed: f64) -> Self {
        Joint {
            a,
            d,
            range,
            max_speed,
            kind: JointKind::Revolute,
        }
    }

    pub fn prismatic(range: (f64, f64), max_speed: f64) -> Self {
        Joint {
            a: 0.0,
            d: 0.0,
            range,
            max_speed,
            kind: JointKind::Prismatic,
        }
    }

    /// Revolute joint with range and speed given in degrees.
    pub fn revolute_deg(a: f64, d: f64, from: f64, to: f64, max_speed: f64) -> Self {
        Joint::revolute(a, d, (from.to_radians(), to.to_radians()), max_speed.to_radians())
    }

    pub fn is_in_range(&self, value: f64) -> bool {
        let tolerance = match self.kind {
            JointKind::Revolute => 1e-9,
            JointKind::Prismatic => 1e-6,
        };
        value >= self.range.0 - tolerance && value <= self.range.1 + tolerance
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.range.0).min(self.range.1)
    }

    pub fn is_prismatic(&self) -> bool {
        self.kind == JointKind::Prismatic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_and_clamp() {
        let joint = Joint::revolute_deg(0.0, 0.0, -90.0, 90.0, 180.0);
        assert!(joint.is_in_range(1.0));
        assert!(!joint.is_in_range(2.0));
        assert!((joint.clamp(2.0) - 90f64.to_radians()).abs() < 1e-12);
        assert!((joint.max_speed - std::f64::consts::PI).abs() < 1e-12);

        let track = Joint::prismatic((0.0, 4000.0), 1000.0);
        assert!(track.is_prismatic());
        assert_eq!(track.clamp(-5.0), 0.0);
    }
}
