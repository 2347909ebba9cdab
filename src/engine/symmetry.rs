//! Global rotations a template may be matched under.
//!
//! Templates were authored by two tools that disagree on the sign of a quarter
//! turn, and the template does not record which one produced it. Every global
//! angle is therefore tried under both conventions.

use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::engine::models::{Cell, Rotation};

/// Sign convention for mapping an angle to a coordinate rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationConvention {
    /// Mathematical convention: 90° maps (x, y) to (y, -x).
    CounterClockwisePositive,
    /// Screen convention: 90° maps (x, y) to (-y, x).
    ClockwisePositive,
}

impl RotationConvention {
    pub const ALL: [RotationConvention; 2] = [
        RotationConvention::CounterClockwisePositive,
        RotationConvention::ClockwisePositive,
    ];

    /// Rotate a relative position by a quarter-turn angle.
    pub fn rotate(self, v: Cell, angle: Rotation) -> Option<Cell> {
        match self {
            RotationConvention::CounterClockwisePositive => rotate_counter_clockwise_positive(v, angle),
            RotationConvention::ClockwisePositive => rotate_clockwise_positive(v, angle),
        }
    }

    /// Spin a tile must show once its template cell has been carried along
    /// by a global rotation of `angle`.
    pub fn carry_spin(self, base: Rotation, angle: Rotation) -> Rotation {
        match self {
            RotationConvention::CounterClockwisePositive => base + angle,
            RotationConvention::ClockwisePositive => base - angle,
        }
    }
}

impl fmt::Display for RotationConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationConvention::CounterClockwisePositive => f.write_str("ccw+"),
            RotationConvention::ClockwisePositive => f.write_str("cw+"),
        }
    }
}

/// `None` when a coordinate is `i32::MIN` and has to be negated.
pub fn rotate_counter_clockwise_positive(v: Cell, angle: Rotation) -> Option<Cell> {
    let rotated = match angle {
        Rotation::R0 => v,
        Rotation::R90 => Cell::new(v.y, v.x.checked_neg()?),
        Rotation::R180 => Cell::new(v.x.checked_neg()?, v.y.checked_neg()?),
        Rotation::R270 => Cell::new(v.y.checked_neg()?, v.x),
    };
    Some(rotated)
}

pub fn rotate_clockwise_positive(v: Cell, angle: Rotation) -> Option<Cell> {
    let rotated = match angle {
        Rotation::R0 => v,
        Rotation::R90 => Cell::new(v.y.checked_neg()?, v.x),
        Rotation::R180 => Cell::new(v.x.checked_neg()?, v.y.checked_neg()?),
        Rotation::R270 => Cell::new(v.y, v.x.checked_neg()?),
    };
    Some(rotated)
}

/// One candidate: a global angle under one convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Transform {
    pub angle: Rotation,
    pub convention: RotationConvention,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        angle: Rotation::R0,
        convention: RotationConvention::CounterClockwisePositive,
    };

    pub fn apply(self, v: Cell) -> Option<Cell> {
        self.convention.rotate(v, self.angle)
    }

    pub fn spin(self, base: Rotation) -> Rotation {
        self.convention.carry_spin(base, self.angle)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.angle, self.convention)
    }
}

/// Every candidate in trial order: angle ascending, then counter-clockwise
/// positive before clockwise positive.
static ALL_TRANSFORMS: Lazy<Vec<Transform>> = Lazy::new(|| {
    Rotation::ALL
        .iter()
        .flat_map(|&angle| {
            RotationConvention::ALL
                .iter()
                .map(move |&convention| Transform { angle, convention })
        })
        .collect()
});

/// Candidate transforms for a template: 8 with global rotation, else the two
/// 0° entries.
pub fn candidate_transforms(allow_global_rotation: bool) -> &'static [Transform] {
    if allow_global_rotation {
        &ALL_TRANSFORMS
    } else {
        &ALL_TRANSFORMS[..RotationConvention::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_counts() {
        assert_eq!(candidate_transforms(false).len(), 2);
        assert_eq!(candidate_transforms(true).len(), 8);
    }

    #[test]
    fn test_candidate_order() {
        let all = candidate_transforms(true);
        assert_eq!(all[0], Transform::IDENTITY);
        assert_eq!(all[1].angle, Rotation::R0);
        assert_eq!(all[1].convention, RotationConvention::ClockwisePositive);
        assert_eq!(all[2].angle, Rotation::R90);
        assert_eq!(all[2].convention, RotationConvention::CounterClockwisePositive);
        assert_eq!(all[7].angle, Rotation::R270);
        assert_eq!(all[7].convention, RotationConvention::ClockwisePositive);

        for t in candidate_transforms(false) {
            assert_eq!(t.angle, Rotation::R0);
        }
    }

    #[test]
    fn test_counter_clockwise_positive_table() {
        let v = Cell::new(2, 1);
        assert_eq!(rotate_counter_clockwise_positive(v, Rotation::R0), Some(Cell::new(2, 1)));
        assert_eq!(rotate_counter_clockwise_positive(v, Rotation::R90), Some(Cell::new(1, -2)));
        assert_eq!(rotate_counter_clockwise_positive(v, Rotation::R180), Some(Cell::new(-2, -1)));
        assert_eq!(rotate_counter_clockwise_positive(v, Rotation::R270), Some(Cell::new(-1, 2)));
    }

    #[test]
    fn test_clockwise_positive_table() {
        let v = Cell::new(2, 1);
        assert_eq!(rotate_clockwise_positive(v, Rotation::R0), Some(Cell::new(2, 1)));
        assert_eq!(rotate_clockwise_positive(v, Rotation::R90), Some(Cell::new(-1, 2)));
        assert_eq!(rotate_clockwise_positive(v, Rotation::R180), Some(Cell::new(-2, -1)));
        assert_eq!(rotate_clockwise_positive(v, Rotation::R270), Some(Cell::new(1, -2)));
    }

    #[test]
    fn test_conventions_are_inverse() {
        let v = Cell::new(3, -5);
        for angle in Rotation::ALL {
            let there = rotate_counter_clockwise_positive(v, angle).unwrap();
            assert_eq!(rotate_clockwise_positive(there, angle), Some(v));
        }
    }

    #[test]
    fn test_four_quarter_turns_return_home() {
        for convention in RotationConvention::ALL {
            let mut v = Cell::new(4, 7);
            for _ in 0..4 {
                v = convention.rotate(v, Rotation::R90).unwrap();
            }
            assert_eq!(v, Cell::new(4, 7));
        }
    }

    #[test]
    fn test_rotation_refuses_to_negate_min() {
        let edge = Cell::new(i32::MIN, 3);
        for convention in RotationConvention::ALL {
            assert_eq!(convention.rotate(edge, Rotation::R0), Some(edge));
            assert_eq!(convention.rotate(edge, Rotation::R180), None);
        }
        assert_eq!(rotate_counter_clockwise_positive(edge, Rotation::R90), None);
        assert_eq!(rotate_counter_clockwise_positive(edge, Rotation::R270), Some(Cell::new(-3, i32::MIN)));
        assert_eq!(rotate_clockwise_positive(edge, Rotation::R90), Some(Cell::new(-3, i32::MIN)));
        assert_eq!(rotate_clockwise_positive(edge, Rotation::R270), None);
        assert_eq!(
            rotate_counter_clockwise_positive(Cell::new(i32::MAX, 0), Rotation::R180),
            Some(Cell::new(-i32::MAX, 0))
        );
    }

    #[test]
    fn test_carry_spin_direction() {
        let ccw = RotationConvention::CounterClockwisePositive;
        let cw = RotationConvention::ClockwisePositive;
        assert_eq!(ccw.carry_spin(Rotation::R90, Rotation::R90), Rotation::R180);
        assert_eq!(cw.carry_spin(Rotation::R90, Rotation::R90), Rotation::R0);
        assert_eq!(cw.carry_spin(Rotation::R0, Rotation::R90), Rotation::R270);
    }
}
