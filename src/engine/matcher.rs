//! Decide whether a placement snapshot reproduces a template.
//!
//! Both sides are anchored to the top-left and sorted by (row, column); the
//! template is tried under every candidate transform and the first one whose
//! cells all agree with the placed tiles wins. The report carries enough
//! detail to explain a miss.

use std::fmt;

use serde::Serialize;

use crate::engine::models::{min_corner, Cell, FaceRequirement, PlacedTile, PlacementSnapshot, Rotation};
use crate::engine::symmetry::{candidate_transforms, Transform};
use crate::engine::template::{MatchRules, Template};

/// A template cell after a transform has been applied and the shape re-anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedCell {
    pub position: Cell,
    pub rotation: Rotation,
    pub face: FaceRequirement,
}

/// The first check that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    EmptyTemplate,
    /// Anchoring or rotating a shape took a coordinate outside the `i32` range.
    OutOfRange,
    TileCount {
        expected: usize,
        placed: usize,
    },
    Position {
        index: usize,
        expected: Cell,
        placed: Cell,
    },
    Rotation {
        index: usize,
        cell: Cell,
        expected: Rotation,
        placed: Rotation,
    },
    Face {
        index: usize,
        cell: Cell,
        expected: FaceRequirement,
        placed: FaceRequirement,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::EmptyTemplate => write!(f, "template has no cells"),
            Mismatch::OutOfRange => write!(f, "coordinates out of range"),
            Mismatch::TileCount { expected, placed } => {
                write!(f, "expected {expected} tiles, {placed} placed")
            }
            Mismatch::Position { index, expected, placed } => {
                write!(f, "cell #{index}: expected position {expected}, got {placed}")
            }
            Mismatch::Rotation { index, cell, expected, placed } => {
                write!(f, "cell #{index} at {cell}: expected rotation {expected}, got {placed}")
            }
            Mismatch::Face { index, cell, expected, placed } => {
                write!(f, "cell #{index} at {cell}: expected face {expected}, got {placed}")
            }
        }
    }
}

/// One transform tried against the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub transform: Transform,
    pub expected: Vec<ExpectedCell>,
    /// Cells that passed every check before the first mismatch.
    pub cells_matched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub matched: bool,
    pub candidates_tried: usize,
    /// The snapshot in anchored canonical form.
    pub placed: Vec<PlacedTile>,
    /// The winning attempt on a match, otherwise the one that got furthest.
    pub attempt: Option<Attempt>,
    pub mismatch: Option<Mismatch>,
}

impl MatchReport {
    fn rejected(placed: Vec<PlacedTile>, mismatch: Mismatch) -> Self {
        Self {
            matched: false,
            candidates_tried: 0,
            placed,
            attempt: None,
            mismatch: Some(mismatch),
        }
    }

    /// The transform that explained the placement, if any.
    pub fn transform(&self) -> Option<Transform> {
        if self.matched {
            self.attempt.as_ref().map(|a| a.transform)
        } else {
            None
        }
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.attempt, &self.mismatch) {
            (Some(a), _) if self.matched => write!(f, "matched under {}", a.transform),
            (Some(a), Some(m)) => write!(
                f,
                "no match after {} candidates; best was {} ({}/{} cells): {}",
                self.candidates_tried,
                a.transform,
                a.cells_matched,
                a.expected.len(),
                m
            ),
            (_, Some(m)) => write!(f, "no match: {m}"),
            _ => write!(f, "no match"),
        }
    }
}

/// Template cells carried through `transform`, re-anchored and canonically sorted.
///
/// `None` if a coordinate leaves the `i32` range on the way.
pub fn expected_cells(template: &Template, transform: Transform) -> Option<Vec<ExpectedCell>> {
    let moved: Vec<Cell> = template
        .cells
        .iter()
        .map(|c| transform.apply(c.position))
        .collect::<Option<_>>()?;
    let origin = min_corner(moved.iter().copied()).unwrap_or_default();

    let mut expected: Vec<ExpectedCell> = template
        .cells
        .iter()
        .zip(moved)
        .map(|(c, pos)| {
            Some(ExpectedCell {
                position: pos.relative_to(origin)?,
                rotation: transform.spin(c.rotation),
                face: c.face,
            })
        })
        .collect::<Option<_>>()?;
    expected.sort_by_key(|e| e.position);
    Some(expected)
}

fn rotation_accepted(rules: &MatchRules, expected: &ExpectedCell, placed: Rotation) -> bool {
    if !rules.require_rotation {
        return true;
    }
    if rules.ignore_rotation_on_face_a && expected.face == FaceRequirement::NeedsFaceA {
        return true;
    }
    placed == expected.rotation || (rules.accept_half_turn && placed == expected.rotation.half_turn())
}

/// Compare cell by cell. On failure returns how many cells passed and why
/// the next one did not.
pub(crate) fn compare(
    placed: &[PlacedTile],
    expected: &[ExpectedCell],
    rules: &MatchRules,
) -> Result<(), (usize, Mismatch)> {
    for (index, (got, exp)) in placed.iter().zip(expected).enumerate() {
        if got.cell != exp.position {
            return Err((
                index,
                Mismatch::Position {
                    index,
                    expected: exp.position,
                    placed: got.cell,
                },
            ));
        }
        if !rotation_accepted(rules, exp, got.rotation) {
            return Err((
                index,
                Mismatch::Rotation {
                    index,
                    cell: got.cell,
                    expected: exp.rotation,
                    placed: got.rotation,
                },
            ));
        }
        if !exp.face.accepts(got.face) {
            return Err((
                index,
                Mismatch::Face {
                    index,
                    cell: got.cell,
                    expected: exp.face,
                    placed: got.face,
                },
            ));
        }
    }
    Ok(())
}

/// Test a snapshot against a template under every permitted symmetry.
pub fn match_snapshot(snapshot: &PlacementSnapshot, template: &Template) -> MatchReport {
    let Some(placed) = snapshot.anchored() else {
        return MatchReport::rejected(Vec::new(), Mismatch::OutOfRange);
    };

    if !template.is_playable() {
        return MatchReport::rejected(placed, Mismatch::EmptyTemplate);
    }
    if placed.len() != template.required_tiles() {
        let mismatch = Mismatch::TileCount {
            expected: template.required_tiles(),
            placed: placed.len(),
        };
        return MatchReport::rejected(placed, mismatch);
    }

    let rules = &template.rules;
    let mut best: Option<(Attempt, Mismatch)> = None;
    let mut tried = 0;

    for &transform in candidate_transforms(rules.allow_global_rotation) {
        tried += 1;
        let Some(expected) = expected_cells(template, transform) else {
            if best.is_none() {
                let attempt = Attempt {
                    transform,
                    expected: Vec::new(),
                    cells_matched: 0,
                };
                best = Some((attempt, Mismatch::OutOfRange));
            }
            continue;
        };
        match compare(&placed, &expected, rules) {
            Ok(()) => {
                let cells_matched = expected.len();
                return MatchReport {
                    matched: true,
                    candidates_tried: tried,
                    placed,
                    attempt: Some(Attempt {
                        transform,
                        expected,
                        cells_matched,
                    }),
                    mismatch: None,
                };
            }
            Err((cells_matched, mismatch)) => {
                let further = best
                    .as_ref()
                    .map_or(true, |(b, _)| cells_matched >= b.cells_matched);
                if further {
                    best = Some((
                        Attempt {
                            transform,
                            expected,
                            cells_matched,
                        },
                        mismatch,
                    ));
                }
            }
        }
    }

    let (attempt, mismatch) = match best {
        Some((a, m)) => (Some(a), Some(m)),
        None => (None, None),
    };
    MatchReport {
        matched: false,
        candidates_tried: tried,
        placed,
        attempt,
        mismatch,
    }
}

/// Shorthand for callers that only need the verdict.
pub fn matches(snapshot: &PlacementSnapshot, template: &Template) -> bool {
    match_snapshot(snapshot, template).matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::symmetry::RotationConvention;
    use crate::engine::template::TemplateCell;

    fn square(rules: MatchRules) -> Template {
        Template::new(
            "square",
            vec![
                TemplateCell::at(0, 0),
                TemplateCell::at(1, 0),
                TemplateCell::at(0, 1),
                TemplateCell::at(1, 1),
            ],
        )
        .with_rules(rules)
    }

    fn ell() -> Template {
        // X .
        // X .
        // X X   with distinct spins so rotations are observable
        Template::new(
            "ell",
            vec![
                TemplateCell::new(Cell::new(0, 0), Rotation::R0, FaceRequirement::None),
                TemplateCell::new(Cell::new(0, 1), Rotation::R90, FaceRequirement::None),
                TemplateCell::new(Cell::new(0, 2), Rotation::R180, FaceRequirement::NeedsFaceB),
                TemplateCell::new(Cell::new(1, 2), Rotation::R270, FaceRequirement::NeedsFaceA),
            ],
        )
    }

    fn snap(tiles: &[(i32, i32, i32, FaceRequirement)]) -> PlacementSnapshot {
        tiles
            .iter()
            .map(|&(x, y, r, f)| PlacedTile::new(Cell::new(x, y), Rotation::from_degrees(r), f))
            .collect()
    }

    fn plain(cells: &[(i32, i32, i32)]) -> PlacementSnapshot {
        cells
            .iter()
            .map(|&(x, y, r)| PlacedTile::new(Cell::new(x, y), Rotation::from_degrees(r), FaceRequirement::None))
            .collect()
    }

    #[test]
    fn test_exact_square_matches_identity() {
        let report = match_snapshot(&plain(&[(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)]), &square(MatchRules::default()));
        assert!(report.matched);
        assert_eq!(report.transform(), Some(Transform::IDENTITY));
        assert_eq!(report.candidates_tried, 1);
        assert!(report.mismatch.is_none());
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let report = match_snapshot(&plain(&[(0, 0, 0), (1, 0, 0)]), &square(MatchRules::default()));
        assert!(!report.matched);
        assert_eq!(report.candidates_tried, 0);
        assert_eq!(report.mismatch, Some(Mismatch::TileCount { expected: 4, placed: 2 }));
    }

    #[test]
    fn test_empty_template_never_matches() {
        let t = Template::new("blank", vec![]);
        let report = match_snapshot(&PlacementSnapshot::new(), &t);
        assert!(!report.matched);
        assert_eq!(report.mismatch, Some(Mismatch::EmptyTemplate));
    }

    #[test]
    fn test_expected_cells_reanchor_after_rotation() {
        let t = ell();
        let transform = Transform {
            angle: Rotation::R90,
            convention: RotationConvention::CounterClockwisePositive,
        };
        // (x, y) -> (y, -x): (0,0)->(0,0) (0,1)->(1,0) (0,2)->(2,0) (1,2)->(2,-1)
        // anchored by min (0,-1): (0,1) (1,1) (2,1) (2,0)
        let expected = expected_cells(&t, transform).unwrap();
        let positions: Vec<Cell> = expected.iter().map(|e| e.position).collect();
        assert_eq!(
            positions,
            vec![Cell::new(2, 0), Cell::new(0, 1), Cell::new(1, 1), Cell::new(2, 1)]
        );
        // (1,2) carried R270 + 90 = 0
        assert_eq!(expected[0].rotation, Rotation::R0);
        assert_eq!(expected[0].face, FaceRequirement::NeedsFaceA);
    }

    #[test]
    fn test_ell_rotated_under_clockwise_convention() {
        let t = ell();
        let transform = Transform {
            angle: Rotation::R90,
            convention: RotationConvention::ClockwisePositive,
        };
        let placed: PlacementSnapshot = expected_cells(&t, transform)
            .unwrap()
            .into_iter()
            .map(|e| PlacedTile::new(e.position.checked_offset(7, -3).unwrap(), e.rotation, e.face))
            .collect();
        let report = match_snapshot(&placed, &t);
        assert!(report.matched, "{report}");
        assert_eq!(report.transform(), Some(transform));
    }

    #[test]
    fn test_global_rotation_disabled_rejects_rotated_shape() {
        let mut t = ell();
        t.rules.allow_global_rotation = false;
        let transform = Transform {
            angle: Rotation::R90,
            convention: RotationConvention::CounterClockwisePositive,
        };
        let placed: PlacementSnapshot = expected_cells(&t, transform)
            .unwrap()
            .into_iter()
            .map(|e| PlacedTile::new(e.position, e.rotation, e.face))
            .collect();
        let report = match_snapshot(&placed, &t);
        assert!(!report.matched);
        assert_eq!(report.candidates_tried, 2);
    }

    #[test]
    fn test_rotation_mismatch_reported() {
        let rules = MatchRules {
            allow_global_rotation: false,
            ..Default::default()
        };
        let report = match_snapshot(&plain(&[(0, 0, 0), (1, 0, 0), (0, 1, 180), (1, 1, 0)]), &square(rules));
        assert!(!report.matched);
        let attempt = report.attempt.as_ref().unwrap();
        assert_eq!(attempt.cells_matched, 2);
        assert_eq!(
            report.mismatch,
            Some(Mismatch::Rotation {
                index: 2,
                cell: Cell::new(0, 1),
                expected: Rotation::R0,
                placed: Rotation::R180,
            })
        );
        // Ties go to the later attempt.
        assert_eq!(attempt.transform.convention, RotationConvention::ClockwisePositive);
    }

    #[test]
    fn test_half_turn_tolerance() {
        let rules = MatchRules {
            accept_half_turn: true,
            ..Default::default()
        };
        assert!(matches(&plain(&[(0, 0, 180), (1, 0, 0), (0, 1, 0), (1, 1, 0)]), &square(rules)));
        // A quarter turn is still wrong.
        assert!(!matches(&plain(&[(0, 0, 90), (1, 0, 0), (0, 1, 0), (1, 1, 0)]), &square(rules)));
    }

    #[test]
    fn test_rotation_not_required() {
        let rules = MatchRules {
            require_rotation: false,
            allow_global_rotation: false,
            ..Default::default()
        };
        assert!(matches(&plain(&[(0, 0, 90), (1, 0, 270), (0, 1, 180), (1, 1, 0)]), &square(rules)));
    }

    #[test]
    fn test_ignore_rotation_on_face_a_cell() {
        let mut t = ell();
        t.rules.allow_global_rotation = false;
        let wrong_spin_on_a = snap(&[
            (0, 0, 0, FaceRequirement::None),
            (0, 1, 90, FaceRequirement::None),
            (0, 2, 180, FaceRequirement::NeedsFaceB),
            (1, 2, 0, FaceRequirement::NeedsFaceA),
        ]);
        assert!(!matches(&wrong_spin_on_a, &t));

        t.rules.ignore_rotation_on_face_a = true;
        assert!(matches(&wrong_spin_on_a, &t));

        // Only the face-A cell is relaxed.
        let wrong_spin_on_b = snap(&[
            (0, 0, 0, FaceRequirement::None),
            (0, 1, 90, FaceRequirement::None),
            (0, 2, 0, FaceRequirement::NeedsFaceB),
            (1, 2, 270, FaceRequirement::NeedsFaceA),
        ]);
        assert!(!matches(&wrong_spin_on_b, &t));
    }

    #[test]
    fn test_face_rules() {
        let mut t = ell();
        t.rules.allow_global_rotation = false;
        let base = [
            (0, 0, 0, FaceRequirement::None),
            (0, 1, 90, FaceRequirement::None),
            (0, 2, 180, FaceRequirement::NeedsFaceB),
            (1, 2, 270, FaceRequirement::NeedsFaceA),
        ];
        assert!(matches(&snap(&base), &t));

        let mut b_on_none = base;
        b_on_none[0].3 = FaceRequirement::NeedsFaceB;
        assert!(matches(&snap(&b_on_none), &t));

        let mut a_on_none = base;
        a_on_none[0].3 = FaceRequirement::NeedsFaceA;
        let report = match_snapshot(&snap(&a_on_none), &t);
        assert!(!report.matched);
        assert!(matches!(report.mismatch, Some(Mismatch::Face { index: 0, .. })));

        let mut none_on_b = base;
        none_on_b[2].3 = FaceRequirement::None;
        assert!(!matches(&snap(&none_on_b), &t));

        let mut b_on_a = base;
        b_on_a[3].3 = FaceRequirement::NeedsFaceB;
        assert!(!matches(&snap(&b_on_a), &t));
    }

    #[test]
    fn test_position_mismatch_reported() {
        let rules = MatchRules {
            allow_global_rotation: false,
            ..Default::default()
        };
        let report = match_snapshot(&plain(&[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]), &square(rules));
        assert!(!report.matched);
        assert!(matches!(report.mismatch, Some(Mismatch::Position { index: 2, .. })));
        assert!(report.to_string().starts_with("no match after 2 candidates"));
    }

    #[test]
    fn test_mirror_flags_do_not_admit_mirrored_shapes() {
        let mut t = ell();
        t.rules.require_rotation = false;
        t.rules.allow_flip_horizontal = true;
        t.rules.allow_flip_vertical = true;

        let flipped_x: PlacementSnapshot = t
            .cells
            .iter()
            .map(|c| PlacedTile::new(Cell::new(1 - c.position.x, c.position.y), c.rotation, c.face))
            .collect();
        let flipped_y: PlacementSnapshot = t
            .cells
            .iter()
            .map(|c| PlacedTile::new(Cell::new(c.position.x, 2 - c.position.y), c.rotation, c.face))
            .collect();
        for mirrored in [&flipped_x, &flipped_y] {
            let report = match_snapshot(mirrored, &t);
            assert!(!report.matched, "{report}");
            assert_eq!(report.candidates_tried, 8);
        }

        let upright: PlacementSnapshot = t
            .cells
            .iter()
            .map(|c| PlacedTile::new(c.position, c.rotation, c.face))
            .collect();
        assert!(matches(&upright, &t));
    }

    #[test]
    fn test_snapshot_spanning_the_whole_axis_is_rejected() {
        let domino = Template::new("domino", vec![TemplateCell::at(0, 0), TemplateCell::at(1, 0)]);
        let report = match_snapshot(&plain(&[(i32::MIN, 0, 0), (i32::MAX, 0, 0)]), &domino);
        assert!(!report.matched);
        assert_eq!(report.mismatch, Some(Mismatch::OutOfRange));
        assert_eq!(report.candidates_tried, 0);
    }

    #[test]
    fn test_template_at_the_coordinate_edge() {
        let edge = Template::new(
            "edge",
            vec![TemplateCell::at(i32::MIN, 0), TemplateCell::at(i32::MIN + 1, 0)],
        );
        assert!(matches(&plain(&[(0, 0, 0), (1, 0, 0)]), &edge));

        // Candidates that would negate i32::MIN are skipped, the rest still run.
        let report = match_snapshot(&plain(&[(5, 5, 270), (5, 6, 270)]), &edge);
        assert!(report.matched, "{report}");
        assert_eq!(
            report.transform(),
            Some(Transform {
                angle: Rotation::R90,
                convention: RotationConvention::ClockwisePositive,
            })
        );
    }

    #[test]
    fn test_template_spanning_the_whole_axis_never_matches() {
        let wide = Template::new(
            "wide",
            vec![TemplateCell::at(i32::MIN, 0), TemplateCell::at(i32::MAX, 0)],
        );
        let report = match_snapshot(&plain(&[(0, 0, 0), (1, 0, 0)]), &wide);
        assert!(!report.matched);
        assert_eq!(report.candidates_tried, 8);
        assert_eq!(report.mismatch, Some(Mismatch::OutOfRange));
    }

    #[test]
    fn test_report_serializes() {
        let report = match_snapshot(&plain(&[(0, 0, 0)]), &square(MatchRules::default()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["matched"], false);
        assert_eq!(json["mismatch"]["kind"], "tile_count");
        assert_eq!(json["mismatch"]["expected"], 4);
    }
}
