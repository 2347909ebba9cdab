//! Turn the presentation layer's view of the grid into a placement snapshot.
//!
//! Tiles still being dragged, held or animated are left out: a tile in
//! transit must never count towards a match.

use serde::{Deserialize, Serialize};

use crate::engine::models::{Cell, FaceRequirement, PlacedTile, PlacementSnapshot, Rotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileMotion {
    #[default]
    Resting,
    Dragging,
    Held,
    Animating,
}

impl TileMotion {
    pub fn is_settled(self) -> bool {
        self == TileMotion::Resting
    }
}

/// A tile as the UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileView {
    /// Free z-angle from the transform, in degrees.
    pub rotation_degrees: f32,
    pub face_up: bool,
    /// Name of the front artwork; its trailing digit selects the reverse variant.
    pub front_variant: String,
    #[serde(default)]
    pub motion: TileMotion,
}

impl TileView {
    /// Face the tile currently shows, in template terms.
    pub fn face(&self) -> FaceRequirement {
        if self.face_up {
            FaceRequirement::None
        } else {
            reverse_face(&self.front_variant)
        }
    }
}

/// Reverse side of a tile whose front artwork is `front_variant`.
///
/// Fronts ending in 1 or 2 hide face A, fronts ending in 3 or 4 hide face B.
/// Anything else is treated as face B.
pub fn reverse_face(front_variant: &str) -> FaceRequirement {
    match front_variant.chars().rev().find_map(|c| c.to_digit(10)) {
        Some(1) | Some(2) => FaceRequirement::NeedsFaceA,
        _ => FaceRequirement::NeedsFaceB,
    }
}

/// Build a snapshot from grid cells and whatever tile each one holds.
pub fn snapshot_from_grid<'a, I>(cells: I) -> PlacementSnapshot
where
    I: IntoIterator<Item = (Cell, Option<&'a TileView>)>,
{
    let mut snapshot = PlacementSnapshot::new();
    let mut skipped = 0usize;
    for (cell, tile) in cells {
        let Some(tile) = tile else { continue };
        if !tile.motion.is_settled() {
            skipped += 1;
            continue;
        }
        snapshot.insert(PlacedTile::new(
            cell,
            Rotation::from_degrees_f32(tile.rotation_degrees),
            tile.face(),
        ));
    }
    if skipped > 0 {
        tracing::trace!(skipped, settled = snapshot.len(), "ignored tiles in transit");
    }
    snapshot
}
