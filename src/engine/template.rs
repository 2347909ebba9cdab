//! Templates: the authored target shapes a player has to reproduce.
//!
//! A template is a short list of relative cells, each with the spin and face
//! the tile on it must show, plus the rules that say how strictly to compare.
//! Templates are immutable once built; the session swaps whole `Arc<Template>`
//! values when a new card is drawn.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::models::{Cell, FaceRequirement, Rotation};

/// One cell of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCell {
    #[serde(flatten)]
    pub position: Cell,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub face: FaceRequirement,
}

impl TemplateCell {
    pub fn new(position: Cell, rotation: Rotation, face: FaceRequirement) -> Self {
        Self { position, rotation, face }
    }

    /// A cell at (x, y) with no spin and no face requirement.
    pub fn at(x: i32, y: i32) -> Self {
        Self::new(Cell::new(x, y), Rotation::R0, FaceRequirement::None)
    }
}

/// Strictness flags. Defaults match what the authoring tool writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// When false, tile spin is ignored entirely.
    pub require_rotation: bool,
    /// Accept the whole shape rotated by 90°, 180° or 270° as a rigid body.
    pub allow_global_rotation: bool,
    /// Skip the spin check on cells that require face A.
    pub ignore_rotation_on_face_a: bool,
    /// Accept a spin of `r + 180°` where `r` is expected.
    pub accept_half_turn: bool,
    /// Reserved. Never consulted by the matcher.
    pub allow_flip_horizontal: bool,
    /// Reserved. Never consulted by the matcher.
    pub allow_flip_vertical: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            require_rotation: true,
            allow_global_rotation: true,
            ignore_rotation_on_face_a: false,
            accept_half_turn: false,
            allow_flip_horizontal: false,
            allow_flip_vertical: false,
        }
    }
}

impl MatchRules {
    /// Whether any reserved mirror flag is set.
    pub fn requests_mirroring(&self) -> bool {
        self.allow_flip_horizontal || self.allow_flip_vertical
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    /// Card art identifier; only used to find the template for a card.
    #[serde(default)]
    pub reference_image: Option<String>,
    #[serde(default)]
    pub cells: Vec<TemplateCell>,
    #[serde(default)]
    pub rules: MatchRules,
}

impl Template {
    pub fn new(id: impl Into<String>, cells: Vec<TemplateCell>) -> Self {
        Self {
            id: id.into(),
            reference_image: None,
            cells,
            rules: MatchRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: MatchRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_reference_image(mut self, image: impl Into<String>) -> Self {
        self.reference_image = Some(image.into());
        self
    }

    /// Number of tiles a matching placement must contain.
    pub fn required_tiles(&self) -> usize {
        self.cells.len()
    }

    /// Templates without cells never become active.
    pub fn is_playable(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Positions that appear more than once, in first-seen order.
    pub fn duplicate_positions(&self) -> Vec<Cell> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for cell in &self.cells {
            if !seen.insert(cell.position) && !dups.contains(&cell.position) {
                dups.push(cell.position);
            }
        }
        dups
    }
}
