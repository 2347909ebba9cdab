//! Core data types shared by the matcher, the session and the grid reader.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

// --- Cell ---

/// A position on the unbounded logical grid. Only relative positions matter.
///
/// Cells order canonically by row then column (y ascending, then x ascending),
/// which is the order both sides of a comparison are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by (dx, dy); `None` if a coordinate leaves the `i32` range.
    pub fn checked_offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Shift so that `origin` lands on (0, 0); `None` if the distance does not
    /// fit in an `i32`.
    pub fn relative_to(self, origin: Cell) -> Option<Self> {
        Some(Self::new(self.x.checked_sub(origin.x)?, self.y.checked_sub(origin.y)?))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Component-wise minimum of a set of cells: the top-left anchor.
pub fn min_corner<I: IntoIterator<Item = Cell>>(cells: I) -> Option<Cell> {
    cells.into_iter().fold(None, |acc, c| match acc {
        None => Some(c),
        Some(m) => Some(Cell::new(m.x.min(c.x), m.y.min(c.y))),
    })
}

// --- Rotation ---

/// Tile spin, always one of the four quarter turns.
///
/// Serialized as integer degrees. Any integer accepted on input is snapped to
/// the nearest quarter turn; exact ties (45°, 135°, ...) go to the even one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn from_quarter_turns(turns: i32) -> Self {
        Self::ALL[turns.rem_euclid(4) as usize]
    }

    pub fn quarter_turns(self) -> i32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub fn degrees(self) -> i32 {
        self.quarter_turns() * 90
    }

    pub fn from_degrees(degrees: i32) -> Self {
        let g = degrees.rem_euclid(360);
        let (mut turns, rest) = (g / 90, g % 90);
        if rest > 45 || (rest == 45 && turns % 2 == 1) {
            turns += 1;
        }
        Self::from_quarter_turns(turns)
    }

    /// Snap a free angle coming from the presentation layer.
    pub fn from_degrees_f32(degrees: f32) -> Self {
        if !degrees.is_finite() {
            return Rotation::R0;
        }
        let whole = degrees.round_ties_even() % 360.0;
        Self::from_degrees(whole as i32)
    }

    pub fn half_turn(self) -> Self {
        self + Rotation::R180
    }
}

impl Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + rhs.quarter_turns())
    }
}

impl Sub for Rotation {
    type Output = Rotation;

    fn sub(self, rhs: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() - rhs.quarter_turns())
    }
}

impl From<i32> for Rotation {
    fn from(degrees: i32) -> Self {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

// --- Face requirement ---

/// Which side of a double-sided tile a template cell asks for, and which side
/// a placed tile shows.
///
/// `None` on a template cell accepts anything except `NeedsFaceA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRequirement {
    #[default]
    None,
    #[serde(alias = "eye")]
    NeedsFaceA,
    #[serde(alias = "no_eye")]
    NeedsFaceB,
}

impl FaceRequirement {
    /// Whether a tile showing `placed` satisfies this requirement.
    pub fn accepts(self, placed: FaceRequirement) -> bool {
        match self {
            FaceRequirement::NeedsFaceA => placed == FaceRequirement::NeedsFaceA,
            FaceRequirement::NeedsFaceB => placed == FaceRequirement::NeedsFaceB,
            FaceRequirement::None => placed != FaceRequirement::NeedsFaceA,
        }
    }

    /// Stable numeric code used in fingerprints.
    pub fn code(self) -> u8 {
        match self {
            FaceRequirement::None => 0,
            FaceRequirement::NeedsFaceA => 1,
            FaceRequirement::NeedsFaceB => 2,
        }
    }
}

impl fmt::Display for FaceRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaceRequirement::None => "none",
            FaceRequirement::NeedsFaceA => "face_a",
            FaceRequirement::NeedsFaceB => "face_b",
        };
        f.write_str(s)
    }
}

// --- Placed tiles ---

/// A settled tile as seen by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedTile {
    #[serde(flatten)]
    pub cell: Cell,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub face: FaceRequirement,
}

impl PlacedTile {
    pub fn new(cell: Cell, rotation: Rotation, face: FaceRequirement) -> Self {
        Self { cell, rotation, face }
    }
}

impl fmt::Display for PlacedTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rot={} face={}", self.cell, self.rotation, self.face)
    }
}

/// The settled tiles currently on the grid, keyed by cell.
///
/// Iteration is always in canonical order. Inserting a second tile on an
/// occupied cell replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementSnapshot {
    tiles: BTreeMap<Cell, PlacedTile>,
}

impl PlacementSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: PlacedTile) {
        self.tiles.insert(tile.cell, tile);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, cell: Cell) -> Option<&PlacedTile> {
        self.tiles.get(&cell)
    }

    /// Tiles in canonical (row, column) order.
    pub fn tiles(&self) -> impl Iterator<Item = &PlacedTile> + '_ {
        self.tiles.values()
    }

    /// Tiles translated so the minimum x and y are both zero, in canonical order.
    ///
    /// `None` if the tiles span more than `i32::MAX` cells on either axis.
    pub fn anchored(&self) -> Option<Vec<PlacedTile>> {
        let Some(origin) = min_corner(self.tiles.keys().copied()) else {
            return Some(Vec::new());
        };
        // Translation preserves the (y, x) order, so no re-sort is needed.
        self.tiles
            .values()
            .map(|t| {
                Some(PlacedTile {
                    cell: t.cell.relative_to(origin)?,
                    ..*t
                })
            })
            .collect()
    }

    /// Canonical text form: `x,y,rotation,face` per tile joined by `;`.
    pub fn canonical_key(&self) -> String {
        self.tiles
            .values()
            .map(|t| format!("{},{},{},{}", t.cell.x, t.cell.y, t.rotation.degrees(), t.face.code()))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl FromIterator<PlacedTile> for PlacementSnapshot {
    fn from_iter<I: IntoIterator<Item = PlacedTile>>(iter: I) -> Self {
        let mut snapshot = PlacementSnapshot::new();
        for tile in iter {
            snapshot.insert(tile);
        }
        snapshot
    }
}

// --- Snapshot serde: {"tiles": [...]} ---

#[derive(Serialize, Deserialize)]
struct SnapshotSerde {
    #[serde(default)]
    tiles: Vec<PlacedTile>,
}

impl Serialize for PlacementSnapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SnapshotSerde {
            tiles: self.tiles.values().copied().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlacementSnapshot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = SnapshotSerde::deserialize(deserializer)?;
        Ok(raw.tiles.into_iter().collect())
    }
}
