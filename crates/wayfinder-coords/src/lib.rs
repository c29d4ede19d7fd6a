//! Room coordinates and exit directions.
//!
//! A [`Coordinate`] identifies a room on the map by value: two rooms are the
//! same room exactly when their coordinates compare equal. [`ExitDir`] names
//! the six real exits plus the two sentinel values the parser needs while
//! scanning text.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// Integer room position: `x` grows east, `y` grows south, `z` is the layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring coordinate reached by leaving through `dir`.
    #[must_use]
    pub fn step(self, dir: ExitDir) -> Self {
        self + dir.offset()
    }
}

impl std::ops::Add for Coordinate {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(
            self.x.saturating_add(other.x),
            self.y.saturating_add(other.y),
            self.z.saturating_add(other.z),
        )
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// ExitDir
// ---------------------------------------------------------------------------

/// Number of real exits a room can have.
pub const NUM_EXITS: usize = 6;

/// Exit direction. The first six variants are real exits; `Unknown` and
/// `None` are scan sentinels and never index per-direction tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExitDir {
    North,
    South,
    East,
    West,
    Up,
    Down,
    Unknown,
    None,
}

/// The six real exits in table order.
pub const ALL_EXITS: [ExitDir; NUM_EXITS] = [
    ExitDir::North,
    ExitDir::South,
    ExitDir::East,
    ExitDir::West,
    ExitDir::Up,
    ExitDir::Down,
];

impl ExitDir {
    /// Table index for real exits, `None` for the sentinels.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::North => Some(0),
            Self::South => Some(1),
            Self::East => Some(2),
            Self::West => Some(3),
            Self::Up => Some(4),
            Self::Down => Some(5),
            Self::Unknown | Self::None => None,
        }
    }

    /// Returns `true` for the six real exits.
    #[must_use]
    pub fn is_real(self) -> bool {
        self.index().is_some()
    }

    /// Full lower-case name as the game spells it.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
            Self::Unknown => "unknown",
            Self::None => "none",
        }
    }

    /// Single-character command abbreviation (`n`, `s`, ...). Sentinels
    /// map to `?`.
    #[must_use]
    pub fn abbreviation(self) -> char {
        match self {
            Self::North => 'n',
            Self::South => 's',
            Self::East => 'e',
            Self::West => 'w',
            Self::Up => 'u',
            Self::Down => 'd',
            Self::Unknown | Self::None => '?',
        }
    }

    /// Coordinate delta produced by moving through this exit.
    #[must_use]
    pub fn offset(self) -> Coordinate {
        match self {
            Self::North => Coordinate::new(0, -1, 0),
            Self::South => Coordinate::new(0, 1, 0),
            Self::East => Coordinate::new(1, 0, 0),
            Self::West => Coordinate::new(-1, 0, 0),
            Self::Up => Coordinate::new(0, 0, 1),
            Self::Down => Coordinate::new(0, 0, -1),
            Self::Unknown | Self::None => Coordinate::default(),
        }
    }

    /// The exit leading back.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            other => other,
        }
    }

    /// Parses a direction from any non-empty prefix of its full name,
    /// ignoring case (`"n"`, `"No"`, `"north"`). Sentinels never parse.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        if word.is_empty() {
            return None;
        }
        let lower = word.to_ascii_lowercase();
        ALL_EXITS
            .into_iter()
            .find(|dir| dir.name().starts_with(lower.as_str()))
    }

    /// Parses a single abbreviation character.
    #[must_use]
    pub fn from_abbreviation(c: char) -> Option<Self> {
        ALL_EXITS
            .into_iter()
            .find(|dir| dir.abbreviation() == c.to_ascii_lowercase())
    }
}

impl std::fmt::Display for ExitDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
