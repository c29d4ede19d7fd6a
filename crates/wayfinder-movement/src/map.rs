//! The map seam and a small in-memory map.
//!
//! Map storage lives outside the engine. The coordinator and session only
//! see it through [`MapLookup`]: find where an observed room sits, and
//! describe the room at a coordinate so moves can be emulated offline.
//!
//! [`InMemoryMap`] backs tests and transcript replay. It loads from RON:
//!
//! ```ron
//! (
//!     rooms: [
//!         (
//!             coordinate: (x: 0, y: 0, z: 0),
//!             name: "Village Square",
//!             description: ["A fountain splashes here."],
//!             exits: "Exits: north, [east](gate).",
//!             light: Sun,
//!             terrain: City,
//!         ),
//!     ],
//! )
//! ```

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wayfinder_coords::{Coordinate, ExitDir};
use wayfinder_parser::{LightLevel, PromptFields, RoomObserved, Terrain, parse_exits};

// ---------------------------------------------------------------------------
// MapLookup
// ---------------------------------------------------------------------------

/// Read-only access to the player's map.
pub trait MapLookup {
    /// Coordinate of the mapped room matching `room`, if exactly one does.
    fn resolve(&self, room: &RoomObserved) -> Option<Coordinate>;

    /// The room at `coordinate` as the server would show it.
    fn room_at(&self, coordinate: Coordinate) -> Option<RoomObserved>;

    /// Door name recorded for the exit `dir` of the room at `coordinate`.
    fn door_name(&self, coordinate: Coordinate, dir: ExitDir) -> Option<String>;

    /// Prompt the server would send in the room at `coordinate`.
    fn prompt_at(&self, _coordinate: Coordinate) -> Option<PromptFields> {
        None
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse map: {0}")]
    ParseError(#[from] ron::error::SpannedError),

    #[error("two rooms at {0}")]
    DuplicateRoom(Coordinate),
}

// ---------------------------------------------------------------------------
// InMemoryMap
// ---------------------------------------------------------------------------

/// One room as written in a map file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRoom {
    pub coordinate: Coordinate,
    pub name: String,
    #[serde(default)]
    pub description: Vec<String>,
    /// Exits line in server syntax, door names included.
    #[serde(default)]
    pub exits: String,
    #[serde(default)]
    pub light: LightLevel,
    #[serde(default)]
    pub terrain: Terrain,
}

#[derive(Debug, Default, Deserialize)]
struct MapFile {
    #[serde(default)]
    rooms: Vec<MapRoom>,
}

#[derive(Debug, Clone)]
struct StoredRoom {
    room: RoomObserved,
    light: LightLevel,
    terrain: Terrain,
}

/// Rooms keyed by coordinate.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMap {
    rooms: FxHashMap<Coordinate, StoredRoom>,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from a list of rooms.
    pub fn from_rooms(rooms: impl IntoIterator<Item = MapRoom>) -> Result<Self, MapError> {
        let mut map = Self::new();
        for room in rooms {
            map.insert(room)?;
        }
        Ok(map)
    }

    /// Parses a RON map document.
    pub fn from_ron_str(text: &str) -> Result<Self, MapError> {
        let file: MapFile = ron::from_str(text)?;
        Self::from_rooms(file.rooms)
    }

    /// Loads a RON map file.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        let map = Self::from_ron_str(&text)?;
        tracing::info!(path = %path.display(), rooms = map.len(), "loaded map");
        Ok(map)
    }

    pub fn insert(&mut self, room: MapRoom) -> Result<(), MapError> {
        if self.rooms.contains_key(&room.coordinate) {
            return Err(MapError::DuplicateRoom(room.coordinate));
        }
        let exits = (!room.exits.trim().is_empty()).then(|| parse_exits(&room.exits));
        let stored = StoredRoom {
            room: RoomObserved {
                name: room.name,
                description: room.description,
                exits,
                ..Default::default()
            },
            light: room.light,
            terrain: room.terrain,
        };
        self.rooms.insert(room.coordinate, stored);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl MapLookup for InMemoryMap {
    /// Matches by name, then narrows by description and finally by the set
    /// of exit directions. Anything still ambiguous is unresolved.
    fn resolve(&self, room: &RoomObserved) -> Option<Coordinate> {
        let mut candidates: Vec<(Coordinate, &RoomObserved)> = self
            .rooms
            .iter()
            .filter(|(_, stored)| stored.room.name == room.name)
            .map(|(c, stored)| (*c, &stored.room))
            .collect();

        if candidates.len() > 1 && !room.description.is_empty() {
            candidates.retain(|(_, known)| known.description == room.description);
        }
        if candidates.len() > 1
            && let Some(exits) = &room.exits
        {
            candidates.retain(|(_, known)| {
                known
                    .exits
                    .as_ref()
                    .is_some_and(|k| k.exits().eq(exits.exits()))
            });
        }

        match candidates.as_slice() {
            [(coordinate, _)] => Some(*coordinate),
            [] => None,
            _ => {
                tracing::debug!(name = %room.name, matches = candidates.len(), "ambiguous room");
                None
            }
        }
    }

    fn room_at(&self, coordinate: Coordinate) -> Option<RoomObserved> {
        self.rooms.get(&coordinate).map(|stored| stored.room.clone())
    }

    fn door_name(&self, coordinate: Coordinate, dir: ExitDir) -> Option<String> {
        self.rooms
            .get(&coordinate)?
            .room
            .exits
            .as_ref()?
            .door_name(dir)
            .map(str::to_string)
    }

    fn prompt_at(&self, coordinate: Coordinate) -> Option<PromptFields> {
        self.rooms
            .get(&coordinate)
            .map(|stored| PromptFields::synthesize(stored.light, stored.terrain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"(
        rooms: [
            (
                coordinate: (x: 0, y: 0, z: 0),
                name: "Village Square",
                description: ["A fountain splashes here."],
                exits: "Exits: north, [east](gate).",
                light: Sun,
                terrain: City,
            ),
            (
                coordinate: (x: 0, y: -1, z: 0),
                name: "Narrow Lane",
                exits: "Exits: south.",
            ),
            (
                coordinate: (x: 5, y: 5, z: 0),
                name: "Narrow Lane",
                exits: "Exits: west.",
            ),
        ],
    )"#;

    fn map() -> InMemoryMap {
        InMemoryMap::from_ron_str(MAP).unwrap()
    }

    #[test]
    fn test_load_from_ron() {
        let map = map();
        assert_eq!(map.len(), 3);
        let square = map.room_at(Coordinate::new(0, 0, 0)).unwrap();
        assert_eq!(square.name, "Village Square");
        assert!(square.exits.unwrap().flags(ExitDir::East).is_closed_door());
        assert!(map.room_at(Coordinate::new(9, 9, 9)).is_none());
    }

    #[test]
    fn test_resolve_by_name() {
        let map = map();
        let square = RoomObserved::new("Village Square");
        assert_eq!(map.resolve(&square), Some(Coordinate::new(0, 0, 0)));
        assert_eq!(map.resolve(&RoomObserved::new("Nowhere")), None);
    }

    #[test]
    fn test_resolve_narrows_by_exits() {
        let map = map();
        assert_eq!(map.resolve(&RoomObserved::new("Narrow Lane")), None);

        let lane = RoomObserved::new("Narrow Lane").with_exits(parse_exits("Exits: west."));
        assert_eq!(map.resolve(&lane), Some(Coordinate::new(5, 5, 0)));
    }

    #[test]
    fn test_door_name_and_prompt() {
        let map = map();
        let origin = Coordinate::new(0, 0, 0);
        assert_eq!(map.door_name(origin, ExitDir::East).as_deref(), Some("gate"));
        assert_eq!(map.door_name(origin, ExitDir::North), None);
        let prompt = map.prompt_at(origin).unwrap();
        assert_eq!(prompt.text, "*#>");
    }

    #[test]
    fn test_duplicate_coordinate_rejected() {
        let room = MapRoom {
            coordinate: Coordinate::new(0, 0, 0),
            name: "A".to_string(),
            description: Vec::new(),
            exits: String::new(),
            light: LightLevel::Unknown,
            terrain: Terrain::Undefined,
        };
        let result = InMemoryMap::from_rooms([room.clone(), room]);
        assert!(matches!(result, Err(MapError::DuplicateRoom(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.ron");
        std::fs::write(&path, MAP).unwrap();
        assert_eq!(InMemoryMap::load(&path).unwrap().len(), 3);

        std::fs::write(&path, "(rooms: [ (").unwrap();
        assert!(matches!(InMemoryMap::load(&path), Err(MapError::ParseError(_))));
    }
}
