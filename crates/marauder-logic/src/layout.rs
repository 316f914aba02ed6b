//! Built-in castle map and the default cast that walks it.

use serde::{Deserialize, Serialize};

use crate::constants::room_ids::*;
use crate::constants::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::geometry::{validate_layout, Room, RoomIndex, Severity, ValidationError};
use crate::schedule::{scheduled_rooms, Archetype};

/// A world size plus the rooms placed in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    pub world_width: f32,
    pub world_height: f32,
    pub rooms: Vec<Room>,
}

impl MapLayout {
    /// The castle: eight rooms on an 800×600 map, all aligned to 20-unit
    /// cells and separated by corridors at least three cells wide.
    pub fn castle() -> Self {
        let rooms = vec![
            Room::new(GRYFFINDOR_TOWER, "Gryffindor Tower", 40.0, 40.0, 180.0, 140.0),
            Room::new(GREAT_HALL, "Great Hall", 300.0, 40.0, 200.0, 140.0),
            Room::new(LIBRARY, "Library", 560.0, 40.0, 180.0, 120.0),
            Room::new(HEADMASTERS_OFFICE, "Headmaster's Office", 560.0, 220.0, 140.0, 100.0),
            Room::new(COURTYARD, "Courtyard", 300.0, 240.0, 160.0, 100.0),
            Room::new(SLYTHERIN_DUNGEON, "Slytherin Dungeon", 40.0, 400.0, 200.0, 140.0),
            Room::new(POTIONS_CLASSROOM, "Potions Classroom", 300.0, 420.0, 160.0, 120.0),
            Room::new(HOSPITAL_WING, "Hospital Wing", 560.0, 400.0, 180.0, 140.0),
        ];
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            rooms,
        }
    }

    pub fn room_index(&self) -> RoomIndex {
        RoomIndex::new(self.rooms.clone())
    }

    /// Geometry checks plus the schedule cross-check.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = validate_layout(&self.rooms, self.world_width, self.world_height);
        errors.extend(check_schedule_rooms(self));
        errors
    }

    /// True when [`Self::validate`] reports no errors (warnings allowed).
    pub fn is_valid(&self) -> bool {
        self.validate().iter().all(|e| e.severity != Severity::Error)
    }
}

impl Default for MapLayout {
    fn default() -> Self {
        Self::castle()
    }
}

/// Every room a schedule table names must exist in the layout. A missing room
/// is not fatal (affected characters hold position) but is always a mistake.
pub fn check_schedule_rooms(layout: &MapLayout) -> Vec<ValidationError> {
    let index = layout.room_index();
    scheduled_rooms()
        .into_iter()
        .filter(|id| !index.contains_id(id))
        .map(|id| ValidationError {
            category: "schedule_room",
            severity: Severity::Warning,
            message: format!("Schedules reference room '{id}' which is not in the layout"),
        })
        .collect()
}

/// One character to spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub archetype: Archetype,
}

impl CastMember {
    pub fn new(name: impl Into<String>, archetype: Archetype) -> Self {
        Self {
            name: name.into(),
            archetype,
        }
    }
}

/// The default cast: at least one character per archetype.
pub fn default_cast() -> Vec<CastMember> {
    vec![
        CastMember::new("Harry Potter", Archetype::Student),
        CastMember::new("Hermione Granger", Archetype::Student),
        CastMember::new("Ron Weasley", Archetype::Student),
        CastMember::new("Severus Snape", Archetype::Professor),
        CastMember::new("Minerva McGonagall", Archetype::Professor),
        CastMember::new("Albus Dumbledore", Archetype::Headmaster),
        CastMember::new("Argus Filch", Archetype::Caretaker),
        CastMember::new("Poppy Pomfrey", Archetype::Healer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid;

    #[test]
    fn castle_validates_cleanly() {
        let layout = MapLayout::castle();
        let errors = layout.validate();
        assert!(errors.is_empty(), "{errors:?}");
        assert!(layout.is_valid());
    }

    #[test]
    fn castle_rooms_are_cell_aligned() {
        let cell = crate::constants::CELL_SIZE;
        for room in &MapLayout::castle().rooms {
            for v in [room.x, room.y, room.width, room.height] {
                assert_eq!(v % cell, 0.0, "{} not aligned", room.id);
            }
        }
    }

    #[test]
    fn every_castle_room_has_four_walkable_doors() {
        let layout = MapLayout::castle();
        let grid = build_grid(layout.world_width, layout.world_height, 20.0, &layout.rooms);
        for room in &layout.rooms {
            let doors = grid.door_cells(room);
            assert_eq!(doors.len(), 4, "{}", room.id);
            assert!(doors.iter().all(|d| grid.is_walkable(*d)), "{}", room.id);
        }
    }

    #[test]
    fn missing_schedule_room_is_reported() {
        let mut layout = MapLayout::castle();
        layout.rooms.retain(|r| r.id != LIBRARY);
        let errors = check_schedule_rooms(&layout);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains(LIBRARY));
        assert_eq!(errors[0].severity, Severity::Warning);
        // Characters bound for the library hold position; the map still loads.
        assert!(layout.is_valid());
    }

    #[test]
    fn default_cast_covers_every_archetype() {
        let cast = default_cast();
        for archetype in Archetype::all() {
            assert!(cast.iter().any(|m| m.archetype == *archetype), "{archetype:?}");
        }
    }

    #[test]
    fn layout_loads_from_json() {
        let json = r#"{
            "world_width": 200.0,
            "world_height": 100.0,
            "rooms": [
                {"id": "a", "name": "A", "x": 20.0, "y": 20.0, "width": 60.0, "height": 60.0}
            ]
        }"#;
        let layout: MapLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.rooms.len(), 1);
        assert_eq!(layout.room_index().get("a").map(|r| r.width), Some(60.0));
    }
}
