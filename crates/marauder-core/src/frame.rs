//! Render frames - a serializable picture of the map at one instant

use marauder_logic::footsteps::VisibleFootstep;
use marauder_logic::geometry::{RoomIndex, WorldPos};
use marauder_logic::movement::Character;
use marauder_logic::schedule::{Archetype, MovementMode, TimeBlock};
use serde::Serialize;

/// One character as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterView {
    pub id: u32,
    pub name: String,
    pub archetype: Archetype,
    pub x: f32,
    pub y: f32,
    pub mode: MovementMode,
    /// Room the character is standing in, if any.
    pub room: Option<String>,
    /// Room the schedule is sending the character to.
    pub target_room: Option<String>,
    /// Waypoints still ahead, for path overlays.
    pub path: Vec<WorldPos>,
}

impl CharacterView {
    pub fn new(character: &Character, rooms: &RoomIndex) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
            archetype: character.archetype,
            x: character.position.x,
            y: character.position.y,
            mode: character.mode,
            room: character.current_room(rooms).map(|r| r.id.clone()),
            target_room: character.target_room.clone(),
            path: character.remaining_path().to_vec(),
        }
    }
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub elapsed_ms: f64,
    pub time_of_day: f32,
    pub block: TimeBlock,
    pub day: u32,
    /// Sorted by id.
    pub characters: Vec<CharacterView>,
    /// Oldest first, opacity already applied.
    pub footsteps: Vec<VisibleFootstep>,
}

impl Frame {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
