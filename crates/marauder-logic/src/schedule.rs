//! Daily schedules: which room each archetype heads to, and how it moves
//! once there, for every block of the simulated day.
//!
//! The day is split into six half-open blocks:
//!
//! | Block | Hours |
//! |-------|-------|
//! | `Night` | [22, 24) |
//! | `LateNight` | [0, 6) |
//! | `Morning` | [6, 10) |
//! | `Noon` | [10, 14) |
//! | `Afternoon` | [14, 18) |
//! | `Evening` | [18, 22) |
//!
//! Resolution is a pure lookup on static tables.

use serde::{Deserialize, Serialize};

use crate::constants::hours::*;
use crate::constants::room_ids::*;

/// Segment of the simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBlock {
    Night,
    LateNight,
    Morning,
    Noon,
    Afternoon,
    Evening,
}

impl TimeBlock {
    /// Map any hour (wrapped into [0, 24)) onto its block.
    pub fn from_hour(hour: f32) -> Self {
        let h = hour.rem_euclid(DAY_LENGTH);
        if h >= NIGHT_START {
            TimeBlock::Night
        } else if h < MORNING_START {
            TimeBlock::LateNight
        } else if h < NOON_START {
            TimeBlock::Morning
        } else if h < AFTERNOON_START {
            TimeBlock::Noon
        } else if h < EVENING_START {
            TimeBlock::Afternoon
        } else {
            TimeBlock::Evening
        }
    }

    /// First hour of the block.
    pub fn start_hour(self) -> f32 {
        match self {
            TimeBlock::Night => NIGHT_START,
            TimeBlock::LateNight => 0.0,
            TimeBlock::Morning => MORNING_START,
            TimeBlock::Noon => NOON_START,
            TimeBlock::Afternoon => AFTERNOON_START,
            TimeBlock::Evening => EVENING_START,
        }
    }

    pub fn all() -> &'static [TimeBlock] {
        &[
            TimeBlock::Night,
            TimeBlock::LateNight,
            TimeBlock::Morning,
            TimeBlock::Noon,
            TimeBlock::Afternoon,
            TimeBlock::Evening,
        ]
    }
}

/// How a character behaves with respect to its scheduled room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Go to the room and stop once inside.
    Walk,
    /// Go to the room and roam around its centre.
    Wander,
    /// Go to the room and settle at its centre.
    Sleep,
}

/// One row of a schedule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub block: TimeBlock,
    pub room: &'static str,
    pub mode: MovementMode,
}

const fn entry(block: TimeBlock, room: &'static str, mode: MovementMode) -> ScheduleEntry {
    ScheduleEntry { block, room, mode }
}

use MovementMode::{Sleep, Walk, Wander};
use TimeBlock::{Afternoon, Evening, LateNight, Morning, Night, Noon};

const STUDENT: &[ScheduleEntry] = &[
    entry(Night, GRYFFINDOR_TOWER, Sleep),
    entry(LateNight, GRYFFINDOR_TOWER, Sleep),
    entry(Morning, GREAT_HALL, Wander),
    entry(Noon, POTIONS_CLASSROOM, Walk),
    entry(Afternoon, LIBRARY, Wander),
    entry(Evening, COURTYARD, Wander),
];

const PROFESSOR: &[ScheduleEntry] = &[
    entry(Night, LIBRARY, Wander),
    entry(LateNight, SLYTHERIN_DUNGEON, Sleep),
    entry(Morning, GREAT_HALL, Walk),
    entry(Noon, POTIONS_CLASSROOM, Wander),
    entry(Afternoon, POTIONS_CLASSROOM, Wander),
    entry(Evening, GREAT_HALL, Wander),
];

const HEADMASTER: &[ScheduleEntry] = &[
    entry(Night, HEADMASTERS_OFFICE, Wander),
    entry(LateNight, HEADMASTERS_OFFICE, Sleep),
    entry(Morning, GREAT_HALL, Walk),
    entry(Noon, HEADMASTERS_OFFICE, Wander),
    entry(Afternoon, COURTYARD, Wander),
    entry(Evening, GREAT_HALL, Wander),
];

const CARETAKER: &[ScheduleEntry] = &[
    entry(Night, COURTYARD, Wander),
    entry(LateNight, LIBRARY, Wander),
    entry(Morning, SLYTHERIN_DUNGEON, Sleep),
    entry(Noon, GREAT_HALL, Walk),
    entry(Afternoon, SLYTHERIN_DUNGEON, Wander),
    entry(Evening, COURTYARD, Walk),
];

const HEALER: &[ScheduleEntry] = &[
    entry(Night, HOSPITAL_WING, Wander),
    entry(LateNight, HOSPITAL_WING, Sleep),
    entry(Morning, GREAT_HALL, Walk),
    entry(Noon, HOSPITAL_WING, Wander),
    entry(Afternoon, HOSPITAL_WING, Wander),
    entry(Evening, GREAT_HALL, Wander),
];

/// Behavioural category that selects a schedule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Student,
    Professor,
    Headmaster,
    Caretaker,
    Healer,
}

impl Archetype {
    pub fn schedule(self) -> &'static [ScheduleEntry] {
        match self {
            Archetype::Student => STUDENT,
            Archetype::Professor => PROFESSOR,
            Archetype::Headmaster => HEADMASTER,
            Archetype::Caretaker => CARETAKER,
            Archetype::Healer => HEALER,
        }
    }

    pub fn all() -> &'static [Archetype] {
        &[
            Archetype::Student,
            Archetype::Professor,
            Archetype::Headmaster,
            Archetype::Caretaker,
            Archetype::Healer,
        ]
    }
}

/// Look up `block` in `table`, falling back to the first row.
///
/// Returns `None` only for an empty table.
pub fn resolve_in(table: &'static [ScheduleEntry], block: TimeBlock) -> Option<&'static ScheduleEntry> {
    table.iter().find(|e| e.block == block).or_else(|| table.first())
}

/// Where `archetype` should be, and how it should move, at `hour`.
pub fn resolve(archetype: Archetype, hour: f32) -> &'static ScheduleEntry {
    let table = archetype.schedule();
    // Every built-in table has six rows.
    resolve_in(table, TimeBlock::from_hour(hour)).unwrap_or(&table[0])
}

/// Every room id referenced by any built-in schedule.
pub fn scheduled_rooms() -> Vec<&'static str> {
    let mut rooms: Vec<&'static str> = Archetype::all()
        .iter()
        .flat_map(|a| a.schedule().iter().map(|e| e.room))
        .collect();
    rooms.sort_unstable();
    rooms.dedup();
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_boundaries_are_half_open() {
        let cases = [
            (21.99, TimeBlock::Evening),
            (22.0, TimeBlock::Night),
            (23.99, TimeBlock::Night),
            (0.0, TimeBlock::LateNight),
            (5.99, TimeBlock::LateNight),
            (6.0, TimeBlock::Morning),
            (9.99, TimeBlock::Morning),
            (10.0, TimeBlock::Noon),
            (13.99, TimeBlock::Noon),
            (14.0, TimeBlock::Afternoon),
            (17.99, TimeBlock::Afternoon),
            (18.0, TimeBlock::Evening),
        ];
        for (hour, expected) in cases {
            assert_eq!(TimeBlock::from_hour(hour), expected, "hour {hour}");
        }
    }

    #[test]
    fn hours_wrap() {
        assert_eq!(TimeBlock::from_hour(24.0), TimeBlock::LateNight);
        assert_eq!(TimeBlock::from_hour(30.5), TimeBlock::Morning);
        assert_eq!(TimeBlock::from_hour(-1.0), TimeBlock::Night);
    }

    #[test]
    fn start_hours_round_trip() {
        for &block in TimeBlock::all() {
            assert_eq!(TimeBlock::from_hour(block.start_hour()), block);
        }
    }

    #[test]
    fn every_table_covers_every_block() {
        for &archetype in Archetype::all() {
            let table = archetype.schedule();
            for &block in TimeBlock::all() {
                assert_eq!(
                    table.iter().filter(|e| e.block == block).count(),
                    1,
                    "{archetype:?} {block:?}"
                );
            }
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = resolve(Archetype::Student, 11.0);
        let b = resolve(Archetype::Student, 11.0);
        assert_eq!(a, b);
        assert_eq!(a.room, POTIONS_CLASSROOM);
        assert_eq!(a.mode, MovementMode::Walk);
        assert_eq!(resolve(Archetype::Student, 23.0).mode, MovementMode::Sleep);
    }

    #[test]
    fn missing_block_falls_back_to_first_row() {
        const PARTIAL: &[ScheduleEntry] = &[
            entry(Morning, LIBRARY, Walk),
            entry(Evening, COURTYARD, Wander),
        ];
        assert_eq!(resolve_in(PARTIAL, Evening).map(|e| e.room), Some(COURTYARD));
        assert_eq!(resolve_in(PARTIAL, Night).map(|e| e.room), Some(LIBRARY));
        assert!(resolve_in(&[], Night).is_none());
    }

    #[test]
    fn scheduled_rooms_are_unique() {
        let rooms = scheduled_rooms();
        assert!(rooms.contains(&HOSPITAL_WING));
        let mut deduped = rooms.clone();
        deduped.dedup();
        assert_eq!(rooms, deduped);
    }
}
