//! Movement system - advances every character by one tick

use hecs::{Entity, World};
use marauder_logic::footsteps::Footstep;
use marauder_logic::movement::{advance_character, Advance, Character, TickEnv};
use marauder_logic::pathfinding::Navigator;
use rand::Rng;

/// What one pass of [`movement_system`] produced.
#[derive(Debug, Default)]
pub struct MovementOutcome {
    /// Characters whose position changed.
    pub moved: usize,
    /// New footprints, in character id order.
    pub footsteps: Vec<Footstep>,
}

/// Advance every character.
///
/// All updates are computed from the pre-tick state and then written back
/// together, so no character sees another's move from the same tick.
/// Characters are visited in id order to keep seeded runs reproducible.
pub fn movement_system(
    world: &mut World,
    env: &TickEnv<'_>,
    nav: &mut Navigator,
    rng: &mut impl Rng,
) -> MovementOutcome {
    let mut updates: Vec<(Entity, bool, Advance)> = Vec::with_capacity(64);

    // Collect updates (can't mutate while iterating)
    {
        let mut query = world.query::<&Character>();
        let mut current: Vec<(Entity, &Character)> = query.iter().collect();
        current.sort_by_key(|(_, c)| c.id);
        for (entity, character) in current {
            let advance = advance_character(character, env, nav, rng);
            let moved = advance.moved(character);
            updates.push((entity, moved, advance));
        }
    }

    // Apply updates
    let mut outcome = MovementOutcome::default();
    for (entity, moved, advance) in updates {
        if moved {
            outcome.moved += 1;
        }
        if let Some(step) = advance.footstep {
            outcome.footsteps.push(step);
        }
        if let Ok(mut c) = world.get::<&mut Character>(entity) {
            *c = advance.character;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use marauder_logic::config::Tuning;
    use marauder_logic::geometry::{Room, RoomIndex, WorldPos};
    use marauder_logic::grid::build_grid;
    use marauder_logic::schedule::Archetype;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (RoomIndex, Navigator) {
        let room = Room::new("potions_classroom", "Potions", 20.0, 20.0, 50.0, 50.0);
        let grid = build_grid(100.0, 100.0, 10.0, std::slice::from_ref(&room));
        (RoomIndex::new(vec![room]), Navigator::new(grid))
    }

    #[test]
    fn updates_every_character() {
        let (rooms, mut nav) = setup();
        let mut world = World::new();
        let a = world.spawn((Character::new(2, "b", Archetype::Student, WorldPos::new(3.0, 3.0)),));
        let b = world.spawn((Character::new(1, "a", Archetype::Student, WorldPos::new(97.0, 92.0)),));
        let env = TickEnv {
            rooms: &rooms,
            time_of_day: 11.0,
            now_ms: 16.0,
            tuning: Tuning {
                cell_size: 10.0,
                ..Tuning::default()
            },
        };
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = movement_system(&mut world, &env, &mut nav, &mut rng);
        assert_eq!(outcome.moved, 2);
        assert_eq!(outcome.footsteps.len(), 2);
        // Footsteps come back in id order.
        assert_eq!(outcome.footsteps[0].character_id, 1);
        assert_eq!(outcome.footsteps[1].character_id, 2);

        for entity in [a, b] {
            let c = world.get::<&Character>(entity).unwrap();
            assert_eq!(c.target_room.as_deref(), Some("potions_classroom"));
            assert!(c.has_path());
        }
    }

    #[test]
    fn empty_world_is_a_no_op() {
        let (rooms, mut nav) = setup();
        let mut world = World::new();
        let env = TickEnv {
            rooms: &rooms,
            time_of_day: 11.0,
            now_ms: 16.0,
            tuning: Tuning::default(),
        };
        let outcome = movement_system(&mut world, &env, &mut nav, &mut StdRng::seed_from_u64(1));
        assert_eq!(outcome.moved, 0);
        assert!(outcome.footsteps.is_empty());
    }
}
