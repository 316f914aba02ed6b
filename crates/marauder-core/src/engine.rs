//! Simulation engine - main entry point for running the simulation

use hecs::{Entity, World};
use log::{info, trace, warn};
use marauder_logic::clock::SimClock;
use marauder_logic::config::{validate_config, ConfigError, SimConfig};
use marauder_logic::footsteps::FootstepTrail;
use marauder_logic::geometry::{RoomIndex, Severity, WorldPos};
use marauder_logic::grid::build_grid;
use marauder_logic::layout::{CastMember, MapLayout};
use marauder_logic::movement::{Character, TickEnv};
use marauder_logic::pathfinding::Navigator;
use marauder_logic::schedule::{resolve, Archetype};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::frame::{CharacterView, Frame};
use crate::persistence::{load_simulation, save_simulation, SaveData, SaveError, SAVE_VERSION};
use crate::systems::movement_system;

/// Why an engine could not be built.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid config: {}", join(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error("invalid layout: {}", .0.join("; "))]
    InvalidLayout(Vec<String>),
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Counters from one [`SimulationEngine::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub moved: usize,
    pub footsteps_emitted: usize,
    pub footsteps_pruned: usize,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world holding one entity per character
    pub world: World,
    config: SimConfig,
    layout: MapLayout,
    rooms: RoomIndex,
    navigator: Navigator,
    clock: SimClock,
    footsteps: FootstepTrail,
    rng: StdRng,
    next_id: u32,
    tick_count: u64,
}

impl SimulationEngine {
    /// Validate `config` and `layout`, then build the grid and an empty world.
    ///
    /// Layout warnings, and schedule entries naming rooms the layout lacks,
    /// are logged but accepted: affected characters simply hold position.
    pub fn new(config: SimConfig, layout: MapLayout) -> Result<Self, EngineError> {
        let config_errors = validate_config(&config);
        if !config_errors.is_empty() {
            return Err(EngineError::InvalidConfig(config_errors));
        }

        let mut layout_errors = Vec::new();
        for problem in layout.validate() {
            match problem.severity {
                Severity::Error => layout_errors.push(problem.message),
                Severity::Warning => warn!("[{}] {}", problem.category, problem.message),
            }
        }
        if !layout_errors.is_empty() {
            return Err(EngineError::InvalidLayout(layout_errors));
        }

        let grid = build_grid(
            layout.world_width,
            layout.world_height,
            config.cell_size,
            &layout.rooms,
        );
        info!(
            "engine ready: {} rooms, {}×{} grid, {} walkable cells",
            layout.rooms.len(),
            grid.width(),
            grid.height(),
            grid.walkable_count()
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            world: World::new(),
            rooms: layout.room_index(),
            navigator: Navigator::with_cache(grid, config.path_cache_capacity),
            clock: SimClock::new(config.start_hour, config.time_scale),
            footsteps: FootstepTrail::new(config.footstep_fade_ms, config.max_footsteps),
            rng,
            next_id: 0,
            tick_count: 0,
            config,
            layout,
        })
    }

    /// Spawn a character at the centre of the room its schedule names for
    /// the current hour (the map centre if that room is missing).
    pub fn spawn_character(&mut self, name: impl Into<String>, archetype: Archetype) -> Entity {
        let entry = resolve(archetype, self.clock.time_of_day);
        let position = match self.rooms.get(entry.room) {
            Some(room) => room.center(),
            None => WorldPos::new(self.layout.world_width / 2.0, self.layout.world_height / 2.0),
        };
        let id = self.next_id;
        self.next_id += 1;

        let mut character = Character::new(id, name, archetype, position);
        character.mode = entry.mode;
        self.world.spawn((character,))
    }

    /// Spawn every member of a cast, in order.
    pub fn spawn_cast(&mut self, cast: &[CastMember]) -> Vec<Entity> {
        let entities: Vec<Entity> = cast
            .iter()
            .map(|m| self.spawn_character(m.name.clone(), m.archetype))
            .collect();
        info!("spawned {} characters", entities.len());
        entities
    }

    /// Advance the simulation by `delta_ms` of real time and move every
    /// character one step. The caller decides how often to call this.
    pub fn tick(&mut self, delta_ms: f64) -> TickSummary {
        self.clock.advance(delta_ms);
        self.tick_count += 1;

        let env = TickEnv {
            rooms: &self.rooms,
            time_of_day: self.clock.time_of_day,
            now_ms: self.clock.elapsed_ms,
            tuning: self.config.tuning(),
        };
        let outcome = movement_system(&mut self.world, &env, &mut self.navigator, &mut self.rng);

        let footsteps_emitted = outcome.footsteps.len();
        for step in outcome.footsteps {
            self.footsteps.push(step);
        }
        let footsteps_pruned = self.footsteps.prune(self.clock.elapsed_ms);

        trace!(
            "tick {}: {} moved, {} footsteps (+{} -{})",
            self.tick_count,
            outcome.moved,
            self.footsteps.len(),
            footsteps_emitted,
            footsteps_pruned
        );

        TickSummary {
            moved: outcome.moved,
            footsteps_emitted,
            footsteps_pruned,
        }
    }

    /// All characters, sorted by id.
    pub fn characters(&self) -> Vec<Character> {
        let mut characters: Vec<Character> = self
            .world
            .query::<&Character>()
            .iter()
            .map(|(_, c)| c.clone())
            .collect();
        characters.sort_by_key(|c| c.id);
        characters
    }

    pub fn character(&self, id: u32) -> Option<Character> {
        self.world
            .query::<&Character>()
            .iter()
            .find(|(_, c)| c.id == id)
            .map(|(_, c)| c.clone())
    }

    pub fn character_count(&self) -> usize {
        self.world.query::<&Character>().iter().count()
    }

    pub fn footsteps(&self) -> &FootstepTrail {
        &self.footsteps
    }

    /// Renderer view of the current instant.
    pub fn frame(&self) -> Frame {
        Frame {
            elapsed_ms: self.clock.elapsed_ms,
            time_of_day: self.clock.time_of_day,
            block: self.clock.block(),
            day: self.clock.day(),
            characters: self
                .characters()
                .iter()
                .map(|c| CharacterView::new(c, &self.rooms))
                .collect(),
            footsteps: self.footsteps.visible(self.clock.elapsed_ms),
        }
    }

    /// Get current hour of day (0-24)
    pub fn time_of_day(&self) -> f32 {
        self.clock.time_of_day
    }

    /// Jump to an hour. Characters re-plan on the next tick if their
    /// schedule entry changes.
    pub fn set_time_of_day(&mut self, hour: f32) {
        self.clock.set_time_of_day(hour);
    }

    /// Set time scale in simulated hours per real second
    pub fn set_time_scale(&mut self, scale: f32) {
        self.clock.set_time_scale(scale);
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }

    pub fn rooms(&self) -> &RoomIndex {
        &self.rooms
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Capture the mutable state.
    pub fn snapshot(&self) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            config: self.config.clone(),
            clock: self.clock,
            characters: self.characters(),
            footsteps: self.footsteps.clone(),
            next_id: self.next_id,
            tick_count: self.tick_count,
        }
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        save_simulation(writer, &self.snapshot())?;
        info!(
            "saved {} characters at tick {}",
            self.character_count(),
            self.tick_count
        );
        Ok(())
    }

    /// Rebuild an engine from a snapshot and the layout it was running on.
    ///
    /// A seeded run reseeds from `seed` and the saved tick count, so two
    /// loads of one snapshot replay identically.
    pub fn load<R: std::io::Read>(reader: R, layout: MapLayout) -> Result<Self, SaveError> {
        let data = load_simulation(reader)?;
        let mut engine = Self::new(data.config, layout)?;

        engine.clock = data.clock;
        engine.footsteps = data.footsteps;
        engine.next_id = data.next_id;
        engine.tick_count = data.tick_count;
        if let Some(seed) = engine.config.seed {
            engine.rng = StdRng::seed_from_u64(seed ^ data.tick_count);
        }
        for character in data.characters {
            engine.world.spawn((character,));
        }

        info!(
            "loaded {} characters at tick {}",
            engine.character_count(),
            engine.tick_count
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marauder_logic::geometry::Room;
    use marauder_logic::layout::default_cast;
    use marauder_logic::schedule::{MovementMode, TimeBlock};

    fn seeded(seed: u64) -> SimConfig {
        SimConfig {
            seed: Some(seed),
            ..SimConfig::default()
        }
    }

    fn castle_engine() -> SimulationEngine {
        let mut engine = SimulationEngine::new(seeded(7), MapLayout::castle()).unwrap();
        engine.spawn_cast(&default_cast());
        engine
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimConfig {
            cell_size: -1.0,
            ..SimConfig::default()
        };
        match SimulationEngine::new(config, MapLayout::castle()) {
            Err(EngineError::InvalidConfig(errors)) => {
                assert!(errors.contains(&ConfigError::CellSize(-1.0)))
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("accepted a negative cell size"),
        }
    }

    #[test]
    fn rejects_duplicate_room_ids() {
        let mut layout = MapLayout::castle();
        let dup = layout.rooms[0].clone();
        layout.rooms.push(Room { x: 300.0, y: 560.0, width: 20.0, height: 20.0, ..dup });
        assert!(matches!(
            SimulationEngine::new(SimConfig::default(), layout),
            Err(EngineError::InvalidLayout(_))
        ));
    }

    #[test]
    fn accepts_layout_missing_a_scheduled_room() {
        let mut layout = MapLayout::castle();
        layout.rooms.retain(|r| r.id != "library");
        let mut engine = SimulationEngine::new(seeded(1), layout).unwrap();
        engine.spawn_cast(&default_cast());
        for _ in 0..10 {
            engine.tick(16.0);
        }
        assert_eq!(engine.character_count(), 8);
    }

    #[test]
    fn cast_spawns_in_scheduled_rooms() {
        let engine = castle_engine();
        assert_eq!(engine.character_count(), 8);
        let characters = engine.characters();
        let ids: Vec<u32> = characters.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        for c in &characters {
            let entry = resolve(c.archetype, engine.time_of_day());
            let room = engine.rooms().get(entry.room).unwrap();
            assert_eq!(c.position, room.center(), "{}", c.name);
            assert_eq!(c.mode, entry.mode);
        }
    }

    #[test]
    fn tick_advances_clock() {
        let mut engine = castle_engine();
        let start = engine.time_of_day();
        for _ in 0..100 {
            engine.tick(10.0);
        }
        assert_eq!(engine.clock().elapsed_ms, 1000.0);
        let expected = start + engine.config().time_scale;
        assert!((engine.time_of_day() - expected).abs() < 1e-4);
        assert_eq!(engine.tick_count(), 100);
    }

    #[test]
    fn schedule_change_moves_the_cast() {
        let mut engine = castle_engine();
        // 11:00: students leave the great hall for potions.
        engine.set_time_of_day(11.0);
        engine.set_time_scale(0.0);
        let mut moved_total = 0;
        let mut emitted_total = 0;
        for _ in 0..200 {
            let summary = engine.tick(16.0);
            moved_total += summary.moved;
            emitted_total += summary.footsteps_emitted;
        }
        assert!(moved_total > 0);
        assert!(emitted_total > 0);

        let harry = engine.character(0).unwrap();
        assert_eq!(harry.target_room.as_deref(), Some("potions_classroom"));
        assert_eq!(harry.mode, MovementMode::Walk);
    }

    #[test]
    fn footsteps_fade_out_of_the_trail() {
        let mut engine = castle_engine();
        engine.set_time_of_day(11.0);
        engine.set_time_scale(0.0);
        for _ in 0..100 {
            engine.tick(16.0);
        }
        assert!(!engine.footsteps().is_empty());

        // One long frame ages every earlier footprint past the fade window.
        let fade = engine.config().footstep_fade_ms;
        let summary = engine.tick(fade + 1000.0);
        assert!(summary.footsteps_pruned > 0);
        let now = engine.clock().elapsed_ms;
        assert!(engine
            .footsteps()
            .iter()
            .all(|s| now - s.created_ms <= fade));
    }

    #[test]
    fn frame_reflects_state() {
        let mut engine = castle_engine();
        engine.set_time_of_day(11.0);
        for _ in 0..30 {
            engine.tick(16.0);
        }
        let frame = engine.frame();
        assert_eq!(frame.characters.len(), 8);
        assert_eq!(frame.block, TimeBlock::Noon);
        assert_eq!(frame.footsteps.len(), engine.footsteps().len());
        assert!(frame.footsteps.iter().all(|f| (0.0..=1.0).contains(&f.opacity)));
        let json = frame.to_json().unwrap();
        assert!(json.contains("\"characters\""));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut a = castle_engine();
        let mut b = castle_engine();
        for _ in 0..300 {
            a.tick(16.0);
            b.tick(16.0);
        }
        assert_eq!(a.characters(), b.characters());
    }

    #[test]
    fn time_controls_clamp() {
        let mut engine = castle_engine();
        engine.set_time_of_day(30.0);
        assert!((engine.time_of_day() - 6.0).abs() < 1e-5);
        engine.set_time_scale(-2.0);
        assert_eq!(engine.clock().time_scale, 0.0);
    }
}
