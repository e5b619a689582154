use crate::config::GameConfig;
use crate::constants::{
    ghost_spawn, level_speed_multiplier, reference_layout, release_offset, scatter_corner,
    BLINKY_LEVEL_START, MAX_LIVES, PLAYER_SPAWN,
};
use crate::maze::Maze;
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Direction, GameEvent, GameOverReason, GameSummary, GhostKind, GhostState, GhostView,
    PlayerView, RenderUpdate, Snapshot, TileType, Vec2,
};

mod ghost_system;
mod player_system;
mod utils;

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub dir: Direction,
}

impl Player {
    fn at_spawn() -> Self {
        Self {
            pos: PLAYER_SPAWN,
            dir: Direction::None,
        }
    }
}

/// Pursuer record. Timestamps are coarse clock values; `None` means it never happened.
#[derive(Clone, Debug)]
pub struct Ghost {
    pub kind: GhostKind,
    pub pos: Vec2,
    pub dir: Direction,
    pub state: GhostState,
    pub target: Vec2,
    pub release_threshold: u32,
    pub last_frightened: Option<u64>,
    pub last_eaten: Option<u64>,
    pub last_chase: Option<u64>,
    pub last_scatter: Option<u64>,
    pub cycles_completed: u32,
}

impl Ghost {
    fn new(kind: GhostKind, release_threshold: u32) -> Self {
        let pos = match kind {
            GhostKind::Blinky => BLINKY_LEVEL_START,
            _ => ghost_spawn(kind),
        };
        Self {
            kind,
            pos,
            dir: Direction::Left,
            state: GhostState::Dormant,
            target: scatter_corner(kind),
            release_threshold,
            last_frightened: None,
            last_eaten: None,
            last_chase: None,
            last_scatter: None,
            cycles_completed: 0,
        }
    }

    fn view(&self) -> GhostView {
        GhostView {
            kind: self.kind,
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            state: self.state,
            target_x: self.target.x,
            target_y: self.target.y,
            release_threshold: self.release_threshold,
            cycles_completed: self.cycles_completed,
        }
    }
}

/// The whole simulation context. Owned by the scheduler and mutated one tick at a time.
#[derive(Clone, Debug)]
pub struct GameEngine<R: RandomSource = Rng> {
    pub config: GameConfig,

    layout: String,
    maze: Maze,
    player: Player,
    ghosts: Vec<Ghost>,
    rng: R,

    score: u32,
    lives: u32,
    level: u32,
    speed_multiplier: f64,

    now: u64,
    ticks_played: u64,
    running: bool,
    end_reason: Option<GameOverReason>,
    render_queue: Vec<RenderUpdate>,
    events: Vec<GameEvent>,
}

impl GameEngine<Rng> {
    pub fn new(config: GameConfig) -> Self {
        let rng = Rng::new(config.seed);
        Self::with_layout(config, &reference_layout(), rng)
    }
}

impl<R: RandomSource> GameEngine<R> {
    pub fn with_layout(config: GameConfig, layout: &str, rng: R) -> Self {
        let maze = Maze::parse(layout, config.width, config.height, MAX_LIVES);
        let mut engine = Self {
            config,
            layout: layout.to_string(),
            maze,
            player: Player::at_spawn(),
            ghosts: Vec::new(),
            rng,
            score: 0,
            lives: 0,
            level: 0,
            speed_multiplier: level_speed_multiplier(0),
            now: 0,
            ticks_played: 0,
            running: true,
            end_reason: None,
            render_queue: Vec::new(),
            events: Vec::new(),
        };
        engine.start_fresh();
        engine
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghost(&self, kind: GhostKind) -> &Ghost {
        &self.ghosts[kind.index()]
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.maze.width(), self.maze.height())
    }

    /// One logic tick at coarse clock value `now`: pursuers in fixed order, then the player.
    pub fn step(&mut self, now: u64) {
        if !self.running {
            return;
        }
        self.now = now;
        self.ticks_played += 1;
        self.update_ghosts();
        self.update_player();
    }

    pub fn set_player_direction(&mut self, dir: Direction) {
        self.player.dir = dir;
    }

    pub fn quit(&mut self) {
        self.halt(GameOverReason::Quit);
    }

    /// Starts over from level 0 with a freshly parsed maze. Only acts while halted.
    pub fn restart(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.start_fresh();
        true
    }

    pub fn request_full_redraw(&mut self) {
        let updates: Vec<RenderUpdate> = self
            .maze
            .cells()
            .map(|(pos, tile)| RenderUpdate {
                x: pos.x,
                y: pos.y,
                color: tile.color(),
            })
            .collect();
        self.render_queue.extend(updates);
    }

    pub fn drain_render_updates(&mut self) -> Vec<RenderUpdate> {
        std::mem::take(&mut self.render_queue)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn build_snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.now,
            score: self.score,
            lives: self.lives,
            level: self.level,
            running: self.running,
            remaining_points: self.maze.remaining_points(),
            speed_multiplier: self.speed_multiplier(),
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                dir: self.player.dir,
            },
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason,
            score: self.score,
            level: self.level,
            lives: self.lives,
            ticks_played: self.ticks_played,
        }
    }

    fn start_fresh(&mut self) {
        self.maze = Maze::parse(
            &self.layout,
            self.config.width,
            self.config.height,
            MAX_LIVES,
        );
        self.lives = self.maze.life_tokens().len() as u32;
        self.score = 0;
        self.now = 0;
        self.ticks_played = 0;
        self.running = true;
        self.end_reason = None;
        self.events.clear();
        self.init_level(0);
    }

    fn init_level(&mut self, level: u32) {
        self.level = level;
        self.speed_multiplier = level_speed_multiplier(level);
        self.render_queue.clear();

        self.maze.reset_to_defaults();
        let spent_tokens: Vec<Vec2> = self
            .maze
            .life_tokens()
            .iter()
            .skip(self.lives as usize)
            .copied()
            .collect();
        for token in spent_tokens {
            self.maze.tile_at_mut(token).can_interact = false;
        }

        let score = self.score;
        let multiplier = self.speed_multiplier;
        self.ghosts = GhostKind::ALL
            .iter()
            .map(|&kind| {
                let threshold = score + release_offset(kind, multiplier);
                Ghost::new(kind, threshold)
            })
            .collect();
        self.player = Player::at_spawn();

        self.maze.paint(self.player.pos, TileType::PacMan);
        for ghost in &self.ghosts {
            self.maze.paint(ghost.pos, ghost.kind.tile_type());
        }
        self.request_full_redraw();
    }

    fn halt(&mut self, reason: GameOverReason) {
        if !self.running {
            return;
        }
        self.running = false;
        self.end_reason = Some(reason);
        self.events.push(GameEvent::GameOver {
            reason,
            score: self.score,
        });
    }

    fn queue_render(&mut self, pos: Vec2) {
        let pos = self.maze.wrap(pos);
        let color = self.maze.tile_at(pos).color();
        self.render_queue.push(RenderUpdate {
            x: pos.x,
            y: pos.y,
            color,
        });
    }

    /// Restores `pos` to its background and repaints whichever entity is still standing there.
    fn vacate(&mut self, pos: Vec2) {
        self.maze.restore_default(pos);
        if self.player.pos == pos {
            self.maze.paint(pos, TileType::PacMan);
        } else if let Some(ghost) = self.ghosts.iter().find(|ghost| ghost.pos == pos) {
            self.maze.paint(pos, ghost.kind.tile_type());
        }
        self.queue_render(pos);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::constants::{MAZE_HEIGHT, MAZE_WIDTH};
    use crate::types::TileColor;

    /// Replays a fixed list of integers, falling back to `min` when exhausted.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct ScriptedRandom {
        values: VecDeque<i32>,
    }

    impl ScriptedRandom {
        pub(crate) fn new(values: &[i32]) -> Self {
            Self {
                values: values.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn int(&mut self, min: i32, max: i32) -> i32 {
            let value = self.values.pop_front().unwrap_or(min);
            value.clamp(min, max.max(min))
        }
    }

    pub(crate) fn make_engine() -> GameEngine<ScriptedRandom> {
        GameEngine::with_layout(
            GameConfig::default(),
            &reference_layout(),
            ScriptedRandom::default(),
        )
    }

    #[test]
    fn level_zero_starts_from_reference_state() {
        let engine = make_engine();
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.level(), 0);
        assert!(engine.is_running());
        assert_eq!(engine.player().pos, Vec2::new(13, 26));
        assert_eq!(engine.player().dir, Direction::None);
        assert_eq!(engine.maze().remaining_points(), 240);

        let blinky = engine.ghost(GhostKind::Blinky);
        assert_eq!(blinky.pos, Vec2::new(13, 14));
        assert_eq!(blinky.state, GhostState::Dormant);
        assert_eq!(blinky.dir, Direction::Left);
        assert_eq!(blinky.last_eaten, None);
        assert_eq!(engine.ghost(GhostKind::Inky).release_threshold, 30);
        assert_eq!(engine.ghost(GhostKind::Clyde).release_threshold, 60);
    }

    #[test]
    fn level_start_paints_entities_and_queues_full_redraw() {
        let mut engine = make_engine();
        assert_eq!(
            engine.maze().tile_at(Vec2::new(13, 26)).tile_type,
            TileType::PacMan
        );
        assert_eq!(
            engine.maze().tile_at(Vec2::new(11, 17)).tile_type,
            TileType::Inky
        );

        let updates = engine.drain_render_updates();
        assert_eq!(updates.len() as i32, MAZE_WIDTH * MAZE_HEIGHT);
        assert!(updates
            .iter()
            .any(|u| u.x == 13 && u.y == 26 && u.color == TileColor::Player));
        assert!(engine.drain_render_updates().is_empty());
    }

    #[test]
    fn halted_engine_ignores_ticks() {
        let mut engine = make_engine();
        engine.quit();
        assert!(!engine.is_running());
        assert_eq!(engine.end_reason(), Some(GameOverReason::Quit));

        engine.step(1);
        assert_eq!(engine.now(), 0);
        assert_eq!(engine.ghost(GhostKind::Blinky).state, GhostState::Dormant);
    }

    #[test]
    fn restart_only_acts_while_halted() {
        let mut engine = make_engine();
        engine.score = 42;
        assert!(!engine.restart());
        assert_eq!(engine.score(), 42);

        engine.lives = 0;
        engine.halt(GameOverReason::LivesExhausted);
        assert!(engine.restart());
        assert!(engine.is_running());
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.end_reason(), None);
    }

    #[test]
    fn game_over_event_is_recorded_once() {
        let mut engine = make_engine();
        engine.quit();
        engine.quit();
        let game_overs = engine
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn snapshot_reflects_live_state() {
        let mut engine = make_engine();
        engine.set_player_direction(Direction::Left);
        engine.step(1);
        let snapshot = engine.build_snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.player.x, 12);
        assert_eq!(snapshot.score, 1);
        assert_eq!(snapshot.ghosts.len(), 4);
        assert_eq!(snapshot.remaining_points, 239);
        assert_eq!(snapshot.speed_multiplier, 1.0);

        let summary = engine.build_summary();
        assert_eq!(summary.ticks_played, 1);
        assert_eq!(summary.reason, None);
    }
}
