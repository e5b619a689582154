use std::io;
use std::time::Duration;

use tokio::time::Instant;

use crate::engine::GameEngine;
use crate::rng::RandomSource;
use crate::types::{GameEvent, InputAction, RenderUpdate};

/// HUD values handed to the frontend once per presented frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStatus {
    pub clock: u64,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub running: bool,
}

/// Rendering and input collaborator. Receives copies only, never references into live state.
pub trait Frontend {
    fn render_tile(&mut self, update: RenderUpdate) -> io::Result<()>;

    /// Must match the maze dimensions.
    fn window_dimensions(&self) -> (i32, i32);

    fn poll_input(&mut self) -> io::Result<Vec<InputAction>> {
        Ok(Vec::new())
    }

    fn game_events(&mut self, _clock: u64, _events: &[GameEvent]) {}

    fn present(&mut self, _status: &FrameStatus) -> io::Result<()> {
        Ok(())
    }
}

/// Fixed-timestep driver: a coarse clock advanced per frame and a due threshold advanced per tick.
#[derive(Clone, Debug)]
pub struct TickScheduler {
    clock: u64,
    next_due: u64,
    tick_quantum: u64,
    ticks_per_second: u32,
    ticks: u64,
}

impl TickScheduler {
    pub fn new(ticks_per_second: u32, tick_quantum: u64) -> Self {
        Self {
            clock: 0,
            next_due: 0,
            tick_quantum: tick_quantum.max(1),
            ticks_per_second: ticks_per_second.max(1),
            ticks: 0,
        }
    }

    pub fn for_engine<R: RandomSource>(engine: &GameEngine<R>) -> Self {
        Self::new(engine.config.ticks_per_second, engine.config.tick_quantum)
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Logic ticks executed since the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reset(&mut self) {
        self.clock = 0;
        self.next_due = 0;
        self.ticks = 0;
    }

    /// Wall-clock length of one coarse clock unit.
    pub fn clock_unit(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.ticks_per_second as u64)
    }

    pub fn handle_input<R: RandomSource>(
        &mut self,
        engine: &mut GameEngine<R>,
        action: InputAction,
    ) {
        match action {
            InputAction::Move(dir) => engine.set_player_direction(dir),
            InputAction::Quit => engine.quit(),
            InputAction::Restart => {
                if engine.restart() {
                    self.reset();
                }
            }
            InputAction::Resize => engine.request_full_redraw(),
        }
    }

    /// Runs every tick due at `clock` with the engine's timestamp set to that clock.
    pub fn catch_up<R: RandomSource>(&mut self, engine: &mut GameEngine<R>) -> u64 {
        let mut executed = 0;
        while engine.is_running() && self.clock > self.next_due {
            engine.step(self.clock);
            self.next_due += self.tick_quantum;
            self.ticks += 1;
            executed += 1;
        }
        executed
    }

    /// One presented frame: inputs, clock advance by `elapsed` units, catch-up ticks, render flush.
    /// Returns the number of clock units until the next tick is due.
    pub fn run_frame<R, F>(
        &mut self,
        engine: &mut GameEngine<R>,
        frontend: &mut F,
        elapsed: u64,
    ) -> io::Result<u64>
    where
        R: RandomSource,
        F: Frontend,
    {
        check_dimensions(engine, frontend)?;
        for action in frontend.poll_input()? {
            self.handle_input(engine, action);
        }

        self.clock += elapsed;
        self.catch_up(engine);

        let events = engine.drain_events();
        if !events.is_empty() {
            frontend.game_events(self.clock, &events);
        }
        for update in engine.drain_render_updates() {
            frontend.render_tile(update)?;
        }
        frontend.present(&FrameStatus {
            clock: self.clock,
            score: engine.score(),
            lives: engine.lives(),
            level: engine.level(),
            running: engine.is_running(),
        })?;

        Ok((self.next_due + 1).saturating_sub(self.clock))
    }

    /// Paces frames against the wall clock until the engine halts.
    pub async fn run<R, F>(
        &mut self,
        engine: &mut GameEngine<R>,
        frontend: &mut F,
    ) -> io::Result<()>
    where
        R: RandomSource,
        F: Frontend,
    {
        check_dimensions(engine, frontend)?;
        let unit = self.clock_unit();
        let origin = Instant::now();
        let base = self.clock;

        while engine.is_running() {
            let wall_units = (origin.elapsed().as_nanos() / unit.as_nanos().max(1)) as u64;
            let elapsed = (base + wall_units).saturating_sub(self.clock).max(1);
            let frame_started = Instant::now();
            let wait = self.run_frame(engine, frontend, elapsed)?;
            match pacing_delay(unit, wait, frame_started.elapsed()) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => tokio::task::yield_now().await,
            }
        }
        Ok(())
    }
}

/// Time left before the next tick boundary once the frame itself has cost `spent`.
/// `None` means the boundary has already passed.
fn pacing_delay(unit: Duration, wait_units: u64, spent: Duration) -> Option<Duration> {
    let units = u32::try_from(wait_units).unwrap_or(u32::MAX);
    let budget = unit.saturating_mul(units);
    budget.checked_sub(spent).filter(|delay| !delay.is_zero())
}

fn check_dimensions<R: RandomSource, F: Frontend>(
    engine: &GameEngine<R>,
    frontend: &F,
) -> io::Result<()> {
    let expected = engine.dimensions();
    let actual = frontend.window_dimensions();
    if actual != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "frontend reports {}x{} cells but the maze is {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::engine::tests::make_engine;
    use crate::types::{Direction, GameOverReason, TileColor, Vec2};

    #[derive(Default)]
    struct RecordingFrontend {
        dimensions: (i32, i32),
        rendered: Vec<RenderUpdate>,
        frames: Vec<FrameStatus>,
        events: Vec<GameEvent>,
        inputs: VecDeque<Vec<InputAction>>,
    }

    impl RecordingFrontend {
        fn new() -> Self {
            Self {
                dimensions: (28, 36),
                ..Self::default()
            }
        }

        fn with_inputs(inputs: Vec<Vec<InputAction>>) -> Self {
            Self {
                inputs: inputs.into(),
                ..Self::new()
            }
        }
    }

    impl Frontend for RecordingFrontend {
        fn render_tile(&mut self, update: RenderUpdate) -> io::Result<()> {
            self.rendered.push(update);
            Ok(())
        }

        fn window_dimensions(&self) -> (i32, i32) {
            self.dimensions
        }

        fn poll_input(&mut self) -> io::Result<Vec<InputAction>> {
            Ok(self.inputs.pop_front().unwrap_or_default())
        }

        fn game_events(&mut self, _clock: u64, events: &[GameEvent]) {
            self.events.extend_from_slice(events);
        }

        fn present(&mut self, status: &FrameStatus) -> io::Result<()> {
            self.frames.push(*status);
            Ok(())
        }
    }

    #[test]
    fn first_unit_of_clock_runs_tick_one() {
        let mut engine = make_engine();
        let mut frontend = RecordingFrontend::new();
        let mut scheduler = TickScheduler::new(60, 16);

        let wait = scheduler.run_frame(&mut engine, &mut frontend, 1).unwrap();
        assert_eq!(scheduler.ticks(), 1);
        assert_eq!(engine.now(), 1);
        assert_eq!(wait, 16);
        assert_eq!(
            engine.ghost(crate::types::GhostKind::Blinky).state,
            crate::types::GhostState::Scatter
        );
    }

    #[test]
    fn slow_frame_catches_up_every_due_tick() {
        let mut engine = make_engine();
        let mut frontend = RecordingFrontend::new();
        let mut scheduler = TickScheduler::new(60, 16);

        let wait = scheduler.run_frame(&mut engine, &mut frontend, 16).unwrap();
        assert_eq!(wait, 1);
        assert_eq!(scheduler.ticks(), 1);

        let wait = scheduler.run_frame(&mut engine, &mut frontend, 50).unwrap();
        assert_eq!(scheduler.clock(), 66);
        assert_eq!(scheduler.ticks(), 5);
        assert_eq!(wait, 15);
        assert_eq!(frontend.frames.len(), 2);
    }

    #[test]
    fn pacing_sleeps_only_for_the_unspent_budget() {
        let unit = Duration::from_millis(10);
        assert_eq!(
            pacing_delay(unit, 3, Duration::from_millis(5)),
            Some(Duration::from_millis(25))
        );
        assert_eq!(pacing_delay(unit, 1, Duration::from_millis(10)), None);
        assert_eq!(pacing_delay(unit, 1, Duration::from_millis(40)), None);
    }

    #[test]
    fn frame_without_due_tick_only_flushes() {
        let mut engine = make_engine();
        let mut frontend = RecordingFrontend::new();
        let mut scheduler = TickScheduler::new(60, 16);
        scheduler.run_frame(&mut engine, &mut frontend, 1).unwrap();
        frontend.rendered.clear();

        let wait = scheduler.run_frame(&mut engine, &mut frontend, 3).unwrap();
        assert_eq!(scheduler.ticks(), 1);
        assert_eq!(wait, 13);
        assert!(frontend.rendered.is_empty());
    }

    #[test]
    fn render_updates_arrive_in_enqueue_order() {
        let mut engine = make_engine();
        let mut frontend =
            RecordingFrontend::with_inputs(vec![vec![InputAction::Move(Direction::Left)]]);
        let mut scheduler = TickScheduler::new(60, 16);
        scheduler.run_frame(&mut engine, &mut frontend, 1).unwrap();

        let cells = 28 * 36;
        assert!(frontend.rendered.len() > cells);
        assert_eq!((frontend.rendered[0].x, frontend.rendered[0].y), (0, 0));
        let last = frontend.rendered.last().map(|u| (u.x, u.y, u.color));
        assert_eq!(last, Some((12, 26, TileColor::Player)));
        assert_eq!(engine.player().pos, Vec2::new(12, 26));
        assert_eq!(frontend.frames[0].score, 1);
    }

    #[test]
    fn mismatched_window_is_rejected_before_any_tick() {
        let mut engine = make_engine();
        let mut frontend = RecordingFrontend::new();
        frontend.dimensions = (40, 30);
        let mut scheduler = TickScheduler::new(60, 16);

        let err = scheduler.run_frame(&mut engine, &mut frontend, 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(engine.now(), 0);
        assert_eq!(scheduler.ticks(), 0);
        assert!(frontend.rendered.is_empty());
    }

    #[test]
    fn halted_engine_stops_catch_up() {
        let mut engine = make_engine();
        let mut frontend = RecordingFrontend::with_inputs(vec![vec![InputAction::Quit]]);
        let mut scheduler = TickScheduler::new(60, 16);

        scheduler.run_frame(&mut engine, &mut frontend, 100).unwrap();
        assert_eq!(scheduler.ticks(), 0);
        assert!(!frontend.frames[0].running);
        let quit = frontend.events.iter().any(|event| match event {
            GameEvent::GameOver { reason, .. } => *reason == GameOverReason::Quit,
            _ => false,
        });
        assert!(quit);
    }

    #[test]
    fn restart_resets_clock_only_when_halted() {
        let mut engine = make_engine();
        let mut scheduler = TickScheduler::new(60, 16);
        let mut frontend = RecordingFrontend::new();
        scheduler.run_frame(&mut engine, &mut frontend, 40).unwrap();

        scheduler.handle_input(&mut engine, InputAction::Restart);
        assert_eq!(scheduler.clock(), 40);

        scheduler.handle_input(&mut engine, InputAction::Quit);
        scheduler.handle_input(&mut engine, InputAction::Restart);
        assert!(engine.is_running());
        assert_eq!(scheduler.clock(), 0);
        assert_eq!(scheduler.ticks(), 0);
    }

    #[test]
    fn resize_requests_full_redraw() {
        let mut engine = make_engine();
        engine.drain_render_updates();
        let mut scheduler = TickScheduler::new(60, 16);
        scheduler.handle_input(&mut engine, InputAction::Resize);
        assert_eq!(engine.drain_render_updates().len(), 28 * 36);
    }

    #[tokio::test]
    async fn run_paces_until_quit() {
        let mut engine = make_engine();
        let mut inputs = vec![Vec::new(); 5];
        inputs.push(vec![InputAction::Quit]);
        let mut frontend = RecordingFrontend::with_inputs(inputs);
        let mut scheduler = TickScheduler::new(1_000, 2);

        scheduler.run(&mut engine, &mut frontend).await.unwrap();
        assert_eq!(engine.end_reason(), Some(GameOverReason::Quit));
        assert_eq!(frontend.frames.len(), 6);
        assert!(scheduler.ticks() >= 1);
        assert!(frontend.rendered.len() >= 28 * 36);
    }
}
