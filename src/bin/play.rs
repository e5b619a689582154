use std::io::{self, stdout, BufWriter, Stdout, Write};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use pacman_tick_engine::config::GameConfig;
use pacman_tick_engine::engine::GameEngine;
use pacman_tick_engine::logging::Logger;
use pacman_tick_engine::scheduler::{FrameStatus, Frontend, TickScheduler};
use pacman_tick_engine::types::{
    Direction, GameEvent, GameOverReason, InputAction, RenderUpdate, TileColor,
};
use serde_json::json;

const HUD_ROWS: u16 = 1;
const HALTED_POLL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    ticks_per_second: Option<u32>,
    #[arg(long)]
    tick_quantum: Option<u64>,
    /// Structured logs go here; stderr is unusable while the alternate screen is up.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Draws every cell as two block characters below a one-line HUD.
struct TerminalFrontend<'a> {
    out: BufWriter<Stdout>,
    logger: &'a mut Logger,
    dimensions: (i32, i32),
}

impl<'a> TerminalFrontend<'a> {
    fn new(logger: &'a mut Logger, dimensions: (i32, i32)) -> io::Result<Self> {
        let mut out = BufWriter::new(stdout());
        terminal::enable_raw_mode()?;
        out.execute(terminal::EnterAlternateScreen)?;
        out.execute(cursor::Hide)?;
        out.execute(terminal::Clear(terminal::ClearType::All))?;
        Ok(Self {
            out,
            logger,
            dimensions,
        })
    }

    fn status_line(&mut self, text: &str) -> io::Result<()> {
        let row = self.dimensions.1.max(0) as u16 + HUD_ROWS;
        self.out.queue(cursor::MoveTo(0, row))?;
        self.out.queue(style::SetForegroundColor(Color::White))?;
        self.out.queue(Print(text))?;
        self.out.queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
        Ok(())
    }
}

impl Drop for TerminalFrontend<'_> {
    fn drop(&mut self) {
        let _ = self.out.execute(style::ResetColor);
        let _ = self.out.execute(cursor::Show);
        let _ = self.out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Frontend for TerminalFrontend<'_> {
    fn render_tile(&mut self, update: RenderUpdate) -> io::Result<()> {
        let (r, g, b) = update.color.rgb();
        let column = (update.x.max(0) * 2) as u16;
        let row = update.y.max(0) as u16 + HUD_ROWS;
        self.out.queue(cursor::MoveTo(column, row))?;
        self.out.queue(style::SetForegroundColor(Color::Rgb { r, g, b }))?;
        self.out.queue(Print("██"))?;
        Ok(())
    }

    fn window_dimensions(&self) -> (i32, i32) {
        self.dimensions
    }

    fn poll_input(&mut self) -> io::Result<Vec<InputAction>> {
        let mut actions = Vec::new();
        while event::poll(Duration::ZERO)? {
            if let Some(action) = translate_event(&mut self.out, event::read()?)? {
                actions.push(action);
            }
        }
        Ok(actions)
    }

    fn game_events(&mut self, clock: u64, events: &[GameEvent]) {
        for event in events {
            self.logger.log_game_event(clock, event);
        }
    }

    fn present(&mut self, status: &FrameStatus) -> io::Result<()> {
        let (r, g, b) = TileColor::Player.rgb();
        self.out.queue(cursor::MoveTo(0, 0))?;
        self.out.queue(style::SetForegroundColor(Color::Rgb { r, g, b }))?;
        self.out.queue(Print(format!(
            "SCORE {:<6} LEVEL {:<3} LIVES {}",
            status.score, status.level, status.lives
        )))?;
        self.out.queue(terminal::Clear(terminal::ClearType::UntilNewLine))?;
        if status.running {
            self.status_line("wasd/arrows move  q quit")?;
        } else {
            self.status_line("GAME OVER  space restart  q quit")?;
        }
        self.out.queue(style::ResetColor)?;
        self.out.flush()
    }
}

/// A resize wipes the whole screen so the redraw that follows leaves no stale cells behind.
fn translate_event<W: Write>(out: &mut W, event: Event) -> io::Result<Option<InputAction>> {
    match event {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) => Ok(map_key(code, modifiers)),
        Event::Resize(_, _) => {
            out.queue(terminal::Clear(terminal::ClearType::All))?;
            Ok(Some(InputAction::Resize))
        }
        _ => Ok(None),
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<InputAction> {
    let action = match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => InputAction::Quit,
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => InputAction::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            InputAction::Move(Direction::Down)
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            InputAction::Move(Direction::Left)
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            InputAction::Move(Direction::Right)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => InputAction::Quit,
        KeyCode::Char(' ') => InputAction::Restart,
        _ => return None,
    };
    Some(action)
}

/// Runs games back to back until the player quits.
async fn play(
    scheduler: &mut TickScheduler,
    engine: &mut GameEngine,
    frontend: &mut TerminalFrontend<'_>,
) -> io::Result<()> {
    loop {
        scheduler.run(engine, frontend).await?;
        // Flush the final tick's updates and the game-over line.
        scheduler.run_frame(engine, frontend, 0)?;

        let summary = engine.build_summary();
        frontend
            .logger
            .info("game_finished", Some(engine.now()), json!(summary));
        if engine.end_reason() == Some(GameOverReason::Quit) {
            return Ok(());
        }

        'halted: loop {
            for action in frontend.poll_input()? {
                match action {
                    InputAction::Quit => return Ok(()),
                    InputAction::Restart | InputAction::Resize => {
                        scheduler.handle_input(engine, action);
                        scheduler.run_frame(engine, frontend, 0)?;
                    }
                    InputAction::Move(_) => {}
                }
                if engine.is_running() {
                    frontend.logger.info("game_restarted", None, json!({}));
                    break 'halted;
                }
            }
            tokio::time::sleep(HALTED_POLL).await;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config =
        GameConfig::from_env().with_overrides(cli.ticks_per_second, cli.tick_quantum, cli.seed);
    let run_id = format!("play-{}-{}", config.seed, Utc::now().timestamp_millis());
    let mut logger = match cli.log_file.as_deref() {
        Some(path) => Logger::to_file(path, Some(run_id))?,
        None => Logger::disabled(),
    };
    logger.info("session_started", None, json!({ "config": config }));

    let mut engine = GameEngine::new(config);
    let mut scheduler = TickScheduler::for_engine(&engine);
    let result = {
        let mut frontend = TerminalFrontend::new(&mut logger, engine.dimensions())?;
        play(&mut scheduler, &mut engine, &mut frontend).await
    };

    match &result {
        Ok(()) => logger.info("session_finished", None, json!(engine.build_summary())),
        Err(error) => logger.error(
            "session_failed",
            None,
            json!({ "error": error.to_string() }),
        ),
    }
    result
}
