use clap::Parser;
use chrono::{DateTime, SecondsFormat, Utc};
use pacman_tick_engine::config::GameConfig;
use pacman_tick_engine::constants::MAX_LIVES;
use pacman_tick_engine::engine::GameEngine;
use pacman_tick_engine::logging::Logger;
use pacman_tick_engine::rng::{RandomSource, Rng};
use pacman_tick_engine::scheduler::{FrameStatus, Frontend, TickScheduler};
use pacman_tick_engine::types::{Direction, GameEvent, InputAction, RenderUpdate, Snapshot};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    seed: Option<u32>,
    /// Initial facing for the autopilot: up, down, left or right.
    #[arg(long)]
    opening: Option<String>,
    #[arg(long)]
    ticks_per_second: Option<u32>,
    #[arg(long)]
    tick_quantum: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    minutes: u32,
    seed: u32,
    #[serde(rename = "turnChance")]
    turn_chance: f32,
    opening: Direction,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventCounts {
    #[serde(rename = "pointsEaten")]
    points_eaten: u32,
    energizers: u32,
    #[serde(rename = "ghostsReleased")]
    ghosts_released: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    minutes: u32,
    reason: String,
    score: u32,
    level: u32,
    lives: u32,
    #[serde(rename = "ticksPlayed")]
    ticks_played: u64,
    frames: u64,
    renders: u64,
    #[serde(flatten)]
    counts: EventCounts,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicksPlayed")]
    average_ticks_played: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

/// Frontend without a screen: counts renders and tallies drained game events.
struct HeadlessFrontend<'a> {
    logger: &'a mut Logger,
    dimensions: (i32, i32),
    renders: u64,
    frames: u64,
    counts: EventCounts,
}

impl Frontend for HeadlessFrontend<'_> {
    fn render_tile(&mut self, _update: RenderUpdate) -> io::Result<()> {
        self.renders += 1;
        Ok(())
    }

    fn window_dimensions(&self) -> (i32, i32) {
        self.dimensions
    }

    fn game_events(&mut self, clock: u64, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::PointEaten { .. } => self.counts.points_eaten += 1,
                GameEvent::EnergizerTaken { .. } => self.counts.energizers += 1,
                GameEvent::GhostReleased { .. } => self.counts.ghosts_released += 1,
                GameEvent::GhostEaten { .. } => self.counts.ghosts_eaten += 1,
                GameEvent::LifeLost { .. } => self.counts.lives_lost += 1,
                GameEvent::LevelCleared { .. } => self.counts.levels_cleared += 1,
                _ => {}
            }
            self.logger.log_game_event(clock, event);
        }
    }

    fn present(&mut self, _status: &FrameStatus) -> io::Result<()> {
        self.frames += 1;
        Ok(())
    }
}

/// Keeps its facing until blocked, then turns toward a random open direction.
struct Autopilot {
    rng: Rng,
    turn_chance: f32,
}

impl Autopilot {
    fn choose<R: RandomSource>(&mut self, engine: &GameEngine<R>) -> Option<Direction> {
        let player = engine.player();
        let maze = engine.maze();
        let open: Vec<Direction> = Direction::CARDINALS
            .into_iter()
            .filter(|dir| !maze.is_wall(maze.wrap(player.pos + dir.vector())))
            .collect();
        if open.is_empty() {
            return None;
        }
        let blocked = !open.contains(&player.dir);
        if blocked || self.rng.bool(self.turn_chance) {
            return Some(open[self.rng.pick_index(open.len())]);
        }
        None
    }
}

fn main() {
    let cli = Cli::parse();
    let config =
        GameConfig::from_env().with_overrides(cli.ticks_per_second, cli.tick_quantum, None);
    let scenarios = resolve_scenarios(&cli, &config);
    let started_at = Utc::now();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, started_at));
    let mut logger = Logger::stderr(Some(run_id.clone()));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        logger.set_scenario(&scenario.name, scenario.seed);
        logger.info(
            "scenario_started",
            None,
            json!({
                "minutes": scenario.minutes,
                "turnChance": scenario.turn_chance,
                "opening": scenario.opening,
                "config": config,
            }),
        );
        let scenario_run = match run_scenario(&scenario, &config, &mut logger) {
            Ok(run) => run,
            Err(error) => {
                logger.error(
                    "scenario_failed",
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            logger.warn(
                "anomaly_detected",
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks_played;
        *reason_counts
            .entry(scenario_run.result.reason.clone())
            .or_insert(0) += 1;

        logger.info(
            "scenario_finished",
            Some(scenario_run.finished_tick),
            json!({
                "reason": scenario_run.result.reason,
                "score": scenario_run.result.score,
                "level": scenario_run.result.level,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        if let Ok(line) = serde_json::to_string(&scenario_run.result) {
            println!("{line}");
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id,
        started_at,
        Utc::now(),
        scenario_results,
        reason_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            logger.error(
                "summary_write_failed",
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    logger.info(
        "run_finished",
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicksPlayed": summary.average_ticks_played,
            "reasonCounts": summary.reason_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(
    scenario: &Scenario,
    base_config: &GameConfig,
    logger: &mut Logger,
) -> io::Result<ScenarioRunResult> {
    let config = GameConfig {
        seed: scenario.seed,
        ..base_config.clone()
    };
    let clock_limit = scenario.minutes as u64 * 60 * config.ticks_per_second as u64;
    let mut engine = GameEngine::new(config);
    let mut scheduler = TickScheduler::for_engine(&engine);
    let mut autopilot = Autopilot {
        rng: Rng::new(scenario.seed ^ 0x9e37_79b9),
        turn_chance: scenario.turn_chance,
    };
    let mut frontend = HeadlessFrontend {
        dimensions: engine.dimensions(),
        logger,
        renders: 0,
        frames: 0,
        counts: EventCounts::default(),
    };

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous_score = 0u32;
    let mut elapsed = 1u64;
    scheduler.handle_input(&mut engine, InputAction::Move(scenario.opening));

    while engine.is_running() {
        if let Some(dir) = autopilot.choose(&engine) {
            scheduler.handle_input(&mut engine, InputAction::Move(dir));
        }
        elapsed = scheduler.run_frame(&mut engine, &mut frontend, elapsed)?.max(1);

        let snapshot = engine.build_snapshot();
        for message in collect_anomalies(&engine, &snapshot, previous_score) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        previous_score = snapshot.score;

        if scheduler.clock() >= clock_limit {
            break;
        }
    }

    let summary = engine.build_summary();
    let reason = summary
        .reason
        .and_then(|reason| serde_json::to_value(reason).ok())
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| "time_limit".to_string());

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            minutes: scenario.minutes,
            reason,
            score: summary.score,
            level: summary.level,
            lives: summary.lives,
            ticks_played: summary.ticks_played,
            frames: frontend.frames,
            renders: frontend.renders,
            counts: frontend.counts,
            anomalies,
        },
        anomaly_records,
        finished_tick: engine.now(),
    })
}

fn collect_anomalies<R: RandomSource>(
    engine: &GameEngine<R>,
    snapshot: &Snapshot,
    previous_score: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    for ghost in engine.ghosts() {
        if engine.maze().is_wall(ghost.pos) {
            anomalies.push(format!("ghost on wall: {:?}", ghost.kind));
        }
    }
    if engine.maze().is_wall(engine.player().pos) {
        anomalies.push("player on wall".to_string());
    }
    if snapshot.lives > MAX_LIVES {
        anomalies.push(format!("lives out of range: {}", snapshot.lives));
    }
    if snapshot.score < previous_score {
        anomalies.push(format!(
            "score decreased: {previous_score} -> {}",
            snapshot.score
        ));
    }
    if snapshot.remaining_points > engine.maze().total_points() {
        anomalies.push(format!(
            "remaining points exceed total: {}/{}",
            snapshot.remaining_points,
            engine.maze().total_points()
        ));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli, config: &GameConfig) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or(config.seed);
    let opening = cli
        .opening
        .as_deref()
        .and_then(Direction::parse_move)
        .unwrap_or(Direction::Left);

    if cli.single || cli.minutes.is_some() {
        let minutes = cli.minutes.unwrap_or(2).clamp(1, 30);
        return vec![Scenario {
            name: format!("custom-{minutes}m"),
            minutes,
            seed,
            turn_chance: 0.1,
            opening,
        }];
    }

    vec![
        Scenario {
            name: "quick-check".to_string(),
            minutes: 1,
            seed,
            turn_chance: 0.1,
            opening,
        },
        Scenario {
            name: "wanderer".to_string(),
            minutes: 5,
            seed: seed.wrapping_add(1),
            turn_chance: 0.35,
            opening: opening.reverse(),
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, started_at: DateTime<Utc>) -> String {
    format!("sim-{seed}-{}", started_at.timestamp_millis())
}

fn build_run_summary(
    run_id: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks_played = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        run_id,
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        scenario_count,
        anomaly_count,
        average_ticks_played,
        reason_counts,
        scenarios,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
