use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::GameEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub event: String,
    #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

#[derive(Debug)]
pub enum LogTarget {
    Stderr,
    File(BufWriter<File>),
    Memory(Vec<String>),
    Disabled,
}

/// One JSON object per line. Write failures are swallowed; logs never stop the game.
#[derive(Debug)]
pub struct Logger {
    target: LogTarget,
    run_id: Option<String>,
    scenario: Option<String>,
    seed: Option<u32>,
}

impl Logger {
    pub fn new(target: LogTarget, run_id: Option<String>) -> Self {
        Self {
            target,
            run_id,
            scenario: None,
            seed: None,
        }
    }

    pub fn stderr(run_id: Option<String>) -> Self {
        Self::new(LogTarget::Stderr, run_id)
    }

    pub fn to_file(path: &Path, run_id: Option<String>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(LogTarget::File(BufWriter::new(file)), run_id))
    }

    pub fn disabled() -> Self {
        Self::new(LogTarget::Disabled, None)
    }

    pub fn in_memory() -> Self {
        Self::new(LogTarget::Memory(Vec::new()), None)
    }

    /// Tags subsequent lines with a scenario name and seed.
    pub fn set_scenario(&mut self, scenario: &str, seed: u32) {
        self.scenario = Some(scenario.to_string());
        self.seed = Some(seed);
    }

    pub fn lines(&self) -> &[String] {
        match &self.target {
            LogTarget::Memory(lines) => lines,
            _ => &[],
        }
    }

    pub fn info(&mut self, event: &str, tick: Option<u64>, details: Value) {
        self.emit(LogLevel::Info, event, tick, details);
    }

    pub fn warn(&mut self, event: &str, tick: Option<u64>, details: Value) {
        self.emit(LogLevel::Warn, event, tick, details);
    }

    pub fn error(&mut self, event: &str, tick: Option<u64>, details: Value) {
        self.emit(LogLevel::Error, event, tick, details);
    }

    /// Logs a drained engine event under its own `type` name. Point pickups are skipped.
    pub fn log_game_event(&mut self, tick: u64, event: &GameEvent) {
        if matches!(event, GameEvent::PointEaten { .. }) {
            return;
        }
        let Ok(mut details) = serde_json::to_value(event) else {
            return;
        };
        let name = details
            .as_object_mut()
            .and_then(|fields| fields.remove("type"))
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "game_event".to_string());
        self.info(&name, Some(tick), details);
    }

    pub fn flush(&mut self) {
        if let LogTarget::File(writer) = &mut self.target {
            let _ = writer.flush();
        }
    }

    fn emit(&mut self, level: LogLevel, event: &str, tick: Option<u64>, details: Value) {
        if matches!(self.target, LogTarget::Disabled) {
            return;
        }
        let line = StructuredLogLine {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            event: event.to_string(),
            run_id: self.run_id.clone(),
            scenario: self.scenario.clone(),
            seed: self.seed,
            tick,
            details,
        };
        let Ok(encoded) = serde_json::to_string(&line) else {
            return;
        };
        match &mut self.target {
            LogTarget::Stderr => eprintln!("{encoded}"),
            LogTarget::File(writer) => {
                let _ = writeln!(writer, "{encoded}");
            }
            LogTarget::Memory(lines) => lines.push(encoded),
            LogTarget::Disabled => {}
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{GameOverReason, GhostKind, GhostState};

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn lines_carry_level_event_and_context() {
        let mut logger = Logger::new(LogTarget::Memory(Vec::new()), Some("run-1".to_string()));
        logger.set_scenario("solo", 9);
        logger.warn("anomaly", Some(12), json!({ "message": "ghost on wall" }));

        let line = parse(&logger.lines()[0]);
        assert_eq!(line["level"], "warn");
        assert_eq!(line["event"], "anomaly");
        assert_eq!(line["runId"], "run-1");
        assert_eq!(line["scenario"], "solo");
        assert_eq!(line["seed"], 9);
        assert_eq!(line["tick"], 12);
        assert_eq!(line["details"]["message"], "ghost on wall");
        assert!(line["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let mut logger = Logger::in_memory();
        logger.info("started", None, json!({}));
        let line = parse(&logger.lines()[0]);
        assert!(line.get("runId").is_none());
        assert!(line.get("tick").is_none());
        assert!(line.get("scenario").is_none());
    }

    #[test]
    fn game_events_use_their_type_as_event_name() {
        let mut logger = Logger::in_memory();
        logger.log_game_event(
            40,
            &GameEvent::GhostStateChanged {
                kind: GhostKind::Inky,
                from: GhostState::Scatter,
                to: GhostState::Chase,
            },
        );
        logger.log_game_event(41, &GameEvent::PointEaten { x: 1, y: 4 });
        logger.log_game_event(
            42,
            &GameEvent::GameOver {
                reason: GameOverReason::LivesExhausted,
                score: 88,
            },
        );

        assert_eq!(logger.lines().len(), 2);
        let changed = parse(&logger.lines()[0]);
        assert_eq!(changed["event"], "ghost_state_changed");
        assert_eq!(changed["details"]["kind"], "inky");
        assert_eq!(changed["details"]["to"], "chase");
        assert!(changed["details"].get("type").is_none());
        let over = parse(&logger.lines()[1]);
        assert_eq!(over["details"]["reason"], "lives_exhausted");
    }

    #[test]
    fn disabled_logger_records_nothing() {
        let mut logger = Logger::disabled();
        logger.error("boom", None, json!({}));
        assert!(logger.lines().is_empty());
    }
}
