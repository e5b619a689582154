use std::str::FromStr;

use serde::Serialize;

use crate::constants::{MAZE_HEIGHT, MAZE_WIDTH, TICKS_PER_SECOND, TICK_QUANTUM};

pub const DEFAULT_SEED: u32 = 0x1234_5678;

/// Startup configuration. Copied into the engine and never changed mid-run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Coarse clock units per wall-clock second; pursuer timers count in these units.
    pub ticks_per_second: u32,
    /// Clock units between two logic ticks.
    pub tick_quantum: u64,
    pub width: i32,
    pub height: i32,
    pub seed: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: TICKS_PER_SECOND,
            tick_quantum: TICK_QUANTUM,
            width: MAZE_WIDTH,
            height: MAZE_HEIGHT,
            seed: DEFAULT_SEED,
        }
    }
}

impl GameConfig {
    /// Defaults overridden by `PACMAN_*` environment variables. A missing seed is drawn at random.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let ticks_per_second = parse_or(&lookup, "PACMAN_TICKS_PER_SECOND", TICKS_PER_SECOND);
        let tick_quantum = parse_or(&lookup, "PACMAN_TICK_QUANTUM", TICK_QUANTUM);
        Self {
            ticks_per_second: ticks_per_second.max(1),
            tick_quantum: tick_quantum.max(1),
            width: defaults.width,
            height: defaults.height,
            seed: parse_or(&lookup, "PACMAN_SEED", rand::random::<u32>()),
        }
    }

    pub fn with_overrides(
        mut self,
        ticks_per_second: Option<u32>,
        tick_quantum: Option<u64>,
        seed: Option<u32>,
    ) -> Self {
        if let Some(value) = ticks_per_second {
            self.ticks_per_second = value.max(1);
        }
        if let Some(value) = tick_quantum {
            self.tick_quantum = value.max(1);
        }
        if let Some(value) = seed {
            self.seed = value;
        }
        self
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: T) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_instance() {
        let config = GameConfig::default();
        assert_eq!(config.ticks_per_second, 60);
        assert_eq!(config.tick_quantum, 16);
        assert_eq!((config.width, config.height), (28, 36));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = GameConfig::from_lookup(lookup_from(&[
            ("PACMAN_TICKS_PER_SECOND", "30"),
            ("PACMAN_TICK_QUANTUM", " 8 "),
            ("PACMAN_SEED", "42"),
        ]));
        assert_eq!(config.ticks_per_second, 30);
        assert_eq!(config.tick_quantum, 8);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = GameConfig::from_lookup(lookup_from(&[
            ("PACMAN_TICKS_PER_SECOND", "fast"),
            ("PACMAN_TICK_QUANTUM", "0"),
        ]));
        assert_eq!(config.ticks_per_second, 60);
        assert_eq!(config.tick_quantum, 1);
    }

    #[test]
    fn cli_overrides_win() {
        let config = GameConfig::default().with_overrides(Some(120), None, Some(7));
        assert_eq!(config.ticks_per_second, 120);
        assert_eq!(config.tick_quantum, 16);
        assert_eq!(config.seed, 7);
    }
}
