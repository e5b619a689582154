use crate::types::{GhostKind, Vec2};

pub const TICKS_PER_SECOND: u32 = 60;
pub const TICK_QUANTUM: u64 = 16;

pub const MAZE_WIDTH: i32 = 28;
pub const MAZE_HEIGHT: i32 = 36;
pub const MAX_LIVES: u32 = 3;

pub const FRIGHTENED_DURATION_S: u64 = 6;
pub const EATEN_COOLDOWN_S: u64 = 6;
pub const CHASE_DURATION_S: u64 = 20;

pub const GHOST_EATEN_SCORE: u32 = 10;
pub const POINT_SCORE: u32 = 1;

/// Squared distance beyond which kind D keeps chasing the player.
pub const SHY_CHASE_DISTANCE_SQ: i32 = 64;

pub const PLAYER_SPAWN: Vec2 = Vec2::new(13, 26);
/// Kind A begins each level outside the home region instead of at its spawn.
pub const BLINKY_LEVEL_START: Vec2 = Vec2::new(13, 14);
pub const HOME_RALLY_POINT: Vec2 = Vec2::new(13, 15);

pub const REFERENCE_LAYOUT: [&str; 36] = [
    "                            ",
    "                            ",
    "                            ",
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#@#  #.#   #.##.#   #.#  #@#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###  ### ##.#     ",
    "######.## #      # ##.######",
    "      .   #      #   .      ",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#@..##.......  .......##..@#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
    " ooo                        ",
    "                            ",
];

pub fn ghost_spawn(kind: GhostKind) -> Vec2 {
    match kind {
        GhostKind::Blinky => Vec2::new(13, 16),
        GhostKind::Pinky => Vec2::new(13, 17),
        GhostKind::Inky => Vec2::new(11, 17),
        GhostKind::Clyde => Vec2::new(15, 17),
    }
}

pub fn scatter_corner(kind: GhostKind) -> Vec2 {
    match kind {
        GhostKind::Blinky => Vec2::new(25, 0),
        GhostKind::Pinky => Vec2::new(2, 0),
        GhostKind::Inky => Vec2::new(27, 34),
        GhostKind::Clyde => Vec2::new(0, 34),
    }
}

pub fn level_speed_multiplier(level: u32) -> f64 {
    1.0 + level as f64 * 0.1
}

/// Score a pursuer must reach, on top of the level's starting score, before it leaves home.
pub fn release_offset(kind: GhostKind, speed_multiplier: f64) -> u32 {
    match kind {
        GhostKind::Blinky | GhostKind::Pinky => 0,
        GhostKind::Inky => (30.0 / speed_multiplier).floor() as u32,
        GhostKind::Clyde => (60.0 / speed_multiplier).floor() as u32,
    }
}

/// Scatter and chase durations in seconds for a cycle index. `None` chase means it never ends.
pub fn scatter_chase_durations(cycles_completed: u32, speed_multiplier: f64) -> (u64, Option<u64>) {
    match cycles_completed {
        0 | 1 => (
            (7.0 / speed_multiplier).floor() as u64,
            Some(CHASE_DURATION_S),
        ),
        2 => (
            (5.0 / speed_multiplier).floor() as u64,
            Some(CHASE_DURATION_S),
        ),
        _ => ((5.0 / speed_multiplier).floor() as u64, None),
    }
}

pub fn reference_layout() -> String {
    REFERENCE_LAYOUT.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_layout_rows_match_maze_width() {
        assert_eq!(REFERENCE_LAYOUT.len() as i32, MAZE_HEIGHT);
        for row in REFERENCE_LAYOUT {
            assert_eq!(row.len() as i32, MAZE_WIDTH);
        }
    }

    #[test]
    fn scatter_shrinks_with_level_speed() {
        assert_eq!(
            scatter_chase_durations(0, level_speed_multiplier(0)),
            (7, Some(20))
        );
        assert_eq!(
            scatter_chase_durations(1, level_speed_multiplier(5)),
            (4, Some(20))
        );
        assert_eq!(
            scatter_chase_durations(2, level_speed_multiplier(0)),
            (5, Some(20))
        );
        assert_eq!(
            scatter_chase_durations(3, level_speed_multiplier(0)),
            (5, None)
        );
        assert_eq!(
            scatter_chase_durations(7, level_speed_multiplier(0)),
            (5, None)
        );
    }

    #[test]
    fn later_kinds_release_at_higher_scores() {
        let multiplier = level_speed_multiplier(0);
        assert_eq!(release_offset(GhostKind::Blinky, multiplier), 0);
        assert_eq!(release_offset(GhostKind::Pinky, multiplier), 0);
        assert_eq!(release_offset(GhostKind::Inky, multiplier), 30);
        assert_eq!(release_offset(GhostKind::Clyde, multiplier), 60);
        assert_eq!(
            release_offset(GhostKind::Clyde, level_speed_multiplier(1)),
            54
        );
    }
}
