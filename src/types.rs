use std::ops::{Add, Sub};

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Multiplies both components and floors the result, so negative steps round away from zero.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: (self.x as f64 * factor).floor() as i32,
            y: (self.y as f64 * factor).floor() as i32,
        }
    }

    pub fn distance_sq(self, other: Vec2) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Out-of-range components reappear on the opposite edge.
    pub fn wrap(self, width: i32, height: i32) -> Self {
        Self {
            x: wrap_axis(self.x, width - 1),
            y: wrap_axis(self.y, height - 1),
        }
    }
}

fn wrap_axis(value: i32, max: i32) -> i32 {
    if value < 0 {
        max
    } else if value > max {
        0
    } else {
        value
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Enumeration order used for tie-breaking in pursuer steering.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0, -1),
            Direction::Down => Vec2::new(0, 1),
            Direction::Left => Vec2::new(-1, 0),
            Direction::Right => Vec2::new(1, 0),
            Direction::None => Vec2::new(0, 0),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostKind {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostKind {
    /// Fixed per-tick update order.
    pub const ALL: [GhostKind; 4] = [
        GhostKind::Blinky,
        GhostKind::Pinky,
        GhostKind::Inky,
        GhostKind::Clyde,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tile_type(self) -> TileType {
        match self {
            GhostKind::Blinky => TileType::Blinky,
            GhostKind::Pinky => TileType::Pinky,
            GhostKind::Inky => TileType::Inky,
            GhostKind::Clyde => TileType::Clyde,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Dormant,
    Scatter,
    Chase,
    Frightened,
}

impl GhostState {
    pub fn is_active(self) -> bool {
        self != GhostState::Dormant
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Empty,
    Wall,
    Point,
    Energizer,
    LifeToken,
    PacMan,
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl TileType {
    pub fn is_consumable(self) -> bool {
        matches!(
            self,
            TileType::Point | TileType::Energizer | TileType::LifeToken
        )
    }

    pub fn ghost_kind(self) -> Option<GhostKind> {
        match self {
            TileType::Blinky => Some(GhostKind::Blinky),
            TileType::Pinky => Some(GhostKind::Pinky),
            TileType::Inky => Some(GhostKind::Inky),
            TileType::Clyde => Some(GhostKind::Clyde),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileColor {
    Background,
    Wall,
    Point,
    Energizer,
    LifeToken,
    Player,
    Ghost(GhostKind),
}

impl TileColor {
    pub fn hex(self) -> &'static str {
        match self {
            TileColor::Background => "#41454d",
            TileColor::Wall => "#290fd4",
            TileColor::Point => "#ffffff",
            TileColor::Energizer => "#0fd478",
            TileColor::LifeToken => "#b30c28",
            TileColor::Player => "#f0d807",
            TileColor::Ghost(GhostKind::Blinky) => "#e81515",
            TileColor::Ghost(GhostKind::Pinky) => "#e815a2",
            TileColor::Ghost(GhostKind::Inky) => "#15bed1",
            TileColor::Ghost(GhostKind::Clyde) => "#d67f15",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.hex()[1..];
        let channel = |offset: usize| u8::from_str_radix(&hex[offset..offset + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RenderUpdate {
    pub x: i32,
    pub y: i32,
    pub color: TileColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Move(Direction),
    Quit,
    Restart,
    /// The frontend's surface changed; everything is repainted on the next frame.
    Resize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    LivesExhausted,
    Quit,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub kind: GhostKind,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub state: GhostState,
    #[serde(rename = "targetX")]
    pub target_x: i32,
    #[serde(rename = "targetY")]
    pub target_y: i32,
    #[serde(rename = "releaseThreshold")]
    pub release_threshold: u32,
    #[serde(rename = "cyclesCompleted")]
    pub cycles_completed: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PointEaten {
        x: i32,
        y: i32,
    },
    EnergizerTaken {
        x: i32,
        y: i32,
        frightened: usize,
    },
    GhostReleased {
        kind: GhostKind,
    },
    GhostStateChanged {
        kind: GhostKind,
        from: GhostState,
        to: GhostState,
    },
    GhostEaten {
        kind: GhostKind,
    },
    LifeLost {
        #[serde(rename = "livesRemaining")]
        lives_remaining: u32,
    },
    LevelCleared {
        level: u32,
    },
    GameOver {
        reason: GameOverReason,
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub running: bool,
    #[serde(rename = "remainingPoints")]
    pub remaining_points: u32,
    #[serde(rename = "speedMultiplier")]
    pub speed_multiplier: f64,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    #[serde(rename = "ticksPlayed")]
    pub ticks_played: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_moves_to_opposite_edge() {
        assert_eq!(Vec2::new(-1, 5).wrap(28, 36), Vec2::new(27, 5));
        assert_eq!(Vec2::new(28, 5).wrap(28, 36), Vec2::new(0, 5));
        assert_eq!(Vec2::new(3, -2).wrap(28, 36), Vec2::new(3, 35));
        assert_eq!(Vec2::new(3, 36).wrap(28, 36), Vec2::new(3, 0));
        assert_eq!(Vec2::new(3, 4).wrap(28, 36), Vec2::new(3, 4));
    }

    #[test]
    fn scale_floors_toward_negative_infinity() {
        assert_eq!(Vec2::new(1, 0).scale(1.1), Vec2::new(1, 0));
        assert_eq!(Vec2::new(-1, 0).scale(1.1), Vec2::new(-2, 0));
        assert_eq!(Vec2::new(0, 1).scale(1.0), Vec2::new(0, 1));
        assert_eq!(Vec2::new(2, -3).scale(2.0), Vec2::new(4, -6));
    }

    #[test]
    fn distance_is_squared_euclidean() {
        assert_eq!(Vec2::new(0, 0).distance_sq(Vec2::new(3, 4)), 25);
        assert_eq!(Vec2::new(5, 5).distance_sq(Vec2::new(5, 5)), 0);
    }

    #[test]
    fn reverse_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.reverse().reverse(), dir);
            assert_eq!(dir.reverse().vector(), Vec2::new(0, 0) - dir.vector());
        }
        assert_eq!(Direction::None.reverse(), Direction::None);
    }

    #[test]
    fn tile_colors_parse_to_rgb() {
        assert_eq!(TileColor::Background.rgb(), (0x41, 0x45, 0x4d));
        assert_eq!(TileColor::Ghost(GhostKind::Inky).rgb(), (0x15, 0xbe, 0xd1));
    }

    #[test]
    fn parse_move_rejects_unknown_direction() {
        assert_eq!(Direction::parse_move("up"), Some(Direction::Up));
        assert_eq!(Direction::parse_move("diagonal"), None);
    }
}
