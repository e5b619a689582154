use crate::constants::{scatter_corner, SHY_CHASE_DISTANCE_SQ};
use crate::types::{GhostKind, Vec2};

use super::Player;

pub(super) fn ticks_since(now: u64, stamp: Option<u64>) -> u64 {
    stamp.map_or(0, |at| now.saturating_sub(at))
}

pub(super) fn in_home_region(pos: Vec2) -> bool {
    (11..=16).contains(&pos.x) && (16..=18).contains(&pos.y)
}

/// Corridor cells flanking the home region where pursuers may not turn upward.
pub(super) fn is_red_zone(pos: Vec2) -> bool {
    (10..=17).contains(&pos.x) && (pos.y == 14 || pos.y == 26)
}

pub(super) fn chase_target(
    kind: GhostKind,
    ghost_pos: Vec2,
    player: &Player,
    leader_pos: Vec2,
) -> Vec2 {
    let facing = player.dir.vector();
    match kind {
        GhostKind::Blinky => player.pos,
        GhostKind::Pinky => player.pos + facing.scale(4.0),
        GhostKind::Inky => {
            let pivot = player.pos + facing.scale(2.0);
            leader_pos + (pivot - leader_pos).scale(2.0)
        }
        GhostKind::Clyde => {
            if ghost_pos.distance_sq(player.pos) > SHY_CHASE_DISTANCE_SQ {
                player.pos
            } else {
                scatter_corner(GhostKind::Clyde)
            }
        }
    }
}
