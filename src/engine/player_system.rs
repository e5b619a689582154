use super::*;
use crate::constants::POINT_SCORE;

impl<R: RandomSource> GameEngine<R> {
    pub(super) fn update_player(&mut self) {
        if !self.running || self.player.dir == Direction::None {
            return;
        }
        let candidate = self.maze.wrap(self.player.pos + self.player.dir.vector());
        if self.maze.is_wall(candidate) {
            return;
        }

        let occupants: Vec<usize> = self
            .ghosts
            .iter()
            .enumerate()
            .filter(|(_, ghost)| ghost.pos == candidate)
            .map(|(idx, _)| idx)
            .collect();
        if occupants
            .iter()
            .any(|&idx| self.ghosts[idx].state != GhostState::Frightened)
        {
            self.lose_life();
            return;
        }
        if occupants.is_empty() {
            if self.consume_tile(candidate) {
                return;
            }
        } else {
            for idx in occupants {
                self.eat_ghost(idx);
            }
        }
        self.move_player(candidate);
    }

    /// Applies the destination's pickup. Returns true when it cleared the level.
    fn consume_tile(&mut self, pos: Vec2) -> bool {
        let tile = *self.maze.tile_at(pos);
        if tile.default_type == TileType::Energizer {
            let frightened = self.frighten_ghosts();
            self.events.push(GameEvent::EnergizerTaken {
                x: pos.x,
                y: pos.y,
                frightened,
            });
        }
        if !tile.can_interact
            || !matches!(tile.default_type, TileType::Point | TileType::Energizer)
        {
            return false;
        }

        self.maze.tile_at_mut(pos).can_interact = false;
        self.score += POINT_SCORE;
        if tile.default_type == TileType::Point {
            self.events.push(GameEvent::PointEaten { x: pos.x, y: pos.y });
        }
        if self.maze.consume_point() == 0 {
            self.advance_level();
            return true;
        }
        false
    }

    fn move_player(&mut self, to: Vec2) {
        let from = self.player.pos;
        self.player.pos = to;
        self.vacate(from);
        self.maze.paint(to, TileType::PacMan);
        self.queue_render(to);
    }

    fn advance_level(&mut self) {
        let cleared = self.level;
        self.events.push(GameEvent::LevelCleared { level: cleared });
        self.init_level(cleared + 1);
    }

    /// Costs one life and sends the player home; pursuers keep their state.
    pub(super) fn lose_life(&mut self) {
        if self.lives == 0 {
            self.halt(GameOverReason::LivesExhausted);
            return;
        }
        self.lives -= 1;
        if let Some(&token) = self.maze.life_tokens().get(self.lives as usize) {
            self.maze.tile_at_mut(token).can_interact = false;
            self.queue_render(token);
        }
        self.events.push(GameEvent::LifeLost {
            lives_remaining: self.lives,
        });

        let from = self.player.pos;
        self.player = Player::at_spawn();
        self.vacate(from);
        self.maze.paint(PLAYER_SPAWN, TileType::PacMan);
        self.queue_render(PLAYER_SPAWN);

        if self.lives == 0 {
            self.halt(GameOverReason::LivesExhausted);
        }
    }
}
