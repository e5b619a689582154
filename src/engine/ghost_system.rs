use super::utils::{chase_target, in_home_region, is_red_zone, ticks_since};
use super::*;
use crate::constants::{
    scatter_chase_durations, EATEN_COOLDOWN_S, FRIGHTENED_DURATION_S, GHOST_EATEN_SCORE,
    HOME_RALLY_POINT,
};

impl<R: RandomSource> GameEngine<R> {
    pub(super) fn update_ghosts(&mut self) {
        for kind in GhostKind::ALL {
            let idx = kind.index();
            let old_pos = self.ghosts[idx].pos;
            self.update_ghost_state(idx);
            self.update_ghost_position(idx);
            self.update_ghost_marker(idx, old_pos);
        }
    }

    /// Every energized pursuer turns Frightened; Dormant ones are left alone.
    pub(super) fn frighten_ghosts(&mut self) -> usize {
        let now = self.now;
        let mut frightened = 0;
        for ghost in &mut self.ghosts {
            if !ghost.state.is_active() {
                continue;
            }
            if matches!(ghost.state, GhostState::Scatter | GhostState::Chase) {
                ghost.dir = ghost.dir.reverse();
                self.events.push(GameEvent::GhostStateChanged {
                    kind: ghost.kind,
                    from: ghost.state,
                    to: GhostState::Frightened,
                });
            }
            ghost.state = GhostState::Frightened;
            ghost.last_frightened = Some(now);
            frightened += 1;
        }
        frightened
    }

    pub(super) fn eat_ghost(&mut self, idx: usize) {
        let ghost = &mut self.ghosts[idx];
        let old_pos = ghost.pos;
        let kind = ghost.kind;
        ghost.state = GhostState::Dormant;
        ghost.dir = Direction::None;
        ghost.pos = ghost_spawn(kind);
        ghost.last_eaten = Some(self.now);

        self.score += GHOST_EATEN_SCORE;
        self.events.push(GameEvent::GhostEaten { kind });
        self.vacate(old_pos);
        self.maze.paint(ghost_spawn(kind), kind.tile_type());
        self.queue_render(ghost_spawn(kind));
    }

    fn update_ghost_state(&mut self, idx: usize) {
        let now = self.now;
        let tps = self.config.ticks_per_second as u64;
        let multiplier = self.speed_multiplier;
        let ghost = &mut self.ghosts[idx];
        if ghost.release_threshold > self.score {
            return;
        }
        let previous = ghost.state;

        match ghost.state {
            GhostState::Dormant => {
                let cooled_down = ghost.last_eaten.is_none()
                    || ticks_since(now, ghost.last_eaten) >= EATEN_COOLDOWN_S * tps;
                if cooled_down {
                    ghost.state = GhostState::Scatter;
                    ghost.last_scatter = Some(now);
                    self.events.push(GameEvent::GhostReleased { kind: ghost.kind });
                }
                return;
            }
            GhostState::Frightened => {
                let elapsed = ticks_since(now, ghost.last_frightened);
                if elapsed <= FRIGHTENED_DURATION_S * tps {
                    return;
                }
                ghost.last_scatter = ghost.last_scatter.map(|at| at + elapsed);
                ghost.last_chase = ghost.last_chase.map(|at| at + elapsed);
                ghost.state = GhostState::Scatter;
            }
            GhostState::Scatter | GhostState::Chase => {}
        }

        let (scatter_s, chase_s) = scatter_chase_durations(ghost.cycles_completed, multiplier);
        if scatter_s > 0 {
            if ghost.state == GhostState::Scatter
                && ticks_since(now, ghost.last_scatter) >= scatter_s * tps
            {
                ghost.state = GhostState::Chase;
                ghost.last_chase = Some(now);
            }
            if let Some(chase_s) = chase_s {
                if ghost.state == GhostState::Chase
                    && ticks_since(now, ghost.last_chase) >= chase_s * tps
                {
                    ghost.state = GhostState::Scatter;
                    ghost.last_scatter = Some(now);
                    ghost.cycles_completed += 1;
                }
            }
        }

        if previous != ghost.state {
            if matches!(previous, GhostState::Scatter | GhostState::Chase) {
                ghost.dir = ghost.dir.reverse();
            }
            self.events.push(GameEvent::GhostStateChanged {
                kind: ghost.kind,
                from: previous,
                to: ghost.state,
            });
        }
    }

    fn update_ghost_target(&mut self, idx: usize) {
        let ghost = &self.ghosts[idx];
        let target = if in_home_region(ghost.pos) {
            HOME_RALLY_POINT
        } else {
            match ghost.state {
                GhostState::Scatter => scatter_corner(ghost.kind),
                GhostState::Chase => {
                    let leader = self.ghosts[GhostKind::Blinky.index()].pos;
                    chase_target(ghost.kind, ghost.pos, &self.player, leader)
                }
                GhostState::Frightened => {
                    let x = self.rng.int(0, self.maze.width() - 1);
                    let y = self.rng.int(0, self.maze.height() - 1);
                    Vec2::new(x, y)
                }
                GhostState::Dormant => ghost.target,
            }
        };
        self.ghosts[idx].target = target;
    }

    fn update_ghost_position(&mut self, idx: usize) {
        if self.ghosts[idx].state == GhostState::Dormant {
            return;
        }
        self.update_ghost_target(idx);

        let ghost = &self.ghosts[idx];
        let step = ghost.dir.vector().scale(self.speed_multiplier);
        let candidate = self.maze.wrap(ghost.pos + step);
        if self.maze.is_wall(candidate) {
            return;
        }
        if candidate == self.player.pos {
            if ghost.state == GhostState::Frightened {
                self.eat_ghost(idx);
            } else {
                self.lose_life();
            }
            return;
        }

        self.ghosts[idx].pos = candidate;
        self.ghosts[idx].dir = self.choose_ghost_direction(idx);
    }

    /// Greedy one-step choice: the non-reversing open direction landing closest to the target.
    fn choose_ghost_direction(&self, idx: usize) -> Direction {
        let ghost = &self.ghosts[idx];
        let reverse = ghost.dir.reverse();
        let red_zone = is_red_zone(ghost.pos);
        let mut best: Option<(i32, Direction)> = None;

        for dir in Direction::CARDINALS {
            if dir == reverse || (red_zone && dir == Direction::Up) {
                continue;
            }
            let probe = self
                .maze
                .wrap(ghost.pos + dir.vector().scale(self.speed_multiplier));
            if self.maze.is_wall(probe) {
                continue;
            }
            if probe == self.player.pos && ghost.state == GhostState::Frightened {
                continue;
            }
            let dist = probe.distance_sq(ghost.target);
            if best.map_or(true, |(best_dist, _)| dist < best_dist) {
                best = Some((dist, dir));
            }
        }

        best.map_or(ghost.dir, |(_, dir)| dir)
    }

    fn update_ghost_marker(&mut self, idx: usize, old_pos: Vec2) {
        let pos = self.ghosts[idx].pos;
        let marker = self.ghosts[idx].kind.tile_type();
        if old_pos != pos {
            self.vacate(old_pos);
        }
        self.maze.paint(pos, marker);
        self.queue_render(pos);
    }
}
