use crate::types::{TileColor, TileType, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub tile_type: TileType,
    pub default_type: TileType,
    pub can_interact: bool,
}

impl Tile {
    fn from_layout_char(c: char) -> Self {
        let tile_type = match c {
            '#' => TileType::Wall,
            '.' => TileType::Point,
            '@' => TileType::Energizer,
            'o' => TileType::LifeToken,
            _ => TileType::Empty,
        };
        Self {
            tile_type,
            default_type: tile_type,
            can_interact: true,
        }
    }

    fn empty() -> Self {
        Self::from_layout_char(' ')
    }

    pub fn color(&self) -> TileColor {
        if !self.can_interact && self.tile_type.is_consumable() {
            return TileColor::Background;
        }
        match self.tile_type {
            TileType::Empty => TileColor::Background,
            TileType::Wall => TileColor::Wall,
            TileType::Point => TileColor::Point,
            TileType::Energizer => TileColor::Energizer,
            TileType::LifeToken => TileColor::LifeToken,
            TileType::PacMan => TileColor::Player,
            occupant => occupant
                .ghost_kind()
                .map(TileColor::Ghost)
                .unwrap_or(TileColor::Background),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    total_points: u32,
    remaining_points: u32,
    life_tokens: Vec<Vec2>,
}

impl Maze {
    /// Reads `width * height` characters row-major. Missing or unknown characters become Empty,
    /// and life tokens beyond `max_lives` are ignored.
    pub fn parse(layout: &str, width: i32, height: i32, max_lives: u32) -> Self {
        let mut chars = layout.chars();
        let mut tiles = Vec::with_capacity((width * height).max(0) as usize);
        let mut total_points = 0;
        let mut life_tokens = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let mut tile = chars
                    .next()
                    .map(Tile::from_layout_char)
                    .unwrap_or_else(Tile::empty);
                match tile.tile_type {
                    TileType::Point => total_points += 1,
                    TileType::LifeToken => {
                        if life_tokens.len() as u32 >= max_lives {
                            tile = Tile::empty();
                        } else {
                            life_tokens.push(Vec2::new(x, y));
                        }
                    }
                    _ => {}
                }
                tiles.push(tile);
            }
        }

        Self {
            width,
            height,
            tiles,
            total_points,
            remaining_points: total_points,
            life_tokens,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    pub fn remaining_points(&self) -> u32 {
        self.remaining_points
    }

    /// Life-token cells in layout order; lives are spent from the end.
    pub fn life_tokens(&self) -> &[Vec2] {
        &self.life_tokens
    }

    pub fn tile_at(&self, pos: Vec2) -> &Tile {
        &self.tiles[self.index(pos)]
    }

    pub fn tile_at_mut(&mut self, pos: Vec2) -> &mut Tile {
        let idx = self.index(pos);
        &mut self.tiles[idx]
    }

    pub fn is_wall(&self, pos: Vec2) -> bool {
        self.tile_at(pos).tile_type == TileType::Wall
    }

    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        pos.wrap(self.width, self.height)
    }

    /// Restores every tile type and re-enables every interaction for a new level.
    pub fn reset_to_defaults(&mut self) {
        for tile in &mut self.tiles {
            tile.tile_type = tile.default_type;
            tile.can_interact = true;
        }
        self.remaining_points = self.total_points;
    }

    /// Returns the count left after consuming one point.
    pub fn consume_point(&mut self) -> u32 {
        self.remaining_points = self.remaining_points.saturating_sub(1);
        self.remaining_points
    }

    pub fn restore_default(&mut self, pos: Vec2) {
        let tile = self.tile_at_mut(pos);
        tile.tile_type = tile.default_type;
    }

    pub fn paint(&mut self, pos: Vec2, occupant: TileType) {
        self.tile_at_mut(pos).tile_type = occupant;
    }

    pub fn cells(&self) -> impl Iterator<Item = (Vec2, &Tile)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(idx, tile)| {
            let idx = idx as i32;
            (Vec2::new(idx % width, idx / width), tile)
        })
    }

    fn index(&self, pos: Vec2) -> usize {
        let pos = self.wrap(pos);
        (pos.y * self.width + pos.x) as usize
    }
}
