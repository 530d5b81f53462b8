/// Facing direction reported by the movement solver and consumed by sprite animation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in sprite-sheet order.
    pub const ALL: &'static [Direction] = &[
        Direction::Down,
        Direction::Up,
        Direction::Left,
        Direction::Right,
    ];

    /// Lowercase name as used in tileset `direction` properties.
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Facing for an intended displacement. The larger axis wins; ties go to
    /// the vertical axis. Returns `None` for a zero vector.
    pub fn from_displacement(dx: f32, dy: f32) -> Option<Self> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        if dx.abs() > dy.abs() {
            Some(if dx > 0.0 { Self::Right } else { Self::Left })
        } else {
            Some(if dy > 0.0 { Self::Down } else { Self::Up })
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a character is standing still or walking this tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionState {
    #[default]
    Idle,
    Movement,
}

impl MotionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Movement => "movement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "idle" => Some(Self::Idle),
            "movement" => Some(Self::Movement),
            _ => None,
        }
    }

    pub fn from_moving(moving: bool) -> Self {
        if moving {
            Self::Movement
        } else {
            Self::Idle
        }
    }
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
