use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Survival,
    #[default]
    Creative,
    Adventure,
    Spectator,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSettings {
    pub name: String,
    pub default_game_mode: GameMode,
    /// Seconds since epoch; zero in deterministic mode.
    pub last_played: i64,
}

impl WorldSettings {
    /// Settings stamped on a merged world.
    pub fn merged(deterministic: bool) -> Self {
        Self {
            name: "world".to_string(),
            default_game_mode: GameMode::Creative,
            last_played: if deterministic {
                0
            } else {
                OffsetDateTime::now_utc().unix_timestamp()
            },
        }
    }
}
