use clap::Parser;

use crate::game::clock::{Millis, MS_PER_MINUTE};

#[derive(Parser, Debug, Clone)]
#[command(name = "chess_room_server")]
#[command(about = "Authoritative realtime chess room server")]
pub struct ServerConfig {
    /// Server host
    #[arg(long, env = "CHESS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "CHESS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory served under /static
    #[arg(long, env = "CHESS_STATIC_DIR", default_value = "./static")]
    pub static_dir: String,

    /// Clock each player starts with before a time control is chosen
    #[arg(long, env = "CHESS_INITIAL_MINUTES", default_value_t = 10)]
    pub initial_minutes: u32,

    /// How often a connection checks whether its player's flag has fallen
    #[arg(long, env = "CHESS_CLOCK_TICK_MS", default_value_t = 1000)]
    pub clock_tick_ms: u64,
}

impl ServerConfig {
    pub fn initial_time_ms(&self) -> Millis {
        Millis::from(self.initial_minutes) * MS_PER_MINUTE
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: "./static".to_string(),
            initial_minutes: 10,
            clock_tick_ms: 1000,
        }
    }
}
