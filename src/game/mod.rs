pub mod clock;
pub mod commands;
pub mod error;
pub mod game_state;
pub mod player;
pub mod registry;
pub mod rules;
pub mod snapshot;
pub mod utils;

// Re-export important types
pub use commands::{dispatch, Command, SideChoice};
pub use error::Rejection;
pub use game_state::{GameState, JoinRole, Outcome};
pub use player::{Player, Seat};
pub use registry::{Room, RoomRegistry};
pub use rules::{ChessRules, MoveRequest, RulesEngine};
pub use snapshot::{project, Snapshot};
