use thiserror::Error;

/// Why a command was refused. A rejected command never changes the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("game is already over")]
    GameOver,

    #[error("you are not seated in this game")]
    NotSeated,

    #[error("not your turn")]
    NotYourTurn,

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("this game doesn't use time controls")]
    NotTimed,

    #[error("the clock has not started yet")]
    ClockNotRunning,

    #[error("no pending offer from your opponent")]
    NoPendingOffer,

    #[error("there is no move to take back")]
    NothingToTakeBack,

    #[error("both seats must be taken")]
    SeatsNotFilled,

    #[error("the game ended in a way that cannot be taken back")]
    NotTakebackable,
}
