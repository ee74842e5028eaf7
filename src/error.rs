// VRF Lottery Program - Errors
use crate::state::LotteryPhase;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the lottery program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Payment is below the configured entry fee
    #[error("Payment is below the entry fee")]
    InsufficientEntry,

    /// Entries and draws are only accepted while the lottery is open
    #[error("Lottery is not open")]
    NotOpen,

    /// A draw needs at least one player
    #[error("Lottery has no players")]
    NoPlayers,

    /// Draw conditions are not met
    #[error("Upkeep not needed: balance={balance} players={players} phase={phase:?}")]
    UpkeepNotNeeded {
        balance: u64,
        players: u64,
        phase: LotteryPhase,
    },

    /// The prize could not be delivered to the winner
    #[error("Prize transfer failed")]
    TransferFailed,

    /// Player list is at capacity
    #[error("Lottery is full")]
    LotteryFull,

    /// Callback was not signed by the coordinator authority
    #[error("Callback not signed by the coordinator authority")]
    UnauthorizedCallback,

    /// Callback does not match the in-flight request
    #[error("Unknown or already resolved randomness request")]
    UnknownRequest,

    /// Callback carried no random words
    #[error("Callback carried no random words")]
    MissingRandomWords,

    /// Oracle program account differs from the configured one
    #[error("Oracle program does not match the lottery configuration")]
    OracleMismatch,

    /// Coordinator did not hand back a request id
    #[error("Randomness request failed")]
    OracleRequestFailed,
}

impl LotteryError {
    /// Stable numeric code carried in `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            LotteryError::InsufficientEntry => 0,
            LotteryError::NotOpen => 1,
            LotteryError::NoPlayers => 2,
            LotteryError::UpkeepNotNeeded { .. } => 3,
            LotteryError::TransferFailed => 4,
            LotteryError::LotteryFull => 5,
            LotteryError::UnauthorizedCallback => 6,
            LotteryError::UnknownRequest => 7,
            LotteryError::MissingRandomWords => 8,
            LotteryError::OracleMismatch => 9,
            LotteryError::OracleRequestFailed => 10,
        }
    }
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

/// Errors returned by the mock randomness coordinator
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MockCoordinatorError {
    /// Word count is zero, above the limit, or differs from the request
    #[error("Invalid number of random words")]
    InvalidNumWords,

    /// Requested confirmations exceed the limit
    #[error("Too many request confirmations")]
    InvalidRequestConfirmations,

    /// No pending request has this id
    #[error("Unknown randomness request")]
    UnknownRequest,

    /// Fulfillment names a different consumer program
    #[error("Consumer program does not match the request")]
    ConsumerMismatch,

    /// Fulfillment names a different consumer account
    #[error("Consumer account does not match the request")]
    ConsumerAccountMismatch,

    /// Coordinator state account has no room for another request
    #[error("Pending request table is full")]
    TooManyPendingRequests,
}

impl From<MockCoordinatorError> for ProgramError {
    fn from(e: MockCoordinatorError) -> Self {
        ProgramError::Custom(100 + e as u32)
    }
}

impl<T> DecodeError<T> for MockCoordinatorError {
    fn type_of() -> &'static str {
        "Mock Coordinator Error"
    }
}

impl PrintProgramError for MockCoordinatorError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
