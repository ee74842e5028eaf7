// VRF Lottery Program - State
use crate::{error::LotteryError, vrf};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

/// Maximum number of entries a single round can hold
pub const MAX_PLAYERS: usize = 256;

/// Phase of the lottery round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryPhase {
    /// Accepting entries, eligible to draw
    Open,
    /// A randomness request is in flight
    Calculating,
}

/// Per-deployment parameters, fixed at initialization
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LotteryConfig {
    /// Minimum payment per entry in lamports
    pub entry_fee: u64,
    /// Seconds that must pass between draws
    pub draw_interval: u64,
    /// Randomness coordinator program
    pub oracle_program: Pubkey,
    /// Oracle lane, forwarded as-is
    pub key_hash: [u8; 32],
    /// Oracle subscription, forwarded as-is
    pub subscription_id: u64,
    /// Compute budget for the fulfillment callback, forwarded as-is
    pub callback_compute_limit: u32,
}

impl LotteryConfig {
    pub const LEN: usize = 8 + 8 + 32 + 32 + 8 + 4;
}

/// Lottery account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Lottery {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Immutable deployment parameters
    pub config: LotteryConfig,
    /// Current phase
    pub phase: LotteryPhase,
    /// One slot per entry, in entry order
    pub players: Vec<Pubkey>,
    /// Time of the last resolved draw, or of initialization
    pub last_draw_timestamp: UnixTimestamp,
    /// Most recently paid winner
    pub recent_winner: Option<Pubkey>,
    /// In-flight randomness request while calculating
    pub pending_request_id: Option<u64>,
}

impl Sealed for Lottery {}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Lottery {
    pub const LEN: usize = 1                 // is_initialized
        + LotteryConfig::LEN
        + 1                                  // phase
        + 4 + 32 * MAX_PLAYERS               // players
        + 8                                  // last_draw_timestamp
        + 1 + 32                             // recent_winner
        + 1 + 8; // pending_request_id

    /// Create a fresh, open lottery
    pub fn new(config: LotteryConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            config,
            phase: LotteryPhase::Open,
            players: Vec::new(),
            last_draw_timestamp: now,
            recent_winner: None,
            pending_request_id: None,
        }
    }

    /// Decode account data. Trailing capacity bytes are ignored.
    pub fn unpack_unchecked(src: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = src;
        Self::deserialize(&mut buf).map_err(|_| ProgramError::InvalidAccountData)
    }

    /// Decode account data that must already be initialized
    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let lottery = Self::unpack_unchecked(src)?;
        if !lottery.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(lottery)
    }

    pub fn pack(&self, dst: &mut [u8]) -> ProgramResult {
        let data = self
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        if data.len() > dst.len() {
            msg!("Lottery state needs {} bytes, account has {}", data.len(), dst.len());
            return Err(ProgramError::AccountDataTooSmall);
        }
        dst[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    pub fn entry_fee(&self) -> u64 {
        self.config.entry_fee
    }

    pub fn draw_interval(&self) -> u64 {
        self.config.draw_interval
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn phase(&self) -> LotteryPhase {
        self.phase
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn last_draw_timestamp(&self) -> UnixTimestamp {
        self.last_draw_timestamp
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    /// Whether enough time has passed since the last draw
    pub fn interval_elapsed(&self, now: UnixTimestamp) -> bool {
        let elapsed = now.saturating_sub(self.last_draw_timestamp);
        elapsed >= 0 && elapsed as u64 >= self.config.draw_interval
    }

    /// Draw eligibility: open, has players, interval elapsed and a non-empty pool
    pub fn check_draw_ready(&self, now: UnixTimestamp, pool: u64) -> bool {
        self.phase == LotteryPhase::Open
            && !self.players.is_empty()
            && self.interval_elapsed(now)
            && pool > 0
    }

    /// Same predicate as `check_draw_ready`, with the failing state attached
    pub fn ensure_draw_ready(&self, now: UnixTimestamp, pool: u64) -> Result<(), LotteryError> {
        if self.players.is_empty() {
            return Err(LotteryError::NoPlayers);
        }
        if !self.check_draw_ready(now, pool) {
            return Err(LotteryError::UpkeepNotNeeded {
                balance: pool,
                players: self.players.len() as u64,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Admit one entry. Overpayment is accepted.
    pub fn record_entry(&mut self, player: Pubkey, amount: u64) -> Result<(), LotteryError> {
        if amount < self.config.entry_fee {
            return Err(LotteryError::InsufficientEntry);
        }
        if self.phase != LotteryPhase::Open {
            return Err(LotteryError::NotOpen);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LotteryError::LotteryFull);
        }
        self.players.push(player);
        Ok(())
    }

    /// Lock the round behind an in-flight request
    pub fn begin_draw(&mut self, request_id: u64) {
        self.phase = LotteryPhase::Calculating;
        self.pending_request_id = Some(request_id);
    }

    /// Compute the post-resolution state without touching `self`.
    ///
    /// Returns the staged lottery and the winner. The caller commits the
    /// staged copy only after the prize has moved.
    pub fn stage_resolution(
        &self,
        request_id: u64,
        random_words: &[vrf::RandomWord],
        now: UnixTimestamp,
    ) -> Result<(Lottery, Pubkey), LotteryError> {
        if self.phase != LotteryPhase::Calculating || self.pending_request_id != Some(request_id) {
            return Err(LotteryError::UnknownRequest);
        }
        let word = random_words.first().ok_or(LotteryError::MissingRandomWords)?;
        if self.players.is_empty() {
            return Err(LotteryError::NoPlayers);
        }

        let winner = self.players[vrf::winner_index(word, self.players.len())];

        let mut staged = self.clone();
        staged.recent_winner = Some(winner);
        staged.phase = LotteryPhase::Open;
        staged.players.clear();
        staged.last_draw_timestamp = now;
        staged.pending_request_id = None;

        Ok((staged, winner))
    }
}
