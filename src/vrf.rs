// Randomness coordinator integration for the lottery program
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke},
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{error::LotteryError, state::LotteryConfig};

/// Block confirmations the coordinator waits before fulfilling
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Seed of the PDA that signs fulfillment callbacks
pub const COORDINATOR_AUTHORITY_SEED: &[u8] = b"coordinator";

/// One 256-bit random word, big-endian
pub type RandomWord = [u8; 32];

/// Randomness request as understood by a coordinator program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
    /// Pay in the native token instead of the subscription token
    pub native_payment: bool,
    /// Program that receives the callback
    pub consumer_program: Pubkey,
    /// Account the request is made for, first account of the callback
    pub consumer: Pubkey,
}

impl RandomWordsRequest {
    /// Build the single-word draw request for a lottery
    pub fn for_draw(config: &LotteryConfig, consumer_program: &Pubkey, consumer: &Pubkey) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_compute_limit: config.callback_compute_limit,
            num_words: NUM_WORDS,
            native_payment: false,
            consumer_program: *consumer_program,
            consumer: *consumer,
        }
    }
}

/// Instructions every coordinator program accepts
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Queue a randomness request. Returns the request id (u64 LE) as return data.
    ///
    /// Accounts expected:
    /// 0. `[writable]` Coordinator state
    RequestRandomWords(RandomWordsRequest),

    /// Deliver random words to the consumer of a pending request.
    /// Trailing accounts are forwarded to the callback unchecked.
    ///
    /// Accounts expected:
    /// 0. `[writable]` Coordinator state
    /// 1. `[]` Coordinator authority PDA
    /// 2. `[]` Consumer program
    /// 3. `[writable]` Consumer account named in the request
    /// 4.. `[writable]` Extra accounts for the callback
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<RandomWord>,
    },
}

/// PDA of `oracle_program` allowed to sign callbacks
pub fn coordinator_authority(oracle_program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_AUTHORITY_SEED], oracle_program)
}

/// Ask the coordinator for randomness and return the assigned request id
pub fn request_random_words<'a>(
    oracle_program_info: &AccountInfo<'a>,
    coordinator_state_info: &AccountInfo<'a>,
    request: RandomWordsRequest,
) -> Result<u64, ProgramError> {
    let data = CoordinatorInstruction::RequestRandomWords(request)
        .try_to_vec()
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    invoke(
        &Instruction {
            program_id: *oracle_program_info.key,
            accounts: vec![AccountMeta::new(*coordinator_state_info.key, false)],
            data,
        },
        &[coordinator_state_info.clone(), oracle_program_info.clone()],
    )?;

    let (returning_program, return_data) = get_return_data().ok_or_else(|| {
        msg!("Coordinator returned no request id");
        LotteryError::OracleRequestFailed
    })?;
    if returning_program != *oracle_program_info.key {
        msg!("Return data came from {}, not the coordinator", returning_program);
        return Err(LotteryError::OracleRequestFailed.into());
    }
    let request_id = return_data
        .get(..8)
        .and_then(|slice| slice.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(LotteryError::OracleRequestFailed)?;

    msg!("Randomness requested: request_id={}", request_id);
    Ok(request_id)
}

/// Index of the winning slot: `word mod players`, over the full 256-bit word.
///
/// The modulo bias is accepted; it is negligible for realistic player counts.
pub fn winner_index(word: &RandomWord, players: usize) -> usize {
    if players == 0 {
        return 0;
    }
    let modulus = players as u128;
    let remainder = word
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);
    remainder as usize
}

/// Widen a u64 into a random word
pub fn word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
