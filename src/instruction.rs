// VRF Lottery Program - Instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    state::LotteryConfig,
    vrf::{coordinator_authority, RandomWord},
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryInstruction {
    /// Create and initialize a lottery account
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer for the lottery account
    /// 1. `[signer, writable]` The lottery account, not yet created
    /// 2. `[]` System program
    InitializeLottery { config: LotteryConfig },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays the entry
    /// 1. `[writable]` The lottery account
    /// 2. `[]` System program
    Enter {
        /// Lamports paid, at least the entry fee
        amount: u64,
    },

    /// Report draw eligibility as one byte of return data
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckDrawReady,

    /// Re-check eligibility and request randomness (anyone can call)
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The coordinator program
    /// 3. `[writable]` The coordinator state account
    RequestDraw,

    /// Fulfillment callback from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` Coordinator authority PDA
    /// 1. `[writable]` The lottery account
    /// 2.. `[writable]` Candidate winner accounts
    ResolveDraw {
        request_id: u64,
        random_words: Vec<RandomWord>,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Create initialize_lottery instruction
pub fn initialize_lottery(
    program_id: &Pubkey,
    payer: &Pubkey,
    lottery: &Pubkey,
    config: LotteryConfig,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::InitializeLottery { config }.pack()?;

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*lottery, true),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    lottery: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::Enter { amount }.pack()?;

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*lottery, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_draw_ready instruction
pub fn check_draw_ready(program_id: &Pubkey, lottery: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::CheckDrawReady.pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*lottery, false)],
        data,
    })
}

/// Create request_draw instruction
pub fn request_draw(
    program_id: &Pubkey,
    caller: &Pubkey,
    lottery: &Pubkey,
    oracle_program: &Pubkey,
    coordinator_state: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::RequestDraw.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*lottery, false),
        AccountMeta::new_readonly(*oracle_program, false),
        AccountMeta::new(*coordinator_state, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create resolve_draw instruction, as issued by the coordinator.
///
/// `callback_accounts` starts with the lottery account.
pub fn resolve_draw(
    program_id: &Pubkey,
    oracle_program: &Pubkey,
    callback_accounts: &[Pubkey],
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Result<Instruction, ProgramError> {
    let data = LotteryInstruction::ResolveDraw {
        request_id,
        random_words,
    }
    .pack()?;

    let (authority, _) = coordinator_authority(oracle_program);
    let mut accounts = vec![AccountMeta::new_readonly(authority, true)];
    accounts.extend(
        callback_accounts
            .iter()
            .map(|account| AccountMeta::new(*account, false)),
    );

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
