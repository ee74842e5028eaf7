// VRF Lottery Program - Mock Randomness Coordinator
//
// Local stand-in for the oracle. It never produces randomness itself: whoever
// fulfills a request supplies the words.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{
    error::MockCoordinatorError,
    instruction,
    vrf::{
        coordinator_authority, CoordinatorInstruction, RandomWord, RandomWordsRequest,
        COORDINATOR_AUTHORITY_SEED,
    },
};

solana_program::declare_id!("5M11SFHxNhbbNoaf3kZx1haHPSibewouXJiGhBLfqhg6");

/// Upper bound on words per request
pub const MAX_NUM_WORDS: u32 = 500;

/// Upper bound on requested block confirmations
pub const MAX_REQUEST_CONFIRMATIONS: u16 = 200;

/// A request waiting for fulfillment
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub consumer_program: Pubkey,
    pub consumer: Pubkey,
    pub num_words: u32,
    pub callback_compute_limit: u32,
}

/// Coordinator account data. An all-zero account is an empty state.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CoordinatorState {
    pub next_request_id: u64,
    pub pending: Vec<PendingRequest>,
}

impl CoordinatorState {
    pub const LEN: usize = 10_240;

    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = src;
        Self::deserialize(&mut buf).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn pack(&self, dst: &mut [u8]) -> ProgramResult {
        let data = self
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        if data.len() > dst.len() {
            msg!("Coordinator state needs {} bytes, account has {}", data.len(), dst.len());
            return Err(MockCoordinatorError::TooManyPendingRequests.into());
        }
        dst[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    /// Validate and queue a request, returning its id. Ids start at 1.
    pub fn register(&mut self, request: RandomWordsRequest) -> Result<u64, MockCoordinatorError> {
        if request.num_words == 0 || request.num_words > MAX_NUM_WORDS {
            return Err(MockCoordinatorError::InvalidNumWords);
        }
        if request.request_confirmations > MAX_REQUEST_CONFIRMATIONS {
            return Err(MockCoordinatorError::InvalidRequestConfirmations);
        }

        let request_id = self.next_request_id.max(1);
        self.next_request_id = request_id + 1;
        self.pending.push(PendingRequest {
            request_id,
            consumer_program: request.consumer_program,
            consumer: request.consumer,
            num_words: request.num_words,
            callback_compute_limit: request.callback_compute_limit,
        });
        Ok(request_id)
    }

    /// Remove a pending request once the fulfillment matches it
    pub fn take(
        &mut self,
        request_id: u64,
        consumer_program: &Pubkey,
        consumer: &Pubkey,
        num_words: usize,
    ) -> Result<PendingRequest, MockCoordinatorError> {
        let position = self
            .pending
            .iter()
            .position(|pending| pending.request_id == request_id)
            .ok_or(MockCoordinatorError::UnknownRequest)?;

        let pending = &self.pending[position];
        if pending.consumer_program != *consumer_program {
            return Err(MockCoordinatorError::ConsumerMismatch);
        }
        if pending.num_words as usize != num_words {
            return Err(MockCoordinatorError::InvalidNumWords);
        }
        if pending.consumer != *consumer {
            return Err(MockCoordinatorError::ConsumerAccountMismatch);
        }

        Ok(self.pending.remove(position))
    }
}

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = CoordinatorInstruction::try_from_slice(instruction_data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    match instruction {
        CoordinatorInstruction::RequestRandomWords(request) => {
            msg!("Coordinator: Request Random Words");
            process_request(program_id, accounts, request)
        }
        CoordinatorInstruction::FulfillRandomWords {
            request_id,
            random_words,
        } => {
            msg!("Coordinator: Fulfill Random Words");
            process_fulfill(program_id, accounts, request_id, random_words)
        }
    }
}

fn process_request(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    request: RandomWordsRequest,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let state_info = next_account_info(account_info_iter)?;

    if state_info.owner != program_id {
        msg!("Coordinator state must be owned by the coordinator");
        return Err(ProgramError::IncorrectProgramId);
    }

    let mut state = CoordinatorState::unpack(&state_info.data.borrow())?;
    let consumer = request.consumer;
    let request_id = state.register(request).map_err(|e| {
        msg!("Request rejected: {}", e);
        e
    })?;
    state.pack(&mut state_info.data.borrow_mut())?;

    msg!("Request {} queued for {}", request_id, consumer);
    set_return_data(&request_id.to_le_bytes());
    Ok(())
}

fn process_fulfill(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let state_info = next_account_info(account_info_iter)?;
    let authority_info = next_account_info(account_info_iter)?;
    let consumer_program_info = next_account_info(account_info_iter)?;
    let consumer_info = next_account_info(account_info_iter)?;
    let extra_infos = account_info_iter.as_slice();

    if state_info.owner != program_id {
        msg!("Coordinator state must be owned by the coordinator");
        return Err(ProgramError::IncorrectProgramId);
    }
    let (authority, bump) = coordinator_authority(program_id);
    if *authority_info.key != authority {
        msg!("Expected coordinator authority {}", authority);
        return Err(ProgramError::InvalidSeeds);
    }

    let mut state = CoordinatorState::unpack(&state_info.data.borrow())?;
    let pending = state
        .take(
            request_id,
            consumer_program_info.key,
            consumer_info.key,
            random_words.len(),
        )
        .map_err(|e| {
            msg!("Fulfillment of request {} rejected: {}", request_id, e);
            e
        })?;
    state.pack(&mut state_info.data.borrow_mut())?;

    let mut callback_accounts = Vec::with_capacity(extra_infos.len() + 1);
    callback_accounts.push(pending.consumer);
    callback_accounts.extend(extra_infos.iter().map(|info| *info.key));
    let callback = instruction::resolve_draw(
        &pending.consumer_program,
        program_id,
        &callback_accounts,
        request_id,
        random_words,
    )?;

    let mut account_infos = Vec::with_capacity(extra_infos.len() + 3);
    account_infos.push(authority_info.clone());
    account_infos.push(consumer_info.clone());
    account_infos.extend(extra_infos.iter().cloned());
    account_infos.push(consumer_program_info.clone());

    msg!("Delivering request {} to {}", request_id, pending.consumer);
    invoke_signed(
        &callback,
        &account_infos,
        &[&[COORDINATOR_AUTHORITY_SEED, &[bump]]],
    )
}

/// Create fulfill_random_words instruction.
///
/// `extra_accounts` follow the consumer account in the callback; for a lottery
/// draw that is the winner, computed off-chain from the words.
pub fn fulfill_random_words(
    coordinator_state: &Pubkey,
    consumer_program: &Pubkey,
    consumer: &Pubkey,
    extra_accounts: &[Pubkey],
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Result<Instruction, ProgramError> {
    let data = CoordinatorInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .try_to_vec()
    .map_err(|_| ProgramError::InvalidInstructionData)?;

    let (authority, _) = coordinator_authority(&id());
    let mut accounts = vec![
        AccountMeta::new(*coordinator_state, false),
        AccountMeta::new_readonly(authority, false),
        AccountMeta::new_readonly(*consumer_program, false),
        AccountMeta::new(*consumer, false),
    ];
    accounts.extend(
        extra_accounts
            .iter()
            .map(|account| AccountMeta::new(*account, false)),
    );

    Ok(Instruction {
        program_id: id(),
        accounts,
        data,
    })
}
