// VRF Lottery Program - Instruction Processor
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::{clock::Clock, Sysvar},
};

use crate::{
    error::LotteryError,
    events::LotteryEvent,
    instruction::LotteryInstruction,
    state::{Lottery, LotteryConfig},
    utils,
    vrf::{self, RandomWord, RandomWordsRequest},
};

/// Program state handler.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::InitializeLottery { config } => {
                msg!("Instruction: Initialize Lottery");
                Self::process_initialize_lottery(program_id, accounts, config)
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(program_id, accounts, amount)
            }
            LotteryInstruction::CheckDrawReady => {
                msg!("Instruction: Check Draw Ready");
                Self::process_check_draw_ready(program_id, accounts)
            }
            LotteryInstruction::RequestDraw => {
                msg!("Instruction: Request Draw");
                Self::process_request_draw(program_id, accounts)
            }
            LotteryInstruction::ResolveDraw {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Resolve Draw");
                Self::process_resolve_draw(program_id, accounts, request_id, random_words)
            }
        }
    }

    fn process_initialize_lottery(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        config: LotteryConfig,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer || !lottery_info.is_signer {
            msg!("Payer and lottery account must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        let rent = Rent::get()?;
        config.validate(&rent).map_err(|e| {
            msg!("Invalid lottery config: {}", e);
            ProgramError::InvalidArgument
        })?;

        if lottery_info.owner == program_id {
            if Lottery::unpack(&lottery_info.data.borrow()).is_ok() {
                msg!("Lottery account is already initialized");
                return Err(ProgramError::AccountAlreadyInitialized);
            }
        } else {
            invoke(
                &system_instruction::create_account(
                    payer_info.key,
                    lottery_info.key,
                    rent.minimum_balance(Lottery::LEN),
                    Lottery::LEN as u64,
                    program_id,
                ),
                &[
                    payer_info.clone(),
                    lottery_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }

        let now = Clock::get()?.unix_timestamp;
        let lottery = Lottery::new(config, now);
        lottery.pack(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: EntryFee={} SOL, Interval={}s, Oracle={}",
            utils::lamports_to_sol(config.entry_fee),
            config.draw_interval,
            config.oracle_program
        );
        Ok(())
    }

    fn process_enter(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        lottery.record_entry(*player_info.key, amount).map_err(|e| {
            msg!(
                "Entry rejected: amount={} fee={} phase={:?} players={}",
                amount,
                lottery.entry_fee(),
                lottery.phase(),
                lottery.number_of_players()
            );
            e
        })?;

        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[
                player_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        lottery.pack(&mut lottery_info.data.borrow_mut())?;

        LotteryEvent::Entered {
            player: *player_info.key,
            amount,
        }
        .emit()
    }

    fn process_check_draw_ready(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        if lottery_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let lottery = Lottery::unpack(&lottery_info.data.borrow())?;
        let now = Clock::get()?.unix_timestamp;
        let pool = Self::pool_of(lottery_info)?;
        let ready = lottery.check_draw_ready(now, pool);

        msg!(
            "Draw ready: {} (phase={:?}, players={}, pool={}, last_draw={}, now={})",
            ready,
            lottery.phase(),
            lottery.number_of_players(),
            pool,
            lottery.last_draw_timestamp(),
            now
        );
        set_return_data(&[ready as u8]);
        Ok(())
    }

    fn process_request_draw(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let oracle_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut lottery = Lottery::unpack(&lottery_info.data.borrow())?;

        // Never trust an earlier CheckDrawReady; re-derive from current state
        let now = Clock::get()?.unix_timestamp;
        let pool = Self::pool_of(lottery_info)?;
        lottery.ensure_draw_ready(now, pool).map_err(|e| {
            msg!("Draw rejected: {}", e);
            e
        })?;

        if *oracle_program_info.key != lottery.config.oracle_program {
            msg!(
                "Oracle program {} does not match configured {}",
                oracle_program_info.key,
                lottery.config.oracle_program
            );
            return Err(LotteryError::OracleMismatch.into());
        }

        let request = RandomWordsRequest::for_draw(&lottery.config, program_id, lottery_info.key);
        let request_id =
            vrf::request_random_words(oracle_program_info, coordinator_state_info, request)?;

        lottery.begin_draw(request_id);
        lottery.pack(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Draw requested by {} for {} entries, pool={}",
            caller_info.key,
            lottery.number_of_players(),
            pool
        );
        LotteryEvent::DrawRequested { request_id }.emit()
    }

    fn process_resolve_draw(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: Vec<RandomWord>,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let candidates = account_info_iter.as_slice();

        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let lottery = Lottery::unpack(&lottery_info.data.borrow())?;

        let (expected_authority, _) = vrf::coordinator_authority(&lottery.config.oracle_program);
        if !authority_info.is_signer || *authority_info.key != expected_authority {
            msg!("Callback must be signed by coordinator authority {}", expected_authority);
            return Err(LotteryError::UnauthorizedCallback.into());
        }

        let now = Clock::get()?.unix_timestamp;
        let reserve = Rent::get()?.minimum_balance(lottery_info.data_len());
        Self::settle_draw(
            lottery_info,
            candidates,
            &lottery,
            request_id,
            &random_words,
            now,
            reserve,
        )
    }

    /// Select the winner, move the pool, then commit the staged state.
    ///
    /// On any error neither the account data nor the lamports are touched.
    fn settle_draw(
        lottery_info: &AccountInfo,
        candidates: &[AccountInfo],
        lottery: &Lottery,
        request_id: u64,
        random_words: &[RandomWord],
        now: UnixTimestamp,
        reserve: u64,
    ) -> ProgramResult {
        let (staged, winner) = lottery
            .stage_resolution(request_id, random_words, now)
            .map_err(|e| {
                msg!(
                    "Resolution rejected: request_id={} pending={:?}: {}",
                    request_id,
                    lottery.pending_request_id(),
                    e
                );
                e
            })?;
        msg!("Winner selected: {} of {} entries", winner, lottery.number_of_players());

        let prize = Self::pay_prize(lottery_info, candidates, &winner, reserve)?;
        staged.pack(&mut lottery_info.data.borrow_mut())?;

        LotteryEvent::WinnerPicked { winner, prize }.emit()
    }

    /// Move everything above the rent reserve from the lottery to the winner
    fn pay_prize(
        lottery_info: &AccountInfo,
        candidates: &[AccountInfo],
        winner: &Pubkey,
        reserve: u64,
    ) -> Result<u64, ProgramError> {
        let winner_info = candidates
            .iter()
            .find(|account| account.key == winner)
            .ok_or_else(|| {
                msg!("Winner account {} was not supplied", winner);
                LotteryError::TransferFailed
            })?;
        if !winner_info.is_writable {
            msg!("Winner account {} is not writable", winner);
            return Err(LotteryError::TransferFailed.into());
        }

        let prize = utils::prize_pool(lottery_info.lamports(), reserve);
        let winner_balance = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(LotteryError::TransferFailed)?;
        let lottery_balance = lottery_info
            .lamports()
            .checked_sub(prize)
            .ok_or(LotteryError::TransferFailed)?;

        **lottery_info.try_borrow_mut_lamports()? = lottery_balance;
        **winner_info.try_borrow_mut_lamports()? = winner_balance;

        msg!(
            "Paid {} lamports ({} SOL) to {}",
            prize,
            utils::lamports_to_sol(prize),
            winner
        );
        Ok(prize)
    }

    fn pool_of(lottery_info: &AccountInfo) -> Result<u64, ProgramError> {
        let reserve = Rent::get()?.minimum_balance(lottery_info.data_len());
        Ok(utils::prize_pool(lottery_info.lamports(), reserve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state::LotteryPhase, vrf::word_from_u64};

    const FEE: u64 = 10_000_000;
    const RESERVE: u64 = 58_000_000;
    const NOW: UnixTimestamp = 1_700_000_100;

    fn calculating_lottery(players: &[Pubkey], request_id: u64) -> Lottery {
        let mut lottery = Lottery::new(
            LotteryConfig {
                entry_fee: FEE,
                draw_interval: 30,
                oracle_program: Pubkey::new_unique(),
                key_hash: [0u8; 32],
                subscription_id: 1,
                callback_compute_limit: 500_000,
            },
            NOW - 60,
        );
        for player in players {
            lottery.record_entry(*player, FEE).unwrap();
        }
        lottery.begin_draw(request_id);
        lottery
    }

    fn packed(lottery: &Lottery) -> Vec<u8> {
        let mut data = vec![0u8; Lottery::LEN];
        lottery.pack(&mut data).unwrap();
        data
    }

    #[test]
    fn test_settle_pays_pool_and_commits() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let players = [Pubkey::new_unique(), Pubkey::new_unique()];
        let lottery = calculating_lottery(&players, 4);

        let mut lottery_lamports = RESERVE + 2 * FEE;
        let mut lottery_data = packed(&lottery);
        let lottery_info = AccountInfo::new(
            &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
        );

        let system = system_program::id();
        let mut lamports = [1_000u64, 2_000u64];
        let mut data: [Vec<u8>; 2] = [vec![], vec![]];
        let [l0, l1] = &mut lamports;
        let [d0, d1] = &mut data;
        let candidates = vec![
            AccountInfo::new(&players[0], false, true, l0, d0, &system, false, 0),
            AccountInfo::new(&players[1], false, true, l1, d1, &system, false, 0),
        ];

        Processor::settle_draw(
            &lottery_info,
            &candidates,
            &lottery,
            4,
            &[word_from_u64(3)],
            NOW,
            RESERVE,
        )
        .unwrap();

        assert_eq!(lottery_info.lamports(), RESERVE);
        assert_eq!(candidates[0].lamports(), 1_000);
        assert_eq!(candidates[1].lamports(), 2_000 + 2 * FEE);

        let committed = Lottery::unpack(&lottery_info.data.borrow()).unwrap();
        assert_eq!(committed.recent_winner(), Some(players[1]));
        assert_eq!(committed.phase(), LotteryPhase::Open);
        assert!(committed.players().is_empty());
        assert_eq!(committed.last_draw_timestamp(), NOW);
        assert_eq!(committed.pending_request_id(), None);
    }

    #[test]
    fn test_failed_payout_leaves_everything_untouched() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let player = Pubkey::new_unique();
        let lottery = calculating_lottery(&[player], 1);

        let mut lottery_lamports = RESERVE + FEE;
        let mut lottery_data = packed(&lottery);
        let original_data = lottery_data.clone();
        let lottery_info = AccountInfo::new(
            &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
        );

        let system = system_program::id();
        let mut winner_lamports = 500u64;
        let mut winner_data: Vec<u8> = vec![];
        // supplied read-only
        let candidates = vec![AccountInfo::new(
            &player, false, false, &mut winner_lamports, &mut winner_data, &system, false, 0,
        )];

        let err = Processor::settle_draw(
            &lottery_info,
            &candidates,
            &lottery,
            1,
            &[word_from_u64(7)],
            NOW,
            RESERVE,
        )
        .unwrap_err();

        assert_eq!(err, LotteryError::TransferFailed.into());
        assert_eq!(lottery_info.lamports(), RESERVE + FEE);
        assert_eq!(candidates[0].lamports(), 500);
        assert_eq!(*lottery_info.data.borrow(), &original_data[..]);
    }

    #[test]
    fn test_missing_winner_account_fails_transfer() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let lottery = calculating_lottery(&[Pubkey::new_unique()], 1);

        let mut lottery_lamports = RESERVE + FEE;
        let mut lottery_data = packed(&lottery);
        let original_data = lottery_data.clone();
        let lottery_info = AccountInfo::new(
            &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
        );

        let err = Processor::settle_draw(
            &lottery_info,
            &[],
            &lottery,
            1,
            &[word_from_u64(0)],
            NOW,
            RESERVE,
        )
        .unwrap_err();

        assert_eq!(err, LotteryError::TransferFailed.into());
        assert_eq!(lottery_info.lamports(), RESERVE + FEE);
        assert_eq!(*lottery_info.data.borrow(), &original_data[..]);
    }

    #[test]
    fn test_winner_balance_overflow_fails_transfer() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let player = Pubkey::new_unique();
        let lottery = calculating_lottery(&[player], 1);

        let mut lottery_lamports = RESERVE + FEE;
        let mut lottery_data = packed(&lottery);
        let lottery_info = AccountInfo::new(
            &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
        );

        let system = system_program::id();
        let mut winner_lamports = u64::MAX;
        let mut winner_data: Vec<u8> = vec![];
        let candidates = vec![AccountInfo::new(
            &player, false, true, &mut winner_lamports, &mut winner_data, &system, false, 0,
        )];

        let err = Processor::settle_draw(
            &lottery_info,
            &candidates,
            &lottery,
            1,
            &[word_from_u64(0)],
            NOW,
            RESERVE,
        )
        .unwrap_err();

        assert_eq!(err, LotteryError::TransferFailed.into());
        assert_eq!(lottery_info.lamports(), RESERVE + FEE);
        assert_eq!(candidates[0].lamports(), u64::MAX);
    }

    #[test]
    fn test_stale_request_id_is_rejected_before_payout() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let player = Pubkey::new_unique();
        let lottery = calculating_lottery(&[player], 2);

        let mut lottery_lamports = RESERVE + FEE;
        let mut lottery_data = packed(&lottery);
        let lottery_info = AccountInfo::new(
            &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
        );

        let system = system_program::id();
        let mut winner_lamports = 0u64;
        let mut winner_data: Vec<u8> = vec![];
        let candidates = vec![AccountInfo::new(
            &player, false, true, &mut winner_lamports, &mut winner_data, &system, false, 0,
        )];

        let err = Processor::settle_draw(
            &lottery_info,
            &candidates,
            &lottery,
            1,
            &[word_from_u64(0)],
            NOW,
            RESERVE,
        )
        .unwrap_err();

        assert_eq!(err, LotteryError::UnknownRequest.into());
        assert_eq!(candidates[0].lamports(), 0);
    }

    #[test]
    fn test_callback_from_wrong_signer_is_rejected() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let player = Pubkey::new_unique();
        let lottery = calculating_lottery(&[player], 1);

        let mut lottery_lamports = RESERVE + FEE;
        let mut lottery_data = packed(&lottery);
        let impostor = Pubkey::new_unique();
        let system = system_program::id();
        let mut impostor_lamports = 0u64;
        let mut impostor_data: Vec<u8> = vec![];

        let accounts = vec![
            AccountInfo::new(
                &impostor, true, false, &mut impostor_lamports, &mut impostor_data, &system, false, 0,
            ),
            AccountInfo::new(
                &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
            ),
        ];
        let data = LotteryInstruction::ResolveDraw {
            request_id: 1,
            random_words: vec![word_from_u64(0)],
        }
        .pack()
        .unwrap();

        assert_eq!(
            Processor::process(&program_id, &accounts, &data),
            Err(LotteryError::UnauthorizedCallback.into())
        );
    }

    #[test]
    fn test_callback_authority_must_sign() {
        let program_id = Pubkey::new_unique();
        let lottery_key = Pubkey::new_unique();
        let lottery = calculating_lottery(&[Pubkey::new_unique()], 1);
        let (authority, _) = vrf::coordinator_authority(&lottery.config.oracle_program);

        let mut lottery_lamports = RESERVE + FEE;
        let mut lottery_data = packed(&lottery);
        let system = system_program::id();
        let mut authority_lamports = 0u64;
        let mut authority_data: Vec<u8> = vec![];

        let accounts = vec![
            AccountInfo::new(
                &authority, false, false, &mut authority_lamports, &mut authority_data, &system, false, 0,
            ),
            AccountInfo::new(
                &lottery_key, false, true, &mut lottery_lamports, &mut lottery_data, &program_id, false, 0,
            ),
        ];
        let data = LotteryInstruction::ResolveDraw {
            request_id: 1,
            random_words: vec![word_from_u64(0)],
        }
        .pack()
        .unwrap();

        assert_eq!(
            Processor::process(&program_id, &accounts, &data),
            Err(LotteryError::UnauthorizedCallback.into())
        );
    }
}
