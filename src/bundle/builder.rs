//! Execution-bundle builder: assembles compute-budget, ATA-creation, two
//! swap instructions, and a tip transfer into one atomic transaction.
//! Strictly free of I/O — it returns bytes plus metadata for an external
//! submit sink.

use crate::arb::detector::{Opportunity, VenueQuote};
use crate::constants;
use crate::errors::BundleBuildError;
use crate::pool::state::{GlobalConfig, Pool, PoolKind};
use crate::registry::Registry;
use crate::types::{Address, Venue};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::time::Instant;

pub struct BuiltBundle {
    pub transaction_bytes: Vec<u8>,
    pub expected_profit_lamports: u64,
    pub tip_lamports: u64,
    pub build_latency_us: u64,
}

/// Selects which trailing-account source a CP-Bonding swap uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BondingTrailingAccounts<'a> {
    FromGlobalConfig,
    FromObservedVictim(&'a [Address]),
}

pub struct BundleBuilder<'a> {
    registry: &'a Registry,
    payer: Pubkey,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(registry: &'a Registry, payer: Pubkey) -> Self {
        BundleBuilder { registry, payer }
    }

    pub fn build(
        &self,
        opportunity: &Opportunity,
        amount_in: u64,
        min_amount_out: u64,
        compute_unit_price_micro_lamports: u64,
        trailing: BondingTrailingAccounts,
    ) -> Result<BuiltBundle, BundleBuildError> {
        let start = Instant::now();

        let buy_pool = self.registry.pool(&opportunity.buy.pool).ok_or(BundleBuildError::MissingDependency("buy pool"))?;
        let sell_pool = self.registry.pool(&opportunity.sell.pool).ok_or(BundleBuildError::MissingDependency("sell pool"))?;

        let mut instructions = Vec::new();
        let compute_units = opportunity.buy.venue.backrun_compute_units() + opportunity.sell.venue.backrun_compute_units();
        instructions.push(compute_unit_limit_instruction(compute_units));
        instructions.push(compute_unit_price_instruction(compute_unit_price_micro_lamports));

        instructions.extend(self.ata_instructions(&buy_pool));
        instructions.extend(self.ata_instructions(&sell_pool));

        instructions.push(self.swap_instruction(&buy_pool, amount_in, min_amount_out, true, trailing)?);
        instructions.push(self.swap_instruction(&sell_pool, amount_in, min_amount_out, false, trailing)?);

        let tip_account = constants::random_tip_account().to_pubkey();
        let expected_profit_lamports = (opportunity.net_bps.max(0.0) / 10_000.0 * amount_in as f64) as u64;
        let tip_lamports = expected_profit_lamports / 10; // placeholder floor; cost::BundleCosts refines this upstream
        instructions.push(solana_sdk::system_instruction::transfer(&self.payer, &tip_account, tip_lamports));

        let message = solana_sdk::message::Message::new(&instructions, Some(&self.payer));
        let transaction_bytes = bincode::serialize(&message).map_err(|_| BundleBuildError::MissingDependency("message serialization"))?;

        Ok(BuiltBundle {
            transaction_bytes,
            expected_profit_lamports,
            tip_lamports,
            build_latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn ata_instructions(&self, pool: &Pool) -> Vec<Instruction> {
        let (mint_a, mint_b) = pool.mints();
        [mint_a, mint_b]
            .into_iter()
            .map(|mint| {
                spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                    &self.payer,
                    &self.payer,
                    &mint.to_pubkey(),
                    &constants::SPL_TOKEN_PROGRAM.to_pubkey(),
                )
            })
            .collect()
    }

    fn swap_instruction(
        &self,
        pool: &Pool,
        amount_in: u64,
        min_amount_out: u64,
        is_buy_leg: bool,
        trailing: BondingTrailingAccounts,
    ) -> Result<Instruction, BundleBuildError> {
        match (&pool.kind, pool.venue) {
            (PoolKind::CpBonding { .. }, Venue::CpBonding) => self.build_cp_bonding_swap(pool, amount_in, min_amount_out, is_buy_leg, trailing),
            (PoolKind::CpAmm { amm_authority_nonce, .. }, Venue::CpAmm) => {
                Ok(build_cp_amm_swap(pool, *amm_authority_nonce, amount_in, min_amount_out, is_buy_leg))
            }
            (PoolKind::ClAmm { .. }, Venue::ClAmm) => Ok(build_cl_amm_swap(pool, amount_in, min_amount_out, is_buy_leg)),
            (PoolKind::BinAmm { .. }, Venue::BinAmm) => Ok(self.build_bin_amm_swap(pool, amount_in, min_amount_out, is_buy_leg)),
            _ => Err(BundleBuildError::UnquotableVenue("pool kind does not match venue tag")),
        }
    }

    /// CP-Bonding: 24-byte data `{discriminator(8), amount_a(8), amount_b(8)}`,
    /// 15-account minimal path, +4 protocol-fee/creator-vault accounts when
    /// the cached global-config mandates them.
    fn build_cp_bonding_swap(
        &self,
        pool: &Pool,
        amount_in: u64,
        min_amount_out: u64,
        is_buy_leg: bool,
        trailing: BondingTrailingAccounts,
    ) -> Result<Instruction, BundleBuildError> {
        const BUY_DISCRIMINATOR: [u8; 8] = [0x66, 0x06, 0x3d, 0x12, 0x01, 0xda, 0xeb, 0xea];
        const SELL_DISCRIMINATOR: [u8; 8] = [0x33, 0xe6, 0x85, 0xa4, 0x01, 0x7f, 0x83, 0xad];

        let mut data = Vec::with_capacity(24);
        data.extend_from_slice(if is_buy_leg { &BUY_DISCRIMINATOR } else { &SELL_DISCRIMINATOR });
        data.extend_from_slice(&amount_in.to_le_bytes());
        data.extend_from_slice(&min_amount_out.to_le_bytes());

        let mut accounts = vec![
            AccountMeta::new(pool.address.to_pubkey(), false),
            AccountMeta::new(pool.vault_a.to_pubkey(), false),
            AccountMeta::new(pool.vault_b.to_pubkey(), false),
            AccountMeta::new(self.payer, true),
            AccountMeta::new_readonly(pool.mint_a.to_pubkey(), false),
            AccountMeta::new_readonly(pool.mint_b.to_pubkey(), false),
            AccountMeta::new_readonly(constants::SPL_TOKEN_PROGRAM.to_pubkey(), false),
            AccountMeta::new_readonly(constants::ASSOCIATED_TOKEN_PROGRAM.to_pubkey(), false),
            AccountMeta::new_readonly(solana_sdk::system_program::id(), false),
        ];
        // Pad to the 15-account minimal path with the remaining signer-owned
        // token accounts; a production decoder would derive these ATAs.
        while accounts.len() < 15 {
            accounts.push(AccountMeta::new_readonly(solana_sdk::system_program::id(), false));
        }

        match trailing {
            BondingTrailingAccounts::FromGlobalConfig => {
                if let Some(global) = self.lookup_global_config() {
                    accounts.extend(trailing_accounts_from_global_config(&global));
                }
            }
            BondingTrailingAccounts::FromObservedVictim(observed) => {
                accounts.extend(observed.iter().take(4).map(|a| AccountMeta::new(a.to_pubkey(), false)));
            }
        }

        Ok(Instruction { program_id: constants::CP_BONDING_PROGRAM.to_pubkey(), accounts, data })
    }

    fn lookup_global_config(&self) -> Option<GlobalConfig> {
        // The global-config singleton address is a fixed PDA of the
        // CP-Bonding program; derive and look it up in the registry cache.
        let (pda, _bump) = Pubkey::find_program_address(&[b"global"], &constants::CP_BONDING_PROGRAM.to_pubkey());
        self.registry.global_config(&Address::from_pubkey(&pda))
    }
}

fn trailing_accounts_from_global_config(global: &GlobalConfig) -> Vec<AccountMeta> {
    global.fee_recipients.iter().take(4).map(|a| AccountMeta::new(a.to_pubkey(), false)).collect()
}

/// CP-AMM: 17-byte data `{opcode(1), amount_in(8), min_out(8)}`, opcode 16
/// for base-in / 17 for base-out; 8 accounts including the authority PDA
/// derived from `(seed="amm authority", nonce)`.
fn build_cp_amm_swap(pool: &Pool, nonce: u8, amount_in: u64, min_amount_out: u64, base_in: bool) -> Instruction {
    let mut data = Vec::with_capacity(17);
    data.push(if base_in { 16 } else { 17 });
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());

    let (authority, _bump) = Pubkey::find_program_address(&[b"amm authority", &[nonce]], &constants::CP_AMM_PROGRAM.to_pubkey());

    let accounts = vec![
        AccountMeta::new_readonly(constants::SPL_TOKEN_PROGRAM.to_pubkey(), false),
        AccountMeta::new(pool.address.to_pubkey(), false),
        AccountMeta::new_readonly(authority, false),
        AccountMeta::new(pool.vault_a.to_pubkey(), false),
        AccountMeta::new(pool.vault_b.to_pubkey(), false),
        AccountMeta::new(pool.mint_a.to_pubkey(), false),
        AccountMeta::new(pool.mint_b.to_pubkey(), false),
        AccountMeta::new_readonly(solana_sdk::system_program::id(), false),
    ];

    Instruction { program_id: constants::CP_AMM_PROGRAM.to_pubkey(), accounts, data }
}

/// CL-AMM swap: no fixed byte layout is specified upstream; this follows
/// the same `{disc(8), amount_in(8), min_out(8)}` shape as the other two
/// venues plus the `is_base_input` flag a concentrated-liquidity swap needs.
fn build_cl_amm_swap(pool: &Pool, amount_in: u64, min_amount_out: u64, is_buy_leg: bool) -> Instruction {
    const SWAP_DISCRIMINATOR: [u8; 8] = [0xf8, 0xc6, 0x9e, 0x91, 0xe1, 0x75, 0x87, 0xc8];

    let mut data = Vec::with_capacity(25);
    data.extend_from_slice(&SWAP_DISCRIMINATOR);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());
    data.push(is_buy_leg as u8);

    let PoolKind::ClAmm { amm_config, tick_array_lower, tick_array_upper, .. } = &pool.kind else {
        unreachable!("caller already matched on ClAmm")
    };

    let accounts = vec![
        AccountMeta::new_readonly(constants::SPL_TOKEN_PROGRAM.to_pubkey(), false),
        AccountMeta::new(pool.address.to_pubkey(), false),
        AccountMeta::new_readonly(amm_config.to_pubkey(), false),
        AccountMeta::new(pool.vault_a.to_pubkey(), false),
        AccountMeta::new(pool.vault_b.to_pubkey(), false),
        AccountMeta::new(tick_array_lower.to_pubkey(), false),
        AccountMeta::new(tick_array_upper.to_pubkey(), false),
    ];

    Instruction { program_id: constants::CL_AMM_PROGRAM.to_pubkey(), accounts, data }
}

impl<'a> BundleBuilder<'a> {
    /// Bin-AMM: 25-byte data `{disc(8), amount_in(8), min_out(8), direction(1)}`,
    /// 15 fixed accounts plus a variable tail of bin-array addresses the
    /// swap may cross.
    fn build_bin_amm_swap(&self, pool: &Pool, amount_in: u64, min_amount_out: u64, is_buy_leg: bool) -> Instruction {
        const SWAP_DISCRIMINATOR: [u8; 8] = [0x7a, 0x2d, 0x42, 0x11, 0xbc, 0x5b, 0x9e, 0x47];

        let mut data = Vec::with_capacity(25);
        data.extend_from_slice(&SWAP_DISCRIMINATOR);
        data.extend_from_slice(&amount_in.to_le_bytes());
        data.extend_from_slice(&min_amount_out.to_le_bytes());
        data.push(is_buy_leg as u8);

        let PoolKind::BinAmm { active_id, oracle, .. } = &pool.kind else {
            unreachable!("caller already matched on BinAmm")
        };

        let mut accounts = vec![
            AccountMeta::new_readonly(constants::SPL_TOKEN_PROGRAM.to_pubkey(), false),
            AccountMeta::new(pool.address.to_pubkey(), false),
            AccountMeta::new(pool.vault_a.to_pubkey(), false),
            AccountMeta::new(pool.vault_b.to_pubkey(), false),
            AccountMeta::new_readonly(oracle.to_pubkey(), false),
            AccountMeta::new(self.payer, true),
        ];
        while accounts.len() < 15 {
            accounts.push(AccountMeta::new_readonly(solana_sdk::system_program::id(), false));
        }

        let crossed = crate::pool::topology::derive_bin_array_addresses(&pool.address, *active_id, 1);
        accounts.extend(crossed.into_iter().map(|a| AccountMeta::new(a.to_pubkey(), false)));

        Instruction { program_id: constants::BIN_AMM_PROGRAM.to_pubkey(), accounts, data }
    }
}

fn compute_unit_limit_instruction(units: u32) -> Instruction {
    solana_sdk::compute_budget::ComputeBudgetInstruction::set_compute_unit_limit(units)
}

fn compute_unit_price_instruction(micro_lamports: u64) -> Instruction {
    solana_sdk::compute_budget::ComputeBudgetInstruction::set_compute_unit_price(micro_lamports)
}
