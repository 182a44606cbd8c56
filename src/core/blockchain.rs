// The miner loop: select from the pool, assemble against the tail, mine, append.
// The ledger is owned here and passed explicitly; the repository supplies the
// pool, users, wallets and miners.

use crate::config::ChainConfig;
use crate::core::{
    Amount, Balance, BalanceResolver, Block, BlockAssembler, Ledger, PoolSelector, ProofOfWork,
    Transaction, STANDARD_TRANSACTION_SIZE,
};
use crate::error::{LedgerError, Result};
use crate::storage::Repository;
use crate::utils::current_timestamp;
use crate::wallet::WalletId;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

/// Summary of one appended block
#[derive(Debug, Clone, Serialize)]
pub struct MinedBlock {
    pub position: usize,
    pub hash: String,
    pub nonce: u64,
    pub size: u64,
    pub transaction_count: usize,
    /// Oversized transactions left in the pool during selection
    pub skipped: Vec<Uuid>,
    /// Reward queued for the next block, if any miner was paid
    pub reward: Option<Transaction>,
}

/// Result of one round of the miner loop
#[derive(Debug, Clone, Serialize)]
pub enum RoundOutcome {
    Mined(MinedBlock),
    /// Nothing fit in a block. `skipped` lists oversized transactions that
    /// remain in the pool.
    Idle { skipped: Vec<Uuid> },
}

impl RoundOutcome {
    pub fn is_mined(&self) -> bool {
        matches!(self, RoundOutcome::Mined(_))
    }

    pub fn get_skipped(&self) -> &[Uuid] {
        match self {
            RoundOutcome::Mined(mined) => &mined.skipped,
            RoundOutcome::Idle { skipped } => skipped,
        }
    }

    pub fn into_mined(self) -> Option<MinedBlock> {
        match self {
            RoundOutcome::Mined(mined) => Some(mined),
            RoundOutcome::Idle { .. } => None,
        }
    }
}

impl MinedBlock {
    fn from_block(block: &Block) -> MinedBlock {
        MinedBlock {
            position: block.get_position(),
            hash: block.get_hash().to_string(),
            nonce: block.get_nonce(),
            size: block.get_size(),
            transaction_count: block.get_transaction_count(),
            skipped: Vec::new(),
            reward: None,
        }
    }
}

pub struct Blockchain<R: Repository> {
    ledger: Ledger,
    repository: R,
    config: ChainConfig,
    assembler: BlockAssembler,
    selector: PoolSelector,
    cancel: Arc<AtomicBool>,
}

impl<R: Repository> Blockchain<R> {
    pub fn new(repository: R, config: ChainConfig) -> Result<Blockchain<R>> {
        config.validate()?;
        Ok(Blockchain {
            ledger: Ledger::new(),
            repository,
            assembler: BlockAssembler::new(&config.version, config.difficulty.clone()),
            selector: PoolSelector::new(config.max_block_size, config.aged_after_months),
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn get_ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn get_repository(&self) -> &R {
        &self.repository
    }

    pub fn get_config(&self) -> &ChainConfig {
        &self.config
    }

    /// Setting the returned flag stops any search in progress with
    /// `MiningCancelled`. Clear it again to resume mining.
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn miner(&self) -> ProofOfWork {
        ProofOfWork::new(self.config.difficulty.clone())
            .with_max_attempts(self.config.max_attempts)
            .with_cancellation(Arc::clone(&self.cancel))
    }

    pub fn genesis_wallet(&self) -> Result<WalletId> {
        let genesis = self.repository.genesis_user()?;
        Ok(self.repository.wallet_for_user(genesis.get_id())?.get_id())
    }

    /// Mint the whole supply into the genesis wallet in block 0.
    pub fn initialise(&mut self) -> Result<MinedBlock> {
        if !self.ledger.is_empty() {
            return Err(LedgerError::InvalidBlock(
                "The ledger already has a genesis block".to_string(),
            ));
        }
        info!("Initialising ledger with a supply of {}", self.config.supply_limit);

        let issuance = Transaction::new_issuance(
            self.genesis_wallet()?,
            self.config.supply_limit,
            self.config.max_block_size,
        )?;
        self.commit(&[issuance])
    }

    /// Pay the configured start-up amount to every user's spending wallet.
    /// Miner wallets get nothing here. Fails with `Config` before anything is
    /// committed when the genesis wallet cannot cover every payment. Needs more than one block only when
    /// the transfers do not fit within one block's capacity.
    pub fn distribute_genesis_funds(&mut self) -> Result<Vec<MinedBlock>> {
        let genesis_wallet = self.genesis_wallet()?;
        let mut transfers = Vec::new();
        for user in self.repository.users_all() {
            if user.is_genesis() {
                continue;
            }
            let wallet = self.repository.wallet_for_user(user.get_id())?;
            transfers.push(Transaction::new_transfer(
                genesis_wallet,
                wallet.get_id(),
                self.config.genesis_transfer,
                None,
                STANDARD_TRANSACTION_SIZE,
            )?);
        }
        if transfers.is_empty() {
            return Ok(Vec::new());
        }

        let total = transfers
            .iter()
            .try_fold(Amount::ZERO, |total, tx| total.checked_add(tx.get_amount()));
        let remaining = self.supply_remaining()?;
        match total {
            Some(total) if total <= remaining => {}
            _ => {
                return Err(LedgerError::Config(format!(
                    "Distributing {} to {} wallets exceeds the {remaining} left in the genesis wallet",
                    self.config.genesis_transfer,
                    transfers.len()
                )))
            }
        }

        let per_block = (self.config.max_block_size / STANDARD_TRANSACTION_SIZE).max(1) as usize;
        info!(
            "Distributing {} to {} wallets",
            self.config.genesis_transfer,
            transfers.len()
        );
        transfers
            .chunks(per_block)
            .map(|chunk| self.commit(chunk))
            .collect()
    }

    /// Validate and queue a transfer. The source must be able to cover the
    /// amount plus fee out of its verified and pending balance.
    pub fn submit_transfer(
        &self,
        source: WalletId,
        destination: WalletId,
        amount: Amount,
        fee: Option<Amount>,
        size: u64,
    ) -> Result<Uuid> {
        let tx = Transaction::new_transfer(source, destination, amount, fee, size)?;
        let available = self.balance_of(source).projected();
        if available < tx.total_debit() {
            return Err(LedgerError::InvalidTransaction(format!(
                "Wallet {source} has {available} available but the transfer needs {}",
                tx.total_debit()
            )));
        }
        let id = tx.get_id();
        self.repository.pool_add(tx)?;
        debug!("Queued transfer {id} of {amount} from {source} to {destination}");
        Ok(id)
    }

    /// Run one round of the miner loop. `Idle` means nothing in the pool
    /// could be selected. On any failure after selection the selected
    /// transactions go back to the pool.
    pub fn mine_next_block(&mut self) -> Result<RoundOutcome> {
        let selection = self
            .selector
            .select_for_block(&self.repository, current_timestamp())?;
        let skipped: Vec<Uuid> = selection.get_skipped().iter().map(Transaction::get_id).collect();
        if selection.is_empty() {
            debug!("Nothing selectable in the pool, {} oversized", skipped.len());
            return Ok(RoundOutcome::Idle { skipped });
        }

        let mut mined = match self.commit(selection.get_selected()) {
            Ok(mined) => mined,
            Err(e) => {
                warn!("Block not appended: {e}");
                selection.rollback(&self.repository)?;
                return Err(e);
            }
        };
        mined.skipped = skipped;

        if self.ledger.len() % self.config.halving_interval == 0 {
            info!("Mining reward halved to {}", self.mining_reward());
        }
        mined.reward = self.reward_miner()?;
        Ok(RoundOutcome::Mined(mined))
    }

    fn commit(&mut self, transactions: &[Transaction]) -> Result<MinedBlock> {
        self.commit_with(transactions, |_| {})
    }

    /// Assemble, mine and append, re-assembling against the new tail after a
    /// position conflict at most `append_retries` times. `before_append` sees
    /// the ledger between mining and append.
    fn commit_with<F>(&mut self, transactions: &[Transaction], mut before_append: F) -> Result<MinedBlock>
    where
        F: FnMut(&mut Ledger),
    {
        let mut retries = 0;
        loop {
            let block = self
                .assembler
                .assemble(transactions.to_vec(), &self.ledger)?;
            let block = self.miner().mine(block)?;
            before_append(&mut self.ledger);

            match self.ledger.append(block) {
                Ok(()) => {
                    let appended = self.ledger.last_block().ok_or(LedgerError::EmptyChain)?;
                    return Ok(MinedBlock::from_block(appended));
                }
                Err(LedgerError::PositionConflict { expected, found })
                    if retries < self.config.append_retries =>
                {
                    retries += 1;
                    warn!(
                        "Block mined for position {found} but the ledger is at {expected}; re-assembling ({retries}/{})",
                        self.config.append_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Queue a reward from the genesis wallet to a random miner, capped at
    /// what is left of the supply.
    fn reward_miner(&self) -> Result<Option<Transaction>> {
        let miners = self.repository.miners_all();
        let Some(miner) = miners.choose(&mut rand::thread_rng()) else {
            debug!("No miners registered, no reward paid");
            return Ok(None);
        };

        let reward = self.mining_reward().min(self.supply_remaining()?);
        if !reward.is_positive() {
            debug!("Supply exhausted, no reward paid");
            return Ok(None);
        }

        let tx = Transaction::new_reward(
            self.genesis_wallet()?,
            miner.get_wallet_id(),
            reward,
            STANDARD_TRANSACTION_SIZE,
        )?;
        info!("Rewarding miner {} with {reward}", miner.get_id());
        self.repository.pool_add(tx.clone())?;
        Ok(Some(tx))
    }

    /// Base reward halved once per `halving_interval` appended blocks.
    pub fn mining_reward(&self) -> Amount {
        let halvings = self.ledger.len() / self.config.halving_interval;
        let mut reward = self.config.miner_reward;
        for _ in 0..halvings {
            if reward == Amount::ZERO {
                break;
            }
            reward = reward.halved();
        }
        reward
    }

    /// What the genesis wallet still holds once pending transactions settle.
    pub fn supply_remaining(&self) -> Result<Amount> {
        Ok(self.balance_of(self.genesis_wallet()?).projected())
    }

    pub fn balance_of(&self, wallet: WalletId) -> Balance {
        BalanceResolver::indexed(wallet, &self.ledger, &self.repository.pool_all())
    }
}
