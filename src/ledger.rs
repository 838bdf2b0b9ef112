//! Currency/streak collaborator invoked when a game ends. The engine never
//! stores balances itself; it only tells the ledger who won and lost.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::game::PlayerId;

#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Add `amount` to `player`'s balance, returning the new balance.
    async fn credit(&self, player: &PlayerId, amount: u64) -> anyhow::Result<u64>;

    /// Remove `amount` from `player`'s balance, returning the new balance.
    async fn debit(&self, player: &PlayerId, amount: u64) -> anyhow::Result<u64>;

    /// Streak bookkeeping after a finished game.
    async fn record_outcome(&self, _winner: &PlayerId, _loser: &PlayerId) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Account {
    balance: u64,
    streak: u32,
}

/// Process-local ledger. New players start at the opening balance; debits
/// floor at zero.
pub struct InMemoryLedger {
    opening_balance: u64,
    accounts: Mutex<HashMap<PlayerId, Account>>,
}

impl InMemoryLedger {
    pub fn new(opening_balance: u64) -> Self {
        Self {
            opening_balance,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    fn open(&self) -> Account {
        Account {
            balance: self.opening_balance,
            streak: 0,
        }
    }

    pub async fn balance(&self, player: &PlayerId) -> u64 {
        let accounts = self.accounts.lock().await;
        accounts.get(player).map_or(self.opening_balance, |a| a.balance)
    }

    /// Consecutive wins.
    pub async fn streak(&self, player: &PlayerId) -> u32 {
        let accounts = self.accounts.lock().await;
        accounts.get(player).map_or(0, |a| a.streak)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait::async_trait]
impl Ledger for InMemoryLedger {
    async fn credit(&self, player: &PlayerId, amount: u64) -> anyhow::Result<u64> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.entry(player.clone()).or_insert_with(|| self.open());
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| anyhow::anyhow!("balance of {} would overflow", player))?;
        Ok(account.balance)
    }

    async fn debit(&self, player: &PlayerId, amount: u64) -> anyhow::Result<u64> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts.entry(player.clone()).or_insert_with(|| self.open());
        account.balance = account.balance.saturating_sub(amount);
        Ok(account.balance)
    }

    async fn record_outcome(&self, winner: &PlayerId, loser: &PlayerId) -> anyhow::Result<()> {
        let mut accounts = self.accounts.lock().await;
        accounts.entry(winner.clone()).or_insert_with(|| self.open()).streak += 1;
        accounts.entry(loser.clone()).or_insert_with(|| self.open()).streak = 0;
        Ok(())
    }
}
