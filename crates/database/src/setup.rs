//! One-shot database bootstrap.
//!
//! Idempotent by construction: DDL uses `IF NOT EXISTS`, catalog seeding
//! and account provisioning use `ON CONFLICT DO NOTHING`. Safe to run on
//! every process start.
use super::*;
use spin_core::*;
use spin_records::*;
use tokio_postgres::Client;

impl Db {
    /// Creates tables and indices, seeds the stake catalog, and
    /// provisions the house accounts (merchant + agent pool).
    pub async fn setup(&self) -> Result<(), PgErr> {
        let client = self.conn().await?;
        log::info!("[db] creating tables");
        client.batch_execute(Match::creates()).await?;
        client.batch_execute(Account::creates()).await?;
        client.batch_execute(LedgerEntry::creates()).await?;
        client.batch_execute(Stake::creates()).await?;
        log::info!("[db] creating indices");
        client.batch_execute(Match::indices()).await?;
        client.batch_execute(Account::indices()).await?;
        client.batch_execute(LedgerEntry::indices()).await?;
        log::info!("[db] seeding stake catalog");
        client.batch_execute(&Stake::derives()).await?;
        log::info!("[db] provisioning house accounts");
        self.provision(&client).await?;
        Ok(())
    }

    /// Merchant id is chosen just above the agent pool so it stays
    /// negative (non-paying) without colliding with seatable agents.
    async fn provision(&self, client: &Client) -> Result<(), PgErr> {
        let merchant = UserId(-(AGENT_POOL_SIZE + 1));
        client.ensure_account(merchant, MERCHANT_NAME, 0).await?;
        for agent in agent_pool() {
            let name = format!("Agent {}", -agent.0);
            client
                .ensure_account(agent, &name, AGENT_MIN_BALANCE)
                .await?;
        }
        Ok(())
    }
}
