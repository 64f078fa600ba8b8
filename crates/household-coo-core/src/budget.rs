//! AI-credit budget and transaction ledger.
//!
//! The household pre-pays credits; each instruction request is charged
//! against the balance. The ledger keeps the ten most recent credits and
//! debits, newest first. Totals are kept separately so trimming the ledger
//! never changes them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BudgetError, Result};
use crate::money::Usd;
use crate::storage::{keys, Database};

/// Number of ledger entries retained.
pub const LEDGER_CAP: usize = 10;

/// Price of one instruction request.
pub const DEFAULT_COST_PER_INSTRUCTION: Usd = Usd::from_cents(2);

/// Credit or debit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Add,
    Spend,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Add => "add",
            TxType::Spend => "spend",
        }
    }
}

/// One ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetTx {
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub amount_usd: Usd,
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl BudgetTx {
    fn new(tx_type: TxType, amount_usd: Usd, ts: DateTime<Utc>, note: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tx_type,
            amount_usd,
            ts,
            note: Some(note),
        }
    }
}

/// Spendable balance, running totals and recent ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetState {
    pub balance_usd: Usd,
    pub total_added_usd: Usd,
    pub total_spent_usd: Usd,
    pub cost_per_instruction_usd: Usd,
    /// Most recent first, at most [`LEDGER_CAP`] entries.
    pub ledger: Vec<BudgetTx>,
}

impl BudgetState {
    /// Demo starting state: $15.00 added, two instructions already bought.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let cost = DEFAULT_COST_PER_INSTRUCTION;
        Self {
            balance_usd: Usd::from_cents(1248),
            total_added_usd: Usd::from_cents(1500),
            total_spent_usd: Usd::from_cents(252),
            cost_per_instruction_usd: cost,
            ledger: vec![
                BudgetTx::new(TxType::Add, Usd::from_cents(1500), now, "Initial setup".into()),
                BudgetTx::new(
                    TxType::Spend,
                    cost,
                    now - Duration::minutes(30),
                    "Instruction: t1".into(),
                ),
                BudgetTx::new(
                    TxType::Spend,
                    cost,
                    now - Duration::hours(24),
                    "Instruction: t3".into(),
                ),
            ],
        }
    }

    fn record(&mut self, tx: BudgetTx) {
        self.ledger.insert(0, tx);
        self.ledger.truncate(LEDGER_CAP);
    }

    /// Credit the balance.
    ///
    /// # Errors
    /// Returns [`BudgetError::InvalidAmount`] for zero or negative amounts.
    pub fn add_funds(&mut self, amount: Usd, note: Option<&str>) -> Result<&BudgetTx, BudgetError> {
        if !amount.is_positive() {
            return Err(BudgetError::InvalidAmount(amount));
        }
        let (Some(balance), Some(total_added)) = (
            self.balance_usd.checked_add(amount),
            self.total_added_usd.checked_add(amount),
        ) else {
            return Err(BudgetError::InvalidAmount(amount));
        };
        self.balance_usd = balance;
        self.total_added_usd = total_added;
        self.record(BudgetTx::new(
            TxType::Add,
            amount,
            Utc::now(),
            note.unwrap_or("Add funds").to_string(),
        ));
        Ok(&self.ledger[0])
    }

    /// Debit the balance.
    ///
    /// # Errors
    /// Returns [`BudgetError::InsufficientBalance`] if the balance does not
    /// cover `amount`; the state is left untouched.
    pub fn charge(&mut self, amount: Usd, note: Option<&str>) -> Result<&BudgetTx, BudgetError> {
        if !amount.is_positive() {
            return Err(BudgetError::InvalidAmount(amount));
        }
        if self.balance_usd < amount {
            return Err(BudgetError::InsufficientBalance {
                required: amount,
                available: self.balance_usd,
            });
        }
        let (Some(balance), Some(total_spent)) = (
            self.balance_usd.checked_sub(amount),
            self.total_spent_usd.checked_add(amount),
        ) else {
            return Err(BudgetError::InvalidAmount(amount));
        };
        self.balance_usd = balance;
        self.total_spent_usd = total_spent;
        self.record(BudgetTx::new(
            TxType::Spend,
            amount,
            Utc::now(),
            note.unwrap_or("Instruction cost").to_string(),
        ));
        Ok(&self.ledger[0])
    }

    /// How many instructions the balance still covers.
    pub fn instructions_remaining(&self) -> i64 {
        let cost = self.cost_per_instruction_usd.cents();
        if cost <= 0 {
            return 0;
        }
        self.balance_usd.cents().max(0) / cost
    }
}

/// Budget state persisted in the key/value store.
pub struct BudgetService<'a> {
    db: &'a Database,
    cost_per_instruction: Usd,
}

impl<'a> BudgetService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            cost_per_instruction: DEFAULT_COST_PER_INSTRUCTION,
        }
    }

    /// Use a configured instruction price instead of the default.
    pub fn with_cost(mut self, cost: Usd) -> Self {
        self.cost_per_instruction = cost;
        self
    }

    /// Current state. Missing or unreadable data is replaced by the seeded
    /// state, which is persisted.
    pub fn get(&self) -> Result<BudgetState> {
        let mut state = match self.db.load_json::<BudgetState>(keys::BUDGET)? {
            Some(state) => state,
            None => {
                let state = BudgetState::seeded(Utc::now());
                self.save(&state)?;
                state
            }
        };
        if state.cost_per_instruction_usd != self.cost_per_instruction {
            state.cost_per_instruction_usd = self.cost_per_instruction;
            self.save(&state)?;
        }
        Ok(state)
    }

    fn save(&self, state: &BudgetState) -> Result<()> {
        self.db.save_json(keys::BUDGET, state)
    }

    pub fn add_funds(&self, amount: Usd, note: Option<&str>) -> Result<BudgetState> {
        let mut state = self.get()?;
        state.add_funds(amount, note)?;
        self.save(&state)?;
        tracing::info!(amount = %amount, balance = %state.balance_usd, "funds added");
        Ok(state)
    }

    pub fn charge(&self, amount: Usd, note: Option<&str>) -> Result<BudgetState> {
        let mut state = self.get()?;
        if let Err(e) = state.charge(amount, note).map(|_| ()) {
            tracing::warn!(amount = %amount, balance = %state.balance_usd, "charge rejected");
            return Err(e.into());
        }
        self.save(&state)?;
        tracing::info!(amount = %amount, balance = %state.balance_usd, "charged");
        Ok(state)
    }

    /// Drop the stored state and reseed.
    pub fn reset(&self) -> Result<BudgetState> {
        self.db.kv_remove(keys::BUDGET)?;
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn seeded() -> BudgetState {
        BudgetState::seeded(Utc::now())
    }

    #[test]
    fn seeded_state_matches_demo_numbers() {
        let state = seeded();
        assert_eq!(state.balance_usd, Usd::from_cents(1248));
        assert_eq!(state.total_added_usd - state.total_spent_usd, state.balance_usd);
        assert_eq!(state.ledger.len(), 3);
        assert_eq!(state.ledger[0].tx_type, TxType::Add);
        assert!(state.ledger[1].ts > state.ledger[2].ts);
    }

    #[test]
    fn add_funds_credits_and_prepends() {
        let mut state = seeded();
        state.add_funds(Usd::from_cents(500), None).unwrap();
        assert_eq!(state.balance_usd, Usd::from_cents(1748));
        assert_eq!(state.total_added_usd, Usd::from_cents(2000));
        assert_eq!(state.ledger.len(), 4);
        assert_eq!(state.ledger[0].tx_type, TxType::Add);
        assert_eq!(state.ledger[0].note.as_deref(), Some("Add funds"));
    }

    #[test]
    fn ledger_is_capped_at_ten() {
        let mut state = seeded();
        for _ in 0..12 {
            state.add_funds(Usd::from_cents(100), Some("top up")).unwrap();
        }
        assert_eq!(state.ledger.len(), LEDGER_CAP);
        assert!(state.ledger.iter().all(|tx| tx.note.as_deref() == Some("top up")));
        assert_eq!(state.total_added_usd, Usd::from_cents(1500 + 1200));
    }

    #[test]
    fn charge_debits_balance() {
        let mut state = seeded();
        let tx = state.charge(Usd::from_cents(2), Some("Instruction: t2")).unwrap();
        assert_eq!(tx.tx_type, TxType::Spend);
        assert_eq!(tx.note.as_deref(), Some("Instruction: t2"));
        assert_eq!(state.balance_usd, Usd::from_cents(1246));
        assert_eq!(state.total_spent_usd, Usd::from_cents(254));
    }

    #[test]
    fn overdraw_is_rejected_without_side_effects() {
        let mut state = seeded();
        let before = state.clone();
        let err = state.charge(Usd::from_cents(1249), None).unwrap_err();
        assert_eq!(
            err,
            BudgetError::InsufficientBalance {
                required: Usd::from_cents(1249),
                available: Usd::from_cents(1248),
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn exact_balance_can_be_spent() {
        let mut state = seeded();
        state.charge(Usd::from_cents(1248), None).unwrap();
        assert_eq!(state.balance_usd, Usd::ZERO);
        assert_eq!(state.instructions_remaining(), 0);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut state = seeded();
        assert!(matches!(
            state.add_funds(Usd::ZERO, None),
            Err(BudgetError::InvalidAmount(_))
        ));
        assert!(matches!(
            state.charge(Usd::from_cents(-5), None),
            Err(BudgetError::InvalidAmount(_))
        ));
    }

    #[test]
    fn huge_amount_is_rejected_at_parse_time() {
        assert!("1e300".parse::<Usd>().is_err());
        let mut state = seeded();
        state.add_funds(Usd::MAX, None).unwrap();
        assert_eq!(state.balance_usd, Usd::from_cents((1 << 53) + 1248));
    }

    #[test]
    fn add_after_near_max_leaves_state_unchanged() {
        let mut state = seeded();
        state.balance_usd = Usd::from_cents(i64::MAX - 10);
        let before = state.clone();
        assert_eq!(
            state.add_funds(Usd::from_cents(100), None).unwrap_err(),
            BudgetError::InvalidAmount(Usd::from_cents(100))
        );
        assert_eq!(state, before);

        state.total_spent_usd = Usd::from_cents(i64::MAX);
        let before = state.clone();
        assert!(matches!(
            state.charge(Usd::from_cents(2), None),
            Err(BudgetError::InvalidAmount(_))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn serialized_state_uses_dollar_numbers() {
        let json = serde_json::to_value(seeded()).unwrap();
        assert_eq!(json["balanceUsd"], 12.48);
        assert_eq!(json["costPerInstructionUsd"], 0.02);
        assert_eq!(json["ledger"][0]["type"], "add");
    }

    #[test]
    fn service_seeds_and_persists() {
        let db = Database::open_memory().unwrap();
        let service = BudgetService::new(&db);
        assert!(db.kv_get(keys::BUDGET).unwrap().is_none());
        let state = service.get().unwrap();
        assert_eq!(state.balance_usd, Usd::from_cents(1248));
        assert!(db.kv_get(keys::BUDGET).unwrap().is_some());

        service.add_funds(Usd::from_cents(100), None).unwrap();
        assert_eq!(service.get().unwrap().balance_usd, Usd::from_cents(1348));
    }

    #[test]
    fn service_charge_failure_leaves_stored_balance() {
        let db = Database::open_memory().unwrap();
        let service = BudgetService::new(&db);
        let err = service.charge(Usd::from_cents(5000), None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Budget(BudgetError::InsufficientBalance { .. })
        ));
        assert_eq!(service.get().unwrap().balance_usd, Usd::from_cents(1248));
    }

    #[test]
    fn service_recovers_from_corrupt_state() {
        let db = Database::open_memory().unwrap();
        db.kv_set(keys::BUDGET, "{\"balanceUsd\":").unwrap();
        let state = BudgetService::new(&db).get().unwrap();
        assert_eq!(state.ledger.len(), 3);
    }

    #[test]
    fn service_applies_configured_cost() {
        let db = Database::open_memory().unwrap();
        let service = BudgetService::new(&db).with_cost(Usd::from_cents(5));
        assert_eq!(service.get().unwrap().cost_per_instruction_usd, Usd::from_cents(5));
    }

    #[test]
    fn reset_reseeds() {
        let db = Database::open_memory().unwrap();
        let service = BudgetService::new(&db);
        service.charge(Usd::from_cents(1000), None).unwrap();
        let state = service.reset().unwrap();
        assert_eq!(state.balance_usd, Usd::from_cents(1248));
    }
}
