//! Step-by-step instructions bought with budget credits.
//!
//! An [`InstructionProvider`] turns a task into ordered steps plus citations.
//! [`MockInstructionProvider`] stands in for the AI assistant: it waits a
//! randomized latency, fails a configurable share of requests with a
//! connection error, and otherwise answers from canned responses.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::budget::BudgetService;
use crate::error::{InstructionError, Result};
use crate::storage::InstructionsConfig;
use crate::task::Citation;

/// Steps and references for completing a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstructionResponse {
    pub steps: Vec<String>,
    pub citations: Vec<Citation>,
}

/// Source of instructions for a task.
#[allow(async_fn_in_trait)]
pub trait InstructionProvider {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Produce instructions for `task_id`.
    async fn fetch(&mut self, task_id: &str) -> Result<InstructionResponse, InstructionError>;
}

/// Simulated assistant with latency and random connection failures.
pub struct MockInstructionProvider {
    rng: Mcg128Xsl64,
    base_delay: Duration,
    jitter: Duration,
    failure_rate: f64,
}

impl MockInstructionProvider {
    pub fn new(base_delay: Duration, jitter: Duration, failure_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            rng,
            base_delay,
            jitter,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &InstructionsConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.jitter_ms),
            config.failure_rate,
            config.seed,
        )
    }

    /// No latency, no failures.
    pub fn reliable() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 0.0, Some(0))
    }

    fn next_delay(&mut self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            self.rng.gen_range(0..=jitter_ms)
        };
        self.base_delay + Duration::from_millis(extra)
    }
}

impl Default for MockInstructionProvider {
    fn default() -> Self {
        Self::from_config(&InstructionsConfig::default())
    }
}

impl InstructionProvider for MockInstructionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&mut self, task_id: &str) -> Result<InstructionResponse, InstructionError> {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.rng.gen::<f64>() < self.failure_rate {
            tracing::warn!(task_id, "simulated assistant connection failure");
            return Err(InstructionError::Connection(
                "Failed to connect to AI assistant".into(),
            ));
        }

        Ok(canned_response(task_id))
    }
}

fn citation(title: &str, url: &str) -> Citation {
    Citation {
        title: title.into(),
        url: url.into(),
    }
}

fn steps(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Canned instructions for the demo tasks, generic advice for anything else.
pub fn canned_response(task_id: &str) -> InstructionResponse {
    match task_id {
        "t1" => InstructionResponse {
            steps: steps(&[
                "Open the preschool email with deposit information",
                "Note the amount required and payment deadline",
                "Log into your bank's online portal",
                "Set up the payment to Sunshine Preschool",
                "Schedule payment to arrive before Monday 5pm deadline",
                "Save confirmation number and reply to school email",
            ]),
            citations: vec![
                citation("Preschool payment policy", "https://sunshine-preschool.com/payments"),
                citation("Online banking help", "https://yourbank.com/help"),
            ],
        },
        "t2" => InstructionResponse {
            steps: steps(&[
                "Log into your AmAir account at example-airline.com",
                "Navigate to \"My Account\" → \"Travel Credits\"",
                "Select the $150 credit expiring Friday",
                "Search for flights for your fall trip dates",
                "Apply the credit during checkout before expiration",
                "Confirm booking and save confirmation number",
            ]),
            citations: vec![
                citation("Carrier credit policy", "https://example-airline.com/policy"),
                citation("How to use travel credits", "https://example-airline.com/help"),
            ],
        },
        "t3" => InstructionResponse {
            steps: steps(&[
                "Log into the school portal using your parent credentials",
                "Navigate to \"Student Health\" → \"Immunization Records\"",
                "Click \"Upload New Records\" and select your PDF files",
                "Verify all required vaccinations are listed",
                "Submit and wait for confirmation email",
            ]),
            citations: vec![
                citation("School immunization policy", "https://school.example/policy"),
                citation("Required vaccination schedule", "https://health.gov/vaccines"),
            ],
        },
        _ => InstructionResponse {
            steps: steps(&[
                "Review the task details carefully",
                "Gather any required materials or information",
                "Take action according to the deadline",
                "Follow up to confirm completion",
            ]),
            citations: vec![citation("General task management tips", "https://example.com/tips")],
        },
    }
}

/// Charge one instruction's cost, then fetch.
///
/// The charge happens first: an insufficient balance aborts before the
/// provider is called, and a failed fetch is not refunded.
pub async fn request_instructions<P: InstructionProvider>(
    budget: &BudgetService<'_>,
    provider: &mut P,
    task_id: &str,
) -> Result<InstructionResponse> {
    let cost = budget.get()?.cost_per_instruction_usd;
    budget.charge(cost, Some(&format!("Instruction: {task_id}")))?;
    tracing::info!(task_id, provider = provider.name(), cost = %cost, "fetching instructions");
    Ok(provider.fetch(task_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::TxType;
    use crate::error::{BudgetError, CoreError};
    use crate::money::Usd;
    use crate::storage::Database;

    #[test]
    fn known_tasks_get_specific_steps() {
        assert_eq!(canned_response("t1").steps.len(), 6);
        assert_eq!(canned_response("t3").steps.len(), 5);
        assert_eq!(canned_response("t2").citations[0].title, "Carrier credit policy");
        let generic = canned_response("zzz");
        assert_eq!(generic.steps.len(), 4);
        assert_eq!(generic.citations.len(), 1);
    }

    #[tokio::test]
    async fn reliable_provider_never_fails() {
        let mut provider = MockInstructionProvider::reliable();
        for _ in 0..20 {
            provider.fetch("t2").await.unwrap();
        }
    }

    #[tokio::test]
    async fn always_failing_provider_reports_connection_error() {
        let mut provider = MockInstructionProvider::new(Duration::ZERO, Duration::ZERO, 1.0, Some(7));
        let err = provider.fetch("t1").await.unwrap_err();
        assert_eq!(
            err,
            InstructionError::Connection("Failed to connect to AI assistant".into())
        );
    }

    #[tokio::test]
    async fn same_seed_gives_same_outcomes() {
        let mut a = MockInstructionProvider::new(Duration::ZERO, Duration::ZERO, 0.5, Some(42));
        let mut b = MockInstructionProvider::new(Duration::ZERO, Duration::ZERO, 0.5, Some(42));
        for _ in 0..16 {
            assert_eq!(a.fetch("t3").await.is_ok(), b.fetch("t3").await.is_ok());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn latency_stays_within_jitter_window() {
        let mut provider = MockInstructionProvider::new(
            Duration::from_millis(800),
            Duration::from_millis(400),
            0.0,
            Some(1),
        );
        let start = tokio::time::Instant::now();
        provider.fetch("t1").await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed <= Duration::from_millis(1200) + Duration::from_millis(5));
    }

    #[tokio::test]
    async fn request_charges_before_fetching() {
        let db = Database::open_memory().unwrap();
        let budget = BudgetService::new(&db);
        let mut provider = MockInstructionProvider::reliable();

        let response = request_instructions(&budget, &mut provider, "t2").await.unwrap();
        assert_eq!(response.steps.len(), 6);

        let state = budget.get().unwrap();
        assert_eq!(state.balance_usd, Usd::from_cents(1246));
        assert_eq!(state.ledger[0].tx_type, TxType::Spend);
        assert_eq!(state.ledger[0].note.as_deref(), Some("Instruction: t2"));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_charge() {
        let db = Database::open_memory().unwrap();
        let budget = BudgetService::new(&db);
        let mut provider = MockInstructionProvider::new(Duration::ZERO, Duration::ZERO, 1.0, None);

        let err = request_instructions(&budget, &mut provider, "t1").await.unwrap_err();
        assert!(matches!(err, CoreError::Instruction(InstructionError::Connection(_))));
        assert_eq!(budget.get().unwrap().balance_usd, Usd::from_cents(1246));
    }

    #[tokio::test]
    async fn empty_budget_blocks_the_request() {
        let db = Database::open_memory().unwrap();
        let budget = BudgetService::new(&db);
        budget.charge(Usd::from_cents(1247), None).unwrap();
        budget.charge(Usd::from_cents(1), None).unwrap();

        let mut provider = MockInstructionProvider::reliable();
        let err = request_instructions(&budget, &mut provider, "t1").await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Budget(BudgetError::InsufficientBalance { .. })
        ));
        assert_eq!(budget.get().unwrap().balance_usd, Usd::ZERO);
    }
}
