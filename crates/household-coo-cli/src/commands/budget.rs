//! AI-credit budget commands.

use clap::Subcommand;
use household_coo_core::{BudgetState, TxType, Usd};

use super::open_store;

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show balance, totals and recent transactions
    Show {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add funds (e.g. 5 or $5.50)
    Add {
        #[arg(allow_hyphen_values = true)]
        amount: Usd,
    },
    /// Restore the starting budget
    Reset,
}

fn print_budget(budget: &BudgetState) {
    println!("Balance:        {}", budget.balance_usd);
    println!("Total added:    {}", budget.total_added_usd);
    println!("Total spent:    {}", budget.total_spent_usd);
    println!(
        "Per request:    {} ({} remaining)",
        budget.cost_per_instruction_usd,
        budget.instructions_remaining()
    );
    if budget.ledger.is_empty() {
        return;
    }
    println!();
    for tx in &budget.ledger {
        let sign = match tx.tx_type {
            TxType::Add => '+',
            TxType::Spend => '-',
        };
        let amount = format!("{sign}{}", tx.amount_usd);
        println!(
            "{}  {amount:<9} {}",
            tx.ts.format("%Y-%m-%d %H:%M"),
            tx.note.as_deref().unwrap_or("")
        );
    }
}

pub fn run(action: BudgetAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        BudgetAction::Show { json } => {
            let budget = store.budget();
            if json {
                println!("{}", serde_json::to_string_pretty(budget)?);
            } else {
                print_budget(budget);
            }
        }
        BudgetAction::Add { amount } => {
            let budget = store.add_funds(amount)?;
            println!("Added {amount}. Balance: {}", budget.balance_usd);
        }
        BudgetAction::Reset => {
            let budget = store.reset_budget()?;
            println!("Budget reset. Balance: {}", budget.balance_usd);
        }
    }
    Ok(())
}
