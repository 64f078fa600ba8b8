//! Paid step-by-step instructions for a task.

use clap::Args;
use household_coo_core::MockInstructionProvider;

use super::open_store;

#[derive(Args)]
pub struct InstructionsArgs {
    /// Task ID
    task_id: String,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

pub fn run(args: InstructionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;
    let mut provider = MockInstructionProvider::from_config(&store.config().instructions);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let result = runtime.block_on(store.request_instructions(&args.task_id, &mut provider));
    let balance = store.budget().balance_usd;
    let response = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let title = &store.task(&args.task_id)?.title;
    println!("{title}");
    println!();
    for (i, step) in response.steps.iter().enumerate() {
        println!("{}. {step}", i + 1);
    }
    if !response.citations.is_empty() {
        println!();
        println!("Sources:");
        for citation in &response.citations {
            println!("- {}: {}", citation.title, citation.url);
        }
    }
    println!();
    println!("Balance: {balance}");
    Ok(())
}
