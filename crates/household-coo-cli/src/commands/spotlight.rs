use clap::Args;
use household_coo_core::Dimension;

use super::open_store;

#[derive(Args)]
pub struct SpotlightArgs {
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

pub fn run(args: SpotlightArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let spotlight = store.spotlight();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&spotlight)?);
        return Ok(());
    }

    for dimension in Dimension::ALL {
        match spotlight.get(dimension) {
            Some(task) => println!(
                "{:<10} {:<6} {:>3}  {}",
                dimension.as_str(),
                task.id,
                task.score(dimension),
                task.title
            ),
            None => println!("{:<10} -", dimension.as_str()),
        }
    }
    Ok(())
}
