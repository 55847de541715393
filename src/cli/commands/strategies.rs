//! List strategies command.

use anyhow::Result;
use trading_strategies::StrategyRegistry;

use crate::cli::StrategiesArgs;

pub async fn run(args: StrategiesArgs) -> Result<()> {
    let registry = StrategyRegistry::new();

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in registry.list() {
        println!("  {} ", info.name);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        if args.verbose {
            println!();
            for line in serde_json::to_string_pretty(&info.default_config())?.lines() {
                println!("    {}", line);
            }
        }
        println!();
    }

    println!("Use --strategy <name> or [strategy] name in the config file to select one.");
    println!("Parameters can be overridden under [strategy.overrides].");

    Ok(())
}
