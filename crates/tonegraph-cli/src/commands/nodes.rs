//! Node type listing command.

use clap::Args;
use tonegraph_config::{factory_preset_names, get_factory_preset};
use tonegraph_registry::NodeRegistry;

#[derive(Args)]
pub struct NodesArgs {
    /// Also list the factory presets accepted by `render`
    #[arg(long)]
    presets: bool,
}

pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = NodeRegistry::new();

    println!("Available Nodes");
    println!("===============");
    println!();
    println!("  {:12}  {:10}  {:22}  Description", "Type", "Category", "Aliases");
    println!("  {:12}  {:10}  {:22}  -----------", "----", "--------", "-------");
    for node in registry.all_nodes() {
        println!(
            "  {:12}  {:10}  {:22}  {}",
            node.id,
            node.category.name(),
            node.aliases.join(", "),
            node.description
        );
    }

    if args.presets {
        println!();
        println!("Factory Presets");
        println!("===============");
        println!();
        for id in factory_preset_names() {
            if let Some(preset) = get_factory_preset(id) {
                println!(
                    "  {:14}  {:14}  {}",
                    id,
                    preset.name,
                    preset.description.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
