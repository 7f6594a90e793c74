//! List command handler.
//!
//! Displays configured services, probing the ones that declare a port.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Execute the list command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let services = ctx.catalog().services();
    if services.is_empty() {
        println!("No services configured.");
        println!("Add entries to the \"services\" array of your services file.");
        return Ok(());
    }

    println!("Found {} service(s):\n", services.len());
    println!(
        "{:<20} {:<12} {:<6} {:<10} Command",
        "Name", "Group", "Port", "Health"
    );
    println!("{}", "-".repeat(72));

    for service in services {
        let port = service
            .port
            .map_or_else(|| "--".to_string(), |p| p.to_string());
        let health = match ctx.manager().probe_service(&service.name).await? {
            Some(true) => "up",
            Some(false) => "down",
            None => "--",
        };
        let command = std::iter::once(service.program.display().to_string())
            .chain(service.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "{:<20} {:<12} {:<6} {:<10} {}",
            service.name, service.group, port, health, command
        );
    }

    Ok(())
}
