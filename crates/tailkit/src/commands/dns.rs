//! DNS command handlers.
//!
//! Nameservers, search paths and preferences share one remote object, so a
//! `set` here rewrites that object with only the addressed field changed.
//! Running two of these concurrently against one tailnet can lose a write.

use tailkit_core::types::DnsPreferences;
use tailkit_core::{SingletonResource, Tailnet};

use crate::cli::{DnsArgs, DnsCommand, DnsListCommand, DnsPreferencesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(tailnet: &Tailnet, args: DnsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DnsCommand::Nameservers { command } => {
            handle_list(&tailnet.nameservers(), command, "Nameservers", global).await
        }
        DnsCommand::SearchPaths { command } => {
            handle_list(&tailnet.search_paths(), command, "Search paths", global).await
        }
        DnsCommand::Preferences { command } => {
            handle_preferences(tailnet, command, global).await
        }
    }
}

async fn handle_list<R>(
    resource: &R,
    command: DnsListCommand,
    label: &str,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: SingletonResource<Value = Vec<String>>,
{
    match command {
        DnsListCommand::Get => {
            let values = resource.current().await?;
            print_values(&values, global)
        }
        DnsListCommand::Set { values } => {
            let stored = resource.update(&values).await?;
            output::status(&format!("{label} updated"), global.quiet);
            print_values(&stored, global)
        }
        DnsListCommand::Reset => {
            if !util::confirm(&format!("Clear all {}?", label.to_lowercase()), global.yes)? {
                return Ok(());
            }
            resource.delete().await?;
            output::status(&format!("{label} cleared"), global.quiet);
            Ok(())
        }
    }
}

fn print_values(values: &[String], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        global.output,
        values,
        |v| if v.is_empty() { "(none)".into() } else { v.join("\n") },
        |v| v.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn handle_preferences(
    tailnet: &Tailnet,
    command: DnsPreferencesCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let prefs = tailnet.preferences();
    match command {
        DnsPreferencesCommand::Get => print_preferences(prefs.current().await?, global),
        DnsPreferencesCommand::Set { magic_dns } => {
            let stored = prefs.update(&DnsPreferences { magic_dns }).await?;
            output::status("DNS preferences updated", global.quiet);
            print_preferences(stored, global)
        }
        DnsPreferencesCommand::Reset => {
            prefs.delete().await?;
            output::status("DNS preferences reset to default", global.quiet);
            Ok(())
        }
    }
}

fn print_preferences(prefs: DnsPreferences, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        global.output,
        &prefs,
        |p| output::detail_lines(&[("MagicDNS", p.magic_dns.to_string())]),
        |p| p.magic_dns.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
