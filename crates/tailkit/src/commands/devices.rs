//! Device command handlers.

use tabled::Tabled;
use tailkit_core::Tailnet;
use tailkit_core::types::Device;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Authorized")]
    authorized: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            address: d.addresses.first().cloned().unwrap_or_default(),
            os: d.os.clone(),
            authorized: d.authorized.to_string(),
            last_seen: util::format_time(d.last_seen),
        }
    }
}

fn detail(d: &Device) -> String {
    output::detail_lines(&[
        ("ID", d.id.clone()),
        ("Name", d.name.clone()),
        ("Hostname", d.hostname.clone()),
        ("User", d.user.clone()),
        ("OS", d.os.clone()),
        ("Version", d.client_version.clone()),
        ("Addresses", util::join_or_dash(&d.addresses)),
        ("Authorized", d.authorized.to_string()),
        ("Tags", util::join_or_dash(&d.tags)),
        ("Advertised", util::join_or_dash(&d.advertised_routes)),
        ("Enabled", util::join_or_dash(&d.enabled_routes)),
        ("Key expiry", util::format_time(d.expires)),
        ("Last seen", util::format_time(d.last_seen)),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    tailnet: &Tailnet,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let devices = tailnet.devices();

    match args.command {
        DevicesCommand::List { prefix } => {
            let all = devices.list_by_prefix(prefix.as_deref().unwrap_or("")).await?;
            let out = output::render_list(
                global.output,
                &all,
                |d| DeviceRow::from(d),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let found = devices.resolve(&device).await?;
            let out = output::render_single(global.output, &found, detail, |d| d.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
