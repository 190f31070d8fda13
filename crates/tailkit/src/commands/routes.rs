//! Subnet route command handlers.

use tailkit_core::Tailnet;
use tailkit_core::types::DeviceRoutes;

use crate::cli::{GlobalOpts, RoutesArgs, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

fn print_routes(routes: &DeviceRoutes, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        global.output,
        routes,
        |r| {
            output::detail_lines(&[
                ("Advertised", util::join_or_dash(&r.advertised_routes)),
                ("Enabled", util::join_or_dash(&r.enabled_routes)),
            ])
        },
        |r| r.enabled_routes.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(tailnet: &Tailnet, args: RoutesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = tailnet.devices();
    let routes = tailnet.routes();

    match args.command {
        RoutesCommand::Get { device } => {
            let id = devices.resolve(&device).await?.id;
            print_routes(&routes.get(&id).await?, global)
        }

        RoutesCommand::Set { device, routes: wanted } => {
            let id = devices.resolve(&device).await?.id;
            let stored = routes.update(&id, &wanted).await?;
            output::status("Routes updated", global.quiet);
            print_routes(&stored, global)
        }

        RoutesCommand::Reset { device } => {
            let id = devices.resolve(&device).await?.id;
            if !util::confirm(&format!("Disable all subnet routes of '{device}'?"), global.yes)? {
                return Ok(());
            }
            routes.delete(&id).await?;
            output::status("Routes disabled", global.quiet);
            Ok(())
        }
    }
}
