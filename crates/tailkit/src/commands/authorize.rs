//! Device authorization handler.

use tailkit_core::Tailnet;

use crate::cli::{AuthorizeArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    tailnet: &Tailnet,
    args: AuthorizeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let device = tailnet.devices().resolve(&args.device).await?;
    let authorize = !args.revoke;

    if device.authorized == authorize {
        output::status(
            &format!("'{}' is already {}", device.name, state_word(authorize)),
            global.quiet,
        );
        return Ok(());
    }
    if args.revoke
        && !util::confirm(
            &format!("Revoke authorization of '{}'? It loses tailnet access.", device.name),
            global.yes,
        )?
    {
        return Ok(());
    }

    tailnet
        .authorization()
        .set_authorized(&device.id, authorize)
        .await?;
    output::status(
        &format!("'{}' {}", device.name, state_word(authorize)),
        global.quiet,
    );
    Ok(())
}

fn state_word(authorized: bool) -> &'static str {
    if authorized { "authorized" } else { "deauthorized" }
}
