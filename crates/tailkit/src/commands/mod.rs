//! Command dispatch: bridges CLI args -> resource clients -> output formatting.

pub mod acl;
pub mod authorize;
pub mod config_cmd;
pub mod devices;
pub mod dns;
pub mod drift;
pub mod keys;
pub mod routes;
pub mod util;

use tailkit_core::Tailnet;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a tailnet-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, tailnet: &Tailnet, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Acl(args) => acl::handle(tailnet, args, global).await,
        Command::Dns(args) => dns::handle(tailnet, args, global).await,
        Command::Keys(args) => keys::handle(tailnet, args, global).await,
        Command::Devices(args) => devices::handle(tailnet, args, global).await,
        Command::Routes(args) => routes::handle(tailnet, args, global).await,
        Command::Authorize(args) => authorize::handle(tailnet, args, global).await,
        Command::Drift(args) => drift::handle(tailnet, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
