//! Policy file command handlers.

use serde::Serialize;
use tailkit_core::types::{Acl, AclFormat, AclPolicy};
use tailkit_core::{SingletonResource, Tailnet};

use crate::cli::{AclArgs, AclCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct PolicyView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<&'a str>,
    policy: &'a AclPolicy,
}

/// Policy text as a human would edit it.
fn policy_text(policy: &AclPolicy) -> String {
    match policy {
        AclPolicy::HuJson(text) => text.trim_end().to_owned(),
        AclPolicy::Structured(acl) => serde_json::to_string_pretty(acl).unwrap_or_default(),
    }
}

fn print_policy(policy: &AclPolicy, etag: Option<&str>, global: &GlobalOpts) -> Result<(), CliError> {
    let view = PolicyView { etag, policy };
    let out = output::render_single(
        global.output,
        &view,
        |v| policy_text(v.policy),
        |v| policy_text(v.policy),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(tailnet: &Tailnet, args: AclArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let format = if args.hujson {
        AclFormat::HuJson
    } else {
        AclFormat::Json
    };
    let acl = tailnet.acl(format);

    match args.command {
        AclCommand::Get => {
            let versioned = acl.read_versioned().await?;
            if let (OutputFormat::Table, Some(etag)) = (global.output, &versioned.etag) {
                output::status(&format!("ETag: {etag}"), global.quiet);
            }
            print_policy(&versioned.value, versioned.etag.as_deref(), global)
        }

        AclCommand::Set { file, if_match } => {
            let policy = match format {
                AclFormat::HuJson => AclPolicy::HuJson(std::fs::read_to_string(&file)?),
                AclFormat::Json => AclPolicy::Structured(util::read_json_file::<Acl>(&file)?),
            };
            if !util::confirm("Replace the tailnet policy file?", global.yes)? {
                return Ok(());
            }
            let (stored, etag) = match if_match {
                Some(etag) => {
                    let versioned = acl.write_if_match(&policy, &etag).await?;
                    (versioned.value, versioned.etag)
                }
                None => (acl.update(&policy).await?, None),
            };
            output::status("Policy file updated", global.quiet);
            print_policy(&stored, etag.as_deref(), global)
        }

        AclCommand::Reset => {
            if !util::confirm(
                "Reset the policy file to allow-all? Existing rules are discarded.",
                global.yes,
            )? {
                return Ok(());
            }
            acl.delete().await?;
            output::status("Policy file reset to default", global.quiet);
            Ok(())
        }
    }
}
