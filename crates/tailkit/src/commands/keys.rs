//! Auth key command handlers.

use secrecy::ExposeSecret;
use serde::Serialize;
use tabled::Tabled;
use tailkit_core::Tailnet;
use tailkit_core::resources::KeySpec;
use tailkit_core::types::{KeyExpiry, KeyMetadata};

use crate::cli::{GlobalOpts, KeyCreateArgs, KeysArgs, KeysCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct KeyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Reusable")]
    reusable: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Valid")]
    valid: String,
}

impl From<&KeyMetadata> for KeyRow {
    fn from(k: &KeyMetadata) -> Self {
        Self {
            id: k.id.clone(),
            description: k.description.clone().unwrap_or_default(),
            reusable: k.reusable().to_string(),
            tags: util::join_or_dash(&k.capabilities.devices.create.tags),
            expires: util::format_time(k.expires),
            valid: k.is_valid_at(chrono::Utc::now()).to_string(),
        }
    }
}

fn detail(k: &KeyMetadata) -> String {
    let create = &k.capabilities.devices.create;
    output::detail_lines(&[
        ("ID", k.id.clone()),
        ("Description", k.description.clone().unwrap_or_default()),
        ("Reusable", create.reusable.to_string()),
        ("Ephemeral", create.ephemeral.to_string()),
        ("Preauthorized", create.preauthorized.to_string()),
        ("Tags", util::join_or_dash(&create.tags)),
        ("Created", util::format_time(k.created)),
        ("Expires", util::format_time(k.expires)),
        ("Revoked", util::format_time(k.revoked)),
        ("Valid", k.is_valid_at(chrono::Utc::now()).to_string()),
    ])
}

/// Create output: metadata plus the secret, which is shown only here.
#[derive(Serialize)]
struct CreatedView<'a> {
    #[serde(flatten)]
    metadata: &'a KeyMetadata,
    key: &'a str,
}

impl From<&KeyCreateArgs> for KeySpec {
    fn from(args: &KeyCreateArgs) -> Self {
        let expiry = if args.no_expiry {
            Some(KeyExpiry::Never)
        } else {
            args.expiry.map(KeyExpiry::Seconds)
        };
        Self {
            reusable: args.reusable,
            ephemeral: args.ephemeral,
            preauthorized: args.preauthorized,
            tags: args.tags.clone(),
            expiry,
            description: args.description.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(tailnet: &Tailnet, args: KeysArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let keys = tailnet.keys();

    match args.command {
        KeysCommand::Create(create) => {
            let created = keys.create(&KeySpec::from(&create)).await?;
            let view = CreatedView {
                metadata: &created.metadata,
                key: created.key.expose_secret(),
            };
            let out = output::render_single(
                global.output,
                &view,
                |v| format!("{}\n\nKey: {}", detail(v.metadata), v.key),
                |v| v.key.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            output::warn("the key is shown only once; store it now");
            Ok(())
        }

        KeysCommand::Get { id } => {
            let key = keys.get(&id).await?;
            let out = output::render_single(global.output, &key, detail, |k| k.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        KeysCommand::List => {
            let all = keys.list().await?;
            let out =
                output::render_list(global.output, &all, |k| KeyRow::from(k), |k| k.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        KeysCommand::Delete { id } => {
            if !util::confirm(&format!("Delete key '{id}'?"), global.yes)? {
                return Ok(());
            }
            keys.delete(&id).await?;
            output::status("Key deleted", global.quiet);
            Ok(())
        }
    }
}
