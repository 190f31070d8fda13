//! Config subcommand handlers.

use dialoguer::Password;
use tailkit_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Mask plaintext secrets before the config leaves the process.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("****".into());
        }
    }
    cfg
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let toml = tailkit_config::render_config(&cfg)?;
            let out = output::render_single(
                global.output,
                &cfg,
                |_| toml.trim_end().to_owned(),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetKey { key } => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let key = match key {
                Some(key) => key,
                None => Password::new()
                    .with_prompt(format!("API key for profile '{profile_name}'"))
                    .interact()
                    .map_err(|e| CliError::Io(std::io::Error::other(e)))?,
            };
            if key.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "key".into(),
                    reason: "must not be empty".into(),
                });
            }
            tailkit_config::store_api_key(&profile_name, key.trim())?;
            output::status(
                &format!("API key stored in the system keyring for '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tailkit_config::Profile;

    use super::*;

    #[test]
    fn show_masks_plaintext_keys() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                tailnet: Some("example.com".into()),
                api_key: Some("tskey-api-secret".into()),
                ..Profile::default()
            },
        );
        let text = tailkit_config::render_config(&redacted(&cfg)).unwrap();
        assert!(text.contains("[profiles.home]"));
        assert!(text.contains("api_key = \"****\""));
        assert!(text.contains("[defaults]"));
        assert!(!text.contains("tskey-api-secret"));
    }
}
