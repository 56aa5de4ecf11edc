mod config;
mod constants;
mod core_cli;
mod core_control;
mod core_network;
mod core_reference;
mod core_transfer;
mod helpers;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core_cli::Cli;
use crate::core_reference::FileReference;
use crate::core_transfer::TransferOptions;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    let config = resolve_config(&args)?;
    let reference = build_reference(&args, &config)?;
    let options = TransferOptions {
        control_port: config.client.control_port(),
        buffer_size: config.client.transfer_buffer_size(),
        output_dir: PathBuf::from(&args.output_dir),
    };

    info!(
        "Retrieving {} from {}",
        reference.remote_path, reference.host
    );
    let summary = core_transfer::download(&reference, &options)
        .await
        .with_context(|| {
            format!(
                "Failed to retrieve {} from {}",
                reference.remote_path, reference.host
            )
        })?;
    info!(
        "Saved {} ({})",
        summary.local_path.display(),
        helpers::format_size(summary.bytes_received)
    );

    Ok(())
}

/// Loads the configuration file named on the command line, falling back to
/// the OS default path when present, and to built-in defaults otherwise.
fn resolve_config(args: &Cli) -> Result<Config> {
    let default_config_path = if cfg!(target_os = "windows") {
        "C:\\src\\rouilleget\\etc\\rouilleget.conf"
    } else {
        "/etc/rouilleget.conf"
    };

    if !args.config.is_empty() {
        config::load_config(&args.config)
    } else if Path::new(default_config_path).exists() {
        config::load_config(default_config_path)
    } else {
        Ok(Config::default())
    }
}

/// Builds the file reference from either invocation mode, applying credential
/// flags on top. A --user without --password prompts on stdin.
fn build_reference(args: &Cli, config: &Config) -> Result<FileReference> {
    let mut reference = match &args.remote_file {
        Some(remote_file) => FileReference::from_host_pair(
            &args.target,
            remote_file,
            config.client.anonymous_user(),
            config.client.anonymous_password(),
        )?,
        None => FileReference::parse_url(
            &args.target,
            config.client.anonymous_user(),
            config.client.anonymous_password(),
        )?,
    };

    if let Some(user) = &args.user {
        reference.user = user.clone();
        reference.password = match &args.password {
            Some(password) => password.clone(),
            None => helpers::prompt_credential(&format!("Password for {}: ", user))?,
        };
    } else if let Some(password) = &args.password {
        reference.password = password.clone();
    }

    Ok(reference)
}
