use anyhow::Context;
use clap::Parser;
use fpm_cli::args::{Cli, Commands};
use fpm_cli::handlers::{describe, provision, state};
use fpm_cli::settings::load_settings;
use fpm_logger::Logger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings =
        load_settings(cli.settings.as_deref()).context("Critical: Settings are malformed")?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }

    let _log = Logger::init(env!("CARGO_BIN_NAME"), &settings.logging)?;

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Provision { descriptor, repo, install_dir } => provision::run(
            &descriptor,
            repo.as_deref().unwrap_or(&settings.repository),
            install_dir.as_deref().unwrap_or(&settings.install_dir),
            &mut out,
        ),
        Commands::Describe { descriptor, repo } => {
            describe::run(&descriptor, repo.as_deref().unwrap_or(&settings.repository), &mut out)
        },
        Commands::State { file } => state::run(&file, &mut out),
    }
}
