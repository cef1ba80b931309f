mod send;
mod subscribers;

use clap::{Arg, Command};
use herald::{config, Config};

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from a `.env` file end up in the environment, where the config
    // loader picks them up.
    dotenvy::dotenv().ok();

    let matches = cmd().get_matches();

    let mut config: Config = match matches.get_one::<String>("config") {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };
    if let Some(level) = matches.get_one::<String>("verbosity") {
        config.tracing.level = level.parse()?;
    }

    match matches.subcommand() {
        Some(("send", m)) => send::run(m, config).await?,
        Some(("subscribers", _)) => subscribers::run(config)?,
        Some(("serve", _)) | None => herald::axum::start(config).await?,
        _ => unreachable!("clap only accepts registered subcommands"),
    }

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("herald")
        .version(VERSION)
        .about("Newsletter admin panel")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("NAME")
                .help("Config file to load instead of herald.toml"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Override the verbosity of the log output"),
        )
        .subcommand(Command::new("serve").about("Start the admin panel (default)"))
        .subcommand(send::cmd())
        .subcommand(subscribers::cmd())
}

#[cfg(test)]
mod tests {
    use herald::tracing::Level;

    use super::*;

    #[test]
    fn verbosity_is_global_and_parses_into_level() {
        let matches = cmd()
            .try_get_matches_from(["herald", "subscribers", "-v", "debug"])
            .unwrap();
        let level: Level = matches
            .get_one::<String>("verbosity")
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(level, Level::Debug);
    }

    #[test]
    fn unknown_verbosity_is_rejected() {
        assert!(cmd()
            .try_get_matches_from(["herald", "-v", "loud"])
            .is_err());
    }

    #[test]
    fn serve_is_optional() {
        let matches = cmd().try_get_matches_from(["herald"]).unwrap();
        assert!(matches.subcommand().is_none());
    }
}
