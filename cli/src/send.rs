use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches};

use herald::email::SmtpRelay;
use herald::{Broadcast, Config, Database, Dispatcher, Status};

pub fn cmd() -> clap::Command {
    clap::Command::new("send")
        .arg_required_else_help(true)
        .about("Send a newsletter to all subscribers")
        .arg(
            Arg::new("subject")
                .long("subject")
                .short('s')
                .required(true)
                .value_name("SUBJECT"),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .required(true)
                .value_name("PATH")
                .help("File containing the html body"),
        )
}

pub async fn run(matches: &ArgMatches, config: Config) -> Result<()> {
    herald::tracing::init(&config)?;

    // both arguments are required by clap
    let subject = matches.get_one::<String>("subject").cloned().unwrap_or_default();
    let path = matches.get_one::<String>("file").cloned().unwrap_or_default();
    let body = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    let db = Database::open(&config.db_path)?;
    let relay = Arc::new(SmtpRelay::from_config(&config.email));
    let dispatcher = Dispatcher::from_config(&config, Arc::new(db), relay)?;

    let report = dispatcher.dispatch(&Broadcast::new(subject, body)).await?;
    println!("{report}");

    if report.status() == Status::FullyFailed {
        anyhow::bail!("no subscriber received the newsletter");
    }
    Ok(())
}
