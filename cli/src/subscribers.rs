use anyhow::Result;

use herald::email::list::SubscriberStore;
use herald::{Config, Database};

pub fn cmd() -> clap::Command {
    clap::Command::new("subscribers").about("Print the current subscriber list")
}

pub fn run(config: Config) -> Result<()> {
    let db = Database::open(&config.db_path)?;
    let emails = db.list_subscriber_emails()?;
    for email in &emails {
        println!("{email}");
    }
    eprintln!("{} subscribers", emails.len());
    Ok(())
}
