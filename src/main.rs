mod account_names;
mod book;
mod classifier;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod mapper;
mod models;
mod preparation;
mod resolver;
mod settings;
mod utils;

use clap::Parser;

use cli::{Action, Cli};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = cli::prepare_run(&cli).and_then(|(settings, mut book)| {
        let outcome = match cli.action {
            Action::Accts => cli::accounts::run(&cli.input_file, &mut book, &settings),
            Action::Cats => cli::categories::run(&cli.input_file, &mut book, &settings),
            Action::Ie => cli::transactions::run(&cli.input_file, &mut book, &settings),
        };
        outcome.and_then(|_| cli::book::finish(book))
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
