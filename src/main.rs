extern crate pretty_env_logger;

#[macro_use]
extern crate log;

use clap::Parser;
use dbga::{assemble_main, kmers_main, Cli, Commands, DbgaParams, DbgError};

fn setup_logging(args: &dyn DbgaParams) {
    let level = if args.debug() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .init();

    info!("starting");
    info!("params: {:#?}", args);
    if !args.validate() {
        error!("please fix arguments");
        std::process::exit(1);
    }
}

fn main() {
    let args = Cli::parse();
    let result: Result<(), DbgError> = match args.command {
        Commands::Assemble(args) => {
            setup_logging(&args);
            assemble_main(args)
        }
        Commands::Kmers(args) => {
            setup_logging(&args);
            kmers_main(args)
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("finished");
}
