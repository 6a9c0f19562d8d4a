// SPDX-License-Identifier: Apache-2.0

mod config;
mod error;
mod plugin;

use std::fs::OpenOptions;

use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::config::Config;
use crate::error::CliError;

const APP_NAME: &str = "cni-ipam-shim";

const SUB_CMD_VERSION: &str = "version";

fn main() {
    let matches = clap::Command::new(APP_NAME)
        .version(clap::crate_version!())
        .about(
            "CNI plugin resolving container addresses from CNI_ARGS or a \
            delegated IPAM plugin",
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Set verbose level")
                .global(true),
        )
        .arg(
            clap::Arg::new("quiet")
                .short('q')
                .help("Disable logging")
                .global(true),
        )
        .arg(
            clap::Arg::new("CONFIG")
                .short('c')
                .long("config")
                .takes_value(true)
                .help("Configuration file path"),
        )
        .subcommand(
            clap::Command::new(SUB_CMD_VERSION).about("Show version"),
        )
        .get_matches();

    if matches.subcommand_matches(SUB_CMD_VERSION).is_some() {
        print_string_and_exit(format!(
            "{} {}",
            APP_NAME,
            clap::crate_version!()
        ));
    }

    let config_path = match matches.value_of("CONFIG") {
        Some(p) => p.to_string(),
        None => std::env::var(Config::CONFIG_PATH_ENV)
            .unwrap_or_else(|_| Config::DEFAULT_CONFIG_PATH.to_string()),
    };
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => print_error_and_exit(e),
    };

    if !matches.is_present("quiet") {
        if let Err(e) =
            init_logger(matches.occurrences_of("verbose"), &config)
        {
            print_error_and_exit(e);
        }
    }
    log::debug!("Using configuration {config_path}: {config:?}");

    print_result_and_exit(plugin::run(&config));
}

// STDOUT is reserved for the CNI result, hence logs go to STDERR or file.
fn init_logger(verbose: u64, config: &Config) -> Result<(), CliError> {
    let (log_module_filters, log_level) = match verbose {
        0 => (vec!["cni_ipam", "cni_ipam_shim"], config.log.level_filter()?),
        1 => (vec!["cni_ipam", "cni_ipam_shim"], LevelFilter::Debug),
        _ => (vec![""], LevelFilter::Debug),
    };
    let mut log_builder = Builder::new();
    for log_module_filter in log_module_filters {
        if !log_module_filter.is_empty() {
            log_builder.filter(Some(log_module_filter), log_level);
        } else {
            log_builder.filter(None, log_level);
        }
    }
    if let Some(log_file) = config.log.file.as_ref() {
        let fd = OpenOptions::new().create(true).append(true).open(log_file)?;
        log_builder.target(Target::Pipe(Box::new(fd)));
    } else {
        log_builder.target(Target::Stderr);
    }
    log_builder.init();
    Ok(())
}

fn print_result_and_exit(result: Result<String, CliError>) {
    match result {
        Ok(s) => print_string_and_exit(s),
        Err(e) => print_error_and_exit(e),
    }
}

fn print_error_and_exit(e: CliError) -> ! {
    log::error!("{e}");
    match serde_json::to_string(&e.to_cni_error()) {
        Ok(s) => println!("{s}"),
        Err(_) => eprintln!("{e}"),
    }
    std::process::exit(e.code);
}

fn print_string_and_exit(s: String) -> ! {
    if !s.is_empty() {
        println!("{s}");
    }
    std::process::exit(0);
}
