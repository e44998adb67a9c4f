//-
// Copyright (c) 2024, Jason Lingle
//
// This file is part of Corpmail.
//
// Corpmail is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Corpmail is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Corpmail. If not, see <http://www.gnu.org/licenses/>.

use std::io;
use std::path::PathBuf;

use structopt::StructOpt;

use super::session::Session;
use crate::account::{model::Department, service::AccountService, store::Store};
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
struct Options {
    /// The directory containing `corpmail.toml` and `logging.toml`
    /// [default: the current directory]
    #[structopt(long, parse(from_os_str))]
    root: Option<PathBuf>,

    /// Log debugging information to standard error.
    #[structopt(short, long)]
    verbose: bool,

    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(StructOpt)]
enum Command {
    /// Run the interactive account session (the default).
    ///
    /// This first asks whether you are a new user. New users are asked for
    /// their name and department and get a freshly generated password.
    /// Existing users log in with their email address and password.
    ///
    /// A menu then allows inspecting and changing the account, as well as
    /// reading it back from or saving it to the data file.
    Session,
    /// Create a new account without going through the interactive session.
    Add(AddSubcommand),
    /// List the accounts in the data file.
    List,
}

#[derive(StructOpt)]
pub(super) struct AddSubcommand {
    /// The department of the new account: administration, development,
    /// accounting, sales, or none (or the menu number, 0 to 4).
    #[structopt(short, long, parse(try_from_str))]
    pub(super) department: Department,

    /// Prompt for the password instead of generating one.
    #[structopt(long)]
    pub(super) prompt_password: bool,

    /// First name of the account holder.
    pub(super) first_name: String,

    /// Last name of the account holder.
    pub(super) last_name: String,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        },
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        },
    });

    let root = options.root.unwrap_or_else(|| PathBuf::from("."));

    let system_config = match SystemConfig::load(&root) {
        Ok(config) => config,
        Err(e) => die!(
            EX_CONFIG,
            "Error in config file under '{}': {}",
            root.display(),
            e
        ),
    };

    let log_config_file = root.join("logging.toml");
    if log_config_file.is_file() {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            die!(
                EX_CONFIG,
                "Error in logging config at '{}': {}",
                log_config_file.display(),
                e
            );
        }
    } else {
        crate::init_simple_log(if options.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
    }

    let store = Store::new(system_config.data_file(&root));

    match options.command.unwrap_or(Command::Session) {
        Command::Session => session(&system_config, store),
        Command::Add(cmd) => super::account::add(cmd, &system_config, store),
        Command::List => super::account::list(store),
    }
}

fn session(system_config: &SystemConfig, store: Store) {
    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut session = Session::new(
        stdin.lock(),
        stdout.lock(),
        AccountService::new(&system_config.accounts),
        store,
    );

    if let Err(e) = session.run() {
        die!(EX_IOERR, "Console error: {}", e);
    }
}
