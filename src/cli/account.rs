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

use log::warn;

use super::main::AddSubcommand;
use crate::account::{
    model::*,
    service::AccountService,
    store::{Collection, Store},
};
use crate::support::system_config::SystemConfig;

pub(super) fn add(cmd: AddSubcommand, config: &SystemConfig, store: Store) {
    let service = AccountService::new(&config.accounts);
    let mut record =
        service.create_account(&cmd.first_name, &cmd.last_name, cmd.department);

    match store.load_all() {
        Collection {
            degraded: Some(e), ..
        } => die!(
            EX_IOERR,
            "Unable to read '{}': {}",
            store.path().display(),
            e
        ),
        Collection { records, .. } => {
            if records.iter().any(|r| r.is_same_account(&record)) {
                die!(EX_CANTCREAT, "Account '{}' already exists", record.email);
            }
        },
    }

    if cmd.prompt_password {
        let password = match rpassword::read_password_from_tty(Some(
            "Password: ",
        ))
        .and_then(|a| {
            rpassword::read_password_from_tty(Some("Confirm: ")).map(|b| (a, b))
        }) {
            Err(e) => die!(EX_NOINPUT, "Failed to read password: {}", e),
            Ok((a, b)) if a != b => die!(EX_DATAERR, "Passwords don't match"),
            Ok((a, _)) if a.is_empty() => die!(EX_NOINPUT, "No password given"),
            Ok((a, _)) => a,
        };

        let generated = record.password.clone();
        if let Outcome::Rejected(rejection) =
            service.change_password(&mut record, &generated, &password)
        {
            die!(EX_DATAERR, "{}", rejection);
        }
    }

    match store.upsert(&record) {
        Outcome::Accepted => (),
        Outcome::Rejected(rejection) => die!(EX_SOFTWARE, "{}", rejection),
        Outcome::StorageDegraded(e) => die!(
            EX_IOERR,
            "Error writing '{}': {}",
            store.path().display(),
            e
        ),
    }

    println!("Email: {}", record.email);
    if !cmd.prompt_password {
        println!("Password: {}", record.password);
    }
}

pub(super) fn list(store: Store) {
    let collection = store.load_all();
    for record in &collection.records {
        println!(
            "{}\t{} {}\t{}",
            record.email, record.first_name, record.last_name, record.department
        );
    }

    if let Some(e) = collection.degraded {
        warn!("Listing of '{}' is incomplete", store.path().display());
        die!(
            EX_DATAERR,
            "'{}' could only be partially read: {}",
            store.path().display(),
            e
        );
    }
}
