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

//! Creation of accounts and the mutations an operator may apply to them.
//!
//! None of these touch the store; the caller decides when to save.

use std::convert::TryFrom;

use lazy_static::lazy_static;
use log::info;
use rand::{rngs::OsRng, Rng};

use super::model::*;
use crate::support::system_config::AccountsConfig;

pub const CAPITAL_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const SMALL_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
pub const NUMBERS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%&?";

/// Length of the password generated for a new account.
pub const INITIAL_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    /// Every character a generated password may contain.
    pub static ref PASSWORD_ALPHABET: Vec<u8> = [
        CAPITAL_CHARS,
        SMALL_CHARS,
        NUMBERS,
        SYMBOLS,
    ]
    .concat()
    .into_bytes();
}

/// Generate a password of exactly `length` characters, each drawn uniformly
/// from `PASSWORD_ALPHABET`.
pub fn generate_password<R: Rng + ?Sized>(
    rng: &mut R,
    length: usize,
) -> String {
    (0..length)
        .map(|_| {
            let ix = rng.gen_range(0, PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[ix] as char
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct AccountService {
    password_length: usize,
    default_mail_capacity: u32,
}

impl Default for AccountService {
    fn default() -> Self {
        AccountService {
            password_length: INITIAL_PASSWORD_LENGTH,
            default_mail_capacity: DEFAULT_MAIL_CAPACITY,
        }
    }
}

impl AccountService {
    pub fn new(config: &AccountsConfig) -> Self {
        AccountService {
            // A zero-length password would break the non-empty invariant
            password_length: config.password_length.max(1),
            default_mail_capacity: config.default_mail_capacity,
        }
    }

    /// Build a new account with a freshly generated password.
    pub fn create_account(
        &self,
        first_name: &str,
        last_name: &str,
        department: Department,
    ) -> Record {
        let email = Record::derive_email(first_name, last_name, department);
        info!("Created account {}", email);

        Record {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            department,
            email,
            password: self.generate_password(self.password_length),
            mail_capacity: self.default_mail_capacity,
            alter_email: None,
        }
    }

    pub fn generate_password(&self, length: usize) -> String {
        generate_password(&mut OsRng, length)
    }

    /// Replace the password of `record` with `new_password`, provided that
    /// `current_attempt` matches the existing one.
    pub fn change_password(
        &self,
        record: &mut Record,
        current_attempt: &str,
        new_password: &str,
    ) -> Outcome {
        if current_attempt != record.password {
            return Outcome::Rejected(Rejection::IncorrectPassword);
        }

        if new_password.is_empty() {
            return Outcome::Rejected(Rejection::EmptyPassword);
        }

        record.password = new_password.to_owned();
        info!("Changed password of {}", record.email);
        Outcome::Accepted
    }

    pub fn set_capacity(&self, record: &mut Record, capacity: i64) -> Outcome {
        if capacity < 0 {
            return Outcome::Rejected(Rejection::NegativeCapacity);
        }

        match u32::try_from(capacity) {
            Ok(capacity) => {
                record.mail_capacity = capacity;
                Outcome::Accepted
            },
            Err(_) => Outcome::Rejected(Rejection::CapacityTooLarge),
        }
    }

    pub fn set_alternate_email(
        &self,
        record: &mut Record,
        candidate: &str,
    ) -> Outcome {
        if !Record::validate_alternate_format(candidate) {
            return Outcome::Rejected(Rejection::InvalidAlternateEmail);
        }

        record.alter_email = Some(candidate.to_owned());
        Outcome::Accepted
    }
}
