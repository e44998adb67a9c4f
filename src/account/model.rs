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

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::support::error::Error;

/// The domain under which every department's mail is hosted.
pub const COMPANY_DOMAIN: &str = "company.com";

/// The mailbox capacity, in megabytes, of a freshly created account.
pub const DEFAULT_MAIL_CAPACITY: u32 = 500;

lazy_static! {
    // \w is restricted to ASCII word characters
    static ref ALTERNATE_EMAIL: Regex =
        Regex::new(r"^[A-Za-z0-9._]+@(?-u:\w){3,}\.(org|com)$").unwrap();
}

/// The departments an account can belong to.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum Department {
    Administration,
    Development,
    Accounting,
    Sales,
    None,
}

impl Department {
    /// All departments, in menu order.
    pub const ALL: [Department; 5] = [
        Department::Administration,
        Department::Development,
        Department::Accounting,
        Department::Sales,
        Department::None,
    ];

    /// Map an operator's menu choice to a department.
    ///
    /// Choices 1 through 4 select the real departments; 0 selects `None`.
    pub fn from_choice(choice: u32) -> Option<Self> {
        match choice {
            1 => Some(Department::Administration),
            2 => Some(Department::Development),
            3 => Some(Department::Accounting),
            4 => Some(Department::Sales),
            0 => Some(Department::None),
            _ => None,
        }
    }

    /// The menu choice which selects this department.
    pub fn choice(self) -> u32 {
        match self {
            Department::Administration => 1,
            Department::Development => 2,
            Department::Accounting => 3,
            Department::Sales => 4,
            Department::None => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Department::Administration => "Administration",
            Department::Development => "Development",
            Department::Accounting => "Accounting",
            Department::Sales => "Sales",
            Department::None => "None",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Department {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if let Ok(choice) = s.parse::<u32>() {
            return Department::from_choice(choice)
                .ok_or(Error::UnknownDepartment);
        }

        Department::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or(Error::UnknownDepartment)
    }
}

/// One email account.
///
/// The `email` field is the account's identity. It is derived from the name
/// and department when the account is created and never recomputed, since
/// none of its inputs can change afterwards.
///
/// `PartialEq` compares every field. Use `is_same_account()` to ask whether
/// two records describe the same account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub first_name: String,
    pub last_name: String,
    pub department: Department,
    pub email: String,
    pub password: String,
    pub mail_capacity: u32,
    pub alter_email: Option<String>,
}

impl Record {
    /// Compute the primary address for the given name and department.
    pub fn derive_email(
        first_name: &str,
        last_name: &str,
        department: Department,
    ) -> String {
        format!(
            "{}.{}@{}.{}",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            department.name().to_lowercase(),
            COMPANY_DOMAIN,
        )
    }

    /// Return whether `candidate` is acceptable as an alternate address.
    pub fn validate_alternate_format(candidate: &str) -> bool {
        ALTERNATE_EMAIL.is_match(candidate)
    }

    /// Whether `self` and `other` are the same account, i.e., have the same
    /// primary address.
    ///
    /// This says nothing about whether either holds the right password.
    pub fn is_same_account(&self, other: &Record) -> bool {
        self.email == other.email
    }

    /// Overwrite every field of `self` with those of `other`.
    pub fn hydrate_from(&mut self, other: &Record) {
        self.clone_from(other);
    }
}

/// Why a mutation was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The current password given to confirm a change was wrong.
    IncorrectPassword,
    /// A new password was empty.
    EmptyPassword,
    /// A mailbox capacity was below zero.
    NegativeCapacity,
    /// A mailbox capacity was too large to store.
    CapacityTooLarge,
    /// An alternate address did not have the accepted shape.
    InvalidAlternateEmail,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Rejection::IncorrectPassword => write!(f, "INCORRECT PASSWORD!"),
            Rejection::EmptyPassword => {
                write!(f, "Password cannot be empty.")
            },
            Rejection::NegativeCapacity => write!(
                f,
                "Capacity cannot be negative. \
                 Please enter a non-negative value."
            ),
            Rejection::CapacityTooLarge => {
                write!(f, "Capacity is too large.")
            },
            Rejection::InvalidAlternateEmail => write!(
                f,
                "Invalid email format. Please enter a valid email address."
            ),
        }
    }
}

/// The result of an operation which may be refused or may only partially
/// reach the store.
#[derive(Debug)]
pub enum Outcome {
    Accepted,
    Rejected(Rejection),
    /// The store could not be read or written in full. The error has already
    /// been logged.
    StorageDegraded(Error),
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn department_choices() {
        for &department in &Department::ALL {
            assert_eq!(
                Some(department),
                Department::from_choice(department.choice())
            );
        }

        assert_eq!(None, Department::from_choice(5));
        assert_eq!(Some(Department::None), Department::from_choice(0));
    }

    #[test]
    fn department_from_str() {
        assert_eq!(Department::Sales, "sales".parse().unwrap());
        assert_eq!(Department::Sales, "Sales".parse().unwrap());
        assert_eq!(Department::Development, "2".parse().unwrap());
        assert_eq!(Department::None, "0".parse().unwrap());
        assert_matches!(
            Err(Error::UnknownDepartment),
            "Marketing".parse::<Department>()
        );
        assert_matches!(
            Err(Error::UnknownDepartment),
            "7".parse::<Department>()
        );
    }

    #[test]
    fn derive_email_template() {
        assert_eq!(
            "jane.doe@development.company.com",
            Record::derive_email("Jane", "Doe", Department::Development)
        );
        assert_eq!(
            "x.y@none.company.com",
            Record::derive_email("X", "Y", Department::None)
        );
    }

    #[test]
    fn alternate_format() {
        assert!(Record::validate_alternate_format("a.b@corp.com"));
        assert!(Record::validate_alternate_format("x@abc.org"));
        assert!(Record::validate_alternate_format("under_score@mail_1.com"));
        assert!(!Record::validate_alternate_format("not-an-email"));
        assert!(!Record::validate_alternate_format("a@b.com"));
        assert!(!Record::validate_alternate_format("a@b.net"));
        assert!(!Record::validate_alternate_format("a@bcd.net"));
        assert!(!Record::validate_alternate_format("a-b@corp.com"));
        assert!(!Record::validate_alternate_format("@corp.com"));
        assert!(!Record::validate_alternate_format("a@corp.com "));
        assert!(!Record::validate_alternate_format("a@córp.com"));
    }

    #[test]
    fn same_account_ignores_password() {
        let a = Record {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            department: Department::Sales,
            email: "jane.doe@sales.company.com".to_owned(),
            password: "hunter2".to_owned(),
            mail_capacity: DEFAULT_MAIL_CAPACITY,
            alter_email: None,
        };
        let mut b = a.clone();
        b.password = "something else".to_owned();
        b.mail_capacity = 0;

        assert!(a.is_same_account(&b));
        assert_ne!(a, b);

        b.email = "jane.doe2@sales.company.com".to_owned();
        assert!(!a.is_same_account(&b));
    }

    proptest! {
        #[test]
        fn derive_email_lowercases_everything(
            first in "[A-Za-z]{1,12}",
            last in "[A-Za-z]{1,12}",
            choice in 0u32..=4,
        ) {
            let department = Department::from_choice(choice).unwrap();
            let email = Record::derive_email(&first, &last, department);

            prop_assert_eq!(
                &email,
                &Record::derive_email(&first, &last, department)
            );
            prop_assert_eq!(email.to_lowercase(), email.clone());
            prop_assert_eq!(
                format!(
                    "{}.{}@{}.company.com",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    department.name().to_lowercase()
                ),
                email
            );
        }
    }
}
