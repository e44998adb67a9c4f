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

//! The interactive console session.
//!
//! Input is consumed as whitespace-separated tokens, so several answers may
//! be given on one line. Running out of input at any prompt ends the session.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use log::{info, warn};

use crate::account::{
    model::*,
    service::AccountService,
    store::{find_by_credentials, Store},
};

const MENU: &str = "\n**********\nENTER YOUR CHOICE\n\
                    1. Show Info\n\
                    2. Change Password\n\
                    3. Change Mailbox Capacity\n\
                    4. Set Alternate Email\n\
                    5. Read Data from a File\n\
                    6. Store Data in File\n\
                    7. Exit";

pub struct Session<R, W> {
    input: R,
    pending: VecDeque<String>,
    output: W,
    service: AccountService,
    store: Store,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(
        input: R,
        output: W,
        service: AccountService,
        store: Store,
    ) -> Self {
        Session {
            input,
            pending: VecDeque::new(),
            output,
            service,
            store,
        }
    }

    /// Run a full session: sign in or sign up, then serve the menu until the
    /// operator exits.
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.sign_in().and_then(|mut record| {
            info!("Session started for {}", record.email);
            self.manage(&mut record)
        });

        match result {
            Err(e) if io::ErrorKind::UnexpectedEof == e.kind() => {
                info!("Input ended; closing session");
                writeln!(self.output)?;
                self.output.flush()
            },
            r => r,
        }
    }

    /// Obtain the record the session operates on, either by creating a new
    /// account or by looking up an existing one.
    fn sign_in(&mut self) -> io::Result<Record> {
        loop {
            match self.ask_yes_no("Are you a new user? (Y/N) : ")? {
                Some(true) => return self.create_new_user(),
                Some(false) => {
                    if !self.store.exists() {
                        writeln!(self.output, "No data found.")?;
                        continue;
                    }

                    match self.load_existing_user()? {
                        Some(record) => return Ok(record),
                        None => writeln!(self.output, "No such user found")?,
                    }
                },
                None => writeln!(self.output, "**ENTER A VALID CHOICE**")?,
            }
        }
    }

    fn create_new_user(&mut self) -> io::Result<Record> {
        let first_name = self.prompt("Enter your firstname: ")?;
        let last_name = self.prompt("Enter your lastname: ")?;
        writeln!(self.output, "New user: {} {}", first_name, last_name)?;

        let department = self.ask_department()?;
        Ok(self
            .service
            .create_account(&first_name, &last_name, department))
    }

    fn ask_department(&mut self) -> io::Result<Department> {
        writeln!(self.output, "DEPARTMENTS:")?;
        for &department in &Department::ALL {
            writeln!(self.output, "{}. {}", department.choice(), department)?;
        }

        loop {
            let choice = self.token()?;
            if let Some(department) = choice
                .parse::<u32>()
                .ok()
                .and_then(Department::from_choice)
            {
                return Ok(department);
            }

            writeln!(
                self.output,
                "**INVALID CHOICE** \nEnter the Department:"
            )?;
        }
    }

    fn load_existing_user(&mut self) -> io::Result<Option<Record>> {
        let collection = self.store.load_all();
        if collection.is_degraded() {
            writeln!(
                self.output,
                "Warning: the data file could only be partially read."
            )?;
        }

        if collection.records.is_empty() {
            return Ok(None);
        }

        let email = loop {
            let email = self.prompt("Enter your email: ")?;
            if looks_like_primary_address(&email) {
                break email;
            }

            writeln!(self.output, "Invalid email!")?;
        };
        let password = self.prompt("Enter your password: ")?;

        Ok(find_by_credentials(&collection.records, &email, &password)
            .cloned())
    }

    /// Serve the action menu for `record` until the operator exits.
    pub fn manage(&mut self, record: &mut Record) -> io::Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;
            self.output.flush()?;

            match self.token()?.parse::<u32>() {
                Ok(1) => self.show_info(record)?,
                Ok(2) => self.change_password(record)?,
                Ok(3) => self.change_capacity(record)?,
                Ok(4) => self.change_alternate_email(record)?,
                Ok(5) => self.read_from_store(record)?,
                Ok(6) => self.write_to_store(record)?,
                Ok(7) => {
                    writeln!(self.output, "\nThank you for using our service.")?;
                    return self.output.flush();
                },
                _ => writeln!(self.output, "INVALID CHOICE! ENTER AGAIN!")?,
            }
        }
    }

    fn show_info(&mut self, record: &Record) -> io::Result<()> {
        writeln!(
            self.output,
            "NAME: {} {}",
            record.first_name, record.last_name
        )?;
        writeln!(self.output, "DEPARTMENT: {}", record.department)?;
        writeln!(self.output, "EMAIL: {}", record.email)?;
        writeln!(self.output, "PASSWORD: {}", record.password)?;
        writeln!(self.output, "MAILBOX CAPACITY: {}mb", record.mail_capacity)?;
        writeln!(
            self.output,
            "ALTERNATIVE EMAIL: {}",
            record
                .alter_email
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or("none")
        )
    }

    fn change_password(&mut self, record: &mut Record) -> io::Result<()> {
        loop {
            match self.ask_yes_no(
                "ARE YOU SURE YOU WANT TO CHANGE YOUR PASSWORD? (Y/N) : ",
            )? {
                Some(true) => break,
                Some(false) => {
                    return writeln!(self.output, "PASSWORD CHANGE CANCELED!");
                },
                None => writeln!(self.output, "**ENTER A VALID CHOICE**")?,
            }
        }

        let current = self.prompt("Enter your current password: ")?;
        let new_password = self.prompt("Enter the new password: ")?;
        match self.service.change_password(record, &current, &new_password) {
            Outcome::Accepted => {
                writeln!(self.output, "PASSWORD CHANGED SUCCESSFULLY!")
            },
            Outcome::Rejected(rejection) => {
                warn!("Password change for {} refused", record.email);
                writeln!(self.output, "{}", rejection)
            },
            Outcome::StorageDegraded(e) => writeln!(self.output, "{}", e),
        }
    }

    fn change_capacity(&mut self, record: &mut Record) -> io::Result<()> {
        writeln!(
            self.output,
            "Current capacity = {}mb",
            record.mail_capacity
        )?;

        loop {
            let input = self.prompt("Enter new capacity: ")?;
            let capacity = match input.parse::<i64>() {
                Ok(capacity) => capacity,
                Err(_) => {
                    writeln!(
                        self.output,
                        "Invalid input. Please enter a valid integer value."
                    )?;
                    continue;
                },
            };

            match self.service.set_capacity(record, capacity) {
                Outcome::Accepted => {
                    return writeln!(
                        self.output,
                        "MAILBOX CAPACITY CHANGED SUCCESSFULLY!"
                    );
                },
                Outcome::Rejected(rejection) => {
                    writeln!(self.output, "{}", rejection)?
                },
                Outcome::StorageDegraded(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    fn change_alternate_email(
        &mut self,
        record: &mut Record,
    ) -> io::Result<()> {
        loop {
            let candidate = self.prompt("Enter new alternate email: ")?;
            match self.service.set_alternate_email(record, &candidate) {
                Outcome::Accepted => {
                    return writeln!(
                        self.output,
                        "ALTERNATE EMAIL SET SUCCESSFULLY!"
                    );
                },
                Outcome::Rejected(rejection) => {
                    writeln!(self.output, "{}", rejection)?
                },
                Outcome::StorageDegraded(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    /// Replace `record` with the stored copy of the same account, if the
    /// store holds one with the same address and password.
    fn read_from_store(&mut self, record: &mut Record) -> io::Result<()> {
        let collection = self.store.load_all();
        if collection.is_degraded() {
            writeln!(
                self.output,
                "Warning: the data file could only be partially read."
            )?;
        }

        match find_by_credentials(
            &collection.records,
            &record.email,
            &record.password,
        ) {
            Some(stored) => {
                record.hydrate_from(stored);
                writeln!(self.output, "Email read from file and updated.")
            },
            None => writeln!(self.output, "Email not found."),
        }
    }

    fn write_to_store(&mut self, record: &Record) -> io::Result<()> {
        match self.store.upsert(record) {
            Outcome::Accepted => writeln!(self.output, "Email written to file."),
            Outcome::Rejected(rejection) => {
                writeln!(self.output, "{}", rejection)
            },
            Outcome::StorageDegraded(e) => writeln!(
                self.output,
                "Error writing email to file: {}",
                e
            ),
        }
    }

    /// Ask a Y/N question. Returns `None` if the answer was neither.
    ///
    /// Only the first character counts, so "yes" is as good as "Y".
    fn ask_yes_no(&mut self, question: &str) -> io::Result<Option<bool>> {
        let answer = self.prompt(question)?;
        Ok(match answer.chars().next() {
            Some('Y') | Some('y') => Some(true),
            Some('N') | Some('n') => Some(false),
            _ => None,
        })
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        self.token()
    }

    /// Return the next whitespace-separated token of input.
    ///
    /// Fails with `UnexpectedEof` once input is exhausted.
    fn token(&mut self) -> io::Result<String> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }

            let mut line = String::new();
            if 0 == self.input.read_line(&mut line)? {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "end of input",
                ));
            }

            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

/// Whether `candidate` has the shape of an address generated for an
/// account, i.e. `local@department.company.com`.
fn looks_like_primary_address(candidate: &str) -> bool {
    match candidate.rfind('@') {
        Some(at) => {
            let (local, domain) = (&candidate[..at], &candidate[at + 1..]);
            let suffix = format!(".{}", COMPANY_DOMAIN);
            !local.is_empty()
                && domain.len() > suffix.len()
                && domain.ends_with(&suffix)
        },
        None => false,
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    fn setup() -> (tempfile::TempDir, Store) {
        crate::init_test_log();
        let root = tempfile::tempdir().unwrap();
        let store = Store::new(root.path().join("resources/emails.emails"));
        (root, store)
    }

    fn run(store: &Store, input: &str) -> String {
        let mut output = Vec::<u8>::new();
        Session::new(
            Cursor::new(input.as_bytes().to_vec()),
            &mut output,
            AccountService::default(),
            store.clone(),
        )
        .run()
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    fn manage(store: &Store, record: &mut Record, input: &str) -> String {
        let mut output = Vec::<u8>::new();
        Session::new(
            Cursor::new(input.as_bytes().to_vec()),
            &mut output,
            AccountService::default(),
            store.clone(),
        )
        .manage(record)
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    fn jane() -> Record {
        Record {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            department: Department::Development,
            email: "jane.doe@development.company.com".to_owned(),
            password: "s3cret!A".to_owned(),
            mail_capacity: DEFAULT_MAIL_CAPACITY,
            alter_email: None,
        }
    }

    #[test]
    fn create_save_and_reload() {
        let (_root, store) = setup();

        let output = run(&store, "Y\nJane\nDoe\n7\n2\n1\n6\n7\n");
        assert!(output.contains("New user: Jane Doe"));
        assert!(output.contains("0. None"));
        assert!(output.contains("**INVALID CHOICE**"));
        assert!(output.contains("EMAIL: jane.doe@development.company.com"));
        assert!(output.contains("MAILBOX CAPACITY: 500mb"));
        assert!(output.contains("ALTERNATIVE EMAIL: none"));
        assert!(output.contains("Email written to file."));
        assert!(output.contains("Thank you for using our service."));

        let records = store.load_all().records;
        assert_eq!(1, records.len());
        let saved = records[0].clone();
        assert_eq!("jane.doe@development.company.com", saved.email);
        assert_eq!(8, saved.password.len());
        assert_eq!(500, saved.mail_capacity);
        assert_eq!(None, saved.alter_email);

        let input = format!(
            "n\nnot-an-address\n{} {}\n1 7\n",
            saved.email, saved.password
        );
        let output = run(&store, &input);
        assert!(output.contains("Invalid email!"));
        assert!(output.contains(&format!("PASSWORD: {}", saved.password)));
        assert!(output.contains("DEPARTMENT: Development"));
    }

    #[test]
    fn existing_user_needs_data() {
        let (_root, store) = setup();

        let output = run(&store, "N\n");
        assert!(output.contains("No data found."));

        store.upsert(&jane());
        let output = run(
            &store,
            "maybe\nN\njane.doe@development.company.com\nwrong\n",
        );
        assert!(output.contains("**ENTER A VALID CHOICE**"));
        assert!(output.contains("No such user found"));
        assert!(!output.contains("ENTER YOUR CHOICE"));
    }

    #[test]
    fn change_password_requires_current() {
        let (_root, store) = setup();
        let mut record = jane();

        let output = manage(&store, &mut record, "2 n 2 Y wrong other 7");
        assert!(output.contains("PASSWORD CHANGE CANCELED!"));
        assert!(output.contains("INCORRECT PASSWORD!"));
        assert_eq!("s3cret!A", record.password);

        let output = manage(&store, &mut record, "2 x y s3cret!A other 7");
        assert!(output.contains("**ENTER A VALID CHOICE**"));
        assert!(output.contains("PASSWORD CHANGED SUCCESSFULLY!"));
        assert_eq!("other", record.password);
    }

    #[test]
    fn capacity_reprompts_until_valid() {
        let (_root, store) = setup();
        let mut record = jane();

        let output = manage(&store, &mut record, "3 lots -1 0 7");
        assert!(output.contains("Current capacity = 500mb"));
        assert!(output.contains("Please enter a valid integer value."));
        assert!(output.contains("Capacity cannot be negative."));
        assert!(output.contains("MAILBOX CAPACITY CHANGED SUCCESSFULLY!"));
        assert_eq!(0, record.mail_capacity);
    }

    #[test]
    fn alternate_email_reprompts_until_valid() {
        let (_root, store) = setup();
        let mut record = jane();

        let output =
            manage(&store, &mut record, "4 a@b.net jane@home.org 1 7");
        assert!(output.contains("Invalid email format."));
        assert!(output.contains("ALTERNATE EMAIL SET SUCCESSFULLY!"));
        assert!(output.contains("ALTERNATIVE EMAIL: jane@home.org"));
        assert_eq!(Some("jane@home.org"), record.alter_email.as_deref());
    }

    #[test]
    fn read_from_store_hydrates_record() {
        let (_root, store) = setup();
        let mut stored = jane();
        stored.mail_capacity = 1;
        stored.alter_email = Some("jane@home.org".to_owned());
        store.upsert(&stored);

        let mut record = jane();
        let output = manage(&store, &mut record, "5 7");
        assert!(output.contains("Email read from file and updated."));
        assert_eq!(stored, record);

        record.password = "different".to_owned();
        let output = manage(&store, &mut record, "5 7");
        assert!(output.contains("Email not found."));
        assert_eq!("different", record.password);
    }

    #[test]
    fn unknown_menu_choice() {
        let (_root, store) = setup();
        let mut record = jane();

        let output = manage(&store, &mut record, "9 show 7");
        assert_eq!(2, output.matches("INVALID CHOICE! ENTER AGAIN!").count());
    }

    #[test]
    fn end_of_input_ends_session() {
        let (_root, store) = setup();
        run(&store, "");
        run(&store, "Y Jane");
        run(&store, "Y Jane Doe 2 3");
        assert!(!store.exists());
    }

    #[test]
    fn primary_address_shape() {
        assert!(looks_like_primary_address(
            "jane.doe@development.company.com"
        ));
        assert!(looks_like_primary_address("x.y@none.company.com"));
        assert!(!looks_like_primary_address("jane.doe@company.com"));
        assert!(!looks_like_primary_address("@sales.company.com"));
        assert!(!looks_like_primary_address("jane@home.org"));
        assert!(!looks_like_primary_address("not-an-address"));
    }
}
