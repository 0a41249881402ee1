//! Command dispatch and the interactive menu.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use srms_core::{
    AddStudentError, Config, Grade, Roster, Source, StorageOutcome, StudentInput, SyncCoordinator,
};

use crate::render::{self, MessageKind};

/// Number of students shown under recent activity.
const RECENT_ACTIVITY_COUNT: usize = 5;

const WRONG_MARK_COUNT: &str = "Please enter exactly three marks, separated by spaces";

/// Split a menu line into the three subject marks.
fn split_marks(line: &str) -> Option<[&str; 3]> {
    let mut parts = line.split_whitespace();
    let marks = [parts.next()?, parts.next()?, parts.next()?];
    parts.next().is_none().then_some(marks)
}

const USAGE: &str = "\
Usage: srms [COMMAND]

Commands:
  add <roll-no> <name> <math> <science> <english>   Add a student
  search <roll-no>                                  Find a student by roll number
  list [grade]                                      List students, optionally by grade
  dashboard                                         Totals and recent activity
  analytics                                         Score range, pass rate, grade chart
  help                                              Show this message

With no command, an interactive menu starts.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        roll_no: String,
        name: String,
        marks: [String; 3],
    },
    Search(String),
    List(Option<Grade>),
    Dashboard,
    Analytics,
    Help,
}

impl Command {
    /// Parse command-line arguments. `Ok(None)` means no command was given.
    pub fn parse(args: &[String]) -> Result<Option<Self>, String> {
        let Some((first, rest)) = args.split_first() else {
            return Ok(None);
        };

        let command = match (first.as_str(), rest) {
            ("add", [roll_no, name, m1, m2, m3]) => Command::Add {
                roll_no: roll_no.clone(),
                name: name.clone(),
                marks: [m1.clone(), m2.clone(), m3.clone()],
            },
            ("search", [roll_no]) => Command::Search(roll_no.clone()),
            ("list", []) => Command::List(None),
            ("list", [grade]) => Command::List(Some(
                grade.parse().map_err(|e| format!("{}\n\n{}", e, USAGE))?,
            )),
            ("dashboard", []) => Command::Dashboard,
            ("analytics", []) => Command::Analytics,
            ("help" | "--help" | "-h", _) => Command::Help,
            _ => return Err(USAGE.to_string()),
        };
        Ok(Some(command))
    }
}

/// Front-end state: the coordinator plus whatever roster is on screen.
pub struct App {
    sync: SyncCoordinator,
    config: Config,
    displayed: Roster,
}

impl App {
    pub fn new(sync: SyncCoordinator, config: Config) -> Self {
        let displayed = sync.roster().clone();
        Self {
            sync,
            config,
            displayed,
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        debug!(?command, "Running command");
        match command {
            Command::Add { roll_no, name, marks } => {
                let marks = [marks[0].as_str(), marks[1].as_str(), marks[2].as_str()];
                self.add_student(&roll_no, &name, marks).await;
            }
            Command::Search(roll_no) => self.search(&roll_no).await,
            Command::List(grade) => {
                self.refresh().await;
                match grade {
                    Some(grade) => self.filter(grade),
                    None => println!("{}", render::roster_table(&self.displayed)),
                }
            }
            Command::Dashboard => self.dashboard(),
            Command::Analytics => println!("{}", render::analytics(&self.sync.summary())),
            Command::Help => println!("{}", USAGE),
        }
        Ok(())
    }

    async fn add_student(&mut self, roll_no: &str, name: &str, marks: [&str; 3]) {
        let input = match StudentInput::parse(roll_no, name, marks) {
            Ok(input) => input,
            Err(e) => return render::message(MessageKind::Error, &e.to_string()),
        };

        match self.sync.add_student(&input).await {
            Ok((record, StorageOutcome::Remote)) => {
                render::message(MessageKind::Success, "Student added successfully!");
                println!("{}", render::student_card(&record));
            }
            Ok((record, StorageOutcome::LocalOnly)) => {
                render::message(
                    MessageKind::Warning,
                    "Student saved locally only (remote store not available)",
                );
                println!("{}", render::student_card(&record));
            }
            Err(AddStudentError::DuplicateRollNumber(_)) => {
                render::message(MessageKind::Error, "Roll number already exists!")
            }
            Err(e) => render::message(MessageKind::Error, &e.to_string()),
        }
        self.displayed = self.sync.roster().clone();
    }

    async fn search(&mut self, roll_no: &str) {
        let roll_no = match roll_no.trim().parse::<u32>() {
            Ok(r) if r > 0 => r,
            _ => return render::message(MessageKind::Error, "Please enter a valid roll number"),
        };

        match self.sync.search_by_roll(roll_no).await {
            Some((record, source)) => {
                println!("{}", render::student_card(&record));
                if source == Source::Local && !self.config.offline_mode {
                    render::message(MessageKind::Warning, "Showing locally saved record");
                }
            }
            None => render::message(MessageKind::Warning, "Student not found"),
        }
    }

    /// Pull the roster from the remote store, keeping local data on failure.
    async fn refresh(&mut self) {
        let (roster, source) = self.sync.list_all().await;
        self.displayed = roster.clone();
        if source == Source::Local && !self.config.offline_mode {
            render::message(
                MessageKind::Warning,
                "Showing locally saved students (remote store not available or empty)",
            );
        }
    }

    fn filter(&self, grade: Grade) {
        let filtered = SyncCoordinator::filter_by_grade(&self.displayed, grade);
        println!("{}", render::roster_table(&filtered));
    }

    fn dashboard(&self) {
        let age = self
            .sync
            .cache()
            .age()
            .map(|a| a.age_display())
            .unwrap_or_else(|| "never".to_string());
        let recent = self.sync.roster().recent(RECENT_ACTIVITY_COUNT);
        println!("{}", render::dashboard(&self.sync.summary(), &recent, &age));
    }

    // =========================================================================
    // Interactive menu
    // =========================================================================

    fn prompt(label: &str) -> Result<Option<String>> {
        print!("{}", label);
        io::stdout().flush()?;
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub async fn interactive(&mut self) -> Result<()> {
        loop {
            println!();
            println!("===== Student Result Management System =====");
            println!("1. Add Student Record");
            println!("2. Search Student (by Roll No)");
            println!("3. Display All Students");
            println!("4. Filter Displayed Students by Grade");
            println!("5. Dashboard");
            println!("6. Analytics");
            println!("7. Exit");

            let Some(choice) = Self::prompt("Enter choice: ")? else {
                return Ok(());
            };

            match choice.trim() {
                "1" => {
                    let Some(roll_no) = Self::prompt("Enter Roll No: ")? else { return Ok(()) };
                    let Some(name) = Self::prompt("Enter Name: ")? else { return Ok(()) };
                    let Some(marks) = Self::prompt("Enter Marks (3 subjects): ")? else { return Ok(()) };
                    match split_marks(&marks) {
                        Some(marks) => self.add_student(&roll_no, &name, marks).await,
                        None => render::message(MessageKind::Error, WRONG_MARK_COUNT),
                    }
                }
                "2" => {
                    let Some(roll_no) = Self::prompt("Enter Roll No: ")? else { return Ok(()) };
                    self.search(&roll_no).await;
                }
                "3" => {
                    self.refresh().await;
                    println!("{}", render::roster_table(&self.displayed));
                }
                "4" => {
                    let Some(grade) = Self::prompt("Grade (A+, A, B, C, F): ")? else { return Ok(()) };
                    match grade.parse::<Grade>() {
                        Ok(grade) => self.filter(grade),
                        Err(e) => render::message(MessageKind::Error, &e.to_string()),
                    }
                }
                "5" => self.dashboard(),
                "6" => println!("{}", render::analytics(&self.sync.summary())),
                "7" => {
                    println!("Exiting... Goodbye!");
                    return Ok(());
                }
                _ => render::message(MessageKind::Error, "Invalid choice!"),
            }
        }
    }
}
