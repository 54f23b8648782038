//! Interactive collection of run parameters
//!
//! [`ConfigurationBuilder`] drives a [`Prompter`] through the questions of
//! one operation and returns a complete [`Job`]. For sorting, the answers are
//! summarized and must be confirmed; declining starts over from the first
//! question.

use crate::config::{ConvertRequest, RunConfiguration, SortOption, SortOptions, SourceFormat};
use crate::error::Result;
use crate::operation::{Job, Operation};
use crate::output::{CliTheme, write_hint, write_key_value, write_separator, write_title};
use crate::prompt::{PathValidator, Prompter, format_date};
use chrono::NaiveDateTime;
use rust_i18n::t;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Forced-date sub-flow of the sort questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedDateStep {
    NotAsked,
    Proposed(NaiveDateTime),
    Confirmed(NaiveDateTime),
    Declined,
}

/// Collects jobs through a prompter
pub struct ConfigurationBuilder<'p, R, W, V> {
    prompter: &'p mut Prompter<R, W, V>,
}

impl<'p, R: BufRead, W: Write, V: PathValidator> ConfigurationBuilder<'p, R, W, V> {
    pub fn new(prompter: &'p mut Prompter<R, W, V>) -> Self {
        Self { prompter }
    }

    /// Collect the job for `operation`; `None` for [`Operation::Exit`]
    pub fn collect_job(&mut self, operation: Operation) -> Result<Option<Job>> {
        let job = match operation {
            Operation::Exit => return Ok(None),
            Operation::ConvertDng => Job::Convert(self.collect_convert(SourceFormat::RawImage)?),
            Operation::ConvertPng => Job::Convert(self.collect_convert(SourceFormat::PngImage)?),
            Operation::Sort => Job::Sort(self.collect_sort()?),
            Operation::FixDates => Job::FixDates {
                folder: self.collect_folder()?,
            },
            Operation::ForceDate => {
                let folder = self.collect_folder()?;
                let date = self.prompter.request_date(&t!("ask_forced_date"))?;
                Job::ForceDate { folder, date }
            }
            Operation::CheckNames => Job::CheckNames {
                folder: self.collect_folder()?,
            },
        };

        debug!(job = job.name(), "Collected job");
        Ok(Some(job))
    }

    /// Folder and delete flag for a conversion
    pub fn collect_convert(&mut self, format: SourceFormat) -> Result<ConvertRequest> {
        let folder = self
            .prompter
            .request_path(&t!("ask_convert_folder", format = format.display_name()))?;
        let delete_originals = self
            .prompter
            .request_yes_no(&t!("ask_delete_originals"), true)?;

        Ok(ConvertRequest {
            format,
            folder,
            delete_originals,
        })
    }

    fn collect_folder(&mut self) -> Result<PathBuf> {
        self.prompter.request_path(&t!("ask_folder"))
    }

    /// Ask every sort question until the summary is confirmed
    pub fn collect_sort(&mut self) -> Result<RunConfiguration> {
        loop {
            let source = self.prompter.request_path(&t!("ask_source"))?;
            let destination = self.prompter.request_path(&t!("ask_destination"))?;

            let mut options = SortOptions::new();
            options.set(
                SortOption::RenameByDate,
                self.prompter.request_yes_no(&t!("ask_rename"), true)?,
            );
            let fix_metadata = self.prompter.request_yes_no(&t!("ask_fix_metadata"), false)?;
            options.set(SortOption::FixMetadata, fix_metadata);
            options.set(
                SortOption::CreateFolderHierarchy,
                self.prompter.request_yes_no(&t!("ask_hierarchy"), true)?,
            );

            let forced_date = if fix_metadata {
                write_hint(self.prompter.output(), &t!("hint_forced_date_skipped"))?;
                None
            } else {
                self.collect_forced_date()?
            };
            options.set(SortOption::ForceDate, forced_date.is_some());
            options.set(
                SortOption::DeleteOriginals,
                self.prompter.request_yes_no(&t!("ask_delete_originals"), true)?,
            );

            let config = RunConfiguration::builder(source, destination)
                .options(options)
                .forced_date(forced_date)
                .build()?;

            self.write_summary(&config)?;
            if self.prompter.request_yes_no(&t!("ask_confirm"), true)? {
                info!(?config, "Sort configuration confirmed");
                return Ok(config);
            }

            info!("Sort configuration declined, starting over");
        }
    }

    /// Optional forced date, confirmed by the user
    fn collect_forced_date(&mut self) -> Result<Option<NaiveDateTime>> {
        let mut step = ForcedDateStep::NotAsked;

        loop {
            step = match step {
                ForcedDateStep::NotAsked => {
                    if self.prompter.request_yes_no(&t!("ask_use_forced_date"), false)? {
                        ForcedDateStep::Proposed(
                            self.prompter.request_date(&t!("ask_forced_date"))?,
                        )
                    } else {
                        ForcedDateStep::Declined
                    }
                }
                ForcedDateStep::Proposed(date) => {
                    let question = t!("ask_confirm_forced_date", date = format_date(date));
                    if self.prompter.request_yes_no(&question, true)? {
                        ForcedDateStep::Confirmed(date)
                    } else {
                        ForcedDateStep::NotAsked
                    }
                }
                ForcedDateStep::Confirmed(date) => return Ok(Some(date)),
                ForcedDateStep::Declined => return Ok(None),
            };
        }
    }

    fn write_summary(&mut self, config: &RunConfiguration) -> Result<()> {
        let out = self.prompter.output();

        writeln!(out)?;
        write_separator(out)?;
        write_title(out, &t!("summary_title"))?;
        write_separator(out)?;
        write_key_value(out, &t!("summary_source"), &config.source().display().to_string(), None)?;
        write_key_value(
            out,
            &t!("summary_destination"),
            &config.destination().display().to_string(),
            None,
        )?;

        let flags = [
            (SortOption::RenameByDate, t!("summary_rename")),
            (SortOption::FixMetadata, t!("summary_fix_metadata")),
            (SortOption::CreateFolderHierarchy, t!("summary_hierarchy")),
            (SortOption::ForceDate, t!("summary_force_date")),
            (SortOption::DeleteOriginals, t!("summary_delete_originals")),
        ];
        for (option, label) in flags {
            let (mark, color) = if config.has(option) {
                ("✅", CliTheme::SUCCESS)
            } else {
                ("🔴", CliTheme::ERROR)
            };
            write_key_value(out, &label, mark, Some(color))?;
        }

        if let Some(date) = config.forced_date() {
            write_key_value(
                out,
                &t!("summary_forced_date"),
                &format_date(date),
                Some(CliTheme::ACCENT),
            )?;
        }
        write_separator(out)?;
        Ok(())
    }
}
