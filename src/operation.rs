//! Menu operations and the jobs they produce

use crate::config::{ConvertRequest, RunConfiguration, SourceFormat};
use chrono::NaiveDateTime;
use rust_i18n::t;
use std::borrow::Cow;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// One of the seven menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Exit,
    ConvertDng,
    Sort,
    FixDates,
    ForceDate,
    CheckNames,
    ConvertPng,
}

impl Operation {
    /// Menu order
    pub const ALL: [Operation; 7] = [
        Operation::ConvertDng,
        Operation::Sort,
        Operation::FixDates,
        Operation::ForceDate,
        Operation::CheckNames,
        Operation::ConvertPng,
        Operation::Exit,
    ];

    /// Identifier typed by the user
    pub fn id(self) -> &'static str {
        match self {
            Operation::Exit => "0",
            Operation::ConvertDng => "1",
            Operation::Sort => "2",
            Operation::FixDates => "3",
            Operation::ForceDate => "4",
            Operation::CheckNames => "5",
            Operation::ConvertPng => "6",
        }
    }

    /// Localized menu label
    pub fn label(self) -> Cow<'static, str> {
        match self {
            Operation::Exit => t!("menu_exit"),
            Operation::ConvertDng => t!("menu_convert_dng"),
            Operation::Sort => t!("menu_sort"),
            Operation::FixDates => t!("menu_fix_dates"),
            Operation::ForceDate => t!("menu_force_date"),
            Operation::CheckNames => t!("menu_check_names"),
            Operation::ConvertPng => t!("menu_convert_png"),
        }
    }
}

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.id() == s)
            .ok_or_else(|| ParseOperationError(s.to_string()))
    }
}

/// Input that does not name an operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not an operation (expected 0-6)")]
pub struct ParseOperationError(String);

/// A fully collected request for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Convert(ConvertRequest),
    Sort(RunConfiguration),
    FixDates { folder: PathBuf },
    ForceDate { folder: PathBuf, date: NaiveDateTime },
    CheckNames { folder: PathBuf },
}

impl Job {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Job::Convert(request) => match request.format {
                SourceFormat::RawImage => "convert-dng",
                SourceFormat::PngImage => "convert-png",
            },
            Job::Sort(_) => "sort",
            Job::FixDates { .. } => "fix-dates",
            Job::ForceDate { .. } => "force-date",
            Job::CheckNames { .. } => "check-names",
        }
    }

    /// Localized name used in summaries
    pub fn title(&self) -> Cow<'static, str> {
        match self {
            Job::Convert(_) => t!("job_convert"),
            Job::Sort(_) => t!("job_sort"),
            Job::FixDates { .. } => t!("job_fix_dates"),
            Job::ForceDate { .. } => t!("job_force_date"),
            Job::CheckNames { .. } => t!("job_check_names"),
        }
    }
}
