//! Run lifecycle
//!
//! The dispatcher hands one [`Job`] to the engine, forwards every event to
//! the [`EventReporter`], and turns what it observed into a [`RunOutcome`].

use crate::engine::{Engine, EngineError, RunResult};
use crate::operation::Job;
use crate::output::{write_error, write_separator, write_success, write_warning};
use crate::report::{Disposition, EventReporter, Reportable};
use rust_i18n::t;
use std::cell::RefCell;
use std::fmt::Debug;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Completed { result: RunResult, elapsed: Duration },
    Aborted { reason: String, elapsed: Duration },
    Cancelled { elapsed: Duration },
    Failed { error: EngineError, elapsed: Duration },
}

impl RunOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            RunOutcome::Completed { elapsed, .. }
            | RunOutcome::Aborted { elapsed, .. }
            | RunOutcome::Cancelled { elapsed }
            | RunOutcome::Failed { elapsed, .. } => *elapsed,
        }
    }
}

/// Terminal decision taken while the engine was still running
enum Halt {
    Aborted(String),
    Cancelled,
}

/// Shared sink for the progress and error callbacks of one run
struct Observer<'a, W> {
    reporter: RefCell<&'a mut EventReporter<W>>,
    halt: RefCell<Option<Halt>>,
}

impl<'a, W: Write> Observer<'a, W> {
    fn new(reporter: &'a mut EventReporter<W>) -> Self {
        Self {
            reporter: RefCell::new(reporter),
            halt: RefCell::new(None),
        }
    }

    fn observe<E: Reportable + Debug>(&self, event: E) {
        let disposition = self.reporter.borrow_mut().report(&event);
        let mut halt = self.halt.borrow_mut();

        // The first fatal event wins over everything else
        if matches!(*halt, Some(Halt::Aborted(_))) {
            return;
        }
        match disposition {
            Disposition::Continue => {}
            Disposition::Abort => *halt = Some(Halt::Aborted(event.message())),
            Disposition::Cancelled => *halt = Some(Halt::Cancelled),
        }
    }

    fn into_halt(self) -> Option<Halt> {
        self.halt.into_inner()
    }
}

/// Runs jobs against an engine and prints their summaries
pub struct OperationDispatcher<E, W> {
    engine: E,
    reporter: EventReporter<W>,
}

impl<E: Engine, W: Write> OperationDispatcher<E, W> {
    pub fn new(engine: E, out: W) -> Self {
        Self {
            engine,
            reporter: EventReporter::new(out),
        }
    }

    pub fn output(&mut self) -> &mut W {
        self.reporter.output()
    }

    /// Execute `job` to completion and print its summary
    pub fn run(&mut self, job: &Job) -> RunOutcome {
        info!(job = job.name(), ?job, "Starting run");
        let started = Instant::now();

        let observer = Observer::new(&mut self.reporter);
        let engine = &self.engine;
        let result = match job {
            Job::Convert(request) => engine.convert(
                request,
                &mut |e| observer.observe(e),
                &mut |e| observer.observe(e),
            ),
            Job::Sort(config) => engine.sort(
                config,
                &mut |e| observer.observe(e),
                &mut |e| observer.observe(e),
            ),
            Job::FixDates { folder } => engine.fix_dates(
                folder,
                &mut |e| observer.observe(e),
                &mut |e| observer.observe(e),
            ),
            Job::ForceDate { folder, date } => engine.force_date(
                folder,
                *date,
                &mut |e| observer.observe(e),
                &mut |e| observer.observe(e),
            ),
            Job::CheckNames { folder } => engine.check_names(
                folder,
                &mut |e| observer.observe(e),
                &mut |e| observer.observe(e),
            ),
        };
        let halt = observer.into_halt();
        let elapsed = started.elapsed();

        let outcome = match (halt, result) {
            (Some(Halt::Aborted(reason)), _) => RunOutcome::Aborted { reason, elapsed },
            (Some(Halt::Cancelled), _) | (None, Err(EngineError::Cancelled)) => {
                RunOutcome::Cancelled { elapsed }
            }
            (None, Err(error)) => RunOutcome::Failed { error, elapsed },
            (None, Ok(result)) => RunOutcome::Completed { result, elapsed },
        };

        log_outcome(job, &outcome);
        if let Err(e) = self.print_summary(job, &outcome) {
            warn!(error = %e, "Failed to print run summary");
        }
        outcome
    }

    fn print_summary(&mut self, job: &Job, outcome: &RunOutcome) -> io::Result<()> {
        let out = self.reporter.output();
        let title = job.title();
        let seconds = format!("{:.1}", outcome.elapsed().as_secs_f64());

        write_separator(out)?;
        match outcome {
            RunOutcome::Completed { result, .. } => write_success(
                out,
                &t!(
                    "summary_completed",
                    job = title,
                    seconds = seconds,
                    processed = result.processed_count,
                    errors = result.error_count()
                ),
            ),
            RunOutcome::Aborted { reason, .. } => {
                write_error(out, &t!("summary_aborted", job = title, reason = reason))
            }
            RunOutcome::Cancelled { .. } => write_warning(
                out,
                &t!("summary_cancelled", job = title, seconds = seconds),
            ),
            RunOutcome::Failed { error, .. } => write_error(
                out,
                &t!("summary_failed", job = title, error = error.to_string()),
            ),
        }
    }
}

fn log_outcome(job: &Job, outcome: &RunOutcome) {
    let elapsed_ms = outcome.elapsed().as_millis() as u64;
    match outcome {
        RunOutcome::Completed { result, .. } => info!(
            job = job.name(),
            elapsed_ms,
            processed = result.processed_count,
            errors = result.error_count(),
            "Run completed"
        ),
        RunOutcome::Aborted { reason, .. } => {
            error!(job = job.name(), elapsed_ms, %reason, "Run aborted")
        }
        RunOutcome::Cancelled { .. } => info!(job = job.name(), elapsed_ms, "Run cancelled"),
        RunOutcome::Failed { error, .. } => {
            error!(job = job.name(), elapsed_ms, %error, "Run failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConvertRequest, RunConfiguration, SortOption, SourceFormat};
    use crate::engine::events::*;
    use chrono::NaiveDateTime;
    use std::path::{Path, PathBuf};

    #[derive(Clone)]
    enum Step<P, E> {
        Progress(P),
        Error(E),
    }

    /// Engine that replays a fixed event script and then returns `outcome`
    #[derive(Default)]
    struct ScriptedEngine {
        sort: Vec<Step<SortProgress, FileProcessingError>>,
        fix: Vec<Step<FixDateProgress, FixDateError>>,
        check: Vec<Step<CheckProgress, CheckError>>,
        outcome: RefCell<Option<Result<RunResult, EngineError>>>,
    }

    impl ScriptedEngine {
        fn returning(mut self, outcome: Result<RunResult, EngineError>) -> Self {
            self.outcome = RefCell::new(Some(outcome));
            self
        }

        fn play<P: Clone, E: Clone>(
            &self,
            steps: &[Step<P, E>],
            progress: &mut dyn FnMut(P),
            errors: &mut dyn FnMut(E),
        ) -> Result<RunResult, EngineError> {
            for step in steps {
                match step.clone() {
                    Step::Progress(p) => progress(p),
                    Step::Error(e) => errors(e),
                }
            }
            self.outcome
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Ok(RunResult::new()))
        }
    }

    impl Engine for ScriptedEngine {
        fn convert(
            &self,
            _: &ConvertRequest,
            progress: &mut dyn FnMut(ConversionProgress),
            errors: &mut dyn FnMut(ConversionError),
        ) -> Result<RunResult, EngineError> {
            self.play::<ConversionProgress, ConversionError>(&[], progress, errors)
        }

        fn sort(
            &self,
            _: &RunConfiguration,
            progress: &mut dyn FnMut(SortProgress),
            errors: &mut dyn FnMut(FileProcessingError),
        ) -> Result<RunResult, EngineError> {
            self.play(&self.sort, progress, errors)
        }

        fn fix_dates(
            &self,
            _: &Path,
            progress: &mut dyn FnMut(FixDateProgress),
            errors: &mut dyn FnMut(FixDateError),
        ) -> Result<RunResult, EngineError> {
            self.play(&self.fix, progress, errors)
        }

        fn force_date(
            &self,
            _: &Path,
            _: NaiveDateTime,
            progress: &mut dyn FnMut(FixDateProgress),
            errors: &mut dyn FnMut(FixDateError),
        ) -> Result<RunResult, EngineError> {
            self.play(&self.fix, progress, errors)
        }

        fn check_names(
            &self,
            _: &Path,
            progress: &mut dyn FnMut(CheckProgress),
            errors: &mut dyn FnMut(CheckError),
        ) -> Result<RunResult, EngineError> {
            self.play(&self.check, progress, errors)
        }
    }

    fn dispatcher(engine: ScriptedEngine) -> OperationDispatcher<ScriptedEngine, Vec<u8>> {
        OperationDispatcher::new(engine, Vec::new())
    }

    fn output(d: &mut OperationDispatcher<ScriptedEngine, Vec<u8>>) -> String {
        String::from_utf8_lossy(d.output()).into_owned()
    }

    fn sort_job() -> Job {
        let config = RunConfiguration::builder("/in", "/out")
            .option(SortOption::RenameByDate)
            .option(SortOption::CreateFolderHierarchy)
            .build()
            .unwrap();
        Job::Sort(config)
    }

    #[test]
    fn test_sort_run_completes_with_summary() {
        let engine = ScriptedEngine {
            sort: vec![
                Step::Progress(SortProgress::Started {
                    source: "/in".into(),
                    destination: "/out".into(),
                }),
                Step::Progress(SortProgress::FileProcessed {
                    source: "/in/a.jpg".into(),
                    target: "/out/Photos/2024/03/2024-03-12--14-30.jpg".into(),
                }),
                Step::Progress(SortProgress::Completed { processed: 1 }),
            ],
            ..Default::default()
        }
        .returning(Ok(RunResult {
            processed_count: 1,
            errors: Vec::new(),
        }));

        let mut d = dispatcher(engine);
        let outcome = d.run(&sort_job());

        match outcome {
            RunOutcome::Completed { result, .. } => {
                assert_eq!(result.processed_count, 1);
                assert_eq!(result.error_count(), 0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        let text = output(&mut d);
        assert!(text.contains("a.jpg"));
        assert!(text.contains("1 processed"));
        assert!(text.contains("0 errors"));
    }

    #[test]
    fn test_item_failures_do_not_abort() {
        let mut result = RunResult::new();
        result.record_processed();
        result.record_failure("/in/b.jpg", "busy");

        let engine = ScriptedEngine {
            sort: vec![
                Step::Error(FileProcessingError::DeleteFailed {
                    file: "/in/b.jpg".into(),
                    reason: "busy".into(),
                }),
                Step::Progress(SortProgress::Completed { processed: 1 }),
            ],
            ..Default::default()
        }
        .returning(Ok(result));

        let outcome = dispatcher(engine).run(&sort_job());
        assert!(matches!(outcome, RunOutcome::Completed { ref result, .. } if result.error_count() == 1));
    }

    #[test]
    fn test_fatal_event_aborts_even_if_engine_returns_ok() {
        let engine = ScriptedEngine {
            fix: vec![Step::Error(FixDateError::FolderNotAccessible {
                folder: "/gone".into(),
                reason: "No such file or directory".into(),
            })],
            ..Default::default()
        };

        let mut d = dispatcher(engine);
        let outcome = d.run(&Job::FixDates {
            folder: PathBuf::from("/gone"),
        });

        match outcome {
            RunOutcome::Aborted { reason, .. } => assert!(reason.contains("/gone")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!output(&mut d).contains("processed"));
    }

    #[test]
    fn test_cancellation_is_not_an_error() {
        let engine = ScriptedEngine {
            check: vec![
                Step::Progress(CheckProgress::Started {
                    folder: "/photos".into(),
                }),
                Step::Error(CheckError::Cancelled),
            ],
            ..Default::default()
        }
        .returning(Err(EngineError::Cancelled));

        let outcome = dispatcher(engine).run(&Job::CheckNames {
            folder: PathBuf::from("/photos"),
        });
        assert!(matches!(outcome, RunOutcome::Cancelled { .. }));
    }

    #[test]
    fn test_abort_outranks_cancellation() {
        let engine = ScriptedEngine {
            check: vec![
                Step::Error(CheckError::Cancelled),
                Step::Error(CheckError::CantOpenFolder {
                    folder: "/photos".into(),
                    reason: "denied".into(),
                }),
            ],
            ..Default::default()
        };

        let outcome = dispatcher(engine).run(&Job::CheckNames {
            folder: PathBuf::from("/photos"),
        });
        assert!(matches!(outcome, RunOutcome::Aborted { .. }));
    }

    #[test]
    fn test_silent_engine_error_is_failure() {
        let engine = ScriptedEngine::default()
            .returning(Err(EngineError::Unsupported("DNG to HEIC conversion".into())));

        let mut d = dispatcher(engine);
        let outcome = d.run(&Job::Convert(ConvertRequest {
            format: SourceFormat::RawImage,
            folder: PathBuf::from("/raw"),
            delete_originals: true,
        }));

        assert!(matches!(
            outcome,
            RunOutcome::Failed {
                error: EngineError::Unsupported(_),
                ..
            }
        ));
        assert!(output(&mut d).contains("HEIC"));
    }
}
