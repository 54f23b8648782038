//! Interactive menu loop

use crate::builder::ConfigurationBuilder;
use crate::dispatch::{OperationDispatcher, RunOutcome};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::output::{write_hint, write_separator, write_title, write_warning};
use crate::prompt::{PathValidator, Prompter};
use rust_i18n::t;
use std::io::{BufRead, Write};
use tracing::info;

/// Menu-driven session over one prompter and one dispatcher
pub struct App<E, R, W, V> {
    prompter: Prompter<R, W, V>,
    dispatcher: OperationDispatcher<E, W>,
    show_banner: bool,
}

impl<E: Engine, R: BufRead, W: Write, V: PathValidator> App<E, R, W, V> {
    /// `prompter` and the dispatcher's `report_out` usually both point at the terminal
    pub fn new(engine: E, prompter: Prompter<R, W, V>, report_out: W) -> Self {
        Self {
            prompter,
            dispatcher: OperationDispatcher::new(engine, report_out),
            show_banner: true,
        }
    }

    pub fn with_banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    pub fn prompter(&mut self) -> &mut Prompter<R, W, V> {
        &mut self.prompter
    }

    pub fn dispatcher(&mut self) -> &mut OperationDispatcher<E, W> {
        &mut self.dispatcher
    }

    /// Show the menu until the user exits or the input closes
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.write_banner()?;
        }

        loop {
            self.write_menu()?;
            let operation = match self.read_choice() {
                Ok(Some(operation)) => operation,
                Ok(None) => continue,
                Err(Error::InputClosed { attempts }) => {
                    info!(attempts, "Input closed, leaving menu");
                    return self.write_goodbye();
                }
                Err(e) => return Err(e),
            };

            if operation == Operation::Exit {
                info!("Exit selected");
                return self.write_goodbye();
            }

            match self.run_operation(operation) {
                Ok(_) => {}
                Err(Error::InputClosed { attempts }) => {
                    info!(attempts, "Input closed during collection, leaving menu");
                    return self.write_goodbye();
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Collect and dispatch one operation without the menu
    pub fn run_single(&mut self, operation: Operation) -> Result<Option<RunOutcome>> {
        match self.run_operation(operation) {
            Err(Error::InputClosed { attempts }) => {
                info!(attempts, "Input closed before the job was complete");
                Ok(None)
            }
            other => other,
        }
    }

    fn run_operation(&mut self, operation: Operation) -> Result<Option<RunOutcome>> {
        info!(operation = operation.id(), "Operation selected");
        let job = ConfigurationBuilder::new(&mut self.prompter).collect_job(operation)?;

        Ok(job.map(|job| {
            let outcome = self.dispatcher.run(&job);
            let _ = writeln!(self.dispatcher.output());
            outcome
        }))
    }

    /// `None` when the answer names no operation
    fn read_choice(&mut self) -> Result<Option<Operation>> {
        let answer = self.prompter.request_string(&t!("menu_prompt"))?;
        match answer.trim().parse::<Operation>() {
            Ok(operation) => Ok(Some(operation)),
            Err(e) => {
                info!(error = %e, "Invalid menu choice");
                write_warning(
                    self.prompter.output(),
                    &t!("menu_invalid_choice", choice = answer.trim()),
                )?;
                Ok(None)
            }
        }
    }

    fn write_banner(&mut self) -> Result<()> {
        let out = self.prompter.output();
        write_separator(out)?;
        write_title(
            out,
            &format!("📷 {} v{}", t!("app_name"), env!("CARGO_PKG_VERSION")),
        )?;
        write_separator(out)?;
        write_hint(out, &t!("app_tagline"))?;
        Ok(())
    }

    fn write_menu(&mut self) -> Result<()> {
        let out = self.prompter.output();
        writeln!(out)?;
        for operation in Operation::ALL {
            writeln!(out, "  [{}] {}", operation.id(), operation.label())?;
        }
        Ok(())
    }

    fn write_goodbye(&mut self) -> Result<()> {
        write_hint(self.prompter.output(), &t!("app_goodbye"))?;
        Ok(())
    }
}
