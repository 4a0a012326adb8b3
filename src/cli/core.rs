//! Core CLI loop, dispatch, and shell context helpers.

use std::{io, path::PathBuf, thread};

use chrono::Utc;
use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;

use crate::{
    config::{Config, ConfigManager},
    controller::FormController,
    errors::FormError,
    form::student_form,
    scheduler::SystemClock,
    storage::JsonFileStore,
    submission::SimulatedSubmitter,
};

pub use crate::errors::CliError;

use super::commands;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

pub type ShellController =
    FormController<JsonFileStore, SimulatedSubmitter<SystemClock>, SystemClock>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub controller: ShellController,
    pub config: Config,
    pub base_dir: PathBuf,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
    announced: Option<u64>,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::from_config_manager(mode, ConfigManager::new()?)
    }

    pub fn with_base_dir(mode: CliMode, base: PathBuf) -> Result<Self, CliError> {
        Self::from_config_manager(mode, ConfigManager::with_base_dir(base)?)
    }

    fn from_config_manager(mode: CliMode, manager: ConfigManager) -> Result<Self, CliError> {
        let config = manager.load()?;
        let base_dir = manager.base_dir().to_path_buf();
        output::set_preferences(OutputPreferences {
            quiet_mode: config.quiet,
            plain: mode == CliMode::Script,
        });

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let storage = JsonFileStore::in_dir(Some(base_dir.clone()))?;
        let controller = FormController::new(
            student_form(),
            storage,
            SimulatedSubmitter::new(SystemClock),
            SystemClock,
            &config,
        );

        let mut context = Self {
            mode,
            registry,
            controller,
            config,
            base_dir,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
            announced: None,
        };
        context.controller.start();
        context.announce();
        Ok(context)
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn prompt(&self) -> String {
        format!("student-form [{}%]> ", self.controller.view().progress)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        // Timers that fell due while the user was typing run before the
        // command can re-arm or cancel them.
        self.settle();
        if let Some(handler) = self.registry.handler(command) {
            let result = handler(self, args);
            self.settle();
            match result {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    /// Runs due timers. While a submission is in flight, blocks until it
    /// completes.
    pub(crate) fn settle(&mut self) {
        loop {
            self.controller.tick();
            if !self.controller.is_submitting() {
                break;
            }
            let Some(deadline) = self.controller.next_deadline() else {
                break;
            };
            let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
            thread::sleep(wait);
        }
        self.announce();
    }

    /// Prints the active notification once.
    pub(crate) fn announce(&mut self) {
        let Some(active) = self.controller.notification() else {
            return;
        };
        if self.announced == Some(active.id) {
            return;
        }
        self.announced = Some(active.id);
        output::notification(active.severity, &active.message);
    }

    /// Saves a draft that is still waiting for its autosave window.
    pub(crate) fn shutdown(&mut self) {
        if self.controller.flush().is_some() {
            self.announce();
        }
        tracing::debug!("shell closed");
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, &tokens[0], &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        if let Some(best) = self.registry.closest(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Input(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Form(FormError::UnknownField(name)) => {
                output::error(format!("Unknown field `{}`.", name));
                output::hint("Use `show` to list the form fields.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(base: PathBuf, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_base_dir(CliMode::Script, base)?;
    for line in lines {
        match app.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{controller::SubmitPhase, draft::DRAFT_SAVED_MESSAGE, storage::KeyValueStore};
    use std::fs;
    use tempfile::TempDir;

    fn fast_home() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"submission_delay_ms":0}"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn set_and_save_persist_the_draft() {
        let home = fast_home();

        let app = process_script(
            home.path().to_path_buf(),
            &["set firstName Jo", "set school \"Central High\"", "save"],
        )
        .unwrap();

        let raw = app
            .controller
            .drafts()
            .storage()
            .get("studentFormDraft")
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"school\":\"Central High\""));
        assert_eq!(
            app.controller.notification().unwrap().message,
            DRAFT_SAVED_MESSAGE
        );
    }

    #[test]
    fn unknown_field_is_reported_as_error() {
        let home = fast_home();
        let mut app = ShellContext::with_base_dir(CliMode::Script, home.path().into()).unwrap();

        let err = app.process_line("set nickname JJ").unwrap_err();

        assert!(matches!(err, CommandError::Form(FormError::UnknownField(_))));
    }

    #[test]
    fn submit_completes_before_returning() {
        let home = fast_home();

        let app = process_script(
            home.path().to_path_buf(),
            &[
                "set firstName Jo",
                "set lastName Doe",
                "set email jo@school.edu",
                "set dateOfBirth 2005-04-01",
                "set studentId S-1",
                "set school Central",
                "change grade 10",
                "submit",
            ],
        )
        .unwrap();

        assert_eq!(app.controller.phase(), SubmitPhase::Idle);
        assert_eq!(app.controller.modal().unwrap().name, "Jo Doe");
        assert!(app.controller.drafts().read().is_none());
    }

    #[test]
    fn autosave_due_during_a_pause_runs_before_the_next_command() {
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.json"),
            r#"{"submission_delay_ms":0,"autosave_delay_ms":50}"#,
        )
        .unwrap();
        let mut app = ShellContext::with_base_dir(CliMode::Script, home.path().into()).unwrap();

        app.process_line("set firstName Jo").unwrap();
        thread::sleep(std::time::Duration::from_millis(150));
        app.process_line("set lastName Doe").unwrap();

        let draft = app.controller.drafts().read().unwrap();
        assert_eq!(draft.get("firstName"), Some("Jo"));
        assert_eq!(draft.get("lastName"), None);
        assert!(app.controller.drafts().autosave_pending());
    }

    #[test]
    fn exit_stops_processing() {
        let home = fast_home();

        let app = process_script(
            home.path().to_path_buf(),
            &["exit", "set firstName Jo"],
        )
        .unwrap();

        assert_eq!(app.controller.snapshot().get("firstName"), Some(""));
    }
}
