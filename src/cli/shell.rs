use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    Cmd, Context as ReadlineContext, Editor, KeyEvent,
};

use crate::cli::core::{CliError, CliMode, LoopControl, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandRegistry;
use crate::form::{FieldKind, FormDescriptor, FormSurface};

/// Commands are read from stdin instead of a line editor when this is set.
pub const SCRIPT_ENV: &str = "STUDENT_FORM_CLI_SCRIPT";

/// Commands whose first argument is a field name.
const FIELD_COMMANDS: [&str; 4] = ["set", "change", "focus", "blur"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    let outcome = match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    };
    context.shutdown();
    outcome
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let helper = CommandHelper::new(&context.registry, context.controller.form().descriptor());
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(helper));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output::info("Type `help` to list commands, `show` to see the form.");

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.trim()).ok();
                }
                if run_line(context, &line)? == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        if run_line(context, &line?)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Executes one input line. Command failures are reported and the shell
/// keeps going; only output failures end the session.
fn run_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        // An empty line still lets pending autosaves and expiries run.
        context.settle();
        return Ok(LoopControl::Continue);
    };

    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.trim().to_string());

    match context.dispatch(&raw.to_lowercase(), raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        Ok(control) => Ok(control),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

/// Completes command names, field names and choice values, and hints the
/// argument list once a command has been typed.
#[derive(rustyline::Helper, rustyline::Validator)]
struct CommandHelper {
    commands: Vec<(&'static str, &'static str)>,
    fields: Vec<&'static str>,
    choices: Vec<(&'static str, Vec<&'static str>)>,
}

impl CommandHelper {
    fn new(registry: &CommandRegistry, form: &FormDescriptor) -> Self {
        Self {
            commands: registry
                .list()
                .map(|entry| (entry.name, entry.arguments()))
                .collect(),
            fields: form.names().collect(),
            choices: form
                .fields
                .iter()
                .filter_map(|field| match &field.kind {
                    FieldKind::Choice(options) => Some((field.name, options.clone())),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Start of the word under the cursor and the candidates for it.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<&'static str>) {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let needle = prefix[start..].to_lowercase();
        let words: Vec<String> = prefix[..start]
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let pool: Vec<&'static str> = match words.as_slice() {
            [] | ["help"] => self.commands.iter().map(|(name, _)| *name).collect(),
            [command] if FIELD_COMMANDS.contains(command) => self.fields.clone(),
            ["set" | "change", field] => self
                .choices
                .iter()
                .find(|(name, _)| name.to_lowercase() == *field)
                .map(|(_, options)| options.clone())
                .unwrap_or_default(),
            ["tab"] => vec!["back"],
            ["close"] => vec!["backdrop", "content"],
            _ => Vec::new(),
        };

        let matches = pool
            .into_iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&needle))
            .collect();
        (start, matches)
    }

    /// Argument list of the command typed so far, shown after `<command> `.
    fn usage_hint(&self, line: &str, pos: usize) -> Option<String> {
        if pos != line.len() || !line.ends_with(' ') {
            return None;
        }
        let mut words = line.split_whitespace();
        let command = words.next()?.to_lowercase();
        if words.next().is_some() {
            return None;
        }
        self.commands
            .iter()
            .find(|(name, _)| *name == command)
            .map(|(_, arguments)| *arguments)
            .filter(|arguments| !arguments.is_empty())
            .map(str::to_string)
    }
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(line, pos);
        let pairs = matches
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        self.usage_hint(line, pos)
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use crate::form::student_form;

    fn helper() -> CommandHelper {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        CommandHelper::new(&registry, &student_form())
    }

    #[test]
    fn completes_command_names() {
        let (start, matches) = helper().candidates("su", 2);

        assert_eq!(start, 0);
        assert_eq!(matches, vec!["submit"]);
    }

    #[test]
    fn completes_field_names_for_field_commands() {
        let line = "set first";
        let (start, matches) = helper().candidates(line, line.len());

        assert_eq!(start, 4);
        assert_eq!(matches, vec!["firstName"]);

        let line = "blur ";
        let (_, matches) = helper().candidates(line, line.len());
        assert_eq!(matches.len(), student_form().fields.len());
    }

    #[test]
    fn completes_choice_values() {
        let line = "change grade 1";
        let (start, matches) = helper().candidates(line, line.len());

        assert_eq!(start, 13);
        assert_eq!(matches, vec!["10", "11", "12"]);
    }

    #[test]
    fn free_text_values_get_no_candidates() {
        let line = "set school Cen";
        let (_, matches) = helper().candidates(line, line.len());

        assert!(matches.is_empty());
    }

    #[test]
    fn hints_arguments_after_command() {
        let helper = helper();

        assert_eq!(
            helper.usage_hint("set ", 4).as_deref(),
            Some("<field> <value>")
        );
        assert_eq!(helper.usage_hint("set", 3), None);
        assert_eq!(helper.usage_hint("submit ", 7), None);
    }
}
