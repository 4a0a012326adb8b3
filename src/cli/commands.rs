use std::{path::PathBuf, thread, time::Duration};

use dialoguer::{Input, Select};

use crate::{
    controller::{FormEvent, KeyPress, SubmitOutcome},
    form::{FieldKind, FormSurface},
    report::SubmissionSummary,
};

use super::core::{CliMode, CommandError, CommandResult, ShellContext};
use super::output;
use super::registry::{CommandEntry, CommandRegistry};

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    for entry in definitions() {
        registry.register(entry);
    }
}

fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
        CommandEntry::new("show", "Render the form", "show", cmd_show),
        CommandEntry::new(
            "set",
            "Type a value into a field (autosaves after a pause)",
            "set <field> <value>",
            cmd_set,
        ),
        CommandEntry::new(
            "change",
            "Commit a value to a field and save immediately",
            "change <field> <value>",
            cmd_change,
        ),
        CommandEntry::new("focus", "Focus a field", "focus <field>", cmd_focus),
        CommandEntry::new("blur", "Leave a field and validate it", "blur <field>", cmd_blur),
        CommandEntry::new(
            "tab",
            "Move focus to the next control",
            "tab [back]",
            cmd_tab,
        ),
        CommandEntry::new(
            "key",
            "Send a key combination such as ctrl+s or shift+tab",
            "key <combo>",
            cmd_key,
        ),
        CommandEntry::new("save", "Save the draft now", "save", cmd_save),
        CommandEntry::new(
            "validate",
            "Validate the form without submitting",
            "validate",
            cmd_validate,
        ),
        CommandEntry::new("submit", "Validate and submit the form", "submit", cmd_submit),
        CommandEntry::new(
            "close",
            "Close the confirmation dialog",
            "close [backdrop|content]",
            cmd_close,
        ),
        CommandEntry::new("dismiss", "Dismiss the notification", "dismiss", cmd_dismiss),
        CommandEntry::new(
            "export",
            "Write the form data as JSON",
            "export [path]",
            cmd_export,
        ),
        CommandEntry::new("print", "Show the printable view", "print", cmd_print),
        CommandEntry::new("fill", "Fill the form field by field", "fill", cmd_fill),
        CommandEntry::new(
            "wait",
            "Let time pass so pending timers can fire",
            "wait <milliseconds>",
            cmd_wait,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        match context.command(&name) {
            Some(entry) => {
                output::section(format!("Help: {}", entry.name));
                output::rows([("description", entry.description), ("usage", entry.usage)]);
            }
            None => context.suggest_command(args[0]),
        }
        return Ok(());
    }

    output::section("Available commands");
    let entries: Vec<_> = context
        .registry
        .list()
        .into_iter()
        .map(|entry| (entry.name, entry.description))
        .collect();
    output::rows(entries);
    output::hint("Use `help <command>` for details.");
    Ok(())
}

fn cmd_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let view = context.controller.view();
    output::section(view.title);
    for field in &view.fields {
        let marker = if field.focused { ">" } else { " " };
        let required = if field.required { "*" } else { "" };
        let value = if field.value.is_empty() {
            "-"
        } else {
            field.value.as_str()
        };
        println!("{} {}{}: {}", marker, field.label, required, value);
        if let Some(error) = &field.error {
            println!("    ! {}", error);
        }
    }
    println!("Progress: {}%", view.progress);
    if let Some(focus) = view.focus {
        println!("Focus: {}", focus.label());
    }
    if view.busy {
        output::info("Submitting...");
    }
    if let Some(active) = &view.notification {
        println!("Notification: {} {}", active.icon, active.message);
    }
    if let Some(summary) = &view.modal {
        print_summary(summary);
    }
    Ok(())
}

fn field_and_value<'a>(args: &[&'a str], usage: &str) -> Result<(&'a str, String), CommandError> {
    match args.split_first() {
        Some((name, rest)) => Ok((*name, rest.join(" "))),
        None => Err(CommandError::InvalidArguments(format!("usage: {}", usage))),
    }
}

fn single_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    match args {
        [value] => Ok(*value),
        _ => Err(CommandError::InvalidArguments(format!("usage: {}", usage))),
    }
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, value) = field_and_value(args, "set <field> <value>")?;
    context.controller.handle(FormEvent::Input {
        name: name.to_string(),
        value,
    })?;
    Ok(())
}

fn cmd_change(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, value) = field_and_value(args, "change <field> <value>")?;
    context.controller.handle(FormEvent::Change {
        name: name.to_string(),
        value,
    })?;
    Ok(())
}

fn cmd_focus(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = single_arg(args, "focus <field>")?;
    context.controller.focus_field(name)?;
    Ok(())
}

fn cmd_blur(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = single_arg(args, "blur <field>")?;
    let result = context.controller.blur(name)?;
    match result.message {
        Some(message) => output::warning(format!("{}: {}", name, message)),
        None => output::success(format!("{} is valid", name)),
    }
    Ok(())
}

fn cmd_tab(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let key = match args {
        [] => KeyPress::tab(),
        ["back"] => KeyPress::shift_tab(),
        _ => return Err(CommandError::InvalidArguments("usage: tab [back]".into())),
    };
    send_key(context, key)
}

fn cmd_key(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let combo = single_arg(args, "key <combo>")?;
    let key: KeyPress = combo.parse().map_err(CommandError::InvalidArguments)?;
    send_key(context, key)
}

fn send_key(context: &mut ShellContext, key: KeyPress) -> CommandResult {
    let outcome = context.controller.handle(FormEvent::Key(key))?;
    tracing::debug!(%key, prevented = outcome.default_prevented, "key handled");
    if let Some(focus) = context.controller.focus() {
        output::info(format!("Focus: {}", focus.label()));
    }
    Ok(())
}

fn cmd_save(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.controller.handle(FormEvent::SaveDraft)?;
    Ok(())
}

fn cmd_validate(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.controller.validate_form() {
        output::success("All required fields are valid.");
    } else {
        for (name, message) in context.controller.form().errors() {
            output::warning(format!("{}: {}", name, message));
        }
    }
    Ok(())
}

fn cmd_submit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.controller.submit() {
        SubmitOutcome::Invalid(failures) => {
            for (name, message) in failures {
                output::warning(format!("{}: {}", name, message));
            }
        }
        SubmitOutcome::Pending => {
            output::info("Submitting...");
            context.settle();
            if let Some(summary) = context.controller.modal() {
                print_summary(summary);
            }
        }
        SubmitOutcome::Ignored => output::warning("A submission is already in progress."),
    }
    Ok(())
}

fn print_summary(summary: &SubmissionSummary) {
    output::section("Submission Summary");
    output::rows(summary.rows());
    output::hint("Use `close` to dismiss.");
}

fn cmd_close(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let event = match args {
        [] => FormEvent::CloseModal,
        ["backdrop"] => FormEvent::BackdropClick { on_content: false },
        ["content"] => FormEvent::BackdropClick { on_content: true },
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: close [backdrop|content]".into(),
            ))
        }
    };
    let was_open = context.controller.modal().is_some();
    context.controller.handle(event)?;
    if was_open && context.controller.modal().is_none() {
        output::info("Dialog closed.");
    }
    Ok(())
}

fn cmd_dismiss(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.controller.handle(FormEvent::DismissNotification)?;
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = match args {
        [] => PathBuf::from("."),
        [path] => PathBuf::from(path),
        _ => return Err(CommandError::InvalidArguments("usage: export [path]".into())),
    };
    let written = context
        .controller
        .export(&target, &context.config.export_file_name)?;
    output::success(format!("Form data exported to {}", written.display()));
    Ok(())
}

fn cmd_print(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    print!("{}", context.controller.print_view());
    Ok(())
}

fn cmd_fill(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.mode != CliMode::Interactive {
        return Err(CommandError::InvalidArguments(
            "`fill` requires an interactive terminal".into(),
        ));
    }

    let fields = context.controller.form().descriptor().fields.clone();
    for field in fields {
        let current = context
            .controller
            .form()
            .field_value(field.name)
            .unwrap_or_default();
        let label = if field.required {
            format!("{} *", field.label)
        } else {
            field.label.to_string()
        };

        match &field.kind {
            FieldKind::Choice(options) => {
                let default = options.iter().position(|o| *o == current).unwrap_or(0);
                let index = Select::with_theme(&context.theme)
                    .with_prompt(label)
                    .items(options)
                    .default(default)
                    .interact()?;
                context
                    .controller
                    .change(field.name, options[index])?;
            }
            _ => {
                let value: String = Input::with_theme(&context.theme)
                    .with_prompt(label)
                    .with_initial_text(current)
                    .allow_empty(true)
                    .interact_text()?;
                context.controller.input(field.name, &value)?;
                let result = context.controller.blur(field.name)?;
                if let Some(message) = result.message {
                    output::warning(message);
                }
            }
        }
    }
    Ok(())
}

fn cmd_wait(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let raw = single_arg(args, "wait <milliseconds>")?;
    let millis: u64 = raw.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("invalid duration `{}` (use milliseconds)", raw))
    })?;
    thread::sleep(Duration::from_millis(millis));
    context.controller.tick();
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
