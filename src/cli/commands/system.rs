use crate::cli::commands::{CommandDefinition, CommandRegistry};
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        match context.command(&name) {
            Some(definition) => print_command(definition),
            None => context.suggest_command(args[0]),
        }
        return Ok(());
    }
    print_overview(&context.registry);
    Ok(())
}

fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    for definition in registry.iter() {
        output::line(format!("{:<10} {}", definition.name, definition.description));
    }
    output::hint("Use `help <command>` for details.");
}

fn print_command(definition: &CommandDefinition) {
    output::section(format!("Help: {}", definition.name));
    output::line(format!("Description: {}", definition.description));
    output::line(format!("Usage: {}", definition.usage));
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::section(format!("Duebook {}", env!("CARGO_PKG_VERSION")));
    output::line(format!("Build hash : {}", env!("DUEBOOK_BUILD_HASH")));
    output::line(format!("Built at   : {}", env!("DUEBOOK_BUILD_TIMESTAMP")));
    output::line(format!("Profile    : {}", env!("DUEBOOK_BUILD_PROFILE")));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
