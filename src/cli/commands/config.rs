use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "Show or change settings",
        "config show | config set <key> <value> | config backup [note] | config backups | config restore <file>",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return show(context);
    };
    match (sub.to_lowercase().as_str(), rest) {
        ("show", _) => show(context),
        ("set", [key, value @ ..]) if !value.is_empty() => {
            context.config.set(key, &value.join(" "))?;
            context.config_manager.save(&context.config)?;
            output::success(format!("{key} updated."));
            if matches!(*key, "data_dir" | "backup_retention") {
                output::hint("Restart the shell for storage settings to take effect.");
            }
            Ok(())
        }
        ("backup", note) => {
            let note = (!note.is_empty()).then(|| note.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            output::success(format!("Configuration backup written: {name}"));
            Ok(())
        }
        ("backups", _) => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                output::info("No configuration backups yet.");
            }
            for name in backups {
                output::line(name);
            }
            Ok(())
        }
        ("restore", [name]) => {
            context.config = context.config_manager.restore(name)?;
            output::success(format!("Configuration restored from {name}."));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: config show | config set <key> <value> | config backup [note] | config backups | config restore <file>".into(),
        )),
    }
}

fn show(context: &mut ShellContext) -> CommandResult {
    let config = &context.config;
    output::section("Configuration");
    output::line(format!("file             : {}", context.config_manager.path().display()));
    output::line(format!("data             : {}", context.storage.data_file().display()));
    output::line(format!("locale           : {}", config.locale));
    output::line(format!("currency_symbol  : {}", config.currency_symbol));
    output::line(format!("backup_retention : {}", config.backup_retention));
    let sync = if config.ledger_sync { "on" } else { "off" };
    output::line(format!("ledger_sync      : {sync}"));
    Ok(())
}
