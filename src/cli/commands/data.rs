//! Backups, export and import of the business data file.

use std::path::PathBuf;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{parse_index, CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::storage::transfer::{export_all, export_business, import_from_path, FULL_EXPORT_FILE};
use crate::utils::PathResolver;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "backup",
            "Create, list and restore data backups",
            "backup create [note] | backup list | backup restore <number|file>",
            cmd_backup,
        ),
        CommandDefinition::new(
            "export",
            "Export all businesses or the open one to JSON",
            "export [all] [path] | export business [dir]",
            cmd_export,
        ),
        CommandDefinition::new(
            "import",
            "Import businesses from a JSON export",
            "import <path>",
            cmd_import,
        ),
    ]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return list_backups(context);
    };
    match sub.to_lowercase().as_str() {
        "create" | "new" => {
            context.persist()?;
            let note = (!rest.is_empty()).then(|| rest.join(" "));
            match context.storage.backup(note.as_deref())? {
                Some(name) => output::success(format!("Backup written: {name}")),
                None => output::info("Nothing to back up yet."),
            }
            Ok(())
        }
        "list" | "ls" => list_backups(context),
        "restore" => {
            let target = rest.first().ok_or_else(|| {
                CommandError::InvalidArguments("usage: backup restore <number|file>".into())
            })?;
            let backups = context.storage.list_backups()?;
            let name = if target.chars().all(|c| c.is_ascii_digit()) {
                backups[parse_index(target, backups.len(), "Backup")?].clone()
            } else {
                (*target).to_string()
            };
            context.businesses = context.storage.restore(&name)?;
            context.close_business();
            output::success(format!(
                "Restored {} businesses from {name}.",
                context.businesses.len()
            ));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown subcommand `{other}`; usage: backup <create|list|restore>"
        ))),
    }
}

fn list_backups(context: &mut ShellContext) -> CommandResult {
    let backups = context.storage.list_backups()?;
    if backups.is_empty() {
        output::info("No backups yet.");
        return Ok(());
    }
    output::section("Backups");
    for (position, name) in backups.iter().enumerate() {
        output::line(format!("{:>2}. {name}", position + 1));
    }
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let export_dir = PathResolver::export_dir_in(context.storage.base_dir());
    match args {
        ["business", rest @ ..] => {
            let dir = rest.first().map(PathBuf::from).unwrap_or(export_dir);
            let path = export_business(context.business()?, &dir)?;
            output::success(format!("Exported to {}", path.display()));
        }
        ["all", rest @ ..] | rest => {
            let path = rest
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| export_dir.join(FULL_EXPORT_FILE));
            export_all(&context.businesses, &path)?;
            output::success(format!(
                "Exported {} businesses to {}",
                context.businesses.len(),
                path.display()
            ));
        }
    }
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments("usage: import <path>".into()));
    }
    let path = PathBuf::from(args.join(" "));
    let imported = import_from_path(&path)?;
    let names: Vec<String> = imported.iter().map(|business| business.name.clone()).collect();
    context.businesses.extend(imported);
    context.persist()?;
    output::success(format!("Imported {}: {}", names.len(), names.join(", ")));
    Ok(())
}
