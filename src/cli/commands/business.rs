//! Business lifecycle: create, open, rename, pin, delete.

use uuid::Uuid;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{parse_index, CommandError, CommandResult, ParsedArgs};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::core::services::{BusinessService, PinnedItem};
use crate::ledger::{BusinessKind, Money};

const USAGE: &str = "business <list|new|open|close|show|rename|pin|delete>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "business",
            "Manage institutes and shops",
            "business list | business new <institute|shop> <name> [--owner <name>] | business open <number|name> | business close | business show | business rename <name> | business pin | business delete <number>",
            cmd_business,
        ),
        CommandDefinition::new(
            "pinned",
            "List pinned businesses, classes and customers",
            "pinned",
            cmd_pinned,
        ),
    ]
}

fn cmd_business(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return list(context);
    };
    let parsed = ParsedArgs::parse(rest);
    match sub.to_lowercase().as_str() {
        "list" | "ls" => list(context),
        "new" | "add" => create(context, &parsed),
        "open" | "use" => open(context, &parsed),
        "close" => {
            context.close_business();
            output::info("Closed the active business.");
            Ok(())
        }
        "show" => show(context),
        "rename" => rename(context, &parsed),
        "pin" => pin(context),
        "delete" | "remove" => delete(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown subcommand `{other}`; usage: {USAGE}"
        ))),
    }
}

/// Ids in listing order: pinned first, then newest.
fn listing(context: &ShellContext) -> Vec<Uuid> {
    BusinessService::sorted(&context.businesses)
        .into_iter()
        .map(|business| business.id)
        .collect()
}

fn list(context: &mut ShellContext) -> CommandResult {
    let sorted = BusinessService::sorted(&context.businesses);
    if sorted.is_empty() {
        output::info("No businesses yet. Use `business new <institute|shop> <name>`.");
        return Ok(());
    }
    output::section("Businesses");
    for (position, business) in sorted.iter().enumerate() {
        let marker = if context.active_business == Some(business.id) {
            "*"
        } else {
            " "
        };
        let mut flags = Vec::new();
        if business.is_pinned {
            flags.push("pinned");
        }
        if business.is_new {
            flags.push("new");
        }
        let detail = match business.kind {
            BusinessKind::TeacherStudent => format!(
                "{} classes, {} students",
                business.classes.len(),
                business.student_count()
            ),
            BusinessKind::Shop => format!("{} customers", business.customers.len()),
        };
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        output::line(format!(
            "{marker}{:>2}. {} ({}) - {}{}",
            position + 1,
            business.name,
            business.kind,
            detail,
            flags
        ));
    }
    Ok(())
}

fn create(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "business new <institute|shop> <name> [--owner <name>]";
    let kind_raw = args.require(0, usage)?;
    let kind = BusinessKind::parse(kind_raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!(
            "unknown business type `{kind_raw}` (use institute or shop)"
        ))
    })?;
    let name = args
        .rest(1)
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))?;
    let owner = args.option("owner").map(str::to_string);

    let business = BusinessService::create(kind, &name, owner)?;
    let id = business.id;
    let label = business.name.clone();
    context.businesses.push(business);
    context.open_business(id)?;
    output::success(format!("Created {kind} `{label}` and opened it."));
    Ok(())
}

fn open(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "business open <number|name>";
    let target = args
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))?;
    let id = resolve(context, &target)?;
    context.open_business(id)?;
    let business = context.business()?;
    output::success(format!("Opened `{}` ({}).", business.name, business.kind));
    Ok(())
}

/// Accepts a listing number or a case-insensitive name.
fn resolve(context: &ShellContext, target: &str) -> Result<Uuid, CommandError> {
    let ids = listing(context);
    if target.chars().all(|c| c.is_ascii_digit()) {
        let index = parse_index(target, ids.len(), "Business")?;
        return Ok(ids[index]);
    }
    context
        .businesses
        .iter()
        .find(|business| business.name.eq_ignore_ascii_case(target.trim()))
        .map(|business| business.id)
        .ok_or_else(|| CommandError::Message(format!("No business named `{target}`.")))
}

fn show(context: &mut ShellContext) -> CommandResult {
    let business = context.business()?;
    output::section(&business.name);
    output::line(format!("Type      : {}", business.kind));
    output::line(format!("Owner     : {}", business.admin_name()));
    output::line(format!(
        "Created   : {}",
        business.created_at.format("%Y-%m-%d")
    ));
    let total_due: Money = match business.kind {
        BusinessKind::TeacherStudent => {
            output::line(format!("Classes   : {}", business.classes.len()));
            output::line(format!("Students  : {}", business.student_count()));
            business
                .classes
                .iter()
                .flat_map(|class| class.students.iter())
                .map(|student| student.balance.due)
                .sum()
        }
        BusinessKind::Shop => {
            output::line(format!("Groups    : {}", business.customer_groups.len()));
            output::line(format!("Customers : {}", business.customers.len()));
            business
                .customers
                .iter()
                .map(|customer| customer.balance.due)
                .sum()
        }
    };
    output::line(format!("Total due : {}", context.money(total_due)));
    Ok(())
}

fn rename(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let name = args
        .rest(0)
        .ok_or_else(|| CommandError::InvalidArguments("usage: business rename <name>".into()))?;
    BusinessService::rename(context.business_mut()?, &name)?;
    context.persist()?;
    output::success(format!("Renamed to `{}`.", name.trim()));
    Ok(())
}

fn pin(context: &mut ShellContext) -> CommandResult {
    let pinned = BusinessService::toggle_pin(context.business_mut()?);
    context.persist()?;
    output::success(if pinned { "Pinned." } else { "Unpinned." });
    Ok(())
}

fn delete(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let target = args.require(0, "business delete <number>")?;
    let ids = listing(context);
    let id = ids[parse_index(target, ids.len(), "Business")?];
    let Some(position) = context.businesses.iter().position(|business| business.id == id) else {
        return Err(CommandError::Message("Business disappeared.".into()));
    };
    let removed = context.businesses.remove(position);
    if context.active_business == Some(id) {
        context.close_business();
    }
    if context.config.last_opened_business == Some(id) {
        context.config.last_opened_business = None;
        context.config_manager.save(&context.config)?;
    }
    context.persist()?;
    tracing::info!(business = %id, "deleted business");
    output::success(format!("Deleted `{}`.", removed.name));
    Ok(())
}

fn cmd_pinned(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let items = BusinessService::pinned_items(&context.businesses);
    if items.is_empty() {
        output::info("Nothing pinned.");
        return Ok(());
    }
    output::section("Pinned");
    for item in items {
        let kind = match item {
            PinnedItem::Business { .. } => "business",
            PinnedItem::Class { .. } => "class",
            PinnedItem::Customer { .. } => "customer",
        };
        let owner = context
            .businesses
            .iter()
            .find(|business| business.id == item.business_id())
            .map(|business| business.name.as_str())
            .unwrap_or("?");
        output::line(format!("{:<9} {} ({})", kind, item.title(), owner));
    }
    Ok(())
}
