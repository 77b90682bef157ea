//! Transaction history across businesses and the holder-facing ledger feed.

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::core::services::HistoryService;
use crate::sync::{LedgerFeed, TimelineKind};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "history",
            "List every payment and due across businesses, newest first",
            "history [search text]",
            cmd_history,
        ),
        CommandDefinition::new(
            "feed",
            "Show the synced ledger of a phone number",
            "feed <phone> | feed read <entry id>",
            cmd_feed,
        ),
    ]
}

fn cmd_history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let entries = HistoryService::all_transactions(&context.businesses);
    let query = args.join(" ");
    let matches = HistoryService::search(&entries, &query);
    if matches.is_empty() {
        output::info("No transactions found.");
        return Ok(());
    }

    let revenue = HistoryService::total_revenue(matches.iter().copied());
    output::section("History");
    output::line(format!(
        "{} transactions, {} received",
        matches.len(),
        context.money(revenue)
    ));
    for (day, bucket) in HistoryService::group_by_day(&matches) {
        output::line(format!("-- {} --", day.format("%d %b %Y")));
        for entry in bucket {
            let sign = if entry.record.is_payment() { "+" } else { "-" };
            let place = match &entry.class_label {
                Some(class) => format!("{} / {}", entry.business_name, class),
                None => entry.business_name.clone(),
            };
            output::line(format!(
                "{sign}{:>10} {:<18} {:<28} {}",
                context.money(entry.record.amount),
                entry.party_name,
                place,
                entry.record.description
            ));
        }
    }
    Ok(())
}

fn cmd_feed(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        ["read", id] => {
            context.feed.mark_read(id)?;
            output::success("Marked as read.");
            Ok(())
        }
        [phone] => show_feed(context, phone),
        _ => Err(CommandError::InvalidArguments(
            "usage: feed <phone> | feed read <entry id>".into(),
        )),
    }
}

fn show_feed(context: &mut ShellContext, phone: &str) -> CommandResult {
    let entries = context.feed.entries_for_phone(phone)?;
    if entries.is_empty() {
        output::info(format!("No ledger entries for {phone}."));
        return Ok(());
    }
    for entry in entries {
        output::section(format!("{} at {}", entry.party_name, entry.business_name));
        output::line(format!("Entry   : {}", entry.id));
        output::line(format!("Managed : {}", entry.admin_name));
        output::line(format!("Due     : {}", context.money(entry.total_due)));
        output::line(format!("Unread  : {}", entry.unread_count));
        for item in &entry.timeline {
            let marker = match item.kind {
                TimelineKind::Payment => "+",
                TimelineKind::DueAdded => "-",
                TimelineKind::Request => "?",
            };
            output::line(format!(
                "{} {marker} {}: {}",
                item.date.format("%Y-%m-%d"),
                item.title,
                item.message
            ));
        }
    }
    Ok(())
}
