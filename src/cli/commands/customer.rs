//! Shop customers, their groups and credit.

use crate::cli::commands::student::describe_balance;
use crate::cli::commands::CommandDefinition;
use crate::cli::core::{parse_index, parse_money, CommandError, CommandResult, ParsedArgs};
use crate::cli::output;
use crate::cli::shell_context::{Party, ShellContext};
use crate::core::services::{CustomerDetails, CustomerService, HistoryService, NewCustomer};
use crate::core::time::Clock;
use crate::ledger::{Business, BusinessKind, Customer};

const USAGE: &str = "customer <list|add|show|due|pay|edit|pin|remove>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "group",
            "Manage customer groups of the open shop",
            "group list | group add <name>",
            cmd_group,
        ),
        CommandDefinition::new(
            "customer",
            "Manage customers and their credit",
            "customer list [--group <number>] | customer add <name> <phone> [--due <amount>] [--group <number>] [--address <text>] | customer show <number> | customer due <number> <amount> [description] | customer pay <number> <amount> [description] | customer edit <number> [--name|--phone|--address <value>] [--group <number>] | customer pin <number> | customer remove <number>",
            cmd_customer,
        ),
        CommandDefinition::new(
            "stats",
            "Show dues and today's collection of the open shop",
            "stats",
            cmd_stats,
        ),
    ]
}

fn cmd_group(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return list_groups(context);
    };
    match sub.to_lowercase().as_str() {
        "list" | "ls" => list_groups(context),
        "add" | "new" => {
            let name = rest.join(" ");
            CustomerService::add_group(context.business_mut()?, &name)?;
            context.persist()?;
            output::success(format!("Added group `{}`.", name.trim()));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown subcommand `{other}`; usage: group <list|add>"
        ))),
    }
}

fn list_groups(context: &mut ShellContext) -> CommandResult {
    let business = context.business()?;
    output::section(format!("Groups of {}", business.name));
    for (position, group) in business.customer_groups.iter().enumerate() {
        let members = CustomerService::in_group(business, &group.id).len();
        output::line(format!("{:>2}. {} ({} customers)", position + 1, group.name, members));
    }
    Ok(())
}

/// Group id at a one-based position in the group list.
fn group_at(business: &Business, raw: &str) -> Result<String, CommandError> {
    let index = parse_index(raw, business.customer_groups.len(), "Group")?;
    Ok(business.customer_groups[index].id.clone())
}

fn cmd_customer(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return list(context, &ParsedArgs::default());
    };
    let parsed = ParsedArgs::parse(rest);
    match sub.to_lowercase().as_str() {
        "list" | "ls" => list(context, &parsed),
        "add" | "new" => add(context, &parsed),
        "show" => show(context, &parsed),
        "due" => add_due(context, &parsed),
        "pay" => clear_due(context, &parsed),
        "edit" => edit(context, &parsed),
        "pin" => pin(context, &parsed),
        "remove" | "delete" => remove(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown subcommand `{other}`; usage: {USAGE}"
        ))),
    }
}

fn customer_at(
    context: &ShellContext,
    args: &ParsedArgs,
    usage: &str,
) -> Result<Customer, CommandError> {
    let business = context.business()?;
    let raw = args.require(0, usage)?;
    let customers = CustomerService::ordered(business, None);
    let index = parse_index(raw, customers.len(), "Customer")?;
    Ok(customers[index].clone())
}

fn list(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let business = context.business()?;
    let group = args
        .option("group")
        .map(|raw| group_at(business, raw))
        .transpose()?;
    if business.customers.is_empty() {
        output::info("No customers yet. Use `customer add <name> <phone>`.");
        return Ok(());
    }
    output::section(format!("Customers of {}", business.name));
    for (position, customer) in CustomerService::ordered(business, None).into_iter().enumerate() {
        if group.as_ref().is_some_and(|id| *id != customer.group_id) {
            continue;
        }
        let group_name = business
            .group(&customer.group_id)
            .map(|group| group.name.as_str())
            .unwrap_or("-");
        let pin = if customer.is_pinned { " [pinned]" } else { "" };
        output::line(format!(
            "{:>2}. {:<20} {:<12} {:<10} {}{pin}",
            position + 1,
            customer.name,
            customer.phone_number,
            group_name,
            describe_balance(context, customer.balance)
        ));
    }
    Ok(())
}

fn add(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "customer add <name> <phone> [--due <amount>] [--group <number>]";
    let name = args.require(0, usage)?;
    let mut input = NewCustomer::new(name, args.positional(1).unwrap_or_default());
    if let Some(due) = args.option("due") {
        input.initial_due = parse_money(due, "Initial due")?;
    }
    if let Some(raw) = args.option("group") {
        input.group_id = Some(group_at(context.business()?, raw)?);
    }
    input.address = args.option("address").map(str::to_string);

    let clock = context.clock;
    CustomerService::add(context.business_mut()?, input, &clock)?;
    context.persist()?;
    output::success(format!("Added customer {}.", name.trim()));
    Ok(())
}

fn show(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let customer = customer_at(context, args, "customer show <number>")?;
    let business = context.business()?;
    output::section(&customer.name);
    output::line(format!("Phone   : {}", customer.phone_number));
    if let Some(address) = &customer.address {
        output::line(format!("Address : {address}"));
    }
    if let Some(group) = business.group(&customer.group_id) {
        output::line(format!("Group   : {}", group.name));
    }
    output::line(format!("Balance : {}", describe_balance(context, customer.balance)));
    if customer.payment_history.is_empty() {
        return Ok(());
    }
    output::section("History");
    for record in customer.payment_history.iter().rev() {
        output::line(format!(
            "{} {:<9} {:>10} {}",
            record.date.format("%Y-%m-%d %H:%M"),
            record.kind.label(),
            context.money(record.amount),
            record.description
        ));
    }
    Ok(())
}

fn add_due(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "customer due <number> <amount> [description]";
    let customer = customer_at(context, args, usage)?;
    let amount = parse_money(args.require(1, usage)?, "Amount")?;
    let description = args.rest(2);
    let clock = context.clock;
    let change = CustomerService::add_due(
        context.business_mut()?,
        customer.id,
        amount,
        description.as_deref(),
        &clock,
    )?;
    context.commit_change(Party::Customer(customer.id), &change)?;
    output::success(format!(
        "{}: {} -> {}",
        customer.name,
        describe_balance(context, change.previous),
        describe_balance(context, change.current)
    ));
    Ok(())
}

fn clear_due(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "customer pay <number> <amount> [description]";
    let customer = customer_at(context, args, usage)?;
    let amount = parse_money(args.require(1, usage)?, "Amount")?;
    let description = args.rest(2);
    let clock = context.clock;
    let change = CustomerService::clear_due(
        context.business_mut()?,
        customer.id,
        amount,
        description.as_deref(),
        &clock,
    )?;
    context.commit_change(Party::Customer(customer.id), &change)?;
    output::success(format!(
        "{}: {} -> {}",
        customer.name,
        describe_balance(context, change.previous),
        describe_balance(context, change.current)
    ));
    Ok(())
}

fn edit(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "customer edit <number> [--name|--phone|--address <value>] [--group <number>]";
    let customer = customer_at(context, args, usage)?;
    let group_id = args
        .option("group")
        .map(|raw| group_at(context.business()?, raw))
        .transpose()?;
    let details = CustomerDetails {
        name: args.option("name").map(str::to_string),
        phone_number: args.option("phone").map(str::to_string),
        address: args.option("address").map(str::to_string),
        photo_url: args.option("photo").map(str::to_string),
        group_id,
    };
    if details == CustomerDetails::default() {
        return Err(CommandError::InvalidArguments(format!("usage: {usage}")));
    }
    let clock = context.clock;
    CustomerService::update_details(context.business_mut()?, customer.id, details, &clock)?;
    context.persist()?;
    output::success(format!("Updated {}.", customer.name));
    Ok(())
}

fn pin(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let customer = customer_at(context, args, "customer pin <number>")?;
    let pinned = CustomerService::toggle_pin(context.business_mut()?, customer.id)?;
    context.persist()?;
    let verb = if pinned { "Pinned" } else { "Unpinned" };
    output::success(format!("{verb} {}.", customer.name));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let customer = customer_at(context, args, "customer remove <number>")?;
    CustomerService::remove(context.business_mut()?, customer.id)?;
    context.persist()?;
    output::success(format!("Removed {}.", customer.name));
    Ok(())
}

fn cmd_stats(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let business = context.business()?;
    if business.kind != BusinessKind::Shop {
        return Err(CommandError::Message(format!("{} is not a shop.", business.name)));
    }
    let stats = HistoryService::shop_stats(business, context.clock.today());
    output::section(format!("{} today", business.name));
    output::line(format!("Total due       : {}", context.money(stats.total_due)));
    output::line(format!("Collected today : {}", context.money(stats.collected_today)));
    output::line(format!("Customers       : {}", stats.customer_count));
    Ok(())
}
