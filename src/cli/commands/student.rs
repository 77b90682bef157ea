//! Students of the selected class and their fee collection.

use uuid::Uuid;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_count, parse_date, parse_index, parse_money, CommandError, CommandResult, ParsedArgs,
};
use crate::cli::output;
use crate::cli::shell_context::{Party, ShellContext};
use crate::core::balance_ledger::BalanceChange;
use crate::core::services::{HistoryService, NewStudent, StudentDetails, StudentService};
use crate::core::time::Clock;
use crate::ledger::{Balance, Student};

const USAGE: &str =
    "student <list|add|show|pay|charge|set-due|pay-months|add-months|pending|edit|remove>";
const DEFAULT_CHARGE: &str = "Fee added";
const RECENT_RECORDS: usize = 10;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "student",
        "Enrol students and collect fees in the selected class",
        "student list | student add <name> <phone> [--due <amount>] [--joined YYYY-MM-DD] [--father <name>] [--address <text>] | student show <number> | student pay <number> <amount> [description] | student charge <number> <amount> [description] | student set-due <number> <amount> | student pay-months <number> <months> | student add-months <number> <months> | student pending <number> <Month YYYY> | student edit <number> [--name|--phone|--father|--address|--joined <value>] | student remove <number>",
        cmd_student,
    )]
}

fn cmd_student(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return list(context);
    };
    let parsed = ParsedArgs::parse(rest);
    match sub.to_lowercase().as_str() {
        "list" | "ls" => list(context),
        "add" | "new" => add(context, &parsed),
        "show" => show(context, &parsed),
        "pay" => pay(context, &parsed),
        "charge" => charge(context, &parsed),
        "set-due" => set_due(context, &parsed),
        "pay-months" => pay_months(context, &parsed),
        "add-months" => add_months(context, &parsed),
        "pending" => pending(context, &parsed),
        "edit" => edit(context, &parsed),
        "remove" | "delete" => remove(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown subcommand `{other}`; usage: {USAGE}"
        ))),
    }
}

pub(crate) fn describe_balance(context: &ShellContext, balance: Balance) -> String {
    if balance.due > 0 {
        format!("due {}", context.money(balance.due))
    } else if balance.advance > 0 {
        format!("advance {}", context.money(balance.advance))
    } else {
        "settled".into()
    }
}

/// Class id and student at a one-based listing position.
fn student_at(
    context: &ShellContext,
    args: &ParsedArgs,
    usage: &str,
) -> Result<(Uuid, Student), CommandError> {
    let class = context.class()?;
    let raw = args.require(0, usage)?;
    let index = parse_index(raw, class.students.len(), "Student")?;
    Ok((class.id, class.students[index].clone()))
}

fn report_change(context: &ShellContext, name: &str, change: &BalanceChange) {
    output::success(format!(
        "{name}: {} -> {}",
        describe_balance(context, change.previous),
        describe_balance(context, change.current)
    ));
}

fn list(context: &mut ShellContext) -> CommandResult {
    let class = context.class()?;
    if class.students.is_empty() {
        output::info("No students yet. Use `student add <name> <phone>`.");
        return Ok(());
    }
    output::section(format!("Students of {}", class.label()));
    for (position, student) in class.students.iter().enumerate() {
        output::line(format!(
            "{:>2}. {:<20} {:<12} {}",
            position + 1,
            student.name,
            student.phone_number,
            describe_balance(context, student.balance)
        ));
    }
    Ok(())
}

fn add(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student add <name> <phone> [--due <amount>] [--joined YYYY-MM-DD]";
    let name = args.require(0, usage)?;
    let phone = args.positional(1).unwrap_or_default();
    let joined = match args.option("joined") {
        Some(date) => parse_date(date)?,
        None => context.clock.today(),
    };
    let mut input = NewStudent::new(name, phone, joined);
    if let Some(due) = args.option("due") {
        input.initial_due = parse_money(due, "Initial due")?;
    }
    input.father_name = args.option("father").map(str::to_string);
    input.address = args.option("address").map(str::to_string);

    let class_id = context.class_id()?;
    StudentService::add(context.business_mut()?, class_id, input)?;
    context.persist()?;
    output::success(format!("Enrolled {}.", name.trim()));
    Ok(())
}

fn show(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let (_, student) = student_at(context, args, "student show <number>")?;
    let class = context.class()?;
    let summary = HistoryService::student_summary(class, &student, context.clock.today());

    output::section(&student.name);
    output::line(format!("Phone    : {}", student.phone_number));
    if let Some(father) = &student.father_name {
        output::line(format!("Father   : {father}"));
    }
    if let Some(address) = &student.address {
        output::line(format!("Address  : {address}"));
    }
    output::line(format!("Joined   : {}", student.joining_date));
    output::line(format!("Balance  : {}", describe_balance(context, student.balance)));
    output::line(format!("Paid     : {}", context.money(summary.total_paid)));
    if let Some(total) = summary.total_course_fee {
        let state = if summary.fully_paid {
            "fully paid"
        } else {
            "in progress"
        };
        output::line(format!("Course   : {} ({state})", context.money(total)));
    }

    output::section("Months");
    for entry in &summary.months {
        output::line(format!(
            "{:<15} {:<8} {}",
            entry.month.label(),
            entry.state.label(),
            context.money(entry.month.status.amount())
        ));
    }

    if !student.payment_history.is_empty() {
        output::section("Recent activity");
        for record in student.payment_history.iter().rev().take(RECENT_RECORDS) {
            output::line(format!(
                "{} {:<9} {:>10} {}",
                record.date.format("%Y-%m-%d"),
                record.kind.label(),
                context.money(record.amount),
                record.description
            ));
        }
    }
    Ok(())
}

fn pay(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student pay <number> <amount> [description]";
    let (class_id, student) = student_at(context, args, usage)?;
    let amount = parse_money(args.require(1, usage)?, "Amount")?;
    let description = args.rest(2);
    let clock = context.clock;
    let change = StudentService::record_payment(
        context.business_mut()?,
        class_id,
        student.id,
        amount,
        description.as_deref(),
        &clock,
    )?;
    finish(context, class_id, &student, &change)
}

fn charge(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student charge <number> <amount> [description]";
    let (class_id, student) = student_at(context, args, usage)?;
    let amount = parse_money(args.require(1, usage)?, "Amount")?;
    let description = args.rest(2).unwrap_or_else(|| DEFAULT_CHARGE.to_string());
    let clock = context.clock;
    let change = StudentService::add_charge(
        context.business_mut()?,
        class_id,
        student.id,
        amount,
        &description,
        &clock,
    )?;
    finish(context, class_id, &student, &change)
}

fn set_due(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student set-due <number> <amount>";
    let (class_id, student) = student_at(context, args, usage)?;
    let amount = parse_money(args.require(1, usage)?, "Due")?;
    let change = StudentService::edit_due(context.business_mut()?, class_id, student.id, amount)?;
    finish(context, class_id, &student, &change)
}

fn pay_months(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student pay-months <number> <months>";
    let (class_id, student) = student_at(context, args, usage)?;
    let months = parse_count(args.require(1, usage)?, "Months")?;
    let clock = context.clock;
    let change = StudentService::pay_months(
        context.business_mut()?,
        class_id,
        student.id,
        months,
        &clock,
    )?;
    finish(context, class_id, &student, &change)
}

fn add_months(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student add-months <number> <months>";
    let (class_id, student) = student_at(context, args, usage)?;
    let months = parse_count(args.require(1, usage)?, "Months")?;
    let change = StudentService::charge_months(context.business_mut()?, class_id, student.id, months)?;
    finish(context, class_id, &student, &change)
}

fn finish(
    context: &mut ShellContext,
    class_id: Uuid,
    student: &Student,
    change: &BalanceChange,
) -> CommandResult {
    let party = Party::Student {
        class_id,
        student_id: student.id,
    };
    context.commit_change(party, change)?;
    report_change(context, &student.name, change);
    Ok(())
}

fn pending(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student pending <number> <Month YYYY>";
    let (class_id, student) = student_at(context, args, usage)?;
    let label = args
        .rest(1)
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))?;
    let flagged =
        StudentService::toggle_pending_month(context.business_mut()?, class_id, student.id, &label)?;
    context.persist()?;
    if flagged {
        output::success(format!("{} marked unpaid for {}.", label.trim(), student.name));
    } else {
        output::success(format!("{} no longer marked unpaid for {}.", label.trim(), student.name));
    }
    Ok(())
}

fn edit(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "student edit <number> [--name|--phone|--father|--address|--joined <value>]";
    let (class_id, student) = student_at(context, args, usage)?;
    let details = StudentDetails {
        name: args.option("name").map(str::to_string),
        father_name: args.option("father").map(str::to_string),
        address: args.option("address").map(str::to_string),
        phone_number: args.option("phone").map(str::to_string),
        photo_url: args.option("photo").map(str::to_string),
        joining_date: args.option("joined").map(parse_date).transpose()?,
    };
    if details == StudentDetails::default() {
        return Err(CommandError::InvalidArguments(format!("usage: {usage}")));
    }
    StudentService::update_details(context.business_mut()?, class_id, student.id, details)?;
    context.persist()?;
    output::success(format!("Updated {}.", student.name));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let (class_id, student) = student_at(context, args, "student remove <number>")?;
    StudentService::remove(context.business_mut()?, class_id, student.id)?;
    context.persist()?;
    output::success(format!("Removed {}.", student.name));
    Ok(())
}
