//! Classes of the open institute and their course fee terms.

use std::collections::BTreeMap;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_count, parse_date, parse_index, parse_money, CommandError, CommandResult, ParsedArgs,
};
use crate::cli::output;
use crate::cli::shell_context::ShellContext;
use crate::core::fee_planner::{
    month_label, CourseFeeInput, CourseFeePlanner, Distribution, MonthStatus, DEFAULT_COURSE_MONTHS,
};
use crate::core::services::{ClassService, NewClass};
use crate::core::time::Clock;
use crate::ledger::{ClassGroup, Money};

const USAGE: &str = "class <list|add|edit|use|pin|remove|plan|calendar>";
const TERMS: &str =
    "[--batch <name>] [--total <course fee>] [--months <n>] [--start YYYY-MM-DD] [--even | --extra <month:amount,...>]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "class",
        "Manage classes and course fees of the open institute",
        "class list | class add <standard> <monthly fee> [terms] | class edit <number> [--fee <amount>] [terms] | class use <number> | class pin <number> | class remove <number> | class plan <monthly fee> <course fee> [--months <n>] | class calendar [number]",
        cmd_class,
    )]
}

fn cmd_class(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return list(context);
    };
    let parsed = ParsedArgs::parse(rest);
    match sub.to_lowercase().as_str() {
        "list" | "ls" => list(context),
        "add" | "new" => add(context, &parsed),
        "edit" => edit(context, &parsed),
        "use" | "open" => select(context, &parsed),
        "pin" => pin(context, &parsed),
        "remove" | "delete" => remove(context, &parsed),
        "plan" => plan(context, &parsed),
        "calendar" => calendar(context, &parsed),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown subcommand `{other}`; usage: {USAGE}"
        ))),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let business = context.business()?;
    if business.classes.is_empty() {
        output::info("No classes yet. Use `class add <standard> <monthly fee>`.");
        return Ok(());
    }
    output::section(format!("Classes of {}", business.name));
    for (position, class) in business.classes.iter().enumerate() {
        let marker = if context.active_class == Some(class.id) {
            "*"
        } else {
            " "
        };
        let course = match class.total_course_fee.filter(|total| *total > 0) {
            Some(total) => format!(
                ", course {} over {} months",
                context.money(total),
                class.course_duration.unwrap_or(DEFAULT_COURSE_MONTHS)
            ),
            None => String::new(),
        };
        let pin = if class.is_pinned { " [pinned]" } else { "" };
        output::line(format!(
            "{marker}{:>2}. {} - {}/month{course}, {} students{pin}",
            position + 1,
            class.label(),
            context.money(class.fee_amount),
            class.students.len()
        ));
    }
    Ok(())
}

fn class_at(context: &ShellContext, args: &ParsedArgs, usage: &str) -> Result<ClassGroup, CommandError> {
    let business = context.business()?;
    let raw = args.require(0, usage)?;
    let index = parse_index(raw, business.classes.len(), "Class")?;
    Ok(business.classes[index].clone())
}

/// Reads the distribution flags; `None` when neither is given.
fn distribution(args: &ParsedArgs) -> Result<Distribution, CommandError> {
    if args.switch("even") {
        return Ok(Distribution::Even);
    }
    let Some(raw) = args.option("extra") else {
        return Ok(Distribution::None);
    };
    let mut extras = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (month, amount) = pair.split_once(':').ok_or_else(|| {
            CommandError::InvalidArguments(format!("extra `{pair}` must look like <month>:<amount>"))
        })?;
        let month = parse_count(month, "Month")?;
        if month == 0 {
            return Err(CommandError::InvalidArguments("Months are numbered from 1".into()));
        }
        extras.insert(month - 1, parse_money(amount, "Extra fee")?);
    }
    Ok(Distribution::Manual(extras))
}

/// Applies the optional course flags on top of `input`.
fn apply_terms(input: &mut NewClass, args: &ParsedArgs) -> Result<(), CommandError> {
    if let Some(batch) = args.option("batch") {
        input.batch_name = Some(batch.to_string());
    }
    if let Some(total) = args.option("total") {
        input.total_course_fee = Some(parse_money(total, "Course fee")?).filter(|total| *total > 0);
    }
    if let Some(months) = args.option("months") {
        input.course_duration = Some(parse_count(months, "Duration")?);
    }
    if let Some(start) = args.option("start") {
        input.start_date = parse_date(start)?;
    }
    Ok(())
}

fn add(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = format!("class add <standard> <monthly fee> {TERMS}");
    let standard = args.require(0, &usage)?;
    let fee = parse_money(args.require(1, &usage)?, "Monthly fee")?;
    let mut input = NewClass::new(standard, fee, context.clock.today());
    apply_terms(&mut input, args)?;
    let distribution = distribution(args)?;

    let business = context.business_mut()?;
    let id = ClassService::add(business, input, &distribution)?;
    let label = business
        .class(id)
        .map(ClassGroup::label)
        .unwrap_or_default();
    context.active_class = Some(id);
    context.persist()?;
    output::success(format!("Added {label} and selected it."));
    Ok(())
}

fn edit(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = format!("class edit <number> [--fee <amount>] [--standard <name>] {TERMS}");
    let class = class_at(context, args, &usage)?;
    let mut input = NewClass {
        standard: args.option("standard").unwrap_or(&class.standard).to_string(),
        batch_name: class.batch_name.clone(),
        fee_amount: class.fee_amount,
        total_course_fee: class.total_course_fee,
        course_duration: class.course_duration,
        start_date: class.start_date.unwrap_or_else(|| class.created_at.date_naive()),
    };
    if let Some(fee) = args.option("fee") {
        input.fee_amount = parse_money(fee, "Monthly fee")?;
    }
    apply_terms(&mut input, args)?;
    let distribution = match distribution(args)? {
        // Keep the stored spread unless a new one is given.
        Distribution::None => Distribution::Manual(ClassService::current_extras(context.business()?, class.id)?),
        other => other,
    };

    let plan = ClassService::update_course(context.business_mut()?, class.id, input, &distribution)?;
    context.persist()?;
    output::success(format!("Updated {}.", class.label()));
    if plan.deficit > 0 {
        output::line(format!(
            "Extra {} spread across {} months.",
            context.money(plan.distributed()),
            plan.fee_overrides.len()
        ));
    }
    Ok(())
}

fn select(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let class = class_at(context, args, "class use <number>")?;
    context.active_class = Some(class.id);
    output::success(format!(
        "Selected {} ({} students).",
        class.label(),
        class.students.len()
    ));
    Ok(())
}

fn pin(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let class = class_at(context, args, "class pin <number>")?;
    let pinned = ClassService::toggle_pin(context.business_mut()?, class.id)?;
    context.persist()?;
    let verb = if pinned { "Pinned" } else { "Unpinned" };
    output::success(format!("{verb} {}.", class.label()));
    Ok(())
}

fn remove(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let class = class_at(context, args, "class remove <number>")?;
    let removed = ClassService::remove(context.business_mut()?, class.id)?;
    if context.active_class == Some(removed.id) {
        context.active_class = None;
    }
    context.persist()?;
    output::success(format!(
        "Removed {} with {} students.",
        removed.label(),
        removed.students.len()
    ));
    Ok(())
}

/// Previews the extra fee of a course without storing anything.
fn plan(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let usage = "class plan <monthly fee> <course fee> [--months <n>] [--start YYYY-MM-DD]";
    let monthly_fee = parse_money(args.require(0, usage)?, "Monthly fee")?;
    let total = parse_money(args.require(1, usage)?, "Course fee")?;
    let duration_months = match args.option("months") {
        Some(months) => parse_count(months, "Duration")?,
        None => DEFAULT_COURSE_MONTHS,
    };
    let start_date = match args.option("start") {
        Some(start) => parse_date(start)?,
        None => context.clock.today(),
    };
    let input = CourseFeeInput {
        monthly_fee,
        duration_months,
        total_course_fee: Some(total),
        start_date,
    };
    let plan = CourseFeePlanner::plan(&input, &Distribution::Even)?;

    output::section("Course plan");
    output::line(format!("Monthly total : {}", context.money(plan.base_total)));
    output::line(format!("Course fee    : {}", context.money(total)));
    if plan.deficit <= 0 {
        output::line(format!(
            "No extra fee; course fee caps collection at {}.",
            context.money(total)
        ));
        return Ok(());
    }
    output::line(format!("Extra to spread: {}", context.money(plan.deficit)));
    for (index, date) in plan.months.iter().enumerate() {
        let extra = plan.extras.get(&(index as u32)).copied().unwrap_or(0);
        output::line(format!(
            "{:>2}. {:<15} {} (+{})",
            index + 1,
            month_label(*date),
            context.money(monthly_fee + extra),
            context.money(extra)
        ));
    }
    Ok(())
}

fn calendar(context: &mut ShellContext, args: &ParsedArgs) -> CommandResult {
    let class = if args.positional(0).is_some() {
        class_at(context, args, "class calendar [number]")?
    } else {
        context.class()?.clone()
    };
    let months = CourseFeePlanner::course_calendar(&class, context.clock.today());
    output::section(format!("Course calendar: {}", class.label()));
    let mut charged: Money = 0;
    for month in &months {
        let status = match month.status {
            MonthStatus::Free => "FREE".to_string(),
            MonthStatus::Charged(amount) => {
                charged += amount;
                context.money(amount)
            }
        };
        output::line(format!("{:>2}. {:<15} {}", month.index + 1, month.label(), status));
    }
    output::line(format!("Collected over course: {}", context.money(charged)));
    Ok(())
}
