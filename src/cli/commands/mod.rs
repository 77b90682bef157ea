use std::collections::HashMap;

pub mod business;
pub mod class;
pub mod config;
pub mod customer;
pub mod data;
pub mod history;
pub mod student;
pub mod system;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(business::definitions());
    commands.extend(class::definitions());
    commands.extend(student::definitions());
    commands.extend(customer::definitions());
    commands.extend(history::definitions());
    commands.extend(data::definitions());
    commands.extend(config::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn command_names_are_unique() {
        let definitions = all_definitions();
        let registry = CommandRegistry::new(definitions.clone());
        let unique: HashSet<_> = registry.names().collect();
        assert_eq!(unique.len(), definitions.len());
        assert_eq!(registry.iter().count(), definitions.len());
        assert!(registry.get("student").is_some());
        assert!(registry.get("ledger").is_none());
    }
}
