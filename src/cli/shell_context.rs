use strsim::levenshtein;
use uuid::Uuid;

use crate::cli::commands::{self, CommandDefinition, CommandRegistry};
use crate::cli::core::{CommandError, CommandResult, LoopControl};
use crate::cli::output;
use crate::config::{Config, ConfigManager};
use crate::core::balance_ledger::BalanceChange;
use crate::core::services::{BusinessService, CustomerService};
use crate::core::time::{Clock, SystemClock};
use crate::errors::CliError;
use crate::ledger::{BalanceHolder, Business, ClassGroup, Money};
use crate::storage::{BusinessStore, JsonStorage};
use crate::sync::{JsonLedgerFeed, LedgerEvent, LedgerSync};
use crate::utils::PathResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Account holder whose balance just changed.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Party {
    Student { class_id: Uuid, student_id: Uuid },
    Customer(Uuid),
}

pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) storage: JsonStorage,
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: Config,
    pub(crate) feed: JsonLedgerFeed,
    pub(crate) clock: SystemClock,
    pub(crate) businesses: Vec<Business>,
    pub(crate) active_business: Option<Uuid>,
    pub(crate) active_class: Option<Uuid>,
    pub(crate) last_command: Option<String>,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = PathResolver::resolve_base(None);
        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let data_dir = config.data_dir.clone().unwrap_or(base);
        let storage = JsonStorage::new(Some(data_dir), Some(config.backup_retention))?;
        let feed = JsonLedgerFeed::new(PathResolver::ledger_feed_file_in(storage.base_dir()));

        let mut businesses = storage.load_all()?;
        let mut repaired = false;
        for business in &mut businesses {
            repaired |= CustomerService::ensure_default_group(business);
        }
        if repaired {
            storage.save_all(&businesses)?;
        }

        let active_business = config
            .last_opened_business
            .filter(|id| businesses.iter().any(|business| business.id == *id));

        tracing::debug!(
            businesses = businesses.len(),
            data = %storage.data_file().display(),
            "shell context ready"
        );

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            storage,
            config_manager,
            config,
            feed,
            clock: SystemClock,
            businesses,
            active_business,
            active_class: None,
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        let Ok(business) = self.business() else {
            return "duebook> ".into();
        };
        match self.active_class.and_then(|id| business.class(id)) {
            Some(class) => format!("duebook [{} / {}]> ", business.name, class.label()),
            None => format!("duebook [{}]> ", business.name),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.get(command).map(|definition| definition.handler) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        if self.is_script() && !matches!(err, CommandError::ExitRequested) {
            if let Some(line) = &self.last_command {
                output::hint(format!("while running `{line}`"));
            }
        }
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::BusinessNotOpen => {
                output::error(CommandError::BusinessNotOpen);
                output::hint("Try `business list` to see what exists.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }

    pub(crate) fn business(&self) -> Result<&Business, CommandError> {
        let id = self.active_business.ok_or(CommandError::BusinessNotOpen)?;
        self.businesses
            .iter()
            .find(|business| business.id == id)
            .ok_or(CommandError::BusinessNotOpen)
    }

    pub(crate) fn business_mut(&mut self) -> Result<&mut Business, CommandError> {
        let id = self.active_business.ok_or(CommandError::BusinessNotOpen)?;
        self.businesses
            .iter_mut()
            .find(|business| business.id == id)
            .ok_or(CommandError::BusinessNotOpen)
    }

    pub(crate) fn class(&self) -> Result<&ClassGroup, CommandError> {
        let id = self.active_class.ok_or(CommandError::ClassNotSelected)?;
        self.business()?
            .class(id)
            .ok_or(CommandError::ClassNotSelected)
    }

    pub(crate) fn class_id(&self) -> Result<Uuid, CommandError> {
        self.class().map(|class| class.id)
    }

    /// Makes `id` the active business and remembers it for the next session.
    pub(crate) fn open_business(&mut self, id: Uuid) -> CommandResult {
        let business = self
            .businesses
            .iter_mut()
            .find(|business| business.id == id)
            .ok_or(CommandError::BusinessNotOpen)?;
        BusinessService::mark_opened(business);
        self.active_business = Some(id);
        self.active_class = None;
        self.config.last_opened_business = Some(id);
        self.config_manager.save(&self.config)?;
        self.persist()
    }

    pub(crate) fn close_business(&mut self) {
        self.active_business = None;
        self.active_class = None;
    }

    pub(crate) fn persist(&self) -> CommandResult {
        self.storage.save_all(&self.businesses)?;
        Ok(())
    }

    pub(crate) fn money(&self, amount: Money) -> String {
        self.config.format_money(amount)
    }

    /// Saves, then mirrors the change to the ledger feed when sync is enabled.
    pub(crate) fn commit_change(&mut self, party: Party, change: &BalanceChange) -> CommandResult {
        self.persist()?;
        if !self.config.ledger_sync || change.is_noop() {
            return Ok(());
        }
        let Some(business) = self
            .active_business
            .and_then(|id| self.businesses.iter().find(|business| business.id == id))
        else {
            return Ok(());
        };
        let holder: Option<&dyn BalanceHolder> = match party {
            Party::Student {
                class_id,
                student_id,
            } => business
                .class(class_id)
                .and_then(|class| class.student(student_id))
                .map(|student| student as &dyn BalanceHolder),
            Party::Customer(id) => business
                .customer(id)
                .map(|customer| customer as &dyn BalanceHolder),
        };
        if let Some(holder) = holder {
            let event = LedgerEvent::from_change(change);
            LedgerSync::publish(&mut self.feed, business, holder, &event, self.clock.now());
        }
        Ok(())
    }

    pub(crate) fn is_script(&self) -> bool {
        self.mode == CliMode::Script
    }
}
