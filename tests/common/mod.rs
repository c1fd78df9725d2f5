#![allow(dead_code)]

//! In-memory driver used by the integration tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use sql_query_manager::command::Command;
use sql_query_manager::prelude::*;

/// What the driver saw for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub text: String,
    pub command_type: CommandType,
    pub timeout: Duration,
    pub parameters: Vec<(String, RowValues)>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub opened: usize,
    pub closed: usize,
    pub connection_strings: Vec<String>,
    pub commands: Vec<RecordedCommand>,
    pub rows_handed_out: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
    result: ResultSet,
    affected: u64,
    fail_open: bool,
    fail_execute: bool,
    fail_close: bool,
    delay: Option<Duration>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, result: ResultSet) -> Self {
        self.result = result;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_execute(mut self) -> Self {
        self.fail_execute = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn last_command(&self) -> RecordedCommand {
        self.state().commands.last().cloned().unwrap()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn open(&self, options: &EffectiveOptions) -> Result<MockConnection, QueryManagerError> {
        let mut state = self.state();
        state
            .connection_strings
            .push(options.connection_string().to_string());
        if self.fail_open {
            return Err(QueryManagerError::ConnectionError("server unreachable".into()));
        }
        state.opened += 1;
        Ok(MockConnection {
            connector: self.clone(),
        })
    }
}

pub struct MockConnection {
    connector: MockConnector,
}

impl MockConnection {
    async fn run(&mut self, command: &Command) -> Result<(), QueryManagerError> {
        self.connector.state().commands.push(RecordedCommand {
            text: command.text().to_string(),
            command_type: command.command_type(),
            timeout: command.timeout(),
            parameters: command
                .parameters()
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        });
        if let Some(delay) = self.connector.delay {
            tokio::time::sleep(delay).await;
        }
        if self.connector.fail_execute {
            return Err(QueryManagerError::ExecutionError("deadlock victim".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(&mut self, command: &Command) -> Result<ResultSet, QueryManagerError> {
        self.run(command).await?;
        let result = self.connector.result.clone();
        self.connector.state().rows_handed_out += result.len();
        Ok(result)
    }

    async fn query_first(&mut self, command: &Command) -> Result<Option<DbRow>, QueryManagerError> {
        self.run(command).await?;
        let first = self.connector.result.first().cloned();
        if first.is_some() {
            self.connector.state().rows_handed_out += 1;
        }
        Ok(first)
    }

    async fn execute(&mut self, command: &Command) -> Result<u64, QueryManagerError> {
        self.run(command).await?;
        Ok(self.connector.affected)
    }

    async fn close(self) -> Result<(), QueryManagerError> {
        self.connector.state().closed += 1;
        if self.connector.fail_close {
            return Err(QueryManagerError::ConnectionError("close failed".into()));
        }
        Ok(())
    }
}

pub const CONN: &str = "Server=tcp:localhost,1433;Database=test";

pub fn text_options() -> QueryOptions {
    QueryOptions::default().with_command_type(CommandType::Text)
}

pub fn manager(connector: MockConnector) -> QueryManager<MockConnector> {
    QueryManager::with_defaults(connector, &QueryOptions::new(CONN)).unwrap()
}
