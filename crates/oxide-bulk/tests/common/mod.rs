#![allow(dead_code)]

use std::sync::Mutex;

use oxide_bulk::{Executor, Result};
use oxide_bulk_core::{Dialect, Parameter};
use oxide_bulk_derive::Entity;

/// One statement seen by the recording executor.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

/// An executor that records statements instead of sending them.
pub struct RecordingExecutor {
    dialect: Dialect,
    rows: u64,
    log: Mutex<Vec<Recorded>>,
}

impl RecordingExecutor {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_rows(dialect, 0)
    }

    pub fn with_rows(dialect: Dialect, rows: u64) -> Self {
        Self {
            dialect,
            rows,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.recorded()
            .pop()
            .expect("no statement was executed")
    }
}

impl Executor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect.clone()
    }

    async fn execute(&self, sql: &str, parameters: &[Parameter]) -> Result<u64> {
        self.log.lock().unwrap().push(Recorded {
            sql: String::from(sql),
            parameters: parameters.to_vec(),
        });
        Ok(self.rows)
    }
}

#[derive(Debug, Clone, Entity)]
pub struct SysFunction {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
    #[column(name = "is_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Entity)]
#[entity(table = "orders")]
pub struct Order {
    #[column(primary_key)]
    pub id: i64,
    pub status: String,
    pub total: f64,
}

pub fn markers(parameters: &[Parameter]) -> Vec<&str> {
    parameters.iter().map(|p| p.marker.as_str()).collect()
}
