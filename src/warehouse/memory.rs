//! # In-Memory Warehouse
//!
//! Scripted warehouse for tests and demos. Responses are consumed in the
//! order they were queued; once the queue is empty every statement returns
//! no rows. Every executed statement is recorded.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::catalog::SchemaCatalog;
use crate::query::{ResultSet, SqlValue};

use super::backend::Warehouse;
use super::errors::{WarehouseError, WarehouseResult};

/// A statement the warehouse was asked to run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub template: String,
    pub params: Vec<SqlValue>,
}

/// Scripted warehouse
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    catalog: SchemaCatalog,
    introspect_failure: Option<WarehouseError>,
    responses: Mutex<VecDeque<WarehouseResult<ResultSet>>>,
    executed: Mutex<Vec<ExecutedStatement>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryWarehouse {
    /// Create a warehouse serving `catalog`
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Make introspection fail
    pub fn with_introspection_failure(mut self, err: WarehouseError) -> Self {
        self.introspect_failure = Some(err);
        self
    }

    /// Queue rows for the next unanswered statement
    pub fn push_result(&self, result: ResultSet) {
        guard(&self.responses).push_back(Ok(result));
    }

    /// Queue a failure for the next unanswered statement
    pub fn push_error(&self, err: WarehouseError) {
        guard(&self.responses).push_back(Err(err));
    }

    /// Statements executed so far, oldest first
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        guard(&self.executed).clone()
    }

    /// Number of statements executed
    pub fn execution_count(&self) -> usize {
        guard(&self.executed).len()
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn introspect_schema(&self) -> WarehouseResult<SchemaCatalog> {
        match &self.introspect_failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.catalog.clone()),
        }
    }

    async fn execute(&self, template: &str, params: &[SqlValue]) -> WarehouseResult<ResultSet> {
        guard(&self.executed).push(ExecutedStatement {
            template: template.to_string(),
            params: params.to_vec(),
        });

        guard(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(ResultSet::default()))
    }
}
