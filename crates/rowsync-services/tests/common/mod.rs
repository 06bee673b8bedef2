//! Common test utilities and mocks
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rowsync_core::{
    Column, DataColumn, DataPage, DataQuery, Editor, GridConfig, GridModel, Record, SyncAction,
    SyncChange, SyncProgress, SyncResult, Validator, Value,
};
use rowsync_services::{DataSource, GridController, ProgressReporter, SyncBackend};
use tokio::sync::Notify;

/// In-memory record source that pages through a fixed record list
pub struct MockDataSource {
    pub records: Vec<Record>,
    pub should_fail: bool,
    /// Every query received, for assertion in tests
    pub query_log: Arc<Mutex<Vec<DataQuery>>>,
}

impl MockDataSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            should_fail: false,
            query_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn query_log(&self) -> Vec<DataQuery> {
        self.query_log.lock().clone()
    }
}

#[async_trait]
impl DataSource<Record> for MockDataSource {
    async fn fetch(&self, query: &DataQuery) -> anyhow::Result<DataPage<Record>> {
        self.query_log.lock().push(query.clone());
        if self.should_fail {
            anyhow::bail!("data source unavailable");
        }
        let data = self
            .records
            .iter()
            .skip(query.pagination.offset())
            .take(query.pagination.page_size)
            .cloned()
            .collect();
        Ok(DataPage {
            total_count: self.records.len(),
            data,
        })
    }
}

/// Sync backend that accepts every change unless told otherwise.
///
/// New rows without an `id` are assigned one, like a database sequence.
pub struct MockSyncBackend {
    /// Reject the whole batch
    pub should_fail: bool,
    /// Reject rows whose field equals the value
    pub reject_when: Option<(String, Value)>,
    /// Report each result through the progress reporter as it is produced
    pub interim_reports: bool,
    /// Wait for this before answering
    pub gate: Option<Arc<Notify>>,
    /// Sizes of the batches received
    pub batch_log: Arc<Mutex<Vec<usize>>>,
    next_id: Mutex<i64>,
}

impl MockSyncBackend {
    pub fn new() -> Self {
        Self {
            should_fail: false,
            reject_when: None,
            interim_reports: false,
            gate: None,
            batch_log: Arc::new(Mutex::new(Vec::new())),
            next_id: Mutex::new(1000),
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn rejecting(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.reject_when = Some((field.into(), value.into()));
        self
    }

    pub fn with_interim_reports(mut self) -> Self {
        self.interim_reports = true;
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn batch_log(&self) -> Vec<usize> {
        self.batch_log.lock().clone()
    }

    fn persist(&self, mut change: SyncChange<Record>) -> SyncResult<Record> {
        if let Some((field, value)) = &self.reject_when {
            if change.model.get(field).as_ref() == Some(value) {
                return SyncResult::failed(change, format!("{field} rejected"));
            }
        }
        if change.sync_action == SyncAction::Added
            && change.model.get("id").is_none_or(|v| v.is_null())
        {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            change.model.set("id", Value::Int(*next_id));
        }
        SyncResult::succeeded(change)
    }
}

#[async_trait]
impl SyncBackend<Record> for MockSyncBackend {
    async fn sync_changes(
        &self,
        batch: Vec<SyncChange<Record>>,
        reporter: ProgressReporter<Record>,
    ) -> anyhow::Result<Vec<SyncResult<Record>>> {
        self.batch_log.lock().push(batch.len());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.should_fail {
            anyhow::bail!("connection reset");
        }

        let total = batch.len();
        let mut results = Vec::with_capacity(total);
        for (i, change) in batch.into_iter().enumerate() {
            let result = self.persist(change);
            if self.interim_reports {
                reporter.report(SyncProgress::new(i + 1, total), Some(vec![result.clone()]));
            }
            results.push(result);
        }
        Ok(results)
    }
}

pub fn person(id: i64) -> Record {
    Record::new()
        .with("id", id)
        .with("name", format!("person {id}"))
        .with("age", 20 + id)
}

pub fn people(count: i64) -> Vec<Record> {
    (1..=count).map(person).collect()
}

pub fn person_columns() -> Vec<Column> {
    vec![
        Column::Data(DataColumn::new("id").title("ID")),
        Column::Data(
            DataColumn::new("name")
                .title("Name")
                .editable(Editor::Text)
                .validator(Validator::new().required().max_len(40)),
        ),
        Column::Data(
            DataColumn::new("age")
                .title("Age")
                .editable(Editor::Number { min: Some(0.0), max: None })
                .validator(Validator::new().min(0.0))
                .default_value(18),
        ),
    ]
}

pub fn controller(
    config: GridConfig,
    source: MockDataSource,
    backend: MockSyncBackend,
) -> (GridController<Record>, Arc<MockDataSource>, Arc<MockSyncBackend>) {
    let source = Arc::new(source);
    let backend = Arc::new(backend);
    let controller = GridController::new(
        config,
        person_columns(),
        source.clone() as Arc<dyn DataSource<Record>>,
        backend.clone() as Arc<dyn SyncBackend<Record>>,
    );
    (controller, source, backend)
}

/// An editable controller already showing the first page of `count` people
pub async fn loaded_controller(
    count: i64,
    backend: MockSyncBackend,
) -> (GridController<Record>, Arc<MockSyncBackend>) {
    let (controller, _, backend) = controller(
        GridConfig::editable(),
        MockDataSource::new(people(count)),
        backend,
    );
    controller
        .load(DataQuery::default())
        .await
        .expect("initial load should succeed");
    (controller, backend)
}
