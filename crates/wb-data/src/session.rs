//! Per-session state and the interaction cycle.
//!
//! Every user interaction is applied with [`Session::handle`], which updates
//! the durable state (registered tables) and then recomputes everything
//! derived from it: the table list, the active selection and the default
//! query. The returned [`Frame`] is what the UI renders until the next
//! interaction.

use tracing::{debug, error, info, warn};
use wb_core::events::events::{FetchFailed, IngestFailed, IngestSkipped, SelectionChanged, TableRegistered};
use wb_core::{Dataset, EventBus, Notice, Selection, WorkbenchSettings};

use crate::config::IngestConfig;
use crate::ingest::{ingest_upload, register_tables, IngestOutcome, UploadedFile};
use crate::remote::RemoteFetcher;
use crate::store::{QueryResult, TableStore};
use crate::{DataError, FetchError, IngestError, QueryError};

/// A user action driving one cycle
#[derive(Debug, Clone)]
pub enum Interaction {
    Upload(Vec<UploadedFile>),
    FetchUrl(String),
    SelectTable(String),
    EditQuery(String),
    /// Recompute without changing anything
    Refresh,
}

/// Derived state of one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub cycle: u64,
    pub tables: Vec<String>,
    pub active: Option<String>,
    pub query: String,
    /// Notices raised by this interaction only
    pub notices: Vec<Notice>,
}

/// Session-scoped context: one user, one database connection
pub struct Session {
    settings: WorkbenchSettings,
    ingest_config: IngestConfig,
    store: Option<TableStore>,
    fetcher: Option<RemoteFetcher>,
    selection: Selection,
    query: String,
    cycle: u64,
    events: EventBus,
    active_dataset: Option<(u64, Dataset)>,
}

impl Session {
    /// Create a new session; the database is opened on first use
    pub fn new(settings: WorkbenchSettings) -> Self {
        Self::with_ingest_config(settings, IngestConfig::default())
    }

    pub fn with_ingest_config(settings: WorkbenchSettings, ingest_config: IngestConfig) -> Self {
        Self {
            settings,
            ingest_config,
            store: None,
            fetcher: None,
            selection: Selection::new(),
            query: String::new(),
            cycle: 0,
            events: EventBus::new(),
            active_dataset: None,
        }
    }

    pub fn settings(&self) -> &WorkbenchSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// The table store, opened on first access
    pub fn store(&mut self) -> Result<&mut TableStore, DataError> {
        let store = match self.store.take() {
            Some(store) => store,
            None => {
                info!("Opening session database");
                TableStore::open(&self.settings.store)?
            }
        };
        Ok(self.store.insert(store))
    }

    fn fetcher(&mut self) -> Result<&RemoteFetcher, FetchError> {
        let fetcher = match self.fetcher.take() {
            Some(fetcher) => fetcher,
            None => RemoteFetcher::new(self.settings.fetch_timeout)?,
        };
        Ok(self.fetcher.insert(fetcher))
    }

    /// Apply one interaction and recompute the derived state
    pub async fn handle(&mut self, interaction: Interaction) -> Frame {
        let mut notices = Vec::new();
        let mut requested = None;

        match interaction {
            Interaction::Upload(files) => {
                for file in &files {
                    self.upload(file, &mut notices);
                }
            }
            Interaction::FetchUrl(url) => self.fetch(&url, &mut notices).await,
            Interaction::SelectTable(name) => requested = Some(name),
            Interaction::EditQuery(sql) => self.query = sql,
            Interaction::Refresh => {}
        }

        let tables = match self.store().and_then(|store| store.list_tables()) {
            Ok(tables) => tables,
            Err(e) => {
                error!("Could not list tables: {}", e);
                notices.push(Notice::error("Database error", e.to_string()));
                self.selection.tables().to_vec()
            }
        };

        let previous = self.selection.active().map(str::to_string);
        if self.selection.reconcile(tables, requested.as_deref()) {
            let current = self.selection.active().map(str::to_string);
            debug!("Active table {:?} -> {:?}", previous, current);
            self.query = current
                .as_deref()
                .map(|table| self.settings.preview_query(table))
                .unwrap_or_default();
            self.events.publish(SelectionChanged { previous, current });
        }

        self.cycle += 1;
        Frame {
            cycle: self.cycle,
            tables: self.selection.tables().to_vec(),
            active: self.selection.active().map(str::to_string),
            query: self.query.clone(),
            notices,
        }
    }

    fn upload(&mut self, file: &UploadedFile, notices: &mut Vec<Notice>) {
        let config = self.ingest_config.clone();
        let outcomes = match self.store() {
            Ok(store) => ingest_upload(store, file, &config),
            Err(e) => vec![IngestOutcome::Failed {
                file: file.name.clone(),
                error: e.to_string(),
            }],
        };
        self.report(outcomes, notices);
    }

    async fn fetch(&mut self, url: &str, notices: &mut Vec<Notice>) {
        let payload = match self.fetcher() {
            Ok(fetcher) => fetcher.clone().fetch(url).await,
            Err(e) => Err(e),
        };
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Fetch failed: {}", e);
                notices.push(Notice::warning("Could not fetch data", e.to_string()));
                self.events.publish(FetchFailed {
                    url: url.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };

        let format = payload.format();
        let tables = match format.decode(&payload.name, &payload.bytes, &self.ingest_config) {
            Ok(tables) => tables,
            Err(source) => {
                let e = IngestError::UnsupportedFormat {
                    name: payload.name.clone(),
                    format,
                    source,
                };
                error!("{}", e);
                notices.push(Notice::error("Unsupported format", e.to_string()));
                self.events.publish(IngestFailed {
                    file_name: payload.name.clone(),
                    error: e.to_string(),
                });
                return;
            }
        };

        let outcomes = match self.store() {
            Ok(store) => register_tables(store, &payload.name, tables),
            Err(e) => vec![IngestOutcome::Failed {
                file: payload.name.clone(),
                error: e.to_string(),
            }],
        };
        self.report(outcomes, notices);
    }

    /// Turn ingestion outcomes into notices and events
    fn report(&self, outcomes: Vec<IngestOutcome>, notices: &mut Vec<Notice>) {
        for outcome in outcomes {
            match outcome {
                IngestOutcome::Registered { table, rows, columns } => {
                    notices.push(Notice::info(
                        "Table loaded",
                        format!("{} ({} rows, {} columns)", table, rows, columns),
                    ));
                    self.events.publish(TableRegistered {
                        table_name: table,
                        row_count: rows,
                        column_count: columns,
                    });
                }
                IngestOutcome::AlreadyRegistered { table } => {
                    debug!("{} is already loaded", table);
                }
                IngestOutcome::Skipped { file, mime } => {
                    notices.push(Notice::warning(
                        "File skipped",
                        format!("{} has unsupported type {}", file, mime),
                    ));
                    self.events.publish(IngestSkipped {
                        file_name: file,
                        mime_type: mime,
                    });
                }
                IngestOutcome::Failed { file, error } => {
                    notices.push(Notice::error("Could not load file", format!("{}: {}", file, error)));
                    self.events.publish(IngestFailed { file_name: file, error });
                }
            }
        }
    }

    /// Run a statement against every registered table
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult, QueryError> {
        let store = self.store().map_err(|e| QueryError { message: e.to_string() })?;
        let result = store.execute(sql);
        if let Err(e) = &result {
            error!("Query failed: {}", e);
        }
        result
    }

    /// All rows of the active table, read once per cycle
    pub fn active_dataset(&mut self) -> Result<Option<Dataset>, QueryError> {
        let Some(name) = self.selection.active().map(str::to_string) else {
            return Ok(None);
        };
        if let Some((cycle, dataset)) = &self.active_dataset {
            if *cycle == self.cycle {
                return Ok(Some(dataset.clone()));
            }
        }

        let store = self.store().map_err(|e| QueryError { message: e.to_string() })?;
        let dataset = store.fetch_all(&name)?;
        self.active_dataset = Some((self.cycle, dataset.clone()));
        Ok(Some(dataset))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cycle", &self.cycle)
            .field("selection", &self.selection)
            .field("store", &self.store)
            .finish()
    }
}
