//! Session controller gating login → upload → persist → analyze.
//!
//! A [`Session`] is created when an administrator starts the dashboard and
//! is consumed by [`Session::finish`]. Its state is derived from three flags
//! (`logged_in`, the held dataset, `db_created`):
//!
//! ```text
//! LoggedOut --login--> AwaitingDataset --create_store--> DashboardReady
//!                            ^                                 |
//!                            +------------- reset -------------+
//! ```
//!
//! Calls made in the wrong state fail with [`SessionError::InvalidState`]
//! and change nothing.

use std::{
    fmt,
    io::Read,
    path::{Path, PathBuf},
    time::Instant,
};

use log::{debug, error, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    analysis::Outcome,
    config::AppConfig,
    dataset::{CsvOptions, Dataset},
    schema, store,
    views::{self, AnalysisOption, View},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    AwaitingDataset,
    DashboardReady,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::LoggedOut => "logged out",
            SessionState::AwaitingDataset => "awaiting dataset",
            SessionState::DashboardReady => "dashboard ready",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("This action needs the session to be {expected}, but it is {actual}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
    #[error("Error loading CSV file: {0:#}")]
    MalformedInput(anyhow::Error),
    #[error("Upload a CSV file before creating a database")]
    NoDataset,
    #[error("Please enter a valid database name.")]
    EmptyStoreName,
    #[error("Invalid database name: {0:#}")]
    InvalidStoreName(anyhow::Error),
    #[error("Error creating database: {0:#}")]
    Persistence(anyhow::Error),
}

pub struct Session {
    id: Uuid,
    config: AppConfig,
    csv_options: CsvOptions,
    started: Instant,
    logged_in: bool,
    dataset: Option<Dataset>,
    db_created: bool,
    store: Option<PathBuf>,
}

impl Session {
    pub fn new(config: AppConfig, csv_options: CsvOptions) -> Self {
        let id = Uuid::new_v4();
        info!("Session {id} started");
        Self {
            id,
            config,
            csv_options,
            started: Instant::now(),
            logged_in: false,
            dataset: None,
            db_created: false,
            store: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if !self.logged_in {
            SessionState::LoggedOut
        } else if !self.db_created {
            SessionState::AwaitingDataset
        } else {
            SessionState::DashboardReady
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn is_db_created(&self) -> bool {
        self.db_created
    }

    /// Path of the store created in this session, once there is one.
    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    fn require(&self, expected: SessionState) -> Result<(), SessionError> {
        let actual = self.state();
        if actual == expected {
            Ok(())
        } else {
            warn!("Session {}: rejected action in state {actual}", self.id);
            Err(SessionError::InvalidState { expected, actual })
        }
    }

    pub fn login(&mut self, identity: &str, secret: &str) -> Result<(), SessionError> {
        self.require(SessionState::LoggedOut)?;
        if !self.config.admin.verify(identity, secret) {
            warn!("Session {}: failed login for '{identity}'", self.id);
            return Err(SessionError::InvalidCredentials);
        }
        self.logged_in = true;
        info!("Session {}: '{identity}' logged in", self.id);
        Ok(())
    }

    pub fn upload_path(&mut self, path: &Path) -> Result<&Dataset, SessionError> {
        self.require(SessionState::AwaitingDataset)?;
        let dataset =
            Dataset::load(path, self.csv_options).map_err(SessionError::MalformedInput)?;
        Ok(self.hold(dataset))
    }

    pub fn upload_reader<R: Read>(&mut self, reader: R) -> Result<&Dataset, SessionError> {
        self.require(SessionState::AwaitingDataset)?;
        let dataset =
            Dataset::from_reader(reader, self.csv_options).map_err(SessionError::MalformedInput)?;
        Ok(self.hold(dataset))
    }

    fn hold(&mut self, dataset: Dataset) -> &Dataset {
        info!(
            "Session {}: holding dataset with {} row(s) and {} column(s)",
            self.id,
            dataset.row_count(),
            dataset.column_count()
        );
        self.dataset.insert(dataset)
    }

    /// Drops the held dataset so another file can be uploaded.
    pub fn discard_dataset(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::AwaitingDataset)?;
        if self.dataset.take().is_some() {
            info!("Session {}: discarded held dataset", self.id);
        }
        Ok(())
    }

    /// Persists the held dataset as `<name>.db` in the configured store directory.
    pub fn create_store(&mut self, name: &str) -> Result<PathBuf, SessionError> {
        self.require(SessionState::AwaitingDataset)?;
        if name.trim().is_empty() {
            return Err(SessionError::EmptyStoreName);
        }
        let dataset = self.dataset.as_ref().ok_or(SessionError::NoDataset)?;
        let target = store::store_path(&self.config.store.directory, name)
            .map_err(SessionError::InvalidStoreName)?;
        let table_schema = schema::infer_schema(dataset);
        debug!("Inferred schema {table_schema}");
        match store::persist(dataset, &table_schema, &target) {
            Ok(summary) => {
                self.db_created = true;
                self.store = Some(summary.path.clone());
                Ok(summary.path)
            }
            Err(err) => {
                error!("Session {}: persisting {target:?} failed: {err:#}", self.id);
                Err(SessionError::Persistence(err))
            }
        }
    }

    pub fn analyze(
        &self,
        option: AnalysisOption,
        subject: Option<&str>,
    ) -> Result<Outcome<View>, SessionError> {
        self.require(SessionState::DashboardReady)?;
        let dataset = self.dataset.as_ref().ok_or(SessionError::NoDataset)?;
        Ok(views::evaluate(option, dataset, &self.config, subject))
    }

    /// Returns to the upload step, dropping the dataset and store flag.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::DashboardReady)?;
        self.dataset = None;
        self.db_created = false;
        self.store = None;
        info!("Session {}: reset to upload step", self.id);
        Ok(())
    }

    pub fn finish(self) {
        info!(
            "Session {} finished after {:.1}s",
            self.id,
            self.started.elapsed().as_secs_f64()
        );
    }
}
