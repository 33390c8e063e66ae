//! Conversions between database collections and graph-library graphs
//!
//! [`Adapter`] borrows a [`Database`] and owns a [`Controller`]. Each call is
//! self-contained: it builds its working set, produces the output, and drops
//! everything else. Calls are sequential passes over collections, then over
//! documents or edges.

pub mod to_database;
pub mod to_graph;

pub use to_database::{ImportConfig, ImportReport};
pub use to_graph::ExportOptions;

use crate::controller::{Controller, DefaultController};
use crate::database::{Database, DocumentStream, QueryOptions};
use crate::error::{AdapterError, Result};
use std::collections::BTreeSet;

/// Converter between a database and graph-library graphs
#[derive(Debug)]
pub struct Adapter<'db, D: Database + ?Sized, C: Controller = DefaultController> {
    db: &'db D,
    controller: C,
}

impl<'db, D: Database + ?Sized> Adapter<'db, D> {
    /// Adapter with the default controller
    #[must_use]
    pub fn new(db: &'db D) -> Self {
        Self {
            db,
            controller: DefaultController,
        }
    }
}

impl<'db, D: Database + ?Sized, C: Controller> Adapter<'db, D, C> {
    /// Adapter with a custom controller
    #[must_use]
    pub fn with_controller(db: &'db D, controller: C) -> Self {
        Self { db, controller }
    }

    /// The database this adapter reads from and writes to
    #[must_use]
    pub fn database(&self) -> &'db D {
        self.db
    }

    /// The active controller
    #[must_use]
    pub fn controller(&self) -> &C {
        &self.controller
    }

    fn require_collection(&self, name: &str) -> Result<()> {
        if self.db.has_collection(name).map_err(AdapterError::Database)? {
            Ok(())
        } else {
            Err(AdapterError::UnknownCollection(name.to_string()))
        }
    }

    fn stream(
        &self,
        collection: &str,
        projection: &BTreeSet<String>,
        options: &QueryOptions,
    ) -> Result<DocumentStream<'db>> {
        self.db
            .fetch(collection, projection, options)
            .map_err(AdapterError::Database)
    }
}
