//! Name-based entry point: resolve, translate, fetch, wrap.
//!
//! # Design
//! `Dispatcher` owns the catalog index, the translator and the remote
//! client, all immutable after construction, so one instance can serve
//! concurrent calls from any number of threads. `invoke` is total: every
//! outcome, including a panic somewhere below it, comes back as a
//! `ResponseEnvelope`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::catalog::{Catalog, OperationDescriptor};
use crate::client::{BdlClient, RemoteClient};
use crate::config::ClientConfig;
use crate::envelope::ResponseEnvelope;
use crate::error::ToolError;
use crate::translate::{RequestShape, Translator};
use crate::transport::{Transport, UreqTransport};

pub struct Dispatcher {
    catalog: Catalog,
    translator: Translator,
    remote: RemoteClient,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ToolError> {
        Ok(Self {
            catalog: Catalog::builtin()?,
            translator: Translator::new(config.default_lang.clone()),
            remote: RemoteClient::new(BdlClient::from_config(config), transport),
        })
    }

    /// Dispatcher backed by a `UreqTransport` using `config.timeout`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ToolError> {
        Self::new(config, Arc::new(UreqTransport::new(config.timeout)))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn list_operations(&self) -> &'static [OperationDescriptor] {
        self.catalog.operations()
    }

    /// Resolve `name` and translate `arguments` without touching the network.
    pub fn translate(&self, name: &str, arguments: &Value) -> Result<RequestShape, ToolError> {
        let op = self.catalog.get(name)?;
        self.translator.translate(op, arguments)
    }

    /// Run one call end to end. Never panics and never returns an error
    /// outside the envelope.
    pub fn invoke(&self, name: &str, arguments: &Value) -> ResponseEnvelope {
        tracing::info!(operation = name, "invoking operation");

        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_invoke(name, arguments)));
        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(operation = name, "operation panicked");
                Err(ToolError::Internal("unexpected failure while handling the call".to_string()))
            }
        };

        if let Err(err) = &result {
            tracing::info!(operation = name, kind = ?err.kind(), "operation failed");
        }
        ResponseEnvelope::from_result(result)
    }

    fn try_invoke(&self, name: &str, arguments: &Value) -> Result<Value, ToolError> {
        let shape = self.translate(name, arguments)?;
        self.remote.get(&shape)
    }
}
