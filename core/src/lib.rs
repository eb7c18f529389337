//! Operation adapter for the Local Data Bank statistical API.
//!
//! # Overview
//! Exposes a fixed catalog of remote endpoints as named operations with
//! typed parameter schemas. A caller lists the operations, then invokes one
//! by name with a JSON argument object and always gets a
//! `ResponseEnvelope` back.
//!
//! # Design
//! - `catalog` is a static, table-driven description of every operation;
//!   `translate` walks that table to build a `RequestShape`.
//! - `BdlClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO). A `Transport`
//!   performs the round-trip; `UreqTransport` is the production one.
//! - `Dispatcher` ties the pieces together and wraps every outcome,
//!   failures included, into an envelope.

pub mod catalog;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod http;
pub mod translate;
pub mod transport;

pub use catalog::{Catalog, OperationDescriptor, ParamKind, ParameterSpec, Placement, OPERATIONS};
pub use client::{BdlClient, RemoteClient};
pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use envelope::{ErrorBody, ResponseEnvelope};
pub use error::{ErrorKind, ToolError};
pub use http::{HttpRequest, HttpResponse};
pub use translate::{QueryValue, RequestShape, Translator};
pub use transport::{Transport, UreqTransport};
