//! Core library for the `forecast` client.
//!
//! This crate defines:
//! - Configuration and the saved city list
//! - The forecast client, payload parser and row projection
//! - The orchestrator that runs one refresh cycle and reports its outcome
//!
//! It is used by `forecast-cli`, but any front-end implementing
//! [`PresentationSink`] can drive it.

pub mod city;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod projector;

pub use city::{CityList, CityListProvider};
pub use client::{ForecastClient, HttpForecastClient};
pub use config::{Config, EndpointConfig};
pub use error::{FormatError, RefreshError, TransportError};
pub use model::{DayRecord, DisplayRow, StructuredForecast};
pub use orchestrator::{
    FetchCompletion, ForecastOrchestrator, PresentationSink, RefreshOutcome, RefreshStart,
};
