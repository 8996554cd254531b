//! Client code for sharecache.
//!
//! This crate provides the network fetcher and the offline asset cache worker
//! that routes page requests between the network and the snapshot store.

pub mod fetch;
pub mod worker;

pub use fetch::{AssetRequest, FetchConfig, Fetcher, HttpFetcher, RequestMode};
pub use reqwest::Method;
pub use worker::{
    ActivateReport, AssetClass, Clients, ControlMessage, FetchOutcome, InstallReport, Registration, Scope,
    ServiceWorker, WorkerConfig, WorkerState, classify,
};
