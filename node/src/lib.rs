// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod telemetry;
pub mod process;
pub mod transport;
pub mod gateway;
pub mod contracts;
pub mod settle;
pub mod backend;
pub mod workload;
pub mod coordinator;
