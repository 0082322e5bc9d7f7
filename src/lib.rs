pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod registration;
pub mod state;
pub mod storage;
pub mod telemetry;
