pub mod app;
pub mod columns;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod importer;
pub mod memory;
pub mod output;
pub mod reference;
pub mod store;
pub mod tsv;
