// SPDX-License-Identifier: GPL-3.0

pub mod config;
pub mod database;
pub mod enrichment;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;
pub mod utils;

pub use database::init_database;
