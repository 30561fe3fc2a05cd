pub mod backend;
pub mod bootstrap;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod provision;
pub mod report;
pub mod seed;
