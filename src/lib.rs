pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod dump;
pub mod logging;
pub mod node;
pub mod script;
pub mod store;
pub mod tree;
