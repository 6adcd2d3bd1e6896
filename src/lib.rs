pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod output;
pub mod view;

#[cfg(test)]
mod tests;
