use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod public_url;
pub mod service;
pub mod storage;

fn main() {
    run();
}
