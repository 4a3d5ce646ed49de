// LLM Engine API - provider resolution, credential storage, completion proxying

pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod proxy;
