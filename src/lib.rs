// Library exports for Cradle
// This allows integration tests and external code to use Cradle modules

pub mod auth;
pub mod babybox;
pub mod config;
pub mod db;
pub mod donations;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod reactions;
pub mod repository;
pub mod routes;
pub mod state;
