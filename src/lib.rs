pub mod core;
pub mod db;
pub mod library_web_server;
pub mod models;
pub mod routes;
