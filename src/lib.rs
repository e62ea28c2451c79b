pub mod db;
pub mod monitor;
pub mod server;
pub mod version;
