pub mod cluster;
pub mod dashboard;
pub mod http;
pub mod launcher;
