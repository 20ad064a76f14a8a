pub mod auth;
pub mod m3u_generator;
pub mod m3u_parser;
pub mod metrics;
pub mod xtream;
