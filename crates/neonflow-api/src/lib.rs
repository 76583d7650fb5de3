pub mod auth;
pub mod channels;
pub mod error;
pub mod generate;
pub mod middleware;
pub mod posts;
pub mod publish;
pub mod stats;
