pub mod app;
pub mod auth;
pub mod balance;
pub mod bank;
pub mod config;
pub mod error;
pub mod groups;
pub mod invitations;
pub mod model;
pub mod settlements;
pub mod split;
pub mod state;
pub mod store;
pub mod transactions;
pub mod users;
