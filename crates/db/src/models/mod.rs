//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` entity matching its table plus any
//! `Deserialize` input DTOs the API accepts for it.

pub mod activity;
pub mod connection;
pub mod notification;
pub mod point_transaction;
pub mod proximity_request;
pub mod route;
pub mod user;
