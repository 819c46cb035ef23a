//! Axum handlers, one module per resource.
//!
//! Handlers extract and shape input, call into [`crate::engine`] or a
//! repository, and wrap results in [`DataResponse`](crate::response::DataResponse).

pub mod activities;
pub mod connections;
pub mod notification;
pub mod points;
pub mod requests;
pub mod users;
