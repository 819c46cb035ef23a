//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that only read take `&PgPool`; methods that participate in a
//! caller's transaction take `impl PgExecutor` and are passed `&mut *tx`.

pub mod activity_repo;
pub mod connection_repo;
pub mod notification_repo;
pub mod point_transaction_repo;
pub mod proximity_request_repo;
pub mod route_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use connection_repo::ConnectionRepo;
pub use notification_repo::NotificationRepo;
pub use point_transaction_repo::PointTransactionRepo;
pub use proximity_request_repo::ProximityRequestRepo;
pub use route_repo::RouteRepo;
pub use user_repo::UserRepo;
