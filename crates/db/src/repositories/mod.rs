//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods that
//! accept `&PgPool` as the first argument. Methods that participate in a
//! check-then-act sequence take `&mut PgConnection` instead so the engine
//! can run them inside one transaction.

pub mod booking_repo;
pub mod conversation_repo;
pub mod notification_repo;
pub mod offer_repo;
pub mod outbox_repo;
pub mod rate_limit_repo;
pub mod user_repo;

pub use booking_repo::BookingRepo;
pub use conversation_repo::ConversationRepo;
pub use notification_repo::NotificationRepo;
pub use offer_repo::OfferRepo;
pub use outbox_repo::OutboxRepo;
pub use rate_limit_repo::RateLimitRepo;
pub use user_repo::UserRepo;
