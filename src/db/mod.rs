pub mod blobs;
pub mod messages;
pub mod models;

pub use blobs::BlobStore;
pub use messages::MessageRepository;
pub use models::{Message, NewMessage};

/// Embedded migrations, shared by the binary and the test suites.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
