pub mod errors;
pub mod id;

pub use errors::{ClientError, TransportError};
pub use id::{new_id, ServerId};

pub type Result<T> = std::result::Result<T, ClientError>;
