//! Domain model (envelope, status, decision, ids, errors).

pub mod decision;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod status;

pub use self::decision::Decision;
pub use self::envelope::MessageEnvelope;
pub use self::errors::{FerryError, ProcessingFailure};
pub use self::ids::WorkerId;
pub use self::status::{MessageStatus, StatusView};
