//! External identifier generation.
//!
//! Services take the generator as an injected collaborator so tests and
//! embedding applications can substitute their own.

/// Produces external identifiers for new records.
pub trait UuidSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Default source producing random UUIDv4 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4;

impl UuidSource for UuidV4 {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
