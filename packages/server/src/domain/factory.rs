//! Domain factories for creating domain entities and value objects.

use super::SessionId;

/// Factory for generating SessionId instances.
///
/// This factory encapsulates the logic for generating new session identifiers,
/// separating the generation concern from the validation logic in SessionId.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new SessionId with a random UUID v4.
    pub fn generate() -> SessionId {
        SessionId::from_uuid(uuid::Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_factory_generate() {
        // テスト項目: SessionIdFactory::generate() produces a UUID v4 formatted id
        // when (操作):
        let session_id = SessionIdFactory::generate();

        // then (期待する結果):
        let id_str = session_id.as_str();
        assert_eq!(id_str.len(), 36); // UUID v4 の標準長（ハイフン含む）
        assert!(uuid::Uuid::parse_str(id_str).is_ok());
    }

    #[test]
    fn test_session_id_factory_generate_uniqueness() {
        // テスト項目: every generated id is distinct
        // when (操作):
        let session_id1 = SessionIdFactory::generate();
        let session_id2 = SessionIdFactory::generate();

        // then (期待する結果):
        assert_ne!(session_id1, session_id2);
    }
}
