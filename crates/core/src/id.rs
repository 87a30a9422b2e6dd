//! Unique identifiers for Nebula entities.
//!
//! This module provides strongly-typed UUID identifiers for the entities
//! named in the data model using [`domain-key`](https://crates.io/crates/domain-key)
//! `Uuid<D>` wrappers. Each identifier type is parameterized by a unique domain
//! marker, providing compile-time type safety that prevents mixing different
//! ID types.
//!
//! All ID types are `Copy` (16 bytes, stack-allocated) and support:
//! - `v4()` for random UUID generation
//! - `nil()` for zero-valued default
//! - `parse(&str)` for string parsing
//! - Full serde support (serializes as UUID string)
//! - `Display`, `FromStr`, `Eq`, `Ord`, `Hash`

use domain_key::define_uuid;

// Re-export for downstream parse error handling
pub use domain_key::UuidParseError;

// Entity identifiers — UUID-based, Copy, 16 bytes each.
define_uuid!(UserIdDomain => UserId);
define_uuid!(WorkflowIdDomain => WorkflowId);
define_uuid!(NodeIdDomain => NodeId);
define_uuid!(EdgeIdDomain => EdgeId);
define_uuid!(ExecutionIdDomain => ExecutionId);
define_uuid!(ScheduleIdDomain => ScheduleId);
define_uuid!(TeamIdDomain => TeamId);
define_uuid!(AgentIdDomain => AgentId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_id_v4_creates_non_nil_uuid() {
        let id = ExecutionId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn workflow_id_v4_creates_non_nil_uuid() {
        let id = WorkflowId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn schedule_id_v4_creates_non_nil_uuid() {
        let id = ScheduleId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn team_id_v4_creates_non_nil_uuid() {
        let id = TeamId::v4();
        assert!(!id.is_nil());
    }

    #[test]
    fn id_nil_creates_zero_valued_uuid() {
        let id = NodeId::nil();
        assert!(id.is_nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn id_parse_valid_uuid_string_succeeds() {
        let id = WorkflowId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert!(!id.is_nil());
    }

    #[test]
    fn id_parse_invalid_string_returns_error() {
        let result = WorkflowId::parse("not-a-uuid");
        assert!(result.is_err());
    }

    #[test]
    fn id_serde_json_roundtrip() {
        let id = ExecutionId::v4();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn different_id_types_are_incompatible() {
        // Verifies type safety at the type level: WorkflowId and NodeId are
        // distinct types, so passing one where the other is expected is a
        // compile error.
        fn accepts_workflow(_id: WorkflowId) {}
        let workflow = WorkflowId::v4();
        accepts_workflow(workflow);
    }
}
