//! Unit tests for the Identifiers module
//!
//! Tests cover creation, parsing, conversion, and display of the
//! opaque identifiers handed out by the data platform.

use core_kernel::{PolicyId, ProfileId, UserId};

mod policy_id_tests {
    use super::*;

    #[test]
    fn test_new_keeps_value_verbatim() {
        let id = PolicyId::new("a3b1c2d4-0000-4000-8000-000000000010");
        assert_eq!(id.as_str(), "a3b1c2d4-0000-4000-8000-000000000010");
    }

    #[test]
    fn test_label() {
        assert_eq!(PolicyId::label(), "Policy");
    }

    #[test]
    fn test_from_str_roundtrip() {
        let original = PolicyId::from("POL-2024-0001");
        let parsed: PolicyId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_json_serialization() {
        let id = PolicyId::from("p-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p-42\"");

        let back: PolicyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_into_inner() {
        let id = PolicyId::from("p-7");
        assert_eq!(id.into_inner(), "p-7".to_string());
    }
}

mod profile_id_tests {
    use super::*;

    #[test]
    fn test_user_id_converts_to_profile_id() {
        let user = UserId::from("u-1");
        let profile: ProfileId = user.into();
        assert_eq!(profile.as_str(), "u-1");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = ProfileId::from("agent-a");
        let b = ProfileId::from("agent-b");
        assert!(a < b);
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn test_empty_identifier_is_allowed() {
        // The platform decides what a valid id is; the wrapper does not.
        let id = PolicyId::from("");
        assert_eq!(id.as_str(), "");
    }

    #[test]
    fn test_labels_are_distinct() {
        assert_ne!(PolicyId::label(), ProfileId::label());
        assert_ne!(ProfileId::label(), UserId::label());
    }
}
