//! Property-based tests for attribute types.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    /// Strategy to generate non-empty lowercase identifiers
    fn id_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,19}".prop_map(String::from)
    }

    proptest! {
        #[test]
        fn test_known_role_strings_roundtrip(role in prop::sample::select(
            crate::attributes::Role::ALL.to_vec()
        )) {
            use crate::attributes::Role;
            // Canonical name parses back to the same variant
            let parsed: Role = role.as_str().parse().unwrap();
            prop_assert_eq!(parsed, role);
            // Case-insensitively too
            let upper: Role = role.as_str().to_uppercase().parse().unwrap();
            prop_assert_eq!(upper, role);
        }

        #[test]
        fn test_unknown_role_strings_rejected(value in "[a-z]{1,12}") {
            use crate::attributes::Role;
            let is_known = Role::ALL.iter().any(|r| r.as_str() == value);
            let parsed = value.parse::<Role>();
            prop_assert_eq!(parsed.is_ok(), is_known, "value: {}", value);
        }

        #[test]
        fn test_subject_accepts_any_nonempty_ids(
            user_id in id_strategy(),
            business_ids in prop::collection::vec(id_strategy(), 0..8),
        ) {
            use crate::attributes::{Role, SubjectAttributes};
            let subject = SubjectAttributes::new(&user_id, Role::Owner)
                .unwrap()
                .with_business_ids(business_ids.clone());
            prop_assert!(subject.is_ok());
            let subject = subject.unwrap();
            // Set semantics: every supplied id is present
            for id in &business_ids {
                prop_assert!(subject.business_ids.contains(id));
            }
            prop_assert_eq!(
                subject.has_ownership_scope(),
                !business_ids.is_empty()
            );
        }

        #[test]
        fn test_wildcard_grants_every_permission(perm in id_strategy()) {
            use crate::attributes::{Role, SubjectAttributes};
            let subject = SubjectAttributes::new("u1", Role::User)
                .unwrap()
                .with_permissions(["*"])
                .unwrap();
            prop_assert!(subject.has_permission(&perm));
        }

        #[test]
        fn test_resource_sensitivity_preserved(level in 0u8..=255) {
            use crate::attributes::ResourceAttributes;
            let resource = ResourceAttributes::new("Business")
                .unwrap()
                .with_sensitivity_level(level);
            prop_assert_eq!(resource.sensitivity_level, level);
        }
    }
}
