//! Integration tests for the full access pipeline.
//!
//! Tests: fixture → InMemoryDirectory → TimeoutStore → AccessService
//!
//! Verifies:
//! - Principals are loaded with enabled roles only
//! - Capability gates and scope filters agree with the directory content
//! - Superusers bypass both

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use backoffice_auth::catalog::system;
    use backoffice_auth::{
        AccessError, CapabilityRequirement, DataScope, DenialKind, Principal, ScopeOptions, ScopePolicy,
        ScopeSettings,
    };
    use backoffice_core::{RoleId, Status, UserId};

    use crate::access::AccessService;
    use crate::store::{DirectorySnapshot, InMemoryDirectory, TimeoutStore};

    type Service = AccessService<TimeoutStore<InMemoryDirectory>>;

    fn setup(settings: ScopeSettings) -> (Service, Arc<TimeoutStore<InMemoryDirectory>>) {
        let snapshot = DirectorySnapshot::from_json(include_str!("../fixtures/directory.json")).unwrap();
        let directory = InMemoryDirectory::from_snapshot(snapshot).unwrap();
        let store = Arc::new(TimeoutStore::new(directory, Duration::from_secs(1)));
        (AccessService::new(store.clone(), settings), store)
    }

    async fn principal(svc: &Service, store: &TimeoutStore<InMemoryDirectory>, id: &str) -> Principal {
        let user = store.inner().user(&UserId::new(id)).unwrap().unwrap();
        svc.principal(&user).await.unwrap()
    }

    #[tokio::test]
    async fn manager_sees_own_subtree_plus_granted_branch() {
        let (svc, store) = setup(ScopeSettings::default());
        let alice = principal(&svc, &store, "alice").await;

        let scope = svc.data_scope(&alice, ScopeOptions::subdepartments()).await.unwrap();
        let allowed: Vec<&str> = scope
            .predicate()
            .unwrap()
            .allowed_departments
            .iter()
            .map(|d| d.as_str())
            .collect();
        assert_eq!(allowed, vec!["branch", "sales", "sales-north", "sales-south"]);
    }

    #[tokio::test]
    async fn disabled_role_grants_nothing() {
        let (svc, store) = setup(ScopeSettings::default());
        let alice = principal(&svc, &store, "alice").await;

        // Only the disabled auditor role carries the reset-password action.
        let reset = CapabilityRequirement::all([system::user::RESET_PASSWORD]);
        assert!(svc.authorize(&alice, &CapabilityRequirement::all([system::user::ADD])).is_ok());
        let err = svc.authorize(&alice, &reset).unwrap_err();
        assert!(matches!(err, AccessError::Authorization(DenialKind::MissingCapability)));
        assert_eq!(err.public_message(), "insufficient access, request denied");

        let mut auditor = store.inner().role(&RoleId::new("auditor")).unwrap().unwrap();
        auditor.status = Status::Enabled;
        store.inner().insert_role(auditor).unwrap();
        let alice = principal(&svc, &store, "alice").await;
        assert!(svc.authorize(&alice, &reset).is_ok());
    }

    #[tokio::test]
    async fn roleless_user_is_structurally_denied_and_fails_open_on_scope() {
        let (svc, store) = setup(ScopeSettings::default());
        let bob = principal(&svc, &store, "bob").await;

        let err = svc
            .authorize(&bob, &CapabilityRequirement::any([system::dept::LIST]))
            .unwrap_err();
        assert!(matches!(err, AccessError::Authorization(DenialKind::NoRoles)));

        let scope = svc.data_scope(&bob, ScopeOptions::subdepartments()).await.unwrap();
        assert_eq!(scope, DataScope::Unrestricted);
    }

    #[tokio::test]
    async fn fail_closed_policy_denies_the_roleless_user() {
        let settings = ScopeSettings {
            policy: ScopePolicy::FailClosed,
            ..ScopeSettings::default()
        };
        let (svc, store) = setup(settings);
        let bob = principal(&svc, &store, "bob").await;

        let filter = svc
            .scoped_filter(&bob, ScopeOptions::subdepartments(), json!({}))
            .await
            .unwrap();
        assert_eq!(filter, json!({ "_id": { "$in": [] } }));
    }

    #[tokio::test]
    async fn superuser_bypasses_everything() {
        let (svc, store) = setup(ScopeSettings::default());
        let admin = principal(&svc, &store, "admin").await;

        let req = CapabilityRequirement::all([system::role::REMOVE, system::menu::REMOVE]);
        assert!(svc.authorize(&admin, &req).is_ok());

        let base = json!({ "status": "enabled" });
        let filter = svc
            .scoped_filter(&admin, ScopeOptions::subdepartments().own_record_fallback(), base.clone())
            .await
            .unwrap();
        assert_eq!(filter, base);

        // The disabled "roles" page stays hidden even for superusers.
        let routes = svc.routes(&admin).await.unwrap();
        assert!(routes.iter().all(|m| m.id.as_str() != "roles"));
        assert_eq!(routes.len(), 3);
    }
}
