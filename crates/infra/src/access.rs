//! Request-facing access service.
//!
//! Wires the engine components over one directory store: principal loading,
//! capability checks, data scopes, navigation and the department maintenance
//! guards that depend on the hierarchy.

use std::sync::Arc;

use backoffice_auth::department::validate_removal;
use backoffice_auth::navigation;
use backoffice_auth::{
    AccessError, AuthorizationExplanation, CapabilityRequirement, DataScope, Department,
    DepartmentStore, MenuItem, MenuStore, ParentChoice, Principal, RoleStore, ScopeBuilder, ScopeOptions,
    ScopeSettings, TreeNode, authorize, build_tree, explain_authorization,
};
use backoffice_core::DepartmentId;

use crate::principal_loader::{PrincipalLoader, UserRecord};

pub struct AccessService<S> {
    store: Arc<S>,
    loader: PrincipalLoader<Arc<S>>,
    scopes: ScopeBuilder<Arc<S>>,
}

impl<S> AccessService<S>
where
    S: DepartmentStore + RoleStore + MenuStore,
{
    pub fn new(store: Arc<S>, settings: ScopeSettings) -> Self {
        Self {
            loader: PrincipalLoader::new(store.clone()),
            scopes: ScopeBuilder::with_settings(store.clone(), settings),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ScopeSettings {
        self.scopes.settings()
    }

    pub async fn principal(&self, user: &UserRecord) -> Result<Principal, AccessError> {
        self.loader.load(user).await
    }

    /// Gate an operation; on denial the explanation is logged for operators.
    pub fn authorize(&self, principal: &Principal, requirement: &CapabilityRequirement) -> Result<(), AccessError> {
        authorize(principal, requirement).inspect_err(|_| {
            let explanation = explain_authorization(principal, requirement);
            tracing::info!(
                principal = %explanation.principal_id,
                missing = ?explanation.missing,
                reason = %explanation.reason,
                "operation denied"
            );
        })
    }

    pub fn explain(&self, principal: &Principal, requirement: &CapabilityRequirement) -> AuthorizationExplanation {
        explain_authorization(principal, requirement)
    }

    pub async fn data_scope(&self, principal: &Principal, options: ScopeOptions) -> Result<DataScope, AccessError> {
        self.scopes.build(principal, options).await
    }

    /// Scope rendered and AND-ed with `base`, ready for the data-access layer.
    pub async fn scoped_filter(
        &self,
        principal: &Principal,
        options: ScopeOptions,
        base: serde_json::Value,
    ) -> Result<serde_json::Value, AccessError> {
        let scope = self.data_scope(principal, options).await?;
        Ok(scope.apply(base))
    }

    pub async fn routes(&self, principal: &Principal) -> Result<Vec<MenuItem>, AccessError> {
        navigation::routes(principal, self.store.as_ref()).await
    }

    pub async fn route_tree(&self, principal: &Principal) -> Result<Vec<TreeNode<MenuItem>>, AccessError> {
        navigation::route_tree(principal, self.store.as_ref()).await
    }

    /// Departments visible to `principal`, nested.
    pub async fn visible_departments(
        &self,
        principal: &Principal,
        options: ScopeOptions,
    ) -> Result<Vec<TreeNode<Department>>, AccessError> {
        let scope = self.data_scope(principal, options).await?;
        let visible: Vec<Department> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter(|d| scope.permits(d))
            .collect();
        Ok(build_tree(visible))
    }

    pub async fn ensure_can_reparent(&self, id: &DepartmentId, new_parent: &DepartmentId) -> Result<(), AccessError> {
        self.scopes.resolver().ensure_can_reparent(id, new_parent).await
    }

    pub async fn ensure_can_remove(&self, id: &DepartmentId) -> Result<(), AccessError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(AccessError::not_found("department", id));
        }
        let children = self.store.find_children(id).await?;
        validate_removal(id, &children)?;
        Ok(())
    }

    /// Parent picker for `id`, narrowed to the departments `principal` can see.
    /// The root choice is never scoped away.
    pub async fn selectable_parents(
        &self,
        principal: &Principal,
        id: &DepartmentId,
        options: ScopeOptions,
    ) -> Result<Vec<ParentChoice>, AccessError> {
        let choices = self.scopes.resolver().selectable_parents(id).await?;
        let scope = self.data_scope(principal, options).await?;
        Ok(choices
            .into_iter()
            .filter(|choice| match choice {
                ParentChoice::Root => true,
                ParentChoice::Department(d) => scope.permits(d),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use backoffice_auth::catalog::system;
    use backoffice_auth::{DenialKind, MenuKind};
    use backoffice_core::{MenuId, RoleId, Status};

    use super::*;
    use crate::store::{InMemoryDirectory, RoleRecord};

    fn menu(id: &str, parent: &str, kind: MenuKind, token: Option<&'static str>, order: i32) -> MenuItem {
        MenuItem {
            id: MenuId::new(id),
            parent_id: MenuId::new(parent),
            name: id.to_string(),
            kind,
            path: (kind != MenuKind::Action).then(|| format!("/{id}")),
            permission: token.map(Into::into),
            order,
            status: Status::Enabled,
        }
    }

    fn service() -> AccessService<InMemoryDirectory> {
        let dir = InMemoryDirectory::new();
        for (id, parent, order) in [("D1", "0", 0), ("D2", "D1", 1), ("D3", "D1", 0), ("D4", "D3", 0), ("D9", "0", 1)] {
            let mut d = Department::new(id, parent, id);
            d.order = order;
            dir.insert_department(d).unwrap();
        }
        for m in [
            menu("sys", "0", MenuKind::Group, None, 0),
            menu("users", "sys", MenuKind::Page, Some("system:user:list"), 1),
            menu("users-add", "users", MenuKind::Action, Some("system:user:add"), 0),
            menu("depts", "sys", MenuKind::Page, Some("system:dept:list"), 2),
        ] {
            dir.insert_menu(m).unwrap();
        }
        dir.insert_role(RoleRecord {
            id: RoleId::new("viewer"),
            name: "Viewer".to_string(),
            key: "viewer".to_string(),
            menu_ids: vec![MenuId::new("sys"), MenuId::new("users")],
            department_ids: BTreeSet::from([DepartmentId::new("D9")]),
            status: Status::Enabled,
            order: 0,
        })
        .unwrap();
        AccessService::new(Arc::new(dir), ScopeSettings::default())
    }

    #[tokio::test]
    async fn viewer_end_to_end() {
        let svc = service();
        let user = UserRecord::new("u1").in_department("D3").with_roles(["viewer"]);
        let principal = svc.principal(&user).await.unwrap();

        assert!(svc.authorize(&principal, &CapabilityRequirement::all([system::user::LIST])).is_ok());
        let err = svc
            .authorize(&principal, &CapabilityRequirement::all([system::user::ADD]))
            .unwrap_err();
        assert!(matches!(err, AccessError::Authorization(DenialKind::MissingCapability)));

        let routes: Vec<String> = svc
            .routes(&principal)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id.to_string())
            .collect();
        assert_eq!(routes, vec!["sys", "users"]);

        let filter = svc
            .scoped_filter(&principal, ScopeOptions::subdepartments(), json!({ "status": "enabled" }))
            .await
            .unwrap();
        assert_eq!(
            filter,
            json!({ "$and": [
                { "status": "enabled" },
                { "$or": [
                    { "deptId": { "$in": ["D3", "D4", "D9"] } },
                    { "_id": { "$in": ["D3", "D4", "D9"] } },
                ]},
            ]})
        );
    }

    #[tokio::test]
    async fn visible_departments_follow_the_scope() {
        let svc = service();
        let user = UserRecord::new("u1").in_department("D3").with_roles(["viewer"]);
        let principal = svc.principal(&user).await.unwrap();

        let tree = svc
            .visible_departments(&principal, ScopeOptions::subdepartments())
            .await
            .unwrap();
        let roots: Vec<&str> = tree.iter().map(|n| n.item.id.as_str()).collect();
        assert_eq!(roots, vec!["D3", "D9"]);
        assert_eq!(tree[0].children[0].item.id.as_str(), "D4");

        let admin = svc.principal(&UserRecord::new("root").superuser()).await.unwrap();
        let tree = svc.visible_departments(&admin, ScopeOptions::default()).await.unwrap();
        assert_eq!(tree.iter().map(TreeNode::count).sum::<usize>(), 5);
    }

    #[tokio::test]
    async fn superuser_navigation_lists_every_enabled_page() {
        let svc = service();
        let admin = svc.principal(&UserRecord::new("root").superuser()).await.unwrap();
        let tree = svc.route_tree(&admin).await.unwrap();
        assert_eq!(tree.len(), 1);
        let pages: Vec<&str> = tree[0].children.iter().map(|n| n.item.id.as_str()).collect();
        assert_eq!(pages, vec!["users", "depts"]);
    }

    #[tokio::test]
    async fn maintenance_guards() {
        let svc = service();
        let d1 = DepartmentId::new("D1");

        assert!(matches!(
            svc.ensure_can_reparent(&d1, &DepartmentId::new("D4")).await,
            Err(AccessError::Invalid(_))
        ));
        assert!(svc.ensure_can_reparent(&DepartmentId::new("D4"), &DepartmentId::new("D9")).await.is_ok());

        let err = svc.ensure_can_remove(&d1).await.unwrap_err();
        assert_eq!(err.code(), "invalid_request");
        assert!(svc.ensure_can_remove(&DepartmentId::new("D4")).await.is_ok());
        assert!(matches!(
            svc.ensure_can_remove(&DepartmentId::new("nope")).await,
            Err(AccessError::NotFound { .. })
        ));
    }

    async fn parent_ids(svc: &AccessService<InMemoryDirectory>, principal: &Principal, id: &str) -> Vec<String> {
        let options = ScopeOptions::subdepartments().own_record_fallback();
        svc.selectable_parents(principal, &DepartmentId::new(id), options)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id().to_string())
            .collect()
    }

    #[tokio::test]
    async fn parent_picker_follows_the_data_scope() {
        let svc = service();
        let admin = Principal::superuser("root", None);
        assert_eq!(parent_ids(&svc, &admin, "D3").await, vec!["D1", "D2", "D9"]);

        // Scope is {D2} from the department plus {D9} from the viewer role.
        let user = UserRecord::new("u2").in_department("D2").with_roles(["viewer"]);
        let scoped = svc.principal(&user).await.unwrap();
        assert_eq!(parent_ids(&svc, &scoped, "D3").await, vec!["D2", "D9"]);

        // A top-level department can only stay at the top.
        assert_eq!(parent_ids(&svc, &scoped, "D1").await, vec!["0"]);
    }
}
