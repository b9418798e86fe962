//! Organizational units.

use serde::{Deserialize, Serialize};

use backoffice_core::{DepartmentId, DomainError, DomainResult, Entity, Hierarchical, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    /// Parent unit, or the root sentinel `"0"` for top-level units.
    pub parent_id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub status: Status,
}

impl Department {
    pub fn new(
        id: impl Into<DepartmentId>,
        parent_id: impl Into<DepartmentId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
            order: 0,
            status: Status::Enabled,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_root()
    }
}

impl Entity for Department {
    type Id = DepartmentId;

    fn id(&self) -> &DepartmentId {
        &self.id
    }
}

impl Hierarchical for Department {
    fn parent_id(&self) -> &DepartmentId {
        &self.parent_id
    }

    fn order(&self) -> i32 {
        self.order
    }
}

/// A unit can only be removed once it has no children left.
pub fn validate_removal(id: &DepartmentId, children: &[Department]) -> DomainResult<()> {
    if children.is_empty() {
        Ok(())
    } else {
        Err(DomainError::conflict(format!(
            "department {id} still has {} sub-department(s)",
            children.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_requires_no_children() {
        let id = DepartmentId::new("D1");
        assert!(validate_removal(&id, &[]).is_ok());

        let child = Department::new("D2", "D1", "Sales");
        let err = validate_removal(&id, &[child]).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(msg) if msg.contains("D1")));
    }

    #[test]
    fn top_level_units_hang_off_the_sentinel() {
        assert!(Department::new("D1", "0", "HQ").is_top_level());
        assert!(!Department::new("D2", "D1", "Sales").is_top_level());
    }
}
