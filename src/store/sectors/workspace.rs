//! Workspace sector: workspaces in creation order

use crate::models::{Workspace, WorkspaceId};
use crate::store::RootState;
use crate::{StoreError, StoreResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSector {
    workspaces: BTreeMap<WorkspaceId, Workspace>,
    order: Vec<WorkspaceId>,
}

impl WorkspaceSector {
    pub fn get(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    pub fn contains(&self, id: WorkspaceId) -> bool {
        self.workspaces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Workspaces in the order they were created
    pub fn iter(&self) -> impl Iterator<Item = &Workspace> {
        self.order.iter().filter_map(|id| self.workspaces.get(id))
    }

    pub fn ids(&self) -> &[WorkspaceId] {
        &self.order
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Workspace> {
        self.iter().find(|workspace| workspace.name == name)
    }

    pub(crate) fn get_mut(&mut self, id: WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, workspace: Workspace) {
        if !self.workspaces.contains_key(&workspace.id) {
            self.order.push(workspace.id);
        }
        self.workspaces.insert(workspace.id, workspace);
    }

    pub(crate) fn remove(&mut self, id: WorkspaceId) -> Option<Workspace> {
        self.order.retain(|candidate| *candidate != id);
        self.workspaces.remove(&id)
    }
}

pub fn pick_workspace(id: WorkspaceId) -> impl Fn(&RootState) -> StoreResult<Workspace> {
    move |root: &RootState| {
        root.workspaces()
            .get(id)
            .cloned()
            .ok_or(StoreError::WorkspaceNotFound(id))
    }
}

pub fn pick_workspace_by_name(name: impl Into<String>) -> impl Fn(&RootState) -> StoreResult<Option<Workspace>> {
    let name = name.into();
    move |root: &RootState| Ok(root.workspaces().find_by_name(&name).cloned())
}

pub fn pick_all_workspaces() -> impl Fn(&RootState) -> StoreResult<Vec<Workspace>> {
    |root: &RootState| Ok(root.workspaces().iter().cloned().collect())
}
