/* src/server/core/rust/src/access.rs */

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Collection, StoreError, Where};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalRole {
  SuperAdmin,
  User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantRoleKind {
  #[serde(rename = "tenant-admin")]
  Admin,
  #[serde(rename = "tenant-viewer")]
  Viewer,
}

/// A tenant relation is stored either as a bare id or as the populated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TenantRef {
  Id(String),
  Doc { id: String },
}

impl TenantRef {
  pub fn id(&self) -> &str {
    match self {
      Self::Id(id) | Self::Doc { id } => id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRow {
  pub tenant: TenantRef,
  #[serde(default = "default_row_roles")]
  pub roles: Vec<TenantRoleKind>,
}

fn default_row_roles() -> Vec<TenantRoleKind> {
  vec![TenantRoleKind::Viewer]
}

fn default_global_roles() -> Vec<GlobalRole> {
  vec![GlobalRole::User]
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub id: String,
  #[serde(default)]
  pub email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
  #[serde(default = "default_global_roles")]
  pub roles: Vec<GlobalRole>,
  #[serde(default)]
  pub tenants: Vec<TenantRow>,
}

impl Principal {
  pub fn from_doc(doc: Value) -> Result<Self, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Decode(format!("user: {e}")))
  }

  pub fn capabilities(&self) -> Vec<Capability> {
    let mut caps = Vec::new();
    if self.roles.contains(&GlobalRole::SuperAdmin) {
      caps.push(Capability::SuperAdmin);
    }
    for row in &self.tenants {
      for role in &row.roles {
        caps.push(Capability::TenantRole { tenant_id: row.tenant.id().to_string(), role: *role });
      }
    }
    caps
  }

  pub fn is_super_admin(&self) -> bool {
    self.capabilities().contains(&Capability::SuperAdmin)
  }

  /// Tenant ids the principal belongs to, in row order, any role.
  pub fn tenant_ids(&self) -> Vec<String> {
    self
      .tenants
      .iter()
      .map(|row| row.tenant.id())
      .filter(|id| !id.is_empty())
      .map(str::to_string)
      .collect()
  }

  /// Tenant ids where the principal holds `role`.
  pub fn tenant_ids_with(&self, role: TenantRoleKind) -> Vec<String> {
    let mut ids = Vec::new();
    for cap in self.capabilities() {
      if let Capability::TenantRole { tenant_id, role: held } = cap {
        if held == role && !ids.contains(&tenant_id) {
          ids.push(tenant_id);
        }
      }
    }
    ids
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
  SuperAdmin,
  TenantRole { tenant_id: String, role: TenantRoleKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  Create,
  Read,
  Update,
  Delete,
}

/// Row restriction attached to a partial grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  IdIn(Vec<String>),
  TenantIn(Vec<String>),
  IdEquals(String),
}

impl Filter {
  pub fn to_where(&self) -> Where {
    match self {
      Self::IdIn(ids) => Where::is_in("id", ids.iter().map(String::as_str)),
      Self::TenantIn(ids) => Where::is_in("tenant", ids.iter().map(String::as_str)),
      Self::IdEquals(id) => Where::equals("id", id.as_str()),
    }
  }

  /// The filter as the CMS where clause, e.g. `{"id":{"in":["t1"]}}`.
  pub fn to_json(&self) -> Value {
    match self {
      Self::IdIn(ids) => serde_json::json!({ "id": { "in": ids } }),
      Self::TenantIn(ids) => serde_json::json!({ "tenant": { "in": ids } }),
      Self::IdEquals(id) => serde_json::json!({ "id": { "equals": id } }),
    }
  }

  pub fn permits(&self, row_id: &str, row_tenant: Option<&str>) -> bool {
    match self {
      Self::IdIn(ids) => ids.iter().any(|id| id == row_id),
      Self::TenantIn(ids) => row_tenant.is_some_and(|t| ids.iter().any(|id| id == t)),
      Self::IdEquals(id) => id == row_id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
  Allow,
  AllowFiltered(Filter),
  Deny,
}

impl AccessResult {
  fn from_bool(granted: bool) -> Self {
    if granted { Self::Allow } else { Self::Deny }
  }

  pub fn is_denied(&self) -> bool {
    matches!(self, Self::Deny)
  }

  pub fn permits(&self, row_id: &str, row_tenant: Option<&str>) -> bool {
    match self {
      Self::Allow => true,
      Self::AllowFiltered(filter) => filter.permits(row_id, row_tenant),
      Self::Deny => false,
    }
  }
}

/// Super-admin gets everything; otherwise the tenants where the caller is
/// `tenant-admin`, shaped by `wrap`; otherwise nothing.
fn admin_scoped(principal: Option<&Principal>, wrap: fn(Vec<String>) -> Filter) -> AccessResult {
  let Some(principal) = principal else {
    return AccessResult::Deny;
  };
  if principal.is_super_admin() {
    return AccessResult::Allow;
  }
  let ids = principal.tenant_ids_with(TenantRoleKind::Admin);
  if ids.is_empty() { AccessResult::Deny } else { AccessResult::AllowFiltered(wrap(ids)) }
}

fn member_scoped(principal: Option<&Principal>) -> AccessResult {
  let Some(principal) = principal else {
    return AccessResult::Deny;
  };
  if principal.is_super_admin() {
    return AccessResult::Allow;
  }
  let ids = principal.tenant_ids();
  if ids.is_empty() { AccessResult::Deny } else { AccessResult::AllowFiltered(Filter::TenantIn(ids)) }
}

fn self_scoped(principal: Option<&Principal>) -> AccessResult {
  match principal {
    Some(p) if p.is_super_admin() => AccessResult::Allow,
    Some(p) => AccessResult::AllowFiltered(Filter::IdEquals(p.id.clone())),
    None => AccessResult::Deny,
  }
}

pub fn evaluate(
  collection: Collection,
  operation: Operation,
  principal: Option<&Principal>,
) -> AccessResult {
  use Operation::{Create, Delete, Read, Update};

  match (collection, operation) {
    (Collection::Tenants, Create) => {
      AccessResult::from_bool(principal.is_some_and(Principal::is_super_admin))
    }
    (Collection::Tenants, Read) => AccessResult::from_bool(principal.is_some()),
    (Collection::Tenants, Update | Delete) => admin_scoped(principal, Filter::IdIn),

    (Collection::Pages, Read) => AccessResult::Allow,
    (Collection::Pages, Create | Update | Delete) => admin_scoped(principal, Filter::TenantIn),

    (Collection::Media, Create) => AccessResult::from_bool(principal.is_some()),
    (Collection::Media, Read | Update | Delete) => member_scoped(principal),

    // First user may self-register; afterwards only super-admins create users
    (Collection::Users, Create) => {
      AccessResult::from_bool(principal.is_none_or(Principal::is_super_admin))
    }
    (Collection::Users, Read | Update | Delete) => self_scoped(principal),
  }
}

/// Only super-admins may change a user's global roles.
pub fn can_update_user_roles(principal: Option<&Principal>) -> bool {
  principal.is_some_and(Principal::is_super_admin)
}
