/* src/server/core/rust/src/media.rs */

use serde::{Deserialize, Serialize};

use crate::access::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
  pub id: String,
  pub alt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tenant: Option<String>,
}

/// Before validation: an upload without a tenant is assigned to the uploader's first tenant.
pub fn assign_default_tenant(media: &mut Media, principal: Option<&Principal>) {
  if media.tenant.as_deref().is_some_and(|t| !t.is_empty()) {
    return;
  }
  if let Some(first) = principal.and_then(|p| p.tenant_ids().into_iter().next()) {
    media.tenant = Some(first);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn upload(tenant: Option<&str>) -> Media {
    Media { id: "m1".into(), alt: "logo".into(), tenant: tenant.map(String::from) }
  }

  #[test]
  fn assigns_first_tenant_when_missing() {
    let user = Principal::from_doc(json!({
      "id": "u1",
      "tenants": [{"tenant": "t2"}, {"tenant": "t1", "roles": ["tenant-admin"]}]
    }))
    .unwrap();
    let mut media = upload(None);
    assign_default_tenant(&mut media, Some(&user));
    assert_eq!(media.tenant.as_deref(), Some("t2"));
  }

  #[test]
  fn keeps_explicit_tenant() {
    let user = Principal::from_doc(json!({"id": "u1", "tenants": [{"tenant": "t2"}]})).unwrap();
    let mut media = upload(Some("t1"));
    assign_default_tenant(&mut media, Some(&user));
    assert_eq!(media.tenant.as_deref(), Some("t1"));
  }

  #[test]
  fn anonymous_upload_stays_unassigned() {
    let mut media = upload(None);
    assign_default_tenant(&mut media, None);
    assert_eq!(media.tenant, None);
  }
}
