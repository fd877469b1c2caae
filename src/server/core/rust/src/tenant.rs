/* src/server/core/rust/src/tenant.rs */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreError;

/// A tenant (campaign) document as stored by the CMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub slug: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub domain: Option<String>,
  #[serde(default)]
  pub allow_public_read: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub campaign_settings: Option<CampaignSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub game_settings: Option<GameSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registration_settings: Option<RegistrationSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeline_settings: Option<TimelineSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub analytics_settings: Option<AnalyticsSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location_settings: Option<LocationSettings>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data_settings: Option<DataSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSettings {
  pub campaign_id: Option<String>,
  pub market: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
  pub game_key: Option<String>,
  pub languages: Option<Vec<LanguageRow>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRow {
  pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSettings {
  pub external_registration: Option<bool>,
  pub enable_qr_redeem: Option<bool>,
  pub enable_code_claim: Option<bool>,
  pub code_claim_fields: Option<Vec<CodeClaimField>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimFieldType {
  Text,
  Email,
  Number,
  Date,
  Select,
  Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeClaimField {
  pub field_name: String,
  pub field_type: ClaimFieldType,
  #[serde(default)]
  pub required: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSettings {
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub country_timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSettings {
  pub looker_studio_connector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSettings {
  pub country_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSettings {
  pub collection_id: Option<String>,
  pub purpose_ids: Option<Vec<Purpose>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purpose {
  pub purpose_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub required: bool,
}

/// Flattened, defaulted view over a tenant's nested settings groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
  pub campaign_id: Option<String>,
  pub market: Option<String>,
  pub game_key: Option<String>,
  pub languages: Vec<String>,
  pub external_registration: bool,
  pub enable_qr_redeem: bool,
  pub enable_code_claim: bool,
  pub code_claim_fields: Vec<CodeClaimField>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub country_timezone: Option<String>,
  pub looker_studio_connector: Option<String>,
  pub country_code: Option<String>,
  pub collection_id: Option<String>,
  pub purpose_ids: Vec<Purpose>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignInfo {
  pub campaign_id: Option<String>,
  pub market: Option<String>,
  pub game_key: Option<String>,
}

fn filled(s: Option<&String>) -> Option<String> {
  s.filter(|s| !s.is_empty()).cloned()
}

impl Tenant {
  pub fn from_doc(doc: Value) -> Result<Self, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Decode(format!("tenant: {e}")))
  }

  pub fn settings(&self) -> TenantSettings {
    let campaign = self.campaign_settings.as_ref();
    let game = self.game_settings.as_ref();
    let registration = self.registration_settings.as_ref();
    let timeline = self.timeline_settings.as_ref();
    let data = self.data_settings.as_ref();

    TenantSettings {
      campaign_id: filled(campaign.and_then(|c| c.campaign_id.as_ref())),
      market: filled(campaign.and_then(|c| c.market.as_ref())),
      game_key: filled(game.and_then(|g| g.game_key.as_ref())),
      languages: self.languages(),
      external_registration: registration.and_then(|r| r.external_registration).unwrap_or(false),
      enable_qr_redeem: registration.and_then(|r| r.enable_qr_redeem).unwrap_or(false),
      enable_code_claim: registration.and_then(|r| r.enable_code_claim).unwrap_or(false),
      code_claim_fields: registration
        .and_then(|r| r.code_claim_fields.clone())
        .unwrap_or_default(),
      start_date: filled(timeline.and_then(|t| t.start_date.as_ref())),
      end_date: filled(timeline.and_then(|t| t.end_date.as_ref())),
      country_timezone: filled(timeline.and_then(|t| t.country_timezone.as_ref())),
      looker_studio_connector: filled(
        self.analytics_settings.as_ref().and_then(|a| a.looker_studio_connector.as_ref()),
      ),
      country_code: filled(self.location_settings.as_ref().and_then(|l| l.country_code.as_ref())),
      collection_id: filled(data.and_then(|d| d.collection_id.as_ref())),
      purpose_ids: data.and_then(|d| d.purpose_ids.clone()).unwrap_or_default(),
    }
  }

  /// Configured language codes in priority order. May be empty.
  pub fn languages(&self) -> Vec<String> {
    self
      .game_settings
      .as_ref()
      .and_then(|g| g.languages.as_ref())
      .map(|rows| rows.iter().map(|r| r.language.clone()).collect())
      .unwrap_or_default()
  }

  pub fn primary_language(&self) -> Option<String> {
    self.languages().into_iter().next()
  }

  pub fn supports_language(&self, language: &str) -> bool {
    self.languages().iter().any(|l| l == language)
  }

  /// Inclusive start/end window. Dates that fail to parse do not restrict.
  pub fn is_campaign_active(&self, now: DateTime<Utc>) -> bool {
    let timeline = self.timeline_settings.as_ref();
    if let Some(start) = timeline.and_then(|t| t.start_date.as_deref()).and_then(parse_date) {
      if now < start {
        return false;
      }
    }
    if let Some(end) = timeline.and_then(|t| t.end_date.as_deref()).and_then(parse_date) {
      if now > end {
        return false;
      }
    }
    true
  }

  pub fn purpose_ids(&self, required_only: bool) -> Vec<Purpose> {
    let all = self.settings().purpose_ids;
    if required_only { all.into_iter().filter(|p| p.required).collect() } else { all }
  }

  /// Blank ids read as unset, like every other flattened setting.
  pub fn campaign_info(&self) -> CampaignInfo {
    let TenantSettings { campaign_id, market, game_key, .. } = self.settings();
    CampaignInfo { campaign_id, market, game_key }
  }

  pub fn qr_redeem_enabled(&self) -> bool {
    self.settings().enable_qr_redeem
  }

  pub fn code_claim_enabled(&self) -> bool {
    self.settings().enable_code_claim
  }

  pub fn external_registration_enabled(&self) -> bool {
    self.settings().external_registration
  }

  pub fn code_claim_fields(&self) -> Vec<CodeClaimField> {
    self.settings().code_claim_fields
  }

  /// Fill the settings a freshly created campaign must have. Returns whether
  /// anything changed.
  pub fn apply_campaign_defaults(&mut self, now: DateTime<Utc>) -> bool {
    let mut changed = false;

    let campaign = self.campaign_settings.get_or_insert_with(Default::default);
    if campaign.campaign_id.as_deref().is_none_or(str::is_empty) {
      campaign.campaign_id = Some(format!("campaign_{}_{}", self.slug, now.timestamp_millis()));
      changed = true;
    }

    let game = self.game_settings.get_or_insert_with(Default::default);
    if game.languages.as_ref().is_none_or(Vec::is_empty) {
      game.languages = Some(vec![LanguageRow { language: "en".to_string() }]);
      changed = true;
    }

    let location = self.location_settings.get_or_insert_with(Default::default);
    if location.country_code.as_deref().is_none_or(str::is_empty) {
      location.country_code = Some("US".to_string());
      changed = true;
    }

    let timeline = self.timeline_settings.get_or_insert_with(Default::default);
    if timeline.country_timezone.as_deref().is_none_or(str::is_empty) {
      timeline.country_timezone = Some("UTC".to_string());
      changed = true;
    }

    changed
  }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}
