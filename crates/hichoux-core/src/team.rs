//! Back-office team members and key/value store settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  /// A key into the configured role table.
  pub role:       String,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeamMember {
  pub name:  String,
  pub email: String,
  pub role:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
  pub key:        String,
  pub value:      serde_json::Value,
  pub updated_at: DateTime<Utc>,
}
