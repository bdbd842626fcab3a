//! Customer records, keyed by phone number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::CustomerForm;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
  pub id:         Uuid,
  pub phone:      String,
  pub name:       String,
  pub email:      Option<String>,
  pub address:    String,
  pub city:       String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Fields written by an upsert. A second upsert with the same phone
/// overwrites every field; the id and `created_at` are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpsert {
  pub phone:   String,
  pub name:    String,
  pub email:   Option<String>,
  pub address: String,
  pub city:    String,
}

impl From<&CustomerForm> for CustomerUpsert {
  fn from(form: &CustomerForm) -> Self {
    Self {
      phone:   form.phone.clone(),
      name:    form.name.clone(),
      email:   form.email.clone(),
      address: form.address.clone(),
      city:    form.city.clone(),
    }
  }
}
