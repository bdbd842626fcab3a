//! Team members and key/value settings.

use chrono::Utc;
use hichoux_core::{
  store::{ChangeKind, Resource, SettingsRepository, TeamRepository},
  team::{NewTeamMember, Setting, TeamMember},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawTeamMember, TEAM_COLUMNS, decode_dt, decode_setting, encode_dt, encode_uuid},
};

impl TeamRepository for SqliteStore {
  async fn add_team_member(&self, input: NewTeamMember) -> Result<TeamMember> {
    let now = encode_dt(Utc::now());
    let member = TeamMember {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      role:       input.role,
      is_active:  true,
      created_at: decode_dt(&now)?,
    };

    let id_str = encode_uuid(member.id);
    let (name, email, role) = (member.name.clone(), member.email.clone(), member.role.clone());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO team_members (id, name, email, role, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![id_str, name, email, role, now],
        )?;
        Ok(())
      })
      .await?;

    self.notify(Resource::TeamMembers, ChangeKind::Insert, encode_uuid(member.id));
    Ok(member)
  }

  async fn list_team(&self) -> Result<Vec<TeamMember>> {
    let raws: Vec<RawTeamMember> = self
      .conn
      .call(|conn| {
        let sql = format!("SELECT {TEAM_COLUMNS} FROM team_members ORDER BY name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawTeamMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawTeamMember::into_member).collect()
  }
}

impl SettingsRepository for SqliteStore {
  async fn list_settings(&self) -> Result<Vec<Setting>> {
    let rows: Vec<(String, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key, value, updated_at FROM settings ORDER BY key")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows.into_iter().map(decode_setting).collect()
  }

  async fn setting(&self, key: &str) -> Result<Option<Setting>> {
    let key = key.to_owned();
    let row: Option<(String, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT key, value, updated_at FROM settings WHERE key = ?1",
            [&key],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?)
      })
      .await?;
    row.map(decode_setting).transpose()
  }

  async fn put_setting(&self, key: String, value: serde_json::Value) -> Result<Setting> {
    let now = encode_dt(Utc::now());
    let setting = Setting { key, value, updated_at: decode_dt(&now)? };

    let key = setting.key.clone();
    let value = serde_json::to_string(&setting.value)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
          rusqlite::params![key, value, now],
        )?;
        Ok(())
      })
      .await?;

    self.notify(Resource::Settings, ChangeKind::Update, setting.key.clone());
    Ok(setting)
  }
}
