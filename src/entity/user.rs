use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub tg_user_id: i64,
  pub username: Option<String>,
  pub is_premium: bool,
  /// `None` together with `is_premium` means premium never expires
  pub premium_expires: Option<DateTime>,
  pub is_blocked: bool,
  pub reg_date: DateTime,
}

impl Model {
  /// Premium flag set and expiry (if any) strictly after `now`.
  pub fn is_premium_at(&self, now: DateTime) -> bool {
    self.is_premium && self.premium_expires.is_none_or(|exp| exp > now)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::license_key::Entity")]
  LicenseKeys,
}

impl Related<super::license_key::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::LicenseKeys.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
