use chrono::TimeDelta;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DurationClass {
  #[sea_orm(string_value = "1MIN")]
  Minute,
  #[sea_orm(string_value = "1HOUR")]
  Hour,
  #[sea_orm(string_value = "1MONTH")]
  Month,
  #[sea_orm(string_value = "2MONTH")]
  TwoMonths,
  #[sea_orm(string_value = "1YEAR")]
  Year,
  #[sea_orm(string_value = "PERMANENT")]
  Permanent,
}

impl DurationClass {
  /// Validity span, `None` for permanent keys.
  pub fn span(self) -> Option<TimeDelta> {
    match self {
      Self::Minute => Some(TimeDelta::minutes(1)),
      Self::Hour => Some(TimeDelta::hours(1)),
      Self::Month => Some(TimeDelta::days(30)),
      Self::TwoMonths => Some(TimeDelta::days(60)),
      Self::Year => Some(TimeDelta::days(365)),
      Self::Permanent => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Minute => "1 minute",
      Self::Hour => "1 hour",
      Self::Month => "1 month",
      Self::TwoMonths => "2 months",
      Self::Year => "1 year",
      Self::Permanent => "permanent",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum KeyStatus {
  #[sea_orm(string_value = "ACTIVE")]
  Active,
  #[sea_orm(string_value = "USED")]
  Used,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "license_keys")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub token: String,
  pub duration: DurationClass,
  pub status: KeyStatus,
  pub created_at: DateTime,
  /// Fixed at creation, copied onto the redeemer untouched
  pub expires_at: Option<DateTime>,
  pub redeemed_by: Option<i64>,
  pub redeemed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::RedeemedBy",
    to = "super::user::Column::TgUserId"
  )]
  User,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
