use sea_orm_migration::prelude::*;

use super::m20261017_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(LicenseKeys::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LicenseKeys::Token)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(LicenseKeys::Duration).string().not_null())
          .col(
            ColumnDef::new(LicenseKeys::Status)
              .string()
              .not_null()
              .default("ACTIVE"),
          )
          .col(ColumnDef::new(LicenseKeys::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(LicenseKeys::ExpiresAt).date_time().null())
          .col(ColumnDef::new(LicenseKeys::RedeemedBy).big_integer().null())
          .col(ColumnDef::new(LicenseKeys::RedeemedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_license_keys_redeemer")
              .from(LicenseKeys::Table, LicenseKeys::RedeemedBy)
              .to(Users::Table, Users::TgUserId)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(LicenseKeys::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum LicenseKeys {
  Table,
  Token,
  Duration,
  Status,
  CreatedAt,
  ExpiresAt,
  RedeemedBy,
  RedeemedAt,
}
