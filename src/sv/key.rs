use sea_orm::{Condition, sea_query::Expr};
use uuid::Uuid;

use crate::{
  entity::{DurationClass, KeyStatus, license_key, user},
  prelude::*,
};

pub struct Key<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Key<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Issues a fresh ACTIVE key. Expiry counts from now, not from redemption.
  pub async fn create(
    &self,
    duration: DurationClass,
  ) -> Result<license_key::Model> {
    let now = Utc::now().naive_utc();
    let token = Uuid::new_v4().simple().to_string();

    let key = license_key::ActiveModel {
      token: Set(token),
      duration: Set(duration),
      status: Set(KeyStatus::Active),
      created_at: Set(now),
      expires_at: Set(duration.span().map(|span| now + span)),
      redeemed_by: Set(None),
      redeemed_at: Set(None),
    };

    Ok(key.insert(self.db).await?)
  }

  pub async fn by_token(&self, token: &str) -> Result<Option<license_key::Model>> {
    Ok(license_key::Entity::find_by_id(token).one(self.db).await?)
  }

  /// Marks the key USED and grants its expiry to the user, all or nothing.
  ///
  /// The claim is a conditional update on `status = ACTIVE`, so of two
  /// concurrent attempts on one token only one can win.
  pub async fn redeem(
    &self,
    token: &str,
    tg_user_id: i64,
  ) -> Result<license_key::Model> {
    let now = Utc::now().naive_utc();
    let txn = self.db.begin().await?;

    let claim = license_key::Entity::update_many()
      .col_expr(license_key::Column::Status, Expr::value(KeyStatus::Used))
      .col_expr(license_key::Column::RedeemedBy, Expr::value(tg_user_id))
      .col_expr(license_key::Column::RedeemedAt, Expr::value(now))
      .filter(license_key::Column::Token.eq(token))
      .filter(license_key::Column::Status.eq(KeyStatus::Active))
      .filter(
        Condition::any()
          .add(license_key::Column::ExpiresAt.is_null())
          .add(license_key::Column::ExpiresAt.gt(now)),
      )
      .exec(&txn)
      .await?;

    if claim.rows_affected != 1 {
      txn.rollback().await?;
      return Err(Error::InvalidKey);
    }

    let Some(key) = license_key::Entity::find_by_id(token).one(&txn).await?
    else {
      txn.rollback().await?;
      return Err(Error::InvalidKey);
    };

    let grant = user::Entity::update_many()
      .col_expr(user::Column::IsPremium, Expr::value(true))
      .col_expr(user::Column::PremiumExpires, Expr::value(key.expires_at))
      .filter(user::Column::TgUserId.eq(tg_user_id))
      .exec(&txn)
      .await?;

    if grant.rows_affected == 0 {
      txn.rollback().await?;
      return Err(Error::UserNotFound);
    }

    txn.commit().await?;
    info!(user = tg_user_id, duration = ?key.duration, "Key redeemed");
    Ok(key)
  }
}
