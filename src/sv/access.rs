//! Access gate: blocked and premium checks plus the expiry sweep.

use sea_orm::sea_query::Expr;

use crate::{entity::user, prelude::*};

pub struct Access<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Access<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn is_blocked(&self, tg_user_id: i64) -> Result<bool> {
    let user = user::Entity::find_by_id(tg_user_id).one(self.db).await?;
    Ok(user.is_some_and(|u| u.is_blocked))
  }

  /// Compares the stored expiry with the clock, never writes.
  pub async fn is_premium(&self, tg_user_id: i64) -> Result<bool> {
    let now = Utc::now().naive_utc();
    let user = user::Entity::find_by_id(tg_user_id).one(self.db).await?;
    Ok(user.is_some_and(|u| u.is_premium_at(now)))
  }

  /// Clears the premium flag of every user whose expiry has passed.
  pub async fn sweep_expired(&self) -> Result<u64> {
    let now = Utc::now().naive_utc();
    let res = user::Entity::update_many()
      .col_expr(user::Column::IsPremium, Expr::value(false))
      .filter(user::Column::IsPremium.eq(true))
      .filter(user::Column::PremiumExpires.is_not_null())
      .filter(user::Column::PremiumExpires.lt(now))
      .exec(self.db)
      .await?;
    Ok(res.rows_affected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{sv, testing::setup_test_db};

  async fn premium_user(
    db: &DatabaseConnection,
    id: i64,
    expires: Option<DateTime>,
  ) {
    sv::User::new(db).upsert(id, None).await.unwrap();
    user::ActiveModel {
      tg_user_id: Set(id),
      is_premium: Set(true),
      premium_expires: Set(expires),
      ..Default::default()
    }
    .update(db)
    .await
    .unwrap();
  }

  #[tokio::test]
  async fn test_unknown_user_has_no_access() {
    let db = setup_test_db().await;
    let access = Access::new(&db);

    assert!(!access.is_premium(42).await.unwrap());
    assert!(!access.is_blocked(42).await.unwrap());
  }

  #[tokio::test]
  async fn test_premium_expiry_is_checked_without_sweep() {
    let db = setup_test_db().await;
    let access = Access::new(&db);
    let now = Utc::now().naive_utc();

    premium_user(&db, 1, None).await;
    premium_user(&db, 2, Some(now + TimeDelta::hours(1))).await;
    premium_user(&db, 3, Some(now - TimeDelta::seconds(1))).await;

    assert!(access.is_premium(1).await.unwrap());
    assert!(access.is_premium(2).await.unwrap());
    assert!(!access.is_premium(3).await.unwrap());

    // flag untouched until the sweep runs
    let user = sv::User::new(&db).by_id(3).await.unwrap().unwrap();
    assert!(user.is_premium);
  }

  #[tokio::test]
  async fn test_sweep_clears_only_expired() {
    let db = setup_test_db().await;
    let access = Access::new(&db);
    let now = Utc::now().naive_utc();

    premium_user(&db, 1, None).await;
    premium_user(&db, 2, Some(now + TimeDelta::days(1))).await;
    premium_user(&db, 3, Some(now - TimeDelta::minutes(5))).await;

    assert_eq!(access.sweep_expired().await.unwrap(), 1);
    assert_eq!(access.sweep_expired().await.unwrap(), 0);

    let users = sv::User::new(&db);
    assert!(users.by_id(1).await.unwrap().unwrap().is_premium);
    assert!(users.by_id(2).await.unwrap().unwrap().is_premium);
    assert!(!users.by_id(3).await.unwrap().unwrap().is_premium);
  }

  #[tokio::test]
  async fn test_blocked_flag() {
    let db = setup_test_db().await;
    sv::User::new(&db).upsert(5, None).await.unwrap();
    sv::User::new(&db).set_blocked(5, true).await.unwrap();

    assert!(Access::new(&db).is_blocked(5).await.unwrap());
  }
}
