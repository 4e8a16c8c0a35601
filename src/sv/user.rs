use sea_orm::sea_query::{Expr, OnConflict};

use crate::{entity::user, prelude::*};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Inserts the user on first sight, otherwise refreshes the handle.
  pub async fn upsert(
    &self,
    tg_user_id: i64,
    username: Option<&str>,
  ) -> Result<()> {
    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      tg_user_id: Set(tg_user_id),
      username: Set(username.map(String::from)),
      is_premium: Set(false),
      premium_expires: Set(None),
      is_blocked: Set(false),
      reg_date: Set(now),
    };

    user::Entity::insert(user)
      .on_conflict(
        OnConflict::column(user::Column::TgUserId)
          .update_column(user::Column::Username)
          .to_owned(),
      )
      .exec_without_returning(self.db)
      .await?;

    Ok(())
  }

  pub async fn by_id(&self, tg_user_id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(tg_user_id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .order_by_asc(user::Column::RegDate)
      .all(self.db)
      .await?;
    Ok(users)
  }

  pub async fn ids(&self) -> Result<Vec<i64>> {
    let ids = user::Entity::find()
      .select_only()
      .column(user::Column::TgUserId)
      .order_by_asc(user::Column::RegDate)
      .into_tuple::<i64>()
      .all(self.db)
      .await?;
    Ok(ids)
  }

  pub async fn set_blocked(&self, tg_user_id: i64, blocked: bool) -> Result<()> {
    let res = user::Entity::update_many()
      .col_expr(user::Column::IsBlocked, Expr::value(blocked))
      .filter(user::Column::TgUserId.eq(tg_user_id))
      .exec(self.db)
      .await?;

    if res.rows_affected == 0 {
      return Err(Error::UserNotFound);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::setup_test_db;

  #[tokio::test]
  async fn test_upsert_is_idempotent() {
    let db = setup_test_db().await;
    let sv = User::new(&db);

    sv.upsert(10, Some("alice")).await.unwrap();
    sv.upsert(10, Some("alice_renamed")).await.unwrap();
    sv.upsert(11, None).await.unwrap();

    assert_eq!(sv.all().await.unwrap().len(), 2);
    let user = sv.by_id(10).await.unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("alice_renamed"));
    assert!(!user.is_premium);
    assert!(!user.is_blocked);
  }

  #[tokio::test]
  async fn test_upsert_keeps_premium_state() {
    let db = setup_test_db().await;
    let sv = User::new(&db);

    sv.upsert(10, None).await.unwrap();
    let user = sv.by_id(10).await.unwrap().unwrap();
    user::ActiveModel { is_premium: Set(true), ..user.into() }
      .update(&db)
      .await
      .unwrap();

    sv.upsert(10, Some("bob")).await.unwrap();
    assert!(sv.by_id(10).await.unwrap().unwrap().is_premium);
  }

  #[tokio::test]
  async fn test_ids_lists_everyone() {
    let db = setup_test_db().await;
    let sv = User::new(&db);

    for id in [3, 1, 2] {
      sv.upsert(id, None).await.unwrap();
    }

    let mut ids = sv.ids().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn test_block_unknown_user() {
    let db = setup_test_db().await;
    let sv = User::new(&db);

    assert!(matches!(sv.set_blocked(99, true).await, Err(Error::UserNotFound)));

    sv.upsert(99, None).await.unwrap();
    sv.set_blocked(99, true).await.unwrap();
    assert!(sv.by_id(99).await.unwrap().unwrap().is_blocked);
  }
}
