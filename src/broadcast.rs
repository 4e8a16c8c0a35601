//! Administrator fan-out to every known user.

use crate::{prelude::*, transport::Transport};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
  pub sent: usize,
  pub failed: usize,
}

/// Sends `text` to every stored user. A failed or stalled delivery is
/// logged and skipped, the rest still go out.
pub async fn send_text_to_all(
  db: &DatabaseConnection,
  transport: &dyn Transport,
  text: &str,
  per_send: Duration,
) -> Result<Delivery> {
  let delivery =
    fan_out(db, per_send, |id| transport.send_text(id, text)).await?;
  info!(sent = delivery.sent, failed = delivery.failed, "Text broadcast done");
  Ok(delivery)
}

pub async fn send_photo_to_all(
  db: &DatabaseConnection,
  transport: &dyn Transport,
  photo: &str,
  caption: Option<&str>,
  per_send: Duration,
) -> Result<Delivery> {
  let delivery =
    fan_out(db, per_send, |id| transport.send_photo(id, photo, caption))
      .await?;
  info!(sent = delivery.sent, failed = delivery.failed, "Photo broadcast done");
  Ok(delivery)
}

/// Each recipient gets its own `per_send` budget, so one slow chat never
/// cuts the batch short.
async fn fan_out<F, Fut>(
  db: &DatabaseConnection,
  per_send: Duration,
  mut send: F,
) -> Result<Delivery>
where
  F: FnMut(i64) -> Fut,
  Fut: Future<Output = Result<()>>,
{
  let ids = crate::sv::User::new(db).ids().await?;
  let mut delivery = Delivery::default();

  for id in ids {
    match time::timeout(per_send, send(id)).await {
      Ok(Ok(())) => delivery.sent += 1,
      Ok(Err(err)) => {
        warn!(user = id, "Broadcast delivery failed: {err}");
        delivery.failed += 1;
      }
      Err(_) => {
        warn!(user = id, "Broadcast delivery timed out");
        delivery.failed += 1;
      }
    }
  }

  Ok(delivery)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    sv,
    testing::{MockTransport, Sent, setup_test_db},
  };

  const SEND: Duration = Duration::from_secs(5);

  #[tokio::test]
  async fn test_failed_recipient_does_not_abort_batch() {
    let db = setup_test_db().await;
    for id in [100, 200, 300] {
      sv::User::new(&db).upsert(id, None).await.unwrap();
    }

    let transport = MockTransport::new();
    transport.fail_for(200);

    let delivery = send_text_to_all(&db, &transport, "hello", SEND).await.unwrap();
    assert_eq!(delivery, Delivery { sent: 2, failed: 1 });

    let mut chats: Vec<_> = transport.take().iter().map(Sent::chat).collect();
    chats.sort();
    assert_eq!(chats, vec![100, 300]);
  }

  #[tokio::test]
  async fn test_photo_goes_to_everyone_with_caption() {
    let db = setup_test_db().await;
    for id in [1, 2] {
      sv::User::new(&db).upsert(id, None).await.unwrap();
    }

    let transport = MockTransport::new();
    let delivery =
      send_photo_to_all(&db, &transport, "photo-id", Some("news"), SEND)
        .await
        .unwrap();
    assert_eq!(delivery, Delivery { sent: 2, failed: 0 });

    for sent in transport.take() {
      assert!(matches!(
        sent,
        Sent::Photo { ref photo, caption: Some(ref c), .. }
          if photo == "photo-id" && c == "news"
      ));
    }
  }

  #[tokio::test]
  async fn test_no_users_no_deliveries() {
    let db = setup_test_db().await;
    let transport = MockTransport::new();

    let delivery = send_text_to_all(&db, &transport, "hi", SEND).await.unwrap();
    assert_eq!(delivery, Delivery::default());
    assert!(transport.take().is_empty());
  }

  #[tokio::test]
  async fn test_stalled_recipient_times_out_alone() {
    let db = setup_test_db().await;
    for id in [1, 2, 3] {
      sv::User::new(&db).upsert(id, None).await.unwrap();
    }

    let transport = MockTransport::new();
    transport.stall_for(2);

    let per_send = Duration::from_millis(50);
    let delivery =
      send_text_to_all(&db, &transport, "hello", per_send).await.unwrap();
    assert_eq!(delivery, Delivery { sent: 2, failed: 1 });

    let mut chats: Vec<_> = transport.take().iter().map(Sent::chat).collect();
    chats.sort();
    assert_eq!(chats, vec![1, 3]);
  }
}
