use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

pub fn format_duration(duration: TimeDelta) -> String {
  format!(
    "{}d {}h {}m",
    duration.num_days(),
    duration.num_hours() % 24,
    duration.num_minutes() % 60
  )
}

/// Maximum message length for Telegram Bot API (4096 characters).
/// We use a slightly smaller limit to leave room for formatting.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4000;

/// Splits a long message into chunks that fit within Telegram's message limit.
/// Splits at newline boundaries where possible, never inside a character.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
  let max_len =
    if max_len == 0 { TELEGRAM_MAX_MESSAGE_LENGTH } else { max_len };

  if text.chars().count() <= max_len {
    return vec![text.to_string()];
  }

  let mut chunks = Vec::new();
  let mut current = String::new();
  let mut current_len = 0;

  for line in text.lines() {
    let line_len = line.chars().count();

    if current_len > 0 && current_len + line_len + 1 > max_len {
      chunks.push(std::mem::take(&mut current));
      current_len = 0;
    }

    if line_len > max_len {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let chars: Vec<char> = line.chars().collect();
      let mut pieces = chars.chunks(max_len).peekable();
      while let Some(piece) = pieces.next() {
        let piece: String = piece.iter().collect();
        if pieces.peek().is_some() {
          chunks.push(piece);
        } else {
          current_len = piece.chars().count();
          current = piece;
        }
      }
    } else {
      if !current.is_empty() {
        current.push('\n');
        current_len += 1;
      }
      current.push_str(line);
      current_len += line_len;
    }
  }

  if !current.is_empty() {
    chunks.push(current);
  }

  chunks
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_message_is_single_chunk() {
    assert_eq!(chunk_message("hello", 10), vec!["hello"]);
  }

  #[test]
  fn splits_on_line_boundaries() {
    let chunks = chunk_message("aaaa\nbbbb\ncccc", 9);
    assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
  }

  #[test]
  fn long_line_is_cut_on_char_boundaries() {
    let chunks = chunk_message("ééééé", 2);
    assert_eq!(chunks, vec!["éé", "éé", "é"]);
  }

  #[test]
  fn duration_format() {
    let d = TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(4);
    assert_eq!(format_duration(d), "2d 3h 4m");
  }
}
