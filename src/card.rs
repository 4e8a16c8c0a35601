//! Contact-card engine: number extraction, vCard rendering and merging.

use std::{collections::HashSet, path::Path, sync::LazyLock};

use regex::Regex;

/// Runs of seven or more ASCII digits. `\d` would also match other
/// Unicode digit classes.
static NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new("[0-9]{7,}").expect("static regex"));

pub const DEFAULT_FILE_NAME: &str = "Contacts";
pub const DEFAULT_CONTACT_NAME: &str = "Contact";
pub const DEFAULT_LIMIT: usize = 100;
pub const MERGED_FILE_NAME: &str = "merged.vcf";

/// Per-user output formatting. Process memory only, gone on restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
  pub file_name: String,
  pub contact_name: String,
  pub limit: usize,
  pub country_code: String,
}

impl Default for Preferences {
  fn default() -> Self {
    Self {
      file_name: DEFAULT_FILE_NAME.into(),
      contact_name: DEFAULT_CONTACT_NAME.into(),
      limit: DEFAULT_LIMIT,
      country_code: String::new(),
    }
  }
}

impl Preferences {
  pub fn output_name(&self) -> String {
    format!("{}.vcf", self.file_name)
  }
}

/// Every qualifying digit run, in order, duplicates kept.
pub fn extract(text: &str) -> Vec<String> {
  NUMBER.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Digit runs of an existing card document, each number once.
pub fn extract_unique(text: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  NUMBER
    .find_iter(text)
    .map(|m| m.as_str())
    .filter(|n| seen.insert(*n))
    .map(String::from)
    .collect()
}

/// Plain-text upload: every non-blank line is taken verbatim as one number.
pub fn lines(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(String::from)
    .collect()
}

/// Renders up to `prefs.limit` cards, numbering names from `001`.
/// Numbers past the limit are dropped.
pub fn generate<S: AsRef<str>>(numbers: &[S], prefs: &Preferences) -> String {
  let mut out = String::new();
  for (i, number) in numbers.iter().take(prefs.limit).enumerate() {
    out.push_str("BEGIN:VCARD\nVERSION:3.0\n");
    out.push_str(&format!("FN:{}{:03}\n", prefs.contact_name, i + 1));
    out.push_str(&format!(
      "TEL;TYPE=CELL:{}{}\n",
      prefs.country_code,
      number.as_ref()
    ));
    out.push_str("END:VCARD\n");
  }
  out
}

/// Byte concatenation in the given order, nothing else.
pub fn merge<D: AsRef<[u8]>>(documents: &[D]) -> Vec<u8> {
  let len = documents.iter().map(|d| d.as_ref().len()).sum();
  let mut out = Vec::with_capacity(len);
  for doc in documents {
    out.extend_from_slice(doc.as_ref());
  }
  out
}

/// Uploaded document format, decided once from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
  Card,
  LineList,
  Unrecognized,
}

impl UploadKind {
  pub fn of(file_name: Option<&str>) -> Self {
    let ext = file_name
      .map(Path::new)
      .and_then(Path::extension)
      .and_then(|ext| ext.to_str())
      .map(str::to_ascii_lowercase);

    match ext.as_deref() {
      Some("vcf") => Self::Card,
      Some("txt") => Self::LineList,
      _ => Self::Unrecognized,
    }
  }

  /// Numbers carried by a document of this kind.
  pub fn numbers(self, content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    match self {
      Self::Card => extract_unique(&text),
      Self::LineList => lines(&text),
      Self::Unrecognized => Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_in_order() {
    assert_eq!(
      extract("call 5551234567 or 4412345678 thanks"),
      vec!["5551234567", "4412345678"]
    );
  }

  #[test]
  fn extract_keeps_duplicates_and_skips_short_runs() {
    assert_eq!(
      extract("1234567 123456 1234567 x98765432"),
      vec!["1234567", "1234567", "98765432"]
    );
  }

  #[test]
  fn extract_ignores_non_ascii_digits() {
    assert!(extract("١٢٣٤٥٦٧٨").is_empty());
  }

  #[test]
  fn card_extraction_deduplicates() {
    let doc = "BEGIN:VCARD\nVERSION:3.0\nFN:Contact001\nTEL;TYPE=CELL:+15551234567\n\
               END:VCARD\nBEGIN:VCARD\nVERSION:3.0\nFN:Contact002\n\
               TEL;TYPE=CELL:15551234567\nEND:VCARD\n";
    let numbers: HashSet<_> = extract_unique(doc).into_iter().collect();
    assert_eq!(numbers, HashSet::from(["15551234567".to_string()]));
  }

  #[test]
  fn generate_honours_limit_prefix_and_country_code() {
    let prefs = Preferences {
      contact_name: "P".into(),
      limit: 2,
      country_code: "+1".into(),
      ..Default::default()
    };
    let doc = generate(&["1111111", "2222222", "3333333"], &prefs);

    assert_eq!(
      doc,
      "BEGIN:VCARD\nVERSION:3.0\nFN:P001\nTEL;TYPE=CELL:+11111111\nEND:VCARD\n\
       BEGIN:VCARD\nVERSION:3.0\nFN:P002\nTEL;TYPE=CELL:+12222222\nEND:VCARD\n"
    );
    assert!(!doc.contains("3333333"));
  }

  #[test]
  fn generate_passes_numbers_through_untouched() {
    let doc = generate(&["0012345678"], &Preferences::default());
    assert!(doc.contains("FN:Contact001\n"));
    assert!(doc.contains("TEL;TYPE=CELL:0012345678\n"));
  }

  #[test]
  fn merge_concatenates_in_order() {
    let prefs = Preferences::default();
    let a = generate(&["1111111"], &prefs);
    let b = generate(&["2222222"], &prefs);

    let merged = merge(&[a.as_bytes(), b.as_bytes()]);
    assert_eq!(merged, [a.as_bytes(), b.as_bytes()].concat());
    assert_eq!(String::from_utf8(merged).unwrap().matches("BEGIN:VCARD").count(), 2);
  }

  #[test]
  fn upload_kind_by_extension() {
    assert_eq!(UploadKind::of(Some("list.VCF")), UploadKind::Card);
    assert_eq!(UploadKind::of(Some("numbers.txt")), UploadKind::LineList);
    assert_eq!(UploadKind::of(Some("sheet.csv")), UploadKind::Unrecognized);
    assert_eq!(UploadKind::of(None), UploadKind::Unrecognized);
  }

  #[test]
  fn line_list_takes_lines_verbatim() {
    let numbers = UploadKind::LineList.numbers(b"5551234\n\n  +44 20 \r\n");
    assert_eq!(numbers, vec!["5551234", "+44 20"]);
  }
}
