//! Client-facing export of loaded walls.
//!
//! Produces the serialisable shapes returned to the browser: formatted
//! content, human readable dates and author display data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quick_xml::{
  Writer,
  events::{BytesStart, Event},
};
use serde::Serialize;

use crate::{
  comment::{ContentFormat, LoadedComment, LoadedReply, SeqNum},
  loader::WallView,
  user::User,
  wall::WallId,
};

// ─── Content formatting port ─────────────────────────────────────────────────

/// Converts stored comment text into what the client displays.
pub trait ContentFormatter: Send + Sync {
  fn format(&self, content: &str, format: ContentFormat) -> (String, ContentFormat);
}

/// Returns content and format unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl ContentFormatter for Passthrough {
  fn format(&self, content: &str, format: ContentFormat) -> (String, ContentFormat) {
    (content.to_owned(), format)
  }
}

// ─── Exported shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDate {
  pub abs_date:     String,
  pub rel_date:     String,
  pub iso8601_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedAuthor {
  pub full_name: String,
  pub link:      String,
  /// HTML fragment displaying the user picture.
  pub picture:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedReply {
  pub id:           i64,
  pub content:      String,
  pub time_created: ExportedDate,
  pub author:       ExportedAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedComment {
  pub id:           i64,
  pub seq_num:      SeqNum,
  pub content:      String,
  pub format:       ContentFormat,
  pub time_created: ExportedDate,
  pub author:       ExportedAuthor,
  pub replies:      Vec<ExportedReply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatOption {
  pub value: ContentFormat,
  pub name:  &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedWallSummary {
  pub id:                     WallId,
  pub max_seq_num:            SeqNum,
  pub min_seq_num:            SeqNum,
  pub comment_format_list:    Vec<FormatOption>,
  pub comment_format_default: ContentFormat,
}

/// Everything needed to render a wall page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedWall {
  pub wall:     ExportedWallSummary,
  pub comments: Vec<ExportedComment>,
}

/// The wall's identity and the client's new high-water mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallMark {
  pub id:          WallId,
  pub max_seq_num: SeqNum,
}

/// Response of the add-comment operation: comments newer than the client's
/// high-water mark, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentDelta {
  pub wall:     WallMark,
  pub comments: Vec<ExportedComment>,
}

// ─── Exporter ────────────────────────────────────────────────────────────────

/// Where author links and default pictures point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
  /// Prefix completed by the author's user id, e.g.
  /// `https://lms.example.com/user/view.php?id=`.
  pub profile_url:         String,
  pub default_picture_url: String,
}

impl Default for ExportConfig {
  fn default() -> Self {
    Self {
      profile_url:         "/user/view.php?id=".into(),
      default_picture_url: "/pix/u/f2.png".into(),
    }
  }
}

#[derive(Clone)]
pub struct Exporter {
  config:    ExportConfig,
  formatter: Arc<dyn ContentFormatter>,
}

impl Exporter {
  pub fn new(config: ExportConfig) -> Self {
    Self { config, formatter: Arc::new(Passthrough) }
  }

  pub fn with_formatter(mut self, formatter: Arc<dyn ContentFormatter>) -> Self {
    self.formatter = formatter;
    self
  }

  /// Export the whole loaded view; summary bounds cover loaded comments only.
  pub fn export_wall(&self, view: &WallView, now: DateTime<Utc>) -> ExportedWall {
    let handle = view.handle();
    ExportedWall {
      wall:     ExportedWallSummary {
        id:                     handle.id(),
        max_seq_num:            view.max_seq_num().unwrap_or(0),
        min_seq_num:            view.min_seq_num().unwrap_or(0),
        comment_format_list:    ContentFormat::menu()
          .into_iter()
          .map(|(value, name)| FormatOption { value, name })
          .collect(),
        comment_format_default: handle.default_format(),
      },
      comments: self.export_comments(view, now),
    }
  }

  /// Loaded comments, newest first.
  pub fn export_comments(
    &self,
    view: &WallView,
    now: DateTime<Utc>,
  ) -> Vec<ExportedComment> {
    view.comments().map(|c| self.export_comment(c, now)).collect()
  }

  pub fn export_comment(&self, c: &LoadedComment, now: DateTime<Utc>) -> ExportedComment {
    let (content, format) = self.formatter.format(&c.comment.content, c.comment.format);
    ExportedComment {
      id: c.comment.id.0,
      seq_num: c.comment.seq_num,
      content,
      format,
      time_created: export_date(c.comment.time_created, now),
      author: self.export_author(&c.author),
      replies: c.replies.iter().map(|r| self.export_reply(r, now)).collect(),
    }
  }

  fn export_reply(&self, r: &LoadedReply, now: DateTime<Utc>) -> ExportedReply {
    // Replies carry no format tag of their own.
    let (content, _) = self.formatter.format(&r.reply.content, ContentFormat::MOODLE);
    ExportedReply {
      id: r.reply.id.0,
      content,
      time_created: export_date(r.reply.time_created, now),
      author: self.export_author(&r.author),
    }
  }

  pub fn export_author(&self, user: &User) -> ExportedAuthor {
    let picture_url = user
      .picture_url
      .as_deref()
      .unwrap_or(&self.config.default_picture_url);
    ExportedAuthor {
      full_name: user.full_name.clone(),
      link:      format!("{}{}", self.config.profile_url, user.id),
      picture:   picture_fragment(picture_url, &user.full_name),
    }
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn export_date(at: DateTime<Utc>, now: DateTime<Utc>) -> ExportedDate {
  let age = (now - at).num_seconds();
  ExportedDate {
    abs_date:     at.format("%A, %-d %B %Y, %-I:%M %p").to_string(),
    rel_date:     if age <= 0 {
      "now".to_owned()
    } else {
      format!("{} ago", format_age(age))
    },
    iso8601_date: at.to_rfc3339(),
  }
}

/// Render a positive duration in seconds using its two largest units,
/// e.g. `"2 days 3 hours"` or `"5 mins 1 sec"`.
pub fn format_age(total_secs: i64) -> String {
  const UNITS: [(i64, &str, &str); 5] = [
    (365 * 86_400, "year", "years"),
    (86_400, "day", "days"),
    (3_600, "hour", "hours"),
    (60, "min", "mins"),
    (1, "sec", "secs"),
  ];

  let mut rest = total_secs.max(0);
  let mut parts = Vec::with_capacity(2);
  for (size, one, many) in UNITS {
    let n = rest / size;
    rest %= size;
    if n > 0 {
      parts.push(format!("{n} {}", if n == 1 { one } else { many }));
    } else if !parts.is_empty() {
      break;
    }
    if parts.len() == 2 {
      break;
    }
  }

  if parts.is_empty() { "0 secs".to_owned() } else { parts.join(" ") }
}

// ─── Picture ─────────────────────────────────────────────────────────────────

fn picture_fragment(src: &str, full_name: &str) -> String {
  let label = format!("Picture of {full_name}");
  let mut img = BytesStart::new("img");
  img.push_attribute(("src", src));
  img.push_attribute(("alt", label.as_str()));
  img.push_attribute(("title", label.as_str()));
  img.push_attribute(("class", "userpicture"));
  img.push_attribute(("width", "35"));
  img.push_attribute(("height", "35"));

  let mut writer = Writer::new(Vec::new());
  match writer.write_event(Event::Empty(img)) {
    Ok(()) => String::from_utf8(writer.into_inner()).unwrap_or_default(),
    Err(_) => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;
  use crate::user::UserId;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn age_uses_two_largest_units() {
    assert_eq!(format_age(1), "1 sec");
    assert_eq!(format_age(61), "1 min 1 sec");
    assert_eq!(format_age(3 * 3_600 + 59), "3 hours");
    assert_eq!(format_age(2 * 86_400 + 3 * 3_600 + 7), "2 days 3 hours");
    assert_eq!(format_age(400 * 86_400), "1 year 35 days");
  }

  #[test]
  fn dates_render_in_all_three_forms() {
    // 2015-10-16 09:05:00 UTC
    let created = at(1_444_986_300);
    let d = export_date(created, at(1_444_986_300 + 125));
    assert_eq!(d.abs_date, "Friday, 16 October 2015, 9:05 AM");
    assert_eq!(d.rel_date, "2 mins 5 secs ago");
    assert_eq!(d.iso8601_date, "2015-10-16T09:05:00+00:00");
    assert_eq!(export_date(created, created).rel_date, "now");
  }

  #[test]
  fn author_picture_is_escaped_and_falls_back_to_default() {
    let exporter = Exporter::new(ExportConfig::default());
    let user = User {
      id:          UserId(5),
      full_name:   r#"Tom & "Jerry""#.into(),
      picture_url: None,
      guest:       false,
    };
    let author = exporter.export_author(&user);
    assert_eq!(author.link, "/user/view.php?id=5");
    assert!(author.picture.starts_with("<img src=\"/pix/u/f2.png\""), "{}", author.picture);
    assert!(author.picture.contains("Picture of Tom &amp; &quot;Jerry&quot;"));
  }

  #[test]
  fn exported_shape_uses_client_field_names() {
    let date = export_date(at(0), at(0));
    let json = serde_json::to_value(&date).unwrap();
    assert!(json.get("absDate").is_some());
    assert!(json.get("relDate").is_some());
    assert!(json.get("iso8601Date").is_some());

    let mark = WallMark { id: WallId(3), max_seq_num: 4 };
    assert_eq!(
      serde_json::to_value(mark).unwrap(),
      serde_json::json!({ "id": 3, "maxSeqNum": 4 })
    );
  }
}
