/* src/server/core/rust/src/richtext.rs */

use serde_json::Value;

const FORMAT_BOLD: u64 = 1;
const FORMAT_ITALIC: u64 = 2;

pub(crate) fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      c => out.push(c),
    }
  }
  out
}

/// Render a stored rich-text document (`{"root": {"children": [...]}}`) to HTML.
/// Returns `None` when the document has no root.
pub fn render_document(doc: &Value) -> Option<String> {
  let root = doc.get("root").filter(|r| r.is_object())?;
  let mut out = String::from("<div>");
  render_children(root, &mut out);
  out.push_str("</div>");
  Some(out)
}

fn render_children(node: &Value, out: &mut String) {
  if let Some(children) = node.get("children").and_then(Value::as_array) {
    for child in children {
      render_node(child, out);
    }
  }
}

fn render_node(node: &Value, out: &mut String) {
  match node.get("type").and_then(Value::as_str) {
    Some("paragraph") => wrap("p", node, out),
    Some("heading") => wrap(&format!("h{}", heading_level(node)), node, out),
    Some("text") => {
      let text = escape_html(node.get("text").and_then(Value::as_str).unwrap_or(""));
      let format = node.get("format").and_then(Value::as_u64).unwrap_or(0);
      // Italic wins over bold when both bits are set
      let tag = if format & FORMAT_ITALIC != 0 {
        "em"
      } else if format & FORMAT_BOLD != 0 {
        "strong"
      } else {
        "span"
      };
      out.push_str(&format!("<{tag}>{text}</{tag}>"));
    }
    _ => {}
  }
}

fn wrap(tag: &str, node: &Value, out: &mut String) {
  out.push('<');
  out.push_str(tag);
  out.push('>');
  render_children(node, out);
  out.push_str("</");
  out.push_str(tag);
  out.push('>');
}

/// Heading tag as a number (`1`) or a tag name (`"h1"`); missing means 1,
/// anything outside 1..=6 renders as level 2.
fn heading_level(node: &Value) -> u64 {
  let level = match node.get("tag") {
    None | Some(Value::Null) => Some(1),
    Some(Value::Number(n)) => n.as_u64(),
    Some(Value::String(s)) => s.strip_prefix('h').unwrap_or(s).parse().ok(),
    Some(_) => None,
  };
  level.filter(|l| (1..=6).contains(l)).unwrap_or(2)
}
