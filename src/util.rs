//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values in one
/// pass: inserted values are never scanned again, so a value containing `{key}`
/// stays literal. Braces that do not name a provided key (e.g. JSON examples)
/// are left alone.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let hit = after.find('}').and_then(|close| {
      let key = &after[..close];
      pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (close, *v))
    });
    match hit {
      Some((close, value)) => {
        out.push_str(value);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

const FENCE: &str = "```";

/// Strip the markdown code fence a completion model tends to wrap JSON in.
///
/// A leading ```` ```json ```` (or bare ```` ``` ````) is removed only when the
/// text starts with it, a closing ```` ``` ```` only when the text ends with it;
/// either may be missing. When prose surrounds the fence, only the fenced
/// body is kept. Unfenced input is only trimmed, so applying this twice is the
/// same as applying it once.
pub fn strip_code_fences(raw: &str) -> String {
  let mut body = strip_closing_fence(raw.trim());
  if let Some(open) = body.find(FENCE) {
    body = strip_opening_fence(&body[open..]);
    // Prose after the closing fence.
    if let Some(close) = body.rfind(FENCE) {
      body = &body[..close];
    }
  }
  body.trim().to_string()
}

fn strip_opening_fence(text: &str) -> &str {
  let Some(body) = text.strip_prefix(FENCE) else {
    return text;
  };
  // Language tag runs up to the first newline, e.g. "json\n{...".
  let tag_len = body
    .find(|c: char| c == '\n' || c == '{' || c == '[')
    .unwrap_or(0);
  if body[..tag_len].trim().chars().all(|c| c.is_ascii_alphanumeric()) {
    body[tag_len..].trim_start()
  } else {
    body.trim_start()
  }
}

fn strip_closing_fence(text: &str) -> &str {
  text.strip_suffix(FENCE).map(str::trim_end).unwrap_or(text)
}

/// Escape text for interpolation into HTML element content or quoted attributes.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}
