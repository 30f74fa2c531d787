//! HTML body of the login e-mail.

/// Minimal HTML escaping for text interpolated into the template.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn login_email_html(first_name: &str, link: &str, ttl_days: u32) -> String {
    let name = escape_html(first_name);
    let href = escape_html(link);
    let days = if ttl_days == 1 { "1 day".to_string() } else { format!("{ttl_days} days") };

    format!(
        r##"<div style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; font-size: 16px; line-height: 1.6; color: #333;">
<p style="margin: 0 0 8px 0; font-weight: 500;">Hi {name},</p>
<p style="margin: 0 0 24px 0; color: #666;">One click and you're in.</p>
<table cellpadding="0" cellspacing="0" style="margin: 0 0 28px 0;">
  <tr>
    <td style="background-color: #ED1C24; border-radius: 30px;">
      <a href="{href}" style="display: inline-block; padding: 14px 32px; font-size: 15px; font-weight: 500; color: #ffffff; letter-spacing: 0.1em; text-decoration: none;">OPEN THE HUB</a>
    </td>
  </tr>
</table>
<p style="margin: 0 0 24px 0; font-size: 12px; color: #999;">This link expires in {days}. If you didn't request this, just ignore it.</p>
</div>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_link_and_name() {
        let html = login_email_html("Pat", "https://hub.example.com/verify?token=abc", 7);
        assert!(html.contains("Hi Pat,"));
        assert!(html.contains(r#"href="https://hub.example.com/verify?token=abc""#));
        assert!(html.contains("expires in 7 days"));
    }

    #[test]
    fn name_is_escaped() {
        let html = login_email_html("<b>Pat</b>", "x", 1);
        assert!(html.contains("Hi &lt;b&gt;Pat&lt;/b&gt;,"));
        assert!(html.contains("expires in 1 day."));
    }
}
