//! Self-submitting browser form for redirect modes.

use std::fmt;

use serde::Serialize;

use crate::trade::request::TransportParams;

/// Sealed parameters to be posted by the payer's browser.
///
/// Produced instead of a network call for browser-redirect modes. Render it
/// with [`to_html`](Self::to_html) or build a custom page from
/// [`action`](Self::action) and [`fields`](Self::fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectForm {
    action: String,
    fields: Vec<(&'static str, String)>,
}

impl RedirectForm {
    pub(crate) fn new(action: String, params: &TransportParams) -> Self {
        let fields = params.pairs().map(|(name, value)| (name, value.to_owned())).collect();
        Self { action, fields }
    }

    /// Absolute URL the form posts to.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Hidden input names and values, in order.
    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Returns the value of a hidden input.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    /// Renders an HTML page that submits the form on load.
    ///
    /// Every attribute value is HTML-escaped.
    #[must_use]
    pub fn to_html(&self) -> String {
        let inputs: String = self
            .fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "        <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                    escape_attr(name),
                    escape_attr(value)
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>PAYUNi Payment</title>
</head>
<body>
    <form id="payuniForm" method="POST" action="{action}">
{inputs}    </form>
    <script>
        document.getElementById('payuniForm').submit();
    </script>
</body>
</html>
"#,
            action = escape_attr(&self.action),
        )
    }
}

impl fmt::Display for RedirectForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
