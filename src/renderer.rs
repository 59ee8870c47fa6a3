use crate::Response;

/// Escapes the five characters that matter for safe interpolation into
/// HTML text nodes and double-quoted attribute values. No crate in this
/// project's dependency tree provides HTML escaping, so this is
/// hand-written; it is the single place every HTML-bound field passes
/// through.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders a lookup result as a self-contained HTML fragment. Every
/// interpolated field is escaped; `href` targets are only ever emitted for
/// the `https://` and `mailto:` values already accepted by the validator,
/// and always carry `rel="noopener noreferrer" target="_blank"`. No
/// script, style, or event-handler sink is ever written.
pub fn render_html(response: &Response) -> String {
    if !response.errors.is_empty() && !response.for_sale {
        return render_html_errors(&response.domain, &response.errors);
    }

    if !response.for_sale {
        return format!(
            "<div class=\"domainsale\"><p>{} is not for sale.</p></div>",
            escape_html(&response.domain)
        );
    }

    let price = response
        .price
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();
    let url = response.url.as_deref().unwrap_or_default();
    let contact = response.contact.as_deref().unwrap_or_default();
    let expires = response
        .expires
        .as_deref()
        .map(escape_html)
        .unwrap_or_default();

    let url_link = if url.starts_with("https://") {
        format!(
            "<a href=\"{}\" rel=\"noopener noreferrer\" target=\"_blank\">{}</a>",
            escape_html(url),
            escape_html(url)
        )
    } else {
        escape_html(url)
    };

    let contact_link = if contact.starts_with("mailto:") {
        format!(
            "<a href=\"{}\" rel=\"noopener noreferrer\" target=\"_blank\">{}</a>",
            escape_html(contact),
            escape_html(contact)
        )
    } else {
        escape_html(contact)
    };

    format!(
        "<div class=\"domainsale\"><h1>{} is for sale</h1><p>Price: {}</p><p>Listing: {}</p><p>Contact: {}</p>{}</div>",
        escape_html(&response.domain),
        price,
        url_link,
        contact_link,
        if expires.is_empty() {
            String::new()
        } else {
            format!("<p>Expires: {expires}</p>")
        }
    )
}

fn render_html_errors(domain: &str, errors: &[String]) -> String {
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape_html(e)))
        .collect();
    format!(
        "<div class=\"domainsale domainsale-error\"><p>Could not determine status for {}.</p><ul>{}</ul></div>",
        escape_html(domain),
        items
    )
}

/// Deterministic plain-text rendering: printable ASCII plus newlines,
/// never interpreting escape sequences in the data it prints.
pub fn render_text(response: &Response) -> String {
    let mut lines = vec![format!("domain: {}", response.domain)];
    lines.push(format!("for_sale: {}", response.for_sale));
    if let Some(price) = &response.price {
        lines.push(format!("price: {price}"));
    }
    if let Some(url) = &response.url {
        lines.push(format!("url: {url}"));
    }
    if let Some(contact) = &response.contact {
        lines.push(format!("contact: {contact}"));
    }
    if let Some(expires) = &response.expires {
        lines.push(format!("expires: {expires}"));
    }
    lines.push(format!("source: {}", response.source.join(",")));
    for error in &response.errors {
        lines.push(format!("error: {error}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_response() -> Response {
        Response {
            domain: "example.com".to_string(),
            for_sale: true,
            price: Some("USD:1000".to_string()),
            url: Some("https://sale.example".to_string()),
            contact: Some("mailto:o@example.com".to_string()),
            expires: None,
            source: vec!["dns".to_string()],
            errors: vec![],
        }
    }

    #[test]
    fn html_escapes_injected_markup_in_domain() {
        let mut response = base_response();
        response.domain = "<script>alert(1)</script>".to_string();
        let html = render_html(&response);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn html_escapes_quotes_in_price() {
        let mut response = base_response();
        response.price = Some("USD:1000\" onmouseover=\"alert(1)".to_string());
        let html = render_html(&response);
        assert!(!html.contains("onmouseover=\"alert(1)\""));
    }

    #[test]
    fn html_links_https_and_mailto_with_safe_rel() {
        let response = base_response();
        let html = render_html(&response);
        assert!(html.contains("rel=\"noopener noreferrer\""));
        assert!(html.contains("target=\"_blank\""));
    }

    #[test]
    fn text_rendering_is_deterministic_ascii() {
        let response = base_response();
        let text = render_text(&response);
        assert!(text.starts_with("domain: example.com"));
        assert!(text.contains("for_sale: true"));
    }
}
