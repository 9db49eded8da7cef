//! Minimal HTML for the gateway-choice step.

use payflow_types::GatewayConfig;

/// Renders the choice form. It posts `gatewayName` back to the current URL.
pub fn choose_gateway_page(gateways: &[GatewayConfig]) -> String {
    let options: String = gateways
        .iter()
        .map(|g| {
            let name = escape(&g.gateway_name);
            format!("        <option value=\"{name}\">{name}</option>\n")
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Choose a payment method</title></head>
<body>
<div class="payum-choose-gateway">
  <form method="post">
    <label for="gatewayName">Payment method</label>
    <select id="gatewayName" name="gatewayName">
{options}    </select>
    <button type="submit">Continue</button>
  </form>
</div>
</body>
</html>
"#
    )
}

fn escape(raw: &str) -> String {
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
