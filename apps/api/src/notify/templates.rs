use chrono::{DateTime, Utc};

use crate::render::escape::escape;

pub struct Rendered {
    pub subject: String,
    pub html: String,
}

const BASE_STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; } \
.container { max-width: 640px; margin: 0 auto; padding: 20px; } \
.header { background: #111827; color: #fff; padding: 24px; text-align: center; border-radius: 8px 8px 0 0; } \
.content { background: #f9fafb; padding: 24px; border: 1px solid #e5e7eb; border-top: none; } \
.row { display: flex; justify-content: space-between; padding: 8px 0; border-bottom: 1px solid #e5e7eb; } \
.button { display: inline-block; background: #2563eb; color: #fff; padding: 12px 24px; text-decoration: none; border-radius: 5px; } \
.muted { color: #6b7280; font-size: 13px; } \
.mono { font-family: ui-monospace, Menlo, Consolas, monospace; font-size: 13px; background: #111827; color: #f9fafb; padding: 12px; border-radius: 8px; white-space: pre-wrap; }";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><style>{BASE_STYLE}</style></head>\n<body><div class=\"container\"><div class=\"header\"><h1 style=\"margin:0\">{}</h1></div><div class=\"content\">{body}</div></div></body>\n</html>\n",
        escape(title)
    )
}

pub fn confirmation(order_id: &str, eta_minutes: u32, now: DateTime<Utc>) -> Rendered {
    let body = format!(
        "<p>We received your résumé and started generating your portfolio.</p>\
<div class=\"row\"><div>Order ID</div><div><strong>{order}</strong></div></div>\
<div class=\"row\"><div>Created</div><div>{created}</div></div>\
<div class=\"row\"><div>Estimated completion</div><div><strong>{eta_minutes} minutes</strong></div></div>\
<p class=\"muted\">You will receive a second email when your site is live and your ZIP is ready.</p>",
        order = escape(order_id),
        created = now.to_rfc3339(),
    );
    Rendered {
        subject: format!("Order Confirmed (Order {order_id})"),
        html: page("Order Confirmed", &body),
    }
}

pub fn completed(site_url: &str, download_url: Option<&str>, position: u32, total: u32) -> Rendered {
    let download = match download_url {
        Some(url) => format!(
            "<h2>Download Package</h2><p><a href=\"{0}\" class=\"button\">Download ZIP</a></p>\
<p class=\"muted\">Valid for 30 days, 10 downloads max</p>",
            escape(url)
        ),
        None => "<p class=\"muted\">Your download package is not available yet. Reply to this email and we will send it.</p>".to_string(),
    };
    let body = format!(
        "<p>Your professional portfolio is live! You are customer <strong>#{position}/{total}</strong>.</p>\
<h2>Live Website</h2><p><a href=\"{site}\" class=\"button\">View Portfolio</a></p><p><small>{site}</small></p>\
{download}\
<h3>What's inside the ZIP?</h3><ul><li>Complete portfolio (HTML/CSS)</li><li>Original résumé PDF</li><li>Hosting instructions</li></ul>\
<p>Questions? Reply to this email.</p>",
        site = escape(site_url),
    );
    Rendered {
        subject: format!("Portfolio Ready! (Customer #{position}/{total})"),
        html: page("Your Portfolio is Ready!", &body),
    }
}

pub fn sold_out(total: u32) -> Rendered {
    let body = format!(
        "<p>Thanks for your purchase! Unfortunately we have reached our {total}-customer limit.</p>\
<p>Your payment will be refunded in 3-5 days.</p>\
<p>Want to join the waitlist? Reply \"Notify me\".</p>"
    );
    Rendered {
        subject: "Sold Out - Refund Processing".to_string(),
        html: page("We're Sold Out", &body),
    }
}

pub fn admin_alert(
    title: &str,
    order_id: &str,
    customer_email: &str,
    details: &str,
    now: DateTime<Utc>,
) -> String {
    let body = format!(
        "<div class=\"row\"><div>Order ID</div><div><strong>{}</strong></div></div>\
<div class=\"row\"><div>Customer email</div><div><strong>{}</strong></div></div>\
<div class=\"row\"><div>Time</div><div>{}</div></div>\
<p class=\"muted\">Details</p><div class=\"mono\">{}</div>",
        escape(order_id),
        escape(customer_email),
        now.to_rfc3339(),
        escape(details),
    );
    page(title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_mentions_links_and_position() {
        let mail = completed("https://site", Some("https://dl/abc"), 3, 50);
        assert_eq!(mail.subject, "Portfolio Ready! (Customer #3/50)");
        assert!(mail.html.contains("href=\"https://site\""));
        assert!(mail.html.contains("href=\"https://dl/abc\""));
    }

    #[test]
    fn test_completed_without_download() {
        let mail = completed("https://site", None, 1, 50);
        assert!(mail.html.contains("not available yet"));
    }

    #[test]
    fn test_admin_alert_escapes_details() {
        let html = admin_alert("Deploy failed", "o1", "a@b.com", "<boom>", Utc::now());
        assert!(html.contains("&lt;boom&gt;"));
    }
}
