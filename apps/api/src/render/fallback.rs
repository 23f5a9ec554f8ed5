use super::escape::escape;

/// Single-section page used when the full renderer fails. Built only from
/// name, headline and about so it cannot trip over malformed résumé data.
pub fn minimal_document(name: &str, headline: &str, about: &str) -> String {
    let title = if name.trim().is_empty() { "Portfolio" } else { name.trim() };
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ margin: 0; padding: 64px 24px; background: #fff; color: #111; font: 16px/1.6 system-ui, sans-serif; }}
main {{ max-width: 760px; margin: 0 auto; }}
h1 {{ font-size: 40px; margin: 0 0 8px; }}
h2 {{ font-size: 18px; font-weight: 400; color: #555; margin: 0 0 32px; }}
pre {{ white-space: pre-wrap; font: inherit; }}
</style>
</head>
<body>
<main>
<h1>{title}</h1>
<h2>{headline}</h2>
<pre>{about}</pre>
</main>
</body>
</html>
"#,
        headline = escape(headline),
        about = escape(about),
    )
}
