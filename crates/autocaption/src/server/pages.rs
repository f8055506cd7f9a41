//! HTML pages for the browser form.

use autocaption_core::config::CaptionConfig;
use autocaption_core::PostResult;
use axum::http::StatusCode;

const HEAD: &str = r#"<meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">"#;

/// The upload form served at `GET /`.
pub fn upload_form(caption: &CaptionConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Auto Caption Generator</title>
  {HEAD}
  <style>
    body {{ background-color: #f8f9fa; padding-top: 40px; }}
    .container {{ max-width: 500px; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }}
    .btn-primary {{ width: 100%; }}
  </style>
</head>
<body>
  <div class="container">
    <h2 class="mb-4 text-center">Upload a Photo</h2>
    <form method="post" enctype="multipart/form-data">
      <div class="mb-3">
        <label for="photo" class="form-label">Select Photo:</label>
        <input type="file" class="form-control" id="photo" name="photo" accept="image/*" required>
      </div>
      <div class="mb-3">
        <label for="length" class="form-label">Caption Length ({min}–{max} tokens):</label>
        <input type="number" class="form-control" id="length" name="length" min="{min}" max="{max}" value="{default}" required>
      </div>
      <button type="submit" class="btn btn-primary">Upload &amp; Generate</button>
    </form>
  </div>
</body>
</html>
"#,
        min = caption.min_length,
        max = caption.max_length,
        default = caption.default_length,
    )
}

/// The page shown after a successful upload.
pub fn result_page(result: &PostResult) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Caption Generated</title>
  {HEAD}
  <style>
    body {{ background-color: #f0f0f0; padding-top: 30px; }}
    .container {{ max-width: 600px; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }}
    img {{ max-width: 100%; height: auto; border-radius: 10px; }}
  </style>
</head>
<body>
  <div class="container">
    <h2 class="mb-4 text-center">✅ Uploaded &amp; Scheduled!</h2>
    <img src="{url}" class="mb-3" alt="Uploaded Image">
    <h5>📝 Generated Caption:</h5>
    <p>{caption}</p>
    <h5>🏷 Hashtags:</h5>
    <p>{hashtags}</p>
    <p class="text-muted small">Post scheduled for {scheduled}</p>
    <a href="/" class="btn btn-secondary mt-3">Upload Another</a>
  </div>
</body>
</html>
"#,
        url = escape_html(&result.image.url()),
        caption = escape_html(&result.caption),
        hashtags = escape_html(&result.hashtags.join(" ")),
        scheduled = result.scheduled_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Upload Failed</title>
  {HEAD}
  <style>
    body {{ background-color: #f8f9fa; padding-top: 40px; }}
    .container {{ max-width: 500px; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }}
  </style>
</head>
<body>
  <div class="container">
    <h2 class="mb-3 text-center">Upload Failed</h2>
    <div class="alert alert-danger" role="alert">{code}: {message}</div>
    <a href="/" class="btn btn-secondary mt-3">Try Again</a>
  </div>
</body>
</html>
"#,
        code = status.as_u16(),
        message = escape_html(message),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
