use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Output, State, escape_formatter};
use serde::Serialize;

use crate::archive::{ArchiveDir, write_file};
use crate::error::{Result, ThreadSafeError};
use crate::model::{Attachment, Thread};

/// Template picked up from the archive root when no template is given.
pub const DEFAULT_TEMPLATE_FILE_NAME: &str = "thread-safe.tmpl";
/// Stylesheet picked up from the archive root when no CSS file is given.
pub const DEFAULT_CSS_FILE_NAME: &str = "thread-safe.css";

const TEMPLATE_NAME: &str = "thread.html";
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4"];

pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ name }}</title>
{%- if css %}
<link rel="stylesheet" type="text/css" href="{{ css }}" media="screen" />
{%- endif %}
</head>
<body>
<h1>{{ name }}</h1>
<div class="text"><pre>{{ header }}</pre></div>
{% for tweet in tweets -%}
<div class="tweet">
<h3>{{ tweet.text|linebreaks }}</h3>
{% for attachment in tweet.attachments -%}
{% if attachment.is_image -%}
<img width="320" height="auto" src="attachments/{{ attachment.path }}">
{% elif attachment.is_video -%}
<video width="320" height="240" controls autoplay loop muted><source src="attachments/{{ attachment.path }}" type="video/mp4"></video>
{% else -%}
<a href="attachments/{{ attachment.path }}">{{ attachment.path }}</a>
{% endif -%}
<br><br>
{% endfor -%}
</div>
{% endfor -%}
</body>
</html>
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub template: Option<PathBuf>,
    pub css: Option<PathBuf>,
}

/// Data handed to a template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateThread {
    pub name: String,
    pub header: String,
    pub css: Option<String>,
    pub tweets: Vec<TemplateTweet>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateTweet {
    pub number: usize,
    /// Tweet text prefixed with its `[i/n]` position.
    pub text: String,
    pub url: String,
    pub created_at: String,
    pub attachments: Vec<TemplateAttachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateAttachment {
    /// File name inside `attachments/`.
    pub path: String,
    pub ext: String,
    pub media_type: String,
    pub is_image: bool,
    pub is_video: bool,
}

impl TemplateThread {
    pub fn new(thread: &Thread, css_href: Option<&str>) -> Self {
        let total = thread.len();
        let tweets = thread
            .tweets
            .iter()
            .enumerate()
            .map(|(idx, tweet)| TemplateTweet {
                number: idx + 1,
                text: format!("[{}/{total}] {}", idx + 1, tweet.text.trim()),
                url: tweet.url.clone(),
                created_at: tweet.created_at.clone(),
                attachments: tweet
                    .attachments
                    .iter()
                    .map(|attachment| TemplateAttachment::new(attachment, &tweet.id))
                    .collect(),
            })
            .collect();

        Self {
            name: thread.name.clone(),
            header: thread.header(),
            css: css_href.map(ToString::to_string),
            tweets,
        }
    }
}

impl TemplateAttachment {
    fn new(attachment: &Attachment, tweet_id: &str) -> Self {
        let ext = attachment.extension().to_ascii_lowercase();
        Self {
            path: attachment.file_name(tweet_id),
            is_image: IMAGE_EXTENSIONS.contains(&ext.as_str()),
            is_video: VIDEO_EXTENSIONS.contains(&ext.as_str()),
            media_type: attachment.media_type.clone(),
            ext,
        }
    }
}

/// Renders `thread.html` into the archive directory.
pub fn write_html(thread: &Thread, dir: &ArchiveDir, options: &RenderOptions) -> Result<PathBuf> {
    let template = load_template(dir.root(), options.template.as_deref())?;
    let css_href = resolve_css_href(dir.root(), options.css.as_deref());

    let html = render_html(thread, &template, css_href.as_deref())?;
    let path = dir.html_path();
    write_file(&path, html.as_bytes())?;
    debug!("wrote {}", path.display());
    Ok(path)
}

/// Explicit template, else `<root>/thread-safe.tmpl`, else the built-in one.
pub fn load_template(root: &Path, explicit: Option<&Path>) -> Result<String> {
    if let Some(path) = explicit {
        return read_to_string(path);
    }

    let default_path = root.join(DEFAULT_TEMPLATE_FILE_NAME);
    if default_path.is_file() {
        debug!("using template {}", default_path.display());
        return read_to_string(&default_path);
    }

    Ok(DEFAULT_TEMPLATE.to_string())
}

/// Stylesheet reference relative to the rendered file, if any.
pub fn resolve_css_href(root: &Path, explicit: Option<&Path>) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path.display().to_string());
    }

    root.join(DEFAULT_CSS_FILE_NAME)
        .is_file()
        .then(|| format!("../{DEFAULT_CSS_FILE_NAME}"))
}

/// Renders `template` against a [`TemplateThread`] built from `thread`.
///
/// Output is HTML-escaped unless marked safe. The `linebreaks` filter escapes
/// its input and turns newlines into `<br>`.
pub fn render_html(thread: &Thread, template: &str, css_href: Option<&str>) -> Result<String> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_formatter(html_formatter);
    env.add_filter("linebreaks", linebreaks);
    env.add_template(TEMPLATE_NAME, template)?;

    let context = TemplateThread::new(thread, css_href);
    Ok(env.get_template(TEMPLATE_NAME)?.render(&context)?)
}

fn html_formatter(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> std::result::Result<(), minijinja::Error> {
    match value.as_str() {
        Some(text) if matches!(state.auto_escape(), AutoEscape::Html) && !value.is_safe() => {
            out.write_str(&escape_html(text))?;
            Ok(())
        }
        _ => escape_formatter(out, state, value),
    }
}

fn linebreaks(text: &str) -> Value {
    Value::from_safe_string(escape_html(text).replace('\n', "<br>\n"))
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ThreadSafeError::Io {
        path: path.to_path_buf(),
        source,
    })
}
