//! Jekyll post rendering.
//!
//! Stage 2 of the conversion pipeline. Turns a parsed [`Notebook`] into the
//! post body plus the decoded image payloads. This stage is pure — no I/O,
//! no clock — so tests can assert on exact output. The caller supplies the
//! front-matter timestamp and writes the files.
//!
//! ## Emitted Blocks
//!
//! - **Markdown cells** pass through verbatim.
//! - **Code sources** and **execute results** use the Jekyll
//!   capture/highlight/include idiom consumed by `notebook-cell.html`:
//!
//! ```text
//! {% capture content %}{% highlight python %}
//! print("hi")
//! {% endhighlight %}{% endcapture %}
//! {% include notebook-cell.html execution_count="[3]:" content=content type='input' %}
//! ```
//!
//! - **Display data** becomes `![png](/public/img/nbexample/imageN.png)`
//!   with the decoded bytes returned for the caller to write. The counter
//!   is threaded through the run, starts at 1, and never resets, so
//!   filenames cannot collide within one conversion.
//! - **Streams and tracebacks** become `<pre class="stream">` blocks;
//!   traceback lines are stripped of ANSI color escapes first.
//!
//! The body is assembled as a `Vec<String>` of lines and joined at the end,
//! with one blank line after every cell.

use crate::notebook::{self, Cell, Notebook, Output, Text};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Public asset path the generated site serves images from.
pub const IMAGE_PUBLIC_PREFIX: &str = "/public/img/nbexample/";

/// IPython colors tracebacks with `ESC[...m` sequences.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b[^m]*m").unwrap());

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{kind} output has no `{mime}` payload")]
    MissingPayload {
        kind: &'static str,
        mime: &'static str,
    },
    #[error("invalid base64 in image/png payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A fully rendered post: body text plus images not yet on disk.
#[derive(Debug)]
pub struct RenderedPost {
    pub body: String,
    pub images: Vec<RenderedImage>,
}

/// One decoded `image/png` payload with its assigned filename.
#[derive(Debug)]
pub struct RenderedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Render the whole notebook. `timestamp` goes into the front matter as-is.
pub fn render(notebook: &Notebook, timestamp: &str) -> Result<RenderedPost, RenderError> {
    let mut lines = front_matter(timestamp);
    let mut images = Vec::new();
    let mut next_image = 1u32;

    for cell in &notebook.cells {
        match cell {
            Cell::Markdown { source } => lines.push(source.joined()),
            Cell::Code {
                source,
                execution_count,
                outputs,
            } => render_code_cell(
                &mut lines,
                &mut images,
                &mut next_image,
                source,
                *execution_count,
                outputs,
            )?,
        }
        // Blank separator line after every cell.
        lines.push(String::new());
    }

    Ok(RenderedPost {
        body: lines.join("\n") + "\n",
        images,
    })
}

fn front_matter(timestamp: &str) -> Vec<String> {
    vec![
        "---".to_string(),
        "layout: post".to_string(),
        "title: ".to_string(),
        format!("date: {timestamp}"),
        "---".to_string(),
    ]
}

fn render_code_cell(
    lines: &mut Vec<String>,
    images: &mut Vec<RenderedImage>,
    next_image: &mut u32,
    source: &Text,
    execution_count: Option<i64>,
    outputs: &[Output],
) -> Result<(), RenderError> {
    let label = execution_label(execution_count);
    push_capture(lines, "python", &source.joined(), &label, "input");

    for output in outputs {
        match output {
            Output::ExecuteResult { data } => {
                let text = notebook::mime_text(data, "text/plain").ok_or(
                    RenderError::MissingPayload {
                        kind: "execute_result",
                        mime: "text/plain",
                    },
                )?;
                push_capture(lines, "text", &text, &label, "output");
            }
            Output::DisplayData { data } => {
                let payload = notebook::mime_text(data, "image/png").ok_or(
                    RenderError::MissingPayload {
                        kind: "display_data",
                        mime: "image/png",
                    },
                )?;
                // nbformat wraps base64 payloads with newlines.
                let cleaned: String =
                    payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let bytes = BASE64.decode(cleaned)?;
                let filename = format!("image{next_image}.png");
                lines.push(format!("![png]({IMAGE_PUBLIC_PREFIX}{filename})"));
                images.push(RenderedImage { filename, bytes });
                *next_image += 1;
            }
            Output::Stream { text } => push_pre(lines, &text.joined()),
            Output::Error { traceback } => {
                let joined = traceback
                    .iter()
                    .map(|line| strip_ansi(line))
                    .collect::<Vec<_>>()
                    .join("\n");
                push_pre(lines, &joined);
            }
        }
    }
    Ok(())
}

/// Display label for a cell's execution order: `[3]:`, or `[ ]:` when unset.
fn execution_label(count: Option<i64>) -> String {
    match count {
        Some(n) => format!("[{n}]:"),
        None => "[ ]:".to_string(),
    }
}

/// Emit one capture/highlight/include block.
fn push_capture(lines: &mut Vec<String>, lang: &str, content: &str, label: &str, role: &str) {
    lines.push(format!("{{% capture content %}}{{% highlight {lang} %}}"));
    lines.push(content.to_string());
    lines.push("{% endhighlight %}{% endcapture %}".to_string());
    lines.push(format!(
        "{{% include notebook-cell.html execution_count=\"{label}\" content=content type='{role}' %}}"
    ));
}

/// Emit a preformatted block with surrounding spaces/newlines trimmed.
fn push_pre(lines: &mut Vec<String>, text: &str) {
    lines.push(r#"<pre class="stream">"#.to_string());
    lines.push(text.trim_matches([' ', '\n']).to_string());
    lines.push("</pre>".to_string());
}

/// Remove ANSI color escape sequences from one line.
fn strip_ansi(line: &str) -> String {
    ANSI_ESCAPE.replace_all(line, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::from_value;
    use serde_json::json;

    const TS: &str = "2026-08-24 10:00:00";

    fn render_doc(doc: serde_json::Value) -> RenderedPost {
        render(&from_value(&doc).unwrap(), TS).unwrap()
    }

    // Base64 of the 8-byte PNG signature.
    const PNG_B64: &str = "iVBORw0KGgo=";
    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn empty_notebook_is_front_matter_only() {
        let post = render_doc(json!({"cells": []}));
        assert_eq!(
            post.body,
            "---\nlayout: post\ntitle: \ndate: 2026-08-24 10:00:00\n---\n"
        );
        assert!(post.images.is_empty());
    }

    #[test]
    fn markdown_fragments_concatenated_verbatim() {
        let post = render_doc(json!({
            "cells": [{"cell_type": "markdown", "source": ["# Title\n", "Body text"]}]
        }));
        assert!(post.body.contains("# Title\nBody text"));
        // One blank separator line after the cell.
        assert!(post.body.ends_with("# Title\nBody text\n\n"));
    }

    #[test]
    fn code_cell_renders_input_block() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": ["1 + 1"],
                "execution_count": 3,
                "outputs": []
            }]
        }));
        assert!(post.body.contains("{% capture content %}{% highlight python %}\n1 + 1\n{% endhighlight %}{% endcapture %}"));
        assert!(post.body.contains(
            "{% include notebook-cell.html execution_count=\"[3]:\" content=content type='input' %}"
        ));
    }

    #[test]
    fn execute_result_renders_output_block() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": ["6 * 7"],
                "execution_count": 3,
                "outputs": [{
                    "output_type": "execute_result",
                    "data": {"text/plain": ["42"]}
                }]
            }]
        }));
        assert!(post.body.contains("{% capture content %}{% highlight text %}\n42\n{% endhighlight %}{% endcapture %}"));
        assert!(post.body.contains(
            "{% include notebook-cell.html execution_count=\"[3]:\" content=content type='output' %}"
        ));
    }

    #[test]
    fn execute_result_accepts_plain_string_payload() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "execute_result",
                    "data": {"text/plain": "42"}
                }]
            }]
        }));
        assert!(post.body.contains("\n42\n"));
    }

    #[test]
    fn missing_text_plain_is_error() {
        let doc = json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "execute_result",
                    "data": {"text/html": ["<b>42</b>"]}
                }]
            }]
        });
        let err = render(&from_value(&doc).unwrap(), TS).unwrap_err();
        assert!(matches!(err, RenderError::MissingPayload { mime: "text/plain", .. }));
    }

    #[test]
    fn display_data_numbers_images_across_the_run() {
        let post = render_doc(json!({
            "cells": [
                {
                    "cell_type": "code",
                    "source": [],
                    "execution_count": 1,
                    "outputs": [{"output_type": "display_data", "data": {"image/png": PNG_B64}}]
                },
                {
                    "cell_type": "code",
                    "source": [],
                    "execution_count": 2,
                    "outputs": [{"output_type": "display_data", "data": {"image/png": PNG_B64}}]
                }
            ]
        }));
        assert_eq!(post.images.len(), 2);
        assert_eq!(post.images[0].filename, "image1.png");
        assert_eq!(post.images[1].filename, "image2.png");
        assert_eq!(post.images[0].bytes, PNG_BYTES);
        assert!(post.body.contains("![png](/public/img/nbexample/image1.png)"));
        assert!(post.body.contains("![png](/public/img/nbexample/image2.png)"));
    }

    #[test]
    fn base64_payload_with_newlines_decodes() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "display_data",
                    "data": {"image/png": "iVBO\nRw0K\nGgo=\n"}
                }]
            }]
        }));
        assert_eq!(post.images[0].bytes, PNG_BYTES);
    }

    #[test]
    fn invalid_base64_is_error() {
        let doc = json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "display_data",
                    "data": {"image/png": "not base64!!"}
                }]
            }]
        });
        let err = render(&from_value(&doc).unwrap(), TS).unwrap_err();
        assert!(matches!(err, RenderError::Base64(_)));
    }

    #[test]
    fn stream_output_trimmed_but_interior_intact() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "stream",
                    "text": ["  line one  \n"]
                }]
            }]
        }));
        assert!(post.body.contains("<pre class=\"stream\">\nline one\n</pre>"));
    }

    #[test]
    fn stream_interior_newlines_preserved() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "stream",
                    "text": ["first\n", "second\n"]
                }]
            }]
        }));
        assert!(post.body.contains("<pre class=\"stream\">\nfirst\nsecond\n</pre>"));
    }

    #[test]
    fn traceback_ansi_escapes_stripped() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": [],
                "execution_count": 1,
                "outputs": [{
                    "output_type": "error",
                    "traceback": [
                        "\u{1b}[0;31mZeroDivisionError\u{1b}[0m",
                        "division by zero"
                    ]
                }]
            }]
        }));
        assert!(post.body.contains("<pre class=\"stream\">\nZeroDivisionError\ndivision by zero\n</pre>"));
        assert!(!post.body.contains('\u{1b}'));
    }

    #[test]
    fn null_execution_count_renders_blank_label() {
        let post = render_doc(json!({
            "cells": [{
                "cell_type": "code",
                "source": ["pass"],
                "execution_count": null,
                "outputs": []
            }]
        }));
        assert!(post.body.contains("execution_count=\"[ ]:\""));
    }
}
