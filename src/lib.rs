//! # nb2jekyll
//!
//! One-shot converter from a Jupyter notebook (`.ipynb`) to a Jekyll blog
//! post: read one file, write one `.md` beside it plus any embedded PNG
//! images, exit. No state, no configuration beyond the filename.
//!
//! # Architecture: Parse → Render → Write
//!
//! ```text
//! 1. Parse    talk.ipynb  →  Notebook      (JSON → typed, validated cells)
//! 2. Render   Notebook    →  RenderedPost  (post body + decoded images, pure)
//! 3. Write    RenderedPost → talk.md, image1.png, …
//! ```
//!
//! The stages are separated so the interesting logic stays pure:
//!
//! - **Eager validation**: every cell and output is checked against the
//!   typed schema before a single line is emitted. A malformed document
//!   fails with the offending cell printed verbatim and leaves no files
//!   behind.
//! - **Testability**: rendering is a pure function of the notebook and a
//!   timestamp string, so tests assert on exact output without touching
//!   the filesystem or the clock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`notebook`] | Parse stage — nbformat JSON into typed `Cell` and `Output` variants |
//! | [`render`] | Render stage — Jekyll front matter, capture/highlight/include blocks, image numbering |
//! | [`convert`] | Orchestration — path derivation, timestamping, file writes |
//!
//! # Design Decisions
//!
//! ## Fail Fast, Write Nothing
//!
//! The converter targets exactly one notebook dialect. Anything it does not
//! recognize — an unknown `output_type`, a cell missing a field — aborts
//! the whole run rather than being skipped: a silently dropped output is
//! worse than no post. Because rendering completes in memory before any
//! write, an aborted run never leaves a partial post or stray images.
//!
//! ## Explicit Image Numbering
//!
//! Embedded PNGs are written as `image1.png`, `image2.png`, … with a
//! counter threaded through the render, scoped to one run and strictly
//! increasing. Within a run filenames never collide; across runs they
//! deliberately overwrite, since a re-converted post references the same
//! names.

pub mod convert;
pub mod notebook;
pub mod render;
