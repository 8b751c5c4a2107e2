//! Conversion orchestration: parse, render, write.
//!
//! Ties the pipeline together for one notebook. All rendering happens in
//! memory before anything touches disk, so a failed run writes nothing —
//! there is never a partially converted post to clean up.
//!
//! The post lands beside the input (`talk.ipynb` → `talk.md`, overwriting
//! any previous conversion). Images land in the current working directory
//! as `image1.png`, `image2.png`, …, to be moved into the site's public
//! asset directory by the publishing workflow. The counter restarts at 1
//! on every run, so a rerun in the same directory overwrites the previous
//! run's images rather than producing new names.

use crate::notebook::{self, NotebookError};
use crate::render::{self, RenderError, RenderedPost};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Notebook(#[from] NotebookError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files produced by one conversion run.
#[derive(Debug)]
pub struct Outcome {
    pub post_path: PathBuf,
    pub image_paths: Vec<PathBuf>,
}

/// Convert one notebook file into a Jekyll post beside it. Images land in
/// the current working directory.
///
/// The front-matter date is the wall clock at conversion time, not anything
/// recorded in the notebook.
pub fn convert(input: &Path) -> Result<Outcome, ConvertError> {
    convert_with_image_dir(input, Path::new(""))
}

/// Convert one notebook, writing extracted images into `image_dir`.
pub fn convert_with_image_dir(input: &Path, image_dir: &Path) -> Result<Outcome, ConvertError> {
    let notebook = notebook::parse(input)?;
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let post = render::render(&notebook, &timestamp)?;
    write_post(input, image_dir, &post)
}

fn write_post(
    input: &Path,
    image_dir: &Path,
    post: &RenderedPost,
) -> Result<Outcome, ConvertError> {
    let post_path = input.with_extension("md");

    let mut image_paths = Vec::with_capacity(post.images.len());
    for image in &post.images {
        let path = image_dir.join(&image.filename);
        fs::write(&path, &image.bytes)?;
        image_paths.push(path);
    }

    fs::write(&post_path, &post.body)?;

    Ok(Outcome {
        post_path,
        image_paths,
    })
}
