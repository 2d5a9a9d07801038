//! Frame source over two directories of numbered images.
use super::{Frame, FrameSource};
use crate::error::RegularizeError;
use crate::image::io::{load_gray_image, load_rgb_image};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "tif"];

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, RegularizeError> {
    let entries = fs::read_dir(dir).map_err(|e| RegularizeError::Io {
        path: dir.to_path_buf(),
        reason: format!("failed to list directory: {e}"),
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Yields frames by pairing the sorted image files of an RGB directory with
/// those of a depth directory.
#[derive(Debug)]
pub struct DirectoryFrameSource {
    pairs: Vec<(PathBuf, PathBuf)>,
    next: usize,
    end: usize,
}

impl DirectoryFrameSource {
    pub fn new(rgb_dir: &Path, depth_dir: &Path) -> Result<Self, RegularizeError> {
        let rgb = list_images(rgb_dir)?;
        let depth = list_images(depth_dir)?;
        if rgb.len() != depth.len() {
            warn!(
                "{} rgb frames but {} depth frames; using the first {}",
                rgb.len(),
                depth.len(),
                rgb.len().min(depth.len())
            );
        }
        let pairs: Vec<_> = rgb.into_iter().zip(depth).collect();
        debug!("frame source: {} frame pairs", pairs.len());
        Ok(Self {
            end: pairs.len(),
            pairs,
            next: 0,
        })
    }

    /// Restrict the source to `max_frames` frames starting at `start`.
    pub fn with_window(mut self, start: usize, max_frames: Option<usize>) -> Self {
        self.next = start.min(self.pairs.len());
        self.end = match max_frames {
            Some(n) => self.next.saturating_add(n).min(self.pairs.len()),
            None => self.pairs.len(),
        };
        self
    }

    pub fn remaining(&self) -> usize {
        self.end - self.next
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, RegularizeError> {
        if self.next >= self.end {
            return Ok(None);
        }
        let index = self.next;
        let (rgb_path, depth_path) = &self.pairs[index];
        let read_err = |e: RegularizeError| RegularizeError::FrameRead {
            frame: index,
            reason: e.to_string(),
        };
        let rgb = load_rgb_image(rgb_path).map_err(read_err)?;
        let depth = load_gray_image(depth_path).map_err(read_err)?;
        self.next += 1;
        Ok(Some(Frame { index, rgb, depth }))
    }
}
