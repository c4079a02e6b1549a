#![allow(dead_code)]

use image::{Rgb, RgbImage};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Pixel value written at (x, y) of frame `frame` in the red channel.
pub fn red_value(frame: usize, x: u32, y: u32) -> u8 {
    (frame as u32 * 40 + y * 10 + x) as u8
}

/// Write one sequence directory with a frame per entry of `counts`.
///
/// Frames are `width x height` RGB images whose green and blue channels are
/// constant, so only the red channel carries the frame/pixel pattern.
pub fn write_sequence(
    split_dir: &Path,
    name: &str,
    counts: &[usize],
    (width, height): (u32, u32),
    ext: &str,
) -> anyhow::Result<PathBuf> {
    let dir = split_dir.join(name);
    fs::create_dir_all(&dir)?;
    for frame in 0..counts.len() {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([red_value(frame, x, y), 200, 255]);
        }
        img.save(dir.join(format!("{frame:04}.{ext}")))?;
    }
    write_annotation(&dir, counts)?;
    Ok(dir)
}

pub fn write_annotation(dir: &Path, counts: &[usize]) -> anyhow::Result<()> {
    let frames: Vec<_> = counts
        .iter()
        .map(|&n| {
            let boxes: Vec<_> = (0..n).map(|i| json!([i, i, i + 4, i + 4])).collect();
            json!({ "bboxes": boxes, "digits": vec![0; n] })
        })
        .collect();
    fs::write(
        dir.join("annotations.json"),
        serde_json::to_vec_pretty(&frames)?,
    )?;
    Ok(())
}

/// Create `<root>/<split>` with `n` sequences of `counts.len()` frames each.
pub fn write_split(
    root: &Path,
    split: &str,
    n: usize,
    counts: &[usize],
    size: (u32, u32),
) -> anyhow::Result<PathBuf> {
    let split_dir = root.join(split);
    for i in 0..n {
        write_sequence(&split_dir, &format!("{i:05}"), counts, size, "png")?;
    }
    Ok(split_dir)
}
