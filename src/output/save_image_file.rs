// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! # 保存图像文件
//!
//! 在帧对应的原始图像上绘制手部骨架与 `up fingers N`，保存为图像文件。
//! 帧没有图像或图像无法读取时使用纯黑画布。
//!
//! ## URL Scheme
//!
//! `image:///path/to/out.png`
//!
//! ## 参数说明
//!
//! - `font`: TrueType 字体路径，未指定时使用内置的 DejaVu Sans
//! - `width` / `height`: 纯黑画布尺寸，默认 640x480
//! - `flip`: 是否水平翻转，默认 true
//! - `numbered`: 按帧编号生成文件名 `<stem>-<index:06>.<ext>`，否则每帧覆盖同一文件

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  counter::FrameCount,
  input::RecordedFrame,
  output::{
    Render,
    draw::{Draw, DrawError},
  },
  utils::{query_flag, query_param, url_file_path},
};

const DEFAULT_CANVAS: (u32, u32) = (640, 480);

pub struct SaveImageFileOutput {
  path: PathBuf,
  draw: Draw,
  canvas: (u32, u32),
  numbered: bool,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("绘制错误: {0}")]
  DrawError(#[from] DrawError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 缺少文件路径: {0}")]
  MissingPath(String),
  #[error("参数 {name} 无效: {value}")]
  InvalidParameter { name: &'static str, value: String },
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }
    let path =
      url_file_path(uri).ok_or_else(|| SaveImageFileError::MissingPath(uri.to_string()))?;

    let dimension = |name: &'static str, default: u32| {
      query_param::<u32>(uri, name)
        .map_err(|value| SaveImageFileError::InvalidParameter { name, value })
        .map(|v| v.filter(|v| *v > 0).unwrap_or(default))
    };
    let canvas = (
      dimension("width", DEFAULT_CANVAS.0)?,
      dimension("height", DEFAULT_CANVAS.1)?,
    );

    let mut draw = Draw::default().with_flip(query_flag(uri, "flip").unwrap_or(true));
    if let Some((_, font)) = uri.query_pairs().find(|(k, _)| k == "font") {
      draw = draw.with_font_file(font.into_owned())?;
    }

    Ok(SaveImageFileOutput {
      path,
      draw,
      canvas,
      numbered: query_flag(uri, "numbered").unwrap_or(false),
    })
  }
}

impl SaveImageFileOutput {
  fn frame_path(&self, index: u64) -> PathBuf {
    if !self.numbered {
      return self.path.clone();
    }
    let stem = self
      .path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    let ext = self
      .path
      .extension()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_else(|| "png".to_string());
    self.path.with_file_name(format!("{}-{:06}.{}", stem, index, ext))
  }

  fn load_frame_image(&self, frame: &RecordedFrame) -> RgbImage {
    let blank = || RgbImage::new(self.canvas.0, self.canvas.1);
    let Some(path) = &frame.image else {
      return blank();
    };
    match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
      Ok(reader) => match reader.decode() {
        Ok(image) => image.to_rgb8(),
        Err(e) => {
          warn!("帧 {} 图像解码失败, 使用空白画布: {}", frame.index, e);
          blank()
        }
      },
      Err(e) => {
        warn!("帧 {} 图像读取失败, 使用空白画布: {}", frame.index, e);
        blank()
      }
    }
  }

  fn save_image(&self, image: RgbImage, path: &Path) -> Result<(), SaveImageFileError> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(path)?;

    debug!("保存图像到文件: {}", path.display());

    Ok(())
  }
}

impl Render<RecordedFrame, FrameCount> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RecordedFrame, result: &FrameCount) -> Result<(), Self::Error> {
    let image = self.draw.draw_count(self.load_frame_image(frame), result);
    self.save_image(image, &self.frame_path(frame.index))
  }
}
