// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/output/draw.rs - 手部骨架与计数结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use thiserror::Error;

use crate::{
  counter::FrameCount,
  landmark::{CONNECTIVITY, HAND_LANDMARK_COUNT, Landmark},
};

// 文本渲染常量
const DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
const TEXT_FONT_SIZE: f32 = 32.0;
const TEXT_ORIGIN: (i32, i32) = (50, 50); // 文本基线左端
const TEXT_COLOR: [u8; 3] = [255, 0, 0]; // 红色
const BONE_COLOR: [u8; 3] = [0, 255, 0];
const JOINT_COLOR: [u8; 3] = [255, 48, 48];
const JOINT_RADIUS: i32 = 3;

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("字体读取失败: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效")]
  InvalidFont,
}

pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  flip: bool,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: FontArc::try_from_slice(DEFAULT_FONT).ok(),
      font_size: TEXT_FONT_SIZE,
      flip: true,
    }
  }
}

impl Draw {
  /// 以指定字体替换内置的 DejaVu Sans
  pub fn with_font_file(mut self, path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data).map_err(|_| DrawError::InvalidFont)?;
    self.font = Some(font);
    Ok(self)
  }

  /// 只绘制骨架，不叠加文字
  pub fn without_text(mut self) -> Self {
    self.font = None;
    self
  }

  /// 是否在绘制骨架后水平翻转画面，使显示效果与镜子一致
  pub fn with_flip(mut self, flip: bool) -> Self {
    self.flip = flip;
    self
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  fn draw_skeleton(&self, image: &mut RgbImage, landmarks: &[Landmark]) {
    if landmarks.len() != HAND_LANDMARK_COUNT {
      return;
    }
    let (w, h) = (image.width() as f32, image.height() as f32);
    let to_pixel = |lm: &Landmark| (lm.x * w, lm.y * h);

    for (a, b) in CONNECTIVITY {
      let a = to_pixel(&landmarks[*a as usize]);
      let b = to_pixel(&landmarks[*b as usize]);
      draw_line_segment_mut(image, a, b, Rgb(BONE_COLOR));
    }
    for lm in landmarks {
      let (x, y) = to_pixel(lm);
      draw_filled_circle_mut(
        image,
        (x.round() as i32, y.round() as i32),
        JOINT_RADIUS,
        Rgb(JOINT_COLOR),
      );
    }
  }

  fn draw_total(&self, image: &mut RgbImage, total: u32) {
    let Some(font) = &self.font else {
      return;
    };
    let text = format!("up fingers {}", total);
    let (x, baseline) = TEXT_ORIGIN;
    draw_text_mut(
      image,
      Rgb(TEXT_COLOR),
      x,
      baseline - self.font_size as i32,
      PxScale::from(self.font_size),
      font,
      &text,
    );
  }

  /// 绘制骨架、按需翻转并叠加手指总数
  pub fn draw_count(&self, mut image: RgbImage, result: &FrameCount) -> RgbImage {
    for hand in &result.hands {
      self.draw_skeleton(&mut image, &hand.landmarks);
    }
    if self.flip {
      imageops::flip_horizontal_in_place(&mut image);
    }
    self.draw_total(&mut image, result.total);
    image
  }
}
