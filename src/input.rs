// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/input.rs - 关键点输入
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

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  landmark::{Handedness, Landmark},
};

mod landmark_stream;
pub use self::landmark_stream::{LandmarkStreamInput, LandmarkStreamInputError};

/// 单个左右手分类结果
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Classification {
  pub label: Handedness,
  #[serde(default)]
  pub score: Option<f32>,
}

/// 录制的一帧姿态估计结果
///
/// 字段布局与 MediaPipe Hands 的输出一致：关键点与左右手分类是两个按位置对应的序列。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedFrame {
  pub index: u64,
  pub timestamp_ms: Option<u64>,
  /// 该帧对应的原始图像，供可视化输出使用
  pub image: Option<PathBuf>,
  pub multi_hand_landmarks: Vec<Vec<Landmark>>,
  pub multi_handedness: Vec<Classification>,
}

#[derive(Error, Debug)]
pub enum InputError {
  #[error("关键点流输入错误: {0}")]
  LandmarkStreamInputError(#[from] LandmarkStreamInputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  LandmarkStream(LandmarkStreamInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let scheme = url.scheme();
    if scheme == LandmarkStreamInput::SCHEME || scheme == LandmarkStreamInput::STDIN_SCHEME {
      let input = LandmarkStreamInput::from_url(url)?;
      return Ok(InputWrapper::LandmarkStream(input));
    }
    Err(InputError::SchemeMismatch(scheme.to_string()))
  }
}

impl Iterator for InputWrapper {
  type Item = RecordedFrame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::LandmarkStream(input) => input.next(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dispatches_by_scheme() {
    let path = std::env::temp_dir().join(format!("shouzhi-input-{}.jsonl", std::process::id()));
    std::fs::write(&path, "{\"index\": 4}\n{\"index\": 5}\n").unwrap();
    let url = Url::parse(&format!("landmarks://{}", path.display())).unwrap();

    let input = InputWrapper::from_url(&url);
    let _ = std::fs::remove_file(&path);
    let indices: Vec<_> = input.unwrap().map(|frame| frame.index).collect();
    assert_eq!(indices, vec![4, 5]);

    let stdin = InputWrapper::from_url(&Url::parse("stdin://").unwrap());
    assert!(matches!(stdin, Ok(InputWrapper::LandmarkStream(_))));

    let other = InputWrapper::from_url(&Url::parse("rtsp://camera/stream").unwrap());
    assert!(matches!(other, Err(InputError::SchemeMismatch(s)) if s == "rtsp"));
  }
}
