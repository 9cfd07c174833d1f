// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/input/landmark_stream.rs - JSON Lines 关键点流输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! # 关键点流输入
//!
//! 每行一个 JSON 对象，对应一帧：
//!
//! ```json
//! {"index": 0, "timestamp_ms": 33, "image": "frames/0000.png",
//!  "multi_hand_landmarks": [[{"x": 0.5, "y": 0.4, "z": 0.0}, ...]],
//!  "multi_handedness": [{"label": "Right", "score": 0.97}]}
//! ```
//!
//! 除两个序列外的字段均可省略，缺少 `index` 时按读取顺序编号。空行被跳过，
//! 无法解析的行记录错误后跳过，读取失败时结束输入。
//!
//! ## URL Scheme
//!
//! - `landmarks:///path/to/file.jsonl`：从文件读取
//! - `stdin://`：从标准输入读取，可直接接在外部姿态估计进程之后

use std::{
  fs::File,
  io::{BufRead, BufReader},
  path::PathBuf,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{Classification, RecordedFrame},
  landmark::Landmark,
  utils::url_file_path,
};

#[derive(Error, Debug)]
pub enum LandmarkStreamInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 缺少文件路径: {0}")]
  MissingPath(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct RawFrame {
  #[serde(default)]
  index: Option<u64>,
  #[serde(default)]
  timestamp_ms: Option<u64>,
  #[serde(default)]
  image: Option<PathBuf>,
  #[serde(default)]
  multi_hand_landmarks: Vec<Vec<Landmark>>,
  #[serde(default)]
  multi_handedness: Vec<Classification>,
}

pub struct LandmarkStreamInput {
  reader: Box<dyn BufRead + Send>,
  line_number: usize,
  frame_count: u64,
  buffer: Vec<u8>,
}

impl FromUrlWithScheme for LandmarkStreamInput {
  const SCHEME: &'static str = "landmarks";
}

impl FromUrl for LandmarkStreamInput {
  type Error = LandmarkStreamInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      Self::SCHEME => {
        let path =
          url_file_path(url).ok_or_else(|| LandmarkStreamInputError::MissingPath(url.to_string()))?;
        info!("打开关键点文件: {}", path.display());
        let file = File::open(&path)?;
        Ok(Self::from_reader(BufReader::new(file)))
      }
      Self::STDIN_SCHEME => {
        info!("从标准输入读取关键点");
        Ok(Self::from_reader(BufReader::new(std::io::stdin())))
      }
      other => Err(LandmarkStreamInputError::SchemeMismatch(format!(
        "期望 '{}' 或 '{}', 实际为 '{}'",
        Self::SCHEME,
        Self::STDIN_SCHEME,
        other
      ))),
    }
  }
}

impl LandmarkStreamInput {
  pub const STDIN_SCHEME: &'static str = "stdin";

  pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
    Self {
      reader: Box::new(reader),
      line_number: 0,
      frame_count: 0,
      buffer: Vec::new(),
    }
  }
}

impl Iterator for LandmarkStreamInput {
  type Item = RecordedFrame;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      self.buffer.clear();
      // 按字节读取，非 UTF-8 的行交给解析步骤跳过
      match self.reader.read_until(b'\n', &mut self.buffer) {
        Ok(0) => return None,
        Ok(_) => self.line_number += 1,
        Err(e) => {
          error!("读取关键点失败 (第 {} 行之后): {}", self.line_number, e);
          return None;
        }
      }

      let line = self.buffer.trim_ascii();
      if line.is_empty() {
        continue;
      }

      let raw: RawFrame = match serde_json::from_slice(line) {
        Ok(raw) => raw,
        Err(e) => {
          warn!("第 {} 行无法解析, 已跳过: {}", self.line_number, e);
          continue;
        }
      };

      let index = raw.index.unwrap_or(self.frame_count);
      self.frame_count += 1;
      return Some(RecordedFrame {
        index,
        timestamp_ms: raw.timestamp_ms,
        image: raw.image,
        multi_hand_landmarks: raw.multi_hand_landmarks,
        multi_handedness: raw.multi_handedness,
      });
    }
  }
}
