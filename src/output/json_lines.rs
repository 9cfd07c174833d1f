// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/output/json_lines.rs - JSON Lines 结果记录
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! # JSON Lines 结果记录
//!
//! 每帧写入一行 JSON，包含手指总数、每只手的手指状态或错误原因，以及原样透传的关键点。
//! 每帧写入后立即刷新，进程中断时已处理的帧不会丢失。
//!
//! ## URL Scheme
//!
//! `jsonl:///path/to/result.jsonl`

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::{Path, PathBuf},
  sync::Mutex,
};

use chrono::Utc;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  counter::{FrameCount, HandReport},
  input::RecordedFrame,
  output::Render,
  utils::url_file_path,
};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("URI 缺少文件路径: {0}")]
  MissingPath(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("写入器锁已失效")]
  Poisoned,
}

pub struct JsonLinesOutput {
  path: PathBuf,
  writer: Mutex<BufWriter<File>>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch(format!(
        "期望 '{}', 实际为 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    let path =
      url_file_path(url).ok_or_else(|| JsonLinesOutputError::MissingPath(url.to_string()))?;
    Self::create(path)
  }
}

impl JsonLinesOutput {
  pub fn create(path: impl AsRef<Path>) -> Result<Self, JsonLinesOutputError> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;
    info!("结果记录到: {}", path.display());
    Ok(Self {
      path,
      writer: Mutex::new(BufWriter::new(file)),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

fn hand_record(hand: &HandReport) -> Value {
  let mut record = Map::new();
  record.insert(
    "handedness".to_string(),
    hand
      .handedness
      .map(|h| Value::from(h.as_str()))
      .unwrap_or(Value::Null),
  );
  record.insert("count".to_string(), Value::from(hand.count()));
  match &hand.result {
    Ok(state) => {
      record.insert(
        "orientation".to_string(),
        Value::from(state.orientation.as_str()),
      );
      let fingers: Map<String, Value> = state
        .iter()
        .map(|(finger, up)| (finger.as_str().to_string(), Value::from(up)))
        .collect();
      record.insert("fingers".to_string(), Value::Object(fingers));
    }
    Err(e) => {
      record.insert("error".to_string(), Value::from(e.to_string()));
    }
  }
  record.insert(
    "landmarks".to_string(),
    hand
      .landmarks
      .iter()
      .map(|lm| json!([lm.x, lm.y, lm.z]))
      .collect(),
  );
  Value::Object(record)
}

/// 单帧记录
pub fn frame_record(frame: &RecordedFrame, result: &FrameCount) -> Value {
  json!({
    "index": frame.index,
    "timestamp_ms": frame.timestamp_ms,
    "recorded_at": Utc::now().to_rfc3339(),
    "total": result.total,
    "hands": result.hands.iter().map(hand_record).collect::<Vec<_>>(),
  })
}

impl Render<RecordedFrame, FrameCount> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, frame: &RecordedFrame, result: &FrameCount) -> Result<(), Self::Error> {
    let record = frame_record(frame, result);
    let mut writer = self
      .writer
      .lock()
      .map_err(|_| JsonLinesOutputError::Poisoned)?;
    serde_json::to_writer(&mut *writer, &record)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
  }
}
