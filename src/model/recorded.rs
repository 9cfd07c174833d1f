// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/model/recorded.rs - 录制的姿态估计结果
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! # 录制的姿态估计结果
//!
//! 手部关键点由外部模型（如 MediaPipe Hands）离线生成并录制为 JSON Lines，
//! 本模块将录制帧中并列的 `multi_hand_landmarks` 与 `multi_handedness` 按位置配对，
//! 并按检测参数筛选，得到 [`FrameResult`]。
//!
//! ## URL Scheme
//!
//! `recorded://`
//!
//! ## 参数说明
//!
//! - `min_handedness_score`: 左右手分类结果的最低得分，默认 0 即不筛选。
//!   该得分是录制数据中 `multi_handedness[i].score`，与手掌检测置信度无关；
//!   MediaPipe 取得分最高的标签，其得分不低于 0.5
//! - `max_hands`: 每帧最多保留的手数，默认 2
//! - `swap_handedness`: 交换左右手标签。MediaPipe 默认输入为自拍镜像画面，
//!   直接处理摄像头原始画面时标签与实际左右手相反
//!
//! ```no_run
//! use shouzhi::{FromUrl, model::RecordedPosesBuilder};
//! use url::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let url = Url::parse("recorded://?min_handedness_score=0.8&max_hands=2")?;
//! let model = RecordedPosesBuilder::from_url(&url)?.build()?;
//! # Ok(())
//! # }
//! ```

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::RecordedFrame,
  landmark::FrameResult,
  model::Model,
  utils::{query_flag, query_param},
};

const DEFAULT_MIN_HANDEDNESS_SCORE: f32 = 0.0;
const DEFAULT_MAX_HANDS: usize = 2;

#[derive(Error, Debug)]
pub enum RecordedPosesError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数 {name} 无效: {value}")]
  InvalidParameter { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct RecordedPosesBuilder {
  min_handedness_score: f32,
  max_hands: usize,
  swap_handedness: bool,
}

impl Default for RecordedPosesBuilder {
  fn default() -> Self {
    Self {
      min_handedness_score: DEFAULT_MIN_HANDEDNESS_SCORE,
      max_hands: DEFAULT_MAX_HANDS,
      swap_handedness: false,
    }
  }
}

impl FromUrlWithScheme for RecordedPosesBuilder {
  const SCHEME: &'static str = "recorded";
}

impl FromUrl for RecordedPosesBuilder {
  type Error = RecordedPosesError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordedPosesError::SchemeMismatch(format!(
        "模型必须使用 {} 方案, 实际为 {}",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut builder = Self::default();
    if let Some(v) = query_param::<f32>(url, "min_handedness_score").map_err(|value| {
      RecordedPosesError::InvalidParameter {
        name: "min_handedness_score",
        value,
      }
    })? {
      builder = builder.min_handedness_score(v);
    }
    if let Some(v) = query_param::<usize>(url, "max_hands").map_err(|value| {
      RecordedPosesError::InvalidParameter {
        name: "max_hands",
        value,
      }
    })? {
      builder = builder.max_hands(v);
    }
    if let Some(v) = query_flag(url, "swap_handedness") {
      builder = builder.swap_handedness(v);
    }
    Ok(builder)
  }
}

impl RecordedPosesBuilder {
  pub fn min_handedness_score(mut self, min_handedness_score: f32) -> Self {
    self.min_handedness_score = min_handedness_score;
    self
  }

  pub fn max_hands(mut self, max_hands: usize) -> Self {
    self.max_hands = max_hands;
    self
  }

  pub fn swap_handedness(mut self, swap: bool) -> Self {
    self.swap_handedness = swap;
    self
  }

  pub fn build(self) -> Result<RecordedPoses, RecordedPosesError> {
    if !(0.0..=1.0).contains(&self.min_handedness_score) {
      return Err(RecordedPosesError::InvalidParameter {
        name: "min_handedness_score",
        value: self.min_handedness_score.to_string(),
      });
    }
    if self.max_hands == 0 {
      return Err(RecordedPosesError::InvalidParameter {
        name: "max_hands",
        value: self.max_hands.to_string(),
      });
    }

    info!(
      "录制姿态模型: 左右手最低得分 {}, 最多 {} 只手, 交换左右手: {}",
      self.min_handedness_score, self.max_hands, self.swap_handedness
    );
    Ok(RecordedPoses {
      min_handedness_score: self.min_handedness_score,
      max_hands: self.max_hands,
      swap_handedness: self.swap_handedness,
    })
  }
}

#[derive(Debug, Clone)]
pub struct RecordedPoses {
  min_handedness_score: f32,
  max_hands: usize,
  swap_handedness: bool,
}

impl Model for RecordedPoses {
  type Input = RecordedFrame;
  type Output = FrameResult;
  type Error = RecordedPosesError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let labels = input
      .multi_handedness
      .iter()
      .map(|c| {
        let label = if self.swap_handedness {
          c.label.swapped()
        } else {
          c.label
        };
        (label, c.score)
      })
      .collect();
    let paired = FrameResult::from_parallel(input.multi_hand_landmarks.clone(), labels);

    let detected = paired.len();
    let hands: Vec<_> = paired
      .hands
      .into_iter()
      .filter(|hand| match hand.score {
        Some(score) => score >= self.min_handedness_score,
        None => true,
      })
      .take(self.max_hands)
      .collect();

    if hands.len() != detected {
      debug!(
        "帧 {}: 检测到 {} 只手, 保留 {} 只",
        input.index,
        detected,
        hands.len()
      );
    }

    Ok(FrameResult::new(hands))
  }
}
