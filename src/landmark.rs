// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/landmark.rs - 手部关键点数据定义
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

//! # 手部关键点
//!
//! 姿态估计模型输出的每只手由 21 个归一化关键点组成，坐标范围为 `[0, 1]`，
//! 索引含义固定：
//!
//! - `0`: 手腕
//! - `4, 8, 12, 16, 20`: 拇指、食指、中指、无名指、小指指尖
//! - `3`: 拇指指间关节（拇指的参考关节）
//! - `6, 10, 14, 18`: 四指的近端指间关节（各指的参考关节）
//!
//! 模型给出的原始结果为 [`DetectedHand`]，其中左右手标签与关键点数量都未经校验；
//! 通过 [`DetectedHand::validate`] 得到满足约束的 [`Hand`]。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 每只手的关键点数量
pub const HAND_LANDMARK_COUNT: usize = 21;

/// 归一化坐标的单个关键点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
  pub x: f32,
  pub y: f32,
  #[serde(default)]
  pub z: f32,
}

impl Landmark {
  pub const fn new(x: f32, y: f32, z: f32) -> Self {
    Self { x, y, z }
  }

  /// 以 `x = 0.5` 为轴水平镜像
  pub fn mirror_x(self) -> Self {
    Self {
      x: 1.0 - self.x,
      ..self
    }
  }
}

/// 左右手
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
  Left,
  Right,
}

impl Handedness {
  pub fn swapped(self) -> Self {
    match self {
      Handedness::Left => Handedness::Right,
      Handedness::Right => Handedness::Left,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Handedness::Left => "Left",
      Handedness::Right => "Right",
    }
  }
}

/// 关键点名称
///
/// - **CMC**: 腕掌关节，拇指最靠近手腕的关节
/// - **MCP**: 掌指关节
/// - **IP**: 拇指指间关节
/// - **PIP** / **DIP**: 近端 / 远端指间关节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
  Wrist,
  ThumbCmc,
  ThumbMcp,
  ThumbIp,
  ThumbTip,
  IndexFingerMcp,
  IndexFingerPip,
  IndexFingerDip,
  IndexFingerTip,
  MiddleFingerMcp,
  MiddleFingerPip,
  MiddleFingerDip,
  MiddleFingerTip,
  RingFingerMcp,
  RingFingerPip,
  RingFingerDip,
  RingFingerTip,
  PinkyMcp,
  PinkyPip,
  PinkyDip,
  PinkyTip,
}

/// 手部骨架连线，供可视化使用
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
  use LandmarkIdx::*;
  &[
    // 手掌
    (Wrist, ThumbCmc),
    (ThumbCmc, IndexFingerMcp),
    (IndexFingerMcp, MiddleFingerMcp),
    (MiddleFingerMcp, RingFingerMcp),
    (RingFingerMcp, PinkyMcp),
    (PinkyMcp, Wrist),
    // 拇指
    (ThumbCmc, ThumbMcp),
    (ThumbMcp, ThumbIp),
    (ThumbIp, ThumbTip),
    // 食指
    (IndexFingerMcp, IndexFingerPip),
    (IndexFingerPip, IndexFingerDip),
    (IndexFingerDip, IndexFingerTip),
    // 中指
    (MiddleFingerMcp, MiddleFingerPip),
    (MiddleFingerPip, MiddleFingerDip),
    (MiddleFingerDip, MiddleFingerTip),
    // 无名指
    (RingFingerMcp, RingFingerPip),
    (RingFingerPip, RingFingerDip),
    (RingFingerDip, RingFingerTip),
    // 小指
    (PinkyMcp, PinkyPip),
    (PinkyPip, PinkyDip),
    (PinkyDip, PinkyTip),
  ]
};

/// 恰好 21 个关键点的手
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks([Landmark; HAND_LANDMARK_COUNT]);

impl HandLandmarks {
  pub fn new(landmarks: [Landmark; HAND_LANDMARK_COUNT]) -> Self {
    Self(landmarks)
  }

  #[inline]
  pub fn get(&self, idx: LandmarkIdx) -> Landmark {
    self.0[idx as usize]
  }

  pub fn as_slice(&self) -> &[Landmark] {
    &self.0
  }

  pub fn mirror_x(&self) -> Self {
    Self(self.0.map(Landmark::mirror_x))
  }
}

impl TryFrom<&[Landmark]> for HandLandmarks {
  type Error = HandError;

  fn try_from(landmarks: &[Landmark]) -> Result<Self, Self::Error> {
    let found = landmarks.len();
    if found < HAND_LANDMARK_COUNT {
      return Err(HandError::MissingLandmarks { found });
    }
    let array: [Landmark; HAND_LANDMARK_COUNT] = landmarks
      .try_into()
      .map_err(|_| HandError::ExtraLandmarks { found })?;
    Ok(Self(array))
  }
}

/// 单只手的分类错误，只影响该手，不会中止整帧
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandError {
  #[error("关键点缺失: 期望 21 个, 实际 {found} 个")]
  MissingLandmarks { found: usize },
  #[error("关键点过多: 期望 21 个, 实际 {found} 个")]
  ExtraLandmarks { found: usize },
  #[error("缺少左右手标签")]
  MissingHandedness,
}

/// 通过校验的手
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hand {
  pub handedness: Handedness,
  pub landmarks: HandLandmarks,
}

/// 姿态估计模型给出的原始手部结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedHand {
  pub handedness: Option<Handedness>,
  /// 左右手分类置信度
  pub score: Option<f32>,
  pub landmarks: Vec<Landmark>,
}

impl DetectedHand {
  pub fn new(handedness: Handedness, landmarks: Vec<Landmark>) -> Self {
    Self {
      handedness: Some(handedness),
      score: None,
      landmarks,
    }
  }

  /// 关键点数量先于标签检查
  pub fn validate(&self) -> Result<Hand, HandError> {
    let landmarks = HandLandmarks::try_from(self.landmarks.as_slice())?;
    let handedness = self.handedness.ok_or(HandError::MissingHandedness)?;
    Ok(Hand {
      handedness,
      landmarks,
    })
  }
}

/// 单帧中检测到的全部手
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameResult {
  pub hands: Vec<DetectedHand>,
}

impl FrameResult {
  pub fn new(hands: Vec<DetectedHand>) -> Self {
    Self { hands }
  }

  /// 按位置将关键点序列与左右手标签配对
  ///
  /// 两个序列长度不一致时，多出的关键点得到空标签，多出的标签得到空关键点，
  /// 由后续校验拒绝。
  pub fn from_parallel(
    landmarks: Vec<Vec<Landmark>>,
    handedness: Vec<(Handedness, Option<f32>)>,
  ) -> Self {
    let len = landmarks.len().max(handedness.len());
    let mut landmarks = landmarks.into_iter();
    let mut handedness = handedness.into_iter();
    let hands = (0..len)
      .map(|_| {
        let label = handedness.next();
        DetectedHand {
          handedness: label.map(|(h, _)| h),
          score: label.and_then(|(_, s)| s),
          landmarks: landmarks.next().unwrap_or_default(),
        }
      })
      .collect();
    Self { hands }
  }

  pub fn len(&self) -> usize {
    self.hands.len()
  }

  pub fn is_empty(&self) -> bool {
    self.hands.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn points(n: usize) -> Vec<Landmark> {
    (0..n)
      .map(|i| Landmark::new(i as f32 / 32.0, 0.5, 0.0))
      .collect()
  }

  #[test]
  fn landmark_index_semantics() {
    assert_eq!(LandmarkIdx::Wrist as usize, 0);
    assert_eq!(LandmarkIdx::ThumbIp as usize, 3);
    assert_eq!(LandmarkIdx::ThumbTip as usize, 4);
    assert_eq!(LandmarkIdx::IndexFingerPip as usize, 6);
    assert_eq!(LandmarkIdx::IndexFingerTip as usize, 8);
    assert_eq!(LandmarkIdx::MiddleFingerPip as usize, 10);
    assert_eq!(LandmarkIdx::MiddleFingerTip as usize, 12);
    assert_eq!(LandmarkIdx::RingFingerPip as usize, 14);
    assert_eq!(LandmarkIdx::RingFingerTip as usize, 16);
    assert_eq!(LandmarkIdx::PinkyPip as usize, 18);
    assert_eq!(LandmarkIdx::PinkyTip as usize, 20);
  }

  #[test]
  fn validate_landmark_count() {
    let short = DetectedHand::new(Handedness::Left, points(20));
    assert_eq!(
      short.validate(),
      Err(HandError::MissingLandmarks { found: 20 })
    );

    let long = DetectedHand::new(Handedness::Left, points(22));
    assert_eq!(long.validate(), Err(HandError::ExtraLandmarks { found: 22 }));

    let hand = DetectedHand::new(Handedness::Right, points(21))
      .validate()
      .unwrap();
    assert_eq!(hand.handedness, Handedness::Right);
    assert_eq!(hand.landmarks.get(LandmarkIdx::PinkyTip).x, 20.0 / 32.0);
  }

  #[test]
  fn validate_missing_handedness() {
    let hand = DetectedHand {
      handedness: None,
      score: None,
      landmarks: points(21),
    };
    assert_eq!(hand.validate(), Err(HandError::MissingHandedness));
  }

  #[test]
  fn parallel_sequences_are_paired_by_position() {
    let frame = FrameResult::from_parallel(
      vec![points(21), points(21), points(21)],
      vec![(Handedness::Left, Some(0.9)), (Handedness::Right, None)],
    );
    assert_eq!(frame.len(), 3);
    assert_eq!(frame.hands[0].handedness, Some(Handedness::Left));
    assert_eq!(frame.hands[0].score, Some(0.9));
    assert_eq!(frame.hands[1].handedness, Some(Handedness::Right));
    assert_eq!(frame.hands[2].validate(), Err(HandError::MissingHandedness));

    let frame = FrameResult::from_parallel(vec![], vec![(Handedness::Left, None)]);
    assert_eq!(
      frame.hands[0].validate(),
      Err(HandError::MissingLandmarks { found: 0 })
    );
  }

  #[test]
  fn mirror_keeps_y_and_z() {
    let lm = Landmark::new(0.25, 0.4, -0.1).mirror_x();
    assert_eq!(lm, Landmark::new(0.75, 0.4, -0.1));
  }
}
