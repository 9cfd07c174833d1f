// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/model.rs - 模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

/// 推理步骤
///
/// 姿态估计模型（帧 → [`FrameResult`](crate::landmark::FrameResult)）与手指计数器
/// （[`FrameResult`](crate::landmark::FrameResult) → [`FrameCount`](crate::counter::FrameCount)）
/// 都实现该 trait，由 [`Task`](crate::task::Task) 串接。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

mod recorded;
pub use self::recorded::{RecordedPoses, RecordedPosesBuilder, RecordedPosesError};
