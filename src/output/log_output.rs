// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/output/log_output.rs - 日志输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::convert::Infallible;

use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  counter::{Finger, FrameCount},
  input::RecordedFrame,
  output::Render,
};

/// 将每帧的计数结果写入日志，`log://`
#[derive(Debug, Default)]
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = Infallible;

  fn from_url(_url: &Url) -> Result<Self, Self::Error> {
    Ok(LogOutput)
  }
}

/// 形如 `TIMRP` 的手指状态，伸出为大写字母，收起为 `-`
pub fn finger_mask(fingers: impl Iterator<Item = (Finger, bool)>) -> String {
  fingers
    .map(|(finger, up)| match (finger, up) {
      (_, false) => '-',
      (Finger::Thumb, true) => 'T',
      (Finger::Index, true) => 'I',
      (Finger::Middle, true) => 'M',
      (Finger::Ring, true) => 'R',
      (Finger::Pinky, true) => 'P',
    })
    .collect()
}

impl Render<RecordedFrame, FrameCount> for LogOutput {
  type Error = Infallible;

  fn render_result(&self, frame: &RecordedFrame, result: &FrameCount) -> Result<(), Self::Error> {
    info!(
      "帧 {}: up fingers {} ({} 只手)",
      frame.index,
      result.total,
      result.hands.len()
    );
    for (i, hand) in result.hands.iter().enumerate() {
      match &hand.result {
        Ok(state) => debug!(
          "  手 {} {:?} {}: {}",
          i,
          hand.handedness,
          state.orientation.as_str(),
          finger_mask(state.iter())
        ),
        Err(e) => debug!("  手 {}: {}", i, e),
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mask_marks_extended_fingers() {
    let fingers = Finger::ALL.into_iter().zip([true, false, true, false, true]);
    assert_eq!(finger_mask(fingers), "T-M-P");
  }
}
