// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/counter.rs - 手指计数
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

//! # 手指计数
//!
//! 根据单帧的手部关键点判断每根手指是否伸出，并统计整帧伸出的手指总数。
//!
//! 1. 手的朝向：食指指尖 `x` 小于小指指尖 `x` 为 [`Orientation::Canonical`]，否则为
//!    [`Orientation::Mirrored`]。
//! 2. 拇指：只比较指尖（4）与指间关节（3）的 `x`，方向由左右手与朝向共同决定，
//!    见 [`thumb_rule`]。
//! 3. 其余四指：指尖 `y` 小于参考关节 `y` 即为伸出。
//! 4. 每只手最多 5 根，整帧为所有手之和；无法校验的手计 0 根。
//!
//! 所有比较均为严格比较，相等时视为未伸出。计算不保留跨帧状态。

use std::convert::Infallible;

use tracing::{debug, warn};

use crate::{
  landmark::{
    DetectedHand, FrameResult, Hand, HandError, HandLandmarks, Handedness, Landmark, LandmarkIdx,
  },
  model::Model,
};

/// 手的朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
  Canonical,
  Mirrored,
}

impl Orientation {
  pub fn of(landmarks: &HandLandmarks) -> Self {
    let index_tip = landmarks.get(LandmarkIdx::IndexFingerTip);
    let pinky_tip = landmarks.get(LandmarkIdx::PinkyTip);
    if index_tip.x < pinky_tip.x {
      Orientation::Canonical
    } else {
      Orientation::Mirrored
    }
  }

  pub fn flipped(self) -> Self {
    match self {
      Orientation::Canonical => Orientation::Mirrored,
      Orientation::Mirrored => Orientation::Canonical,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Orientation::Canonical => "canonical",
      Orientation::Mirrored => "mirrored",
    }
  }
}

/// 拇指伸出时指尖相对指间关节的水平方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbRule {
  /// `tip.x < joint.x`
  TipLeftOfJoint,
  /// `tip.x > joint.x`
  TipRightOfJoint,
}

impl ThumbRule {
  #[inline]
  pub fn holds(self, tip: Landmark, joint: Landmark) -> bool {
    match self {
      ThumbRule::TipLeftOfJoint => tip.x < joint.x,
      ThumbRule::TipRightOfJoint => tip.x > joint.x,
    }
  }
}

// 行: Left, Right；列: Canonical, Mirrored
const THUMB_RULES: [[ThumbRule; 2]; 2] = [
  [ThumbRule::TipLeftOfJoint, ThumbRule::TipRightOfJoint],
  [ThumbRule::TipRightOfJoint, ThumbRule::TipLeftOfJoint],
];

/// 查表得到拇指判定方向
pub fn thumb_rule(handedness: Handedness, orientation: Orientation) -> ThumbRule {
  let row = match handedness {
    Handedness::Left => 0,
    Handedness::Right => 1,
  };
  let col = match orientation {
    Orientation::Canonical => 0,
    Orientation::Mirrored => 1,
  };
  THUMB_RULES[row][col]
}

pub fn thumb_extended(
  handedness: Handedness,
  orientation: Orientation,
  tip: Landmark,
  joint: Landmark,
) -> bool {
  thumb_rule(handedness, orientation).holds(tip, joint)
}

/// 非拇指手指：指尖高于参考关节（`y` 更小）即伸出
#[inline]
pub fn finger_extended(tip: Landmark, joint: Landmark) -> bool {
  tip.y < joint.y
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
  Thumb,
  Index,
  Middle,
  Ring,
  Pinky,
}

impl Finger {
  pub const ALL: [Finger; 5] = [
    Finger::Thumb,
    Finger::Index,
    Finger::Middle,
    Finger::Ring,
    Finger::Pinky,
  ];

  pub fn tip(self) -> LandmarkIdx {
    match self {
      Finger::Thumb => LandmarkIdx::ThumbTip,
      Finger::Index => LandmarkIdx::IndexFingerTip,
      Finger::Middle => LandmarkIdx::MiddleFingerTip,
      Finger::Ring => LandmarkIdx::RingFingerTip,
      Finger::Pinky => LandmarkIdx::PinkyTip,
    }
  }

  /// 判定伸出时使用的参考关节
  pub fn joint(self) -> LandmarkIdx {
    match self {
      Finger::Thumb => LandmarkIdx::ThumbIp,
      Finger::Index => LandmarkIdx::IndexFingerPip,
      Finger::Middle => LandmarkIdx::MiddleFingerPip,
      Finger::Ring => LandmarkIdx::RingFingerPip,
      Finger::Pinky => LandmarkIdx::PinkyPip,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Finger::Thumb => "thumb",
      Finger::Index => "index",
      Finger::Middle => "middle",
      Finger::Ring => "ring",
      Finger::Pinky => "pinky",
    }
  }
}

/// 单只手的手指状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerState {
  pub orientation: Orientation,
  extended: [bool; 5],
}

impl FingerState {
  pub fn is_extended(&self, finger: Finger) -> bool {
    self.extended[finger as usize]
  }

  pub fn count(&self) -> u32 {
    self.extended.iter().filter(|e| **e).count() as u32
  }

  pub fn iter(&self) -> impl Iterator<Item = (Finger, bool)> + '_ {
    Finger::ALL.into_iter().zip(self.extended.iter().copied())
  }
}

pub fn classify_hand(hand: &Hand) -> FingerState {
  let landmarks = &hand.landmarks;
  let orientation = Orientation::of(landmarks);
  let extended = Finger::ALL.map(|finger| {
    let tip = landmarks.get(finger.tip());
    let joint = landmarks.get(finger.joint());
    match finger {
      Finger::Thumb => thumb_extended(hand.handedness, orientation, tip, joint),
      _ => finger_extended(tip, joint),
    }
  });
  FingerState {
    orientation,
    extended,
  }
}

/// 单只手的计数结果，关键点原样保留供绘制骨架
#[derive(Debug, Clone, PartialEq)]
pub struct HandReport {
  pub handedness: Option<Handedness>,
  pub landmarks: Vec<Landmark>,
  pub result: Result<FingerState, HandError>,
}

impl HandReport {
  pub fn count(&self) -> u32 {
    self.result.as_ref().map(FingerState::count).unwrap_or(0)
  }
}

/// 整帧的计数结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameCount {
  pub hands: Vec<HandReport>,
  pub total: u32,
}

impl FrameCount {
  pub fn rejected(&self) -> usize {
    self.hands.iter().filter(|h| h.result.is_err()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.hands.is_empty()
  }
}

pub fn classify_frame(frame: &FrameResult) -> FrameCount {
  let hands: Vec<HandReport> = frame
    .hands
    .iter()
    .map(|hand: &DetectedHand| HandReport {
      handedness: hand.handedness,
      landmarks: hand.landmarks.clone(),
      result: hand.validate().map(|hand| classify_hand(&hand)),
    })
    .collect();
  let total = hands.iter().map(HandReport::count).sum();
  FrameCount { hands, total }
}

/// 整帧伸出的手指总数
pub fn count_frame(frame: &FrameResult) -> u32 {
  classify_frame(frame).total
}

/// 以 [`Model`] 形式提供的计数器，可直接串接在姿态估计模型之后
#[derive(Debug, Default, Clone, Copy)]
pub struct FingerCounter;

impl Model for FingerCounter {
  type Input = FrameResult;
  type Output = FrameCount;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let count = classify_frame(input);
    for (i, hand) in count.hands.iter().enumerate() {
      match &hand.result {
        Ok(state) => debug!(
          "手 {} ({:?}, {}): {} 根手指",
          i,
          hand.handedness,
          state.orientation.as_str(),
          state.count()
        ),
        Err(e) => warn!("手 {} 无法计数, 已跳过: {}", i, e),
      }
    }
    Ok(count)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::landmark::HAND_LANDMARK_COUNT;

  /// 构造一只手：`thumb` 为 (指尖 x, 关节 x)，`fingers` 为四指是否伸出
  pub(crate) fn make_hand(
    orientation: Orientation,
    thumb: (f32, f32),
    fingers: [bool; 4],
  ) -> Vec<Landmark> {
    let mut lms = vec![Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT];
    let (index_x, pinky_x) = match orientation {
      Orientation::Canonical => (0.375, 0.625),
      Orientation::Mirrored => (0.625, 0.375),
    };
    lms[LandmarkIdx::ThumbTip as usize].x = thumb.0;
    lms[LandmarkIdx::ThumbIp as usize].x = thumb.1;
    for (finger, up) in Finger::ALL[1..].iter().zip(fingers) {
      let tip = &mut lms[finger.tip() as usize];
      tip.y = if up { 0.25 } else { 0.75 };
      lms[finger.joint() as usize].y = 0.5;
    }
    lms[LandmarkIdx::IndexFingerTip as usize].x = index_x;
    lms[LandmarkIdx::PinkyTip as usize].x = pinky_x;
    lms
  }

  fn validated(handedness: Handedness, lms: Vec<Landmark>) -> Hand {
    DetectedHand::new(handedness, lms).validate().unwrap()
  }

  #[test]
  fn orientation_from_index_and_pinky() {
    let hand = validated(
      Handedness::Left,
      make_hand(Orientation::Canonical, (0.5, 0.5), [false; 4]),
    );
    assert_eq!(Orientation::of(&hand.landmarks), Orientation::Canonical);

    let hand = validated(
      Handedness::Left,
      make_hand(Orientation::Mirrored, (0.5, 0.5), [false; 4]),
    );
    assert_eq!(Orientation::of(&hand.landmarks), Orientation::Mirrored);

    // 相等时视为 Mirrored
    let mut lms = make_hand(Orientation::Canonical, (0.5, 0.5), [false; 4]);
    lms[LandmarkIdx::PinkyTip as usize].x = lms[LandmarkIdx::IndexFingerTip as usize].x;
    let hand = validated(Handedness::Left, lms);
    assert_eq!(Orientation::of(&hand.landmarks), Orientation::Mirrored);
  }

  #[test]
  fn thumb_rule_table() {
    use Handedness::*;
    use Orientation::*;
    assert_eq!(thumb_rule(Right, Mirrored), ThumbRule::TipLeftOfJoint);
    assert_eq!(thumb_rule(Right, Canonical), ThumbRule::TipRightOfJoint);
    assert_eq!(thumb_rule(Left, Mirrored), ThumbRule::TipRightOfJoint);
    assert_eq!(thumb_rule(Left, Canonical), ThumbRule::TipLeftOfJoint);
  }

  #[test]
  fn thumb_each_case_is_distinct() {
    use Handedness::*;
    use Orientation::*;
    let left_of = (Landmark::new(0.25, 0.5, 0.0), Landmark::new(0.5, 0.5, 0.0));
    let right_of = (Landmark::new(0.75, 0.5, 0.0), Landmark::new(0.5, 0.5, 0.0));

    for (h, o, expect_left) in [
      (Right, Mirrored, true),
      (Right, Canonical, false),
      (Left, Mirrored, false),
      (Left, Canonical, true),
    ] {
      assert_eq!(thumb_extended(h, o, left_of.0, left_of.1), expect_left);
      assert_eq!(thumb_extended(h, o, right_of.0, right_of.1), !expect_left);
    }
  }

  #[test]
  fn ties_are_retracted() {
    let a = Landmark::new(0.5, 0.5, 0.0);
    for h in [Handedness::Left, Handedness::Right] {
      for o in [Orientation::Canonical, Orientation::Mirrored] {
        assert!(!thumb_extended(h, o, a, a));
      }
    }
    assert!(!finger_extended(a, a));

    let hand = validated(
      Handedness::Right,
      make_hand(Orientation::Canonical, (0.5, 0.5), [false; 4]),
    );
    let mut lms = hand.landmarks.as_slice().to_vec();
    for finger in &Finger::ALL[1..] {
      lms[finger.tip() as usize].y = 0.5;
    }
    let state = classify_hand(&validated(Handedness::Right, lms));
    assert_eq!(state.count(), 0);
  }

  #[test]
  fn scenario_right_canonical_thumb_extended() {
    let hand = validated(
      Handedness::Right,
      make_hand(Orientation::Canonical, (0.70, 0.50), [false; 4]),
    );
    let state = classify_hand(&hand);
    assert_eq!(state.orientation, Orientation::Canonical);
    assert!(state.is_extended(Finger::Thumb));
    assert_eq!(state.count(), 1);
  }

  #[test]
  fn scenario_index_extended() {
    let mut lms = make_hand(Orientation::Canonical, (0.70, 0.50), [false; 4]);
    lms[LandmarkIdx::IndexFingerTip as usize].y = 0.20;
    lms[LandmarkIdx::IndexFingerPip as usize].y = 0.40;
    let state = classify_hand(&validated(Handedness::Right, lms));
    assert!(state.is_extended(Finger::Index));
    assert!(!state.is_extended(Finger::Middle));
    assert_eq!(state.count(), 2);
  }

  #[test]
  fn scenario_left_mirrored_thumb_retracted() {
    let hand = validated(
      Handedness::Left,
      make_hand(Orientation::Mirrored, (0.30, 0.50), [false; 4]),
    );
    let state = classify_hand(&hand);
    assert_eq!(state.orientation, Orientation::Mirrored);
    assert!(!state.is_extended(Finger::Thumb));
  }

  #[test]
  fn scenario_no_hands() {
    assert_eq!(count_frame(&FrameResult::default()), 0);
    let count = FingerCounter.infer(&FrameResult::default()).unwrap();
    assert!(count.is_empty());
    assert_eq!(count.total, 0);
  }

  #[test]
  fn scenario_two_hands_three_each() {
    let frame = FrameResult::new(vec![
      DetectedHand::new(
        Handedness::Right,
        make_hand(Orientation::Canonical, (0.75, 0.5), [true, true, false, false]),
      ),
      DetectedHand::new(
        Handedness::Left,
        make_hand(Orientation::Mirrored, (0.25, 0.5), [true, true, true, false]),
      ),
    ]);
    let count = classify_frame(&frame);
    assert_eq!(count.hands[0].count(), 3);
    assert_eq!(count.hands[1].count(), 3);
    assert_eq!(count.total, 6);
  }

  #[test]
  fn malformed_hand_does_not_suppress_others() {
    let frame = FrameResult::new(vec![
      DetectedHand::new(Handedness::Right, vec![Landmark::default(); 12]),
      DetectedHand::new(
        Handedness::Right,
        make_hand(Orientation::Canonical, (0.75, 0.5), [true; 4]),
      ),
      DetectedHand {
        handedness: None,
        score: None,
        landmarks: make_hand(Orientation::Canonical, (0.75, 0.5), [true; 4]),
      },
    ]);
    let count = FingerCounter.infer(&frame).unwrap();
    assert_eq!(count.total, 5);
    assert_eq!(count.rejected(), 2);
    assert_eq!(
      count.hands[0].result,
      Err(HandError::MissingLandmarks { found: 12 })
    );
    assert_eq!(count.hands[2].result, Err(HandError::MissingHandedness));
    assert_eq!(count.hands[2].landmarks.len(), HAND_LANDMARK_COUNT);
  }

  // 简单的线性同余生成器，保证测试可复现
  struct Lcg(u64);

  impl Lcg {
    fn next_unit(&mut self) -> f32 {
      self.0 = self
        .0
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
      // 取 1/64 的整数倍，镜像后不会因舍入产生相等
      ((self.0 >> 33) % 64) as f32 / 64.0
    }
  }

  fn random_hand(rng: &mut Lcg) -> Vec<Landmark> {
    (0..HAND_LANDMARK_COUNT)
      .map(|_| Landmark::new(rng.next_unit(), rng.next_unit(), rng.next_unit()))
      .collect()
  }

  #[test]
  fn total_is_bounded_and_deterministic() {
    let mut rng = Lcg(7);
    for n in 0..6 {
      let hands = (0..n)
        .map(|i| {
          let h = if i % 2 == 0 {
            Handedness::Left
          } else {
            Handedness::Right
          };
          DetectedHand::new(h, random_hand(&mut rng))
        })
        .collect();
      let frame = FrameResult::new(hands);
      let total = count_frame(&frame);
      assert!(total <= 5 * n as u32);
      assert_eq!(total, count_frame(&frame.clone()));
    }
  }

  #[test]
  fn mirroring_preserves_thumb_decision() {
    let mut rng = Lcg(42);
    for _ in 0..256 {
      let lms = random_hand(&mut rng);
      for handedness in [Handedness::Left, Handedness::Right] {
        let hand = validated(handedness, lms.clone());
        let mirrored = Hand {
          handedness,
          landmarks: hand.landmarks.mirror_x(),
        };
        let orientation = Orientation::of(&hand.landmarks);
        let tip = LandmarkIdx::ThumbTip;
        let joint = LandmarkIdx::ThumbIp;
        let original = thumb_extended(
          handedness,
          orientation,
          hand.landmarks.get(tip),
          hand.landmarks.get(joint),
        );
        let flipped = thumb_extended(
          handedness,
          orientation.flipped(),
          mirrored.landmarks.get(tip),
          mirrored.landmarks.get(joint),
        );
        assert_eq!(original, flipped);
      }
    }
  }
}
