// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/task.rs - 任务循环
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

//! 输入源、姿态估计模型与输出在任务开始前创建，所有权移交给任务，
//! 任务返回时（无论成功或出错）随之释放。

use std::{
  sync::mpsc::{Receiver, channel},
  thread,
  time::{Duration, Instant},
};

use tracing::{info, warn};

use crate::{
  counter::{FingerCounter, FrameCount},
  landmark::FrameResult,
  model::Model,
  output::Render,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<TaskSummary, Self::Error>;
}

/// 任务统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
  /// 已处理帧数
  pub frames: usize,
  /// 所有帧的手指数之和
  pub fingers: u64,
  /// 无法计数而被跳过的手
  pub rejected_hands: usize,
}

impl TaskSummary {
  fn record(&mut self, count: &FrameCount) {
    self.frames += 1;
    self.fingers += u64::from(count.total);
    self.rejected_hands += count.rejected();
  }

  fn log(&self) {
    info!(
      "共处理 {} 帧, 手指总计 {}, 跳过 {} 只手",
      self.frames, self.fingers, self.rejected_hands
    );
  }
}

fn process_frame<F, M, O>(frame: &F, model: &M, output: &O) -> anyhow::Result<FrameCount>
where
  M: Model<Input = F, Output = FrameResult>,
  M::Error: std::error::Error + Sync + Send + 'static,
  O: Render<F, FrameCount>,
  O::Error: std::error::Error + Sync + Send + 'static,
{
  let hands = model.infer(frame)?;
  let count = FingerCounter.infer(&hands)?;
  output.render_result(frame, &count)?;
  Ok(count)
}

pub struct OneShotTask;

impl<
  F,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = FrameResult, Error = ME>,
  O: Render<F, FrameCount, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始计数...");
    let now = Instant::now();
    let count = process_frame(&frame, &model, &output)?;
    info!("计数完成: {} 根手指，耗时: {:.2?}", count.total, now.elapsed());

    let mut summary = TaskSummary::default();
    summary.record(&count);
    summary.log();
    Ok(summary)
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  interrupt: Option<Receiver<()>>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 使用外部中断信号，未设置时在任务开始时注册 Ctrl-C 处理函数
  pub fn with_interrupt(mut self, interrupt: Receiver<()>) -> Self {
    self.interrupt = Some(interrupt);
    self
  }

  fn install_ctrlc() -> anyhow::Result<Receiver<()>> {
    let (tx, rx) = channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .map_err(|e| anyhow::anyhow!("无法注册 Ctrl-C 处理函数: {}", e))?;
    Ok(rx)
  }
}

impl<
  F,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = FrameResult, Error = ME>,
  O: Render<F, FrameCount, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let rx = match self.interrupt {
      Some(rx) => rx,
      None => Self::install_ctrlc()?,
    };

    let mut summary = TaskSummary::default();
    let mut now = Instant::now();
    loop {
      // 中断只在帧之间检查
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
      let Some(frame) = input.next() else {
        info!("输入结束");
        break;
      };

      let count = process_frame(&frame, &model, &output)?;
      summary.record(&count);
      info!(
        "第 {} 帧: {} 根手指，耗时: {:.2?}",
        summary.frames,
        count.total,
        now.elapsed()
      );
      now = Instant::now();

      if self
        .frame_number
        .map(|n| summary.frames >= n)
        .unwrap_or(false)
      {
        info!("达到指定帧数 {}, 退出任务循环", summary.frames);
        break;
      }
    }

    info!("任务完成，退出");
    summary.log();
    Ok(summary)
  }
}
