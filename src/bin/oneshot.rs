// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/bin/oneshot.rs - 单帧计数
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use shouzhi::{
  FromUrl,
  input::InputWrapper,
  model::RecordedPosesBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

/// Shouzhi 单帧计数参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 姿态估计模型（recorded://?min_handedness_score=0.8&max_hands=2）
  #[arg(long, value_name = "MODEL", default_value = "recorded://")]
  pub model: Url,
  /// 关键点来源（landmarks:///path/to/file.jsonl 或 stdin://）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出（log://、jsonl:///path、image:///path.png?font=...）
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("模型: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = RecordedPosesBuilder::from_url(&args.model)?.build()?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, model, output)?;

  Ok(())
}
