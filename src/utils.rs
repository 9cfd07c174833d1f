// 该文件是 Shouzhi （数手指） 项目的一部分。
// src/utils.rs - URL 辅助函数
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

use std::{path::PathBuf, str::FromStr};

use url::Url;

/// 将 URL 的 host 与 path 拼接为本地文件路径，并进行百分号解码。
///
/// `landmarks://data/a.jsonl` 中 `data` 会被解析为 host，这里将其视为相对路径的第一段；
/// `landmarks:///tmp/a.jsonl` 则得到绝对路径。
pub fn url_file_path(url: &Url) -> Option<PathBuf> {
  let raw = match url.host_str() {
    Some(host) if !host.is_empty() => format!("{}{}", host, url.path()),
    _ => url.path().to_string(),
  };
  if raw.is_empty() {
    return None;
  }
  let decoded = urlencoding::decode(&raw).ok()?;
  Some(PathBuf::from(decoded.into_owned()))
}

/// 读取查询参数并解析，参数缺失时返回 `None`，解析失败时返回 `Err(原始值)`。
pub fn query_param<T: FromStr>(url: &Url, key: &str) -> Result<Option<T>, String> {
  match url.query_pairs().find(|(k, _)| k == key) {
    Some((_, v)) => v.parse::<T>().map(Some).map_err(|_| v.into_owned()),
    None => Ok(None),
  }
}

/// 查询参数作为开关使用：`?flag`、`?flag=true`、`?flag=1` 视为开启。
pub fn query_flag(url: &Url, key: &str) -> Option<bool> {
  url
    .query_pairs()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.is_empty() || v == "true" || v == "1")
}
