// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use log::warn;

const DEFAULT_LOG_VALUE_LIMIT: usize = 64;

/// Byte threshold for debug logs: payloads larger than this many bytes are
/// logged as a byte count, smaller ones with their full value
pub(crate) fn mdng_log_value_limit() -> usize {
  match std::env::var("MDNG_LOG_VALUE_LIMIT").map(|val| val.parse::<usize>()) {
    Ok(Ok(value)) => value,
    Ok(Err(_)) => {
      warn!("Invalid value for MDNG_LOG_VALUE_LIMIT");
      DEFAULT_LOG_VALUE_LIMIT
    }
    Err(_) => DEFAULT_LOG_VALUE_LIMIT,
  }
}
