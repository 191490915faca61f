// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! I/O adapters: filesystem probing/watching, dimension scanning, and the
//! render-service client. No persistence and no domain orchestration
//! lives here.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod fs_probe;
pub mod fs_watcher;
pub mod render_client;
pub mod scanner;

pub use fs_probe::{list_png, list_safetensors, open_file, probe, ProbeError};
pub use fs_watcher::{watch, FsWatcher, WatchError};
pub use render_client::{submit_with_retry, RenderClient, RenderHttpClient, RenderHttpError, RenderServiceEvent};
pub use scanner::scan;

#[cfg(any(test, feature = "test-support"))]
pub use render_client::FakeRenderClient;
