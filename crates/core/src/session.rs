// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifies one connected WebSocket client of the broadcast hub.

use crate::define_id;

define_id! {
    /// Identifier for one live `/api/ws` connection.
    pub struct SessionId("sess");
}
