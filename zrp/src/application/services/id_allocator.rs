// /////////////////////////////////////////////////////////////////////////////
// ZRP PLM RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Sequential id allocation over the `id_sequences` table.

use std::sync::Arc;

use async_trait::async_trait;

use zrp_domain::repositories::SettingsRepository;
use zrp_domain::services::IdAllocator;
use zrp_domain::value_objects::IdPrefix;
use zrp_domain::ZrpError;

/// Allocates `PREFIX-NNN` ids from the store's per-prefix counters.
pub struct SequenceIdAllocator {
    settings: Arc<dyn SettingsRepository>,
}

impl SequenceIdAllocator {
    pub fn new(settings: Arc<dyn SettingsRepository>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl IdAllocator for SequenceIdAllocator {
    async fn next_id(&self, prefix: IdPrefix) -> Result<String, ZrpError> {
        let n = self.settings.next_in_sequence(prefix.as_str()).await?;
        Ok(prefix.format(n))
    }
}
