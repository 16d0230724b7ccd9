// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Claims-tracking client - upstream status lookups.

pub mod lighthouse;
pub mod mock;
mod traits;

pub use lighthouse::LighthouseClient;
pub use mock::MockClaimsClient;
pub use traits::*;
