// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv-storage: edition-checked persistence for harvest records

mod error;
mod operation;
mod state;
mod store;
mod table;
mod wal;

pub use error::StoreError;
pub use operation::Operation;
pub use state::MaterializedState;
pub use store::{HarvestStore, WAL_FILE};
pub use table::{OptimisticStore, Versioned};
pub use wal::{Wal, WalError};
