// Copyright 2025 Annodex (https://github.com/annodex)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Query layer over the hierarchical annotation index
//!
//! [`Annodex`] is the entry point: it loads the taxonomy and index for
//! one dataset root and exposes filtered retrieval at each level,
//! cross-level tracing, media path resolution, temporal sorting, and
//! corpus statistics.
//!
//! ```no_run
//! use annodex_query::Annodex;
//!
//! # fn main() -> Result<(), annodex_query::QueryError> {
//! let dex = Annodex::open("/data/kitchen-corpus")?;
//! let sact_ids = dex
//!     .query_sacts()
//!     .cnames(["cooking"])
//!     .cnames_actor(["chef"])
//!     .execute()?;
//! for sact in dex.get_sacts(&sact_ids)? {
//!     println!("{} [{}, {})", sact.id, sact.start, sact.end);
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod paths;
pub mod stats;

pub use engine::{ActQuery, Annodex, HoiQuery, QueryError, Result, SactQuery};
pub use paths::PathQuery;
pub use stats::{LevelStats, Stats};
