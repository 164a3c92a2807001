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

//! Annodex Index
//!
//! The hierarchical annotation index: bidirectional parent↔children
//! maps, the class-vocabulary taxonomy with few-shot remapping, and the
//! corpus lookup structure with cache-backed loading and cross-level
//! tracing.

pub mod bidict;
pub mod lookup;
pub mod taxonomy;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use bidict::{Bidict, BidictError, OrderedBidict};
pub use lookup::{IndexError, Lookup};
pub use taxonomy::{Kind, Signature, Split, Taxonomy, TaxonomyError};
