// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Filterable, sortable, paginated tables whose selection survives
//! wholesale replacement of their backing collection.

pub mod fetch;
pub mod filter;
pub mod identity;
pub mod natural;
pub mod notify;
pub mod selection;
pub mod table;

pub use fetch::*;
pub use filter::*;
pub use identity::*;
pub use natural::*;
pub use notify::*;
pub use selection::*;
pub use table::*;
