//! Collections used across the workspace

pub use hashbrown::HashMap;

pub use alloc::collections::{BTreeMap, VecDeque};
