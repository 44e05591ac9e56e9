//! Dataset schema + ids.

/// Version of the on-disk dataset layout (archive + meta sidecar).
pub const DATASET_VERSION: u32 = 1;

/// Archive suffix: gzip-compressed JSON array of tuples.
pub const ARCHIVE_SUFFIX: &str = ".json.gz";

/// Meta sidecar suffix, replacing `ARCHIVE_SUFFIX`.
pub const META_SUFFIX: &str = ".meta.json";

/// Tuple field names inside the JSON records.
pub const F_OBS: &str = "obs";
pub const F_ACT: &str = "act";
pub const F_REWARD: &str = "r";
