/// Project configuration file searched for upward from the working directory.
pub const CONFIG_FILENAME: &str = "kdev.toml";

pub const CONFIG_ENV: &str = "KDEV_CONFIG";
pub const ROOT_ENV: &str = "KDEV_ROOT";
pub const JOBS_ENV: &str = "KDEV_JOBS";
pub const RELEASE_VERSION_ENV: &str = "RELEASE_VER";
pub const EDITOR_ENV: &str = "EDITOR";
pub const DEFAULT_EDITOR: &str = "vi";

/// Build counter maintained by kbuild inside the output tree.
pub const COUNTER_FILENAME: &str = ".version";

/// Holds the caller's `PATH` while toolchain directories are prepended.
pub const ORIG_PATH_VAR: &str = "_KDEV_ORIG_PATH";

/// In-shell lists that persist the registry across repeated setups.
pub const TRACKED_VARS_LIST: &str = "_kdev_vars";
pub const TRACKED_FUNCS_LIST: &str = "_kdev_funcs";
