/// Application name, used for environment variable prefixes and default paths.
pub const APP_NAME: &str = "mvb";

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "mvb.toml";

/// Default build output directory, relative to the project root.
pub const DEFAULT_BUILD_DIR: &str = "build/mvb";

/// Suffix of the marker file written next to a derived source root once it is
/// complete. The variant `variants/8` is marked by `variants/8.mvb-complete`.
pub const COMPLETE_SUFFIX: &str = ".mvb-complete";

/// Suffix appended to a variant directory while it is being written.
pub const STAGING_SUFFIX: &str = ".partial";

/// Version suffix that marks a pre-release build.
pub const DEFAULT_SNAPSHOT_MARKER: &str = "-SNAPSHOT";

/// Channel name used for credential lookup when none is configured.
pub const DEFAULT_CHANNEL_NAME: &str = "pub";

/// Path segment appended to the publish base URL for snapshot builds.
pub const SNAPSHOTS_SEGMENT: &str = "snapshots";

/// Path segment appended to the publish base URL for release builds.
pub const RELEASES_SEGMENT: &str = "releases";

/// Default number of version pipelines allowed to run at once.
pub const DEFAULT_PARALLELISM: usize = 4;

/// File name of the JSON build report inside the build directory.
pub const REPORT_FILE_NAME: &str = "report.json";

/// Name of the base source root that patches apply to.
pub const BASE_ROOT_NAME: &str = "main";

/// Default base source directory, relative to the project root.
pub const DEFAULT_SOURCE_DIR: &str = "src";

/// Directory patches are read from when a patch does not name one.
pub const DEFAULT_PATCHES_DIR: &str = "patches";

/// Overrides `publish.url`. An empty value disables publishing.
pub const PUBLISH_URL_ENV: &str = "MVB_PUBLISH_URL";

/// Overrides `build.dir`.
pub const BUILD_DIR_ENV: &str = "MVB_BUILD_DIR";
