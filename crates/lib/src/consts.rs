pub const APP_NAME: &str = "bake";

/// Settings file looked up in the build root.
pub const SETTINGS_FILE: &str = "bake.toml";

pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";
pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_OUTPUT_DIR: &str = "bin";
pub const DEFAULT_PACKAGE_SOURCE: &str = "https://api.nuget.org/v3/index.json";
pub const DEFAULT_RELEASE_BRANCH: &str = "main";

/// Goal used when the CLI is invoked without one.
pub const DEFAULT_GOAL: &str = "RunUnitTests";

pub const ENV_NUGET_API_KEY: &str = "NUGET_API_KEY";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";
pub const ENV_GITHUB_RUN_NUMBER: &str = "GITHUB_RUN_NUMBER";

pub const GITHUB_API_URL: &str = "https://api.github.com";
