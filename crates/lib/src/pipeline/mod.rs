//! The standard library pipeline.
//!
//! Declares the targets that restore, compile, test, package and publish a
//! .NET library:
//!
//! ```text
//! Clean (before Restore)
//! Restore -> Compile -> RunUnitTests
//!            Compile -> CopyFiles -> CreatePackage
//! CreatePackage + RunUnitTests -> PublishPackage -> PublishRelease
//! ```
//!
//! `Package`, `Default`, `Publish` and `PrePublish` are aggregates with no
//! action of their own.

use tracing::{info, warn};

use crate::consts::{ENV_GITHUB_TOKEN, ENV_NUGET_API_KEY};
use crate::execute::ActionError;
use crate::params::BuildParameters;
use crate::settings::Layout;
use crate::target::{GraphError, TargetDef, TargetGraph};
use crate::tools::fs::{copy_if_newer, delete_directories, files_with_extension};
use crate::tools::{ReleaseRequest, ToolInvoker};

/// Secrets read from the environment. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
  pub nuget_api_key: Option<String>,
  pub github_token: Option<String>,
}

impl Credentials {
  pub fn from_env() -> Self {
    Self {
      nuget_api_key: non_empty_var(ENV_NUGET_API_KEY),
      github_token: non_empty_var(ENV_GITHUB_TOKEN),
    }
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Everything a standard target action can see.
pub struct BuildContext {
  pub params: BuildParameters,
  pub layout: Layout,
  pub tools: Box<dyn ToolInvoker>,
  pub credentials: Credentials,
}

/// Output files copied from the build directory for each framework.
const PACKAGED_EXTENSIONS: [&str; 3] = ["dll", "pdb", "xml"];

/// Build the standard target graph.
pub fn standard_targets() -> Result<TargetGraph<BuildContext>, GraphError> {
  let mut graph = TargetGraph::new();

  graph.add_target(
    TargetDef::new("Clean")
      .description("Delete bin and obj directories under the source directory")
      .before(["Restore"])
      .executes(clean),
  )?;
  graph.add_target(
    TargetDef::new("Restore")
      .description("Restore solution dependencies")
      .executes(restore),
  )?;
  graph.add_target(
    TargetDef::new("Compile")
      .description("Build the solution")
      .depends_on(["Restore"])
      .executes(compile),
  )?;
  graph.add_target(
    TargetDef::new("RunUnitTests")
      .description("Run the test projects")
      .depends_on(["Compile"])
      .executes(run_unit_tests),
  )?;
  graph.add_target(
    TargetDef::new("CopyFiles")
      .description("Stage build output for packaging")
      .depends_on(["Compile"])
      .executes(copy_files),
  )?;
  graph.add_target(
    TargetDef::new("CreatePackage")
      .description("Pack the staged files with symbols")
      .depends_on(["CopyFiles"])
      .executes(create_package),
  )?;
  graph.add_target(
    TargetDef::new("PublishPackage")
      .description("Push packages to the package source")
      .depends_on(["CreatePackage", "RunUnitTests"])
      .executes(publish_package),
  )?;
  graph.add_target(
    TargetDef::new("PublishRelease")
      .description("Create a release from the current changelog entry")
      .depends_on(["PublishPackage", "RunUnitTests"])
      .executes(publish_release),
  )?;
  graph.add_target(
    TargetDef::new("Package")
      .description("Test and package")
      .depends_on(["RunUnitTests", "CreatePackage"]),
  )?;
  graph.add_target(TargetDef::new("Default").depends_on(["Package"]))?;
  graph.add_target(
    TargetDef::new("Publish")
      .description("Publish the package and the release")
      .depends_on(["PublishRelease"]),
  )?;
  graph.add_target(
    TargetDef::new("PrePublish")
      .description("Publish the package only")
      .depends_on(["PublishPackage"]),
  )?;

  Ok(graph)
}

fn clean(ctx: &BuildContext) -> Result<(), ActionError> {
  let deleted = delete_directories(&ctx.layout.source_dir, &["bin", "obj"])?;
  info!(count = deleted.len(), "cleaned build directories");
  Ok(())
}

fn restore(ctx: &BuildContext) -> Result<(), ActionError> {
  Ok(ctx.tools.restore(&ctx.layout.solution)?)
}

fn compile(ctx: &BuildContext) -> Result<(), ActionError> {
  Ok(ctx.tools.build(&ctx.layout.solution, ctx.params.configuration)?)
}

fn run_unit_tests(ctx: &BuildContext) -> Result<(), ActionError> {
  Ok(ctx.tools.test(&ctx.layout.solution, ctx.params.configuration)?)
}

fn copy_files(ctx: &BuildContext) -> Result<(), ActionError> {
  let layout = &ctx.layout;
  let project = &layout.project;
  let build_dir = layout.build_dir(ctx.params.configuration);
  let nuget_dir = layout.nuget_dir(&ctx.params.version);

  for framework in &ctx.params.target_frameworks {
    let src_dir = build_dir.join(framework);
    let dst_dir = nuget_dir.join("lib").join(framework);
    for ext in PACKAGED_EXTENSIONS {
      let file = format!("{project}.{ext}");
      copy_if_newer(&src_dir.join(&file), &dst_dir.join(&file))?;
    }
  }

  copy_if_newer(&layout.nuspec, &nuget_dir.join(format!("{project}.nuspec")))?;
  copy_if_newer(&layout.logo, &nuget_dir.join("logo.png"))?;
  Ok(())
}

fn create_package(ctx: &BuildContext) -> Result<(), ActionError> {
  let nuget_dir = ctx.layout.nuget_dir(&ctx.params.version);
  let spec = nuget_dir.join(format!("{}.nuspec", ctx.layout.project));
  Ok(
    ctx
      .tools
      .pack(&spec, &ctx.params.version, &nuget_dir, ctx.params.configuration)?,
  )
}

fn publish_package(ctx: &BuildContext) -> Result<(), ActionError> {
  let api_key = ctx
    .credentials
    .nuget_api_key
    .as_deref()
    .ok_or(ActionError::MissingCredential { name: ENV_NUGET_API_KEY })?;

  let nuget_dir = ctx.layout.nuget_dir(&ctx.params.version);
  let packages = files_with_extension(&nuget_dir, "nupkg")?;
  if packages.is_empty() {
    warn!(dir = %nuget_dir.display(), "no packages to publish");
    return Err(ActionError::Failed(format!(
      "no .nupkg files found in {}",
      nuget_dir.display()
    )));
  }

  for package in &packages {
    ctx.tools.push(package, &ctx.layout.package_source, api_key)?;
  }
  info!(count = packages.len(), source = %ctx.layout.package_source, "published packages");
  Ok(())
}

fn publish_release(ctx: &BuildContext) -> Result<(), ActionError> {
  let token = ctx
    .credentials
    .github_token
    .as_deref()
    .ok_or(ActionError::MissingCredential { name: ENV_GITHUB_TOKEN })?;

  let release = ReleaseRequest {
    owner: ctx.layout.repo_owner.clone(),
    repo: ctx.layout.repo_name.clone(),
    version: ctx.params.version.clone(),
    notes: ctx.params.release.body(),
    prerelease: false,
    target_commitish: ctx.layout.release_branch.clone(),
  };
  Ok(ctx.tools.create_release(&release, token)?)
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::Path;

  use semver::Version;
  use serial_test::serial;
  use tempfile::TempDir;

  use super::*;
  use crate::changelog::ReleaseNote;
  use crate::execute::ExecutionEngine;
  use crate::params::{CiContext, Configuration};
  use crate::settings::Settings;
  use crate::util::testutil::RecordingTools;

  struct Fixture {
    _temp: TempDir,
    ctx: BuildContext,
    tools: RecordingTools,
  }

  fn fixture(tools: RecordingTools, credentials: Credentials) -> Fixture {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Lib");
    fs::create_dir_all(&root).unwrap();
    let layout = Layout::resolve(&root, Settings::default()).unwrap();

    let mut release = ReleaseNote::new(Version::new(1, 4, 0));
    release.notes = vec!["- Added selectors".to_string(), "- Fixed parser".to_string()];
    let params = BuildParameters::new(
      Configuration::Release,
      release,
      vec!["net6.0".to_string(), "net8.0".to_string()],
      CiContext::local(),
    );

    let ctx = BuildContext {
      params,
      layout,
      tools: Box::new(tools.clone()),
      credentials,
    };
    Fixture {
      _temp: temp,
      ctx,
      tools,
    }
  }

  fn all_credentials() -> Credentials {
    Credentials {
      nuget_api_key: Some("key".to_string()),
      github_token: Some("token".to_string()),
    }
  }

  fn write(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "x").unwrap();
  }

  fn stage_build_output(ctx: &BuildContext) {
    let build_dir = ctx.layout.build_dir(ctx.params.configuration);
    for fw in &ctx.params.target_frameworks {
      for ext in PACKAGED_EXTENSIONS {
        write(&build_dir.join(fw).join(format!("Lib.{ext}")));
      }
    }
    write(&ctx.layout.nuspec);
    write(&ctx.layout.logo);
  }

  fn plan(goal: &str) -> Vec<String> {
    let graph = standard_targets().unwrap();
    let engine = ExecutionEngine::new();
    engine
      .plan(&graph, goal)
      .unwrap()
      .iter()
      .map(|t| t.name().to_string())
      .collect()
  }

  #[test]
  fn default_goal_order() {
    assert_eq!(plan("RunUnitTests"), vec!["Restore", "Compile", "RunUnitTests"]);
  }

  #[test]
  fn package_order() {
    assert_eq!(
      plan("Package"),
      vec!["Restore", "Compile", "RunUnitTests", "CopyFiles", "CreatePackage", "Package"]
    );
  }

  #[test]
  fn publish_runs_tests_before_pushing() {
    let order = plan("Publish");
    let pos = |name: &str| order.iter().position(|t| t == name).unwrap();

    assert!(pos("RunUnitTests") < pos("PublishPackage"));
    assert!(pos("CreatePackage") < pos("PublishPackage"));
    assert!(pos("PublishPackage") < pos("PublishRelease"));
    assert_eq!(order.last().map(String::as_str), Some("Publish"));
    assert!(!order.contains(&"Clean".to_string()));
  }

  #[test]
  fn every_target_resolves() {
    let graph = standard_targets().unwrap();
    for target in graph.targets() {
      assert!(graph.resolve(target.name()).is_ok(), "{} should resolve", target.name());
    }
    assert_eq!(graph.len(), 12);
  }

  #[test]
  fn package_goal_invokes_toolchain() {
    let f = fixture(RecordingTools::new(), all_credentials());
    stage_build_output(&f.ctx);
    let graph = standard_targets().unwrap();

    let result = ExecutionEngine::new()
      .run(&graph, "Package", &f.ctx, |_, _| {})
      .unwrap();

    assert!(result.succeeded(), "{:?}", result.error());
    assert_eq!(
      f.tools.calls(),
      vec![
        "restore Lib.sln",
        "build Lib.sln Release",
        "test Lib.sln Release",
        "pack Lib.nuspec 1.4.0 Release",
      ]
    );
  }

  #[test]
  fn copy_files_stages_package_layout() {
    let f = fixture(RecordingTools::new(), Credentials::default());
    stage_build_output(&f.ctx);

    copy_files(&f.ctx).unwrap();

    let nuget = f.ctx.layout.nuget_dir("1.4.0");
    for fw in ["net6.0", "net8.0"] {
      for ext in PACKAGED_EXTENSIONS {
        assert!(nuget.join("lib").join(fw).join(format!("Lib.{ext}")).exists());
      }
    }
    assert!(nuget.join("Lib.nuspec").exists());
    assert!(nuget.join("logo.png").exists());
  }

  #[test]
  fn copy_files_fails_without_build_output() {
    let f = fixture(RecordingTools::new(), Credentials::default());

    let err = copy_files(&f.ctx).unwrap_err();
    assert!(matches!(err, ActionError::Io { .. }));
  }

  #[test]
  fn clean_removes_build_directories() {
    let f = fixture(RecordingTools::new(), Credentials::default());
    let src = &f.ctx.layout.source_dir;
    write(&src.join("Lib/bin/Debug/Lib.dll"));
    write(&src.join("Lib/obj/project.assets.json"));
    write(&src.join("Lib/Parser.cs"));

    clean(&f.ctx).unwrap();

    assert!(!src.join("Lib/bin").exists());
    assert!(!src.join("Lib/obj").exists());
    assert!(src.join("Lib/Parser.cs").exists());
  }

  #[test]
  fn publish_package_requires_api_key() {
    let f = fixture(RecordingTools::new(), Credentials::default());

    let err = publish_package(&f.ctx).unwrap_err();

    assert!(matches!(err, ActionError::MissingCredential { name: ENV_NUGET_API_KEY }));
    assert!(f.tools.calls().is_empty());
  }

  #[test]
  fn publish_package_pushes_every_package() {
    let f = fixture(RecordingTools::new(), all_credentials());
    let nuget = f.ctx.layout.nuget_dir("1.4.0");
    write(&nuget.join("Lib.1.4.0.nupkg"));
    write(&nuget.join("Lib.1.4.0.snupkg"));

    publish_package(&f.ctx).unwrap();

    assert_eq!(
      f.tools.calls(),
      vec!["push Lib.1.4.0.nupkg https://api.nuget.org/v3/index.json"]
    );
  }

  #[test]
  fn publish_package_without_packages_fails() {
    let f = fixture(RecordingTools::new(), all_credentials());
    fs::create_dir_all(f.ctx.layout.nuget_dir("1.4.0")).unwrap();

    assert!(matches!(publish_package(&f.ctx), Err(ActionError::Failed(_))));
  }

  #[test]
  fn publish_release_uses_changelog_notes() {
    let f = fixture(RecordingTools::new(), all_credentials());

    publish_release(&f.ctx).unwrap();

    assert_eq!(f.tools.calls(), vec!["release Lib/Lib 1.4.0 main"]);
    let releases = f.tools.releases();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].notes, "- Added selectors\n- Fixed parser");
    assert!(!releases[0].prerelease);
  }

  #[test]
  fn publish_release_requires_token() {
    let credentials = Credentials {
      nuget_api_key: Some("key".to_string()),
      github_token: None,
    };
    let f = fixture(RecordingTools::new(), credentials);

    let err = publish_release(&f.ctx).unwrap_err();
    assert_eq!(err.to_string(), "missing credential: GITHUB_TOKEN is not set");
  }

  #[test]
  fn failing_compile_stops_before_tests() {
    let f = fixture(RecordingTools::failing_on("build"), Credentials::default());
    let graph = standard_targets().unwrap();
    let mut failed = None;

    let result = ExecutionEngine::new()
      .run(&graph, "Package", &f.ctx, |name, _| failed = Some(name.to_string()))
      .unwrap();

    assert_eq!(result.failed_target(), Some("Compile"));
    assert_eq!(failed.as_deref(), Some("Compile"));
    assert_eq!(f.tools.calls(), vec!["restore Lib.sln", "build Lib.sln Release"]);
  }

  #[test]
  #[serial]
  fn credentials_ignore_empty_values() {
    temp_env::with_vars(
      [(ENV_NUGET_API_KEY, Some("")), (ENV_GITHUB_TOKEN, Some("ghp_token"))],
      || {
        let credentials = Credentials::from_env();
        assert_eq!(credentials.nuget_api_key, None);
        assert_eq!(credentials.github_token.as_deref(), Some("ghp_token"));
      },
    );
  }
}
