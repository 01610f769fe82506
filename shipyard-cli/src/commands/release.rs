//! Release workflow: bump, build, commit, tag, publish, push, GitHub
//! release, PyPI poll
//!
//! The workflow is strictly sequential. Locally reversible steps (the
//! version bump, the commit, the tag) run before the irreversible ones
//! (PyPI publish, push, GitHub release). Progress is tracked in a
//! `ReleaseContext` that each step extends only after its external action
//! has succeeded; on failure, rollback consults the context to undo
//! exactly the reversible subset and reports the rest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, ValueEnum};
use git2::Oid;
use semver::Version;
use shipyard_core::{run_command, Bump, GitRepo, PyProject, RepoRef, Secrets};
use shipyard_github::GitHubClient;
use shipyard_pypi::PyPiClient;

use crate::output::Output;

const PYPI_POLL_ATTEMPTS: u32 = 12;
const PYPI_POLL_DELAY: Duration = Duration::from_secs(5);

/// Release command arguments
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Version increment kind
    #[arg(value_enum)]
    bump: BumpKind,

    /// Validate and report without performing any irreversible step
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl From<BumpKind> for Bump {
    fn from(kind: BumpKind) -> Self {
        match kind {
            BumpKind::Patch => Bump::Patch,
            BumpKind::Minor => Bump::Minor,
            BumpKind::Major => Bump::Major,
        }
    }
}

/// Progress record threaded through the release pipeline
///
/// Each step returns an updated copy; a flag is set only once the
/// corresponding external action has been confirmed. Rollback reads the
/// flags to decide what can still be undone.
#[derive(Debug, Clone)]
struct ReleaseContext {
    package: String,
    current_version: Version,
    new_version: Version,
    bump: Bump,
    dry_run: bool,
    original_commit: Oid,
    built_artifacts: Vec<PathBuf>,
    pyproject_modified: bool,
    commit_created: bool,
    tag_created: bool,
    commit_pushed: bool,
    tag_pushed: bool,
    published_to_pypi: bool,
    github_release_created: bool,
}

impl ReleaseContext {
    fn new(
        package: String,
        current_version: Version,
        new_version: Version,
        bump: Bump,
        dry_run: bool,
        original_commit: Oid,
    ) -> Self {
        Self {
            package,
            current_version,
            new_version,
            bump,
            dry_run,
            original_commit,
            built_artifacts: Vec::new(),
            pyproject_modified: false,
            commit_created: false,
            tag_created: false,
            commit_pushed: false,
            tag_pushed: false,
            published_to_pypi: false,
            github_release_created: false,
        }
    }

    fn tag_name(&self) -> String {
        format!("v{}", self.new_version)
    }

    fn with_pyproject_modified(mut self) -> Self {
        self.pyproject_modified = true;
        self
    }

    fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.built_artifacts = artifacts;
        self
    }

    fn with_commit_created(mut self) -> Self {
        self.commit_created = true;
        self
    }

    fn with_tag_created(mut self) -> Self {
        self.tag_created = true;
        self
    }

    fn with_commit_pushed(mut self) -> Self {
        self.commit_pushed = true;
        self
    }

    fn with_tag_pushed(mut self) -> Self {
        self.tag_pushed = true;
        self
    }

    fn with_published(mut self) -> Self {
        self.published_to_pypi = true;
        self
    }

    fn with_github_release(mut self) -> Self {
        self.github_release_created = true;
        self
    }
}

/// A step failure carrying the context as it stood when the step failed
#[derive(Debug)]
struct StepFailure {
    ctx: ReleaseContext,
    error: anyhow::Error,
}

type StepResult = Result<ReleaseContext, Box<StepFailure>>;

fn fail(ctx: ReleaseContext, error: impl Into<anyhow::Error>) -> Box<StepFailure> {
    Box::new(StepFailure {
        ctx,
        error: error.into(),
    })
}

impl ReleaseArgs {
    /// Execute the release workflow
    pub async fn execute(&self, secrets: &Secrets, out: &Output) -> anyhow::Result<()> {
        let bump = Bump::from(self.bump);
        let repo = GitRepo::open(".")?;

        // Rollback anchor, recorded before anything changes
        let original_commit = repo.head_commit()?;

        if !repo.is_clean()? {
            return Err(shipyard_core::Error::Validation(
                "Repository has uncommitted changes. Commit or stash them before releasing."
                    .to_string(),
            )
            .into());
        }

        let mut project = PyProject::load(repo.root())?;
        let new_version = bump.apply(&project.version);

        let ctx = ReleaseContext::new(
            project.name.clone(),
            project.version.clone(),
            new_version,
            bump,
            self.dry_run,
            original_commit,
        );

        print_summary(&ctx, out);

        if self.dry_run {
            for line in dry_run_report(&ctx) {
                out.println(&line);
            }
            return Ok(());
        }

        if !self.yes && !confirm("Proceed? (Y/n): ")? {
            out.println("Release cancelled");
            return Ok(());
        }

        match run_steps(&repo, &mut project, ctx, secrets, out).await {
            Ok(ctx) => {
                report_success(&ctx, out);
                Ok(())
            }
            Err(failure) => {
                let plan = plan_rollback(&failure.ctx);
                let undone = execute_rollback(&repo, &plan, &failure.ctx, out);
                report_failure(&failure, &plan, &undone, out);
                Err(anyhow!("release failed: {}", failure.error))
            }
        }
    }
}

async fn run_steps(
    repo: &GitRepo,
    project: &mut PyProject,
    ctx: ReleaseContext,
    secrets: &Secrets,
    out: &Output,
) -> StepResult {
    let ctx = bump_step(project, ctx, out)?;
    let ctx = build_step(repo, ctx, out).await?;
    let ctx = commit_and_tag_step(repo, ctx, out)?;
    let ctx = publish_step(repo, ctx, secrets, out).await?;
    let ctx = push_step(repo, ctx, out).await?;
    let ctx = github_release_step(repo, ctx, secrets, out).await?;
    let ctx = poll_step(ctx, out).await?;
    Ok(ctx)
}

fn bump_step(project: &mut PyProject, ctx: ReleaseContext, out: &Output) -> StepResult {
    out.println(&format!("Bumping version ({})...", ctx.bump));

    match project.set_version(&ctx.new_version) {
        Ok(()) => Ok(ctx.with_pyproject_modified()),
        Err(e) => Err(fail(ctx, e)),
    }
}

async fn build_step(repo: &GitRepo, ctx: ReleaseContext, out: &Output) -> StepResult {
    out.println("Building package...");

    match run_command("poetry", &["build"], repo.root()).await {
        Ok(_) => {
            let artifacts = collect_artifacts(repo.root(), &ctx.new_version);
            for artifact in &artifacts {
                out.verbose(&format!("Built {}", artifact.display()));
            }
            Ok(ctx.with_artifacts(artifacts))
        }
        Err(e) => Err(fail(ctx, e)),
    }
}

fn commit_and_tag_step(repo: &GitRepo, ctx: ReleaseContext, out: &Output) -> StepResult {
    out.println("Committing version change...");

    let message = format!("release {}", ctx.new_version);
    let ctx = match repo.commit_paths(&[Path::new("pyproject.toml")], &message) {
        Ok(_) => ctx.with_commit_created(),
        Err(e) => return Err(fail(ctx, e)),
    };

    let tag = ctx.tag_name();
    out.println(&format!("Creating tag {}...", tag));

    match repo.create_tag(&tag) {
        Ok(()) => Ok(ctx.with_tag_created()),
        Err(e) => Err(fail(ctx, e)),
    }
}

async fn publish_step(
    repo: &GitRepo,
    ctx: ReleaseContext,
    secrets: &Secrets,
    out: &Output,
) -> StepResult {
    out.println("Publishing to PyPI...");

    // Credential check happens before the publish has any side effect
    let token = match secrets.require_pypi_token() {
        Ok(token) => token,
        Err(e) => return Err(fail(ctx, e)),
    };

    let args = [
        "publish",
        "--username",
        "__token__",
        "--password",
        token.as_str(),
    ];

    match run_command("poetry", &args, repo.root()).await {
        Ok(_) => Ok(ctx.with_published()),
        Err(e) => Err(fail(ctx, e)),
    }
}

async fn push_step(repo: &GitRepo, ctx: ReleaseContext, out: &Output) -> StepResult {
    out.println("Pushing to origin...");

    let ctx = match run_command("git", &["push", "origin", "HEAD"], repo.root()).await {
        Ok(_) => ctx.with_commit_pushed(),
        Err(e) => return Err(fail(ctx, e)),
    };

    let tag = ctx.tag_name();
    match run_command("git", &["push", "origin", &tag], repo.root()).await {
        Ok(_) => Ok(ctx.with_tag_pushed()),
        Err(e) => Err(fail(ctx, e)),
    }
}

async fn github_release_step(
    repo: &GitRepo,
    ctx: ReleaseContext,
    secrets: &Secrets,
    out: &Output,
) -> StepResult {
    let Some(token) = secrets.github_token() else {
        out.warn("GITHUB_TOKEN not set; skipping GitHub release creation");
        return Ok(ctx);
    };

    out.println("Creating GitHub release...");

    let tag = ctx.tag_name();
    let result: anyhow::Result<String> = async {
        let remote_url = repo.origin_url()?;
        let repo_ref = RepoRef::parse(&remote_url)?;
        let client = GitHubClient::new(repo_ref, token)?;
        let notes = release_notes(repo, &tag).await?;
        let release = client
            .create_release(&tag, &format!("Release {}", tag), &notes)
            .await?;
        Ok(release.html_url)
    }
    .await;

    match result {
        Ok(url) => {
            out.success(&format!("GitHub release created: {}", url));
            Ok(ctx.with_github_release())
        }
        Err(e) => Err(fail(ctx, e)),
    }
}

async fn poll_step(ctx: ReleaseContext, out: &Output) -> StepResult {
    out.println("Waiting for PyPI publication...");

    let client = PyPiClient::new();
    let version = ctx.new_version.to_string();

    match client
        .poll_for_version(&ctx.package, &version, PYPI_POLL_ATTEMPTS, PYPI_POLL_DELAY)
        .await
    {
        Ok(true) => {
            out.success(&format!("Version {} published to PyPI", version));
            Ok(ctx)
        }
        Ok(false) => {
            out.warn(&format!(
                "Timed out waiting for PyPI. Check manually: https://pypi.org/project/{}/",
                ctx.package
            ));
            Ok(ctx)
        }
        Err(e) => Err(fail(ctx, e)),
    }
}

/// Generate release notes from commits since the previous tag
///
/// Falls back to "Initial release" when there is no previous tag.
async fn release_notes(repo: &GitRepo, current_tag: &str) -> anyhow::Result<String> {
    let tags = run_command("git", &["tag", "--sort=-creatordate"], repo.root()).await?;

    // The tag for this release already exists locally; skip it
    let previous = tags
        .stdout
        .lines()
        .map(str::trim)
        .find(|t| !t.is_empty() && *t != current_tag);

    let Some(previous) = previous else {
        return Ok("Initial release".to_string());
    };

    let range = format!("{}..HEAD", previous);
    let log = run_command("git", &["log", &range, "--pretty=format:- %s"], repo.root()).await?;

    let notes = log.stdout.trim();
    if notes.is_empty() {
        Ok("Initial release".to_string())
    } else {
        Ok(notes.to_string())
    }
}

/// Find the dist files produced for this version
fn collect_artifacts(root: &Path, version: &Version) -> Vec<PathBuf> {
    let needle = version.to_string();
    let Ok(entries) = std::fs::read_dir(root.join("dist")) else {
        return Vec::new();
    };

    let mut artifacts: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(&needle))
        })
        .collect();
    artifacts.sort();
    artifacts
}

/// What rollback will undo and what it cannot
#[derive(Debug, Default)]
struct RollbackPlan {
    delete_tag: Option<String>,
    reset_to_original: bool,
    not_undone: Vec<String>,
    never_performed: Vec<String>,
}

fn plan_rollback(ctx: &ReleaseContext) -> RollbackPlan {
    let mut plan = RollbackPlan::default();

    if ctx.tag_created {
        if ctx.tag_pushed {
            plan.not_undone.push(format!(
                "tag {} was already pushed to origin; it was not force-deleted",
                ctx.tag_name()
            ));
        } else {
            plan.delete_tag = Some(ctx.tag_name());
        }
    }

    if ctx.pyproject_modified || ctx.commit_created {
        if ctx.commit_pushed {
            plan.not_undone.push(
                "the version-bump commit was already pushed to origin; it was not reverted"
                    .to_string(),
            );
        } else {
            plan.reset_to_original = true;
        }
    }

    if ctx.published_to_pypi {
        plan.not_undone.push(format!(
            "version {} was published to PyPI; the registry is immutable",
            ctx.new_version
        ));
    } else {
        plan.never_performed
            .push("PyPI was never contacted".to_string());
    }

    if ctx.github_release_created {
        plan.not_undone.push(format!(
            "GitHub release {} was created; release deletion is not implemented",
            ctx.tag_name()
        ));
    } else {
        plan.never_performed
            .push("no GitHub release was created".to_string());
    }

    plan
}

/// Perform the reversible part of the plan, returning what was undone
fn execute_rollback(
    repo: &GitRepo,
    plan: &RollbackPlan,
    ctx: &ReleaseContext,
    out: &Output,
) -> Vec<String> {
    let mut undone = Vec::new();

    out.warn("Rolling back...");

    if let Some(ref tag) = plan.delete_tag {
        match repo.delete_tag(tag) {
            Ok(()) => undone.push(format!("deleted local tag {}", tag)),
            Err(e) => out.error(&format!("Could not delete tag {}: {}", tag, e)),
        }
    }

    if plan.reset_to_original {
        match repo.reset_hard(ctx.original_commit) {
            Ok(()) => undone.push(format!(
                "reverted the working tree to commit {:.7}",
                ctx.original_commit.to_string()
            )),
            Err(e) => out.error(&format!("Could not reset to original commit: {}", e)),
        }
    }

    undone
}

fn report_failure(failure: &StepFailure, plan: &RollbackPlan, undone: &[String], out: &Output) {
    out.error(&format!("Release failed: {}", failure.error));

    if !undone.is_empty() {
        out.println("Rolled back:");
        for item in undone {
            out.println(&format!("  - {}", item));
        }
    }

    if !plan.not_undone.is_empty() {
        out.println("Not rolled back:");
        for item in &plan.not_undone {
            out.println(&format!("  - {}", item));
        }
    }

    if !plan.never_performed.is_empty() {
        out.println("Never performed:");
        for item in &plan.never_performed {
            out.println(&format!("  - {}", item));
        }
    }
}

fn print_summary(ctx: &ReleaseContext, out: &Output) {
    out.section("RELEASE DETAILS");
    out.println(&format!("  Package:  {}", ctx.package));
    out.println(&format!("  Current:  {}", ctx.current_version));
    out.println(&format!("  New:      {}", ctx.new_version));
    out.println(&format!("  Type:     {}", ctx.bump));
    out.println(&format!(
        "  Mode:     {}",
        if ctx.dry_run { "DRY-RUN" } else { "LIVE" }
    ));
    out.println("");
    out.println("Planned actions:");
    for (i, action) in planned_actions(ctx).iter().enumerate() {
        out.println(&format!("  {}. {}", i + 1, action));
    }
    out.println("");
}

fn planned_actions(ctx: &ReleaseContext) -> Vec<String> {
    vec![
        format!(
            "bump version in pyproject.toml ({} → {})",
            ctx.current_version, ctx.new_version
        ),
        "build distributable artifacts with Poetry".to_string(),
        format!("commit the version change and create tag {}", ctx.tag_name()),
        "publish to PyPI".to_string(),
        "push commit and tag to origin".to_string(),
        format!("create GitHub release {}", ctx.tag_name()),
        format!("wait for PyPI to serve {}", ctx.new_version),
    ]
}

fn dry_run_report(ctx: &ReleaseContext) -> Vec<String> {
    let mut lines = vec![format!(
        "[dry-run] {} would be released as {}",
        ctx.package, ctx.new_version
    )];
    for action in planned_actions(ctx) {
        lines.push(format!("[dry-run] would {}", action));
    }
    lines.push("[dry-run] All checks passed. No changes were made.".to_string());
    lines
}

fn report_success(ctx: &ReleaseContext, out: &Output) {
    out.section("RELEASE COMPLETE");
    out.success(&format!(
        "Release {} completed successfully",
        ctx.new_version
    ));
    out.println(&format!(
        "  Package: https://pypi.org/project/{}/{}/",
        ctx.package, ctx.new_version
    ));
    if ctx.github_release_created {
        out.println(&format!("  Release tag: {}", ctx.tag_name()));
    }
    for artifact in &ctx.built_artifacts {
        out.println(&format!("  Artifact: {}", artifact.display()));
    }
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    use std::io::Write as _;

    print!("{}", question);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    let answer = line.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctx() -> ReleaseContext {
        ReleaseContext::new(
            "demo".to_string(),
            Version::new(1, 2, 3),
            Version::new(1, 2, 4),
            Bump::Patch,
            false,
            Oid::zero(),
        )
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(test_ctx().tag_name(), "v1.2.4");
    }

    #[test]
    fn test_rollback_after_tag_before_publish() {
        let ctx = test_ctx()
            .with_pyproject_modified()
            .with_commit_created()
            .with_tag_created();

        let plan = plan_rollback(&ctx);

        assert_eq!(plan.delete_tag.as_deref(), Some("v1.2.4"));
        assert!(plan.reset_to_original);
        assert!(plan.not_undone.is_empty());
        assert!(plan
            .never_performed
            .iter()
            .any(|s| s.contains("PyPI was never contacted")));
        assert!(plan
            .never_performed
            .iter()
            .any(|s| s.contains("no GitHub release was created")));
    }

    #[test]
    fn test_rollback_before_any_side_effect() {
        let plan = plan_rollback(&test_ctx());

        assert!(plan.delete_tag.is_none());
        assert!(!plan.reset_to_original);
        assert!(plan.not_undone.is_empty());
    }

    #[test]
    fn test_rollback_after_push_reverts_nothing_locally() {
        let ctx = test_ctx()
            .with_pyproject_modified()
            .with_commit_created()
            .with_tag_created()
            .with_published()
            .with_commit_pushed()
            .with_tag_pushed();

        let plan = plan_rollback(&ctx);

        assert!(plan.delete_tag.is_none());
        assert!(!plan.reset_to_original);
        assert!(plan.not_undone.iter().any(|s| s.contains("already pushed")));
        assert!(plan
            .not_undone
            .iter()
            .any(|s| s.contains("published to PyPI")));
    }

    #[test]
    fn test_rollback_after_partial_push() {
        // HEAD was pushed but the tag push failed: the local tag is still
        // deletable, the commit is not revertible.
        let ctx = test_ctx()
            .with_pyproject_modified()
            .with_commit_created()
            .with_tag_created()
            .with_published()
            .with_commit_pushed();

        let plan = plan_rollback(&ctx);

        assert_eq!(plan.delete_tag.as_deref(), Some("v1.2.4"));
        assert!(!plan.reset_to_original);
        assert!(plan
            .not_undone
            .iter()
            .any(|s| s.contains("version-bump commit")));
    }

    #[test]
    fn test_rollback_notes_created_github_release() {
        let ctx = test_ctx()
            .with_pyproject_modified()
            .with_commit_created()
            .with_tag_created()
            .with_published()
            .with_commit_pushed()
            .with_tag_pushed()
            .with_github_release();

        let plan = plan_rollback(&ctx);

        assert!(plan
            .not_undone
            .iter()
            .any(|s| s.contains("release deletion is not implemented")));
        assert!(plan
            .never_performed
            .iter()
            .all(|s| !s.contains("GitHub release")));
    }

    #[test]
    fn test_dry_run_reports_new_version() {
        let mut ctx = test_ctx();
        ctx.dry_run = true;

        let report = dry_run_report(&ctx);

        assert!(report[0].contains("1.2.4"));
        assert!(report
            .iter()
            .any(|l| l.contains("No changes were made")));
    }

    #[test]
    fn test_planned_actions_cover_all_steps() {
        let actions = planned_actions(&test_ctx());

        assert_eq!(actions.len(), 7);
        assert!(actions[0].contains("1.2.3 → 1.2.4"));
        assert!(actions[2].contains("v1.2.4"));
    }

    #[test]
    fn test_bump_kind_conversion() {
        assert_eq!(Bump::from(BumpKind::Patch), Bump::Patch);
        assert_eq!(Bump::from(BumpKind::Minor), Bump::Minor);
        assert_eq!(Bump::from(BumpKind::Major), Bump::Major);
    }
}
