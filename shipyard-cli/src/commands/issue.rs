//! Issue management commands: list, create, resolve, delete

use std::io::Write as _;

use anyhow::anyhow;
use shipyard_core::{GitRepo, RepoRef, Secrets};
use shipyard_github::GitHubClient;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::output::{label_color, Output};

/// The kind of issue to create, applied as a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Bug,
    Task,
    Idea,
}

impl IssueKind {
    /// The GitHub label for this kind
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::Bug => "bug",
            IssueKind::Task => "task",
            IssueKind::Idea => "idea",
        }
    }
}

/// Build a GitHub client for the repository the command runs in
///
/// The owner/name pair comes from the `origin` remote of the enclosing
/// git repository; the token must be present before any network call.
pub fn client_for_cwd(secrets: &Secrets) -> anyhow::Result<GitHubClient> {
    let repo = GitRepo::open(".")?;
    let remote_url = repo.origin_url()?;
    let repo_ref = RepoRef::parse(&remote_url)?;
    let token = secrets.require_github_token()?;

    Ok(GitHubClient::new(repo_ref, token)?)
}

/// List all open issues in a colored table
pub async fn list(secrets: &Secrets, out: &Output) -> anyhow::Result<()> {
    let client = client_for_cwd(secrets)?;

    out.verbose(&format!(
        "Fetching open issues for {}/{}...",
        client.owner(),
        client.repo()
    ));

    let issues = client.list_open_issues().await?;

    if issues.is_empty() {
        out.println("No open issues found");
        return Ok(());
    }

    let colors = client.label_colors().await?;

    let mut buffer = out.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_bold(true));
    let _ = writeln!(
        &mut buffer,
        "{:<6} {:<50} {:<12} {:<12} {:<10}",
        "ID", "TITLE", "LABEL", "AUTHOR", "CREATED"
    );
    let _ = buffer.reset();

    for issue in &issues {
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = write!(&mut buffer, "{:<6} ", issue.number);
        let _ = buffer.reset();

        let _ = write!(&mut buffer, "{:<50} ", truncate(&issue.title, 50));

        let label = issue.primary_label();
        let label_name = label.map(|l| l.name.as_str()).unwrap_or("");
        let spec = label
            .and_then(|l| colors.get(&l.name))
            .and_then(|hex| label_color(hex));
        match spec {
            Some(spec) => {
                let _ = buffer.set_color(&spec);
                let _ = write!(&mut buffer, "{:<12}", label_name);
                let _ = buffer.reset();
                let _ = write!(&mut buffer, " ");
            }
            None => {
                let _ = write!(&mut buffer, "{:<12} ", label_name);
            }
        }

        let _ = writeln!(
            &mut buffer,
            "{:<12} {:<10}",
            truncate(&issue.author, 12),
            issue.created_at.format("%Y-%m-%d")
        );
    }

    out.print(&buffer);

    Ok(())
}

/// Create an issue of the given kind, prompting for a title
pub async fn create(kind: IssueKind, secrets: &Secrets, out: &Output) -> anyhow::Result<()> {
    let client = client_for_cwd(secrets)?;

    let title = prompt("? Title: ")?;
    if title.is_empty() {
        return Err(anyhow!("Title cannot be empty"));
    }

    let label = kind.label();
    let issue = client
        .create_issue(&title, None, &[label.to_string()])
        .await?;

    let colors = client.label_colors().await?;
    let mut buffer = out.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = write!(&mut buffer, "✓");
    let _ = buffer.reset();
    let _ = write!(&mut buffer, " Created ");
    write_label(&mut buffer, label, colors.get(label).map(String::as_str));
    let _ = writeln!(&mut buffer, " #{} → {}", issue.number, issue.html_url);
    out.print(&buffer);

    Ok(())
}

/// Run a per-number operation over a batch
///
/// Every number is attempted; a failing item is recorded and never stops
/// the rest of the batch. Results come back in attempt order.
async fn run_batch<T, E, F, Fut>(numbers: &[u64], mut op: F) -> (Vec<(u64, T)>, Vec<(u64, E)>)
where
    F: FnMut(u64) -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
{
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for &number in numbers {
        match op(number).await {
            Ok(value) => succeeded.push((number, value)),
            Err(e) => failed.push((number, e)),
        }
    }

    (succeeded, failed)
}

/// Close issues by number; failures are per-item and do not stop the batch
pub async fn resolve(numbers: &[u64], secrets: &Secrets, out: &Output) -> anyhow::Result<()> {
    let client = client_for_cwd(secrets)?;
    let colors = client.label_colors().await?;

    let (closed, failures) = run_batch(numbers, |number| {
        let client = &client;
        async move {
            let issue = client.get_issue(number).await?;
            client.close_issue(number).await?;
            Ok::<_, shipyard_github::Error>(issue)
        }
    })
    .await;

    for (number, issue) in &closed {
        let label_name = issue
            .primary_label()
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "issue".to_string());

        let mut buffer = out.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = write!(&mut buffer, "✓");
        let _ = buffer.reset();
        let _ = write!(&mut buffer, " Resolved ");
        write_label(
            &mut buffer,
            &label_name,
            colors.get(&label_name).map(String::as_str),
        );
        let _ = writeln!(&mut buffer, " #{} → {}", number, issue.html_url);
        out.print(&buffer);
    }

    for (number, e) in &failures {
        out.error(&format!("Could not resolve #{}: {}", number, e));
    }

    let failed: Vec<u64> = failures.iter().map(|(n, _)| *n).collect();
    match batch_summary("resolve", &failed, numbers.len()) {
        Some(summary) => Err(anyhow!(summary)),
        None => Ok(()),
    }
}

/// Permanently delete issues by number; each number is independent
pub async fn delete(numbers: &[u64], secrets: &Secrets, out: &Output) -> anyhow::Result<()> {
    let client = client_for_cwd(secrets)?;
    let colors = client.label_colors().await?;

    let (deleted, failures) = run_batch(numbers, |number| {
        let client = &client;
        async move { client.delete_issue(number).await }
    })
    .await;

    for (number, item) in &deleted {
        let label_name = item
            .label
            .as_ref()
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "issue".to_string());

        let mut buffer = out.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = write!(&mut buffer, "✓");
        let _ = buffer.reset();
        let _ = write!(&mut buffer, " Deleted ");
        write_label(
            &mut buffer,
            &label_name,
            colors.get(&label_name).map(String::as_str),
        );
        let _ = writeln!(&mut buffer, " #{}: {}", number, item.title);
        out.print(&buffer);
    }

    for (number, failure) in &failures {
        out.error(&format!("Could not delete #{}: {}", number, failure));
    }

    let failed: Vec<u64> = failures.iter().map(|(n, _)| *n).collect();
    match batch_summary("delete", &failed, numbers.len()) {
        Some(summary) => Err(anyhow!(summary)),
        None => Ok(()),
    }
}

/// Write a label name, colored by its hex color when it parses
fn write_label(buffer: &mut termcolor::Buffer, name: &str, hex: Option<&str>) {
    match hex.and_then(label_color) {
        Some(spec) => {
            let _ = buffer.set_color(&spec);
            let _ = write!(buffer, "{}", name);
            let _ = buffer.reset();
        }
        None => {
            let _ = write!(buffer, "{}", name);
        }
    }
}

/// Truncate a string to at most `max` characters
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Summary line for a batch operation, or `None` when everything succeeded
fn batch_summary(action: &str, failed: &[u64], total: usize) -> Option<String> {
    if failed.is_empty() {
        return None;
    }

    let numbers = failed
        .iter()
        .map(|n| format!("#{}", n))
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        "failed to {} {} of {} issues: {}",
        action,
        failed.len(),
        total,
        numbers
    ))
}

/// Read one line from stdin after printing a prompt
fn prompt(question: &str) -> anyhow::Result<String> {
    print!("{}", question);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    Ok(line.trim().to_string())
}
