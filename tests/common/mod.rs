//! Common test utilities and helpers for gitgrab tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitgrab::git::CommandOutput;
use gitgrab::{
    BranchName, CloneMethod, CommandError, GitHubToken, HttpUrl, OrganizationName,
    ProcessRunner, Repository, RepositoryName, SshUrl, SyncContext,
};

pub const TEST_TOKEN: &str = "ghp_testtoken123";

/// Stands in for the git executable.
///
/// `clone` creates its last argument as a directory so a second run sees
/// the clone.
/// `branch --show-current` answers with the configured branch. Verbs listed
/// in `failing` exit with status 128. Every call is recorded.
#[derive(Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    branch: Arc<Mutex<String>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        let runner = Self::default();
        runner.set_branch("main");
        runner
    }

    pub fn set_branch(&self, branch: &str) {
        *self.branch.lock().unwrap() = branch.to_string();
    }

    pub fn fail_on(&self, verb: &str) {
        self.failing.lock().unwrap().push(verb.to_string());
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// The git verb of each call (`clone`, `branch`, `pull`, `fetch`)
    pub fn verbs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|args| verb_of(&args).to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn verb_of(args: &[String]) -> &str {
    if args[0] == "-C" {
        &args[2]
    } else {
        &args[0]
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(args.clone());

        let verb = verb_of(&args).to_string();
        if self.failing.lock().unwrap().contains(&verb) {
            return Err(CommandError::Exit { code: Some(128) });
        }

        match verb.as_str() {
            "clone" => {
                std::fs::create_dir_all(args.last().unwrap()).unwrap();
                Ok(CommandOutput::default())
            }
            "branch" => Ok(CommandOutput {
                stdout: format!("{}\n", self.branch.lock().unwrap()),
            }),
            _ => Ok(CommandOutput::default()),
        }
    }
}

/// Builder for repository records
pub struct RepoBuilder {
    repo: Repository,
}

impl RepoBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            repo: Repository {
                name: RepositoryName::parse(name).unwrap(),
                clone_url: HttpUrl::parse(format!("https://github.com/acme/{}.git", name)).unwrap(),
                ssh_url: SshUrl::parse(format!("git@github.com:acme/{}.git", name)).unwrap(),
                private: false,
                default_branch: Some(BranchName::new("main")),
                fork: false,
                archived: false,
            },
        }
    }

    pub fn private(mut self) -> Self {
        self.repo.private = true;
        self
    }

    pub fn default_branch(mut self, branch: Option<&str>) -> Self {
        self.repo.default_branch = branch.map(BranchName::new);
        self
    }

    pub fn build(self) -> Repository {
        self.repo
    }
}

pub fn repo(name: &str) -> Repository {
    RepoBuilder::new(name).build()
}

pub fn context(target_dir: &Path, method: CloneMethod) -> SyncContext {
    SyncContext {
        target_dir: target_dir.to_path_buf(),
        token: GitHubToken::new(TEST_TOKEN).unwrap(),
        organization: OrganizationName::parse("acme").unwrap(),
        method,
    }
}

pub fn local(target_dir: &Path, name: &str) -> PathBuf {
    target_dir.join(name)
}

/// JSON for one entry of the organization listing
pub fn repo_json(name: &str, private: bool, default_branch: Option<&str>) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("acme/{}", name),
        "clone_url": format!("https://github.com/acme/{}.git", name),
        "ssh_url": format!("git@github.com:acme/{}.git", name),
        "private": private,
        "default_branch": default_branch,
        "fork": false,
        "archived": false,
    })
}

/// Serve `pages` for `GET /orgs/{org}/repos`, followed by an empty page
pub async fn mount_pages(server: &MockServer, org: &str, pages: Vec<Vec<Value>>) {
    let count = pages.len();
    for (i, page) in pages.into_iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/orgs/{}/repos", org)))
            .and(query_param("page", (i + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(page)))
            .expect(1)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(format!("/orgs/{}/repos", org)))
        .and(query_param("page", (count + 1).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(server)
        .await;
}
