//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use frizbee_action::config::{Config, Exclusions, HostingBackend};
use frizbee_action::error::{HostingApiError, ScanError, VcsError};
use frizbee_action::providers::{HostingApi, PullRequest, PullRequestIntent};
use frizbee_action::results::ScanResult;
use frizbee_action::scanner::{ScanCategory, Scanner};
use frizbee_action::vcs::{Signature, VersionControl};

/// Scanner returning canned results per path
pub struct FakeScanner {
    category: ScanCategory,
    results: BTreeMap<String, ScanResult>,
    pub scanned: Arc<Mutex<Vec<String>>>,
}

impl FakeScanner {
    pub fn new(category: ScanCategory) -> Self {
        Self {
            category,
            results: BTreeMap::new(),
            scanned: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_result(mut self, path: &str, result: ScanResult) -> Self {
        self.results.insert(path.to_string(), result);
        self
    }
}

#[async_trait]
impl Scanner for FakeScanner {
    fn category(&self) -> ScanCategory {
        self.category
    }

    async fn scan(&self, path: &str) -> Result<ScanResult, ScanError> {
        self.scanned.lock().unwrap().push(path.to_string());
        self.results
            .get(path)
            .cloned()
            .ok_or_else(|| ScanError::PathNotFound {
                path: path.to_string(),
            })
    }
}

/// What happened to the fake repository
#[derive(Debug, Default)]
pub struct VcsState {
    pub files: BTreeMap<String, String>,
    pub staged: Vec<String>,
    pub commits: Vec<(String, Signature)>,
    pub pushes: Vec<(String, bool)>,
    pub fail_push: bool,
}

/// Working tree and repository held in memory
#[derive(Clone, Default)]
pub struct FakeVcs {
    pub state: Arc<Mutex<VcsState>>,
}

impl FakeVcs {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let vcs = Self::default();
        {
            let mut state = vcs.state.lock().unwrap();
            for (path, content) in files {
                state.files.insert(path.to_string(), content.to_string());
            }
        }
        vcs
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state.lock().unwrap().files.get(path).cloned()
    }
}

struct FakeWriter {
    state: Arc<Mutex<VcsState>>,
    path: String,
}

impl Write for FakeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let file = state.files.entry(self.path.clone()).or_default();
        file.push_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl VersionControl for FakeVcs {
    fn read(&self, path: &str) -> Result<Option<String>, VcsError> {
        Ok(self.file(path))
    }

    fn open_for_overwrite(&self, path: &str) -> Result<Box<dyn Write + '_>, VcsError> {
        let mut state = self.state.lock().unwrap();
        match state.files.get_mut(path) {
            Some(content) => content.clear(),
            None => {
                return Err(VcsError::MissingPath {
                    path: path.to_string(),
                })
            }
        }
        Ok(Box::new(FakeWriter {
            state: self.state.clone(),
            path: path.to_string(),
        }))
    }

    fn stage(&self, path: &str) -> Result<(), VcsError> {
        self.state.lock().unwrap().staged.push(path.to_string());
        Ok(())
    }

    fn commit(&self, message: &str, author: &Signature) -> Result<String, VcsError> {
        let mut state = self.state.lock().unwrap();
        state.commits.push((message.to_string(), author.clone()));
        Ok(format!("{:040x}", state.commits.len()))
    }

    fn push(&self, branch: &str, force: bool) -> Result<(), VcsError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_push {
            return Err(VcsError::CommandFailed {
                command: "push".to_string(),
                message: "remote rejected".to_string(),
            });
        }
        state.pushes.push((branch.to_string(), force));
        Ok(())
    }

    fn current_head(&self) -> Result<String, VcsError> {
        let state = self.state.lock().unwrap();
        Ok(format!("{:040x}", state.commits.len()))
    }
}

/// What the fake hosting API was asked and holds
#[derive(Debug)]
pub struct HostingState {
    pub open_prs: Vec<PullRequest>,
    pub default_branch: String,
    pub created: Vec<PullRequestIntent>,
    pub calls: Vec<String>,
    pub fail_create: Option<u16>,
}

impl Default for HostingState {
    fn default() -> Self {
        Self {
            open_prs: Vec::new(),
            default_branch: "main".to_string(),
            created: Vec::new(),
            calls: Vec::new(),
            fail_create: None,
        }
    }
}

/// Hosting API that keeps pull requests in memory
#[derive(Clone, Default)]
pub struct FakeHosting {
    pub state: Arc<Mutex<HostingState>>,
}

impl FakeHosting {
    pub fn with_default_branch(branch: &str) -> Self {
        let hosting = Self::default();
        hosting.state.lock().unwrap().default_branch = branch.to_string();
        hosting
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl HostingApi for FakeHosting {
    async fn list_open_pull_requests(
        &self,
        head: &str,
    ) -> Result<Vec<PullRequest>, HostingApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list {}", head));
        Ok(state
            .open_prs
            .iter()
            .filter(|pr| pr.head_ref == head)
            .cloned()
            .collect())
    }

    async fn default_branch(&self) -> Result<String, HostingApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("default_branch".to_string());
        Ok(state.default_branch.clone())
    }

    async fn create_pull_request(
        &self,
        intent: &PullRequestIntent,
    ) -> Result<PullRequest, HostingApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {} -> {}", intent.head_branch, intent.base_branch));
        if let Some(status) = state.fail_create {
            return Err(HostingApiError::from_status(
                "create pull request",
                status,
                "Validation Failed",
            ));
        }

        let pr = PullRequest {
            number: 100 + state.created.len() as u64,
            head_ref: intent.head_branch.clone(),
            url: None,
        };
        state.created.push(intent.clone());
        state.open_prs.push(pr.clone());
        Ok(pr)
    }
}

/// A scan result that rewrites one file
pub fn modified(path: &str, content: &str) -> ScanResult {
    let mut result = ScanResult::new();
    result.add_modified(path, content);
    result
}

/// A scan result that only processed files
pub fn processed(paths: &[&str]) -> ScanResult {
    let mut result = ScanResult::new();
    for path in paths {
        result.add_processed(*path);
    }
    result
}

/// Configuration with only the actions path set
pub fn config(open_pr: bool, fail_on_unpinned: bool) -> Config {
    Config {
        repo_owner: "stacklok".to_string(),
        repo_name: "demo".to_string(),
        repo_root: ".".into(),
        token: Some("token".to_string()),
        api_url: None,
        actions_paths: vec![".github/workflows".to_string()],
        dockerfiles_paths: Vec::new(),
        kubernetes_paths: Vec::new(),
        docker_compose_paths: Vec::new(),
        open_pr,
        fail_on_unpinned,
        dry_run: false,
        exclusions: Exclusions::default(),
        hosting_backend: HostingBackend::Api,
    }
}
