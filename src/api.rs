use std::path::Path;

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Agent {
    pub name: String,
    pub slug: String,
    pub description: String,
}

#[derive(Deserialize)]
struct AgentsResponse {
    #[serde(default)]
    agents: Vec<Agent>,
}

#[derive(Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<String>,
}

/// Which server-side file store a listing or download targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Uploads,
    Outputs,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Uploads => "uploads",
            FileKind::Outputs => "outputs",
        }
    }
}

#[derive(Clone)]
pub struct FoundryClient {
    client: Client,
    base_url: String,
}

impl FoundryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        let url = format!("{}/agents", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Agent listing failed with status: {}", response.status()));
        }

        let agents: AgentsResponse = response.json().await?;
        Ok(agents.agents)
    }

    pub async fn get_agent(&self, slug: &str) -> Result<Agent> {
        let url = format!("{}/agents/{}", self.base_url, slug);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Agent '{}' not found ({})", slug, response.status()));
        }

        Ok(response.json().await?)
    }

    pub async fn list_files(&self, kind: FileKind) -> Result<Vec<String>> {
        let url = format!("{}/files/{}", self.base_url, kind.as_str());
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Listing {} failed with status: {}",
                kind.as_str(),
                response.status()
            ));
        }

        let files: FilesResponse = response.json().await?;
        Ok(files.files)
    }

    /// Upload one local file under the repeatable `files` multipart field.
    pub async fn upload_file(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Not a valid file path: {}", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        let form = Form::new().part("files", Part::bytes(bytes).file_name(name));

        let url = format!("{}/upload", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Upload failed with status: {}", response.status()));
        }
        Ok(())
    }

    /// Kick off an agent run. The returned response body is the event
    /// stream; the caller owns its consumption.
    pub async fn run_agent(&self, slug: &str, prompt: &str) -> Result<Response> {
        let form = Form::new().text("prompt", prompt.to_string());

        let url = format!("{}/run/{}", self.base_url, slug);
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Agent run failed with status: {}", response.status()));
        }
        Ok(response)
    }

    pub async fn download_file(&self, kind: FileKind, name: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/download/{}/{}",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(name)
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Download of '{}' failed with status: {}",
                name,
                response.status()
            ));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agents_response_deserialization() {
        let json = r#"{"agents":[{"name":"Researcher","slug":"researcher","description":"Looks things up"}]}"#;
        let parsed: AgentsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.agents.len(), 1);
        assert_eq!(parsed.agents[0].slug, "researcher");
    }

    #[test]
    fn files_response_tolerates_missing_field() {
        let parsed: FilesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.files.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = FoundryClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
