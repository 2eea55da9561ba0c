//! Proposals saved as JSON files under `<data root>/proposals`.
//!
//! Files are plain serializations of [`Proposal`]. Reading always goes back
//! through the normalizer, so hand-edited or older files load as long as
//! they are valid JSON.

use serde_json::Value;
use slug::slugify;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

use crate::error::{AppError, Result};
use crate::ids::IdGenerator;
use crate::model::Proposal;
use crate::normalize::Normalizer;

pub struct ProposalStore {
    dir: PathBuf,
}

impl ProposalStore {
    pub fn new(root: &Path) -> Self {
        ProposalStore {
            dir: root.join("proposals"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored proposal files, most recently modified first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(AppError::io(&self.dir))?;
        let mut files: Vec<(Option<SystemTime>, PathBuf)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
                (modified, path)
            })
            .collect();
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    pub fn load<G: IdGenerator>(
        &self,
        path: &Path,
        normalizer: &mut Normalizer<G>,
    ) -> Result<Proposal> {
        read_proposal(path, normalizer)
    }

    /// Stamps `updatedAt` and writes the proposal, returning its path.
    pub fn save<G: IdGenerator>(
        &self,
        proposal: &mut Proposal,
        normalizer: &Normalizer<G>,
    ) -> Result<PathBuf> {
        proposal.touch(normalizer.now());
        fs::create_dir_all(&self.dir).map_err(AppError::io(&self.dir))?;

        let path = self.dir.join(file_name(proposal));
        let json = serde_json::to_string_pretty(proposal)?;
        fs::write(&path, json).map_err(AppError::io(&path))?;
        info!(path = %path.display(), scopes = proposal.scopes.len(), "proposal saved");
        Ok(path)
    }

    /// Normalizes an outside file and saves the result into the store.
    pub fn import<G: IdGenerator>(
        &self,
        source: &Path,
        normalizer: &mut Normalizer<G>,
    ) -> Result<(Proposal, PathBuf)> {
        let mut proposal = read_proposal(source, normalizer)?;
        let path = self.save(&mut proposal, normalizer)?;
        Ok((proposal, path))
    }
}

pub fn read_proposal<G: IdGenerator>(
    path: &Path,
    normalizer: &mut Normalizer<G>,
) -> Result<Proposal> {
    let content = fs::read_to_string(path).map_err(AppError::io(path))?;
    let raw: Value = serde_json::from_str(&content).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "proposal loaded");
    Ok(normalizer.proposal(&raw))
}

/// `<slug of name>_<first 8 chars of id>.json`
pub fn file_name(proposal: &Proposal) -> String {
    let mut stem = slugify(&proposal.name);
    if stem.is_empty() {
        stem = "proposal".to_string();
    }
    let short_id: String = proposal
        .id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect();
    if short_id.is_empty() {
        format!("{stem}.json")
    } else {
        format!("{stem}_{short_id}.json")
    }
}
