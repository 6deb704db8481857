//! Run orchestration: tree, selection, transformation, assembly and output.

use crate::chunking::{self, Chunk};
use crate::config::ResolvedConfig;
use crate::error::{AppError, Result};
use crate::gather::{self, IgnoreSet, SelectedFile};
use crate::output_formats::{self, ChunkFile, ChunkInfo, ContentBlock};
use crate::transform;
use crate::tree::{self, DirTree};
use chrono::{DateTime, Local};
use log;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Everything a run produces before it is written anywhere.
#[derive(Debug, Clone)]
pub struct AssembledOutput {
    /// Header first, then one rendered block per file.
    pub blocks: Vec<String>,
    pub files: Vec<SelectedFile>,
    pub tree: Option<DirTree>,
    pub read_errors: usize,
}

impl AssembledOutput {
    pub fn text(&self) -> String {
        self.blocks.concat()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub written: Vec<ChunkFile>,
    pub files_included: usize,
    pub read_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_directories: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_files: Option<usize>,
}

pub struct Aggregator {
    config: ResolvedConfig,
}

impl Aggregator {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::new(&self.config.root, &self.config.ignore_dirs)
    }

    pub fn render_tree(&self) -> Result<DirTree> {
        tree::render_tree(
            &self.config.root,
            &self.ignore_set(),
            &self.config.exclude_files,
        )
    }

    /// Files that would be emitted, in emission order.
    pub fn plan(&self) -> Result<Vec<SelectedFile>> {
        gather::gather_files(&self.config)
    }

    pub fn assemble(&self) -> Result<AssembledOutput> {
        self.assemble_at(&Local::now())
    }

    pub fn assemble_at(&self, timestamp: &DateTime<Local>) -> Result<AssembledOutput> {
        let tree = if self.config.include_dirtree {
            Some(self.render_tree()?)
        } else {
            None
        };
        let header = output_formats::header_block(
            timestamp,
            self.config.description.as_deref(),
            tree.as_ref().map(|t| t.text.as_str()),
        );

        let files = self.plan()?;
        log::debug!("Transforming {} files", files.len());
        let mut blocks = Vec::with_capacity(files.len() + 1);
        blocks.push(header);
        let mut read_errors = 0;
        for file in &files {
            let block: ContentBlock = transform::transform_file(&file.entry, &self.config);
            if block.read_failed {
                read_errors += 1;
            }
            blocks.push(block.render());
        }

        Ok(AssembledOutput {
            blocks,
            files,
            tree,
            read_errors,
        })
    }

    /// Assembles and writes the output artifacts.
    pub fn aggregate(&self) -> Result<AggregateReport> {
        let assembled = self.assemble()?;
        let written = self.write(&assembled)?;
        Ok(AggregateReport {
            written,
            files_included: assembled.files.len(),
            read_errors: assembled.read_errors,
            tree_directories: assembled.tree.as_ref().map(|t| t.directories),
            tree_files: assembled.tree.as_ref().map(|t| t.files),
        })
    }

    fn write(&self, assembled: &AssembledOutput) -> Result<Vec<ChunkFile>> {
        if self.config.split_at == 0 {
            let path = self.config.output_path();
            let text = assembled.text();
            write_artifact(&path, &text)?;
            log::info!("Aggregation complete: {}", path.display());
            return Ok(vec![ChunkFile {
                lines: text.lines().count(),
                bytes: text.len(),
                path,
                chunk_info: None,
            }]);
        }

        let chunks: Vec<Chunk> =
            chunking::split_blocks_into_chunks(&assembled.blocks, self.config.split_at);
        let total_parts = chunks.len();
        let mut written = Vec::with_capacity(total_parts);
        for chunk in chunks {
            let path = self.config.chunk_path(chunk.index);
            write_artifact(&path, &chunk.text)?;
            log::info!("Wrote {} lines to {}", chunk.lines, path.display());
            written.push(ChunkFile {
                path,
                lines: chunk.lines,
                bytes: chunk.text.len(),
                chunk_info: Some(ChunkInfo {
                    current_part: chunk.index,
                    total_parts,
                }),
            });
        }
        Ok(written)
    }
}

/// Writes `text` to `path`, creating parent directories as needed.
pub fn write_artifact(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| AppError::DirCreation {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    fs::write(path, text).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
