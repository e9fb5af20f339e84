//! FTP order drop client.
//!
//! The FTP library is synchronous, so every exchange runs inside
//! `spawn_blocking` with a connection opened and quit within that one call.
//! Holding a connection across the whole run would only give the drop server
//! an idle socket to time out.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tokio::task;
use tracing::{info, warn};

use crate::clients::OrderFileSource;
use crate::config::{Config, FtpConfig};
use crate::error::TransportError;

pub struct FtpOrderSource {
    ftp: FtpConfig,
    /// Local directory downloads land in, created on first fetch.
    orders_dir: PathBuf,
}

impl FtpOrderSource {
    pub fn new(config: &Config) -> Self {
        Self {
            ftp: config.ftp.clone(),
            orders_dir: config.orders_dir.clone(),
        }
    }
}

#[async_trait]
impl OrderFileSource for FtpOrderSource {
    async fn fetch(&self) -> Result<Vec<String>, TransportError> {
        let ftp = self.ftp.clone();
        let local_dir = self.orders_dir.clone();
        let names = task::spawn_blocking(move || fetch_blocking(&ftp, &local_dir)).await??;
        info!("📥 Downloaded {} order file(s) from the drop", names.len());
        Ok(names)
    }

    async fn archive(&self, names: &[String]) -> Result<(), TransportError> {
        if names.is_empty() {
            return Ok(());
        }
        let ftp = self.ftp.clone();
        let names = names.to_vec();
        task::spawn_blocking(move || archive_blocking(&ftp, &names)).await?
    }
}

fn connect(config: &FtpConfig) -> Result<FtpStream, TransportError> {
    let mut stream = FtpStream::connect(format!("{}:{}", config.host, config.port))?;
    stream.login(config.username.as_str(), config.password.expose())?;
    Ok(stream)
}

fn fetch_blocking(config: &FtpConfig, local_dir: &Path) -> Result<Vec<String>, TransportError> {
    std::fs::create_dir_all(local_dir)?;

    let mut stream = connect(config)?;
    stream.transfer_type(FileType::Binary)?;
    stream.cwd(&config.orders_dir)?;

    // Drop listing order is processing order.
    let names: Vec<String> = stream
        .nlst(None)?
        .into_iter()
        .filter(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .collect();

    let mut downloaded = Vec::with_capacity(names.len());
    for name in names {
        let buffer = stream.retr_as_buffer(&name)?;
        std::fs::write(local_dir.join(&name), buffer.into_inner())?;
        downloaded.push(name);
    }

    stream.quit()?;
    Ok(downloaded)
}

fn archive_blocking(config: &FtpConfig, names: &[String]) -> Result<(), TransportError> {
    let mut stream = connect(config)?;

    let orders_dir = config.orders_dir.trim_end_matches('/');
    let archive_dir = config.archive_dir.trim_end_matches('/');
    for name in names {
        let from = format!("{orders_dir}/{name}");
        let to = format!("{archive_dir}/{name}");
        // A single stuck file must not keep the rest of the batch in the drop.
        match stream.rename(&from, &to) {
            Ok(()) => info!("🗄️ Archived {name} on the drop"),
            Err(e) => warn!("⚠️ Could not archive {name} on the drop: {e}"),
        }
    }

    stream.quit()?;
    Ok(())
}
