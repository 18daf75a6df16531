//! Server configuration
//!
//! Built once from command-line arguments (with environment fallbacks) at
//! startup and shared read-only with every request.

use std::net::SocketAddr;

use anyhow::bail;
use clap::Parser;
use pdfmerge_core::{LopdfBackend, Merger, UploadPolicy, DEFAULT_FIELD_NAME, MIN_FILES};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Command-line arguments for the PDF merge server
#[derive(Parser, Debug)]
#[command(name = "pdfmerge-server")]
#[command(about = "Merge uploaded PDFs into a single download")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Multipart field carrying the PDFs
    #[arg(long, default_value = DEFAULT_FIELD_NAME)]
    pub field_name: String,

    /// Minimum number of files per merge request
    #[arg(long, default_value_t = MIN_FILES)]
    pub min_files: usize,

    /// Maximum request body size in megabytes
    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "100")]
    pub max_upload_mb: usize,

    /// Write merged output without stream compression
    #[arg(long)]
    pub no_compress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub field_name: String,
    pub min_files: usize,
    pub max_upload_bytes: usize,
    pub compress: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            min_files: MIN_FILES,
            max_upload_bytes: 100 * BYTES_PER_MB,
            compress: true,
        }
    }
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            field_name: args.field_name.clone(),
            min_files: args.min_files,
            max_upload_bytes: args.max_upload_mb.saturating_mul(BYTES_PER_MB),
            compress: !args.no_compress,
        }
    }
}

impl ServerConfig {
    /// Reject settings that would break the merge contract.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_files < MIN_FILES {
            bail!(
                "--min-files must be at least {} (got {})",
                MIN_FILES,
                self.min_files
            );
        }

        if self.max_upload_bytes == 0 {
            bail!("--max-upload-mb must be at least 1");
        }

        if self.field_name.is_empty() {
            bail!("--field-name cannot be empty");
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.field_name.clone(), self.min_files)
    }

    pub fn merger(&self) -> Merger<LopdfBackend> {
        Merger::with_backend(LopdfBackend::with_compression(self.compress))
            .min_documents(self.min_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_args_defaults() {
        let args = Args::parse_from(["pdfmerge-server"]);
        let config = ServerConfig::from(&args);

        assert_eq!(config.field_name, "files");
        assert_eq!(config.min_files, 2);
        assert!(config.compress);
        assert_eq!(config.max_upload_bytes, ServerConfig::default().max_upload_bytes);
    }

    #[test]
    fn test_args_override() {
        let args = Args::parse_from([
            "pdfmerge-server",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--field-name",
            "pdfs",
            "--max-upload-mb",
            "5",
            "--no-compress",
        ]);
        let config = ServerConfig::from(&args);

        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.field_name, "pdfs");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(!config.compress);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_min_files_below_two_is_rejected() {
        for min_files in ["0", "1"] {
            let args = Args::parse_from(["pdfmerge-server", "--min-files", min_files]);
            let err = ServerConfig::from(&args).validate().unwrap_err();
            assert!(err.to_string().contains("--min-files must be at least 2"));
        }

        let args = Args::parse_from(["pdfmerge-server", "--min-files", "3"]);
        assert!(ServerConfig::from(&args).validate().is_ok());
    }

    #[test]
    fn test_zero_upload_limit_is_rejected() {
        let args = Args::parse_from(["pdfmerge-server", "--max-upload-mb", "0"]);
        assert!(ServerConfig::from(&args).validate().is_err());
    }

    #[test]
    fn test_bind_addr_rejects_bad_host() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
