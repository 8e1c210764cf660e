use clap::Parser;
use sbom_collector::config::ConfigOverrides;
use sbom_collector::sbom_processing::domain::Dialect;
use std::path::PathBuf;

/// Collect SBOMs from GitHub, Mend or Wiz, normalize them to CycloneDX and
/// load them into an object store and ClickHouse
#[derive(Parser, Debug)]
#[command(name = "sbom-collector")]
#[command(version)]
#[command(about = "Collect, normalize, merge and load SBOMs", long_about = None)]
pub struct Args {
    /// Path to the config file (defaults to ./sbom-collector.config.yml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SBOM provider: github, mend or wiz
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Merge the documents already stored under the prefix instead of fetching
    #[arg(long)]
    pub merge: bool,

    /// Format of the uploaded document: cyclonedx or spdx
    #[arg(short = 'f', long)]
    pub output_format: Option<Dialect>,

    /// Object key for the uploaded document
    #[arg(short, long, value_name = "KEY")]
    pub output_key: Option<String>,

    /// Merge only objects whose file name matches one of these patterns
    /// (comma-separated, supports wildcards: "backend-*,api-*")
    #[arg(long, value_name = "PATTERNS")]
    pub include: Option<String>,

    /// Skip objects whose file name matches one of these patterns (comma-separated)
    #[arg(long, value_name = "PATTERNS")]
    pub exclude: Option<String>,

    /// Empty the destination table before inserting
    #[arg(long)]
    pub truncate: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider.clone(),
            merge: self.merge,
            output_format: self.output_format,
            output_key: self.output_key.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            truncate: self.truncate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from(["sbom-collector"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.merge);
        assert!(!args.truncate);
    }

    #[test]
    fn test_parse_all_flags() {
        let args = Args::try_parse_from([
            "sbom-collector",
            "--config",
            "ci.yml",
            "--provider",
            "wiz",
            "--merge",
            "--output-format",
            "spdx",
            "--output-key",
            "out/merged.json",
            "--include",
            "a-*,b-*",
            "--exclude",
            "legacy-*",
            "--truncate",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("ci.yml")));
        let overrides = args.overrides();
        assert_eq!(overrides.provider.as_deref(), Some("wiz"));
        assert!(overrides.merge);
        assert_eq!(overrides.output_format, Some(Dialect::Spdx));
        assert_eq!(overrides.output_key.as_deref(), Some("out/merged.json"));
        assert_eq!(overrides.include.as_deref(), Some("a-*,b-*"));
        assert_eq!(overrides.exclude.as_deref(), Some("legacy-*"));
        assert!(overrides.truncate);
    }

    #[test]
    fn test_output_format_case_insensitive() {
        let args = Args::try_parse_from(["sbom-collector", "-f", "CycloneDX"]).unwrap();
        assert_eq!(args.output_format, Some(Dialect::CycloneDx));
    }

    #[test]
    fn test_invalid_output_format() {
        let error = Args::try_parse_from(["sbom-collector", "--output-format", "swid"]).unwrap_err();
        assert!(error.to_string().contains("Invalid SBOM format"));
    }
}
