//! Rule set seeding

use super::read_document;
use crate::backends::Backends;
use crate::error::CliResult;
use crate::output::{print_single, print_success, OutputFormat};
use clap::Args;
use srm_seed::SeedLoader;
use srm_types::{LoadMode, LoadReceipt};
use std::path::{Path, PathBuf};

/// Arguments for `srm seed`
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Seed document (JSON or YAML)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Reuse the existing rule set with the same family and revision
    #[arg(long)]
    pub upsert: bool,

    /// Delete the reused rule set's rules before inserting
    #[arg(long, requires = "upsert")]
    pub wipe: bool,
}

impl SeedArgs {
    pub fn mode(&self) -> LoadMode {
        if self.upsert {
            LoadMode::Upsert { wipe: self.wipe }
        } else {
            LoadMode::AlwaysNew
        }
    }
}

/// Load a seed file into the rule store.
pub async fn load_file(path: &Path, mode: LoadMode, backends: &Backends) -> CliResult<LoadReceipt> {
    let document = read_document(path)?;
    let receipt = SeedLoader::new(backends.rules.clone())
        .load_value(&document, mode)
        .await?;
    Ok(receipt)
}

/// Execute `srm seed`
pub async fn execute(args: SeedArgs, backends: &Backends, format: OutputFormat) -> CliResult<()> {
    let receipt = load_file(&args.file, args.mode(), backends).await?;
    match format {
        OutputFormat::Table => print_success(&format!(
            "Seeded rule_set_id={} inserted_rules={} total_rules={}",
            receipt.rule_set_id, receipt.inserted_count, receipt.total_count
        )),
        _ => print_single(&receipt, format)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use std::io::Write;

    const SEED_YAML: &str = r#"
rule_set:
  name: B787 demo limits
  aircraft_family: B787
  revision: DEMO-01
rules:
  - damage_type: dent
    structure: skin
    structure_zone: fuselage
    limits:
      max_diameter_mm: 50
    actions:
      disposition: ALLOW_AS_IS
"#;

    #[tokio::test]
    async fn test_yaml_seed_file_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SEED_YAML.as_bytes()).unwrap();
        let backends = Backends::open(&StorageConfig::Memory).await.unwrap();

        let receipt = load_file(file.path(), LoadMode::Upsert { wipe: true }, &backends)
            .await
            .unwrap();
        assert_eq!(receipt.inserted_count, 1);

        let again = load_file(file.path(), LoadMode::Upsert { wipe: true }, &backends)
            .await
            .unwrap();
        assert_eq!(again.rule_set_id, receipt.rule_set_id);
        assert_eq!(again.total_count, 1);
    }

    #[test]
    fn test_mode_from_flags() {
        let args = SeedArgs {
            file: PathBuf::from("seed.json"),
            upsert: true,
            wipe: false,
        };
        assert_eq!(args.mode(), LoadMode::Upsert { wipe: false });
    }
}
