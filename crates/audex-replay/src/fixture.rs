use std::fs;
use std::path::{Path, PathBuf};

use audex_types::ContentHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::engine::{ReplayCase, ReplayComputer, ReplayEngine, ReplayResult, ResolvedPackVersion};
use crate::error::ReplayError;

/// `manifest.json` body: points at the input file and carries the pack
/// versions frozen with the case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseManifest {
    /// Path of the canonical input file, relative to the case directory.
    pub input_path: String,
    /// Rule-pack versions resolved when the case was frozen.
    #[serde(default)]
    pub packs: Vec<ResolvedPackVersion>,
}

/// One replay fixture directory:
///
/// ```text
/// <case>/manifest.json        input_path + frozen pack versions
/// <case>/input.json           canonical request
/// <case>/expected_hash.txt    hex SHA-256 of the canonical output
/// ```
///
/// `run` never writes; `freeze` intentionally recomputes and overwrites
/// `expected_hash.txt`.
pub struct FixtureDir {
    dir: PathBuf,
}

impl FixtureDir {
    /// Wrap an existing case directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The case directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write a fresh fixture: manifest, input, and a frozen expectation
    /// computed with `computer`.
    pub fn create<C: ReplayComputer>(
        dir: impl Into<PathBuf>,
        input: &Value,
        packs: Vec<ResolvedPackVersion>,
        computer: &C,
    ) -> Result<Self, ReplayError> {
        let fixture = Self::new(dir);
        fs::create_dir_all(&fixture.dir)?;

        let manifest = CaseManifest {
            input_path: "input.json".to_string(),
            packs,
        };
        fs::write(
            fixture.dir.join("manifest.json"),
            serde_json::to_vec_pretty(&manifest)
                .map_err(|e| ReplayError::Fixture(e.to_string()))?,
        )?;
        fs::write(
            fixture.dir.join("input.json"),
            serde_json::to_vec_pretty(input).map_err(|e| ReplayError::Fixture(e.to_string()))?,
        )?;
        fixture.freeze(computer)?;
        Ok(fixture)
    }

    /// Load the frozen case from disk.
    pub fn load_case(&self) -> Result<ReplayCase, ReplayError> {
        let manifest = self.load_manifest()?;
        let input_bytes = fs::read(self.dir.join(&manifest.input_path))?;
        let input: Value = serde_json::from_slice(&input_bytes)
            .map_err(|e| ReplayError::Fixture(format!("input.json: {e}")))?;

        let hash_text = fs::read_to_string(self.expected_hash_path())?;
        let expected_hash = ContentHash::from_hex(hash_text.trim())?;

        Ok(ReplayCase {
            input,
            resolved_packs: manifest.packs,
            expected_hash,
        })
    }

    /// Run the case read-only: replay and report, never writing anything.
    pub fn run<C: ReplayComputer>(&self, computer: &C) -> Result<ReplayResult, ReplayError> {
        let case = self.load_case()?;
        ReplayEngine::replay(&case, computer)
    }

    /// Recompute the expectation and overwrite `expected_hash.txt`.
    ///
    /// This is the one deliberate mutation in the replay surface, used when
    /// an approved rule change requires re-freezing a period.
    pub fn freeze<C: ReplayComputer>(&self, computer: &C) -> Result<ContentHash, ReplayError> {
        let manifest = self.load_manifest()?;
        let input_bytes = fs::read(self.dir.join(&manifest.input_path))?;
        let input: Value = serde_json::from_slice(&input_bytes)
            .map_err(|e| ReplayError::Fixture(format!("input.json: {e}")))?;

        let output = computer.compute(&input, &manifest.packs)?;
        let hash = ReplayEngine::output_hash(&output)?;
        fs::write(self.expected_hash_path(), format!("{}\n", hash.to_hex()))?;
        info!(case = %self.dir.display(), hash = %hash.short_hex(), "expectation frozen");
        Ok(hash)
    }

    fn load_manifest(&self) -> Result<CaseManifest, ReplayError> {
        let bytes = fs::read(self.dir.join("manifest.json"))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ReplayError::Fixture(format!("manifest.json: {e}")))
    }

    fn expected_hash_path(&self) -> PathBuf {
        self.dir.join("expected_hash.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audex_crypto::hash_canonical;

    fn doubler(input: &Value, _packs: &[ResolvedPackVersion]) -> Result<Value, ReplayError> {
        let n = input["n"]
            .as_i64()
            .ok_or_else(|| ReplayError::Computation("input.n missing".to_string()))?;
        Ok(serde_json::json!({"doubled": n * 2}))
    }

    fn pack(rate: i64) -> ResolvedPackVersion {
        let data = serde_json::json!({"rate": rate});
        ResolvedPackVersion {
            pack: "vat".to_string(),
            version_id: format!("r{rate}"),
            content_hash: hash_canonical(&data).unwrap(),
            data,
        }
    }

    #[test]
    fn create_then_run_matches() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FixtureDir::create(
            dir.path().join("case-001"),
            &serde_json::json!({"n": 21}),
            vec![pack(19)],
            &doubler,
        )
        .unwrap();

        let result = fixture.run(&doubler).unwrap();
        assert!(result.matched);
        assert_eq!(result.output["doubled"], 42);
    }

    #[test]
    fn layout_matches_contract() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FixtureDir::create(
            dir.path().join("case-001"),
            &serde_json::json!({"n": 1}),
            vec![],
            &doubler,
        )
        .unwrap();

        assert!(fixture.path().join("manifest.json").exists());
        assert!(fixture.path().join("input.json").exists());
        let hash_text = fs::read_to_string(fixture.path().join("expected_hash.txt")).unwrap();
        assert!(ContentHash::from_hex(hash_text.trim()).is_ok());
    }

    #[test]
    fn run_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FixtureDir::create(
            dir.path().join("case-001"),
            &serde_json::json!({"n": 5}),
            vec![],
            &doubler,
        )
        .unwrap();

        let before = fs::read_to_string(fixture.path().join("expected_hash.txt")).unwrap();
        // A drifted computation mismatches but must not touch the file.
        let drifted = |input: &Value, _: &[ResolvedPackVersion]| {
            let n = input["n"].as_i64().unwrap_or(0);
            Ok(serde_json::json!({"doubled": n * 3}))
        };
        let result = fixture.run(&drifted).unwrap();
        assert!(!result.matched);
        let after = fs::read_to_string(fixture.path().join("expected_hash.txt")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn freeze_overwrites_expectation() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FixtureDir::create(
            dir.path().join("case-001"),
            &serde_json::json!({"n": 5}),
            vec![],
            &doubler,
        )
        .unwrap();

        let drifted = |input: &Value, _: &[ResolvedPackVersion]| {
            let n = input["n"].as_i64().unwrap_or(0);
            Ok(serde_json::json!({"doubled": n * 3}))
        };
        assert!(!fixture.run(&drifted).unwrap().matched);

        // Deliberate re-freeze against the drifted computation.
        fixture.freeze(&drifted).unwrap();
        assert!(fixture.run(&drifted).unwrap().matched);
        assert!(!fixture.run(&doubler).unwrap().matched);
    }

    #[test]
    fn frozen_packs_travel_with_the_case() {
        let dir = tempfile::tempdir().unwrap();
        let with_rate = |input: &Value, packs: &[ResolvedPackVersion]| {
            let n = input["n"].as_i64().unwrap_or(0);
            let rate = packs[0].data["rate"].as_i64().unwrap_or(0);
            Ok(serde_json::json!({"taxed": n * rate}))
        };
        let fixture = FixtureDir::create(
            dir.path().join("case-001"),
            &serde_json::json!({"n": 10}),
            vec![pack(19)],
            &with_rate,
        )
        .unwrap();

        let case = fixture.load_case().unwrap();
        assert_eq!(case.resolved_packs[0].version_id, "r19");
        assert!(fixture.run(&with_rate).unwrap().matched);
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FixtureDir::new(dir.path().join("empty-case"));
        assert!(matches!(
            fixture.run(&doubler),
            Err(ReplayError::Io(_))
        ));
    }

    #[test]
    fn garbled_expected_hash_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = FixtureDir::create(
            dir.path().join("case-001"),
            &serde_json::json!({"n": 5}),
            vec![],
            &doubler,
        )
        .unwrap();
        fs::write(fixture.path().join("expected_hash.txt"), "not-hex\n").unwrap();
        assert!(matches!(
            fixture.load_case(),
            Err(ReplayError::ExpectedHash(_))
        ));
    }
}
