use audex_crypto::hash_canonical;
use audex_types::ContentHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReplayError;

/// A rule-pack version as it was resolved when the period closed.
///
/// Replay uses these frozen versions directly — never a live resolver —
/// because the point is reproducing history under the configuration that
/// was active then.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackVersion {
    /// Pack name.
    pub pack: String,
    /// Version that was active.
    pub version_id: String,
    /// Canonical-JSON hash of the version's data at freeze time.
    pub content_hash: ContentHash,
    /// The frozen rule data itself.
    pub data: Value,
}

/// A frozen replay case: input snapshot, resolved pack versions, and the
/// expected canonical-output hash. Consumed repeatedly, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCase {
    /// The canonical request/input the period's output was computed from.
    pub input: Value,
    /// Rule-pack versions active when the expectation was frozen.
    pub resolved_packs: Vec<ResolvedPackVersion>,
    /// Hex SHA-256 of the canonical output, frozen at period close.
    pub expected_hash: ContentHash,
}

/// The pluggable deterministic computation being verified.
///
/// Implementations are the report modules' entry points. They must be pure
/// functions of `(input, resolved_packs)`: no clock, no randomness, no
/// live configuration lookups.
pub trait ReplayComputer {
    /// Recompute the output for a frozen input under frozen pack versions.
    fn compute(
        &self,
        input: &Value,
        resolved_packs: &[ResolvedPackVersion],
    ) -> Result<Value, ReplayError>;
}

impl<F> ReplayComputer for F
where
    F: Fn(&Value, &[ResolvedPackVersion]) -> Result<Value, ReplayError>,
{
    fn compute(
        &self,
        input: &Value,
        resolved_packs: &[ResolvedPackVersion],
    ) -> Result<Value, ReplayError> {
        self(input, resolved_packs)
    }
}

/// Outcome of a replay: observed output and hash next to the expectation.
///
/// Mismatch is a soft, diff-friendly result so a harness can report
/// actionable detail; the caller decides whether it means drift,
/// tampering, or an approved rule change needing a deliberate re-freeze.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    /// The recomputed output.
    pub output: Value,
    /// Canonical hash of the recomputed output.
    pub observed_hash: ContentHash,
    /// The frozen expectation.
    pub expected_hash: ContentHash,
    /// Whether observed and expected hashes are identical.
    pub matched: bool,
}

/// Replay verifier. Stateless; all state lives in the [`ReplayCase`].
pub struct ReplayEngine;

impl ReplayEngine {
    /// Recompute a case's output, hash its canonical encoding, and compare
    /// against the frozen expectation.
    pub fn replay<C: ReplayComputer>(
        case: &ReplayCase,
        computer: &C,
    ) -> Result<ReplayResult, ReplayError> {
        let output = computer.compute(&case.input, &case.resolved_packs)?;
        let observed_hash = hash_canonical(&output)?;
        Ok(ReplayResult {
            output,
            observed_hash,
            expected_hash: case.expected_hash,
            matched: observed_hash == case.expected_hash,
        })
    }

    /// Hash a computed output the same way `replay` does. Used when
    /// freezing an expectation.
    pub fn output_hash(output: &Value) -> Result<ContentHash, ReplayError> {
        Ok(hash_canonical(output)?)
    }
}
