use audex_crypto::hash_canonical;
use audex_types::ContentHash;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// Inclusive effective-date window.
///
/// `to == None` means open-ended. Adjacency means the next window's `from`
/// is exactly the calendar day after this window's `to`; adjacent windows
/// do not overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveWindow {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl EffectiveWindow {
    /// Whether `date` falls inside this window (both bounds inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && self.to.map_or(true, |to| date <= to)
    }

    /// Whether two windows intersect. Open ends extend to +∞.
    pub fn overlaps(&self, other: &Self) -> bool {
        let self_reaches = self.to.map_or(true, |to| other.from <= to);
        let other_reaches = other.to.map_or(true, |to| self.from <= to);
        self_reaches && other_reaches
    }
}

/// One version of a rule pack: an effective-date window plus the rule data
/// active inside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePackVersion {
    /// Name of the pack this version belongs to.
    pub pack_name: String,
    /// Version identifier, unique within the pack.
    pub version_id: String,
    /// First day this version is authoritative.
    pub effective_from: NaiveDate,
    /// Last day this version is authoritative (inclusive); `None` =
    /// open-ended.
    pub effective_to: Option<NaiveDate>,
    /// Canonical-JSON SHA-256 of `data`.
    pub content_hash: ContentHash,
    /// The rule data itself. Opaque to the core.
    pub data: serde_json::Value,
}

impl RulePackVersion {
    /// This version's effective window.
    pub fn window(&self) -> EffectiveWindow {
        EffectiveWindow {
            from: self.effective_from,
            to: self.effective_to,
        }
    }
}

/// A fully validated rule pack: a name and its versions, sorted by
/// `effective_from`, with pairwise non-overlapping windows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePack {
    name: String,
    versions: Vec<RulePackVersion>,
}

/// On-disk pack body, JSON or YAML:
/// `{"pack": name, "versions": [{"effective_from", "effective_to"|null, "data"}]}`.
#[derive(Debug, Deserialize)]
struct PackFile {
    pack: String,
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    #[serde(default)]
    version_id: Option<String>,
    effective_from: NaiveDate,
    #[serde(default)]
    effective_to: Option<NaiveDate>,
    data: serde_json::Value,
}

impl RulePack {
    /// Build and validate a pack from already-parsed versions.
    ///
    /// Fails closed: any schema problem or window overlap rejects the
    /// whole pack.
    pub fn new(name: impl Into<String>, versions: Vec<RulePackVersion>) -> Result<Self, PackError> {
        let name = name.into();
        if versions.is_empty() {
            return Err(PackError::Validation {
                pack: name,
                reason: "pack has no versions".to_string(),
            });
        }

        let mut versions = versions;
        versions.sort_by_key(|v| v.effective_from);

        for v in &versions {
            if v.pack_name != name {
                return Err(PackError::Validation {
                    pack: name.clone(),
                    reason: format!(
                        "version {} belongs to pack {:?}",
                        v.version_id, v.pack_name
                    ),
                });
            }
            if let Some(to) = v.effective_to {
                if v.effective_from > to {
                    return Err(PackError::Validation {
                        pack: name.clone(),
                        reason: format!(
                            "version {}: effective_from {} is after effective_to {}",
                            v.version_id, v.effective_from, to
                        ),
                    });
                }
            }
        }

        for i in 0..versions.len() {
            for j in (i + 1)..versions.len() {
                if versions[i].version_id == versions[j].version_id {
                    return Err(PackError::Validation {
                        pack: name.clone(),
                        reason: format!("duplicate version_id {}", versions[i].version_id),
                    });
                }
                if versions[i].window().overlaps(&versions[j].window()) {
                    return Err(PackError::Overlap {
                        pack: name.clone(),
                        left: versions[i].version_id.clone(),
                        right: versions[j].version_id.clone(),
                    });
                }
            }
        }

        Ok(Self { name, versions })
    }

    /// Parse and validate a JSON pack body.
    pub fn from_json_str(json: &str) -> Result<Self, PackError> {
        let file: PackFile =
            serde_json::from_str(json).map_err(|e| PackError::Parse(e.to_string()))?;
        Self::from_pack_file(file)
    }

    /// Parse and validate a YAML pack body.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PackError> {
        let file: PackFile =
            serde_yaml::from_str(yaml).map_err(|e| PackError::Parse(e.to_string()))?;
        Self::from_pack_file(file)
    }

    fn from_pack_file(file: PackFile) -> Result<Self, PackError> {
        let pack_name = file.pack;
        let versions = file
            .versions
            .into_iter()
            .map(|entry| {
                let content_hash = hash_canonical(&entry.data).map_err(|e| {
                    PackError::Validation {
                        pack: pack_name.clone(),
                        reason: format!("unhashable data: {e}"),
                    }
                })?;
                Ok(RulePackVersion {
                    pack_name: pack_name.clone(),
                    version_id: entry
                        .version_id
                        .unwrap_or_else(|| format!("{pack_name}@{}", entry.effective_from)),
                    effective_from: entry.effective_from,
                    effective_to: entry.effective_to,
                    content_hash,
                    data: entry.data,
                })
            })
            .collect::<Result<Vec<_>, PackError>>()?;
        Self::new(pack_name, versions)
    }

    /// The pack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Versions sorted by `effective_from`.
    pub fn versions(&self) -> &[RulePackVersion] {
        &self.versions
    }

    /// The unique version whose window contains `date`, or a gap error.
    pub fn resolve(&self, date: NaiveDate) -> Result<&RulePackVersion, PackError> {
        // Deterministic scan in effective_from order; validation guarantees
        // at most one window contains any date.
        self.versions
            .iter()
            .find(|v| v.window().contains(date))
            .ok_or(PackError::NoActiveVersion {
                pack: self.name.clone(),
                date,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn version(id: &str, from: &str, to: Option<&str>) -> RulePackVersion {
        let data = serde_json::json!({"rate": id});
        RulePackVersion {
            pack_name: "vat".to_string(),
            version_id: id.to_string(),
            effective_from: date(from),
            effective_to: to.map(date),
            content_hash: hash_canonical(&data).unwrap(),
            data,
        }
    }

    #[test]
    fn window_contains_is_inclusive_both_ends() {
        let w = EffectiveWindow {
            from: date("2025-01-01"),
            to: Some(date("2025-08-31")),
        };
        assert!(w.contains(date("2025-01-01")));
        assert!(w.contains(date("2025-08-31")));
        assert!(!w.contains(date("2024-12-31")));
        assert!(!w.contains(date("2025-09-01")));
    }

    #[test]
    fn open_ended_window_contains_far_future() {
        let w = EffectiveWindow {
            from: date("2025-09-01"),
            to: None,
        };
        assert!(w.contains(date("2099-01-01")));
        assert!(!w.contains(date("2025-08-31")));
    }

    #[test]
    fn adjacent_windows_are_legal() {
        // v1 ends 2025-08-31, v2 starts the following calendar day.
        let pack = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-08-31")),
                version("v2", "2025-09-01", None),
            ],
        )
        .unwrap();
        assert_eq!(pack.versions().len(), 2);
    }

    #[test]
    fn partial_overlap_is_rejected() {
        let err = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-09-15")),
                version("v2", "2025-09-01", None),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Overlap { .. }));
    }

    #[test]
    fn same_day_overlap_is_rejected() {
        // Inclusive effective_to: sharing a single boundary day overlaps.
        let err = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-09-01")),
                version("v2", "2025-09-01", None),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Overlap { .. }));
    }

    #[test]
    fn two_open_ended_versions_overlap() {
        let err = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", None),
                version("v2", "2025-09-01", None),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Overlap { .. }));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = RulePack::new(
            "vat",
            vec![version("v1", "2025-06-01", Some("2025-01-01"))],
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Validation { .. }));
    }

    #[test]
    fn empty_pack_is_rejected() {
        assert!(matches!(
            RulePack::new("vat", vec![]),
            Err(PackError::Validation { .. })
        ));
    }

    #[test]
    fn duplicate_version_id_is_rejected() {
        let err = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-03-31")),
                version("v1", "2025-04-01", None),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PackError::Validation { .. }));
    }

    #[test]
    fn resolve_picks_containing_window() {
        let pack = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-08-31")),
                version("v2", "2025-09-01", None),
            ],
        )
        .unwrap();
        assert_eq!(pack.resolve(date("2025-08-15")).unwrap().version_id, "v1");
        assert_eq!(pack.resolve(date("2025-09-15")).unwrap().version_id, "v2");
    }

    #[test]
    fn resolve_gap_is_an_error_not_latest() {
        let pack = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-08-31")),
                version("v2", "2025-09-01", None),
            ],
        )
        .unwrap();
        assert!(matches!(
            pack.resolve(date("2024-12-31")),
            Err(PackError::NoActiveVersion { .. })
        ));
    }

    #[test]
    fn interior_gap_is_legal_at_load_but_unresolvable() {
        let pack = RulePack::new(
            "vat",
            vec![
                version("v1", "2025-01-01", Some("2025-03-31")),
                version("v2", "2025-06-01", None),
            ],
        )
        .unwrap();
        assert!(matches!(
            pack.resolve(date("2025-04-15")),
            Err(PackError::NoActiveVersion { .. })
        ));
    }

    #[test]
    fn from_json_str_parses_wire_format() {
        let pack = RulePack::from_json_str(
            r#"{
                "pack": "vat",
                "versions": [
                    {"effective_from": "2025-01-01", "effective_to": "2025-08-31", "data": {"rate": 19}},
                    {"effective_from": "2025-09-01", "effective_to": null, "data": {"rate": 21}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(pack.name(), "vat");
        let v = pack.resolve(date("2025-02-01")).unwrap();
        assert_eq!(v.data["rate"], 19);
        // version_id defaults to pack@effective_from.
        assert_eq!(v.version_id, "vat@2025-01-01");
    }

    #[test]
    fn from_yaml_str_parses_wire_format() {
        let pack = RulePack::from_yaml_str(
            "pack: payroll\nversions:\n  - version_id: fy25\n    effective_from: 2025-01-01\n    data:\n      bracket: 0.32\n",
        )
        .unwrap();
        assert_eq!(pack.name(), "payroll");
        assert_eq!(
            pack.resolve(date("2026-01-01")).unwrap().version_id,
            "fy25"
        );
    }

    #[test]
    fn content_hash_tracks_data() {
        let pack = RulePack::from_json_str(
            r#"{"pack": "p", "versions": [{"effective_from": "2025-01-01", "data": {"a": 1}}]}"#,
        )
        .unwrap();
        let v = &pack.versions()[0];
        assert_eq!(v.content_hash, hash_canonical(&v.data).unwrap());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            RulePack::from_json_str("{not json"),
            Err(PackError::Parse(_))
        ));
    }
}
