//! Buildpack change detection against persisted state.
//!
//! "Changed" is re-derived from stored timestamps on every run rather than
//! from a run counter, so re-running with no buildpack updates is a no-op.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::core::NotifierError;
use crate::models::{Buildpack, parse_timestamp};
use crate::state::{BuildpackRecord, BuildpackState};

/// Select the buildpacks that changed since the last run and record them in `state`.
///
/// - A buildpack absent from `state` is changed (first observation) and its
///   `updated_at` is recorded.
/// - A known buildpack is changed only if its `updated_at` is strictly after
///   the stored `LastUpdatedAt`; the record is then advanced.
/// - Otherwise it is dropped for this run and its record left untouched.
///
/// The result preserves the order of `buildpacks`. Either timestamp failing to
/// parse is fatal.
pub fn filter_updated_buildpacks(
    buildpacks: Vec<Buildpack>,
    state: &mut BuildpackState,
) -> Result<Vec<Buildpack>, NotifierError> {
    let mut changed = Vec::new();

    for buildpack in buildpacks {
        let Some(stored) = state.get(&buildpack.id) else {
            debug!(buildpack = %buildpack.name, guid = %buildpack.id, "First observation of buildpack");
            state.insert(buildpack.id.clone(), BuildpackRecord::new(&buildpack.updated_at));
            changed.push(buildpack);
            continue;
        };

        let updated_at = parse_timestamp(
            &format!("buildpack {} updated_at", buildpack.id),
            &buildpack.updated_at,
        )?;
        let last_updated_at = parse_timestamp(
            &format!("stored buildpack {} LastUpdatedAt", buildpack.id),
            &stored.last_updated_at,
        )?;

        if updated_at > last_updated_at {
            debug!(buildpack = %buildpack.name, guid = %buildpack.id, "Buildpack updated since last run");
            state.insert(buildpack.id.clone(), BuildpackRecord::new(&buildpack.updated_at));
            changed.push(buildpack);
        } else {
            info!("Supported Buildpack {} has not been updated", buildpack.name);
        }
    }

    Ok(changed)
}

/// Index changed buildpacks by name for matching against droplets.
///
/// When two buildpacks share a name (one per stack), the later one wins.
pub fn index_by_name(buildpacks: Vec<Buildpack>) -> HashMap<String, Buildpack> {
    buildpacks.into_iter().map(|bp| (bp.name.clone(), bp)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buildpack(id: &str, name: &str, updated_at: &str) -> Buildpack {
        Buildpack {
            id: id.to_string(),
            name: name.to_string(),
            updated_at: updated_at.to_string(),
            filename: format!("{name}-cflinuxfs3-v1.0.0.zip"),
        }
    }

    #[test]
    fn test_first_observation_is_changed() {
        let mut state = BuildpackState::new();
        let changed = filter_updated_buildpacks(
            vec![buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z")],
            &mut state,
        )
        .unwrap();

        assert_eq!(changed.len(), 1);
        assert_eq!(state["bp-1"].last_updated_at, "2020-06-01T00:00:00Z");
    }

    #[test]
    fn test_idempotent_without_timestamp_advance() {
        let mut state = BuildpackState::new();
        let input = vec![
            buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z"),
            buildpack("bp-2", "ruby_buildpack", "2020-07-01T00:00:00Z"),
        ];

        let first = filter_updated_buildpacks(input.clone(), &mut state).unwrap();
        assert_eq!(first.len(), 2);
        let after_first = state.clone();

        let second = filter_updated_buildpacks(input, &mut state).unwrap();
        assert!(second.is_empty());
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_strictly_later_update_is_changed() {
        let mut state = BuildpackState::new();
        state.insert("bp-1".to_string(), BuildpackRecord::new("2020-06-01T00:00:00Z"));
        state.insert("bp-2".to_string(), BuildpackRecord::new("2020-06-01T00:00:00Z"));

        let changed = filter_updated_buildpacks(
            vec![
                buildpack("bp-1", "go_buildpack", "2020-06-02T00:00:00Z"),
                // Equal timestamp is not an update
                buildpack("bp-2", "ruby_buildpack", "2020-06-01T00:00:00Z"),
            ],
            &mut state,
        )
        .unwrap();

        assert_eq!(changed.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec!["bp-1"]);
        assert_eq!(state["bp-1"].last_updated_at, "2020-06-02T00:00:00Z");
        assert_eq!(state["bp-2"].last_updated_at, "2020-06-01T00:00:00Z");
    }

    #[test]
    fn test_stored_timestamp_never_moves_backwards() {
        let mut state = BuildpackState::new();
        state.insert("bp-1".to_string(), BuildpackRecord::new("2021-01-01T00:00:00Z"));

        let changed = filter_updated_buildpacks(
            vec![buildpack("bp-1", "go_buildpack", "2020-01-01T00:00:00Z")],
            &mut state,
        )
        .unwrap();

        assert!(changed.is_empty());
        assert_eq!(state["bp-1"].last_updated_at, "2021-01-01T00:00:00Z");
    }

    #[test]
    fn test_order_preserved_and_unrelated_records_kept() {
        let mut state = BuildpackState::new();
        state.insert("retired".to_string(), BuildpackRecord::new("2019-01-01T00:00:00Z"));

        let changed = filter_updated_buildpacks(
            vec![
                buildpack("bp-c", "c_buildpack", "2020-01-01T00:00:00Z"),
                buildpack("bp-a", "a_buildpack", "2020-01-01T00:00:00Z"),
                buildpack("bp-b", "b_buildpack", "2020-01-01T00:00:00Z"),
            ],
            &mut state,
        )
        .unwrap();

        let ids: Vec<_> = changed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["bp-c", "bp-a", "bp-b"]);
        assert!(state.contains_key("retired"));
    }

    #[test]
    fn test_unparseable_platform_timestamp_is_fatal() {
        let mut state = BuildpackState::new();
        state.insert("bp-1".to_string(), BuildpackRecord::new("2020-06-01T00:00:00Z"));

        let err = filter_updated_buildpacks(
            vec![buildpack("bp-1", "go_buildpack", "June 2nd")],
            &mut state,
        )
        .unwrap_err();
        assert!(matches!(err, NotifierError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_unparseable_stored_timestamp_is_fatal() {
        let mut state = BuildpackState::new();
        state.insert("bp-1".to_string(), BuildpackRecord::new("corrupt"));

        let err = filter_updated_buildpacks(
            vec![buildpack("bp-1", "go_buildpack", "2020-06-01T00:00:00Z")],
            &mut state,
        )
        .unwrap_err();
        match err {
            NotifierError::InvalidTimestamp {
                subject,
                value,
                ..
            } => {
                assert!(subject.contains("stored"));
                assert_eq!(value, "corrupt");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_index_by_name_later_wins() {
        let index = index_by_name(vec![
            buildpack("bp-1", "java_buildpack", "2020-01-01T00:00:00Z"),
            buildpack("bp-2", "java_buildpack", "2020-02-01T00:00:00Z"),
            buildpack("bp-3", "go_buildpack", "2020-03-01T00:00:00Z"),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index["java_buildpack"].id, "bp-2");
    }
}
