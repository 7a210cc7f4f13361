//! Assign each enumerated path a review category.
//!
//! | prior record | contributing units                        | category  |
//! |--------------|-------------------------------------------|-----------|
//! | none         | any                                       | new       |
//! | present      | a prose change, or a unit undeterminable  | new       |
//! | present      | link/markup-only changes                  | modified  |
//! | present      | no change                                 | unchanged |
//!
//! Without version history every path is `new`. Validation and `first_seen`
//! carry forward through [`cache::reconcile`].
use crate::cache::{self, CacheMap, Category, PathRecord};
use crate::hashing;
use crate::history::{ChangeDetector, UnitChange};
use crate::report::{CategorizedPath, CategoryCounts, EnumeratedPath};
use crate::sources::SourceMap;
use chrono::{DateTime, Utc};

/// Categorized paths plus the records to merge into the cache.
#[derive(Debug, Clone)]
pub struct Categorization {
    pub paths: Vec<CategorizedPath>,
    pub records: CacheMap,
    pub counts: CategoryCounts,
}

/// What change detection found for the units behind one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathChanges {
    pub prose_changed: bool,
    pub any_changed: bool,
    /// Some unit could not be compared, or a passage maps to no unit.
    pub undetermined: bool,
}

impl PathChanges {
    fn absorb(&mut self, change: UnitChange) {
        self.prose_changed |= change.prose_changed;
        self.any_changed |= change.any_changed;
    }
}

/// Category for one path given its prior record and unit changes.
pub fn decide_category(
    existing: Option<&PathRecord>,
    route_hash: &str,
    history_available: bool,
    changes: PathChanges,
) -> Category {
    if !history_available {
        return Category::New;
    }
    let Some(existing) = existing else {
        return Category::New;
    };
    if existing.route_hash != route_hash {
        tracing::warn!(
            path_id = %existing.path_id,
            "recorded route differs from the current route for this path id"
        );
        return Category::New;
    }
    if changes.undetermined || changes.prose_changed {
        Category::New
    } else if changes.any_changed {
        Category::Modified
    } else {
        Category::Unchanged
    }
}

/// Categorize every path against the existing cache.
///
/// Returns reconciled records for the paths seen in this run only; merging
/// them into the full cache is left to the caller. When two routes share a
/// `path_id`, the first keeps the record and the later one is `new`.
pub fn categorize(
    paths: &[EnumeratedPath],
    sources: &SourceMap,
    existing: &CacheMap,
    detector: &mut ChangeDetector<'_>,
    now: DateTime<Utc>,
) -> Categorization {
    let history_available = detector.history_available();
    if !history_available {
        tracing::warn!("version history unavailable; every path is categorized as new");
    }
    let mut categorized = Vec::with_capacity(paths.len());
    let mut records = CacheMap::new();
    let mut counts = CategoryCounts::default();

    for path in paths {
        let route_units = sources.units_for_route(&path.route);
        let mut changes = PathChanges {
            undetermined: !route_units.unmapped.is_empty(),
            ..PathChanges::default()
        };
        if !route_units.unmapped.is_empty() {
            tracing::warn!(
                path_id = %path.path_id,
                passages = ?route_units.unmapped,
                "passages without source units; path treated as changed"
            );
        }
        let mut created_date: Option<DateTime<Utc>> = None;
        let mut commit_date: Option<DateTime<Utc>> = None;
        if history_available {
            for unit in &route_units.units {
                match detector.classify(unit) {
                    Ok(change) => changes.absorb(change),
                    Err(_) => changes.undetermined = true,
                }
                if let Some(dates) = detector.dates(unit) {
                    created_date = created_date.max(Some(dates.created));
                    commit_date = commit_date.max(Some(dates.committed));
                }
            }
        }

        // The first route to claim a path id this run owns its record; later
        // routes with the same id are reported as new and not recorded.
        let collides = records
            .get(&path.path_id)
            .is_some_and(|owner: &PathRecord| owner.route_hash != path.route_hash);
        let previous = if collides {
            None
        } else {
            existing.get(&path.path_id)
        };
        let category = decide_category(previous, &path.route_hash, history_available, changes);
        let computed = PathRecord {
            path_id: path.path_id.clone(),
            route: hashing::route_display(&path.route),
            route_hash: path.route_hash.clone(),
            first_seen: now,
            created_date,
            commit_date,
            validated: false,
            category,
            content_fingerprint: Some(path.content_fingerprint.clone()),
        };
        let record = cache::reconcile(previous, computed);
        tracing::debug!(path_id = %record.path_id, category = %record.category, "path categorized");

        counts.record(record.category);
        categorized.push(CategorizedPath {
            path: path.clone(),
            category: record.category,
            validated: record.validated,
            first_seen: record.first_seen,
            created_date: record.created_date,
            commit_date: record.commit_date,
        });
        if !collides {
            records.insert(record.path_id.clone(), record);
        }
    }

    tracing::info!(
        new = counts.new,
        modified = counts.modified,
        unchanged = counts.unchanged,
        "categorization complete"
    );
    Categorization {
        paths: categorized,
        records,
        counts,
    }
}

#[cfg(test)]
#[path = "categorize_tests.rs"]
mod tests;
