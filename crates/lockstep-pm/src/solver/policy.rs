use std::cmp::Ordering;

use lockstep_semver::compare_versions;

use super::pool::{PackageId, Pool};
use crate::package::Package;

/// Order in which the solver tries the candidate versions of a name.
///
/// Stable releases always come before pre-releases. Within one stability,
/// the highest version is tried first unless `prefer_lowest` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Policy {
    pub prefer_lowest: bool,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    /// Candidates in the order they should be tried. Ids unknown to the
    /// pool are dropped; ties keep their input order.
    pub fn rank(&self, pool: &Pool, candidates: &[PackageId]) -> Vec<PackageId> {
        let mut ranked: Vec<(PackageId, &Package)> = candidates
            .iter()
            .filter_map(|&id| pool.package(id).map(|p| (id, &**p)))
            .collect();

        ranked.sort_by(|(_, a), (_, b)| {
            a.stability()
                .priority()
                .cmp(&b.stability().priority())
                .then_with(|| self.version_order(&a.version, &b.version))
        });

        ranked.into_iter().map(|(id, _)| id).collect()
    }

    fn version_order(&self, a: &str, b: &str) -> Ordering {
        let ordering = compare_versions(a, b);
        if self.prefer_lowest {
            ordering
        } else {
            ordering.reverse()
        }
    }
}
