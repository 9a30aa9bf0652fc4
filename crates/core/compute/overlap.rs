//! Viewport overlap ranking with a bounded number of uncached lookups.

use rangewatch_types::{BoundingBox, SpeciesKey};
use std::cmp::Ordering;

/// A range that intersects the viewport, scored by overlap area.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankedRange {
    pub species_key: SpeciesKey,
    /// Square degrees shared with the viewport; `0.0` when only edges touch
    pub overlap_area: f64,
}

/// Ranks candidates by how much of the viewport their envelope covers.
///
/// Pass 1 scores every candidate whose box is already known, either supplied
/// with the candidate or returned by `cached`. Pass 2 walks the remaining
/// candidates in input order. Each one is looked up in `cached` again, since
/// an earlier `load` may have filled the cache in bulk. Only a miss calls
/// `load`, at most `missing_fetch_budget` times. Candidates that do not
/// intersect the viewport are dropped.
///
/// The result is sorted by overlap area, largest first; equal areas keep
/// input order.
pub fn rank_overlap<I, C, L>(
    candidates: I,
    viewport: &BoundingBox,
    missing_fetch_budget: usize,
    cached: C,
    mut load: L,
) -> Vec<RankedRange>
where
    I: IntoIterator<Item = (SpeciesKey, Option<BoundingBox>)>,
    C: Fn(&SpeciesKey) -> Option<BoundingBox>,
    L: FnMut(&SpeciesKey) -> Option<BoundingBox>,
{
    let mut scored: Vec<(usize, RankedRange)> = Vec::new();
    let mut missing: Vec<(usize, SpeciesKey)> = Vec::new();

    for (idx, (species_key, bbox)) in candidates.into_iter().enumerate() {
        match bbox.or_else(|| cached(&species_key)) {
            Some(bbox) => {
                if let Some(ranked) = score(species_key, &bbox, viewport) {
                    scored.push((idx, ranked));
                }
            }
            None => missing.push((idx, species_key)),
        }
    }

    let mut remaining = missing_fetch_budget;
    for (idx, species_key) in missing {
        let bbox = match cached(&species_key) {
            Some(bbox) => Some(bbox),
            None if remaining > 0 => {
                remaining -= 1;
                load(&species_key)
            }
            None => continue,
        };

        if let Some(bbox) = bbox
            && let Some(ranked) = score(species_key, &bbox, viewport)
        {
            scored.push((idx, ranked));
        }
    }

    scored.sort_by(|(ia, a), (ib, b)| {
        b.overlap_area
            .partial_cmp(&a.overlap_area)
            .unwrap_or(Ordering::Equal)
            .then(ia.cmp(ib))
    });
    scored.into_iter().map(|(_, ranked)| ranked).collect()
}

fn score(species_key: SpeciesKey, bbox: &BoundingBox, viewport: &BoundingBox) -> Option<RankedRange> {
    if !bbox.intersects(viewport) {
        return None;
    }
    Some(RankedRange {
        species_key,
        overlap_area: bbox.overlap_area(viewport),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn key(s: &str) -> SpeciesKey {
        SpeciesKey::from_normalized(s)
    }

    fn conus() -> BoundingBox {
        BoundingBox::new(-125.0, 24.0, -66.0, 49.0)
    }

    #[test]
    fn test_non_intersecting_box_is_excluded() {
        let candidates = vec![
            (key("A"), Some(BoundingBox::new(-120.0, 30.0, -100.0, 40.0))),
            (key("B"), Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0))),
        ];
        let ranked = rank_overlap(candidates, &conus(), 0, |_| None, |_| None);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].species_key, key("A"));
        assert_eq!(ranked[0].overlap_area, 200.0);
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let candidates = vec![
            (key("small"), Some(BoundingBox::new(-100.0, 30.0, -99.0, 31.0))),
            (key("tie1"), Some(BoundingBox::new(-110.0, 30.0, -105.0, 35.0))),
            (key("big"), Some(BoundingBox::new(-120.0, 25.0, -80.0, 45.0))),
            (key("tie2"), Some(BoundingBox::new(-90.0, 30.0, -85.0, 35.0))),
        ];
        let ranked = rank_overlap(candidates, &conus(), 0, |_| None, |_| None);
        let order: Vec<&str> = ranked.iter().map(|r| r.species_key.as_str()).collect();

        assert_eq!(order, vec!["big", "tie1", "tie2", "small"]);
        assert!(ranked.windows(2).all(|w| w[0].overlap_area >= w[1].overlap_area));
    }

    #[test]
    fn test_cache_is_consulted_before_loading() {
        let mut cache = HashMap::new();
        cache.insert(key("A"), BoundingBox::new(-120.0, 30.0, -100.0, 40.0));

        let mut loads = Vec::new();
        let ranked = rank_overlap(
            vec![(key("A"), None)],
            &conus(),
            5,
            |k| cache.get(k).copied(),
            |k| {
                loads.push(k.clone());
                None
            },
        );

        assert_eq!(ranked.len(), 1);
        assert!(loads.is_empty());
    }

    #[test]
    fn test_budget_limits_loads_in_input_order() {
        let candidates: Vec<_> = ["m1", "m2", "m3", "m4"]
            .iter()
            .map(|s| (key(s), None))
            .collect();

        let mut loads = Vec::new();
        let ranked = rank_overlap(candidates, &conus(), 2, |_| None, |k| {
            loads.push(k.as_str().to_string());
            Some(BoundingBox::new(-100.0, 30.0, -90.0, 40.0))
        });

        assert_eq!(loads, vec!["m1", "m2"]);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_bulk_fill_during_pass_two_spends_no_budget() {
        let table: HashMap<_, _> = ["t1", "t2", "t3", "t4"]
            .iter()
            .map(|s| (key(s), BoundingBox::new(-100.0, 30.0, -90.0, 40.0)))
            .collect();
        let cache = std::cell::RefCell::new(HashMap::new());
        let mut loads = 0;

        let candidates: Vec<_> = ["t1", "t2", "t3", "t4"].iter().map(|s| (key(s), None)).collect();
        let ranked = rank_overlap(
            candidates,
            &conus(),
            1,
            |k| cache.borrow().get(k).copied(),
            |k| {
                loads += 1;
                cache.borrow_mut().extend(table.clone());
                table.get(k).copied()
            },
        );

        assert_eq!(loads, 1);
        assert_eq!(ranked.len(), 4);
    }

    #[test]
    fn test_failed_loads_still_spend_budget() {
        let candidates = vec![(key("gone"), None), (key("present"), None)];
        let mut loads = 0;
        let ranked = rank_overlap(candidates, &conus(), 1, |_| None, |_| {
            loads += 1;
            None
        });

        assert_eq!(loads, 1);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ties_across_passes_follow_input_order() {
        let same = BoundingBox::new(-110.0, 30.0, -100.0, 40.0);
        let candidates = vec![(key("loaded"), None), (key("known"), Some(same))];
        let ranked = rank_overlap(candidates, &conus(), 1, |_| None, |_| Some(same));
        let order: Vec<&str> = ranked.iter().map(|r| r.species_key.as_str()).collect();

        assert_eq!(order, vec!["loaded", "known"]);
    }
}
