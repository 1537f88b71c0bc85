// geography.rs - Geographic concordances (hull overlap, co-occurrence)

use crate::core::geodesy::DistanceMethod;
use crate::core::geometry::{convex_hull, intersection_area, Hull, Point};
use crate::data::{
    group_by_subset, ConcordanceDefinition, ConcordanceStore, DataType, DiscriminationDataType,
    DiscriminationType, EvidenceType, LatLon, Spartition, Support,
};
use crate::error::{ConcordanceError, Result};
use std::collections::HashMap;

pub const POLYGON_OVERLAP_AREA: &str = "polygon overlap area";
pub const POLYGON_OVERLAP_BOOL: &str = "polygon overlap bool";
pub const COOCCURRENCE_GAP: &str = "co-occurrence gap";
pub const COOCCURRENCE_BOOLEAN: &str = "co-occurrence boolean";

/// Hull of a subset's coordinates, treating (latitude, longitude) as planar
pub fn subset_hull<'a>(points: impl Iterator<Item = &'a LatLon>) -> Hull {
    let points: Vec<Point> = points.map(|c| Point::new(c.latitude, c.longitude)).collect();
    convex_hull(&points)
}

/// Record hull overlap area (only when positive) and overlap bool (always) for every subset pair
pub fn process_polygons(
    spartition: &Spartition,
    coordinates: &HashMap<String, LatLon>,
    store: &mut ConcordanceStore,
) -> Result<()> {
    let grouped = group_by_subset(spartition, coordinates);
    let hulls: Vec<Hull> = grouped.iter().map(|s| subset_hull(s.iter_values())).collect();

    store.define(
        &spartition.label,
        ConcordanceDefinition::new(
            POLYGON_OVERLAP_AREA,
            EvidenceType::Geography,
            DataType::Continuous,
            DiscriminationType::Overlap,
            DiscriminationDataType::Continuous,
        ),
    )?;
    store.define(
        &spartition.label,
        ConcordanceDefinition::new(
            POLYGON_OVERLAP_BOOL,
            EvidenceType::Geography,
            DataType::Continuous,
            DiscriminationType::Boolean,
            DiscriminationDataType::Boolean,
        ),
    )?;

    for i in 0..grouped.len() {
        for j in (i + 1)..grouped.len() {
            let a = (grouped[i].label, grouped[i].available());
            let b = (grouped[j].label, grouped[j].available());
            let area = intersection_area(&hulls[i], &hulls[j]);

            if area > 0.0 {
                store.record(POLYGON_OVERLAP_AREA, a, b, Support::Continuous(area));
            }
            store.record(POLYGON_OVERLAP_BOOL, a, b, Support::Boolean(area > 0.0));
        }
    }

    log::debug!(
        "Spartition '{}': hull overlap computed for {} subsets",
        spartition.label,
        grouped.len()
    );
    Ok(())
}

/// Smallest distance over every point pair; `None` when either side is empty
pub fn minimum_distance_km(a: &[LatLon], b: &[LatLon], method: DistanceMethod) -> Option<f64> {
    a.iter()
        .flat_map(|p| b.iter().map(move |q| method.distance_km(*p, *q)))
        .min_by(|x, y| x.total_cmp(y))
}

/// Record the co-occurrence gap (km) and whether it is within `threshold_km`
pub fn process_cooccurrences(
    spartition: &Spartition,
    coordinates: &HashMap<String, LatLon>,
    threshold_km: f64,
    method: DistanceMethod,
    store: &mut ConcordanceStore,
) -> Result<()> {
    let grouped = group_by_subset(spartition, coordinates);
    let points: Vec<Vec<LatLon>> = grouped
        .iter()
        .map(|s| s.iter_values().copied().collect())
        .collect();

    store.define(
        &spartition.label,
        ConcordanceDefinition::new(
            COOCCURRENCE_GAP,
            EvidenceType::Geography,
            DataType::Continuous,
            DiscriminationType::Gap,
            DiscriminationDataType::Continuous,
        )
        .with_unit("km"),
    )?;
    store.define(
        &spartition.label,
        ConcordanceDefinition::new(
            COOCCURRENCE_BOOLEAN,
            EvidenceType::Geography,
            DataType::Continuous,
            DiscriminationType::Gap,
            DiscriminationDataType::Boolean,
        )
        .with_unit("km")
        .with_threshold(threshold_km),
    )?;

    for i in 0..grouped.len() {
        for j in (i + 1)..grouped.len() {
            let min_distance = minimum_distance_km(&points[i], &points[j], method).ok_or_else(|| {
                let empty = if points[i].is_empty() {
                    grouped[i].label
                } else {
                    grouped[j].label
                };
                ConcordanceError::EmptyEvidence {
                    spartition: spartition.label.clone(),
                    statistic: COOCCURRENCE_GAP.to_string(),
                    subset: empty.to_string(),
                }
            })?;

            let a = (grouped[i].label, grouped[i].available());
            let b = (grouped[j].label, grouped[j].available());
            store.record(COOCCURRENCE_GAP, a, b, Support::Continuous(min_distance));
            store.record(
                COOCCURRENCE_BOOLEAN,
                a,
                b,
                Support::Boolean(min_distance <= threshold_km),
            );
        }
    }

    log::debug!(
        "Spartition '{}': co-occurrence computed with threshold {} km",
        spartition.label,
        threshold_km
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spart::tests::sample_document;

    fn coords(entries: &[(&str, f64, f64)]) -> HashMap<String, LatLon> {
        entries
            .iter()
            .map(|(id, lat, lon)| (id.to_string(), LatLon::new(*lat, *lon)))
            .collect()
    }

    #[test]
    fn test_polygon_overlap_records() {
        let document = sample_document();
        let spartition = &document.spartitions[0];
        // Subset 1 = a,b,c ; subset 2 = d,e,f
        let table = coords(&[
            ("a", 0.0, 0.0),
            ("b", 2.0, 0.0),
            ("c", 0.0, 2.0),
            ("d", 1.5, 1.5),
            ("e", 3.0, 1.5),
            ("f", 1.5, 3.0),
        ]);
        let mut store = ConcordanceStore::new();
        process_polygons(spartition, &table, &mut store).unwrap();

        let area: Vec<_> = store.limits_for(POLYGON_OVERLAP_AREA).collect();
        assert_eq!(area.len(), 0, "triangles are disjoint");

        let overlap: Vec<_> = store.limits_for(POLYGON_OVERLAP_BOOL).collect();
        assert_eq!(overlap.len(), 1);
        assert_eq!(overlap[0].support, Support::Boolean(false));
        assert_eq!((overlap[0].size_a, overlap[0].size_b), (3, 3));
    }

    #[test]
    fn test_polygon_overlap_positive_area() {
        let document = sample_document();
        let spartition = &document.spartitions[0];
        let table = coords(&[
            ("a", 0.0, 0.0),
            ("b", 4.0, 0.0),
            ("c", 0.0, 4.0),
            ("d", 1.0, 1.0),
            ("e", 5.0, 1.0),
            ("f", 1.0, 5.0),
        ]);
        let mut store = ConcordanceStore::new();
        process_polygons(spartition, &table, &mut store).unwrap();

        let area: Vec<_> = store.limits_for(POLYGON_OVERLAP_AREA).collect();
        assert_eq!(area.len(), 1);
        let value = area[0].support.as_f64().unwrap();
        assert!((value - 2.0).abs() < 1e-9);
        let overlap: Vec<_> = store.limits_for(POLYGON_OVERLAP_BOOL).collect();
        assert_eq!(overlap[0].support, Support::Boolean(true));
    }

    #[test]
    fn test_degenerate_subsets_do_not_fail() {
        let document = sample_document();
        let spartition = &document.spartitions[1];
        let table = coords(&[("a", 0.0, 0.0), ("c", 1.0, 1.0), ("d", 2.0, 2.0)]);
        let mut store = ConcordanceStore::new();
        process_polygons(spartition, &table, &mut store).unwrap();
        assert_eq!(store.limits_for(POLYGON_OVERLAP_BOOL).count(), 3);
        assert!(store
            .limits_for(POLYGON_OVERLAP_BOOL)
            .all(|l| l.support == Support::Boolean(false)));
    }

    #[test]
    fn test_cooccurrence_threshold() {
        let document = sample_document();
        let spartition = &document.spartitions[0];
        // 0.027 degrees of latitude is about 3 km
        let near = coords(&[("a", 10.0, 10.0), ("d", 10.027, 10.0)]);
        let mut store = ConcordanceStore::new();
        process_cooccurrences(spartition, &near, 5.0, DistanceMethod::Geodesic, &mut store).unwrap();
        let gap = store.limits_for(COOCCURRENCE_GAP).next().unwrap();
        let km = gap.support.as_f64().unwrap();
        assert!(km > 2.5 && km < 3.5);
        let within = store.limits_for(COOCCURRENCE_BOOLEAN).next().unwrap();
        assert_eq!(within.support, Support::Boolean(true));

        // About 10 km apart
        let far = coords(&[("a", 10.0, 10.0), ("d", 10.09, 10.0)]);
        let mut store = ConcordanceStore::new();
        process_cooccurrences(spartition, &far, 5.0, DistanceMethod::Geodesic, &mut store).unwrap();
        let within = store.limits_for(COOCCURRENCE_BOOLEAN).next().unwrap();
        assert_eq!(within.support, Support::Boolean(false));
        assert_eq!((within.size_a, within.size_b), (1, 1));
    }

    #[test]
    fn test_cooccurrence_requires_points() {
        let document = sample_document();
        let spartition = &document.spartitions[0];
        let table = coords(&[("a", 10.0, 10.0)]);
        let mut store = ConcordanceStore::new();
        let result =
            process_cooccurrences(spartition, &table, 5.0, DistanceMethod::GreatCircle, &mut store);
        match result {
            Err(ConcordanceError::EmptyEvidence { subset, statistic, .. }) => {
                assert_eq!(subset, "2");
                assert_eq!(statistic, COOCCURRENCE_GAP);
            }
            other => panic!("expected EmptyEvidence, got {:?}", other),
        }
    }

    #[test]
    fn test_minimum_distance_symmetric() {
        let a = vec![LatLon::new(0.0, 0.0), LatLon::new(5.0, 5.0)];
        let b = vec![LatLon::new(1.0, 1.0), LatLon::new(-3.0, 2.0)];
        let ab = minimum_distance_km(&a, &b, DistanceMethod::Geodesic).unwrap();
        let ba = minimum_distance_km(&b, &a, DistanceMethod::Geodesic).unwrap();
        assert_eq!(ab, ba);
        assert!(minimum_distance_km(&a, &[], DistanceMethod::Geodesic).is_none());
    }
}
