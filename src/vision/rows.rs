//! Row clustering
//!
//! Groups character regions into ordered text rows by vertical
//! proximity. The threshold adapts to the average character height so
//! baseline jitter within a line never splits it, while the serial and
//! province lines of a two-line plate stay apart.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::RowClusterConfig;

use super::regions::CharacterRegion;

/// Partition regions into rows, top-to-bottom, members left-to-right.
///
/// One pass over the regions sorted by (center-y, center-x): a region
/// joins the first row whose representative y lies within the adaptive
/// threshold, otherwise it opens a new row keyed by its own center-y.
/// Sorting first makes the pass insensitive to input order.
pub fn cluster_rows(
    mut regions: Vec<CharacterRegion>,
    config: &RowClusterConfig,
) -> Vec<Vec<CharacterRegion>> {
    if regions.is_empty() {
        return Vec::new();
    }

    let avg_height = regions
        .iter()
        .map(|r| r.bounds.height() as f32)
        .sum::<f32>()
        / regions.len() as f32;
    let threshold = (avg_height * config.height_factor).max(config.min_threshold_px);

    regions.sort_by(|a, b| {
        (a.center_y, a.center_x)
            .partial_cmp(&(b.center_y, b.center_x))
            .unwrap_or(Ordering::Equal)
    });

    let mut rows: Vec<(f32, Vec<CharacterRegion>)> = Vec::new();
    for region in regions {
        match rows
            .iter_mut()
            .find(|(rep_y, _)| (region.center_y - *rep_y).abs() <= threshold)
        {
            Some((_, members)) => members.push(region),
            None => rows.push((region.center_y, vec![region])),
        }
    }

    rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    debug!(
        "clustered into {} rows (threshold {:.1}px, avg height {:.1}px)",
        rows.len(),
        threshold,
        avg_height
    );

    rows.into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| {
                a.center_x.partial_cmp(&b.center_x).unwrap_or(Ordering::Equal)
            });
            members
        })
        .collect()
}
