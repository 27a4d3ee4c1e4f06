use super::traits::DocumentStore;
use super::types::{Document, Partition};
use std::collections::HashMap;

/// Partitions whose entries may be collapsed by text.
///
/// Todos and system settings are only removed explicitly.
pub const DEDUP_PARTITIONS: [Partition; 3] =
    [Partition::Facts, Partition::Interactions, Partition::Reference];

/// Ids to delete so that each distinct text keeps one document.
///
/// The survivor is the highest significance; ties go to the smallest id.
pub fn duplicates(documents: &[Document]) -> Vec<String> {
    let mut groups: HashMap<&str, Vec<&Document>> = HashMap::new();
    for doc in documents {
        groups.entry(doc.text.as_str()).or_default().push(doc);
    }

    let mut doomed = Vec::new();
    for group in groups.into_values().filter(|g| g.len() > 1) {
        let keep = group.iter().copied().max_by(|a, b| {
            a.significance()
                .partial_cmp(&b.significance())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(keep) = keep {
            doomed.extend(
                group
                    .into_iter()
                    .filter(|d| d.id != keep.id)
                    .map(|d| d.id.clone()),
            );
        }
    }
    doomed.sort();
    doomed
}

/// Collapse exact-text duplicates in one partition; returns how many were deleted.
pub async fn dedup(store: &dyn DocumentStore, partition: Partition) -> anyhow::Result<usize> {
    let documents = store.get_all(partition, None).await?;
    let mut deleted = 0;
    for id in duplicates(&documents) {
        if store.delete(partition, &id).await? {
            deleted += 1;
        }
    }
    if deleted > 0 {
        tracing::info!(%partition, deleted, "removed duplicate documents");
    }
    Ok(deleted)
}
