use super::traits::DocumentStore;
use super::types::{Document, MetadataFilter, Partition};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

struct Slot {
    document: Document,
    written: u64,
}

#[derive(Default)]
struct Inner {
    partitions: HashMap<Partition, HashMap<String, Slot>>,
    clock: u64,
}

/// Volatile store used when `memory.backend = "memory"` and in tests.
///
/// Similarity is word overlap; ties go to the most recently written.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> anyhow::Result<T> {
        let guard = self
            .inner
            .read()
            .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> anyhow::Result<T> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn overlap(query: &BTreeSet<String>, text: &str) -> usize {
    words(text).intersection(query).count()
}

impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { self.inner.read().is_ok() })
    }

    fn upsert<'a>(
        &'a self,
        partition: Partition,
        document: Document,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.write(|inner| {
                inner.clock += 1;
                let written = inner.clock;
                inner
                    .partitions
                    .entry(partition)
                    .or_default()
                    .insert(document.id.clone(), Slot { document, written });
            })
        })
    }

    fn get<'a>(
        &'a self,
        partition: Partition,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<Document>>> + Send + 'a>> {
        Box::pin(async move {
            self.read(|inner| {
                inner
                    .partitions
                    .get(&partition)
                    .and_then(|docs| docs.get(id))
                    .map(|slot| slot.document.clone())
            })
        })
    }

    fn query_similar<'a>(
        &'a self,
        partition: Partition,
        text: &'a str,
        k: usize,
        filter: Option<&'a MetadataFilter>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Document>>> + Send + 'a>> {
        Box::pin(async move {
            let query = words(text);
            self.read(|inner| {
                let Some(docs) = inner.partitions.get(&partition) else {
                    return Vec::new();
                };
                let mut ranked: Vec<(usize, u64, &Document)> = docs
                    .values()
                    .filter(|slot| filter.is_none_or(|f| f.matches(&slot.document.metadata)))
                    .map(|slot| {
                        (
                            overlap(&query, &slot.document.text),
                            slot.written,
                            &slot.document,
                        )
                    })
                    .collect();
                ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
                ranked
                    .into_iter()
                    .take(k)
                    .map(|(_, _, doc)| doc.clone())
                    .collect()
            })
        })
    }

    fn get_all<'a>(
        &'a self,
        partition: Partition,
        filter: Option<&'a MetadataFilter>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Document>>> + Send + 'a>> {
        Box::pin(async move {
            self.read(|inner| {
                inner
                    .partitions
                    .get(&partition)
                    .map(|docs| {
                        docs.values()
                            .filter(|slot| {
                                filter.is_none_or(|f| f.matches(&slot.document.metadata))
                            })
                            .map(|slot| slot.document.clone())
                            .collect()
                    })
                    .unwrap_or_default()
            })
        })
    }

    fn delete<'a>(
        &'a self,
        partition: Partition,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            self.write(|inner| {
                inner
                    .partitions
                    .get_mut(&partition)
                    .is_some_and(|docs| docs.remove(id).is_some())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::Metadata;

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, text, Metadata::new())
    }

    #[tokio::test]
    async fn query_ranks_by_overlap_then_recency() {
        let store = InMemoryStore::new();
        store
            .upsert(Partition::Interactions, doc("a", "call mom about dinner"))
            .await
            .unwrap();
        store
            .upsert(Partition::Interactions, doc("b", "unrelated"))
            .await
            .unwrap();
        store
            .upsert(Partition::Interactions, doc("c", "also unrelated"))
            .await
            .unwrap();

        let hits = store
            .query_similar(Partition::Interactions, "dinner with mom", 2, None)
            .await
            .unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = InMemoryStore::new();
        store.upsert(Partition::Facts, doc("f", "x")).await.unwrap();
        assert!(store.delete(Partition::Facts, "f").await.unwrap());
        assert!(!store.delete(Partition::Facts, "f").await.unwrap());
        assert!(store.get_all(Partition::Facts, None).await.unwrap().is_empty());
    }
}
