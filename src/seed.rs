use crate::backend::Backend;
use crate::catalog::SeedSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub attempted: usize,
    pub failed: usize,
    /// Seed keys present after seeding, whether inserted now or before.
    /// `None` when the count itself could not be read.
    pub present: Option<u64>,
}

/// Inserts every record whose key is absent. Existing records keep their
/// values; a failing record does not stop the rest.
pub async fn seed(backend: &dyn Backend, set: &SeedSet) -> SeedSummary {
    let mut summary = SeedSummary::default();

    for record in set.records.iter() {
        summary.attempted += 1;

        let result = match record.to_document() {
            Ok(document) => {
                backend
                    .upsert_on_insert(set.collection, set.key_field, &document)
                    .await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            ::log::warn!(
                "seed {} {} error (ignored): {:#}",
                set.collection,
                record.key,
                err
            );
            summary.failed += 1;
        }
    }

    match backend
        .count_by_keys(set.collection, set.key_field, &set.keys())
        .await
    {
        Ok(count) => {
            ::log::info!("Seeded {} count: {}", set.collection, count);
            summary.present = Some(count);
        }
        Err(err) => {
            ::log::warn!("counting seeded {} failed: {:#}", set.collection, err);
        }
    }

    summary
}
