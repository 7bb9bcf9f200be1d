use {
    crate::{blockstore::Blockstore, blockstore_db::Result},
    ridgeline_sdk::clock::Slot,
};

/// Walks the parent-slot links of the ledger, starting from (and including)
/// `start_slot`.
///
/// Iteration ends after slot 0 has been yielded, or at the first slot whose
/// metadata is absent. A storage failure surfaces as an `Err` item; it is
/// never collapsed into an early, silent end of iteration.
pub struct AncestorIterator<'a> {
    current: Option<Slot>,
    blockstore: &'a Blockstore,
}

impl<'a> AncestorIterator<'a> {
    pub fn new_inclusive(start_slot: Slot, blockstore: &'a Blockstore) -> Self {
        Self {
            current: Some(start_slot),
            blockstore,
        }
    }
}

impl Iterator for AncestorIterator<'_> {
    type Item = Result<Slot>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        match self.blockstore.meta(slot) {
            Err(err) => {
                self.current = None;
                Some(Err(err))
            }
            Ok(None) => {
                self.current = None;
                None
            }
            Ok(Some(slot_meta)) => {
                self.current = if slot == 0 {
                    None
                } else {
                    slot_meta.parent_slot
                };
                Some(Ok(slot))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{blockstore_meta::SlotMeta, get_tmp_ledger_path_auto_delete},
    };

    fn put_meta(blockstore: &Blockstore, slot: Slot, parent_slot: Option<Slot>) {
        blockstore
            .put_meta(slot, &SlotMeta::new(slot, parent_slot))
            .unwrap();
    }

    #[test]
    fn test_ancestor_iterator_yields_start_first() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        put_meta(&blockstore, 0, None);
        put_meta(&blockstore, 1, Some(0));
        put_meta(&blockstore, 4, Some(1));

        let ancestors: Vec<Slot> = AncestorIterator::new_inclusive(4, &blockstore)
            .map(|slot| slot.unwrap())
            .collect();
        assert_eq!(ancestors, vec![4, 1, 0]);
    }

    #[test]
    fn test_ancestor_iterator_stops_at_missing_meta() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        // slot 5 chains to 3, which is absent
        put_meta(&blockstore, 5, Some(3));

        let ancestors: Vec<Slot> = AncestorIterator::new_inclusive(5, &blockstore)
            .map(|slot| slot.unwrap())
            .collect();
        assert_eq!(ancestors, vec![5]);

        // an absent starting slot yields nothing at all
        assert_eq!(
            AncestorIterator::new_inclusive(42, &blockstore).count(),
            0
        );
    }

    #[test]
    fn test_ancestor_iterator_orphan_ends_walk() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        put_meta(&blockstore, 2, None);
        put_meta(&blockstore, 3, Some(2));

        let ancestors: Vec<Slot> = AncestorIterator::new_inclusive(3, &blockstore)
            .map(|slot| slot.unwrap())
            .collect();
        assert_eq!(ancestors, vec![3, 2]);
    }
}
